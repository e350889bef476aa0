use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use video_styler::{
    config::StyleSettings,
    style::{numeric, StyleModel},
    video::synthetic,
};

fn loaded_model(algorithm: &str, iterations: u32) -> StyleModel {
    let settings = StyleSettings {
        algorithm: algorithm.to_string(),
        iterations,
        ..StyleSettings::default()
    };
    let model = StyleModel::from_settings(&settings).expect("known algorithm");
    model
        .load_style_image(&synthetic::test_style_image(256, 256, 1), "bench")
        .expect("valid style");
    model
}

fn bench_algorithms(c: &mut Criterion) {
    let frame = synthetic::test_frame(640, 480, 0);
    let mut group = c.benchmark_group("transform_640x480");
    group.sample_size(10);

    for (algorithm, iterations) in [("hue_shift", 0), ("color_transfer", 0), ("gram", 10), ("gram", 50)] {
        let model = loaded_model(algorithm, iterations);
        group.bench_with_input(
            BenchmarkId::new(algorithm, iterations),
            &frame,
            |b, frame| b.iter(|| model.transform(black_box(frame.clone())).expect("transform")),
        );
    }
    group.finish();
}

fn bench_gram_matrix(c: &mut Criterion) {
    let image = numeric::preprocess(&synthetic::test_frame(256, 192, 0));
    c.bench_function("feature_gram_256x192", |b| {
        b.iter(|| numeric::feature_gram(black_box(image.as_raw()), 256, 192))
    });
}

criterion_group!(benches, bench_algorithms, bench_gram_matrix);
criterion_main!(benches);
