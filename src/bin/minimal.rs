// Minimal check of the style model, no ffmpeg needed

use video_styler::{
    config::StyleSettings,
    style::{AlgorithmRegistry, StyleModel},
    video::synthetic,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🎬 Testing Video-Styler Core Functionality");

    // Test 1: Algorithm Registry
    println!("\n1. Testing Algorithm Registry...");
    let settings = StyleSettings::default();
    let registry = AlgorithmRegistry::new(&settings);
    let available = registry.available();
    println!("   Available algorithms: {:?}", available);
    assert_eq!(available.len(), 3);

    for name in &available {
        if let Some(algorithm) = registry.get(name) {
            let metadata = algorithm.metadata();
            println!(
                "   {} - {} (iterative: {}, impact: {:.2})",
                algorithm.name(),
                algorithm.description(),
                metadata.iterative,
                metadata.performance_impact
            );
        }
    }

    // Test 2: Unloaded model
    println!("\n2. Testing Unloaded Model...");
    let model = StyleModel::from_settings(&settings)?;
    match model.transform(synthetic::test_frame(64, 48, 0)) {
        Ok(_) => return Err("transform succeeded without a style".into()),
        Err(e) => println!("   ✅ Rejected as expected: {}", e),
    }

    // Test 3: Style loading
    println!("\n3. Testing Style Loading...");
    model.load_style_image(&synthetic::test_style_image(128, 128, 7), "synthetic")?;
    println!("   Loaded: {}", model.is_loaded());

    // Test 4: Transform each algorithm
    println!("\n4. Testing Frame Transform...");
    let frame = synthetic::test_frame(320, 240, 3);
    for name in &available {
        let algorithm_settings = StyleSettings {
            algorithm: name.clone(),
            iterations: 25,
            ..settings.clone()
        };
        let model = StyleModel::from_settings(&algorithm_settings)?;
        model.load_style_image(&synthetic::test_style_image(128, 128, 7), "synthetic")?;

        let start = std::time::Instant::now();
        let styled = model.transform(frame.clone())?;
        let diff = styled.mean_abs_diff(&frame).unwrap_or(0.0);
        println!(
            "   ✅ {}: {}x{} in {:.0}ms, mean change {:.2}",
            name,
            styled.width(),
            styled.height(),
            start.elapsed().as_secs_f64() * 1000.0,
            diff
        );

        let filename = format!("minimal_test_{}.png", name);
        match styled.save_png(&filename) {
            Ok(()) => println!("   📁 Output saved to: {}", filename),
            Err(e) => println!("   ⚠️  Could not save file: {}", e),
        }
    }

    println!("\n🎉 All checks passed! Video-Styler core is working.");
    Ok(())
}
