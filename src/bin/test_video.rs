// End-to-end check of the ffmpeg-backed pipeline on synthetic media

use std::path::PathBuf;

use video_styler::{
    config::Config,
    pipeline::StyleTransferEngine,
    video::{check_available, synthetic, VideoSource},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    video_styler::logging::init(true, None)?;

    println!("🎬 Testing Video-Styler Video Processing");

    let mut config = Config::default();
    config.style.algorithm = "color_transfer".to_string();

    // Test 1: Tool availability
    println!("\n1. Checking FFmpeg...");
    let ffmpeg_ok = check_available(&config.video.ffmpeg_path);
    let ffprobe_ok = check_available(&config.video.ffprobe_path);
    println!("   ffmpeg: {}", if ffmpeg_ok { "✅ found" } else { "❌ missing" });
    println!("   ffprobe: {}", if ffprobe_ok { "✅ found" } else { "❌ missing" });
    if !(ffmpeg_ok && ffprobe_ok) {
        println!("   Install FFmpeg: brew install ffmpeg (macOS) or sudo apt install ffmpeg (Ubuntu)");
        return Ok(());
    }

    let workdir = PathBuf::from("test_video_output");
    std::fs::create_dir_all(&workdir)?;
    let input = workdir.join("input.mp4");
    let style = workdir.join("style.png");
    let output = workdir.join("styled.mp4");

    // Test 2: Synthetic media
    println!("\n2. Writing synthetic media...");
    let written = synthetic::write_test_video(&config.video, &input, 30, 320, 240, 30.0)?;
    synthetic::write_style_image(&style, 256, 256, 11)?;
    println!("   📁 {} frames -> {}", written, input.display());
    println!("   📁 style -> {}", style.display());

    // Test 3: Decoding
    println!("\n3. Decoding the input...");
    let mut source = VideoSource::new(&config.video);
    source.open(&input)?;
    let metadata = source.metadata();
    let mut decoded = 0u64;
    while source.next_frame()?.is_some() {
        decoded += 1;
    }
    println!(
        "   {}x{} @ {:.2} fps, {} advertised, {} decoded",
        metadata.width, metadata.height, metadata.fps, metadata.frame_count, decoded
    );

    // Test 4: Full run
    println!("\n4. Running style transfer...");
    let engine = StyleTransferEngine::from_config(config)?;
    let summary = engine.run(&input, &style, &output)?;
    println!(
        "   ✅ {} frames in {:.2}s ({:.1} fps) -> {}",
        summary.frames_processed,
        summary.elapsed.as_secs_f64(),
        summary.frames_per_second(),
        summary.output.display()
    );

    println!("\n🎉 All video processing checks completed!");
    Ok(())
}
