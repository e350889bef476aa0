use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use video_styler::{
    config::Config,
    logging,
    pipeline::{RunSummary, StyleTransferEngine},
    StylerError,
};

#[derive(Parser, Debug)]
#[command(
    name = "video-styler",
    version,
    about = "Apply the style of an image to every frame of a video",
    long_about = "Video-Styler decodes a video, transfers the color and texture statistics of a style image onto each frame, and encodes the result with the same size and frame rate."
)]
struct Cli {
    /// Input video path
    #[arg(short, long)]
    input: PathBuf,

    /// Output video path; the container follows the extension
    #[arg(short, long)]
    output: PathBuf,

    /// Style image path (PNG or JPEG)
    #[arg(short, long)]
    style: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Style algorithm (gram, color_transfer, hue_shift)
    #[arg(short, long)]
    algorithm: Option<String>,

    /// Optimization iterations per frame
    #[arg(long)]
    iterations: Option<u32>,

    /// Weight of the style loss
    #[arg(long)]
    style_weight: Option<f64>,

    /// Weight of the content loss
    #[arg(long)]
    content_weight: Option<f64>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Command line values win over the configuration file
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(algorithm) = &self.algorithm {
            config.style.algorithm = algorithm.clone();
        }
        if let Some(iterations) = self.iterations {
            config.style.iterations = iterations;
        }
        if let Some(weight) = self.style_weight {
            config.style.style_weight = weight;
        }
        if let Some(weight) = self.content_weight {
            config.style.content_weight = weight;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are reported as "errors" that go to stdout
            let code = if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
            let _ = e.print();
            return code;
        }
    };

    if let Err(e) = logging::init(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(summary) => {
            info!(
                "Done: {} frames written to {:?}",
                summary.frames_processed, summary.output
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<StylerError>() {
                Some(styler_error) => error!("{}", styler_error.user_message()),
                None => error!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunSummary> {
    info!("Starting Video-Styler v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.processing.processing_threads)
        .build_global()
        .context("Failed to configure worker threads")?;

    let engine = StyleTransferEngine::from_config(config)?;
    let cancel = engine.cancel_handle();

    let Cli { input, style, output, .. } = cli;
    let mut task = tokio::task::spawn_blocking(move || engine.run(&input, &style, &output));

    let joined = tokio::select! {
        joined = &mut task => joined,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping after the current frame");
            cancel.store(true, Ordering::Relaxed);
            task.await
        }
    };

    let summary = joined.context("Processing task failed")??;
    Ok(summary)
}
