use std::path::Path;

use anyhow::Result;
use log::LevelFilter;

use autonod::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Reads RUST_LOG, defaults to info
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "autonod.json".to_string());
    let config = Config::load(Path::new(&config_path));

    run(config).await
}

#[cfg(windows)]
async fn run(config: Config) -> Result<()> {
    use std::sync::Arc;

    use autonod::exec::win32::Win32InputBackend;
    use autonod::notify::LogSink;
    use autonod::ocr::tesseract_cli::TesseractCli;
    use autonod::window::win32::Win32WindowService;
    use autonod::ScanController;
    use log::{info, warn};

    let recognizer = TesseractCli::new(&config.ocr);
    if !recognizer.is_available() {
        warn!(
            "tesseract binary '{}' not found; recognition will fail until it is installed",
            config.ocr.tesseract_path
        );
    }

    let mut controller = ScanController::new(
        Arc::new(Win32WindowService::new()),
        Arc::new(recognizer),
        Arc::new(Win32InputBackend::new(&config.timing)),
        Arc::new(LogSink),
        config,
    );
    controller.start()?;

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, stopping");
    controller.stop().await?;
    info!(
        "done: {} approval(s) across {} check(s)",
        controller.approval_count(),
        controller.check_count()
    );
    Ok(())
}

#[cfg(not(windows))]
async fn run(config: Config) -> Result<()> {
    let _ = config;
    anyhow::bail!("window capture and key injection are implemented for Windows only");
}
