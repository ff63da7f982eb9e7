//! Application entry point — Voice Extractor.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers) for the job pool.
//! 4. Build the ffmpeg extractor and the caching Whisper model provider.
//! 5. Create the event channel (worker → UI).
//! 6. Build the [`JobRunner`] on the runtime handle.
//! 7. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use voice_extractor::{
    app::VoiceExtractorApp,
    audio::{AudioExtractor, FfmpegExtractor},
    config::{AppConfig, AppPaths},
    pipeline::{event_channel, JobRunner},
    stt::{CachingWhisperProvider, ModelPaths, ModelProvider, TranscribeParams},
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let size = config.ui.window_size.unwrap_or((1000.0, 800.0));

    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([size.0, size.1])
        .with_min_inner_size([800.0, 600.0])
        .with_title("Voice Extractor");

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Voice Extractor starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime — hosts the blocking job pool (ffmpeg + Whisper).
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. External capabilities.  Nothing heavy happens here: ffmpeg is only
    //    probed when a job runs, and models load on first use.
    let extractor: Arc<dyn AudioExtractor> =
        Arc::new(FfmpegExtractor::from_config(&config.extraction));

    let models: Arc<dyn ModelProvider> = Arc::new(CachingWhisperProvider::new(
        ModelPaths::from_app_paths(&AppPaths::new()),
        TranscribeParams::default(),
    ));

    // 5. Event channel: the worker pushes, the UI drains every 100 ms.
    let (event_tx, event_rx) = event_channel();

    // 6. Job runner on the runtime handle.
    let runner = JobRunner::new(rt.handle().clone(), extractor, models, event_tx);

    // 7. Build the egui app and run it (blocks until the window is closed).
    let app = VoiceExtractorApp::new(runner, event_rx, config.clone());
    let options = native_options(&config);

    eframe::run_native(
        "Voice Extractor",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
