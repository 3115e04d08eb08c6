//! Headless replay of a scripted annotation session.
//!
//! Usage: `imgannot-replay <script.json> [config.json]`
//!
//! The script lists the images to load, the screen size and a sequence of
//! input events. The resulting annotation set is printed to stdout as JSON.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use imgannot::{AnnotatorConfig, ImageCache, InputEvent, ScreenSize, Session};
use serde::Deserialize;

/// Replay script.
#[derive(Debug, Deserialize)]
struct Script {
    /// Screen size the events were recorded at
    screen: ScreenSize,
    /// Image references, in any order
    images: Vec<String>,
    /// How long to wait for the first image before replaying
    #[serde(default = "default_wait_ms")]
    wait_ms: u64,
    events: Vec<InputEvent>,
}

fn default_wait_ms() -> u64 {
    2000
}

fn run(script_path: &Path, config: &AnnotatorConfig) -> imgannot::Result<String> {
    let script: Script = serde_json::from_str(&std::fs::read_to_string(script_path)?)?;

    let mut session = Session::new(config, script.screen, ImageCache::new()?);
    session.load_images(script.images);

    let status = session.wait_for_current_image(Duration::from_millis(script.wait_ms));
    log::info!("First image: {:?}", status);

    let total = script.events.len();
    for (i, event) in script.events.into_iter().enumerate() {
        session.poll_images();
        match session.handle_event(event) {
            Ok(changed) => log::debug!("Event {}/{}: changed={}", i + 1, total, changed),
            Err(e) => log::warn!("Event {}/{} rejected: {}", i + 1, total, e),
        }
    }

    let viewport = session.viewport();
    log::info!(
        "Replay done: scale={:.4}, position=({:.1}, {:.1})",
        viewport.scale().x,
        viewport.position().x,
        viewport.position().y
    );
    Ok(serde_json::to_string_pretty(session.store().images())?)
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let Some(script_path) = args.get(1) else {
        eprintln!("Usage: imgannot-replay <script.json> [config.json]");
        return ExitCode::FAILURE;
    };

    let config = match args.get(2) {
        Some(path) => match AnnotatorConfig::load(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => AnnotatorConfig::load_or_default(Path::new(AnnotatorConfig::default_filename())),
    };

    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    match run(Path::new(script_path), &config) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Replay failed: {}", e);
            eprintln!("Replay failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
