//! MelodyVisualizer - particle and spectrum visuals driven by MIDI notes
//! or an audio file.
//!
//! The binary hosts the core session on a single frame thread and renders
//! into off-screen canvases that can be written out as PNG snapshots.

#![warn(missing_docs)]

mod app;
mod audio_file;
mod cli;
mod demo;
mod logging_setup;
#[cfg(feature = "midi")]
mod midi_host;
mod render;

use anyhow::Result;
use clap::Parser;
use cli::Args;
use std::time::Duration;
use tracing::{error, info};

fn main() -> Result<()> {
    let args = Args::parse();

    #[cfg(feature = "midi")]
    if args.list_midi {
        return list_midi_devices();
    }

    let config = args.resolve_config()?;
    let _log_guard = logging_setup::init(&config.log)?;

    info!("==========================================");
    info!("===  MelodyVisualizer Session Started  ===");
    info!("==========================================");
    info!(
        "Mode: {}, colors: {}",
        config.visualization_mode, config.color_mode
    );

    let mut app = app::App::new(&args, config)?;
    let interval = Duration::from_millis(args.frame_interval_ms());
    if let Err(e) = app.run(args.frames, interval) {
        error!("Application error: {:#}", e);
        app.shutdown();
        return Err(e);
    }

    info!(
        "Session ended: midi={}, audio={}",
        app.session().midi_status(),
        app.session().audio_status()
    );
    Ok(())
}

#[cfg(feature = "midi")]
fn list_midi_devices() -> Result<()> {
    let devices = melodyviz_control::MidiInputManager::list_devices()?;
    if devices.is_empty() {
        println!("No MIDI devices detected");
    }
    for device in devices {
        println!("{}", device);
    }
    Ok(())
}
