//! The host frame loop.
//!
//! Stands in for the display-refresh scheduler: one [`App::frame`] call per
//! refresh, all on one thread. Inputs are polled at the start of a frame,
//! then the frame driver runs and snapshots are written.

use crate::audio_file::{PlaybackState, WavPlayback};
use crate::cli::Args;
use crate::demo::{DemoScript, DEFAULT_STEP_MS};
#[cfg(feature = "midi")]
use crate::midi_host::MidiHost;
use crate::render::{KeyboardDisplay, PointRenderer, SnapshotWriter, SpectrumCanvas};
use anyhow::Result;
#[cfg(not(feature = "midi"))]
use melodyviz_control::{DeviceSource, MidirDeviceSource};
use melodyviz_core::{
    FftAnalyser, FrameDriver, FrameReport, InputStatus, VisualizerConfig, VisualizerSession,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Everything the host owns for one run
pub struct App {
    session: VisualizerSession,
    driver: FrameDriver,
    points: PointRenderer,
    spectrum: SpectrumCanvas,
    keyboard: KeyboardDisplay,
    playback: Option<WavPlayback>,
    demo: Option<DemoScript>,
    #[cfg(feature = "midi")]
    midi: Option<MidiHost>,
    snapshots: Option<SnapshotWriter>,
    clock: Instant,
    last_fps: u32,
}

impl App {
    /// Build the session and open the requested inputs
    pub fn new(args: &Args, config: VisualizerConfig) -> Result<Self> {
        let clock = Instant::now();
        let analyser_config = config.analyser.clone();
        let mut session = VisualizerSession::new(config)?;

        let playback = match &args.audio_file {
            Some(path) => load_audio(path, analyser_config, &mut session),
            None => None,
        };

        #[cfg(feature = "midi")]
        let midi = match (&args.midi_device, args.demo) {
            (Some(selector), _) => {
                let selector = selector.parse().unwrap_or_default();
                Some(MidiHost::start(selector, clock, &mut session))
            }
            (None, false) if playback.is_none() => {
                Some(MidiHost::start(Default::default(), clock, &mut session))
            }
            _ => None,
        };
        #[cfg(not(feature = "midi"))]
        if let Err(e) = MidirDeviceSource.devices() {
            session.set_midi_status(InputStatus::Unavailable(e.to_string()));
        }

        let snapshots = match &args.snapshot_dir {
            Some(dir) => Some(SnapshotWriter::new(dir, args.snapshot_every)?),
            None => None,
        };

        Ok(Self {
            session,
            driver: FrameDriver::new(0),
            points: PointRenderer::new(args.width, args.height),
            spectrum: SpectrumCanvas::new(args.width, args.height),
            keyboard: KeyboardDisplay::new(),
            playback,
            demo: args.demo.then(|| DemoScript::new(0, DEFAULT_STEP_MS)),
            #[cfg(feature = "midi")]
            midi,
            snapshots,
            clock,
            last_fps: 0,
        })
    }

    /// Run frames until the frame limit, the end of the audio, or forever
    pub fn run(&mut self, frame_limit: Option<u64>, frame_interval: Duration) -> Result<()> {
        if let Some(playback) = self.playback.as_mut() {
            playback.play(0);
            self.session.set_audio_status(InputStatus::Playing);
        }

        let audio_only = self.playback.is_some() && self.demo.is_none() && !self.has_midi();
        let mut next_frame = Instant::now();

        loop {
            let report = self.frame()?;
            let frames = self.driver.frames();

            if frame_limit.is_some_and(|limit| frames >= limit) {
                break;
            }
            if audio_only && !self.playback.as_ref().is_some_and(|p| p.is_playing()) {
                info!("Audio finished after {} frames", frames);
                break;
            }
            if report.fps != self.last_fps {
                self.last_fps = report.fps;
                info!(
                    "fps={} particles={} active_notes={} peak={}",
                    report.fps, report.particle_count, report.active_notes, report.spectrum_peak
                );
            }

            next_frame += frame_interval;
            let now = Instant::now();
            if next_frame > now {
                thread::sleep(next_frame - now);
            } else {
                // Running behind: skip the missed refreshes
                next_frame = now;
            }
        }

        self.shutdown();
        Ok(())
    }

    /// One refresh: poll inputs, tick the driver, write snapshots
    pub fn frame(&mut self) -> Result<FrameReport> {
        let now_ms = self.clock.elapsed().as_millis() as u64;
        self.poll_inputs(now_ms);

        let report = self.driver.tick(
            now_ms,
            &mut self.session,
            &mut self.points,
            &mut self.spectrum,
        );

        if self.keyboard.take_changed() {
            debug!("Keyboard {}", self.keyboard.render_line());
        }
        self.write_snapshots()?;
        Ok(report)
    }

    fn poll_inputs(&mut self, now_ms: u64) {
        if let Some(demo) = self.demo.as_mut() {
            for message in demo.poll(now_ms) {
                self.session
                    .handle_midi_message(&message, now_ms, &mut self.keyboard);
            }
        }

        #[cfg(feature = "midi")]
        if let Some(midi) = self.midi.as_mut() {
            midi.poll(now_ms, &mut self.session, &mut self.keyboard);
        }

        if let Some(playback) = self.playback.as_mut() {
            if playback.advance(now_ms) == PlaybackState::Finished {
                self.session.set_audio_status(InputStatus::Stopped);
            }
        }
    }

    fn write_snapshots(&mut self) -> Result<()> {
        let frame = self.driver.frames();
        let Some(writer) = self.snapshots.as_mut() else {
            return Ok(());
        };
        if !writer.is_due(frame) {
            return Ok(());
        }

        let mode = self.session.visualization_mode();
        if mode.shows_particles() {
            writer.save("particles", frame, self.points.image())?;
        }
        if mode.shows_spectrum() && self.session.has_analyser() {
            writer.save("spectrum", frame, self.spectrum.image())?;
        }
        if mode.highlights_keys() {
            info!("Keyboard {}", self.keyboard.render_line());
        }
        Ok(())
    }

    fn has_midi(&self) -> bool {
        #[cfg(feature = "midi")]
        return self.midi.is_some();
        #[cfg(not(feature = "midi"))]
        return false;
    }

    /// Release inputs and end the session
    pub fn shutdown(&mut self) {
        if let Some(demo) = self.demo.as_mut() {
            if let Some(release) = demo.finish() {
                let now_ms = self.clock.elapsed().as_millis() as u64;
                self.session
                    .handle_midi_message(&release, now_ms, &mut self.keyboard);
            }
        }
        #[cfg(feature = "midi")]
        if let Some(mut midi) = self.midi.take() {
            midi.shutdown();
        }
        if let Some(playback) = self.playback.as_mut() {
            playback.stop();
        }
        if let Some(writer) = &self.snapshots {
            info!("{} snapshots written", writer.written());
        }
        self.session.teardown();
    }

    /// The session, for inspection
    pub fn session(&self) -> &VisualizerSession {
        &self.session
    }
}

/// Load the audio file and attach its analyser; failures become the audio status
fn load_audio(
    path: &std::path::Path,
    analyser_config: melodyviz_core::AnalyserConfig,
    session: &mut VisualizerSession,
) -> Option<WavPlayback> {
    let analyser = match FftAnalyser::try_new(analyser_config) {
        Ok(analyser) => Rc::new(RefCell::new(analyser)),
        Err(e) => {
            session.set_audio_status(InputStatus::Unavailable(e.to_string()));
            return None;
        }
    };

    match WavPlayback::load(path, Rc::clone(&analyser)) {
        Ok(playback) => {
            session.attach_analyser(Box::new(analyser));
            session.set_audio_status(InputStatus::Loaded(playback.name().to_string()));
            Some(playback)
        }
        Err(e) => {
            warn!("Audio file unavailable: {:#}", e);
            session.set_audio_status(InputStatus::Failed(format!("{:#}", e)));
            None
        }
    }
}
