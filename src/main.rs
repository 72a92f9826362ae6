// Offline runner: plays a sequence of still frames through the detector on
// virtual time and logs every pulse.
//
// Usage: scene_pulse [--config <file.json>] <frame>...

use scene_pulse::clock::{Clock, ManualClock};
use scene_pulse::config::AppConfig;
use scene_pulse::logging::init_logging;
use scene_pulse::{FrameVideo, MonitorEvent, PlaybackEvent, PulseMonitor, PulseResult, VideoId};
use std::env;
use std::path::PathBuf;
use tracing::{error, info};

fn main() {
    if let Err(err) = run() {
        error!(error = %err, "run failed");
        eprintln!("scene_pulse: {err}");
        std::process::exit(1);
    }
}

fn run() -> PulseResult<()> {
    // --- 1. Argument Parsing & Setup ---
    let mut args = env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut frames: Vec<PathBuf> = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            config_path = args.next().map(PathBuf::from);
        } else {
            frames.push(PathBuf::from(arg));
        }
    }
    if frames.is_empty() {
        println!("Usage: scene_pulse [--config <file.json>] <frame>...");
        return Ok(());
    }

    let app = match &config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    init_logging(&app.logging);

    // --- 2. Monitor Initialization ---
    let interval = app.detector.sample_interval_ms;
    let mut monitor = PulseMonitor::new(app.detector)?;
    let clock = ManualClock::new(0);
    let video = FrameVideo::new(VideoId(1));

    let mut pulses = 0usize;
    let mut report = |events: Vec<MonitorEvent>| {
        for event in events {
            match event {
                MonitorEvent::PulseStarted { at_ms, score, .. } => {
                    pulses += 1;
                    info!(at_ms, combined = score.combined, "pulse");
                }
                other => info!(?other, "monitor event"),
            }
        }
    };

    // --- 3. Playback Loop ---
    for (index, path) in frames.iter().enumerate() {
        let frame = image::open(path)?.to_rgba8();
        video.set_frame(frame);
        if index == 0 {
            report(monitor.handle_event(video.clone(), PlaybackEvent::Play, clock.now_ms()));
        } else {
            report(monitor.advance_to(clock.advance(interval)));
        }
    }

    // Let a trailing pulse finish before stopping.
    report(monitor.handle_event(video.clone(), PlaybackEvent::Ended, clock.now_ms()));
    let tail = monitor.config().pulsate_duration_ms;
    report(monitor.advance_to(clock.advance(tail)));

    info!(frames = frames.len(), pulses, "done");
    println!("{} frames, {} pulses", frames.len(), pulses);
    Ok(())
}
