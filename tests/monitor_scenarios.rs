//! Playback scenarios driven on virtual time.

use image::{Rgba, RgbaImage};
use scene_pulse::pipeline::SampleSource;
use scene_pulse::{
    DetectorConfig, FrameVideo, MonitorEvent, PlaybackEvent, PulseMonitor, PulsePhase,
    StopReason, VideoId,
};

fn frame(v: u8) -> RgbaImage {
    RgbaImage::from_pixel(48, 27, Rgba([v, v, v, 255]))
}

fn config() -> DetectorConfig {
    DetectorConfig {
        grid_size: 8,
        sample_interval_ms: 100,
        cooldown_period_ms: 300,
        pulsate_duration_ms: 200,
        ..DetectorConfig::default()
    }
}

fn pulse_starts(events: &[MonitorEvent]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|e| match e {
            MonitorEvent::PulseStarted { at_ms, .. } => Some(*at_ms),
            _ => None,
        })
        .collect()
}

#[test]
fn cooldown_holds_back_a_second_cut() {
    let mut monitor = PulseMonitor::new(config()).unwrap();
    let video = FrameVideo::with_frame(VideoId(1), frame(0));
    monitor.start_monitoring(video.clone(), 0);

    let mut events = Vec::new();
    video.set_frame(frame(255));
    events.extend(monitor.advance_to(100)); // cut: pulse at 100
    video.set_frame(frame(0));
    events.extend(monitor.advance_to(200)); // cut inside the pulse
    video.set_frame(frame(255));
    events.extend(monitor.advance_to(300)); // pulse over, still cooling
    assert_eq!(monitor.pulse_phase(VideoId(1), 300), PulsePhase::Cooling);
    video.set_frame(frame(0));
    events.extend(monitor.advance_to(400)); // cooldown elapsed

    assert_eq!(pulse_starts(&events), vec![100, 400]);
    assert_eq!(video.pulses_applied(), 2);
}

#[test]
fn static_content_never_pulses() {
    let mut monitor = PulseMonitor::new(config()).unwrap();
    let video = FrameVideo::with_frame(VideoId(1), frame(90));
    monitor.start_monitoring(video.clone(), 0);
    let events = monitor.advance_to(5_000);
    assert!(pulse_starts(&events).is_empty());
    let score = monitor.last_score(VideoId(1)).unwrap();
    assert_eq!(score.combined, 0.0);
}

#[test]
fn videos_are_independent() {
    let mut monitor = PulseMonitor::new(config()).unwrap();
    let busy = FrameVideo::with_frame(VideoId(1), frame(0));
    let calm = FrameVideo::with_frame(VideoId(2), frame(0));
    monitor.start_monitoring(busy.clone(), 0);
    monitor.start_monitoring(calm.clone(), 0);

    busy.set_frame(frame(255));
    let events = monitor.advance_to(100);

    assert_eq!(pulse_starts(&events), vec![100]);
    assert!(monitor.is_pulsing(VideoId(1)));
    assert!(!monitor.is_pulsing(VideoId(2)));
    assert_eq!(calm.pulses_applied(), 0);
}

#[test]
fn detached_element_stops_on_next_tick() {
    let mut monitor = PulseMonitor::new(config()).unwrap();
    let video = FrameVideo::with_frame(VideoId(1), frame(0));
    monitor.start_monitoring(video.clone(), 0);
    video.detach();

    let events = monitor.advance_to(100);
    assert_eq!(
        events,
        vec![MonitorEvent::Stopped {
            video: VideoId(1),
            reason: StopReason::Removed
        }]
    );
    assert!(!monitor.is_monitoring(VideoId(1)));
    assert_eq!(monitor.next_deadline(), None);
}

#[test]
fn ended_then_play_again_starts_fresh() {
    let mut monitor = PulseMonitor::new(config()).unwrap();
    let video = FrameVideo::with_frame(VideoId(1), frame(0));
    monitor.handle_event(video.clone(), PlaybackEvent::Play, 0);
    video.set_frame(frame(255));
    monitor.advance_to(100);
    monitor.advance_to(300);
    monitor.handle_event(video.clone(), PlaybackEvent::Ended, 310);
    assert!(monitor.state(VideoId(1)).is_none());

    // Replay at 350: cooldown forgotten, first sample is only a baseline.
    video.set_frame(frame(0));
    let events = monitor.handle_event(video.clone(), PlaybackEvent::Play, 350);
    assert!(events.is_empty());
    video.set_frame(frame(255));
    let events = monitor.advance_to(450);
    assert_eq!(pulse_starts(&events), vec![450]);
}

#[test]
fn replay_during_a_pulse_lets_it_finish() {
    let mut monitor = PulseMonitor::new(config()).unwrap();
    let video = FrameVideo::with_frame(VideoId(1), frame(0));
    monitor.start_monitoring(video.clone(), 0);
    video.set_frame(frame(255));
    monitor.advance_to(100);

    monitor.handle_event(video.clone(), PlaybackEvent::Pause, 120);
    monitor.handle_event(video.clone(), PlaybackEvent::Play, 150);
    assert!(monitor.is_pulsing(VideoId(1)));

    video.set_frame(frame(0));
    let events = monitor.advance_to(250);
    // The pulse from 100 is still running; a cut now is dropped.
    assert!(pulse_starts(&events).is_empty());
    let events = monitor.advance_to(300);
    assert!(events.contains(&MonitorEvent::PulseEnded {
        video: VideoId(1),
        at_ms: 300
    }));
    assert!(video.current_pulse().is_none());
    assert!(monitor.is_monitoring(VideoId(1)));
}

#[test]
fn frame_appearing_late_is_only_a_baseline() {
    let mut monitor = PulseMonitor::new(config()).unwrap();
    let video = FrameVideo::new(VideoId(1));
    monitor.start_monitoring(video.clone(), 0);
    assert!(monitor.state(VideoId(1)).unwrap().last_grid.is_none());

    video.set_frame(frame(255));
    let events = monitor.advance_to(100);
    assert!(pulse_starts(&events).is_empty());
    assert!(monitor.state(VideoId(1)).unwrap().last_grid.is_some());
}

#[test]
fn restricted_video_keeps_sampling() {
    let mut monitor = PulseMonitor::new(config()).unwrap();
    let video = FrameVideo::with_frame(VideoId(1), frame(0));
    video.set_restricted(true);
    monitor.start_monitoring(video.clone(), 1_700_000_000_000);
    let events = monitor.advance_to(1_700_000_001_000);

    assert!(pulse_starts(&events).is_empty());
    let state = monitor.state(VideoId(1)).unwrap();
    assert_eq!(state.last_grid.as_ref().unwrap().len(), 64);
    assert!(video.current_glow().is_some());
    assert!(monitor.last_avg_color(VideoId(1)).is_some());

    // The fallback is also what the sampler reports directly.
    let sample = scene_pulse::core_modules::frame_sampler::fallback_sample(monitor.config(), 0);
    assert_eq!(sample.source, SampleSource::Fallback);
}

#[test]
fn disabled_pulsing_still_scores() {
    let mut monitor = PulseMonitor::new(DetectorConfig {
        enable_pulsing: false,
        ..config()
    })
    .unwrap();
    let video = FrameVideo::with_frame(VideoId(1), frame(0));
    monitor.start_monitoring(video.clone(), 0);
    video.set_frame(frame(255));
    let events = monitor.advance_to(100);
    assert!(events.is_empty());
    assert!(monitor.last_score(VideoId(1)).unwrap().combined >= 0.45);
    assert_eq!(video.pulses_applied(), 0);
}
