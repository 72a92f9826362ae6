// THEORY:
// `PulseMonitor` is passive: it only moves when someone calls `advance_to`.
// This module is that someone for hosts that run on tokio. `drive` sleeps
// until the monitor's next deadline, advances it to the clock's current time,
// and hands every resulting event to a callback. Playback events (play, pause,
// ended, removed) arrive over an mpsc channel and are applied between ticks,
// so the host never needs the monitor back while it runs. Everything still
// happens on the calling task, one tick at a time, until the shutdown future
// resolves.

use crate::clock::Clock;
use crate::pipeline::{MonitorEvent, PulseMonitor};
use crate::video::{PlaybackEvent, VideoElement};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Milliseconds elapsed on tokio's clock, so paused-time tests see the same
/// time the sleeps do.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn start() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Runs `monitor` against `clock` until `shutdown` completes, applying
/// playback events from `playback` as they arrive.
pub async fn drive<V, C, S, F>(
    monitor: &mut PulseMonitor<V>,
    clock: &C,
    mut playback: mpsc::UnboundedReceiver<(V, PlaybackEvent)>,
    shutdown: S,
    mut on_event: F,
) where
    V: VideoElement,
    C: Clock,
    S: Future<Output = ()>,
    F: FnMut(&MonitorEvent),
{
    tokio::pin!(shutdown);
    let mut playback_open = true;
    loop {
        for event in monitor.advance_to(clock.now_ms()) {
            on_event(&event);
        }

        let deadline = monitor.next_deadline();
        if deadline.is_none() {
            debug!("nothing scheduled, waiting for playback events");
        }
        let wait = Duration::from_millis(
            deadline.map_or(0, |due| due.saturating_sub(clock.now_ms())),
        );

        tokio::select! {
            _ = &mut shutdown => return,
            received = playback.recv(), if playback_open => match received {
                Some((element, event)) => {
                    for event in monitor.handle_event(element, event, clock.now_ms()) {
                        on_event(&event);
                    }
                }
                None => {
                    debug!("playback channel closed");
                    playback_open = false;
                }
            },
            _ = tokio::time::sleep(wait), if deadline.is_some() => {}
        }
    }
}
