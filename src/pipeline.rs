// THEORY:
// The `pipeline` module is the top-level API of the detector. `PulseMonitor`
// wires the sampler, the scorer and the per-element pulse triggers to a single
// timer queue and exposes the handful of calls a host needs: start, stop,
// forward a playback event, advance time, and read back state.
//
// Key architectural principles:
// 1.  **Explicit ownership of per-element state**: every monitored element has
//     one `MonitorState` in a map keyed by `VideoId`. Nothing is hung off the
//     host's objects, and tearing an element down is a map removal.
// 2.  **One queue, strict order**: sampling ticks and deferred pulse ends are
//     tasks in the same `Scheduler`, drained in due order. A tick for one
//     element is never overlapped by another tick for the same element; the
//     repeating task is cancelled and re-armed, never duplicated.
// 3.  **Ticks cannot fail**: an element without a frame skips the tick, a
//     restricted frame falls back to a synthetic color, a malformed grid scores
//     as no change. The next tick is already armed before a tick runs.
// 4.  **Stopping is synchronous, pulses are not interrupted**: stopping cancels
//     the pending tick immediately. A pulse that already started still runs
//     to its own end, which is matched by token so it can only clear itself.

use crate::config::DetectorConfig;
use crate::core_modules::frame_sampler::FrameSampler;
use crate::core_modules::pixel::Color;
use crate::core_modules::pulse_trigger::{PulsePhase, PulseToken, PulseTrigger, TriggerOutcome};
use crate::core_modules::sample_grid::SampleGrid;
use crate::core_modules::scene_scorer::{self, SceneScore};
use crate::core_modules::scheduler::{Scheduler, TaskHandle};
use crate::effects::{GlowStyle, VideoFilter};
use crate::error::PulseResult;
use crate::video::{PlaybackEvent, VideoElement, VideoId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, info};

// Re-export key data structures for the public API.
pub use crate::core_modules::frame_sampler::{FrameSample, SampleSource};
pub use crate::core_modules::pulse_trigger::PulseStart;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonitorTask {
    Tick(VideoId),
    PulseEnd(VideoId, PulseToken),
}

/// Why monitoring stopped for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Paused,
    Ended,
    Removed,
}

/// Something observable that happened while the monitor ran.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    PulseStarted {
        video: VideoId,
        at_ms: u64,
        score: SceneScore,
    },
    PulseEnded {
        video: VideoId,
        at_ms: u64,
    },
    Stopped {
        video: VideoId,
        reason: StopReason,
    },
}

/// Sampling memory for one element, plus its pulse trigger.
#[derive(Debug, Default)]
pub struct MonitorState {
    pub last_grid: Option<SampleGrid>,
    pub last_avg_color: Option<Color>,
    pub last_score: Option<SceneScore>,
    trigger: PulseTrigger,
}

impl MonitorState {
    fn clear_sampling(&mut self) {
        self.last_grid = None;
        self.last_avg_color = None;
        self.last_score = None;
    }

    pub fn trigger(&self) -> &PulseTrigger {
        &self.trigger
    }
}

struct Monitored<V> {
    element: V,
    state: MonitorState,
    tick: Option<TaskHandle>,
}

impl<V> Monitored<V> {
    fn is_idle(&self) -> bool {
        self.tick.is_none() && !self.state.trigger.is_pulsing()
    }
}

pub struct PulseMonitor<V: VideoElement> {
    config: DetectorConfig,
    sampler: FrameSampler,
    scheduler: Scheduler<MonitorTask>,
    entries: HashMap<VideoId, Monitored<V>>,
    now_ms: u64,
}

impl<V: VideoElement> PulseMonitor<V> {
    pub fn new(config: DetectorConfig) -> PulseResult<Self> {
        config.validate()?;
        Ok(Self {
            sampler: FrameSampler::new(config.grid_size),
            config,
            scheduler: Scheduler::new(),
            entries: HashMap::new(),
            now_ms: 0,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Swaps in new settings. The player filter is re-applied to every known
    /// element and running ticks are re-armed when the sampling interval
    /// changes. A grid size change makes the next comparison a
    /// no-change since the grids no longer line up.
    pub fn set_config(&mut self, config: DetectorConfig) -> PulseResult<()> {
        config.validate()?;
        let interval_changed = config.sample_interval_ms != self.config.sample_interval_ms;
        self.config = config;
        let filter = VideoFilter::from_config(&self.config);
        for entry in self.entries.values_mut() {
            entry.element.apply_filter(filter.as_ref());
        }
        if interval_changed {
            for (id, entry) in self.entries.iter_mut() {
                if let Some(tick) = entry.tick.take() {
                    self.scheduler.cancel(tick);
                    entry.tick = Some(self.scheduler.schedule_repeating(
                        self.now_ms,
                        self.config.sample_interval_ms,
                        MonitorTask::Tick(*id),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Begins monitoring `element` ("play"). Any previous tick for the same
    /// element is cancelled, sampling memory and cooldown are reset, the
    /// element is sampled right away and then every sampling interval.
    pub fn start_monitoring(&mut self, element: V, now_ms: u64) -> Vec<MonitorEvent> {
        self.now_ms = self.now_ms.max(now_ms);
        let id = element.id();
        let entry = match self.entries.entry(id) {
            Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                entry.element = element;
                entry
            }
            Entry::Vacant(vacant) => vacant.insert(Monitored {
                element,
                state: MonitorState::default(),
                tick: None,
            }),
        };
        if let Some(tick) = entry.tick.take() {
            self.scheduler.cancel(tick);
        }
        entry.state.clear_sampling();
        entry.state.trigger.reset_cooldown();
        entry
            .element
            .apply_filter(VideoFilter::from_config(&self.config).as_ref());
        entry.tick = Some(self.scheduler.schedule_repeating(
            now_ms,
            self.config.sample_interval_ms,
            MonitorTask::Tick(id),
        ));
        info!(video = %id, interval_ms = self.config.sample_interval_ms, "monitoring started");

        let mut events = Vec::new();
        self.tick(id, now_ms, &mut events);
        events
    }

    /// Stops sampling `id`. Returns whether it was being sampled.
    pub fn stop_monitoring(&mut self, id: VideoId, reason: StopReason) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        let Some(tick) = entry.tick.take() else {
            return false;
        };
        self.scheduler.cancel(tick);
        entry.state.clear_sampling();
        info!(video = %id, ?reason, "monitoring stopped");
        if entry.is_idle() {
            self.entries.remove(&id);
        }
        true
    }

    /// Maps a playback lifecycle event onto start/stop.
    pub fn handle_event(
        &mut self,
        element: V,
        event: PlaybackEvent,
        now_ms: u64,
    ) -> Vec<MonitorEvent> {
        let reason = match event {
            PlaybackEvent::Play => return self.start_monitoring(element, now_ms),
            PlaybackEvent::Pause => StopReason::Paused,
            PlaybackEvent::Ended => StopReason::Ended,
            PlaybackEvent::Removed => StopReason::Removed,
        };
        self.now_ms = self.now_ms.max(now_ms);
        let video = element.id();
        if self.stop_monitoring(video, reason) {
            vec![MonitorEvent::Stopped { video, reason }]
        } else {
            Vec::new()
        }
    }

    /// Runs every task due at or before `now_ms`, in due order. A sampling
    /// tick that fell more than one interval behind runs once, at `now_ms`.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<MonitorEvent> {
        let mut events = Vec::new();
        while let Some(task) = self.scheduler.pop_due(now_ms) {
            self.now_ms = self.now_ms.max(task.due_at);
            match task.payload {
                MonitorTask::Tick(id) => self.tick(id, task.due_at, &mut events),
                MonitorTask::PulseEnd(id, token) => {
                    self.end_pulse(id, token, task.due_at, &mut events)
                }
            }
        }
        self.now_ms = self.now_ms.max(now_ms);
        events
    }

    /// When the next task is due, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn is_monitoring(&self, id: VideoId) -> bool {
        self.entries.get(&id).is_some_and(|e| e.tick.is_some())
    }

    /// The read path cosmetic styling uses.
    pub fn is_pulsing(&self, id: VideoId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|e| e.state.trigger.is_pulsing())
    }

    pub fn pulse_phase(&self, id: VideoId, now_ms: u64) -> PulsePhase {
        self.entries
            .get(&id)
            .map_or(PulsePhase::Idle, |e| e.state.trigger.phase(now_ms, &self.config))
    }

    pub fn last_score(&self, id: VideoId) -> Option<SceneScore> {
        self.entries.get(&id).and_then(|e| e.state.last_score)
    }

    pub fn last_avg_color(&self, id: VideoId) -> Option<Color> {
        self.entries.get(&id).and_then(|e| e.state.last_avg_color)
    }

    pub fn state(&self, id: VideoId) -> Option<&MonitorState> {
        self.entries.get(&id).map(|e| &e.state)
    }

    pub fn element(&self, id: VideoId) -> Option<&V> {
        self.entries.get(&id).map(|e| &e.element)
    }

    fn tick(&mut self, id: VideoId, at_ms: u64, events: &mut Vec<MonitorEvent>) {
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        if !entry.element.is_connected() {
            if self.stop_monitoring(id, StopReason::Removed) {
                events.push(MonitorEvent::Stopped {
                    video: id,
                    reason: StopReason::Removed,
                });
            }
            return;
        }

        let Some(sample) = self.sampler.sample(&mut entry.element, &self.config, at_ms) else {
            return;
        };

        if self.config.glow.enabled {
            let glow = GlowStyle::new(sample.avg_color, &self.config);
            entry.element.apply_glow(Some(&glow));
        } else {
            entry.element.apply_glow(None);
        }

        let score = scene_scorer::score(
            Some(&sample.grid),
            entry.state.last_grid.as_ref(),
            &self.config,
        );
        if let Some(score) = score {
            entry.state.last_score = Some(score);
            if score.is_scene_change(&self.config) {
                match entry.state.trigger.on_scene_change(at_ms, &self.config) {
                    TriggerOutcome::Started(start) => {
                        entry.element.apply_pulse(&start.marker);
                        self.scheduler.schedule_once(
                            at_ms,
                            self.config.pulsate_duration_ms,
                            MonitorTask::PulseEnd(id, start.token),
                        );
                        info!(video = %id, at_ms, combined = score.combined, "pulse started");
                        events.push(MonitorEvent::PulseStarted {
                            video: id,
                            at_ms,
                            score,
                        });
                    }
                    outcome => debug!(video = %id, ?outcome, "scene change ignored"),
                }
            }
        }

        entry.state.last_grid = Some(sample.grid);
        entry.state.last_avg_color = Some(sample.avg_color);
    }

    fn end_pulse(
        &mut self,
        id: VideoId,
        token: PulseToken,
        at_ms: u64,
        events: &mut Vec<MonitorEvent>,
    ) {
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        let Some(marker) = entry.state.trigger.finish(token) else {
            debug!(video = %id, "stale pulse end ignored");
            return;
        };
        entry.element.clear_pulse(&marker);
        events.push(MonitorEvent::PulseEnded { video: id, at_ms });
        if entry.is_idle() {
            self.entries.remove(&id);
        }
    }
}
