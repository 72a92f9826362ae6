// THEORY:
// The `PulseTrigger` turns a stream of yes/no scene-change decisions into
// discrete pulses for one element. It is a three-state machine:
//
//   Idle    --scene change-->           Pulsing
//   Pulsing --deferred end (same token)--> Cooling or Idle
//   Cooling --cooldown elapses-->       Idle
//
// A decision that arrives while Pulsing or Cooling is dropped: it neither
// queues a pulse nor pushes the running pulse's end further out. Cooldown is
// measured from the start of the last pulse.
//
// Every pulse gets a fresh token. The deferred end carries the token of the
// pulse that scheduled it, and `finish` ignores any token that is not the
// current one, so a late end can never cut short a newer pulse.

use crate::config::DetectorConfig;
use crate::effects::PulseMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulsePhase {
    Idle,
    Cooling,
    Pulsing,
}

/// Identity of one pulse, carried by its deferred end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PulseToken(u64);

#[derive(Debug, Clone, PartialEq)]
struct ActivePulse {
    token: PulseToken,
    marker: PulseMarker,
    ends_at: u64,
}

/// Everything the owner needs to apply a pulse and schedule its end.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseStart {
    pub token: PulseToken,
    pub started_at: u64,
    pub ends_at: u64,
    pub marker: PulseMarker,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Started(PulseStart),
    Disabled,
    CoolingDown { remaining_ms: u64 },
    InProgress,
}

#[derive(Debug, Default)]
pub struct PulseTrigger {
    last_start: Option<u64>,
    active: Option<ActivePulse>,
    generation: u64,
}

impl PulseTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pulsing(&self) -> bool {
        self.active.is_some()
    }

    pub fn last_start(&self) -> Option<u64> {
        self.last_start
    }

    /// When the running pulse is scheduled to end.
    pub fn active_until(&self) -> Option<u64> {
        self.active.as_ref().map(|pulse| pulse.ends_at)
    }

    pub fn phase(&self, now_ms: u64, config: &DetectorConfig) -> PulsePhase {
        if self.active.is_some() {
            PulsePhase::Pulsing
        } else if self.cooldown_remaining(now_ms, config) > 0 {
            PulsePhase::Cooling
        } else {
            PulsePhase::Idle
        }
    }

    fn cooldown_remaining(&self, now_ms: u64, config: &DetectorConfig) -> u64 {
        match self.last_start {
            Some(start) => {
                let elapsed = now_ms.saturating_sub(start);
                config.cooldown_period_ms.saturating_sub(elapsed)
            }
            None => 0,
        }
    }

    /// Feeds one "scene changed" decision.
    pub fn on_scene_change(&mut self, now_ms: u64, config: &DetectorConfig) -> TriggerOutcome {
        if !config.enable_pulsing {
            return TriggerOutcome::Disabled;
        }
        let remaining_ms = self.cooldown_remaining(now_ms, config);
        if remaining_ms > 0 {
            return TriggerOutcome::CoolingDown { remaining_ms };
        }
        if self.active.is_some() {
            return TriggerOutcome::InProgress;
        }

        self.generation += 1;
        let start = PulseStart {
            token: PulseToken(self.generation),
            started_at: now_ms,
            ends_at: now_ms.saturating_add(config.pulsate_duration_ms),
            marker: PulseMarker::from_config(config),
        };
        self.last_start = Some(now_ms);
        self.active = Some(ActivePulse {
            token: start.token,
            marker: start.marker.clone(),
            ends_at: start.ends_at,
        });
        TriggerOutcome::Started(start)
    }

    /// Ends the pulse identified by `token`. Returns the marker to clear, or
    /// `None` when the token is stale.
    pub fn finish(&mut self, token: PulseToken) -> Option<PulseMarker> {
        if self.active.as_ref().is_some_and(|a| a.token == token) {
            self.active.take().map(|a| a.marker)
        } else {
            None
        }
    }

    /// Forgets the cooldown, as a fresh playback does. A running pulse is
    /// left to finish on its own.
    pub fn reset_cooldown(&mut self) {
        self.last_start = None;
    }
}
