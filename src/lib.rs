// THEORY:
// This file is the entry point for the `scene_pulse` library crate. The public
// surface is small on purpose: `PulseMonitor` (start, stop, advance, read
// state), the `VideoElement` trait a host implements, and `DetectorConfig`.
// The analysis layers live under `core_modules`:
//
//   frame_sampler -> sample_grid -> scene_scorer -> pulse_trigger
//
// all driven by one deterministic `scheduler`. `runtime` adds a tokio loop for
// hosts that want real time instead of calling `advance_to` themselves.

pub mod clock;
pub mod config;
pub mod core_modules;
pub mod effects;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod runtime;
pub mod video;

pub use config::{DetectorConfig, GlowConfig, LoggingConfig, PulseEffect};
pub use core_modules::pulse_trigger::PulsePhase;
pub use core_modules::scene_scorer::SceneScore;
pub use error::{FrameAccessError, PulseError, PulseResult};
pub use pipeline::{MonitorEvent, PulseMonitor, StopReason};
pub use video::{FrameVideo, PlaybackEvent, VideoElement, VideoId};
