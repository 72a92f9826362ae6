// THEORY:
// The detector never touches a real player. Everything it needs from the host
// page (the frame, whether the element is still in the document, somewhere to
// put the pulse marker, the glow and the player filter) goes through the `VideoElement` trait.
// A browser build implements it over its element handle; `FrameVideo` below
// implements it over a decoded `image` frame for tests and offline runs.

use crate::effects::{GlowStyle, PulseMarker, VideoFilter};
use crate::error::FrameAccessError;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Stable identity of one video element for as long as the host keeps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoId(pub u64);

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "video#{}", self.0)
    }
}

/// Playback lifecycle events the monitor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Play,
    Pause,
    Ended,
    /// The element was detached from the live document.
    Removed,
}

/// What the host exposes about one video element.
pub trait VideoElement {
    fn id(&self) -> VideoId;

    /// Intrinsic frame width. 0 means no frame has been decoded yet.
    fn intrinsic_width(&self) -> u32;

    /// Draws the current frame scaled to fill `raster`.
    fn draw_frame(&mut self, raster: &mut RgbaImage) -> Result<(), FrameAccessError>;

    /// Whether the element is still attached to the live document.
    fn is_connected(&self) -> bool {
        true
    }

    fn apply_pulse(&mut self, marker: &PulseMarker);

    fn clear_pulse(&mut self, marker: &PulseMarker);

    /// `None` removes the glow.
    fn apply_glow(&mut self, glow: Option<&GlowStyle>);

    /// `None` removes the player filter.
    fn apply_filter(&mut self, filter: Option<&VideoFilter>);

    /// Takes the player filter off for one sample and hands it back so it can
    /// be restored once the frame is read.
    fn suspend_filter(&mut self) -> Option<VideoFilter>;
}

#[derive(Debug, Default)]
struct FrameState {
    frame: Option<RgbaImage>,
    restricted: bool,
    connected: bool,
    pulse: Option<PulseMarker>,
    pulses_applied: usize,
    glow: Option<GlowStyle>,
    filter: Option<VideoFilter>,
}

/// An element backed by an in-memory frame. Clones share the same element,
/// the way two handles to one DOM node do.
#[derive(Debug, Clone)]
pub struct FrameVideo {
    id: VideoId,
    state: Rc<RefCell<FrameState>>,
}

impl FrameVideo {
    pub fn new(id: VideoId) -> Self {
        Self {
            id,
            state: Rc::new(RefCell::new(FrameState {
                connected: true,
                ..FrameState::default()
            })),
        }
    }

    pub fn with_frame(id: VideoId, frame: RgbaImage) -> Self {
        let video = Self::new(id);
        video.set_frame(frame);
        video
    }

    pub fn set_frame(&self, frame: RgbaImage) {
        self.state.borrow_mut().frame = Some(frame);
    }

    /// Makes every later draw fail as a cross-origin frame would.
    pub fn set_restricted(&self, restricted: bool) {
        self.state.borrow_mut().restricted = restricted;
    }

    pub fn detach(&self) {
        self.state.borrow_mut().connected = false;
    }

    pub fn current_pulse(&self) -> Option<PulseMarker> {
        self.state.borrow().pulse.clone()
    }

    /// How many times a pulse marker has been applied to this element.
    pub fn pulses_applied(&self) -> usize {
        self.state.borrow().pulses_applied
    }

    pub fn current_glow(&self) -> Option<GlowStyle> {
        self.state.borrow().glow.clone()
    }

    pub fn current_filter(&self) -> Option<VideoFilter> {
        self.state.borrow().filter.clone()
    }
}

impl VideoElement for FrameVideo {
    fn id(&self) -> VideoId {
        self.id
    }

    fn intrinsic_width(&self) -> u32 {
        self.state
            .borrow()
            .frame
            .as_ref()
            .map_or(0, |frame| frame.width())
    }

    fn draw_frame(&mut self, raster: &mut RgbaImage) -> Result<(), FrameAccessError> {
        let state = self.state.borrow();
        if state.restricted {
            return Err(FrameAccessError::Restricted(format!(
                "{} is cross-origin",
                self.id
            )));
        }
        let Some(frame) = state.frame.as_ref() else {
            return Err(FrameAccessError::Draw(format!("{} has no frame", self.id)));
        };
        let scaled = imageops::resize(frame, raster.width(), raster.height(), FilterType::Triangle);
        imageops::replace(raster, &scaled, 0, 0);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    fn apply_pulse(&mut self, marker: &PulseMarker) {
        let mut state = self.state.borrow_mut();
        state.pulse = Some(marker.clone());
        state.pulses_applied += 1;
    }

    fn clear_pulse(&mut self, marker: &PulseMarker) {
        let mut state = self.state.borrow_mut();
        if state.pulse.as_ref() == Some(marker) {
            state.pulse = None;
        }
    }

    fn apply_glow(&mut self, glow: Option<&GlowStyle>) {
        self.state.borrow_mut().glow = glow.cloned();
    }

    fn apply_filter(&mut self, filter: Option<&VideoFilter>) {
        self.state.borrow_mut().filter = filter.cloned();
    }

    fn suspend_filter(&mut self) -> Option<VideoFilter> {
        self.state.borrow_mut().filter.take()
    }
}
