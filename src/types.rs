//! Frame-level value types shared by nodes and the scheduler.

use std::fmt;
use std::time::{Duration, Instant};

/// Size of the surface the frame graph renders into, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    /// Create a new extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero (e.g. a minimized window).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scale both dimensions, rounding down and clamping to `1..=u32::MAX`.
    ///
    /// Used by passes that render at a fraction of the surface resolution.
    pub fn scaled(&self, factor: f32) -> Self {
        let scale = |v: u32| ((v as f32 * factor) as u32).max(1);
        Self {
            width: scale(self.width),
            height: scale(self.height),
        }
    }
}

impl From<(u32, u32)> for Extent {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Per-frame state handed to the root node.
///
/// Non-root nodes never see this; they receive whatever resources their
/// collaborators wired into them at construction time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Index of this frame, starting at zero.
    pub frame_index: u64,
    /// Time since the previous frame.
    pub delta: Duration,
    /// Time since the clock started.
    pub elapsed: Duration,
    /// Current surface size.
    pub extent: Extent,
}

impl FrameContext {
    /// Create a context for the given frame.
    pub fn new(frame_index: u64, delta: Duration, elapsed: Duration, extent: Extent) -> Self {
        Self {
            frame_index,
            delta,
            elapsed,
            extent,
        }
    }

    /// Delta time in seconds, the form most simulation code wants.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

/// Produces successive [`FrameContext`]s from a monotonic clock.
///
/// # Example
///
/// ```
/// use framegraph::{Extent, FrameClock};
///
/// let mut clock = FrameClock::new(Extent::new(1280, 720));
/// let first = clock.tick();
/// let second = clock.tick();
/// assert_eq!(first.frame_index, 0);
/// assert_eq!(second.frame_index, 1);
/// assert!(second.elapsed >= first.elapsed);
/// ```
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    extent: Extent,
}

impl FrameClock {
    /// Start a clock for a surface of the given size.
    pub fn new(extent: Extent) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
            extent,
        }
    }

    /// Update the extent reported in subsequent contexts.
    pub fn set_extent(&mut self, extent: Extent) {
        self.extent = extent;
    }

    /// Current extent.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Advance to the next frame and return its context.
    pub fn tick(&mut self) -> FrameContext {
        let now = Instant::now();
        let ctx = FrameContext::new(
            self.frame_index,
            now - self.last,
            now - self.start,
            self.extent,
        );
        self.last = now;
        self.frame_index += 1;
        ctx
    }
}
