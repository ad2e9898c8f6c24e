//! Profiling support via Tracy.
//!
//! Frame execution is instrumented with the macros below. They forward to
//! the [Tracy profiler](https://github.com/wolfpld/tracy) when the
//! `profiling` Cargo feature is enabled and compile to no-ops otherwise.
//!
//! ```bash
//! cargo run --bin framegraph_demo --features demo,profiling
//! ```
//!
//! Each node execution opens a span named after the node, and the scheduler
//! opens a `frame_graph` span around the whole traversal, so Tracy's timeline
//! shows the exact order in which nodes ran.

#[cfg(feature = "profiling")]
pub use tracy_client::{
    self, Client, frame_mark as tracy_frame_mark, plot as tracy_plot, span,
};

/// Mark the end of a frame for Tracy's frame analysis.
///
/// Call once per frame, after [`FrameScheduler::execute`](crate::FrameScheduler::execute).
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! frame_mark {
    () => {
        $crate::profiling::tracy_frame_mark()
    };
}

/// Mark the end of a frame (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! frame_mark {
    () => {};
}

/// Create a profiling span for the current scope.
///
/// The span ends when the scope exits. `$name` must be a string literal.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_span = $crate::profiling::span!($name);
    };
}

/// Create a profiling span (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_scope {
    ($name:expr) => {};
}

/// Create a profiling span with a runtime-determined name.
///
/// Heap-allocates the span name; prefer [`profile_scope!`] for static names.
/// Used for per-node spans, whose names are only known at runtime.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_scope_dynamic {
    ($name:expr) => {
        let _profile_span = $crate::profiling::Client::running()
            .map(|c| c.span_alloc(Some($name), "", file!(), line!(), 0));
    };
}

/// Create a profiling span with a dynamic name (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_scope_dynamic {
    ($name:expr) => {
        let _ = $name;
    };
}

/// Plot a value over time in Tracy.
///
/// ```ignore
/// profile_plot!("frame_graph_ms", report.total().as_secs_f64() * 1000.0);
/// ```
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        $crate::profiling::tracy_plot!($name, $value as f64)
    };
}

/// Plot a value (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        let _ = $value;
    };
}

pub use frame_mark;
pub use profile_plot;
pub use profile_scope;
pub use profile_scope_dynamic;
