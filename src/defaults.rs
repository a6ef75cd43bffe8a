//! Engine defaults and the configuration built on top of them.

use crate::types::Point;

/// Two atomic values compare equal when they differ by at most this much.
pub const EQUALITY_TOLERANCE: f64 = 0.02;
/// Raw coordinate count above which polylines are simplified.
pub const SIMPLIFY_THRESHOLD: usize = 50;
pub const SIMPLIFY_EPSILON: f64 = 0.01;
pub const MAX_REPEAT_ITERATIONS: usize = 30;
/// Slack for "point inside circumcircle" tests during triangulation.
pub const DELAUNAY_EPSILON: f64 = 1e-9;
pub const GEOMETRY_EPSILON: f64 = 1e-9;
/// Angular resolution when an arc is flattened into points.
pub const ARC_STEP_DEGREES: f64 = 5.0;
pub const DEFAULT_DASH_ON: f64 = 0.2;
pub const DEFAULT_DASH_OFF: f64 = 0.1;
/// Most dashes a single dashed line may split into.
pub const MAX_DASH_COUNT: usize = 10_000;
pub const PLOT_SAMPLES: usize = 64;

/// Maps a sheet coordinate into the host's coordinate space before it is
/// handed to a renderer or export surface.
pub type OffsetFn = fn(Point) -> Point;

pub fn identity_offset(p: Point) -> Point {
    p
}

/// Tunables for evaluation and playback.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub equality_tolerance: f64,
    pub simplify_threshold: usize,
    pub simplify_epsilon: f64,
    pub max_repeat_iterations: usize,
    pub max_dash_count: usize,
    pub arc_step: f64,
    pub plot_samples: usize,
    pub offset: OffsetFn,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            equality_tolerance: EQUALITY_TOLERANCE,
            simplify_threshold: SIMPLIFY_THRESHOLD,
            simplify_epsilon: SIMPLIFY_EPSILON,
            max_repeat_iterations: MAX_REPEAT_ITERATIONS,
            max_dash_count: MAX_DASH_COUNT,
            arc_step: ARC_STEP_DEGREES,
            plot_samples: PLOT_SAMPLES,
            offset: identity_offset,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_equality_tolerance(mut self, tolerance: f64) -> Self {
        self.equality_tolerance = tolerance;
        self
    }

    pub fn with_simplify(mut self, threshold: usize, epsilon: f64) -> Self {
        self.simplify_threshold = threshold;
        self.simplify_epsilon = epsilon;
        self
    }

    pub fn with_max_repeat_iterations(mut self, max: usize) -> Self {
        self.max_repeat_iterations = max;
        self
    }

    pub fn with_max_dash_count(mut self, max: usize) -> Self {
        self.max_dash_count = max;
        self
    }

    pub fn with_arc_step(mut self, degrees: f64) -> Self {
        self.arc_step = degrees;
        self
    }

    pub fn with_plot_samples(mut self, samples: usize) -> Self {
        self.plot_samples = samples;
        self
    }

    /// Install the sheet offset applied to everything sent to a backend
    pub fn with_offset(mut self, offset: OffsetFn) -> Self {
        self.offset = offset;
        self
    }
}
