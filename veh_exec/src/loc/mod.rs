//! # Localisation module
//!
//! This module provides localisation for the vehicle by dead reckoning. Each tick the fore-aft and
//! lateral tracking wheel deltas are rotated into the field frame using the current heading and
//! added to the position. There is no absolute position reference, so the error grows with the
//! distance travelled.
//!
//! The field frame has heading 0 pointing along +y and heading 90 along +x.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod sens_fusion;
pub use sens_fusion::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::Vector2;
use serde::Serialize;
use veh_if::eqpt::Sensors;

use util::maths::norm_deg;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose of the vehicle in the field frame.
#[derive(Debug, Copy, Clone, Serialize, Default, PartialEq)]
pub struct Pose {
    /// Position in the field frame
    pub position: Vector2<f64>,

    /// Heading in degrees, in [0, 360)
    pub heading_deg: f64,
}

/// Owns the pose estimate and the previous sensor accumulators.
#[derive(Debug, Clone, Default)]
pub struct LocMgr {
    pose: Pose,

    prev_sample: FusedSample,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x: f64, y: f64, heading_deg: f64) -> Self {
        Self {
            position: Vector2::new(x, y),
            heading_deg,
        }
    }

    pub fn x(&self) -> f64 {
        self.position[0]
    }

    pub fn y(&self) -> f64 {
        self.position[1]
    }

    /// Euclidian distance to a point.
    pub fn dist_to(&self, target: &Vector2<f64>) -> f64 {
        (target - self.position).norm()
    }

    /// Field frame bearing from this pose to a point in degrees, in [0, 360).
    ///
    /// A point straight ahead along +y is at 0, along +x is at 90. Points due east or west of the
    /// pose are handled like any other.
    pub fn bearing_to_deg(&self, target: &Vector2<f64>) -> f64 {
        let diff = target - self.position;
        norm_deg(diff[0].atan2(diff[1]).to_degrees())
    }
}

impl LocMgr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Read the sensors and integrate the motion since the last update.
    pub fn update_from<S: Sensors + ?Sized>(&mut self, sens: &S) -> MotionDelta {
        self.update(&FusedSample::read(sens))
    }

    /// Integrate a new fused sample into the pose.
    ///
    /// The deltas are rotated using the heading of the new sample. The previous accumulators are
    /// always replaced by the new ones.
    pub fn update(&mut self, sample: &FusedSample) -> MotionDelta {
        let delta = sample.delta_from(&self.prev_sample);
        self.prev_sample = *sample;

        let (sin_h, cos_h) = sample.heading_deg.to_radians().sin_cos();

        self.pose.position += Vector2::new(
            delta.forward * sin_h + delta.lateral * cos_h,
            delta.forward * cos_h - delta.lateral * sin_h,
        );
        self.pose.heading_deg = sample.heading_deg;

        trace!(
            "Pose: ({:.2}, {:.2}) @ {:.2} deg, delta {:?}",
            self.pose.x(),
            self.pose.y(),
            self.pose.heading_deg,
            delta
        );

        delta
    }
}
