/// Quaternion rotation state and the per-frame snapshot transform
use std::f64::consts::PI;

use nalgebra::Quaternion;

use crate::config::{clamp_to, AXIS_WEIGHT_LIMIT, ROTATION_SPEED_RANGE};
use crate::math::{normalize_or_zero, rotate_vector, rotation_quaternion, Vec3};

/// Spin about a fixed axis at a fixed speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    /// Raw axis weights as configured.
    weights: Vec3,
    /// Normalized axis, zero when no rotation is configured.
    axis: Vec3,
    /// Speed setting (0..=10).
    speed: f64,
    /// Accumulated angle in radians.
    angle: f64,
}

impl RotationState {
    pub fn new(weights: [f64; 3], speed: f64) -> Self {
        let mut state = Self::zero();
        state.set_axis(weights);
        state.set_speed(speed);
        state
    }

    pub fn zero() -> Self {
        Self {
            weights: Vec3::zeros(),
            axis: Vec3::zeros(),
            speed: 0.0,
            angle: 0.0,
        }
    }

    /// Set the axis weights (each clamped to ±100) and renormalize.
    /// Non-finite weights are ignored.
    pub fn set_axis(&mut self, weights: [f64; 3]) {
        if !weights.iter().all(|w| w.is_finite()) {
            log::warn!("ignoring non-finite rotation axis {weights:?}");
            return;
        }
        let limit = -AXIS_WEIGHT_LIMIT..=AXIS_WEIGHT_LIMIT;
        self.weights = Vec3::from(weights.map(|w| clamp_to(w, &limit)));
        self.axis = normalize_or_zero(&self.weights);
    }

    pub fn set_speed(&mut self, speed: f64) {
        if !speed.is_finite() {
            log::warn!("ignoring non-finite rotation speed {speed}");
            return;
        }
        self.speed = clamp_to(speed, &ROTATION_SPEED_RANGE);
    }

    pub fn weights(&self) -> [f64; 3] {
        self.weights.into()
    }

    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Radians per frame unit.
    pub fn angular_speed(&self) -> f64 {
        self.speed * PI / 500.0
    }

    pub fn has_axis(&self) -> bool {
        self.axis != Vec3::zeros()
    }

    /// Rotation only happens with a non-zero axis and a non-zero speed.
    pub fn is_active(&self) -> bool {
        self.has_axis() && self.speed != 0.0
    }

    /// Advance the angle by `delta` frame units. No-op while inactive.
    pub fn advance(&mut self, delta: f64) {
        if self.is_active() && delta.is_finite() {
            self.angle += self.angular_speed() * delta;
        }
    }

    pub fn reset(&mut self) {
        self.angle = 0.0;
    }

    /// `(cos(θ/2), sin(θ/2)·axis)` for the current angle.
    pub fn quaternion(&self) -> Quaternion<f64> {
        rotation_quaternion(self.angle, &self.axis)
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Re-derive `live` from the un-rotated `snapshot`, never from the previous frame.
///
/// `None` copies the snapshot unchanged. Every result is then pushed back
/// along z by `depth_offset`.
pub fn derive_from_snapshot(
    rotation: Option<&Quaternion<f64>>,
    snapshot: &[Vec3],
    depth_offset: f64,
    live: &mut Vec<Vec3>,
) {
    let offset = Vec3::new(0.0, 0.0, depth_offset);
    live.clear();
    match rotation {
        Some(q) => {
            let q_inv = q.conjugate();
            live.extend(snapshot.iter().map(|p| rotate_vector(q, &q_inv, p) - offset));
        }
        None => live.extend(snapshot.iter().map(|p| p - offset)),
    }
}
