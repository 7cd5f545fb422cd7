/// Camera, drawing surface and the weak-perspective projection
use nalgebra::Point2;

use crate::math::{Vec3, EPSILON};

/// Camera on the +z axis looking toward the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Distance from the origin; also the focal length.
    pub distance: f64,
    /// Intensity of the light carried with the camera (0..255).
    pub light_intensity: f64,
}

impl Camera {
    pub fn new(distance: f64, light_intensity: f64) -> Self {
        Self {
            distance,
            light_intensity,
        }
    }

    pub fn focal_length(&self) -> f64 {
        self.distance
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    /// Project a camera-space point onto the z = 0 plane.
    ///
    /// `x' = f·x/(f−z)`, `y' = f·y/(f−z)`. A denominator closer to zero than
    /// [`EPSILON`] is clamped, keeping its sign.
    pub fn project(&self, p: &Vec3) -> Point2<f64> {
        let f = self.focal_length();
        let mut denom = f - p.z;
        if denom.abs() < EPSILON {
            log::warn!("projection denominator {denom:e} clamped (z = {})", p.z);
            denom = if denom < 0.0 { -EPSILON } else { EPSILON };
        }
        Point2::new(f * p.x / denom, f * p.y / denom)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(15.0, 215.0)
    }
}

/// The drawing surface that graph coordinates are mapped onto
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Device units per graph unit.
    pub spacing: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, spacing: f64) -> Self {
        Self {
            width,
            height,
            spacing,
        }
    }

    /// Map graph coordinates to device coordinates: origin at the surface
    /// centre, y pointing down.
    pub fn to_device(&self, p: &Point2<f64>) -> Point2<f64> {
        Point2::new(
            p.x * self.spacing + self.width / 2.0,
            -p.y * self.spacing + self.height / 2.0,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1366.0, 768.0, 40.0)
    }
}

/// Project then map every live vertex, in that order.
pub fn project_to_screen(
    camera: &Camera,
    viewport: &Viewport,
    vertices: &[Vec3],
    screen: &mut Vec<Point2<f64>>,
) {
    screen.clear();
    screen.extend(
        vertices
            .iter()
            .map(|v| viewport.to_device(&camera.project(v))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::default();
        assert_eq!(camera.focal_length(), 15.0);
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 15.0));
    }

    #[test]
    fn test_weak_perspective() {
        let camera = Camera::new(10.0, 215.0);
        // Points at z = 0 are unscaled
        assert_relative_eq!(camera.project(&Vec3::new(2.0, -3.0, 0.0)), Point2::new(2.0, -3.0));
        // Pushed back by f they shrink by half
        assert_relative_eq!(camera.project(&Vec3::new(2.0, -3.0, -10.0)), Point2::new(1.0, -1.5));
    }

    #[test]
    fn test_projection_guard() {
        let camera = Camera::new(10.0, 215.0);
        let p = camera.project(&Vec3::new(1.0, 1.0, 10.0));
        assert!(p.x.is_finite() && p.y.is_finite());
        assert!(p.x > 0.0);
    }

    #[test]
    fn test_device_mapping_flips_y() {
        let viewport = Viewport::new(800.0, 600.0, 40.0);
        assert_relative_eq!(viewport.to_device(&Point2::origin()), Point2::new(400.0, 300.0));
        assert_relative_eq!(viewport.to_device(&Point2::new(1.0, 1.0)), Point2::new(440.0, 260.0));
    }

    #[test]
    fn test_project_to_screen_order() {
        let camera = Camera::new(10.0, 215.0);
        let viewport = Viewport::new(100.0, 100.0, 10.0);
        let mut screen = vec![Point2::new(9.0, 9.0)];
        project_to_screen(&camera, &viewport, &[Vec3::new(1.0, 1.0, -10.0)], &mut screen);
        assert_eq!(screen.len(), 1);
        assert_relative_eq!(screen[0], Point2::new(55.0, 45.0));
    }
}
