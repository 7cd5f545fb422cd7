/// DDA line walking snapped onto a coarse pixel grid
use std::collections::HashSet;

use nalgebra::Point2;

use crate::math::EPSILON;

/// Pixel grid geometry for one drawing surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelGrid {
    /// Cell edge length in device units.
    pub size: f64,
    /// DDA samples per cell length.
    pub resolution_depth: f64,
    /// Offset that centres the grid on the surface.
    pub margin: Point2<f64>,
}

impl PixelGrid {
    pub fn new(size: f64, resolution_depth: f64, surface_width: f64, surface_height: f64) -> Self {
        Self {
            size,
            resolution_depth,
            margin: Point2::new(
                surface_width.rem_euclid(size) / 2.0,
                surface_height.rem_euclid(size) / 2.0,
            ),
        }
    }

    /// Distance walked per DDA step.
    pub fn ratio(&self) -> f64 {
        self.size / self.resolution_depth
    }

    fn snap(&self, raw: f64, margin: f64) -> f64 {
        let raw = raw + EPSILON;
        raw - (raw - margin).rem_euclid(self.size)
    }

    /// Integer cell coordinates of a snapped point.
    fn cell(&self, snapped: &Point2<f64>) -> (i64, i64) {
        (
            ((snapped.x - self.margin.x) / self.size).round() as i64,
            ((snapped.y - self.margin.y) / self.size).round() as i64,
        )
    }

    /// Walk from `origin` to `target` and return the distinct grid cells hit,
    /// in first-visit order. Each cell is given by its snapped top-left corner.
    pub fn rasterize_edge(&self, origin: &Point2<f64>, target: &Point2<f64>) -> Vec<Point2<f64>> {
        let distance = *target - *origin;
        let steps = (distance.x.abs().max(distance.y.abs()) / self.ratio()).ceil();

        if !steps.is_finite() || steps < 1.0 {
            return vec![Point2::new(
                self.snap(origin.x, self.margin.x),
                self.snap(origin.y, self.margin.y),
            )];
        }

        let increment = distance / steps;
        let steps = steps as usize;

        let mut seen = HashSet::with_capacity(steps + 1);
        let mut cells = Vec::new();
        for k in 0..=steps {
            let raw = *origin + increment * k as f64;
            let snapped = Point2::new(
                self.snap(raw.x, self.margin.x),
                self.snap(raw.y, self.margin.y),
            );
            if seen.insert(self.cell(&snapped)) {
                cells.push(snapped);
            }
        }
        cells
    }
}

/// One rasterized edge ready to paint
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLine {
    pub cells: Vec<Point2<f64>>,
    pub color: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(size: f64) -> PixelGrid {
        PixelGrid {
            size,
            resolution_depth: 8.0,
            margin: Point2::origin(),
        }
    }

    #[test]
    fn test_margin_centres_grid() {
        let grid = PixelGrid::new(11.0, 8.0, 1366.0, 768.0);
        // 1366 = 124·11 + 2, 768 = 69·11 + 9
        assert_relative_eq!(grid.margin.x, 1.0);
        assert_relative_eq!(grid.margin.y, 4.5);
        assert_relative_eq!(grid.ratio(), 11.0 / 8.0);
    }

    #[test]
    fn test_horizontal_edge_endpoints() {
        let grid = grid(5.0);
        let cells = grid.rasterize_edge(&Point2::new(0.0, 0.0), &Point2::new(10.0, 0.0));

        assert_eq!(cells.first(), Some(&Point2::new(0.0, 0.0)));
        assert_eq!(cells.last(), Some(&Point2::new(10.0, 0.0)));
        assert_eq!(
            cells,
            vec![Point2::new(0.0, 0.0), Point2::new(5.0, 0.0), Point2::new(10.0, 0.0)]
        );
    }

    #[test]
    fn test_no_duplicate_cells() {
        let grid = grid(4.0);
        let cells = grid.rasterize_edge(&Point2::new(3.0, 1.0), &Point2::new(41.0, 27.0));
        let distinct: HashSet<_> = cells.iter().map(|p| grid.cell(p)).collect();
        assert_eq!(distinct.len(), cells.len());
    }

    #[test]
    fn test_direction_does_not_change_cell_set() {
        let grid = PixelGrid::new(7.0, 8.0, 800.0, 600.0);
        let edges = [
            (Point2::new(12.5, 40.0), Point2::new(300.25, 77.0)),
            (Point2::new(100.0, 100.0), Point2::new(20.0, 410.0)),
            (Point2::new(-30.0, 5.0), Point2::new(30.0, -5.0)),
        ];
        for (a, b) in edges {
            let mut forward: Vec<_> = grid.rasterize_edge(&a, &b).iter().map(|p| grid.cell(p)).collect();
            let mut backward: Vec<_> = grid.rasterize_edge(&b, &a).iter().map(|p| grid.cell(p)).collect();
            forward.sort_unstable();
            backward.sort_unstable();
            assert_eq!(forward, backward);
        }
    }

    #[test]
    fn test_zero_length_edge() {
        let grid = grid(5.0);
        let cells = grid.rasterize_edge(&Point2::new(7.0, 8.0), &Point2::new(7.0, 8.0));
        assert_eq!(cells, vec![Point2::new(5.0, 5.0)]);
    }

    #[test]
    fn test_negative_coordinates_snap_down() {
        let grid = grid(5.0);
        let cells = grid.rasterize_edge(&Point2::new(-3.0, -3.0), &Point2::new(-3.0, -3.0));
        assert_eq!(cells.len(), 1);
        assert_relative_eq!(cells[0], Point2::new(-5.0, -5.0), epsilon = 1e-9);
    }
}
