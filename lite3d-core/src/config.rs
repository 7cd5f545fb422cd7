/// Renderer configuration and display styles
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::{RenderError, Result};

/// How faces are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillStyle {
    /// Shaded faces.
    #[default]
    Solid,
    /// Every model edge, no faces, no culling.
    WireframeFull,
    /// Back faces culled, front faces filled flat, visible edges drawn.
    WireframeCull,
}

impl FillStyle {
    pub const ALL: [FillStyle; 3] = [Self::Solid, Self::WireframeFull, Self::WireframeCull];

    pub fn next(self) -> Self {
        match self {
            Self::Solid => Self::WireframeFull,
            Self::WireframeFull => Self::WireframeCull,
            Self::WireframeCull => Self::Solid,
        }
    }

    pub fn is_wireframe(self) -> bool {
        matches!(self, Self::WireframeFull | Self::WireframeCull)
    }

    /// Culling and shading need one normal per face.
    pub fn needs_normals(self) -> bool {
        self != Self::WireframeFull
    }
}

/// How edges are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewStyle {
    /// Straight vector lines.
    #[default]
    Polygonal,
    /// Lines snapped onto a coarse pixel grid.
    Pixelated,
}

impl ViewStyle {
    pub const ALL: [ViewStyle; 2] = [Self::Polygonal, Self::Pixelated];

    pub fn next(self) -> Self {
        match self {
            Self::Polygonal => Self::Pixelated,
            Self::Pixelated => Self::Polygonal,
        }
    }
}

/// The pair of display selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStyle {
    pub fill: FillStyle,
    pub view: ViewStyle,
}

impl RenderStyle {
    pub fn new(fill: FillStyle, view: ViewStyle) -> Self {
        Self { fill, view }
    }

    /// Edges are needed for wireframes and for the pixel grid.
    pub fn renders_edges(&self) -> bool {
        self.fill.is_wireframe() || self.view == ViewStyle::Pixelated
    }

    pub fn shades_faces(&self) -> bool {
        self.fill != FillStyle::WireframeFull
    }
}

impl fmt::Display for FillStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Solid => "solid",
            Self::WireframeFull => "wireframe-full",
            Self::WireframeCull => "wireframe-cull",
        })
    }
}

impl FromStr for FillStyle {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|style| style.to_string() == s)
            .ok_or_else(|| RenderError::InvalidConfig(format!("unknown fill style `{s}`")))
    }
}

impl fmt::Display for ViewStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Polygonal => "polygonal",
            Self::Pixelated => "pixelated",
        })
    }
}

impl FromStr for ViewStyle {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|style| style.to_string() == s)
            .ok_or_else(|| RenderError::InvalidConfig(format!("unknown view style `{s}`")))
    }
}

/// Allowed camera distances (zoom).
pub const CAMERA_DISTANCE_RANGE: RangeInclusive<f64> = 1.0..=25.0;
/// Allowed pixel grid cell sizes.
pub const PIXEL_GRID_RANGE: RangeInclusive<f64> = 2.0..=20.0;
/// Allowed rotation speeds.
pub const ROTATION_SPEED_RANGE: RangeInclusive<f64> = 0.0..=10.0;
/// Allowed magnitude of each rotation axis weight.
pub const AXIS_WEIGHT_LIMIT: f64 = 100.0;

/// Everything the renderer needs before the first pass
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    pub surface_width: f64,
    pub surface_height: f64,
    /// Device units per graph unit.
    pub spacing_unit: f64,
    pub pixel_grid_size: f64,
    /// DDA samples per grid cell.
    pub resolution_depth: f64,
    pub camera_distance: f64,
    pub ambient_intensity: f64,
    pub camera_intensity: f64,
    pub rotation_axis: [f64; 3],
    pub rotation_speed: f64,
    /// Elapsed time is measured in frames at this rate.
    pub reference_fps: f64,
    pub model: String,
    pub style: RenderStyle,
    /// Start without continuous rotation. Off by default so a new renderer spins.
    pub paused: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        let ambient = 20.0;
        Self {
            surface_width: 1366.0,
            surface_height: 768.0,
            spacing_unit: 40.0,
            pixel_grid_size: 11.0,
            resolution_depth: 8.0,
            camera_distance: 15.0,
            ambient_intensity: ambient,
            camera_intensity: 255.0 - ambient * 2.0,
            rotation_axis: [33.0, 33.0, 33.0],
            rotation_speed: 5.0,
            reference_fps: 60.0,
            model: "cube".to_string(),
            style: RenderStyle::default(),
            paused: false,
        }
    }
}

impl RendererConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("surface_width", self.surface_width),
            ("surface_height", self.surface_height),
            ("spacing_unit", self.spacing_unit),
            ("resolution_depth", self.resolution_depth),
            ("reference_fps", self.reference_fps),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(RenderError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        check_range("camera_distance", self.camera_distance, &CAMERA_DISTANCE_RANGE)?;
        check_range("pixel_grid_size", self.pixel_grid_size, &PIXEL_GRID_RANGE)?;
        check_range("rotation_speed", self.rotation_speed, &ROTATION_SPEED_RANGE)?;

        for weight in self.rotation_axis {
            check_range(
                "rotation_axis",
                weight,
                &(-AXIS_WEIGHT_LIMIT..=AXIS_WEIGHT_LIMIT),
            )?;
        }

        Ok(())
    }
}

fn check_range(name: &str, value: f64, range: &RangeInclusive<f64>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(RenderError::InvalidConfig(format!(
            "{name} = {value} outside {}..={}",
            range.start(),
            range.end()
        )))
    }
}

/// Clamp into an inclusive range.
pub fn clamp_to(value: f64, range: &RangeInclusive<f64>) -> f64 {
    value.clamp(*range.start(), *range.end())
}
