/// Frame orchestration: the command queue, render passes and frame output
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Duration;

use nalgebra::Point2;

use crate::config::{
    clamp_to, FillStyle, RenderStyle, RendererConfig, ViewStyle, CAMERA_DISTANCE_RANGE,
    PIXEL_GRID_RANGE,
};
use crate::edges::{select_visible_edges, EdgeGroup};
use crate::error::{RenderError, Result};
use crate::mesh::{Mesh, MeshSource};
use crate::model::ModelState;
use crate::projection::{project_to_screen, Camera, Viewport};
use crate::raster::{PixelGrid, RasterLine};
use crate::shading::{shade_faces, Lighting, VisibleFace};
use crate::transform::RotationState;

/// A configuration change or one-shot request, applied between passes.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SelectModel(String),
    /// Move the camera (and the model's fitted size) by this many units.
    Zoom(f64),
    SetRotationAxis([f64; 3]),
    SetRotationSpeed(f64),
    SetFill(FillStyle),
    SetView(ViewStyle),
    CycleFill,
    CycleView,
    SetPixelGrid(f64),
    SetPaused(bool),
    TogglePause,
    /// Hidden surfaces skip every pass.
    SetVisible(bool),
    Resize { width: f64, height: f64 },
    CenterModel,
    /// Rewind the rotation, restore default styles and pause.
    ResetModel,
    /// Pause and render one frame forward.
    StepFrame,
}

/// A visible face as a screen-space polygon
#[derive(Debug, Clone, PartialEq)]
pub struct FacePolygon {
    pub face: usize,
    pub color: f64,
    pub points: Vec<Point2<f64>>,
}

/// Something to draw on top of a face
#[derive(Debug, Clone, PartialEq)]
pub enum Stroke {
    Line {
        from: Point2<f64>,
        to: Point2<f64>,
        color: f64,
    },
    /// Grid cells to fill, each given by its top-left corner.
    Pixels { cells: Vec<Point2<f64>>, color: f64 },
}

/// A face (if any) followed by the strokes painted right after it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layer {
    pub face: Option<FacePolygon>,
    pub strokes: Vec<Stroke>,
}

/// Everything presentation needs for one frame, in paint order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub layers: Vec<Layer>,
    /// Cell size for [`Stroke::Pixels`].
    pub pixel_size: f64,
}

impl Frame {
    pub fn faces(&self) -> impl Iterator<Item = &FacePolygon> {
        self.layers.iter().filter_map(|layer| layer.face.as_ref())
    }

    pub fn strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.layers.iter().flat_map(|layer| layer.strokes.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Owns the model state and runs the pipeline.
///
/// External writers talk to it through [`Renderer::commands`]; the queue is
/// drained at the start of every [`Renderer::tick`], so a pass never sees a
/// half-applied change.
pub struct Renderer<S: MeshSource> {
    source: S,
    config: RendererConfig,
    camera: Camera,
    viewport: Viewport,
    grid: PixelGrid,
    lighting: Lighting,
    rotation: RotationState,
    style: RenderStyle,
    model: Option<ModelState>,
    paused: bool,
    visible: bool,
    /// A pass was skipped while hidden; replayed once the surface shows again.
    stale: bool,
    /// Last observed frame delta, reused by [`Command::StepFrame`].
    last_delta: f64,

    screen: Vec<Point2<f64>>,
    visible_faces: Vec<VisibleFace>,
    edge_groups: Vec<EdgeGroup>,
    raster: Vec<Vec<RasterLine>>,
    frame: Frame,
    passes: u64,

    sender: Sender<Command>,
    receiver: Receiver<Command>,
}

impl<S: MeshSource> Renderer<S> {
    /// Build a renderer and load `config.model`.
    ///
    /// A missing or unusable initial model is logged and leaves the renderer
    /// empty; every pass is then a no-op until a model is selected.
    pub fn new(source: S, config: RendererConfig) -> Result<Self> {
        config.validate()?;

        let (sender, receiver) = mpsc::channel();
        let mut renderer = Self {
            source,
            camera: Camera::new(config.camera_distance, config.camera_intensity),
            viewport: Viewport::new(config.surface_width, config.surface_height, config.spacing_unit),
            grid: PixelGrid::new(
                config.pixel_grid_size,
                config.resolution_depth,
                config.surface_width,
                config.surface_height,
            ),
            lighting: Lighting::new(config.ambient_intensity, config.camera_intensity),
            rotation: RotationState::new(config.rotation_axis, config.rotation_speed),
            style: config.style,
            model: None,
            paused: config.paused,
            visible: true,
            stale: false,
            last_delta: 1.0,
            screen: Vec::new(),
            visible_faces: Vec::new(),
            edge_groups: Vec::new(),
            raster: Vec::new(),
            frame: Frame::default(),
            passes: 0,
            sender,
            receiver,
            config,
        };

        let initial = renderer.config.model.clone();
        match renderer.load_model(&initial) {
            Ok(model) => {
                renderer.model = Some(model);
                renderer.render_pass(None)?;
            }
            Err(e) => log::warn!("initial model unavailable: {e}"),
        }

        Ok(renderer)
    }

    /// A handle for queueing commands from elsewhere.
    pub fn commands(&self) -> Sender<Command> {
        self.sender.clone()
    }

    /// Advance by `elapsed` wall time: apply queued commands, then run a
    /// continuous pass if the model is spinning, unpaused and visible.
    ///
    /// The first failing command is returned; later commands stay queued.
    pub fn tick(&mut self, elapsed: Duration) -> Result<()> {
        self.last_delta = elapsed.as_secs_f64() * self.config.reference_fps;

        loop {
            match self.receiver.try_recv() {
                Ok(command) => {
                    if let Err(e) = self.apply(command) {
                        log::warn!("command rejected: {e}");
                        return Err(e);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if !self.paused && self.rotation.is_active() {
            self.render_pass(Some(self.last_delta))?;
        }
        Ok(())
    }

    /// Apply one command now, re-rendering on demand when it changes the picture.
    pub fn apply(&mut self, command: Command) -> Result<()> {
        log::trace!("applying {command:?}");
        match command {
            Command::SelectModel(name) => {
                if self.model.as_ref().is_some_and(|m| m.name() == name) {
                    return Ok(());
                }
                let model = self.load_model(&name)?;
                self.model = Some(model);
                self.render_pass(None)
            }
            Command::Zoom(delta) => {
                let delta = finite("zoom", delta)?;
                let distance = clamp_to(self.camera.distance + delta, &CAMERA_DISTANCE_RANGE);
                if let Some(model) = self.model.as_mut() {
                    model.rescale(distance)?;
                }
                self.camera.distance = distance;
                self.render_pass(None)
            }
            Command::SetRotationAxis(weights) => {
                for weight in weights {
                    finite("rotation axis weight", weight)?;
                }
                self.rotation.set_axis(weights);
                self.render_pass(None)
            }
            Command::SetRotationSpeed(speed) => {
                self.rotation.set_speed(finite("rotation speed", speed)?);
                self.render_pass(None)
            }
            Command::SetFill(fill) => self.set_style(RenderStyle { fill, ..self.style }),
            Command::SetView(view) => self.set_style(RenderStyle { view, ..self.style }),
            Command::CycleFill => self.set_style(RenderStyle {
                fill: self.style.fill.next(),
                ..self.style
            }),
            Command::CycleView => self.set_style(RenderStyle {
                view: self.style.view.next(),
                ..self.style
            }),
            Command::SetPixelGrid(size) => {
                let size = finite("pixel grid size", size)?;
                self.grid = PixelGrid::new(
                    clamp_to(size, &PIXEL_GRID_RANGE),
                    self.config.resolution_depth,
                    self.viewport.width,
                    self.viewport.height,
                );
                self.render_pass(None)
            }
            Command::SetPaused(paused) => {
                self.paused = paused;
                Ok(())
            }
            Command::TogglePause => {
                self.paused = !self.paused;
                Ok(())
            }
            Command::SetVisible(visible) => {
                self.visible = visible;
                if visible && self.stale {
                    self.render_pass(None)
                } else {
                    Ok(())
                }
            }
            Command::Resize { width, height } => {
                if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
                    return Err(RenderError::InvalidConfig(format!(
                        "surface size {width}x{height}"
                    )));
                }
                self.viewport.width = width;
                self.viewport.height = height;
                self.grid = PixelGrid::new(self.grid.size, self.grid.resolution_depth, width, height);
                self.center_model()
            }
            Command::CenterModel => self.center_model(),
            Command::ResetModel => {
                self.rotation.reset();
                self.style = RenderStyle::default();
                self.paused = true;
                self.center_model()
            }
            Command::StepFrame => {
                self.paused = true;
                self.render_pass(Some(self.last_delta))
            }
        }
    }

    fn load_model(&self, name: &str) -> Result<ModelState> {
        let mesh: &Mesh = self
            .source
            .mesh(name)
            .ok_or_else(|| RenderError::ModelNotFound(name.to_string()))?;
        if self.style.fill.needs_normals() && !mesh.has_face_normals() {
            return Err(RenderError::MissingNormals {
                model: name.to_string(),
                faces: mesh.faces.len(),
                normals: mesh.normals.len(),
            });
        }
        ModelState::load(name, mesh, self.camera.distance, self.style.renders_edges())
    }

    fn set_style(&mut self, style: RenderStyle) -> Result<()> {
        if let Some(model) = &self.model {
            if style.fill.needs_normals() && !model.has_normals() {
                return Err(RenderError::MissingNormals {
                    model: model.name().to_string(),
                    faces: model.faces().len(),
                    normals: model.normals().len(),
                });
            }
        }
        self.style = style;
        self.render_pass(None)
    }

    fn center_model(&mut self) -> Result<()> {
        let focal = self.camera.focal_length();
        if let Some(model) = self.model.as_mut() {
            model.reset_live(focal);
        }
        self.render_pass(None)
    }

    /// One pass of the pipeline: rotate, shade, project, select edges,
    /// rasterize, then assemble the frame.
    ///
    /// `delta` advances the rotation first; on-demand passes pass `None`.
    /// Hidden surfaces and missing models skip the pass without touching state.
    fn render_pass(&mut self, delta: Option<f64>) -> Result<()> {
        if !self.visible {
            log::trace!("surface hidden; pass skipped");
            self.stale = true;
            return Ok(());
        }
        let Some(model) = self.model.as_mut() else {
            return Ok(());
        };

        let style = self.style;
        let focal = self.camera.focal_length();

        if self.rotation.is_active() {
            if let Some(delta) = delta {
                self.rotation.advance(delta);
            }
            model.apply_rotation(&self.rotation.quaternion(), focal, style.shades_faces());
        } else {
            model.reset_live(focal);
        }

        self.visible_faces.clear();
        if style.shades_faces() {
            if !model.has_normals() {
                return Err(RenderError::MissingNormals {
                    model: model.name().to_string(),
                    faces: model.faces().len(),
                    normals: model.normals().len(),
                });
            }
            self.visible_faces = shade_faces(
                model.vertices(),
                model.faces(),
                model.normals(),
                &self.camera.position(),
                &self.lighting,
            );
        }

        project_to_screen(&self.camera, &self.viewport, model.vertices(), &mut self.screen);

        self.edge_groups.clear();
        if style.renders_edges() {
            self.edge_groups = select_visible_edges(model.edges(), &self.visible_faces, style.fill);
        }

        self.raster.clear();
        if style.view == ViewStyle::Pixelated {
            self.rasterize();
        }

        self.frame = self.assemble_frame();
        self.stale = false;
        self.passes += 1;
        log::trace!(
            "pass {}: {} faces, {} edge groups",
            self.passes,
            self.visible_faces.len(),
            self.edge_groups.len()
        );
        Ok(())
    }

    /// Rasterize every selected edge, second vertex first.
    fn rasterize(&mut self) {
        let solid = self.style.fill == FillStyle::Solid;
        let default_color = self.lighting.camera;

        self.raster = self
            .edge_groups
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let color = match self.visible_faces.get(i) {
                    Some(face) if solid => face.color,
                    _ => default_color,
                };
                group
                    .edges
                    .iter()
                    .map(|&[a, b]| RasterLine {
                        cells: self.grid.rasterize_edge(&self.screen[b], &self.screen[a]),
                        color,
                    })
                    .collect()
            })
            .collect();
    }

    fn assemble_frame(&self) -> Frame {
        let face_color = |face: &VisibleFace| match self.style.fill {
            FillStyle::Solid => face.color,
            _ => self.lighting.ambient,
        };

        let strokes_for = |i: usize| -> Vec<Stroke> {
            match self.style.view {
                ViewStyle::Pixelated => self
                    .raster
                    .get(i)
                    .map(|lines| {
                        lines
                            .iter()
                            .map(|line| Stroke::Pixels {
                                cells: line.cells.clone(),
                                color: line.color,
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
                ViewStyle::Polygonal => self
                    .edge_groups
                    .get(i)
                    .map(|group| {
                        group
                            .edges
                            .iter()
                            .map(|&[a, b]| Stroke::Line {
                                from: self.screen[a],
                                to: self.screen[b],
                                color: self.lighting.camera,
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            }
        };

        let layers = if self.style.shades_faces() {
            self.visible_faces
                .iter()
                .enumerate()
                .map(|(i, face)| Layer {
                    face: Some(FacePolygon {
                        face: face.face,
                        color: face_color(face),
                        points: face.vertices.iter().map(|&v| self.screen[v]).collect(),
                    }),
                    strokes: strokes_for(i),
                })
                .collect()
        } else {
            (0..self.edge_groups.len())
                .map(|i| Layer {
                    face: None,
                    strokes: strokes_for(i),
                })
                .collect()
        };

        Frame {
            layers,
            pixel_size: self.grid.size,
        }
    }

    /// The output of the last completed pass.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn model(&self) -> Option<&ModelState> {
        self.model.as_ref()
    }

    pub fn visible_faces(&self) -> &[VisibleFace] {
        &self.visible_faces
    }

    pub fn edge_groups(&self) -> &[EdgeGroup] {
        &self.edge_groups
    }

    pub fn raster_lines(&self) -> &[Vec<RasterLine>] {
        &self.raster
    }

    pub fn screen_positions(&self) -> &[Point2<f64>] {
        &self.screen
    }

    pub fn style(&self) -> RenderStyle {
        self.style
    }

    pub fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Model names in display order, for number-key selection.
    pub fn model_names(&self) -> Vec<String> {
        self.source.names()
    }
}

fn finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RenderError::InvalidConfig(format!(
            "{name} must be finite, got {value}"
        )))
    }
}
