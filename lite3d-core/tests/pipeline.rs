use std::collections::HashSet;
use std::f64::consts::PI;
use std::time::Duration;

use approx::assert_relative_eq;
use lite3d_core::edges::EdgeKey;
use lite3d_core::{
    Command, Face, FillStyle, Mesh, MeshLibrary, RenderError, RenderStyle, Renderer,
    RendererConfig, Stroke, Vec3, ViewStyle,
};

fn library() -> MeshLibrary {
    let mut library = MeshLibrary::with_presets();
    // A square with no normals: fine as a full wireframe, unusable for shading
    library.insert(
        "flat",
        Mesh::new(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            vec![Face::new(vec![0, 1, 2, 3])],
            Vec::new(),
        ),
    );
    library.insert(
        "speck",
        Mesh::new(
            vec![Vec3::new(2.0, 2.0, 2.0); 3],
            vec![Face::new(vec![0, 1, 2])],
            vec![Vec3::z()],
        ),
    );
    library
}

fn renderer_with(style: RenderStyle) -> Renderer<MeshLibrary> {
    let config = RendererConfig {
        style,
        ..Default::default()
    };
    Renderer::new(library(), config).unwrap()
}

#[test]
fn test_model_swap_replaces_geometry_and_edges() {
    let mut renderer = renderer_with(RenderStyle::new(FillStyle::WireframeFull, ViewStyle::Polygonal));
    {
        let model = renderer.model().unwrap();
        assert_eq!(model.vertices().len(), 8);
        assert_eq!(model.faces().len(), 6);
    }
    assert_eq!(renderer.edge_groups().len(), 12);

    renderer.apply(Command::SelectModel("pyramid".into())).unwrap();

    let model = renderer.model().unwrap();
    assert_eq!(model.name(), "pyramid");
    assert_eq!(model.vertices().len(), 5);
    assert_eq!(model.faces().len(), 5);
    assert_eq!(renderer.edge_groups().len(), 8);
    assert!(renderer
        .edge_groups()
        .iter()
        .flat_map(|g| &g.edges)
        .all(|&[a, b]| a < 5 && b < 5));
}

#[test]
fn test_zero_speed_is_deterministic() {
    let mut renderer = renderer_with(RenderStyle::default());
    renderer.apply(Command::SetRotationSpeed(0.0)).unwrap();
    let passes = renderer.passes();
    let frame = renderer.frame().clone();

    for _ in 0..5 {
        renderer.tick(Duration::from_millis(16)).unwrap();
    }
    assert_eq!(renderer.passes(), passes);
    assert_eq!(renderer.frame(), &frame);

    // On-demand passes reproduce the same picture
    renderer.apply(Command::CenterModel).unwrap();
    renderer.apply(Command::CenterModel).unwrap();
    assert_eq!(renderer.passes(), passes + 2);
    assert_eq!(renderer.frame(), &frame);
}

#[test]
fn test_zero_axis_leaves_model_unrotated() {
    let config = RendererConfig {
        rotation_axis: [0.0, 0.0, 0.0],
        ..Default::default()
    };
    let mut renderer = Renderer::new(library(), config).unwrap();
    renderer.tick(Duration::from_secs(2)).unwrap();
    renderer.apply(Command::StepFrame).unwrap();

    let model = renderer.model().unwrap();
    assert_eq!(renderer.rotation().angle(), 0.0);
    for (live, fixed) in model.vertices().iter().zip(model.static_vertices()) {
        assert_relative_eq!(*live, fixed - Vec3::new(0.0, 0.0, 15.0));
    }
}

#[test]
fn test_edges_built_on_first_style_that_needs_them() {
    let mut renderer = renderer_with(RenderStyle::default());
    assert!(!renderer.model().unwrap().edges_built());

    renderer.apply(Command::SetView(ViewStyle::Pixelated)).unwrap();
    assert!(renderer.model().unwrap().edges_built());
    assert!(!renderer.raster_lines().is_empty());
    assert!(renderer
        .frame()
        .strokes()
        .all(|s| matches!(s, Stroke::Pixels { .. })));
}

#[test]
fn test_pause_and_step() {
    let mut renderer = renderer_with(RenderStyle::default());
    let commands = renderer.commands();

    commands.send(Command::StepFrame).unwrap();
    renderer.tick(Duration::from_millis(100)).unwrap();

    // 100ms is 6 frame units at 60 fps, speed 5 turns π/100 per unit
    assert!(renderer.is_paused());
    assert_relative_eq!(renderer.rotation().angle(), 6.0 * PI / 100.0, epsilon = 1e-9);
    let passes = renderer.passes();

    renderer.tick(Duration::from_millis(100)).unwrap();
    assert_eq!(renderer.passes(), passes);

    renderer.apply(Command::TogglePause).unwrap();
    renderer.tick(Duration::from_millis(100)).unwrap();
    assert_eq!(renderer.passes(), passes + 1);
}

#[test]
fn test_reset_rewinds_and_pauses() {
    let mut renderer = renderer_with(RenderStyle::new(FillStyle::WireframeCull, ViewStyle::Pixelated));
    renderer.tick(Duration::from_millis(500)).unwrap();
    assert!(renderer.rotation().angle() > 0.0);

    renderer.apply(Command::ResetModel).unwrap();
    assert_eq!(renderer.rotation().angle(), 0.0);
    assert_eq!(renderer.style(), RenderStyle::default());
    assert!(renderer.is_paused());
}

#[test]
fn test_hidden_surface_skips_passes() {
    let mut renderer = renderer_with(RenderStyle::default());
    let frame = renderer.frame().clone();
    let passes = renderer.passes();

    renderer.apply(Command::SetVisible(false)).unwrap();
    renderer.tick(Duration::from_millis(16)).unwrap();
    renderer.apply(Command::CycleFill).unwrap();

    assert_eq!(renderer.passes(), passes);
    assert_eq!(renderer.frame(), &frame);

    renderer.apply(Command::SetVisible(true)).unwrap();
    renderer.tick(Duration::from_millis(16)).unwrap();
    assert_eq!(renderer.passes(), passes + 1);
}

#[test]
fn test_unknown_model_keeps_current() {
    let mut renderer = renderer_with(RenderStyle::default());
    let frame = renderer.frame().clone();

    assert_eq!(
        renderer.apply(Command::SelectModel("teapot".into())),
        Err(RenderError::ModelNotFound("teapot".into()))
    );
    assert_eq!(renderer.model().unwrap().name(), "cube");
    assert_eq!(renderer.frame(), &frame);
}

#[test]
fn test_degenerate_model_keeps_current() {
    let mut renderer = renderer_with(RenderStyle::default());
    assert_eq!(
        renderer.apply(Command::SelectModel("speck".into())),
        Err(RenderError::DegenerateModel("speck".into()))
    );
    assert_eq!(renderer.model().unwrap().name(), "cube");
}

#[test]
fn test_missing_normals_block_shading_styles() {
    let mut renderer = renderer_with(RenderStyle::default());
    assert!(matches!(
        renderer.apply(Command::SelectModel("flat".into())),
        Err(RenderError::MissingNormals { .. })
    ));
    assert_eq!(renderer.model().unwrap().name(), "cube");

    renderer.apply(Command::SetFill(FillStyle::WireframeFull)).unwrap();
    renderer.apply(Command::SelectModel("flat".into())).unwrap();
    assert_eq!(renderer.edge_groups().len(), 4);

    assert!(matches!(
        renderer.apply(Command::SetFill(FillStyle::WireframeCull)),
        Err(RenderError::MissingNormals { .. })
    ));
    assert_eq!(renderer.style().fill, FillStyle::WireframeFull);
}

#[test]
fn test_unknown_initial_model_renders_nothing() {
    let config = RendererConfig {
        model: "missing".into(),
        ..Default::default()
    };
    let mut renderer = Renderer::new(library(), config).unwrap();
    assert!(renderer.model().is_none());
    renderer.tick(Duration::from_millis(16)).unwrap();
    assert_eq!(renderer.passes(), 0);
    assert!(renderer.frame().is_empty());
}

#[test]
fn test_invalid_config_rejected() {
    let config = RendererConfig {
        pixel_grid_size: 50.0,
        ..Default::default()
    };
    assert!(matches!(
        Renderer::new(library(), config),
        Err(RenderError::InvalidConfig(_))
    ));
}

#[test]
fn test_visible_edges_are_unique_and_cover_visible_faces() {
    let mut renderer = renderer_with(RenderStyle::new(FillStyle::WireframeCull, ViewStyle::Polygonal));
    renderer.apply(Command::SelectModel("icosahedron".into())).unwrap();
    renderer.tick(Duration::from_millis(700)).unwrap();

    let groups = renderer.edge_groups();
    let visible = renderer.visible_faces();
    assert_eq!(groups.len(), visible.len());

    let mut emitted = HashSet::new();
    for group in groups {
        for &[a, b] in &group.edges {
            assert!(emitted.insert(EdgeKey::new(a, b)), "edge [{a},{b}] emitted twice");
        }
    }

    let model = renderer.model().unwrap();
    let expected: HashSet<EdgeKey> = visible
        .iter()
        .flat_map(|face| {
            let slots = &model.faces()[face.face].vertices;
            (0..slots.len()).map(move |i| EdgeKey::new(slots[i], slots[(i + 1) % slots.len()]))
        })
        .collect();
    assert_eq!(emitted, expected);

    // Groups line up with faces, and strokes with groups
    for (group, face) in groups.iter().zip(visible) {
        assert_eq!(group.face, Some(face.face));
    }
    assert_eq!(renderer.frame().strokes().count(), emitted.len());
}

#[test]
fn test_zoom_and_pixel_grid_are_clamped() {
    let mut renderer = renderer_with(RenderStyle::new(FillStyle::Solid, ViewStyle::Pixelated));
    renderer.apply(Command::Zoom(100.0)).unwrap();
    assert_eq!(renderer.camera().distance, 25.0);
    assert_relative_eq!(renderer.model().unwrap().placement().scale, 12.5);

    renderer.apply(Command::SetPixelGrid(1.0)).unwrap();
    assert_eq!(renderer.frame().pixel_size, 2.0);
}

#[test]
fn test_resize() {
    let mut renderer = renderer_with(RenderStyle::default());
    renderer
        .apply(Command::Resize {
            width: 800.0,
            height: 600.0,
        })
        .unwrap();
    // The model centre maps to the middle of the new surface
    let screen = renderer.screen_positions();
    let centre = screen.iter().fold(Vec3::zeros(), |acc, p| acc + Vec3::new(p.x, p.y, 0.0))
        / screen.len() as f64;
    assert_relative_eq!(centre.x, 400.0, epsilon = 1e-6);

    assert!(matches!(
        renderer.apply(Command::Resize {
            width: 0.0,
            height: 600.0
        }),
        Err(RenderError::InvalidConfig(_))
    ));
}
