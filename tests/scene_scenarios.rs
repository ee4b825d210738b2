use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use typescape::gfx::geometry::text::{build_text_geometry, TextOptions};
use typescape::gfx::geometry::typeface::Typeface;
use typescape::gfx::scene::NodeKind;
use typescape::params::{ChangeTarget, ParamId, ParameterStore};
use typescape::scene::{FamilyDefinition, RotationPolicy, SceneBuilder, SceneState, ShapeFamily};

// Square "H", square "B" with a hole, triangular "?" fallback
const TYPEFACE: &str = r#"{
    "familyName": "Scenario",
    "resolution": 1000,
    "underlineThickness": 0,
    "boundingBox": { "yMin": 0, "yMax": 1000 },
    "glyphs": {
        "H": { "ha": 600, "o": "m 0 0 l 500 0 l 500 700 l 0 700 " },
        "B": { "ha": 600, "o": "m 0 0 l 0 700 l 500 700 l 500 0 m 100 100 l 400 100 l 400 600 l 100 600 " },
        "?": { "ha": 400, "o": "m 0 0 l 300 0 l 150 300 " },
        " ": { "ha": 250 }
    }
}"#;

fn typeface() -> Typeface {
    Typeface::from_json(TYPEFACE).unwrap()
}

fn seeded_scene(seed: u64) -> SceneState {
    let mut scene = SceneBuilder::new().seed(Some(seed)).build();
    scene.populate();
    scene
}

#[test]
fn default_population_counts() {
    let scene = seeded_scene(1);
    assert_eq!(scene.shape_count(ShapeFamily::Cube), 100);
    assert_eq!(scene.shape_count(ShapeFamily::Triangle), 200);
    assert_eq!(scene.shape_count(ShapeFamily::Donut), 200);
    assert_eq!(scene.graph().count_kind(NodeKind::Shape(ShapeFamily::Cube)), 100);
    // One shared mesh per family
    assert_eq!(scene.graph().statistics().geometries, 3);
}

#[test]
fn populating_twice_changes_nothing() {
    let mut scene = seeded_scene(2);
    let before: Vec<_> = scene.shapes().iter().map(|s| (s.position, s.node)).collect();
    scene.populate();
    let after: Vec<_> = scene.shapes().iter().map(|s| (s.position, s.node)).collect();
    assert_eq!(before, after);
    assert_eq!(scene.graph().node_count(), 500);
}

#[test]
fn initial_positions_follow_multiplier() {
    let scene = seeded_scene(3);
    for shape in scene.shapes().iter() {
        for axis in [shape.position.x, shape.position.y, shape.position.z] {
            assert!((-5.0..=5.0).contains(&axis), "{axis} outside the default spread");
        }
    }
}

#[test]
fn shrinking_cube_multiplier_pulls_only_cubes_in() {
    let mut scene = seeded_scene(4);
    let others_before: Vec<_> = scene
        .shapes()
        .iter()
        .filter(|s| s.family != ShapeFamily::Cube)
        .map(|s| (s.position, s.angular_velocity, s.rotation, s.scale))
        .collect();
    let cube_rotations: Vec<_> = scene
        .shapes()
        .iter_family(ShapeFamily::Cube)
        .map(|s| s.rotation)
        .collect();

    scene.set_param(ParamId::CubePositionMultiplier, 2.0).unwrap();

    for cube in scene.shapes().iter_family(ShapeFamily::Cube) {
        assert!(cube.position.x.abs() <= 1.0);
        assert!(cube.position.y.abs() <= 1.0);
        assert!(cube.position.z.abs() <= 1.0);
    }
    // Triangles and donuts stay exactly where they were
    let others_after: Vec<_> = scene
        .shapes()
        .iter()
        .filter(|s| s.family != ShapeFamily::Cube)
        .map(|s| (s.position, s.angular_velocity, s.rotation, s.scale))
        .collect();
    assert_eq!(others_before, others_after);
    for shape in scene.shapes().iter().filter(|s| s.family != ShapeFamily::Cube) {
        let node = scene.graph().node(shape.node.unwrap()).unwrap();
        assert_eq!(node.transform.position, shape.position);
    }
    // Cube orientation survives the re-scatter
    let cube_rotations_after: Vec<_> = scene
        .shapes()
        .iter_family(ShapeFamily::Cube)
        .map(|s| s.rotation)
        .collect();
    assert_eq!(cube_rotations, cube_rotations_after);
}

#[test]
fn rotation_speed_bounds_velocity() {
    let mut scene = seeded_scene(5);
    scene.set_param(ParamId::TriangleRotationSpeedMultiplier, 0.04).unwrap();
    for triangle in scene.shapes().iter_family(ShapeFamily::Triangle) {
        assert!((0.04..0.08).contains(&triangle.angular_velocity.x));
        assert!((0.04..0.08).contains(&triangle.angular_velocity.y));
    }
}

#[test]
fn out_of_range_rotation_speed_is_clamped_first() {
    let mut scene = seeded_scene(5);
    let change = scene
        .set_param(ParamId::TriangleRotationSpeedMultiplier, 0.1)
        .unwrap();
    assert!(change.clamped);
    assert_eq!(scene.params().float(ParamId::TriangleRotationSpeedMultiplier), 0.05);
    for triangle in scene.shapes().iter_family(ShapeFamily::Triangle) {
        assert!((0.05..0.1).contains(&triangle.angular_velocity.x));
        assert!((0.05..0.1).contains(&triangle.angular_velocity.y));
    }
}

#[test]
fn text_replacement_keeps_a_single_mesh() {
    let mut scene = seeded_scene(6);
    scene.font_loaded(Ok(typeface()));

    scene.set_param(ParamId::Text, "Hello World").unwrap();
    assert_eq!(scene.text_mesh_count(), 1);
    let geometries = scene.graph().statistics().geometries;

    scene.set_param(ParamId::Text, "Bye").unwrap();
    assert_eq!(scene.text_mesh_count(), 1);
    assert_eq!(scene.graph().count_kind(NodeKind::Text), 1);
    // The old text geometry was released, not leaked
    assert_eq!(scene.graph().statistics().geometries, geometries);
}

#[test]
fn text_is_centered_on_origin() {
    let mut scene = seeded_scene(7);
    scene.font_loaded(Ok(typeface()));
    scene.set_param(ParamId::Text, "HB\nH").unwrap();

    let node = scene
        .graph()
        .nodes()
        .find(|(_, node)| node.kind == NodeKind::Text)
        .map(|(_, node)| node.clone())
        .unwrap();
    let bounds = scene.graph().geometry(node.geometry).unwrap().bounding_box().unwrap();
    let center = bounds.center();
    assert!(center.x.abs() < 1e-4 && center.y.abs() < 1e-4 && center.z.abs() < 1e-4);
}

#[test]
fn edits_before_the_font_arrive_are_applied_later() {
    let mut scene = seeded_scene(8);
    scene.set_param(ParamId::Text, "HH").unwrap();
    scene.set_param(ParamId::TextDepth, 0.4).unwrap();
    assert!(scene.text_pending());
    assert_eq!(scene.text_mesh_count(), 0);

    scene.font_loaded(Ok(typeface()));
    assert_eq!(scene.text_mesh_count(), 1);

    let stats = scene.graph().statistics();
    let shapes_only = seeded_scene(8).graph().statistics();
    assert!(stats.triangles > shapes_only.triangles);
}

#[test]
fn accumulated_rotation_is_velocity_times_frames() {
    let mut scene = SceneBuilder::new()
        .seed(Some(9))
        .families(vec![FamilyDefinition::new(ShapeFamily::Cube, 4)])
        .rotation_policy(RotationPolicy::Accumulate)
        .build();
    scene.populate();
    scene.start();

    let start: Vec<_> = scene.shapes().iter().map(|s| (s.rotation, s.angular_velocity)).collect();
    for frame in 1..=10u64 {
        assert!(scene.tick(Duration::from_millis(16 * frame)));
    }

    for (shape, (rotation, velocity)) in scene.shapes().iter().zip(start) {
        assert!((shape.rotation.x - (rotation.x + 10.0 * velocity.x)).abs() < 1e-4);
        assert!((shape.rotation.y - (rotation.y + 10.0 * velocity.y)).abs() < 1e-4);
        assert_eq!(shape.rotation.z, rotation.z);
        let node = scene.graph().node(shape.node.unwrap()).unwrap();
        assert_eq!(node.transform.rotation, shape.rotation);
    }
}

#[test]
fn time_driven_rotation_ignores_velocity() {
    let mut scene = SceneBuilder::new()
        .seed(Some(10))
        .families(vec![FamilyDefinition::new(ShapeFamily::Donut, 3)])
        .rotation_policy(RotationPolicy::TimeDriven)
        .build();
    scene.populate();
    scene.start();
    scene.tick(Duration::from_secs(2));

    for shape in scene.shapes().iter() {
        assert_eq!(shape.rotation.x, -2.0);
        assert_eq!(shape.rotation.y, 2.0);
    }
}

#[test]
fn listeners_hear_every_commit() {
    let mut store = ParameterStore::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    store.subscribe(move |change| sink.borrow_mut().push((change.id, change.target)));

    store.set(ParamId::BevelEnabled, false).unwrap();
    store.set(ParamId::BevelEnabled, false).unwrap();
    store.set(ParamId::DonutPositionMultiplier, 4.0).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            (ParamId::BevelEnabled, ChangeTarget::Text),
            (ParamId::BevelEnabled, ChangeTarget::Text),
            (ParamId::DonutPositionMultiplier, ChangeTarget::Shapes),
        ]
    );
}

#[test]
fn bevel_grows_the_mesh_outward() {
    let font = typeface();
    let flat = TextOptions {
        content: "H".to_string(),
        bevel_enabled: false,
        ..TextOptions::default()
    };
    let bevelled = TextOptions {
        bevel_enabled: true,
        ..flat.clone()
    };

    let flat_mesh = build_text_geometry(&font, &flat).unwrap();
    let bevel_mesh = build_text_geometry(&font, &bevelled).unwrap();
    let flat_bounds = flat_mesh.bounding_box().unwrap();
    let bevel_bounds = bevel_mesh.bounding_box().unwrap();

    assert!(bevel_mesh.triangle_count() > flat_mesh.triangle_count());
    assert!(bevel_bounds.size().x > flat_bounds.size().x);
    assert!(bevel_bounds.size().z > flat_bounds.size().z);
}

#[test]
fn bundled_typeface_renders_default_text() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/block.typeface.json");
    let font = Typeface::from_path(&path).unwrap();
    assert_eq!(font.family_name, "Block");
    assert!(font.glyph('a').is_some() && font.glyph('&').is_some());

    let mesh = build_text_geometry(&font, &TextOptions::default()).unwrap();
    assert!(!mesh.is_empty());
}
