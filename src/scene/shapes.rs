//! Randomly scattered background shapes
//!
//! Three families are created once per session in fixed batches. Every
//! record draws its position, orientation and angular velocity from the
//! injected random source, scaled by the family's multipliers at the time
//! of the draw.

use std::f32::consts::TAU;
use std::fmt;

use cgmath::{Vector2, Vector3};
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::gfx::geometry::{generate_box, generate_tetrahedron, generate_torus, GeometryData};
use crate::gfx::scene::{GeometryId, NodeId, NodeKind, SceneGraph, Transform};
use crate::params::{ParamId, ParameterStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeFamily {
    Cube,
    Triangle,
    Donut,
}

impl ShapeFamily {
    pub const ALL: [ShapeFamily; 3] = [ShapeFamily::Cube, ShapeFamily::Triangle, ShapeFamily::Donut];

    pub fn position_param(self) -> ParamId {
        match self {
            ShapeFamily::Cube => ParamId::CubePositionMultiplier,
            ShapeFamily::Triangle => ParamId::TrianglePositionMultiplier,
            ShapeFamily::Donut => ParamId::DonutPositionMultiplier,
        }
    }

    pub fn rotation_speed_param(self) -> ParamId {
        match self {
            ShapeFamily::Cube => ParamId::CubeRotationSpeedMultiplier,
            ShapeFamily::Triangle => ParamId::TriangleRotationSpeedMultiplier,
            ShapeFamily::Donut => ParamId::DonutRotationSpeedMultiplier,
        }
    }

    /// Family whose multiplier `id` is, if any
    pub fn for_param(id: ParamId) -> Option<ShapeFamily> {
        ShapeFamily::ALL
            .into_iter()
            .find(|family| family.position_param() == id || family.rotation_speed_param() == id)
    }

    /// Plural name as shown in the control panel
    pub fn label(self) -> &'static str {
        match self {
            ShapeFamily::Cube => "Cubes",
            ShapeFamily::Triangle => "Triangles",
            ShapeFamily::Donut => "Donuts",
        }
    }
}

impl fmt::Display for ShapeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Current multipliers for one family
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FamilyParams {
    pub position_multiplier: f32,
    pub rotation_speed_multiplier: f32,
}

/// Mesh shared by every member of a family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FamilyGeometry {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    /// Each member draws its own radius in `[0, max_radius)`
    Tetrahedron { max_radius: f32 },
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
}

impl FamilyGeometry {
    pub fn default_for(family: ShapeFamily) -> Self {
        match family {
            ShapeFamily::Cube => FamilyGeometry::Box {
                width: 0.2,
                height: 0.2,
                depth: 0.2,
            },
            ShapeFamily::Triangle => FamilyGeometry::Tetrahedron { max_radius: 0.2 },
            ShapeFamily::Donut => FamilyGeometry::Torus {
                radius: 0.03,
                tube: 0.02,
                radial_segments: 64,
                tubular_segments: 128,
            },
        }
    }

    /// Builds the shared mesh; tetrahedra are unit-radius and sized per node
    pub fn build(&self) -> GeometryData {
        match *self {
            FamilyGeometry::Box {
                width,
                height,
                depth,
            } => generate_box(width, height, depth),
            FamilyGeometry::Tetrahedron { .. } => generate_tetrahedron(1.0),
            FamilyGeometry::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => generate_torus(radius, tube, radial_segments, tubular_segments),
        }
    }
}

/// How many members a family has and what they look like
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FamilyDefinition {
    pub family: ShapeFamily,
    pub count: usize,
    pub geometry: FamilyGeometry,
}

impl FamilyDefinition {
    pub fn new(family: ShapeFamily, count: usize) -> Self {
        Self {
            family,
            count,
            geometry: FamilyGeometry::default_for(family),
        }
    }

    /// 100 cubes, 200 triangles, 200 donuts
    pub fn defaults() -> Vec<FamilyDefinition> {
        vec![
            FamilyDefinition::new(ShapeFamily::Cube, 100),
            FamilyDefinition::new(ShapeFamily::Triangle, 200),
            FamilyDefinition::new(ShapeFamily::Donut, 200),
        ]
    }
}

/// One scattered shape
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    pub family: ShapeFamily,
    pub position: Vector3<f32>,
    /// Euler angles in radians
    pub rotation: Vector3<f32>,
    /// Radians per frame around x and y
    pub angular_velocity: Vector2<f32>,
    pub scale: f32,
    pub node: Option<NodeId>,
}

impl ShapeRecord {
    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }
}

fn draw_position<R: Rng + ?Sized>(rng: &mut R, multiplier: f32) -> Vector3<f32> {
    Vector3::new(
        (rng.random::<f32>() - 0.5) * multiplier,
        (rng.random::<f32>() - 0.5) * multiplier,
        (rng.random::<f32>() - 0.5) * multiplier,
    )
}

fn draw_velocity<R: Rng + ?Sized>(rng: &mut R, multiplier: f32) -> Vector2<f32> {
    Vector2::new(
        rng.random::<f32>() * multiplier + multiplier,
        rng.random::<f32>() * multiplier + multiplier,
    )
}

/// All scattered shapes, in definition order
#[derive(Debug, Clone, Default)]
pub struct ShapePopulation {
    records: Vec<ShapeRecord>,
    definitions: Vec<FamilyDefinition>,
    /// Shared mesh of each definition, by definition index
    geometries: Vec<GeometryId>,
}

impl ShapePopulation {
    /// Creates every family's batch, drawing from `rng` with the current multipliers
    pub fn populate<R: Rng + ?Sized>(
        definitions: &[FamilyDefinition],
        params: &ParameterStore,
        rng: &mut R,
    ) -> Self {
        let total = definitions.iter().map(|d| d.count).sum();
        let mut records = Vec::with_capacity(total);

        for definition in definitions {
            let FamilyParams {
                position_multiplier,
                rotation_speed_multiplier,
            } = params.family_params(definition.family);

            for _ in 0..definition.count {
                let scale = match definition.geometry {
                    FamilyGeometry::Tetrahedron { max_radius } => rng.random::<f32>() * max_radius,
                    _ => 1.0,
                };
                let position = draw_position(rng, position_multiplier);
                let rotation = Vector3::new(
                    rng.random::<f32>() * TAU,
                    rng.random::<f32>() * TAU,
                    rng.random::<f32>() * TAU,
                );
                let angular_velocity = draw_velocity(rng, rotation_speed_multiplier);

                records.push(ShapeRecord {
                    family: definition.family,
                    position,
                    rotation,
                    angular_velocity,
                    scale,
                    node: None,
                });
            }
        }

        let population = Self {
            records,
            definitions: definitions.to_vec(),
            geometries: Vec::new(),
        };
        info!(
            "Populated {} shapes ({})",
            population.len(),
            ShapeFamily::ALL
                .iter()
                .map(|family| format!("{} {}", population.count(*family), family))
                .collect::<Vec<_>>()
                .join(", ")
        );
        population
    }

    /// Registers one mesh per definition and one node per record
    ///
    /// Two definitions of the same family keep their own meshes. Records
    /// that already have a node are left alone.
    pub fn attach(&mut self, graph: &mut SceneGraph) {
        for definition in &self.definitions[self.geometries.len()..] {
            self.geometries
                .push(graph.register_geometry(definition.geometry.build()));
        }

        // Records are laid out in definition order, `count` at a time
        let batches = self
            .definitions
            .iter()
            .zip(&self.geometries)
            .flat_map(|(definition, geometry)| std::iter::repeat(*geometry).take(definition.count));
        for (record, geometry) in self.records.iter_mut().zip(batches) {
            if record.node.is_some() {
                continue;
            }
            record.node =
                Some(graph.add_node(NodeKind::Shape(record.family), geometry, record.transform()));
        }
    }

    /// Re-draws position and angular velocity of every member of `family`
    ///
    /// Uses the family's current multipliers. Orientation, size and
    /// membership are kept, and other families are not touched.
    pub fn update_family<R: Rng + ?Sized>(
        &mut self,
        family: ShapeFamily,
        params: &ParameterStore,
        rng: &mut R,
    ) {
        let FamilyParams {
            position_multiplier,
            rotation_speed_multiplier,
        } = params.family_params(family);

        let mut updated = 0;
        for record in self.records.iter_mut().filter(|r| r.family == family) {
            record.position = draw_position(rng, position_multiplier);
            record.angular_velocity = draw_velocity(rng, rotation_speed_multiplier);
            updated += 1;
        }
        debug!("Re-randomized {updated} {family}");
    }

    /// [`update_family`](Self::update_family) for every family in turn
    pub fn update_shape_parameters<R: Rng + ?Sized>(&mut self, params: &ParameterStore, rng: &mut R) {
        for family in ShapeFamily::ALL {
            self.update_family(family, params, rng);
        }
    }

    /// Writes every record's transform into its node
    pub fn sync(&self, graph: &mut SceneGraph) {
        for record in &self.records {
            let Some(id) = record.node else { continue };
            if let Some(node) = graph.node_mut(id) {
                node.transform = record.transform();
            }
        }
    }

    pub fn count(&self, family: ShapeFamily) -> usize {
        self.iter_family(family).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShapeRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ShapeRecord> {
        self.records.iter_mut()
    }

    pub fn iter_family(&self, family: ShapeFamily) -> impl Iterator<Item = &ShapeRecord> {
        self.records.iter().filter(move |r| r.family == family)
    }

    pub fn definitions(&self) -> &[FamilyDefinition] {
        &self.definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn populate(seed: u64) -> (ParameterStore, ShapePopulation) {
        let params = ParameterStore::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let shapes = ShapePopulation::populate(&FamilyDefinition::defaults(), &params, &mut rng);
        (params, shapes)
    }

    #[test]
    fn default_batches() {
        let (_, shapes) = populate(1);
        assert_eq!(shapes.len(), 500);
        assert_eq!(shapes.count(ShapeFamily::Cube), 100);
        assert_eq!(shapes.count(ShapeFamily::Triangle), 200);
        assert_eq!(shapes.count(ShapeFamily::Donut), 200);

        // Families are laid out in definition order
        assert!(shapes.iter().take(100).all(|r| r.family == ShapeFamily::Cube));
    }

    #[test]
    fn draws_stay_in_range() {
        let (_, shapes) = populate(7);
        for record in shapes.iter() {
            for axis in [record.position.x, record.position.y, record.position.z] {
                assert!(axis.abs() <= 5.0);
            }
            for angle in [record.rotation.x, record.rotation.y, record.rotation.z] {
                assert!((0.0..=TAU).contains(&angle));
            }
            for speed in [record.angular_velocity.x, record.angular_velocity.y] {
                assert!((0.01..=0.02).contains(&speed));
            }
            match record.family {
                ShapeFamily::Triangle => assert!((0.0..=0.2).contains(&record.scale)),
                _ => assert_eq!(record.scale, 1.0),
            }
        }
    }

    #[test]
    fn same_seed_same_population() {
        let (_, a) = populate(42);
        let (_, b) = populate(42);
        assert!(a.iter().eq(b.iter()));
    }

    #[test]
    fn updates_keep_rotation_and_scale() {
        let (mut params, mut shapes) = populate(3);
        let before: Vec<ShapeRecord> = shapes.iter().cloned().collect();

        params.set(ParamId::CubePositionMultiplier, 2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        shapes.update_shape_parameters(&params, &mut rng);

        for (old, new) in before.iter().zip(shapes.iter()) {
            assert_eq!(old.rotation, new.rotation);
            assert_eq!(old.scale, new.scale);
            assert_eq!(old.family, new.family);
        }
        for cube in shapes.iter_family(ShapeFamily::Cube) {
            assert!(cube.position.x.abs() <= 1.0);
            assert!(cube.position.y.abs() <= 1.0);
            assert!(cube.position.z.abs() <= 1.0);
        }
        assert_eq!(shapes.len(), 500);
    }

    #[test]
    fn family_update_leaves_other_families_alone() {
        let (mut params, mut shapes) = populate(11);
        let before: Vec<ShapeRecord> = shapes.iter().cloned().collect();

        params.set(ParamId::TrianglePositionMultiplier, 2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(12);
        shapes.update_family(ShapeFamily::Triangle, &params, &mut rng);

        for (old, new) in before.iter().zip(shapes.iter()) {
            if new.family == ShapeFamily::Triangle {
                assert!(new.position.x.abs() <= 1.0);
                assert_eq!(old.rotation, new.rotation);
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn multipliers_map_back_to_their_family() {
        assert_eq!(
            ShapeFamily::for_param(ParamId::DonutRotationSpeedMultiplier),
            Some(ShapeFamily::Donut)
        );
        assert_eq!(
            ShapeFamily::for_param(ParamId::CubePositionMultiplier),
            Some(ShapeFamily::Cube)
        );
        assert_eq!(ShapeFamily::for_param(ParamId::TextSize), None);
    }

    #[test]
    fn repeated_family_keeps_its_own_mesh() {
        let definitions = vec![
            FamilyDefinition::new(ShapeFamily::Cube, 2),
            FamilyDefinition {
                family: ShapeFamily::Cube,
                count: 3,
                geometry: FamilyGeometry::Box {
                    width: 1.0,
                    height: 1.0,
                    depth: 1.0,
                },
            },
        ];
        let params = ParameterStore::new();
        let mut rng = StdRng::seed_from_u64(8);
        let mut shapes = ShapePopulation::populate(&definitions, &params, &mut rng);
        let mut graph = SceneGraph::new();
        shapes.attach(&mut graph);

        assert_eq!(graph.statistics().geometries, 2);
        let meshes: Vec<_> = shapes
            .iter()
            .map(|r| graph.node(r.node.unwrap()).unwrap().geometry)
            .collect();
        assert!(meshes[..2].iter().all(|g| *g == meshes[0]));
        assert!(meshes[2..].iter().all(|g| *g == meshes[2]));
        assert_ne!(meshes[0], meshes[2]);
    }

    #[test]
    fn attach_shares_one_mesh_per_family() {
        let (_, mut shapes) = populate(5);
        let mut graph = SceneGraph::new();
        shapes.attach(&mut graph);
        shapes.attach(&mut graph);

        assert_eq!(graph.statistics().geometries, 3);
        assert_eq!(graph.node_count(), 500);
        assert_eq!(graph.count_kind(NodeKind::Shape(ShapeFamily::Donut)), 200);

        let first = shapes.iter().next().unwrap();
        let node = graph.node(first.node.unwrap()).unwrap();
        assert_eq!(node.transform, first.transform());
    }

    #[test]
    fn definitions_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Families {
            families: Vec<FamilyDefinition>,
        }
        let parsed: Families = toml::from_str(
            r#"
            [[families]]
            family = "cube"
            count = 3
            geometry = { type = "box", width = 1.0, height = 1.0, depth = 1.0 }
            "#,
        )
        .unwrap();
        assert_eq!(parsed.families[0].count, 3);
        assert_eq!(parsed.families[0].family, ShapeFamily::Cube);
    }
}
