//! Control declarations
//!
//! Every tweakable value in the scene is declared once here: its config key,
//! panel label and folder, value kind with range and step, default, and the
//! listener family that reacts when it changes.

use std::fmt;

use super::ParamValue;

/// Identifier of a single control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamId {
    Text,
    TextSize,
    TextDepth,
    BevelEnabled,
    BevelThickness,
    BevelSize,
    BevelOffset,
    CurveSegments,
    BevelSegments,
    CubePositionMultiplier,
    TrianglePositionMultiplier,
    DonutPositionMultiplier,
    CubeRotationSpeedMultiplier,
    TriangleRotationSpeedMultiplier,
    DonutRotationSpeedMultiplier,
}

impl ParamId {
    /// All controls in panel order
    pub const ALL: [ParamId; 15] = [
        ParamId::Text,
        ParamId::TextSize,
        ParamId::TextDepth,
        ParamId::BevelEnabled,
        ParamId::BevelThickness,
        ParamId::BevelSize,
        ParamId::BevelOffset,
        ParamId::CurveSegments,
        ParamId::BevelSegments,
        ParamId::CubePositionMultiplier,
        ParamId::CubeRotationSpeedMultiplier,
        ParamId::TrianglePositionMultiplier,
        ParamId::TriangleRotationSpeedMultiplier,
        ParamId::DonutPositionMultiplier,
        ParamId::DonutRotationSpeedMultiplier,
    ];

    /// Slot of this control in the store's value table
    pub fn index(self) -> usize {
        self as usize
    }

    /// Static declaration for this control
    pub fn spec(self) -> &'static ParamSpec {
        &SPECS[self.index()]
    }

    /// Looks up a control by its config key (e.g. `"bevel_thickness"`)
    pub fn from_key(key: &str) -> Option<ParamId> {
        SPECS.iter().find(|spec| spec.key == key).map(|spec| spec.id)
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().key)
    }
}

/// Value kind and valid range of a control
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Float { min: f32, max: f32, step: f32 },
    Int { min: i32, max: i32, step: i32 },
    Bool,
    Text,
}

impl ParamKind {
    pub fn value_kind(&self) -> ValueKind {
        match self {
            ParamKind::Float { .. } => ValueKind::Float,
            ParamKind::Int { .. } => ValueKind::Int,
            ParamKind::Bool => ValueKind::Bool,
            ParamKind::Text => ValueKind::Text,
        }
    }
}

/// Bare value kind, used in error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    Int,
    Bool,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Float => "float",
            ValueKind::Int => "integer",
            ValueKind::Bool => "boolean",
            ValueKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// Which listener family a control notifies on change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeTarget {
    /// Rebuild the text mesh
    Text,
    /// Re-randomize shape positions and angular velocities
    Shapes,
}

/// Compile-time default of a control
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    Float(f32),
    Int(i32),
    Bool(bool),
    Text(&'static str),
}

impl ParamDefault {
    pub fn to_value(self) -> ParamValue {
        match self {
            ParamDefault::Float(v) => ParamValue::Float(v),
            ParamDefault::Int(v) => ParamValue::Int(v),
            ParamDefault::Bool(v) => ParamValue::Bool(v),
            ParamDefault::Text(v) => ParamValue::Text(v.to_string()),
        }
    }
}

/// Declaration of a single control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub id: ParamId,
    /// Snake-case key used in config files
    pub key: &'static str,
    /// Label shown next to the panel widget
    pub label: &'static str,
    /// Panel folder the widget lives in
    pub folder: &'static str,
    pub kind: ParamKind,
    pub default: ParamDefault,
    pub affects: ChangeTarget,
}

pub const DEFAULT_TEXT: &str = "Creative Developer \n with ADHD &\n existential crisis";

const fn float(min: f32, max: f32, step: f32) -> ParamKind {
    ParamKind::Float { min, max, step }
}

const fn int(min: i32, max: i32) -> ParamKind {
    ParamKind::Int { min, max, step: 1 }
}

/// Declarations indexed by `ParamId as usize`
pub(crate) fn declared() -> &'static [ParamSpec] {
    &SPECS
}

// Order follows the enum, not the panel.
static SPECS: [ParamSpec; 15] = [
    ParamSpec {
        id: ParamId::Text,
        key: "text",
        label: "Text",
        folder: "Text",
        kind: ParamKind::Text,
        default: ParamDefault::Text(DEFAULT_TEXT),
        affects: ChangeTarget::Text,
    },
    ParamSpec {
        id: ParamId::TextSize,
        key: "text_size",
        label: "Size",
        folder: "Text",
        kind: float(0.1, 2.0, 0.1),
        default: ParamDefault::Float(0.5),
        affects: ChangeTarget::Text,
    },
    ParamSpec {
        id: ParamId::TextDepth,
        key: "text_depth",
        label: "Depth",
        folder: "Text",
        kind: float(0.1, 1.0, 0.1),
        default: ParamDefault::Float(0.2),
        affects: ChangeTarget::Text,
    },
    ParamSpec {
        id: ParamId::BevelEnabled,
        key: "bevel_enabled",
        label: "Bevel Enabled",
        folder: "Text",
        kind: ParamKind::Bool,
        default: ParamDefault::Bool(true),
        affects: ChangeTarget::Text,
    },
    ParamSpec {
        id: ParamId::BevelThickness,
        key: "bevel_thickness",
        label: "Bevel Thickness",
        folder: "Text",
        kind: float(0.01, 0.1, 0.01),
        default: ParamDefault::Float(0.03),
        affects: ChangeTarget::Text,
    },
    ParamSpec {
        id: ParamId::BevelSize,
        key: "bevel_size",
        label: "Bevel Size",
        folder: "Text",
        kind: float(0.01, 0.1, 0.01),
        default: ParamDefault::Float(0.02),
        affects: ChangeTarget::Text,
    },
    ParamSpec {
        id: ParamId::BevelOffset,
        key: "bevel_offset",
        label: "Bevel Offset",
        folder: "Text",
        kind: float(0.0, 0.1, 0.01),
        default: ParamDefault::Float(0.0),
        affects: ChangeTarget::Text,
    },
    ParamSpec {
        id: ParamId::CurveSegments,
        key: "curve_segments",
        label: "Curve Segments",
        folder: "Text",
        kind: int(1, 10),
        default: ParamDefault::Int(5),
        affects: ChangeTarget::Text,
    },
    ParamSpec {
        id: ParamId::BevelSegments,
        key: "bevel_segments",
        label: "Bevel Segments",
        folder: "Text",
        kind: int(1, 10),
        default: ParamDefault::Int(4),
        affects: ChangeTarget::Text,
    },
    ParamSpec {
        id: ParamId::CubePositionMultiplier,
        key: "cube_position_multiplier",
        label: "Position Mult",
        folder: "Cubes",
        kind: float(1.0, 20.0, 0.1),
        default: ParamDefault::Float(10.0),
        affects: ChangeTarget::Shapes,
    },
    ParamSpec {
        id: ParamId::TrianglePositionMultiplier,
        key: "triangle_position_multiplier",
        label: "Position Mult",
        folder: "Triangles",
        kind: float(1.0, 20.0, 0.1),
        default: ParamDefault::Float(10.0),
        affects: ChangeTarget::Shapes,
    },
    ParamSpec {
        id: ParamId::DonutPositionMultiplier,
        key: "donut_position_multiplier",
        label: "Position Mult",
        folder: "Donuts",
        kind: float(1.0, 20.0, 0.1),
        default: ParamDefault::Float(10.0),
        affects: ChangeTarget::Shapes,
    },
    ParamSpec {
        id: ParamId::CubeRotationSpeedMultiplier,
        key: "cube_rotation_speed_multiplier",
        label: "Rot Speed Mult",
        folder: "Cubes",
        kind: float(0.001, 0.05, 0.001),
        default: ParamDefault::Float(0.01),
        affects: ChangeTarget::Shapes,
    },
    ParamSpec {
        id: ParamId::TriangleRotationSpeedMultiplier,
        key: "triangle_rotation_speed_multiplier",
        label: "Rot Speed Mult",
        folder: "Triangles",
        kind: float(0.001, 0.05, 0.001),
        default: ParamDefault::Float(0.01),
        affects: ChangeTarget::Shapes,
    },
    ParamSpec {
        id: ParamId::DonutRotationSpeedMultiplier,
        key: "donut_rotation_speed_multiplier",
        label: "Rot Speed Mult",
        folder: "Donuts",
        kind: float(0.001, 0.05, 0.001),
        default: ParamDefault::Float(0.01),
        affects: ChangeTarget::Shapes,
    },
];
