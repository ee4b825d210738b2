//! # Parameter Store
//!
//! A flat table of named, range-constrained controls backing the control
//! panel. Values are validated at the boundary: numbers outside a control's
//! declared range are clamped, never rejected, and every committed edit is
//! reported synchronously to registered listeners.
//!
//! ```
//! use typescape::params::{ParamId, ParameterStore};
//!
//! let mut store = ParameterStore::new();
//! let change = store.set(ParamId::BevelThickness, 0.5).unwrap();
//! assert!(change.clamped);
//! assert_eq!(store.float(ParamId::BevelThickness), 0.1);
//! ```

pub mod spec;

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gfx::geometry::text::TextOptions;
use crate::scene::shapes::{FamilyParams, ShapeFamily};

pub use spec::{ChangeTarget, ParamDefault, ParamId, ParamKind, ParamSpec, ValueKind, DEFAULT_TEXT};

/// Current value of a control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Text(String),
}

impl ParamValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ParamValue::Bool(_) => ValueKind::Bool,
            ParamValue::Int(_) => ValueKind::Int,
            ParamValue::Float(_) => ValueKind::Float,
            ParamValue::Text(_) => ValueKind::Text,
        }
    }

    /// Numeric view of the value; integers are widened
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v:.3}"),
            ParamValue::Text(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("control '{id}' expects a {expected} value, got {found}")]
    KindMismatch {
        id: ParamId,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("no control is named '{0}'")]
    UnknownKey(String),
}

/// Record of one committed edit, handed to every listener
#[derive(Debug, Clone, PartialEq)]
pub struct ParamChange {
    pub id: ParamId,
    pub target: ChangeTarget,
    pub previous: ParamValue,
    pub current: ParamValue,
    /// The requested value was outside the declared range
    pub clamped: bool,
}

pub type ParamListener = Box<dyn FnMut(&ParamChange)>;

/// Nearest multiple of `step` above `min`
///
/// Values already on the grid, up to float noise, come back unchanged so
/// declared defaults and bounds stay exact.
fn snap_to_step(value: f64, min: f64, step: f64) -> f64 {
    if step <= 0.0 || !value.is_finite() {
        return value;
    }
    let snapped = min + ((value - min) / step).round() * step;
    if (snapped - value).abs() <= step * 1e-3 {
        value
    } else {
        snapped
    }
}

impl ParamSpec {
    /// Coerces `value` into this control's kind, step and range
    ///
    /// Returns the stored value and whether clamping was necessary.
    fn normalize(&self, value: ParamValue) -> Result<(ParamValue, bool), ParamError> {
        let mismatch = |found: ValueKind| ParamError::KindMismatch {
            id: self.id,
            expected: self.kind.value_kind(),
            found,
        };

        match self.kind {
            ParamKind::Float { min, max, step } => {
                let requested = value.as_f32().ok_or_else(|| mismatch(value.kind()))?;
                if requested.is_nan() {
                    return Ok((self.default.to_value(), true));
                }
                let in_range = requested.clamp(min, max);
                let stored = if in_range == requested {
                    (snap_to_step(requested as f64, min as f64, step as f64) as f32).clamp(min, max)
                } else {
                    in_range
                };
                Ok((ParamValue::Float(stored), in_range != requested))
            }
            ParamKind::Int { min, max, step } => {
                let requested = match value {
                    ParamValue::Int(v) => v as f64,
                    ParamValue::Float(v) if v.is_nan() => {
                        return Ok((self.default.to_value(), true));
                    }
                    ParamValue::Float(v) => (v as f64).round(),
                    other => return Err(mismatch(other.kind())),
                };
                let in_range = requested.clamp(min as f64, max as f64);
                let stored = snap_to_step(in_range, min as f64, step as f64).clamp(min as f64, max as f64);
                Ok((ParamValue::Int(stored as i32), in_range != requested))
            }
            ParamKind::Bool => match value {
                ParamValue::Bool(_) => Ok((value, false)),
                other => Err(mismatch(other.kind())),
            },
            ParamKind::Text => match value {
                ParamValue::Text(_) => Ok((value, false)),
                other => Err(mismatch(other.kind())),
            },
        }
    }
}

/// Process-wide control values with change notification
pub struct ParameterStore {
    values: Vec<ParamValue>,
    listeners: Vec<ParamListener>,
}

impl ParameterStore {
    /// Creates a store holding every control's default
    pub fn new() -> Self {
        Self {
            values: spec::declared()
                .iter()
                .map(|spec| spec.default.to_value())
                .collect(),
            listeners: Vec::new(),
        }
    }

    /// Restores every control to its default, notifying listeners of each
    pub fn reset(&mut self) {
        for id in ParamId::ALL {
            let default = id.spec().default.to_value();
            // Defaults are always of the declared kind
            let _ = self.set(id, default);
        }
    }

    /// Declarations in panel order
    pub fn specs(&self) -> impl Iterator<Item = &'static ParamSpec> {
        ParamId::ALL.into_iter().map(ParamId::spec)
    }

    pub fn get(&self, id: ParamId) -> &ParamValue {
        &self.values[id.index()]
    }

    /// Numeric value of a float or integer control, `0.0` otherwise
    pub fn float(&self, id: ParamId) -> f32 {
        self.get(id).as_f32().unwrap_or(0.0)
    }

    /// Value of an integer control, `0` otherwise
    pub fn int(&self, id: ParamId) -> i32 {
        match self.get(id) {
            ParamValue::Int(v) => *v,
            _ => 0,
        }
    }

    /// Value of a boolean control, `false` otherwise
    pub fn flag(&self, id: ParamId) -> bool {
        matches!(self.get(id), ParamValue::Bool(true))
    }

    /// Value of a text control, empty otherwise
    pub fn text(&self, id: ParamId) -> &str {
        match self.get(id) {
            ParamValue::Text(v) => v,
            _ => "",
        }
    }

    /// Commits a new value, clamping it into range, and notifies listeners
    pub fn set(
        &mut self,
        id: ParamId,
        value: impl Into<ParamValue>,
    ) -> Result<ParamChange, ParamError> {
        let spec = id.spec();
        let requested = value.into();
        let (current, clamped) = spec.normalize(requested.clone())?;

        if clamped {
            warn!("{id}: {requested} is outside the declared range, stored {current}");
        }

        let previous = std::mem::replace(&mut self.values[id.index()], current.clone());
        let change = ParamChange {
            id,
            target: spec.affects,
            previous,
            current,
            clamped,
        };

        for listener in &mut self.listeners {
            listener(&change);
        }

        Ok(change)
    }

    /// Same as [`set`](Self::set), addressing the control by config key
    pub fn set_by_key(
        &mut self,
        key: &str,
        value: impl Into<ParamValue>,
    ) -> Result<ParamChange, ParamError> {
        let id = ParamId::from_key(key).ok_or_else(|| ParamError::UnknownKey(key.to_string()))?;
        self.set(id, value)
    }

    /// Registers an observer called synchronously on every committed edit
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&ParamChange) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Snapshot of everything the text mesh is built from
    pub fn text_options(&self) -> TextOptions {
        TextOptions {
            content: self.text(ParamId::Text).to_string(),
            size: self.float(ParamId::TextSize),
            depth: self.float(ParamId::TextDepth),
            bevel_enabled: self.flag(ParamId::BevelEnabled),
            bevel_thickness: self.float(ParamId::BevelThickness),
            bevel_size: self.float(ParamId::BevelSize),
            bevel_offset: self.float(ParamId::BevelOffset),
            curve_segments: self.int(ParamId::CurveSegments).max(1) as u32,
            bevel_segments: self.int(ParamId::BevelSegments).max(1) as u32,
        }
    }

    /// Multipliers for one shape family, read at call time
    pub fn family_params(&self, family: ShapeFamily) -> FamilyParams {
        FamilyParams {
            position_multiplier: self.float(family.position_param()),
            rotation_speed_multiplier: self.float(family.rotation_speed_param()),
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for id in ParamId::ALL {
            map.entry(&id.spec().key, self.get(id));
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn starts_at_defaults() {
        let store = ParameterStore::new();
        assert_eq!(store.text(ParamId::Text), spec::DEFAULT_TEXT);
        assert_eq!(store.float(ParamId::TextSize), 0.5);
        assert_eq!(store.int(ParamId::CurveSegments), 5);
        assert!(store.flag(ParamId::BevelEnabled));
        assert_eq!(store.float(ParamId::CubeRotationSpeedMultiplier), 0.01);
    }

    #[test]
    fn bevel_thickness_is_clamped_not_rejected() {
        let mut store = ParameterStore::new();

        let high = store.set(ParamId::BevelThickness, 0.5).unwrap();
        assert!(high.clamped);
        assert_eq!(store.float(ParamId::BevelThickness), 0.1);

        let low = store.set(ParamId::BevelThickness, -3.0).unwrap();
        assert!(low.clamped);
        assert_eq!(store.float(ParamId::BevelThickness), 0.01);

        let inside = store.set(ParamId::BevelThickness, 0.05).unwrap();
        assert!(!inside.clamped);
        assert_eq!(store.float(ParamId::BevelThickness), 0.05);
    }

    #[test]
    fn integer_controls_round_and_clamp() {
        let mut store = ParameterStore::new();
        store.set(ParamId::CurveSegments, 42).unwrap();
        assert_eq!(store.int(ParamId::CurveSegments), 10);

        store.set(ParamId::BevelSegments, 2.6).unwrap();
        assert_eq!(store.int(ParamId::BevelSegments), 3);
    }

    #[test]
    fn integers_widen_into_float_controls() {
        let mut store = ParameterStore::new();
        store.set(ParamId::CubePositionMultiplier, 2).unwrap();
        assert_eq!(store.get(ParamId::CubePositionMultiplier), &ParamValue::Float(2.0));
    }

    #[test]
    fn nan_falls_back_to_default() {
        let mut store = ParameterStore::new();
        store.set(ParamId::TextDepth, 0.7).unwrap();
        let change = store.set(ParamId::TextDepth, f32::NAN).unwrap();
        assert!(change.clamped);
        assert_eq!(store.float(ParamId::TextDepth), 0.2);
    }

    #[test]
    fn infinite_values_clamp_to_bounds() {
        let mut store = ParameterStore::new();
        store.set(ParamId::TextSize, f32::INFINITY).unwrap();
        assert_eq!(store.float(ParamId::TextSize), 2.0);
    }

    #[test]
    fn kind_mismatch_is_an_error_and_leaves_value() {
        let mut store = ParameterStore::new();
        let err = store.set(ParamId::BevelEnabled, "yes").unwrap_err();
        assert_eq!(
            err,
            ParamError::KindMismatch {
                id: ParamId::BevelEnabled,
                expected: ValueKind::Bool,
                found: ValueKind::Text,
            }
        );
        assert!(store.flag(ParamId::BevelEnabled));
    }

    #[test]
    fn set_by_key_rejects_unknown_names() {
        let mut store = ParameterStore::new();
        assert!(store.set_by_key("text_size", 1.0).is_ok());
        assert_eq!(
            store.set_by_key("letter_spacing", 1.0).unwrap_err(),
            ParamError::UnknownKey("letter_spacing".to_string())
        );
    }

    #[test]
    fn listeners_fire_synchronously_with_target() {
        let seen: Rc<RefCell<Vec<(ParamId, ChangeTarget)>>> = Rc::default();
        let sink = Rc::clone(&seen);

        let mut store = ParameterStore::new();
        store.subscribe(move |change| sink.borrow_mut().push((change.id, change.target)));

        store.set(ParamId::Text, "Bye").unwrap();
        assert_eq!(seen.borrow().as_slice(), &[(ParamId::Text, ChangeTarget::Text)]);

        store.set(ParamId::DonutPositionMultiplier, 3.0).unwrap();
        assert_eq!(
            seen.borrow().last(),
            Some(&(ParamId::DonutPositionMultiplier, ChangeTarget::Shapes))
        );
    }

    #[test]
    fn failed_set_does_not_notify() {
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let mut store = ParameterStore::new();
        store.subscribe(move |_| *sink.borrow_mut() += 1);

        let _ = store.set(ParamId::TextSize, true);
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut store = ParameterStore::new();
        store.set(ParamId::Text, "Hello World").unwrap();
        store.set(ParamId::BevelEnabled, false).unwrap();
        store.reset();
        assert_eq!(store.text(ParamId::Text), spec::DEFAULT_TEXT);
        assert!(store.flag(ParamId::BevelEnabled));
    }

    #[test]
    fn edits_snap_to_the_declared_step() {
        let mut store = ParameterStore::new();

        let change = store.set(ParamId::TextSize, 0.73).unwrap();
        assert!(!change.clamped);
        assert!((store.float(ParamId::TextSize) - 0.7).abs() < 1e-6);

        store.set(ParamId::BevelSize, 0.0349).unwrap();
        assert!((store.float(ParamId::BevelSize) - 0.03).abs() < 1e-6);

        // On-grid values and bounds are stored untouched
        store.set(ParamId::TextSize, 0.5).unwrap();
        assert_eq!(store.float(ParamId::TextSize), 0.5);
        store.set(ParamId::CubeRotationSpeedMultiplier, 0.05).unwrap();
        assert_eq!(store.float(ParamId::CubeRotationSpeedMultiplier), 0.05);
    }

    #[test]
    fn snapshots_read_current_values() {
        let mut store = ParameterStore::new();
        store.set(ParamId::TriangleRotationSpeedMultiplier, 0.02).unwrap();
        let params = store.family_params(ShapeFamily::Triangle);
        assert_eq!(params.rotation_speed_multiplier, 0.02);
        assert_eq!(params.position_multiplier, 10.0);

        store.set(ParamId::CurveSegments, 3).unwrap();
        assert_eq!(store.text_options().curve_segments, 3);
    }

    #[test]
    fn overrides_deserialize_untagged() {
        #[derive(Deserialize)]
        struct Overrides {
            a: ParamValue,
            b: ParamValue,
            c: ParamValue,
            d: ParamValue,
        }
        let parsed: Overrides = toml::from_str("a = true\nb = 3\nc = 0.25\nd = \"hi\"").unwrap();
        assert_eq!(parsed.a, ParamValue::Bool(true));
        assert_eq!(parsed.b, ParamValue::Int(3));
        assert_eq!(parsed.c, ParamValue::Float(0.25));
        assert_eq!(parsed.d, ParamValue::Text("hi".to_string()));
    }
}
