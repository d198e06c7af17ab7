// Attribute registry
// Named derived quantities over frames and clusters, with plot/train capability flags

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::clustering::{Cluster, Frame};
use crate::grid::{GridError, PixelGrid};

/// Errors raised while computing an attribute
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("Attribute '{name}' does not apply to a {kind}")]
    NotApplicable { name: String, kind: EntityKind },

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Attribute '{0}' is not numeric")]
    NotNumeric(String),

    #[error("Attribute '{0}' is undefined for a grid with zero total count")]
    ZeroWeight(String),

    #[error("Class label '{0}' cannot contain commas or line breaks")]
    InvalidLabel(String),
}

pub type AttributeResult<T> = Result<T, AttributeError>;

/// Errors raised while building a registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Attribute registered twice: {0}")]
    DuplicateAttribute(String),
}

/// The kind of object an attribute is computed over
/// Frame and Cluster both specialize PixelGrid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    PixelGrid,
    Frame,
    Cluster,
}

impl EntityKind {
    /// True if an attribute declared for `declared` applies to this kind
    pub fn specializes(self, declared: EntityKind) -> bool {
        self == declared || declared == EntityKind::PixelGrid
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::PixelGrid => "pixel grid",
            EntityKind::Frame => "frame",
            EntityKind::Cluster => "cluster",
        };
        f.write_str(name)
    }
}

/// A borrowed frame or cluster handed to attribute functions
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Frame(&'a Frame),
    Cluster(&'a Cluster),
}

impl<'a> Entity<'a> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Frame(_) => EntityKind::Frame,
            Entity::Cluster(_) => EntityKind::Cluster,
        }
    }

    pub fn grid(&self) -> &'a dyn PixelGrid {
        match *self {
            Entity::Frame(frame) => frame as &dyn PixelGrid,
            Entity::Cluster(cluster) => cluster as &dyn PixelGrid,
        }
    }

    pub fn as_frame(&self) -> Option<&'a Frame> {
        match *self {
            Entity::Frame(frame) => Some(frame),
            Entity::Cluster(_) => None,
        }
    }

    pub fn as_cluster(&self) -> Option<&'a Cluster> {
        match *self {
            Entity::Cluster(cluster) => Some(cluster),
            Entity::Frame(_) => None,
        }
    }
}

/// A computed attribute value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    Pair(f64, f64),
    Text(String),
}

impl AttributeValue {
    /// Numeric value usable as a feature dimension
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::Pair(..) | AttributeValue::Text(_) => None,
        }
    }
}

/// Floats are rounded to 2 decimal places, tuple components independently
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Int(v) => write!(f, "{}", v),
            AttributeValue::Float(v) => write!(f, "{:.2}", v),
            AttributeValue::Pair(a, b) => write!(f, "({:.2}, {:.2})", a, b),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

pub type ComputeFn = fn(Entity<'_>) -> AttributeResult<AttributeValue>;

/// One registered attribute
#[derive(Clone)]
pub struct AttributeEntry {
    name: String,
    compute: ComputeFn,
    applies_to: EntityKind,
    plottable: bool,
    trainable: bool,
}

impl AttributeEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn applies_to(&self) -> EntityKind {
        self.applies_to
    }

    pub fn is_plottable(&self) -> bool {
        self.plottable
    }

    pub fn is_trainable(&self) -> bool {
        self.trainable
    }

    pub fn applies(&self, kind: EntityKind) -> bool {
        kind.specializes(self.applies_to)
    }

    pub fn compute(&self, entity: Entity<'_>) -> AttributeResult<AttributeValue> {
        if !self.applies(entity.kind()) {
            return Err(AttributeError::NotApplicable {
                name: self.name.clone(),
                kind: entity.kind(),
            });
        }
        (self.compute)(entity)
    }
}

impl fmt::Debug for AttributeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeEntry")
            .field("name", &self.name)
            .field("applies_to", &self.applies_to)
            .field("plottable", &self.plottable)
            .field("trainable", &self.trainable)
            .finish()
    }
}

/// Ordered table of attributes
///
/// Built once at startup and passed to whatever needs it. Iteration order is
/// registration order, which fixes table row order and training CSV columns.
#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    entries: Vec<AttributeEntry>,
}

impl AttributeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        AttributeRegistry::default()
    }

    /// Register an attribute
    /// `trainable` defaults to `plottable` when None
    pub fn register(
        &mut self,
        applies_to: EntityKind,
        name: &str,
        compute: ComputeFn,
        plottable: bool,
        trainable: Option<bool>,
    ) -> Result<&mut Self, RegistryError> {
        if self.contains(name) {
            return Err(RegistryError::DuplicateAttribute(name.to_string()));
        }
        self.entries.push(AttributeEntry {
            name: name.to_string(),
            compute,
            applies_to,
            plottable,
            trainable: trainable.unwrap_or(plottable),
        });
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attributes applicable to `kind`, in registration order
    pub fn attributes_for(&self, kind: EntityKind) -> Vec<&AttributeEntry> {
        self.entries.iter().filter(|entry| entry.applies(kind)).collect()
    }

    /// Trainable attributes applicable to `kind`, in registration order
    pub fn trainable_for(&self, kind: EntityKind) -> Vec<&AttributeEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.applies(kind) && entry.trainable)
            .collect()
    }

    pub fn plottable_for(&self, kind: EntityKind) -> Vec<&AttributeEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.applies(kind) && entry.plottable)
            .collect()
    }

    pub fn compute(
        &self,
        entry: &AttributeEntry,
        entity: Entity<'_>,
    ) -> AttributeResult<AttributeValue> {
        entry.compute(entity)
    }

    pub fn compute_by_name(&self, name: &str, entity: Entity<'_>) -> AttributeResult<AttributeValue> {
        let entry = self
            .get(name)
            .ok_or_else(|| AttributeError::UnknownAttribute(name.to_string()))?;
        entry.compute(entity)
    }

    /// Every applicable attribute of `entity` as (name, value) pairs
    pub fn compute_all(&self, entity: Entity<'_>) -> AttributeResult<Vec<(String, AttributeValue)>> {
        self.attributes_for(entity.kind())
            .into_iter()
            .map(|entry| Ok((entry.name.clone(), entry.compute(entity)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Hit, Pixel};

    fn hits(entity: Entity<'_>) -> AttributeResult<AttributeValue> {
        Ok(AttributeValue::Int(entity.grid().number_of_hits() as i64))
    }

    fn label(_entity: Entity<'_>) -> AttributeResult<AttributeValue> {
        Ok(AttributeValue::Text("x".to_string()))
    }

    fn frame_with_hit() -> Frame {
        let mut frame = Frame::new(16, 16);
        frame.set(Pixel::new(3, 3), Hit::new(2)).unwrap();
        frame
    }

    #[test]
    fn test_kind_specialization() {
        assert!(EntityKind::Cluster.specializes(EntityKind::PixelGrid));
        assert!(EntityKind::Frame.specializes(EntityKind::PixelGrid));
        assert!(EntityKind::Frame.specializes(EntityKind::Frame));
        assert!(!EntityKind::Frame.specializes(EntityKind::Cluster));
        assert!(!EntityKind::PixelGrid.specializes(EntityKind::Frame));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = AttributeRegistry::new();
        registry
            .register(EntityKind::PixelGrid, "Hits", hits, true, None)
            .unwrap();
        let result = registry.register(EntityKind::Cluster, "Hits", label, false, None);
        assert_eq!(
            result.err(),
            Some(RegistryError::DuplicateAttribute("Hits".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_trainable_defaults_to_plottable() -> Result<(), RegistryError> {
        let mut registry = AttributeRegistry::new();
        registry
            .register(EntityKind::PixelGrid, "A", hits, true, None)?
            .register(EntityKind::Cluster, "B", label, false, None)?
            .register(EntityKind::Cluster, "C", hits, true, Some(false))?;

        assert!(registry.get("A").unwrap().is_trainable());
        assert!(!registry.get("B").unwrap().is_trainable());
        assert!(registry.get("C").unwrap().is_plottable());
        assert!(!registry.get("C").unwrap().is_trainable());
        Ok(())
    }

    #[test]
    fn test_attributes_for_filters_and_keeps_order() {
        let mut registry = AttributeRegistry::new();
        registry
            .register(EntityKind::Cluster, "First", label, false, None)
            .unwrap();
        registry
            .register(EntityKind::PixelGrid, "Second", hits, true, None)
            .unwrap();
        registry
            .register(EntityKind::Frame, "Third", hits, false, None)
            .unwrap();

        let names = |kind| -> Vec<String> {
            registry
                .attributes_for(kind)
                .iter()
                .map(|e| e.name().to_string())
                .collect()
        };
        assert_eq!(names(EntityKind::Cluster), vec!["First", "Second"]);
        assert_eq!(names(EntityKind::Frame), vec!["Second", "Third"]);
        assert_eq!(names(EntityKind::PixelGrid), vec!["Second"]);

        let trainable: Vec<&str> = registry
            .trainable_for(EntityKind::Cluster)
            .iter()
            .map(|e| e.name())
            .collect();
        assert_eq!(trainable, vec!["Second"]);
    }

    #[test]
    fn test_compute_rejects_inapplicable_entity() {
        let mut registry = AttributeRegistry::new();
        registry
            .register(EntityKind::Cluster, "Label", label, false, None)
            .unwrap();
        let frame = frame_with_hit();
        let result = registry.compute_by_name("Label", Entity::Frame(&frame));
        assert!(matches!(result, Err(AttributeError::NotApplicable { .. })));

        let unknown = registry.compute_by_name("Missing", Entity::Frame(&frame));
        assert!(matches!(unknown, Err(AttributeError::UnknownAttribute(_))));
    }

    #[test]
    fn test_value_formatting() {
        assert_eq!(AttributeValue::Int(42).to_string(), "42");
        assert_eq!(AttributeValue::Float(2.0 / 3.0).to_string(), "0.67");
        assert_eq!(AttributeValue::Pair(1.005, 7.5).to_string(), "(1.00, 7.50)");
        assert_eq!(AttributeValue::Text("abc".into()).to_string(), "abc");
        assert_eq!(AttributeValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(AttributeValue::Pair(1.0, 2.0).as_f64(), None);
    }
}
