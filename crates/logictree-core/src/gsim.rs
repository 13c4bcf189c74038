//! Ground-motion-model handles and their registry.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

/// An opaque ground-motion model implementation.
///
/// The tree only needs a stable identifier; computing ground motion is the
/// caller's business.
pub trait GroundMotionModel: Debug + Send + Sync {
    /// Returns the identifier this model is registered under.
    fn name(&self) -> &str;
}

/// Shared handle to a registered model.
pub type GsimHandle = Arc<dyn GroundMotionModel>;

/// A model known only by its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedGsim {
    name: String,
}

impl NamedGsim {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl GroundMotionModel for NamedGsim {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Lookup table from identifier to model.
///
/// # Examples
///
/// ```
/// use logictree_core::GsimRegistry;
///
/// let registry = GsimRegistry::from_names(["BooreAtkinson2008", "ChiouYoungs2008"]);
/// assert!(registry.get("ChiouYoungs2008").is_some());
/// assert!(registry.get("Unknown").is_none());
/// assert_eq!(registry.names(), vec!["BooreAtkinson2008", "ChiouYoungs2008"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GsimRegistry {
    models: BTreeMap<String, GsimHandle>,
}

impl GsimRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry of [`NamedGsim`] models.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.register(Arc::new(NamedGsim::new(name)));
        }
        registry
    }

    /// Adds a model under its own name, replacing any previous entry.
    pub fn register(&mut self, model: GsimHandle) {
        self.models.insert(model.name().to_string(), model);
    }

    /// Looks up a model by identifier.
    pub fn get(&self, name: &str) -> Option<GsimHandle> {
        self.models.get(name).cloned()
    }

    /// Returns all identifiers in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
