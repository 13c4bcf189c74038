//! The record yielded for each root-to-leaf path of a tree.

use crate::weight::Weight;

/// One complete path through a logic tree with its resolved payload.
///
/// `weight` is present under full enumeration only. Under sampling the
/// relative frequency of a path encodes its probability, so no per-sample
/// weight is attached.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Realization<V> {
    pub value: V,
    pub weight: Option<Weight>,
    pub lt_path: Vec<String>,
}

impl<V> Realization<V> {
    pub fn new(value: V, weight: Option<Weight>, lt_path: Vec<String>) -> Self {
        Self {
            value,
            weight,
            lt_path,
        }
    }

    /// Replaces the payload, keeping weight and path.
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Realization<U> {
        Realization {
            value: f(self.value),
            weight: self.weight,
            lt_path: self.lt_path,
        }
    }
}
