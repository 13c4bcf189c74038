//! Collaborator traits for seismic sources.
//!
//! The logic tree never builds sources itself. Callers hand their own source
//! objects to the closures produced by the source model tree, which only need
//! the identity of a source and mutable access to its Gutenberg-Richter
//! distribution.

use std::fmt;
use std::str::FromStr;

/// Source typology, as tagged in source model documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceType {
    Point,
    Area,
    SimpleFault,
    ComplexFault,
    CharacteristicFault,
}

impl SourceType {
    pub const ALL: [SourceType; 5] = [
        SourceType::Point,
        SourceType::Area,
        SourceType::ComplexFault,
        SourceType::SimpleFault,
        SourceType::CharacteristicFault,
    ];

    /// Returns the name used by `applyToSourceType` filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Point => "point",
            SourceType::Area => "area",
            SourceType::SimpleFault => "simpleFault",
            SourceType::ComplexFault => "complexFault",
            SourceType::CharacteristicFault => "characteristicFault",
        }
    }

    /// Returns the element name of this source type in source model
    /// documents, e.g. `pointSource`.
    pub fn tag(&self) -> &'static str {
        match self {
            SourceType::Point => "pointSource",
            SourceType::Area => "areaSource",
            SourceType::SimpleFault => "simpleFaultSource",
            SourceType::ComplexFault => "complexFaultSource",
            SourceType::CharacteristicFault => "characteristicFaultSource",
        }
    }

    /// Classifies a source model element by its local name.
    pub fn from_tag(tag: &str) -> Option<SourceType> {
        SourceType::ALL.into_iter().find(|t| t.tag() == tag)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown source type {s:?}"))
    }
}

/// Named parameter mutation of a Gutenberg-Richter distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MfdModification {
    SetAb { a_val: f64, b_val: f64 },
    IncrementB(f64),
    SetMaxMag(f64),
    IncrementMaxMag(f64),
}

/// A magnitude-frequency distribution of the Gutenberg-Richter family.
pub trait GutenbergRichterMfd {
    /// Applies one parameter mutation in place.
    fn modify(&mut self, modification: MfdModification);
}

/// A source the source model tree can filter and mutate.
///
/// `gutenberg_richter_mut` returns `None` when the source's distribution is
/// not of the Gutenberg-Richter family; uncertainties are then not applied.
pub trait SeismicSource {
    fn source_id(&self) -> &str;

    fn source_type(&self) -> SourceType;

    fn tectonic_region_type(&self) -> &str;

    fn gutenberg_richter_mut(&mut self) -> Option<&mut dyn GutenbergRichterMfd>;
}

/// Truncated Gutenberg-Richter distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruncatedGrMfd {
    pub min_mag: f64,
    pub max_mag: f64,
    pub bin_width: f64,
    pub a_val: f64,
    pub b_val: f64,
}

impl TruncatedGrMfd {
    pub fn new(min_mag: f64, max_mag: f64, bin_width: f64, a_val: f64, b_val: f64) -> Self {
        Self {
            min_mag,
            max_mag,
            bin_width,
            a_val,
            b_val,
        }
    }
}

impl GutenbergRichterMfd for TruncatedGrMfd {
    fn modify(&mut self, modification: MfdModification) {
        match modification {
            MfdModification::SetAb { a_val, b_val } => {
                self.a_val = a_val;
                self.b_val = b_val;
            }
            MfdModification::IncrementB(value) => self.b_val += value,
            MfdModification::SetMaxMag(value) => self.max_mag = value,
            MfdModification::IncrementMaxMag(value) => self.max_mag += value,
        }
    }
}
