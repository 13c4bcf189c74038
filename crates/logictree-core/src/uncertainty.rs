//! Uncertainty types, branchset filters and branch values.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::gsim::GsimHandle;
use crate::source::SourceType;

/// The kind of alternative a branchset represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UncertaintyType {
    /// Branches reference alternative source model files.
    SourceModel,
    /// Branches reference alternative ground-motion models.
    GmpeModel,
    /// Values added to the Gutenberg-Richter maximum magnitude.
    MaxMagGrRelative,
    /// Values added to the Gutenberg-Richter b value.
    BGrRelative,
    /// Pairs replacing the Gutenberg-Richter a and b values.
    AbGrAbsolute,
    /// Values replacing the Gutenberg-Richter maximum magnitude.
    MaxMagGrAbsolute,
}

impl UncertaintyType {
    /// All uncertainty types, in document vocabulary order.
    pub const ALL: [UncertaintyType; 6] = [
        UncertaintyType::GmpeModel,
        UncertaintyType::SourceModel,
        UncertaintyType::MaxMagGrRelative,
        UncertaintyType::BGrRelative,
        UncertaintyType::AbGrAbsolute,
        UncertaintyType::MaxMagGrAbsolute,
    ];

    /// Returns the spelling used by the `uncertaintyType` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            UncertaintyType::SourceModel => "sourceModel",
            UncertaintyType::GmpeModel => "gmpeModel",
            UncertaintyType::MaxMagGrRelative => "maxMagGRRelative",
            UncertaintyType::BGrRelative => "bGRRelative",
            UncertaintyType::AbGrAbsolute => "abGRAbsolute",
            UncertaintyType::MaxMagGrAbsolute => "maxMagGRAbsolute",
        }
    }

    /// Returns true for the types that replace a parameter of one source.
    pub fn is_absolute(&self) -> bool {
        matches!(
            self,
            UncertaintyType::AbGrAbsolute | UncertaintyType::MaxMagGrAbsolute
        )
    }

    /// Returns true for the types that mutate a magnitude-frequency
    /// distribution.
    pub fn is_gutenberg_richter(&self) -> bool {
        !matches!(
            self,
            UncertaintyType::SourceModel | UncertaintyType::GmpeModel
        )
    }
}

impl fmt::Display for UncertaintyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UncertaintyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UncertaintyType::ALL
            .into_iter()
            .find(|ut| ut.as_str() == s)
            .ok_or_else(|| format!("unknown uncertainty type {s:?}"))
    }
}

/// Branchset attribute restricting which sources an uncertainty applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKind {
    TectonicRegionType,
    SourceType,
    Sources,
}

impl FilterKind {
    pub const ALL: [FilterKind; 3] = [
        FilterKind::TectonicRegionType,
        FilterKind::Sources,
        FilterKind::SourceType,
    ];

    /// Returns the attribute name of this filter.
    pub fn attribute(&self) -> &'static str {
        match self {
            FilterKind::TectonicRegionType => "applyToTectonicRegionType",
            FilterKind::SourceType => "applyToSourceType",
            FilterKind::Sources => "applyToSources",
        }
    }

    /// Looks up a filter by attribute name.
    pub fn from_attribute(name: &str) -> Option<FilterKind> {
        FilterKind::ALL.into_iter().find(|k| k.attribute() == name)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute())
    }
}

/// Filters exactly as written on a branchset element.
pub type RawFilters = BTreeMap<FilterKind, String>;

/// Parsed branchset filters.
///
/// Each filter kind appears at most once; an empty set applies the
/// uncertainty to every source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub tectonic_region_type: Option<String>,
    pub source_type: Option<SourceType>,
    pub sources: Option<Vec<String>>,
}

impl Filters {
    /// Creates an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one tectonic region type.
    pub fn with_tectonic_region_type(mut self, trt: impl Into<String>) -> Self {
        self.tectonic_region_type = Some(trt.into());
        self
    }

    /// Restricts to one source type.
    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = Some(source_type);
        self
    }

    /// Restricts to a list of source ids.
    pub fn with_sources<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the kinds present, in a stable order.
    pub fn kinds(&self) -> Vec<FilterKind> {
        let mut kinds = Vec::new();
        if self.tectonic_region_type.is_some() {
            kinds.push(FilterKind::TectonicRegionType);
        }
        if self.source_type.is_some() {
            kinds.push(FilterKind::SourceType);
        }
        if self.sources.is_some() {
            kinds.push(FilterKind::Sources);
        }
        kinds
    }

    pub fn len(&self) -> usize {
        self.kinds().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tectonic_region_type.is_none() && self.source_type.is_none() && self.sources.is_none()
    }
}

/// The value carried by a branch; its shape follows the owning branchset's
/// uncertainty type.
#[derive(Debug, Clone)]
pub enum UncertaintyValue {
    /// Source model file name, relative to the tree's base path.
    SourceModel(String),
    /// Single float for relative deltas and the absolute maximum magnitude.
    Float(f64),
    /// `(a, b)` pair for absolute Gutenberg-Richter values.
    FloatPair(f64, f64),
    /// Resolved ground-motion model.
    Gsim(GsimHandle),
}

impl UncertaintyValue {
    /// Returns the source model file name, if this is a source model value.
    pub fn as_source_model(&self) -> Option<&str> {
        match self {
            UncertaintyValue::SourceModel(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the resolved model, if this is a ground-motion-model value.
    pub fn as_gsim(&self) -> Option<&GsimHandle> {
        match self {
            UncertaintyValue::Gsim(gsim) => Some(gsim),
            _ => None,
        }
    }
}

impl PartialEq for UncertaintyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (UncertaintyValue::SourceModel(a), UncertaintyValue::SourceModel(b)) => a == b,
            (UncertaintyValue::Float(a), UncertaintyValue::Float(b)) => a == b,
            (UncertaintyValue::FloatPair(a1, b1), UncertaintyValue::FloatPair(a2, b2)) => {
                a1 == a2 && b1 == b2
            }
            (UncertaintyValue::Gsim(a), UncertaintyValue::Gsim(b)) => a.name() == b.name(),
            _ => false,
        }
    }
}

impl fmt::Display for UncertaintyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UncertaintyValue::SourceModel(name) => f.write_str(name),
            UncertaintyValue::Float(v) => write!(f, "{v}"),
            UncertaintyValue::FloatPair(a, b) => write!(f, "{a} {b}"),
            UncertaintyValue::Gsim(gsim) => f.write_str(gsim.name()),
        }
    }
}
