//! Branch and branchset nodes.
//!
//! Branchsets are stored in an arena owned by the tree and addressed by
//! [`BranchSetId`]. A branch points at its child branchset by id, so a
//! branchset applied to every open end of a level is stored once and its
//! branch ids stay unique.

use std::fmt;

use crate::source::{MfdModification, SeismicSource};
use crate::uncertainty::{Filters, UncertaintyType, UncertaintyValue};
use crate::weight::Weight;

/// Index of a branchset in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchSetId(pub usize);

impl fmt::Display for BranchSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Non-owning reference to a branch: its branchset and its position there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchRef {
    pub branchset: BranchSetId,
    pub index: usize,
}

/// One alternative of a branchset.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    branch_id: String,
    weight: Weight,
    value: UncertaintyValue,
    child_branchset: Option<BranchSetId>,
}

impl Branch {
    /// Creates a leaf branch.
    pub fn new(branch_id: impl Into<String>, weight: Weight, value: UncertaintyValue) -> Self {
        Self {
            branch_id: branch_id.into(),
            weight,
            value,
            child_branchset: None,
        }
    }

    #[inline]
    pub fn branch_id(&self) -> &str {
        &self.branch_id
    }

    #[inline]
    pub fn weight(&self) -> Weight {
        self.weight
    }

    #[inline]
    pub fn value(&self) -> &UncertaintyValue {
        &self.value
    }

    /// Returns the branchset applied after this branch, if any.
    #[inline]
    pub fn child_branchset(&self) -> Option<BranchSetId> {
        self.child_branchset
    }

    /// Returns true when no branchset follows this branch.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.child_branchset.is_none()
    }

    /// Links the branchset applied after this branch.
    pub fn set_child_branchset(&mut self, child: BranchSetId) {
        self.child_branchset = Some(child);
    }
}

/// An ordered group of branches sharing an uncertainty type and filters.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSet {
    branchset_id: String,
    uncertainty_type: UncertaintyType,
    filters: Filters,
    branches: Vec<Branch>,
}

impl BranchSet {
    /// Creates a branchset without branches.
    pub fn new(
        branchset_id: impl Into<String>,
        uncertainty_type: UncertaintyType,
        filters: Filters,
    ) -> Self {
        Self {
            branchset_id: branchset_id.into(),
            uncertainty_type,
            filters,
            branches: Vec::new(),
        }
    }

    #[inline]
    pub fn branchset_id(&self) -> &str {
        &self.branchset_id
    }

    #[inline]
    pub fn uncertainty_type(&self) -> UncertaintyType {
        self.uncertainty_type
    }

    #[inline]
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    #[inline]
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branches_mut(&mut self) -> &mut [Branch] {
        &mut self.branches
    }

    /// Appends a branch, returning its position.
    pub fn push_branch(&mut self, branch: Branch) -> usize {
        self.branches.push(branch);
        self.branches.len() - 1
    }

    /// Finds a branch of this branchset by id.
    pub fn branch(&self, branch_id: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.branch_id == branch_id)
    }

    /// Sum of the branch weights.
    pub fn total_weight(&self) -> Weight {
        self.branches.iter().map(Branch::weight).sum()
    }

    /// Decides whether this branchset's uncertainty applies to `source`.
    ///
    /// Every filter must pass; evaluation stops at the first failure.
    /// A `point` source type filter does not match area sources.
    pub fn filter_source<S: SeismicSource + ?Sized>(&self, source: &S) -> bool {
        if let Some(trt) = &self.filters.tectonic_region_type {
            if trt != source.tectonic_region_type() {
                return false;
            }
        }
        if let Some(source_type) = self.filters.source_type {
            if source_type != source.source_type() {
                return false;
            }
        }
        if let Some(ids) = &self.filters.sources {
            if !ids.iter().any(|id| id == source.source_id()) {
                return false;
            }
        }
        true
    }

    /// Applies this branchset's uncertainty with `value` to `source` in place.
    ///
    /// Does nothing when the source does not pass [`filter_source`], when its
    /// distribution is not of the Gutenberg-Richter family, or when the
    /// uncertainty type does not describe a distribution change. None of
    /// these cases is an error.
    ///
    /// [`filter_source`]: BranchSet::filter_source
    pub fn apply_uncertainty<S: SeismicSource + ?Sized>(
        &self,
        value: &UncertaintyValue,
        source: &mut S,
    ) {
        if !self.filter_source(source) {
            return;
        }
        let Some(modification) = self.modification(value) else {
            return;
        };
        if let Some(mfd) = source.gutenberg_richter_mut() {
            mfd.modify(modification);
        }
    }

    fn modification(&self, value: &UncertaintyValue) -> Option<MfdModification> {
        match (self.uncertainty_type, value) {
            (UncertaintyType::AbGrAbsolute, UncertaintyValue::FloatPair(a, b)) => {
                Some(MfdModification::SetAb {
                    a_val: *a,
                    b_val: *b,
                })
            }
            (UncertaintyType::BGrRelative, UncertaintyValue::Float(v)) => {
                Some(MfdModification::IncrementB(*v))
            }
            (UncertaintyType::MaxMagGrRelative, UncertaintyValue::Float(v)) => {
                Some(MfdModification::IncrementMaxMag(*v))
            }
            (UncertaintyType::MaxMagGrAbsolute, UncertaintyValue::Float(v)) => {
                Some(MfdModification::SetMaxMag(*v))
            }
            _ => None,
        }
    }
}
