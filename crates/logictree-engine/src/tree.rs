//! The built, read-only logic tree.

use std::collections::HashMap;

use logictree_config::RealizationMode;
use logictree_core::{Branch, BranchRef, BranchSet, BranchSetId, LogicTreeError, Result};

use crate::paths::{EnumeratePaths, Paths, SamplePaths, TreePath};

/// Branchsets in an arena plus a branch id index.
///
/// Branchset `#0` is the root. A branch refers to its child branchset by
/// id; children always come after their parents in the arena.
#[derive(Debug, Clone)]
pub struct LogicTree {
    branchsets: Vec<BranchSet>,
    index: HashMap<String, BranchRef>,
    depth: usize,
}

impl LogicTree {
    pub(crate) fn new() -> Self {
        Self {
            branchsets: Vec::new(),
            index: HashMap::new(),
            depth: 0,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.branchsets.is_empty()
    }

    /// Id the next pushed branchset will receive.
    pub(crate) fn next_branchset_id(&self) -> BranchSetId {
        BranchSetId(self.branchsets.len())
    }

    pub(crate) fn push_branchset(&mut self, branchset: BranchSet) -> BranchSetId {
        let id = self.next_branchset_id();
        self.branchsets.push(branchset);
        id
    }

    /// Registers a branch id. Returns false when the id is taken.
    pub(crate) fn index_branch(&mut self, branch_id: &str, at: BranchRef) -> bool {
        if self.index.contains_key(branch_id) {
            return false;
        }
        self.index.insert(branch_id.to_string(), at);
        true
    }

    /// Makes `child` the branchset that follows the branch at `at`.
    ///
    /// # Panics
    ///
    /// Panics if `at` does not name a branch of this tree.
    pub fn attach(&mut self, at: BranchRef, child: BranchSetId) {
        self.branchsets[at.branchset.0].branches_mut()[at.index].set_child_branchset(child);
    }

    pub(crate) fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
    }

    /// The first branchset of the tree, `None` before any branchset is added.
    pub fn root(&self) -> Option<&BranchSet> {
        self.branchsets.first()
    }

    pub fn branchset(&self, id: BranchSetId) -> &BranchSet {
        &self.branchsets[id.0]
    }

    pub fn branchsets(&self) -> &[BranchSet] {
        &self.branchsets
    }

    pub fn branch_at(&self, at: BranchRef) -> &Branch {
        &self.branchsets[at.branchset.0].branches()[at.index]
    }

    /// Where the branch with this id lives.
    pub fn branch_ref(&self, branch_id: &str) -> Option<BranchRef> {
        self.index.get(branch_id).copied()
    }

    /// Looks a branch up anywhere in the tree.
    pub fn branch(&self, branch_id: &str) -> Option<&Branch> {
        self.branch_ref(branch_id).map(|at| self.branch_at(at))
    }

    /// Number of branching levels that contributed branchsets, which is the
    /// length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Total number of branches.
    pub fn num_branches(&self) -> usize {
        self.index.len()
    }

    /// Number of root-to-leaf paths, counted without enumerating them.
    ///
    /// Saturates at `u128::MAX`.
    pub fn num_paths(&self) -> u128 {
        // Children follow parents in the arena, so a reverse sweep sees
        // every child count before it is needed.
        let mut counts = vec![0u128; self.branchsets.len()];
        for (id, branchset) in self.branchsets.iter().enumerate().rev() {
            counts[id] = branchset
                .branches()
                .iter()
                .map(|branch| match branch.child_branchset() {
                    Some(child) => counts[child.0],
                    None => 1,
                })
                .fold(0u128, u128::saturating_add);
        }
        counts.first().copied().unwrap_or(0)
    }

    /// Every root-to-leaf path, one at a time, with its exact weight.
    pub fn enumerate_paths(&self) -> EnumeratePaths<'_> {
        EnumeratePaths::new(self)
    }

    /// `count` independent weighted draws, reproducible for a given seed.
    pub fn sample_paths(&self, count: usize, seed: i64) -> SamplePaths<'_> {
        SamplePaths::new(self, count, seed)
    }

    /// Enumerates or samples depending on `mode`.
    pub fn paths(&self, mode: RealizationMode) -> Paths<'_> {
        match mode {
            RealizationMode::Enumerate => Paths::Enumerate(self.enumerate_paths()),
            RealizationMode::Sample { count, seed } => {
                Paths::Sample(self.sample_paths(count, seed))
            }
        }
    }

    /// Resolves a branch-id path, which must lead from the root to a leaf.
    pub fn walk<S: AsRef<str>>(&self, branch_ids: &[S]) -> Result<TreePath<'_>> {
        let mut steps = Vec::with_capacity(branch_ids.len());
        let mut current = self.root().map(|_| BranchSetId(0));
        for branch_id in branch_ids {
            let branch_id = branch_id.as_ref();
            let Some(id) = current else {
                return Err(LogicTreeError::InvalidPath(format!(
                    "branch {branch_id:?} follows a leaf"
                )));
            };
            let branchset = self.branchset(id);
            let branch = branchset.branch(branch_id).ok_or_else(|| {
                LogicTreeError::InvalidPath(format!(
                    "branch {:?} is not in branchset {:?}",
                    branch_id,
                    branchset.branchset_id()
                ))
            })?;
            steps.push((branchset, branch));
            current = branch.child_branchset();
        }
        if let Some(id) = current {
            return Err(LogicTreeError::InvalidPath(format!(
                "path stops before a leaf, at branchset {:?}",
                self.branchset(id).branchset_id()
            )));
        }
        Ok(TreePath::weighted(steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logictree_core::{Filters, UncertaintyType, UncertaintyValue};
    use rust_decimal::Decimal;

    fn branchset(id: &str, branches: &[&str]) -> BranchSet {
        let mut branchset = BranchSet::new(id, UncertaintyType::BGrRelative, Filters::new());
        let weight = Decimal::ONE / Decimal::from(branches.len());
        for branch_id in branches {
            branchset.push_branch(Branch::new(*branch_id, weight, UncertaintyValue::Float(0.0)));
        }
        branchset
    }

    #[test]
    fn test_tree_without_branchsets() {
        let tree = LogicTree::new();

        assert!(tree.root().is_none());
        assert_eq!(tree.num_paths(), 0);
        assert_eq!(tree.enumerate_paths().count(), 0);
        assert_eq!(tree.sample_paths(3, 7).count(), 0);
        assert!(tree.walk::<&str>(&[]).unwrap().is_empty());
        assert!(matches!(
            tree.walk(&["b1"]),
            Err(LogicTreeError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_attach() {
        let mut tree = LogicTree::new();
        let root = tree.push_branchset(branchset("bs1", &["b1", "b2"]));
        let child = tree.push_branchset(branchset("bs2", &["b3"]));
        let at = BranchRef {
            branchset: root,
            index: 1,
        };
        tree.attach(at, child);

        assert_eq!(tree.branch_at(at).child_branchset(), Some(child));
        assert_eq!(tree.num_paths(), 2);
        let paths: Vec<Vec<String>> = tree.enumerate_paths().map(|p| p.branch_ids()).collect();
        assert_eq!(paths, vec![vec!["b1"], vec!["b2", "b3"]]);
        assert_eq!(
            tree.walk(&["b2", "b3"]).unwrap().weight(),
            Some(Decimal::new(5, 1))
        );
    }
}
