//! Path enumeration and sampling.
//!
//! Both are lazy: one path is materialized per call to `next`, so trees with
//! combinatorially many paths can be consumed (or abandoned) incrementally.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::trace;

use logictree_core::{weight, Branch, BranchSet, BranchSetId, Weight};

use crate::tree::LogicTree;

/// A root-to-leaf walk: every chosen branch with the branchset it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct TreePath<'a> {
    steps: Vec<(&'a BranchSet, &'a Branch)>,
    weight: Option<Weight>,
}

impl<'a> TreePath<'a> {
    /// A path carrying the product of its branch weights.
    pub fn weighted(steps: Vec<(&'a BranchSet, &'a Branch)>) -> Self {
        let weight = weight::product(steps.iter().map(|(_, branch)| branch.weight()));
        Self {
            steps,
            weight: Some(weight),
        }
    }

    /// A sampled path; its probability is encoded by sampling frequency.
    pub fn unweighted(steps: Vec<(&'a BranchSet, &'a Branch)>) -> Self {
        Self {
            steps,
            weight: None,
        }
    }

    pub fn steps(&self) -> &[(&'a BranchSet, &'a Branch)] {
        &self.steps
    }

    pub fn branches(&self) -> impl Iterator<Item = &'a Branch> + '_ {
        self.steps.iter().map(|(_, branch)| *branch)
    }

    pub fn weight(&self) -> Option<Weight> {
        self.weight
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The branch chosen in the root branchset.
    pub fn root_branch(&self) -> Option<&'a Branch> {
        self.steps.first().map(|(_, branch)| *branch)
    }

    pub fn branch_ids(&self) -> Vec<String> {
        self.branches().map(|b| b.branch_id().to_string()).collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    branchset: BranchSetId,
    next: usize,
}

/// Depth-first enumeration with an explicit stack.
///
/// The stack never holds more frames than the tree has levels; only the
/// current path and its running weight products are kept.
#[derive(Debug, Clone)]
pub struct EnumeratePaths<'a> {
    tree: &'a LogicTree,
    stack: Vec<Frame>,
    path: Vec<(&'a BranchSet, &'a Branch)>,
    // weights[i] is the product of the first i + 1 branch weights of `path`
    weights: Vec<Weight>,
}

impl<'a> EnumeratePaths<'a> {
    pub(crate) fn new(tree: &'a LogicTree) -> Self {
        let stack = if tree.is_empty() {
            Vec::new()
        } else {
            vec![Frame {
                branchset: BranchSetId(0),
                next: 0,
            }]
        };
        Self {
            tree,
            stack,
            path: Vec::with_capacity(tree.depth()),
            weights: Vec::with_capacity(tree.depth()),
        }
    }
}

impl<'a> Iterator for EnumeratePaths<'a> {
    type Item = TreePath<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            let level = self.stack.len();
            let frame = self.stack.last_mut()?;
            let branchset = tree.branchset(frame.branchset);
            let Some(branch) = branchset.branches().get(frame.next) else {
                self.stack.pop();
                continue;
            };
            frame.next += 1;

            self.path.truncate(level - 1);
            self.weights.truncate(level - 1);
            let prefix = self.weights.last().copied().unwrap_or(Decimal::ONE);
            self.path.push((branchset, branch));
            self.weights.push(prefix * branch.weight());

            match branch.child_branchset() {
                Some(child) => self.stack.push(Frame {
                    branchset: child,
                    next: 0,
                }),
                None => {
                    let path = TreePath {
                        steps: self.path.clone(),
                        weight: self.weights.last().copied(),
                    };
                    trace!(
                        event = "realization",
                        mode = "enumerate",
                        path = %path.branch_ids().join(","),
                    );
                    return Some(path);
                }
            }
        }
    }
}

/// Independent weighted draws from a seeded ChaCha8 generator.
#[derive(Debug, Clone)]
pub struct SamplePaths<'a> {
    tree: &'a LogicTree,
    rng: ChaCha8Rng,
    remaining: usize,
}

impl<'a> SamplePaths<'a> {
    pub(crate) fn new(tree: &'a LogicTree, count: usize, seed: i64) -> Self {
        Self {
            tree,
            rng: ChaCha8Rng::seed_from_u64(seed as u64),
            remaining: if tree.is_empty() { 0 } else { count },
        }
    }

    fn sample_one(&mut self) -> TreePath<'a> {
        let mut steps = Vec::with_capacity(self.tree.depth());
        let mut current = Some(BranchSetId(0));
        while let Some(id) = current {
            let branchset = self.tree.branchset(id);
            let roll = self.rng.random::<f64>();
            let branch = choose(branchset.branches(), roll);
            steps.push((branchset, branch));
            current = branch.child_branchset();
        }
        TreePath::unweighted(steps)
    }
}

impl<'a> Iterator for SamplePaths<'a> {
    type Item = TreePath<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let path = self.sample_one();
        trace!(
            event = "realization",
            mode = "sample",
            path = %path.branch_ids().join(","),
        );
        Some(path)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SamplePaths<'_> {}

/// Cumulative-weight walk in declared order.
///
/// Picks the first branch whose running weight sum reaches `roll`. Since
/// weights sum to one and `roll < 1`, the fallback to the last branch only
/// guards against an empty-weight tail.
fn choose(branches: &[Branch], roll: f64) -> &Branch {
    let roll = Decimal::from_f64(roll).unwrap_or(Decimal::ZERO);
    let mut cumulative = Decimal::ZERO;
    for branch in branches {
        cumulative += branch.weight();
        if cumulative >= roll {
            return branch;
        }
    }
    &branches[branches.len() - 1]
}

/// Either enumeration or sampling, as chosen by a
/// [`RealizationMode`](logictree_config::RealizationMode).
#[derive(Debug, Clone)]
pub enum Paths<'a> {
    Enumerate(EnumeratePaths<'a>),
    Sample(SamplePaths<'a>),
}

impl<'a> Iterator for Paths<'a> {
    type Item = TreePath<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Paths::Enumerate(paths) => paths.next(),
            Paths::Sample(paths) => paths.next(),
        }
    }
}
