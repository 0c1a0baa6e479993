//! Canonical trees: deduplicated representatives of color classes.
//!
//! Each round owns its trees in a flat arena ([`Round`]). A tree of round r refers to its
//! children in round r - 1 by [`TreeId`], so trees form a layered DAG without back-references.
use crate::error::{Error, Result};
use crate::graph::VertexId;
use crate::FHashMap;
use itertools::Itertools;
use std::cmp::Ordering;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Index of a tree in its round's arena. In a finalized round, this is the tree's rank.
pub type TreeId = usize;

/// Equivalence class of vertices whose neighborhoods unfold into the same tree
/// up to the depth of its round.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CanonicalTree {
    /// Round in which the class was discovered.
    pub round: usize,
    /// Classes of the members' neighbors in the previous round, sorted by [`TreeOrdering`].
    pub children: Vec<TreeId>,
    /// Number of nodes of the unfolded tree.
    pub size: usize,
    /// Position in the sorted class list of its round.
    /// Holds the discovery index while the round is still being built.
    pub rank: usize,
    /// Vertices of this class, ascending.
    pub members: Vec<VertexId>,
}

/// Finalized round: classes sorted by [`TreeOrdering`] and the class rank of every vertex.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Round {
    trees: Vec<CanonicalTree>,
    colors: Vec<usize>,
}

impl Round {
    /// Classes in canonical order, `trees()[i].rank == i`.
    pub fn trees(&self) -> &[CanonicalTree] {
        &self.trees
    }

    pub fn tree(&self, id: TreeId) -> &CanonicalTree {
        &self.trees[id]
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Class rank of each vertex.
    pub fn colors(&self) -> &[usize] {
        &self.colors
    }

    pub fn color(&self, v: VertexId) -> usize {
        self.colors[v]
    }
}

/// Total order on the canonical trees of a round, by number of children, then size, then
/// children in order. Follows child references into the given finalized rounds.
#[derive(Clone, Copy, Debug)]
pub struct TreeOrdering<'a> {
    rounds: &'a [Round],
}

impl<'a> TreeOrdering<'a> {
    pub fn new(rounds: &'a [Round]) -> Self {
        Self { rounds }
    }

    /// Two distinct trees that are equal at every level mean that an earlier round
    /// was not deduplicated, which is reported as an error.
    pub fn compare(&self, t1: &CanonicalTree, t2: &CanonicalTree) -> Result<Ordering> {
        if std::ptr::eq(t1, t2) {
            return Ok(Ordering::Equal);
        }
        debug_assert_eq!(t1.round, t2.round);

        let ord = t1.children.len().cmp(&t2.children.len()).then(t1.size.cmp(&t2.size));
        if ord != Ordering::Equal {
            return Ok(ord);
        }
        for (&c1, &c2) in t1.children.iter().zip_eq(&t2.children) {
            let ord = self.compare_ids(t1.round - 1, c1, c2)?;
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Err(Error::InternalConsistency { round: t1.round, first: t1.rank, second: t2.rank })
    }

    /// Compares two trees of a finalized round.
    pub fn compare_ids(&self, round: usize, a: TreeId, b: TreeId) -> Result<Ordering> {
        let round = &self.rounds[round];
        self.compare(round.tree(a), round.tree(b))
    }

    /// Sorts trees of a finalized round, as needed for the children of a new tree.
    pub fn sort_ids(&self, round: usize, ids: &mut [TreeId]) -> Result<()> {
        sort_checked(ids, |&a, &b| self.compare_ids(round, a, b))
    }
}

/// Sorts by a fallible comparison and returns the first error it reported, if any.
/// A failed comparison counts as equal, which keeps the order consistent for the sort.
fn sort_checked<T>(items: &mut [T], mut compare: impl FnMut(&T, &T) -> Result<Ordering>) -> Result<()> {
    let mut violation = None;
    items.sort_by(|a, b| compare(a, b).unwrap_or_else(|e| {
        violation.get_or_insert(e);
        Ordering::Equal
    }));
    violation.map_or(Ok(()), Err)
}

/// Classes of the round under construction, in order of discovery.
#[derive(Clone, Debug)]
pub(crate) struct RoundBuilder {
    round: usize,
    trees: Vec<CanonicalTree>,
    by_children: FHashMap<Vec<TreeId>, TreeId>,
    classes: Vec<TreeId>,
}

impl RoundBuilder {
    pub fn new(round: usize, num_vertices: usize) -> Self {
        Self { round, trees: vec![], by_children: FHashMap::default(), classes: Vec::with_capacity(num_vertices) }
    }

    /// Returns the class built so far in this round with exactly these sorted children.
    /// Children are canonical trees of the previous round, so comparing their ids
    /// is enough to establish structural equality.
    pub fn find_existing(&self, children: &[TreeId]) -> Option<TreeId> {
        self.by_children.get(children).copied()
    }

    /// Registers a new class. Callers check `find_existing` first.
    pub fn insert(&mut self, children: Vec<TreeId>, size: usize) -> TreeId {
        let id = self.trees.len();
        let previous = self.by_children.insert(children.clone(), id);
        debug_assert!(previous.is_none(), "Class {children:?} registered twice.");
        self.trees.push(CanonicalTree { round: self.round, children, size, rank: id, members: vec![] });
        id
    }

    /// Puts the next vertex into a class. Vertices must arrive in id order.
    pub fn assign(&mut self, v: VertexId, class: TreeId) {
        debug_assert_eq!(v, self.classes.len());
        self.trees[class].members.push(v);
        self.classes.push(class);
    }

    /// Sorts the classes canonically and assigns ranks.
    pub fn finish(self, ordering: &TreeOrdering) -> Result<Round> {
        let mut order = (0..self.trees.len()).collect_vec();
        sort_checked(&mut order, |&a, &b| ordering.compare(&self.trees[a], &self.trees[b]))?;
        let mut ranks = vec![0; order.len()];
        for (rank, &id) in order.iter().enumerate() {
            ranks[id] = rank;
        }

        let mut trees = self.trees;
        for (tree, &rank) in trees.iter_mut().zip_eq(&ranks) {
            tree.rank = rank;
        }
        trees.sort_unstable_by_key(|t| t.rank);
        let colors = self.classes.iter().map(|&class| ranks[class]).collect();
        Ok(Round { trees, colors })
    }
}

/// Renders the full unfolded tree of a class in nested parentheses, a leaf being `()`.
#[derive(Clone, Copy, Debug)]
pub struct TreeDisplay<'a> {
    rounds: &'a [Round],
    round: usize,
    id: TreeId,
}

impl<'a> TreeDisplay<'a> {
    pub fn new(rounds: &'a [Round], round: usize, id: TreeId) -> Self {
        Self { rounds, round, id }
    }
}

impl Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for &child in &self.rounds[self.round].tree(self.id).children {
            write!(f, "{}", TreeDisplay::new(self.rounds, self.round - 1, child))?;
        }
        write!(f, ")")
    }
}
