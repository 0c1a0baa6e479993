//! Undirected simple graphs stored as adjacency lists.
use crate::FHashSet;
use itertools::Itertools;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::Range;

pub mod random;

pub use random::{max_edges, random_graph, random_seed};

pub type VertexId = usize;
pub type EdgeIndex = (VertexId, VertexId);

/// Undirected graph without self-loops or parallel edges.
/// Neighbor lists hold vertex ids in edge insertion order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Graph {
    neighbors: Vec<Vec<VertexId>>,
    edges: Vec<EdgeIndex>,
}

impl Graph {
    pub fn empty(len: usize) -> Self {
        Self { neighbors: vec![vec![]; len], edges: vec![] }
    }

    pub fn new(len: usize, edges: impl IntoIterator<Item=EdgeIndex>) -> Self {
        let mut x = Self::empty(len);
        for e in edges {
            x.insert_edge(e);
        }
        x.verify_is_simple();
        x
    }

    /// Callers guarantee that the pair is new and not a self-loop.
    pub(crate) fn insert_edge(&mut self, (i, j): EdgeIndex) {
        assert!(i < self.len() && j < self.len(), "Edge {:?} out of range for {} vertices.", (i, j), self.len());
        self.neighbors[i].push(j);
        self.neighbors[j].push(i);
        self.edges.push((i, j));
    }

    /// Only in debug build, since generated graphs are simple by construction.
    fn verify_is_simple(&self) {
        debug_assert!(self.edges.iter().all(|(i, j)| i != j), "Self-loop in {:?}", self.edges);
        debug_assert_eq!(self.edges.iter().map(|&(i, j)| (i.min(j), i.max(j))).collect::<FHashSet<_>>().len(),
                         self.edges.len(), "Duplicate edge in {:?}", self.edges);
    }

    pub fn complete(len: usize) -> Self {
        Self::new(len, (0..len).flat_map(|j| (0..j).map(move |i| (i, j))))
    }

    pub fn path(len: usize) -> Self {
        Self::new(len, (1..len).map(|j| (j - 1, j)))
    }

    pub fn cycle(len: usize) -> Self {
        assert!(len >= 3, "A cycle needs at least 3 vertices.");
        Self::new(len, (0..len).map(|i| (i, (i + 1) % len)))
    }

    /// Places `other` next to `self`, shifting its vertex ids by `self.len()`.
    pub fn disjoint_union(&self, other: &Graph) -> Self {
        let offset = self.len();
        let edges = self.edges.iter().cloned().chain(other.edges.iter().map(|&(i, j)| (i + offset, j + offset)));
        Self::new(offset + other.len(), edges)
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn vertices(&self) -> Range<VertexId> {
        0..self.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }

    pub fn neighbors(&self, v: VertexId) -> &[VertexId] {
        &self.neighbors[v]
    }

    pub fn degrees(&self) -> impl ExactSizeIterator<Item=usize> + '_ {
        self.neighbors.iter().map(|ne| ne.len())
    }

    pub fn has_edge(&self, (i, j): EdgeIndex) -> bool {
        self.neighbors[i].contains(&j)
    }
}

impl Display for Graph {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "N={}, E={}: [{}]", self.len(), self.num_edges(),
               self.edges.iter().map(|(i, j)| format!("({i}, {j})")).join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_match_edges() {
        let g = Graph::new(4, [(0, 1), (2, 1), (3, 0)]);
        assert_eq!(g.num_edges(), 3);
        assert_eq!(g.neighbors(0), &[1, 3]);
        assert_eq!(g.neighbors(1), &[0, 2]);
        assert_eq!(g.degrees().collect_vec(), vec![2, 2, 1, 1]);
        assert_eq!(g.degrees().sum::<usize>(), 2 * g.num_edges());
        assert!(g.has_edge((1, 2)));
        assert!(!g.has_edge((2, 3)));
    }

    #[test]
    fn named_graphs() {
        assert_eq!(Graph::complete(5).num_edges(), 10);
        assert!(Graph::complete(5).degrees().all(|d| d == 4));
        assert_eq!(Graph::path(4).edges(), &[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(Graph::path(0).num_edges(), 0);
        assert!(Graph::cycle(6).degrees().all(|d| d == 2));
        assert!(Graph::empty(0).is_empty());
    }

    #[test]
    fn disjoint_union() {
        let g = Graph::path(3).disjoint_union(&Graph::complete(3));
        assert_eq!(g.len(), 6);
        assert_eq!(g.edges(), &[(0, 1), (1, 2), (3, 4), (3, 5), (4, 5)]);
        assert!(!g.has_edge((2, 3)));
    }

    #[test]
    #[should_panic]
    fn dangling_edge() {
        Graph::new(2, [(0, 2)]);
    }

    #[test]
    fn display() {
        assert_eq!(Graph::path(3).to_string(), "N=3, E=2: [(0, 1), (1, 2)]");
    }
}
