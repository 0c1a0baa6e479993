//! Color refinement, also known as the 1-dimensional Weisfeiler-Leman algorithm.
//!
//! In round 0 all vertices share one class. In every further round, a vertex's class is the
//! sorted multiset of its neighbors' classes from the previous round, represented by a
//! [`CanonicalTree`]. Refinement stops as soon as a round does not increase the number of
//! classes; that round is not part of the result.
use crate::error::Result;
use crate::graph::{Graph, VertexId};
use itertools::Itertools;
use log::{debug, warn};

pub mod tree;

pub use tree::{CanonicalTree, Round, TreeDisplay, TreeId, TreeOrdering};
use tree::RoundBuilder;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ColorRefinement {
    /// Stop after this many rounds even if the partition is not stable yet.
    pub max_rounds: Option<usize>,
}

impl ColorRefinement {
    pub fn new(max_rounds: Option<usize>) -> Self {
        Self { max_rounds }
    }

    /// Runs rounds until the number of classes stops increasing.
    /// Returns at most `graph.len()` rounds, the first one having a single class unless the
    /// graph is empty.
    pub fn run(&self, graph: &Graph) -> Result<Refinement> {
        let mut rounds: Vec<Round> = vec![];
        loop {
            if self.max_rounds.is_some_and(|max| rounds.len() >= max) {
                warn!("Stopped color refinement after {} rounds, before the partition was stable.", rounds.len());
                return Ok(Refinement { rounds, stable: false });
            }

            let round = Self::refine(graph, &rounds)?;
            if round.len() == rounds.last().map_or(0, Round::len) {
                debug!("Round {} did not split any class, stopping.", rounds.len());
                return Ok(Refinement { rounds, stable: true });
            }
            debug!("Round {}: {} classes.", rounds.len(), round.len());
            rounds.push(round);
        }
    }

    /// Computes the next round from the finalized previous ones.
    fn refine(graph: &Graph, rounds: &[Round]) -> Result<Round> {
        let ordering = TreeOrdering::new(rounds);
        let mut builder = RoundBuilder::new(rounds.len(), graph.len());
        for v in graph.vertices() {
            let children = match rounds.last() {
                None => vec![],
                Some(prev) => {
                    let mut children = graph.neighbors(v).iter().map(|&u| prev.color(u)).collect_vec();
                    ordering.sort_ids(rounds.len() - 1, &mut children)?;
                    children
                }
            };
            let class = match builder.find_existing(&children) {
                Some(class) => class,
                None => {
                    let size = 1 + rounds.last().map_or(0, |prev| children.iter().map(|&c| prev.tree(c).size).sum());
                    builder.insert(children, size)
                }
            };
            builder.assign(v, class);
        }
        builder.finish(&ordering)
    }

    /// 1-dimensional Weisfeiler-Leman graph isomorphism test.
    /// If false, the graphs are guaranteed to be non-isomorphic.
    /// If true, the graphs may still be non-isomorphic.
    pub fn maybe_isomorphic(&self, x: &Graph, y: &Graph) -> Result<bool> {
        if x.len() != y.len() || x.num_edges() != y.num_edges() {
            return Ok(false);
        }
        let union = self.run(&x.disjoint_union(y))?;
        Ok(union.last().map_or(true, |round| round.trees().iter().all(|t|
            2 * t.members.iter().filter(|&&v| v < x.len()).count() == t.members.len())))
    }
}

/// Result of color refinement: the canonically sorted classes of every round.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Refinement {
    rounds: Vec<Round>,
    stable: bool,
}

impl Refinement {
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn round(&self, round: usize) -> &Round {
        &self.rounds[round]
    }

    pub fn last(&self) -> Option<&Round> {
        self.rounds.last()
    }

    /// Number of rounds.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// False if refinement was cut short by `max_rounds`.
    pub fn is_stable(&self) -> bool {
        self.stable
    }

    /// Rank of the vertex's class in the given round.
    pub fn color(&self, round: usize, v: VertexId) -> usize {
        self.rounds[round].color(v)
    }

    pub fn num_classes(&self) -> Vec<usize> {
        self.rounds.iter().map(Round::len).collect()
    }

    pub fn ordering(&self) -> TreeOrdering<'_> {
        TreeOrdering::new(&self.rounds)
    }

    /// The unfolded canonical tree of the class with the given rank.
    pub fn tree(&self, round: usize, rank: usize) -> TreeDisplay<'_> {
        TreeDisplay::new(&self.rounds, round, rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::random_graph;
    use std::cmp::Ordering;

    fn refine(graph: &Graph) -> Refinement {
        ColorRefinement::default().run(graph).unwrap()
    }

    fn members(round: &Round) -> Vec<Vec<VertexId>> {
        round.trees().iter().map(|t| t.members.clone()).collect()
    }

    #[test]
    fn empty_graph() {
        let r = refine(&Graph::empty(0));
        assert!(r.is_empty());
        assert!(r.is_stable());
    }

    #[test]
    fn edgeless_graph() {
        let r = refine(&Graph::empty(5));
        assert_eq!(r.len(), 1);
        let tree = &r.round(0).trees()[0];
        assert_eq!((tree.rank, tree.size), (0, 1));
        assert_eq!(tree.members, (0..5).collect_vec());
        assert_eq!(r.round(0).colors(), &[0; 5]);
    }

    #[test]
    fn complete_graphs_are_stable_after_round_0() {
        for n in 1..9 {
            let r = refine(&Graph::complete(n));
            assert_eq!(r.num_classes(), vec![1], "K_{n}");
        }
    }

    #[test]
    fn path_of_4() {
        let r = refine(&Graph::path(4));
        assert_eq!(r.num_classes(), vec![1, 2]);
        assert_eq!(members(r.round(0)), vec![vec![0, 1, 2, 3]]);
        assert_eq!(members(r.round(1)), vec![vec![0, 3], vec![1, 2]]);
        assert_eq!(r.round(1).colors(), &[0, 1, 1, 0]);
        assert_eq!(r.round(1).trees().iter().map(|t| t.size).collect_vec(), vec![2, 3]);
        assert_eq!(r.tree(1, 0).to_string(), "(())");
        assert_eq!(r.tree(1, 1).to_string(), "(()())");
    }

    #[test]
    fn path_of_5() {
        let r = refine(&Graph::path(5));
        assert_eq!(r.num_classes(), vec![1, 2, 3]);
        assert_eq!(members(r.round(2)), vec![vec![0, 4], vec![1, 3], vec![2]]);
        assert_eq!(r.round(2).colors(), &[0, 1, 2, 1, 0]);
        assert_eq!(r.round(2).trees().iter().map(|t| t.size).collect_vec(), vec![4, 6, 7]);
        assert_eq!(r.tree(2, 1).to_string(), "((())(()()))");
        assert_eq!(r.color(1, 2), 1);
    }

    #[test]
    fn isolated_vertices_rank_first() {
        // Star with center 0 and leaves 1, 2, plus the isolated vertex 3.
        let r = refine(&Graph::new(4, [(0, 1), (0, 2)]));
        assert_eq!(members(r.round(1)), vec![vec![3], vec![1, 2], vec![0]]);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn max_rounds() {
        let r = ColorRefinement::new(Some(1)).run(&Graph::path(5)).unwrap();
        assert_eq!(r.num_classes(), vec![1]);
        assert!(!r.is_stable());
        assert!(ColorRefinement::new(Some(0)).run(&Graph::path(5)).unwrap().is_empty());
        assert!(ColorRefinement::new(Some(3)).run(&Graph::path(5)).unwrap().len() == 3);
    }

    #[test]
    fn invariants_on_random_graphs() {
        for (n, m) in [(1, 0), (8, 7), (20, 20), (50, 35), (60, 200), (30, 435)] {
            for seed in 0..5 {
                let graph = random_graph(n, m, Some(format!("{n}-{m}-{seed}").as_str())).unwrap();
                let r = refine(&graph);
                verify(&graph, &r);
            }
        }
    }

    fn verify(graph: &Graph, r: &Refinement) {
        assert!(r.is_stable());
        assert!(r.len() <= graph.len());
        assert!(r.num_classes().iter().tuple_windows().all(|(a, b)| a < b), "{:?}", r.num_classes());
        if !graph.is_empty() {
            assert_eq!(r.round(0).len(), 1);
        }

        let ordering = r.ordering();
        for (i, round) in r.rounds().iter().enumerate() {
            let trees = round.trees();
            assert_eq!(trees.iter().map(|t| t.members.len()).sum::<usize>(), graph.len());
            for (rank, t) in trees.iter().enumerate() {
                assert_eq!((t.rank, t.round), (rank, i));
                assert!(t.members.iter().all(|&v| round.color(v) == rank));
                assert!(t.members.iter().tuple_windows().all(|(a, b)| a < b));
                if i > 0 {
                    let prev = r.round(i - 1);
                    assert_eq!(t.size, 1 + t.children.iter().map(|&c| prev.tree(c).size).sum::<usize>());
                    assert!(t.children.iter().tuple_windows().all(|(a, b)| a <= b));
                    let v = t.members[0];
                    assert_eq!(t.children, graph.neighbors(v).iter().map(|&u| prev.color(u)).sorted().collect_vec());
                }
            }
            for (a, b) in (0..trees.len()).tuple_combinations() {
                assert_eq!(ordering.compare_ids(i, a, b), Ok(Ordering::Less));
                assert_eq!(ordering.compare_ids(i, b, a), Ok(Ordering::Greater));
            }
            let mut children = trees.iter().map(|t| t.children.clone()).collect_vec();
            children.sort();
            assert!(children.iter().tuple_windows().all(|(a, b)| a != b), "Round {i} has duplicate classes.");
        }
    }

    #[test]
    fn isomorphism_test() {
        let cr = ColorRefinement::default();
        let star = Graph::new(4, [(0, 1), (0, 2), (0, 3)]);
        assert!(!cr.maybe_isomorphic(&Graph::path(4), &star).unwrap());
        assert!(!cr.maybe_isomorphic(&Graph::path(4), &Graph::path(5)).unwrap());
        assert!(cr.maybe_isomorphic(&Graph::empty(0), &Graph::empty(0)).unwrap());

        let relabelled = Graph::new(4, [(2, 0), (0, 3), (3, 1)]);
        assert!(cr.maybe_isomorphic(&Graph::path(4), &relabelled).unwrap());

        let triangles = Graph::cycle(3).disjoint_union(&Graph::cycle(3));
        assert!(cr.maybe_isomorphic(&Graph::cycle(6), &triangles).unwrap());

        let g = random_graph(30, 45, Some("iso")).unwrap();
        let shifted = Graph::new(30, g.edges().iter().map(|&(i, j)| ((i + 7) % 30, (j + 7) % 30)));
        assert!(cr.maybe_isomorphic(&g, &shifted).unwrap());
    }
}
