//! Uniformly random graphs with a fixed number of vertices and edges, G(n, m).
use crate::error::{Error, Result};
use crate::graph::{EdgeIndex, Graph};
use crate::FHashMap;
use log::trace;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Portable, so seeded graphs are the same on every platform.
type GraphRng = Pcg64Mcg;

const SEED_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SEED_LEN: usize = 5;

/// Number of unordered vertex pairs without self-loops.
pub fn max_edges(num_vertices: usize) -> u64 {
    let n = num_vertices as u128;
    (n * n.saturating_sub(1) / 2).min(u64::MAX as u128) as u64
}

/// Samples a graph with `n` vertices and `m` edges, uniformly among all such graphs.
/// The same seed always gives the same edge list. Without a seed, system entropy is used.
pub fn random_graph(n: i64, m: i64, seed: Option<&str>) -> Result<Graph> {
    let max = usize::try_from(n).map(max_edges).unwrap_or(0);
    let invalid = || Error::InvalidParameter { n, m, max_edges: max };
    let len = usize::try_from(n).map_err(|_| invalid())?;
    let num_edges = usize::try_from(m).map_err(|_| invalid())?;
    if num_edges as u64 > max {
        return Err(invalid());
    }

    let mut rng = match seed {
        Some(seed) => GraphRng::seed_from_u64(fxhash::hash64(seed)),
        None => GraphRng::from_entropy(),
    };
    let mut graph = Graph::empty(len);
    for k in SparseShuffle::new(max).sample(num_edges, &mut rng) {
        graph.insert_edge(pair_edge(len, k));
    }
    trace!("Sampled G({len}, {num_edges}) with seed {seed:?}: {graph}");
    Ok(graph)
}

/// Fresh short seed of base-36 digits, to be shown to the user so a sampled graph can be
/// reproduced later.
pub fn random_seed() -> String {
    let mut rng = rand::thread_rng();
    (0..SEED_LEN).map(|_| SEED_ALPHABET[rng.gen_range(0..SEED_ALPHABET.len())] as char).collect()
}

/// Maps the k-th pair (x, y) of the unpairing order to the edge (x, n - 1 - y).
/// For k < max_edges(n), x + y <= n - 2, so the endpoints differ and x < n - 1 - y.
pub fn pair_edge(num_vertices: usize, k: u64) -> EdgeIndex {
    let (x, y) = unpair(k);
    debug_assert!(x + y + 2 <= num_vertices as u64, "Edge index {k} out of range.");
    (x as usize, num_vertices - 1 - y as usize)
}

/// Cantor's unpairing function. Returns the k-th non-negative integer pair (x, y)
/// in the sequence (0, 0), (0, 1), (1, 0), (0, 2), (1, 1), (2, 0), (0, 3), ...
pub fn unpair(k: u64) -> (u64, u64) {
    let k = k as u128;
    let z = (isqrt(8 * k + 1) - 1) / 2;
    ((k - z * (z + 1) / 2) as u64, (z * (z + 3) / 2 - k) as u64)
}

/// Floor of the square root, exact for all inputs.
fn isqrt(x: u128) -> u128 {
    let mut r = (x as f64).sqrt() as u128;
    while r * r > x {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= x {
        r += 1;
    }
    r
}

/// Partial Fisher-Yates shuffle of 0..len that only stores displaced positions.
/// Drawing m elements takes O(m) space and expected time, independent of len.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SparseShuffle {
    len: u64,
    displaced: FHashMap<u64, u64>,
}

impl SparseShuffle {
    pub fn new(len: u64) -> Self {
        Self { len, displaced: FHashMap::default() }
    }

    fn get(&self, i: u64) -> u64 {
        self.displaced.get(&i).copied().unwrap_or(i)
    }

    fn swap(&mut self, i: u64, j: u64) {
        let (xi, xj) = (self.get(i), self.get(j));
        self.displaced.insert(i, xj);
        self.displaced.insert(j, xi);
    }

    /// Draws `num` distinct elements of 0..len, uniformly without replacement, in the order drawn.
    pub fn sample(mut self, num: usize, rng: &mut impl Rng) -> Vec<u64> {
        assert!(num as u64 <= self.len, "Cannot draw {num} distinct elements out of {}.", self.len);
        (0..num as u64).map(|i| {
            let j = rng.gen_range(i..self.len);
            self.swap(i, j);
            self.get(i)
        }).collect()
    }
}
