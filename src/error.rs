use thiserror::Error;

/// Errors raised while sampling graphs or refining them.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// Graph parameters outside `0 <= n`, `0 <= m <= n(n-1)/2`.
    #[error("Invalid graph parameters n={n}, m={m}: expected n >= 0 and 0 <= m <= {max_edges}.")]
    InvalidParameter { n: i64, m: i64, max_edges: u64 },

    /// Two distinct canonical trees of the same round compared equal,
    /// meaning an earlier round failed to merge equal classes.
    #[error("Distinct canonical trees {first} and {second} of round {round} compare equal.")]
    InternalConsistency { round: usize, first: usize, second: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
