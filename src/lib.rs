pub mod error;
pub mod graph;
pub mod refinement;

pub use error::{Error, Result};
pub use graph::*;
pub use refinement::*;

use fxhash::FxBuildHasher;
use std::collections::{HashMap, HashSet};

pub(crate) type FBuildHasher = FxBuildHasher;
pub(crate) type FHashMap<K, V> = HashMap<K, V, FBuildHasher>;
pub(crate) type FHashSet<K> = HashSet<K, FBuildHasher>;

#[cfg(any(test, feature = "cli"))]
pub mod cli;
