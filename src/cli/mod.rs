use crate::error::Result;
use crate::graph::{random_graph, random_seed, Graph};
use crate::refinement::{ColorRefinement, Refinement};
use clap::Parser;
use itertools::Itertools;
use log::{info, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::io::{stdout, Write};
use timeit::timeit_loops;

macro_rules! print_flush {
    ( $($t:tt)* ) => {
        {
            print!($($t)*);
            stdout().flush().ok();
        }
    }
}

/// Samples a random graph G(n, m) and prints its color refinement: the classes of every round,
/// their canonical trees and the color of every vertex.
#[derive(Clone, Debug, Parser, PartialEq)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Number of vertices.
    #[arg(short = 'n', long = "vertices", default_value_t = 50, allow_negative_numbers = true)]
    pub n: i64,

    /// Number of edges, at most n(n-1)/2.
    #[arg(short = 'm', long = "edges", default_value_t = 35, allow_negative_numbers = true)]
    pub m: i64,

    /// Seed for sampling the graph. By default, a fresh seed is drawn and reported,
    /// so that the graph can be reproduced.
    #[arg(short, long)]
    pub seed: Option<String>,

    /// Round to show in detail. Clamped to the last round.
    #[arg(short, long, default_value_t = 0)]
    pub round: usize,

    /// Show the number of vertices of each class.
    #[arg(short, long)]
    pub count: bool,

    /// Do not show canonical trees. They grow quickly with the number of rounds.
    #[arg(long)]
    pub notrees: bool,

    /// Stop refinement after this many rounds even if the partition is not stable.
    #[arg(long)]
    pub max_rounds: Option<usize>,

    /// Instead of showing one graph, refine this many graphs with seeds '<seed>-0', '<seed>-1', ...
    /// in parallel and report statistics on the number of rounds.
    #[arg(long)]
    pub samples: Option<usize>,

    /// Number of threads to use for parallelism. By default, the number of logical CPUs is used.
    #[arg(short, long)]
    pub threads: Option<usize>,
}

impl Config {
    pub fn color_refinement(&self) -> ColorRefinement {
        ColorRefinement::new(self.max_rounds)
    }
}

pub struct Session {
    pub config: Config,
}

impl Session {
    pub fn timed_run(&self) -> Result<()> {
        let mut result = Ok(());
        let time = timeit_loops!(1, { result = self.run(); });
        println!("Finished in {time:.3}s.");
        result
    }

    pub fn run(&self) -> Result<()> {
        if let Some(threads) = self.config.threads {
            if let Err(e) = ThreadPoolBuilder::new().num_threads(threads).build_global() {
                warn!("Could not use {threads} threads: {e}");
            }
        }
        let seed = self.config.seed.clone().unwrap_or_else(random_seed);
        info!("Using seed '{seed}'.");

        match self.config.samples {
            None => print_flush!("{}", self.single(&seed)?),
            Some(samples) => print_flush!("{}", self.sampled(&seed, samples)?),
        }
        Ok(())
    }

    fn single(&self, seed: &str) -> Result<String> {
        let graph = random_graph(self.config.n, self.config.m, Some(seed))?;
        let refinement = self.config.color_refinement().run(&graph)?;
        Ok(Report { config: &self.config, seed, graph: &graph, refinement: &refinement }.to_string())
    }

    fn sampled(&self, seed: &str, samples: usize) -> Result<String> {
        let cr = self.config.color_refinement();
        let results = (0..samples).into_par_iter().map(|i| -> Result<(usize, usize)> {
            let graph = random_graph(self.config.n, self.config.m, Some(&format!("{seed}-{i}")))?;
            let refinement = cr.run(&graph)?;
            Ok((refinement.len(), refinement.last().map_or(0, |r| r.len())))
        }).collect::<Result<Vec<_>>>()?;
        Ok(SampleStats { seed, n: self.config.n, m: self.config.m, results }.to_string())
    }
}

/// Human-readable refinement of a single graph, showing one round in detail.
pub struct Report<'a> {
    pub config: &'a Config,
    pub seed: &'a str,
    pub graph: &'a Graph,
    pub refinement: &'a Refinement,
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self { config, seed, graph, refinement } = self;
        writeln!(f, "{graph}")?;
        writeln!(f, "seed: {seed}")?;
        writeln!(f, "classes per round: {}", refinement.num_classes().iter().join(" "))?;
        if !refinement.is_stable() {
            writeln!(f, "stopped after {} rounds, partition not stable", refinement.len())?;
        }
        let Some(last) = refinement.len().checked_sub(1) else { return Ok(()) };

        let round = config.round.min(last);
        writeln!(f, "round {round}/{last}:")?;
        for tree in refinement.round(round).trees() {
            write!(f, "  color {}: size {}", tree.rank, tree.size)?;
            if config.count {
                write!(f, ", {} vertices", tree.members.len())?;
            }
            write!(f, ", members [{}]", tree.members.iter().join(", "))?;
            if !config.notrees {
                write!(f, ", tree {}", refinement.tree(round, tree.rank))?;
            }
            writeln!(f)?;
        }
        writeln!(f, "vertex colors: {}", refinement.round(round).colors().iter().join(" "))
    }
}

/// Number of rounds and final classes over many sampled graphs.
pub struct SampleStats<'a> {
    pub seed: &'a str,
    pub n: i64,
    pub m: i64,
    /// Rounds and number of classes in the last round, per sample.
    pub results: Vec<(usize, usize)>,
}

impl Display for SampleStats<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self { seed, n, m, results } = self;
        writeln!(f, "G(n={n}, m={m}), {} samples, seeds {seed}-*", results.len())?;
        if results.is_empty() {
            return Ok(());
        }
        let len = results.len() as f64;
        let mean_rounds = results.iter().map(|(r, _)| r).sum::<usize>() as f64 / len;
        let mean_classes = results.iter().map(|(_, c)| c).sum::<usize>() as f64 / len;
        writeln!(f, "mean rounds: {mean_rounds:.2}, mean classes: {mean_classes:.2}")?;
        for (rounds, count) in results.iter().map(|(r, _)| r).counts().into_iter().sorted() {
            writeln!(f, "  {rounds} rounds: {count}")?;
        }
        Ok(())
    }
}
