use clap::Parser;
use color_refinement::cli::{Config, Session};
use env_logger::{Env, Target};
use log::error;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).target(Target::Stderr).init();
    if let Err(e) = (Session { config: Config::parse() }).timed_run() {
        error!("{e}");
        std::process::exit(1);
    }
}
