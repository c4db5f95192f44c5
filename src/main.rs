use clap::Parser;
use svd_recommender::prelude::*;

use crate::cli::Opts;

mod cli;
mod logging;

fn main() -> Result {
    let opts = Opts::parse();
    let _sentry_guard = logging::init(opts.sentry_dsn.clone(), opts.traces_sample_rate)?;
    cli::run(opts)
}
