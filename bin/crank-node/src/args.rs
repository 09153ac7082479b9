//! Parses command-line arguments for the crank node.

use std::path::PathBuf;

use clap::{crate_version, Parser};

#[derive(Debug, Parser)]
#[clap(
    name = "crank-node",
    about = "The epoch crank operator for the liquid-staking protocol",
    version = crate_version!()
)]
pub(crate) struct Cli {
    #[clap(
        long,
        short = 'c',
        help = "The file containing the configuration for the crank node",
        default_value = "config.toml"
    )]
    pub config: PathBuf,
}
