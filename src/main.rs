//! # tidyplate
//!
//! A command-line tool for turning BioTek plate-reader exports into tidy
//! tables and running series transforms over them.
//!
//! ## Usage
//!
//! ```bash
//! # Convert an export, joining a plate map and assuming 20 uL reactions
//! tidyplate convert export.csv --volume 20 --supplementary plate_map.csv
//!
//! # Blank against H12, then normalize by OD600
//! tidyplate background export_tidy.csv -w H12
//! tidyplate normalize export_tidy_background.csv
//!
//! # Average the last 10 time points of every series
//! tidyplate endpoint export_tidy.csv
//! ```

mod cli;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
