//! # trap-sort CLI
//!
//! Command-line interface for the camera-trap sorter.
//!
//! ## Usage
//! ```bash
//! trap-sort scan ~/traps/2019 --window 10
//! trap-sort labeled ~/training --class Cheetah --class Leopard --output json
//! ```

mod cli;

use trap_sorter::Result;

fn main() -> Result<()> {
    // A subscriber may already be installed by an embedding host
    let _ = trap_sorter::init_tracing();
    cli::run()
}
