//! CLI entry point: parses options, installs a `tracing-subscriber`
//! filter built from the spec §6 log-category mask, drives the
//! orchestrator, and maps its outcome onto the process exit code (spec
//! §6 "Exit codes: 0 normal; nonzero only on fatal errors").

use clap::Parser;
use demiurge_rs::backend;
use demiurge_rs::cli::{env_filter_from_mask, Options};

fn main() {
    let opts = Options::parse();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter_from_mask(&opts.log_mask))
        .with_target(true)
        .compact()
        .init();

    match backend::orchestrate(&opts) {
        Ok(_realizable) => {
            // Exit code 0 regardless of realizability; the result itself
            // was already emitted on the `result` log target.
        }
        Err(e) => {
            tracing::error!(target: "err", "{e}");
            std::process::exit(1);
        }
    }
}
