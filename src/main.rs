//! diffexpr command-line interface

use anyhow::Context;
use clap::{CommandFactory, Parser};
use log::{debug, info, LevelFilter};

use single_diffexpr::cli::Cli;
use single_diffexpr::pipeline;

fn main() {
    // No arguments at all: show usage and succeed
    if std::env::args_os().len() < 2 {
        if let Err(e) = Cli::command().print_help() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        println!();
        return;
    }

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .parse_default_env()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.into_config().context("invalid arguments")?;
    let output = config.output_path();

    let results = pipeline::run(&config).with_context(|| {
        format!(
            "differential expression of {} vs {} failed",
            config.first_input.display(),
            config.second_input.display()
        )
    })?;

    info!(
        "Done: {} genes, {} significant, results in {}",
        results.len(),
        results.num_significant(),
        output.display()
    );
    if results.num_significant() > 0 {
        debug!("Significant genes: {}", results.significant_genes().join(", "));
    }
    Ok(())
}
