mod offtarget;
mod reads_filter;
mod reads_optimize;
mod score;
mod seq;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use dashit_filter::DashitConfig;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "dashit";
    pub const BIN_NAME: &str = "dashit";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("Design CRISPR guide libraries that cut target sequences at a chosen density while avoiding off-targets.")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug messages. RUST_LOG takes precedence."),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("TOML file with [structure], [offtarget] and [design] settings"),
        )
        .subcommand(seq::cli::create_seq_cli())
        .subcommand(reads_filter::cli::create_reads_filter_cli())
        .subcommand(reads_optimize::cli::create_reads_optimize_cli())
        .subcommand(score::cli::create_score_cli())
}

///
/// Log to stderr so stdout stays a clean report.
///
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<DashitConfig> {
    match matches.get_one::<String>("config") {
        Some(path) => DashitConfig::try_from(Path::new(path))
            .with_context(|| format!("loading config from {}", path)),
        None => Ok(DashitConfig::default()),
    }
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    init_logging(matches.get_flag("verbose"));
    let config = load_config(&matches)?;

    match matches.subcommand() {
        //
        // GUIDE DESIGN OVER A SEQUENCE
        //
        Some((seq::cli::SEQ_CMD, matches)) => {
            seq::handlers::run_seq(matches, config)?;
        }

        //
        // SITES-TO-READS FILTERING
        //
        Some((reads_filter::cli::READS_FILTER_CMD, matches)) => {
            reads_filter::handlers::run_reads_filter(matches, config)?;
        }

        //
        // GREEDY READ COVER
        //
        Some((reads_optimize::cli::READS_OPTIMIZE_CMD, matches)) => {
            reads_optimize::handlers::run_reads_optimize(matches)?;
        }

        //
        // SCORING
        //
        Some((score::cli::SCORE_CMD, matches)) => {
            score::handlers::run_score(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_parser_is_consistent() {
        build_parser().debug_assert();
    }

    #[rstest]
    fn test_global_args_reach_subcommands() {
        let matches = build_parser()
            .try_get_matches_from(["dashit", "score", "guides.csv", "reads.fasta", "--verbose"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
        assert_eq!(matches.get_one::<String>("config"), None);
    }

    #[rstest]
    fn test_missing_config_file_is_an_error() {
        let matches = build_parser()
            .try_get_matches_from([
                "dashit",
                "--config",
                "/nonexistent/dashit.toml",
                "score",
                "guides.csv",
                "reads.fasta",
            ])
            .unwrap();
        assert!(load_config(&matches).is_err());
    }
}
