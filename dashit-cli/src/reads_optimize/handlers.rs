use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use dashit_filter::sites_file::read_site_records;
use dashit_optimize::reads::{
    attach_representative_reads, cover_reads_greedy, summarize_picks, write_report,
};

pub fn run_reads_optimize(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<String>("input")
        .expect("A sites-to-reads file is required.");
    let num_sites = *matches
        .get_one::<usize>("num_sites")
        .expect("The number of sites is required.");
    let coverage = *matches
        .get_one::<usize>("coverage")
        .expect("The coverage target is required.");
    let input = Path::new(input);

    info!(
        "Choosing the {} sites from {} that will cover the most reads...",
        num_sites,
        input.display()
    );

    let (header, records) = read_site_records(input)
        .with_context(|| format!("reading sites-to-reads file {}", input.display()))?;

    let picks = cover_reads_greedy(&records, num_sites, coverage);
    let mut rows = summarize_picks(&records, &picks);

    if let Some(reads) = matches.get_one::<String>("reads") {
        let mut rng = match matches.get_one::<u64>("seed") {
            Some(seed) => StdRng::seed_from_u64(*seed),
            None => StdRng::from_os_rng(),
        };
        attach_representative_reads(&mut rows, &records, Path::new(reads), &mut rng)
            .with_context(|| format!("collecting representative reads from {}", reads))?;
    }

    let stdout = std::io::stdout().lock();
    write_report(&rows, stdout).context("writing chosen sites")?;

    let covered = rows.last().map_or(0, |r| r.cumulative_reads);
    match header {
        Some(header) => info!(
            "{} sites covered {} reads, # reads: {}",
            rows.len(),
            covered,
            header.total_reads
        ),
        None => info!("{} sites covered {} reads", rows.len(), covered),
    }

    Ok(())
}
