use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::ArgMatches;
use tracing::info;

use dashit_optimize::score::{GuideScorer, ScoreReport, SplitWriters, read_guides_csv};

pub fn run_score(matches: &ArgMatches) -> Result<()> {
    let guides_file = matches
        .get_one::<String>("guides")
        .expect("A guides CSV is required.");
    let reads_file = matches
        .get_one::<String>("reads")
        .expect("A reads FASTA is required.");
    let outdir = matches
        .get_one::<String>("outdir")
        .map_or(".", String::as_str);

    let guides = read_guides_csv(Path::new(guides_file))
        .with_context(|| format!("reading guides from {}", guides_file))?;
    let scorer = GuideScorer::new(&guides).context("building guide matcher")?;

    let mut split = if matches.get_flag("split") {
        Some(
            SplitWriters::create(Path::new(reads_file), Path::new(outdir))
                .context("creating split reads files")?,
        )
    } else {
        None
    };

    let started = Instant::now();
    let hits = scorer
        .score_file(Path::new(reads_file), split.as_mut())
        .with_context(|| format!("scoring reads in {}", reads_file))?;
    info!("Parsing FASTA took {:?}", started.elapsed());

    let report = ScoreReport {
        num_guides: scorer.num_guides(),
        guides_file: guides_file.to_string(),
        reads_file: reads_file.to_string(),
        hits,
    };
    println!("{}", report);

    if let Some(split) = split {
        info!("Wrote {}", split.dashed_path.display());
        info!("Wrote {}", split.undashed_path.display());
    }
    info!("Total is: {}", hits.total());

    Ok(())
}
