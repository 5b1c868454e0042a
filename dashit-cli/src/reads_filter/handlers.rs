use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;
use tracing::info;

use dashit_filter::sites_file::{read_candidate_guides, write_filtered};
use dashit_filter::{DashitConfig, OfftargetCheck, Radius, StructureParams, exclude_guides};

use crate::offtarget::OfftargetSession;

///
/// Apply the structural filter flags on top of the configured thresholds.
///
pub fn structure_params_from_matches(
    matches: &ArgMatches,
    base: StructureParams,
) -> StructureParams {
    let flag = |name: &str, default: usize| matches.get_one::<usize>(name).copied().unwrap_or(default);

    StructureParams {
        gc_min: flag("gc_freq_min", base.gc_min),
        gc_max: flag("gc_freq_max", base.gc_max),
        homopolymer_max: flag("homopolymer", base.homopolymer_max),
        dinucleotide_repeat_max: flag("dinucleotide_repeats", base.dinucleotide_repeat_max),
        hairpin_min_inner: flag("hairpin_min_inner", base.hairpin_min_inner),
        hairpin_min_outer: flag("hairpin_min_outer", base.hairpin_min_outer),
    }
}

pub fn run_reads_filter(matches: &ArgMatches, mut config: DashitConfig) -> Result<()> {
    let input = matches
        .get_one::<String>("input")
        .expect("A sites-to-reads file is required.");
    let input = Path::new(input);
    let explanation = matches.get_one::<String>("filtered_explanation").map(PathBuf::from);
    let offtarget_file = matches.get_one::<String>("offtarget").map(PathBuf::from);
    let radius = matches
        .get_one::<String>("offtarget_radius")
        .expect("The off-target radius has a default.");
    let radius = Radius::from_str(radius).with_context(|| format!("parsing radius {}", radius))?;

    config.structure = structure_params_from_matches(matches, config.structure);
    config.validate().context("validating settings")?;

    let session = match &offtarget_file {
        Some(sites_file) => Some(OfftargetSession::start(sites_file, &config.offtarget)?),
        None => {
            info!("Off-target file not specified with --offtarget, will not perform any off-target filtering");
            None
        }
    };

    let (_, candidates) = read_candidate_guides(input)
        .with_context(|| format!("reading sites-to-reads file {}", input.display()))?;
    let num_candidates = candidates.len();

    let source = offtarget_file
        .as_ref()
        .map(|f| f.display().to_string())
        .unwrap_or_default();
    let radii = [radius];
    let check = session.as_ref().map(|s| OfftargetCheck {
        matcher: &s.client,
        radii: &radii,
        source: &source,
    });

    let reasons = exclude_guides(
        candidates.iter().map(String::as_str),
        &config.structure,
        check.as_ref(),
    )
    .context("filtering candidate guides")?;

    if let Some(session) = session {
        session.shutdown()?;
    }

    info!(
        "Done filtering, removed {} out of {} guides",
        reasons.len(),
        num_candidates
    );

    let stdout = std::io::stdout().lock();
    let kept = write_filtered(input, &reasons, stdout).context("writing filtered sites")?;
    info!("Kept {} sites", kept);

    if let Some(path) = explanation {
        reasons
            .write_explanation_file(&path)
            .with_context(|| format!("writing filter explanation to {}", path.display()))?;
        info!("Wrote filter explanation to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::reads_filter::cli::create_reads_filter_cli;

    #[rstest]
    fn test_structure_flags_override_config() {
        let matches = create_reads_filter_cli()
            .try_get_matches_from(["reads-filter", "sites.txt", "--gc_freq_min", "7", "--homopolymer", "4"])
            .unwrap();
        let base = StructureParams {
            gc_max: 14,
            ..StructureParams::default()
        };

        let params = structure_params_from_matches(&matches, base);
        assert_eq!(params.gc_min, 7);
        assert_eq!(params.gc_max, 14);
        assert_eq!(params.homopolymer_max, 4);
        assert_eq!(params.hairpin_min_outer, 5);
    }

    #[rstest]
    fn test_default_radius() {
        let matches = create_reads_filter_cli()
            .try_get_matches_from(["reads-filter", "sites.txt"])
            .unwrap();
        let radius = matches.get_one::<String>("offtarget_radius").unwrap();
        assert_eq!(Radius::from_str(radius).unwrap(), Radius::READS);
    }
}
