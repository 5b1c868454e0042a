use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeDelta};
use clap::ArgMatches;
use serde::Serialize;
use tracing::{info, warn};

use dashit_core::models::{Gene, GeneStats};
use dashit_core::utils::read_single_sequence;
use dashit_filter::{DashitConfig, OfftargetCheck, Radius, exclude_guides};
use dashit_optimize::{GuideDesign, GuideOptimizer};

use crate::consts::{BIN_NAME, VERSION};
use crate::offtarget::OfftargetSession;

pub const NOT_SPECIFIED: &str = "Not specified";
pub const EXCLUDED_HEADER: [&str; 2] = ["CRISPR site", "why it was excluded"];

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExcludedGuide {
    pub guide: String,
    pub reason: String,
}

///
/// Everything `dashit seq` reports about a run.
///
#[derive(Serialize, Debug, Clone)]
pub struct DesignReport {
    pub tool: String,
    pub version: String,
    pub host: String,
    pub input: String,
    pub offtarget: Option<String>,
    pub run_start: DateTime<Local>,
    pub run_end: DateTime<Local>,
    pub run_duration: String,
    pub status: String,
    pub optimal: bool,
    pub guides: Vec<String>,
    pub excluded: Vec<ExcludedGuide>,
    pub stats: Option<GeneStats>,
}

/// Name of the machine we run on, "unknown" when it can't be found.
pub fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// `H:MM:SS.ffffff`
pub fn format_duration(delta: TimeDelta) -> String {
    let micros = delta.num_microseconds().unwrap_or(i64::MAX).max(0);
    let secs = micros / 1_000_000;
    format!(
        "{}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        micros % 1_000_000
    )
}

fn absolute(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

pub fn write_text_report<W: Write>(report: &DesignReport, mut out: W) -> std::io::Result<()> {
    writeln!(out, "{} {}", report.tool, report.version)?;
    writeln!(out, "Running on, {}", report.host)?;
    writeln!(out, "Input sequence, {}", report.input)?;
    writeln!(
        out,
        "Off-target file, {}",
        report.offtarget.as_deref().unwrap_or(NOT_SPECIFIED)
    )?;
    writeln!(out, "Run start, {}", report.run_start)?;
    writeln!(out, "Run end, {}", report.run_end)?;
    writeln!(out, "Run duration, {}", report.run_duration)?;

    if report.optimal {
        writeln!(out, "Solution is OPTIMAL")?;
    } else {
        writeln!(out, "Solution may be SUB-OPTIMAL")?;
    }

    writeln!(out, "Designed CRISPR guides")?;
    for guide in report.guides.iter() {
        writeln!(out, "{}", guide)?;
    }

    writeln!(out, "\n\nCRISPR guides that were removed from consideration")?;
    {
        let mut table = csv::Writer::from_writer(&mut out);
        table.write_record(EXCLUDED_HEADER)?;
        for excluded in report.excluded.iter() {
            table.write_record([excluded.guide.as_str(), excluded.reason.as_str()])?;
        }
        table.flush()?;
    }

    out.flush()
}

fn radii_from_matches(matches: &ArgMatches, config: &DashitConfig) -> Result<Vec<Radius>> {
    match matches.get_many::<String>("offtarget_radius") {
        Some(values) => values
            .map(|r| Radius::from_str(r).with_context(|| format!("parsing radius {}", r)))
            .collect(),
        None => Ok(config.offtarget.radii.clone()),
    }
}

pub fn run_seq(matches: &ArgMatches, mut config: DashitConfig) -> Result<()> {
    let run_start = Local::now();

    let input = matches
        .get_one::<String>("input")
        .expect("An input FASTA file is required.");
    let input = PathBuf::from(input);
    let offtarget_file = matches.get_one::<String>("offtarget").map(PathBuf::from);
    let json = matches.get_flag("json");

    if let Some(min_spacing) = matches.get_one::<usize>("min_spacing") {
        config.design.min_spacing = *min_spacing;
    }
    if let Some(max_spacing) = matches.get_one::<usize>("max_spacing") {
        config.design.max_spacing = *max_spacing;
    }
    let radii = radii_from_matches(matches, &config)?;
    config.validate().context("validating settings")?;

    let sequence = read_single_sequence(&input)
        .with_context(|| format!("reading input FASTA {}", input.display()))?;
    let mut gene = Gene::from_sequence(sequence).context("reading gene metadata")?;
    let num_targets = gene.find_targets().len();
    info!("Found {} candidate sites in {}", num_targets, gene.name);

    let targets = gene.targets.clone().unwrap_or_default();
    let guides = targets.iter().map(|t| t.guide.as_str());

    let excluded = match &offtarget_file {
        Some(sites_file) => {
            info!(
                "Filtering off-target CRISPR sites with radii {}",
                radii.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
            );
            let session = OfftargetSession::start(sites_file, &config.offtarget)?;
            let source = sites_file.display().to_string();
            let check = OfftargetCheck {
                matcher: &session.client,
                radii: &radii,
                source: &source,
            };
            let excluded = exclude_guides(guides, &config.structure, Some(&check))
                .context("off-target filtering")?;
            session.shutdown()?;
            excluded
        }
        None => {
            info!("Off-target file not specified with --offtarget, skipping off-target filtering");
            exclude_guides(guides, &config.structure, None).context("structural filtering")?
        }
    };

    let optimizer = GuideOptimizer::new(config.design);
    let design: GuideDesign = optimizer
        .optimize(&[targets.as_slice()], &excluded)
        .context("guide optimization")?;

    if !design.is_optimal() {
        warn!("Solution may be sub-optimal");
    }

    let library: HashSet<String> = design.guides.iter().cloned().collect();
    gene.cut_with_library(&library);
    let stats = gene.stats().ok();
    if let Some(stats) = &stats {
        info!(
            "{} cuts, {} ideal and {} okay fragments",
            stats.cuts, stats.ideal_fragments, stats.okay_fragments
        );
    }

    let run_end = Local::now();
    let report = DesignReport {
        tool: format!("{} seq", BIN_NAME),
        version: VERSION.to_string(),
        host: hostname(),
        input: absolute(&input),
        offtarget: offtarget_file.as_deref().map(absolute),
        run_start,
        run_end,
        run_duration: format_duration(run_end - run_start),
        status: design.status.to_string(),
        optimal: design.is_optimal(),
        guides: design.guides,
        excluded: excluded
            .iter()
            .map(|(guide, reason)| ExcludedGuide {
                guide: guide.to_string(),
                reason,
            })
            .collect(),
        stats,
    };

    let stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(stdout, &report).context("writing JSON report")?;
        println!();
    } else {
        write_text_report(&report, stdout).context("writing report")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn report() -> DesignReport {
        let start = Local::now();
        DesignReport {
            tool: "dashit seq".to_string(),
            version: "0.1.0".to_string(),
            host: "node1".to_string(),
            input: "/data/input.fasta".to_string(),
            offtarget: None,
            run_start: start,
            run_end: start,
            run_duration: format_duration(TimeDelta::zero()),
            status: "OPTIMAL".to_string(),
            optimal: true,
            guides: vec!["GACTTCGAATGGCATCCTGA".to_string()],
            excluded: vec![ExcludedGuide {
                guide: "AAAAAAAAAAAAAAAAAAAA".to_string(),
                reason: "GC count 0 outside [5, 15]".to_string(),
            }],
            stats: None,
        }
    }

    #[rstest]
    #[case(TimeDelta::zero(), "0:00:00.000000")]
    #[case(TimeDelta::milliseconds(1500), "0:00:01.500000")]
    #[case(TimeDelta::seconds(3723), "1:02:03.000000")]
    fn test_format_duration(#[case] delta: TimeDelta, #[case] expected: &str) {
        assert_eq!(format_duration(delta), expected);
    }

    #[rstest]
    fn test_text_report(report: DesignReport) {
        let mut out = Vec::new();
        write_text_report(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "dashit seq 0.1.0");
        assert_eq!(lines[1], "Running on, node1");
        assert_eq!(lines[3], "Off-target file, Not specified");
        assert_eq!(lines[7], "Solution is OPTIMAL");
        assert_eq!(lines[8], "Designed CRISPR guides");
        assert_eq!(lines[9], "GACTTCGAATGGCATCCTGA");
        assert_eq!(lines[13], "CRISPR site,why it was excluded");
        assert_eq!(
            lines[14],
            "AAAAAAAAAAAAAAAAAAAA,\"GC count 0 outside [5, 15]\""
        );
    }

    #[rstest]
    fn test_excluded_table_reads_back(mut report: DesignReport) {
        report.excluded.push(ExcludedGuide {
            guide: "CCCCCCCCCCCCCCCCCCCC".to_string(),
            reason: "GC count 20 outside [5, 15]; offtarget against sites.txt".to_string(),
        });
        let mut out = Vec::new();
        write_text_report(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let (_, table) = text
            .split_once("CRISPR guides that were removed from consideration\n")
            .unwrap();

        let mut reader = csv::Reader::from_reader(table.as_bytes());
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            EXCLUDED_HEADER.to_vec()
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == 2));
        assert_eq!(
            &rows[1][1],
            "GC count 20 outside [5, 15]; offtarget against sites.txt"
        );
    }

    #[rstest]
    fn test_sub_optimal_report(mut report: DesignReport) {
        report.optimal = false;
        report.status = "FEASIBLE".to_string();
        let mut out = Vec::new();
        write_text_report(&report, &mut out).unwrap();
        assert!(
            String::from_utf8(out)
                .unwrap()
                .contains("Solution may be SUB-OPTIMAL")
        );
    }

    #[rstest]
    fn test_json_report(report: DesignReport) {
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "OPTIMAL");
        assert_eq!(value["offtarget"], serde_json::Value::Null);
        assert_eq!(value["excluded"][0]["guide"], "AAAAAAAAAAAAAAAAAAAA");
    }

    #[rstest]
    fn test_hostname_is_never_empty() {
        assert!(!hostname().is_empty());
    }
}
