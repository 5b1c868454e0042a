use clap::{Arg, ArgAction, Command, arg};

pub const SCORE_CMD: &str = "score";

pub fn create_score_cli() -> Command {
    Command::new(SCORE_CMD)
        .about("Score a guide library by the fraction of reads it hits.")
        .arg(
            Arg::new("guides")
                .required(true)
                .help("Guide CSV, two metadata lines then one guide per line"),
        )
        .arg(
            Arg::new("reads")
                .required(true)
                .help("FASTA file to measure guide hits against"),
        )
        .arg(
            arg!(-s --split)
                .action(ArgAction::SetTrue)
                .help("Split DASHed and unDASHed reads into <reads>_dashed.fasta and <reads>_undashed.fasta"),
        )
        .arg(arg!(--outdir <outdir>).help("Directory for split reads files [default: .]"))
}
