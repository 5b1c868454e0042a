use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const SEQ_CMD: &str = "seq";

pub fn create_seq_cli() -> Command {
    Command::new(SEQ_CMD)
        .about("Design a minimal guide library covering a single input sequence.")
        .arg(Arg::new("input").required(true).help("Sequence to cover with guides, FASTA format"))
        .arg(
            arg!(--min_spacing <min_spacing>)
                .value_parser(value_parser!(usize))
                .help("Space guides no closer than this"),
        )
        .arg(
            arg!(--max_spacing <max_spacing>)
                .value_parser(value_parser!(usize))
                .help("Ensure at least one guide in every window of this size"),
        )
        .arg(
            arg!(--offtarget <offtarget>)
                .help("File containing off-target CRISPR sites, as generated by crispr_sites"),
        )
        .arg(
            arg!(--offtarget_radius <offtarget_radius>)
                .action(ArgAction::Append)
                .help("Off-target radius as L_M_N; may be repeated. Defaults to the configured radii"),
        )
        .arg(
            arg!(--json)
                .action(ArgAction::SetTrue)
                .help("Write the design report as a single JSON document"),
        )
}
