use clap::{Arg, Command, arg, value_parser};

pub const READS_FILTER_CMD: &str = "reads-filter";
pub const DEFAULT_RADIUS: &str = "5_10_19";

pub fn create_reads_filter_cli() -> Command {
    Command::new(READS_FILTER_CMD)
        .about("Filter guides in a sites-to-reads file by off-targets and structure.")
        .arg(
            Arg::new("input")
                .required(true)
                .help("Sites-to-reads file to filter, generated by crispr_sites -r"),
        )
        .arg(
            arg!(--filtered_explanation <filtered_explanation>)
                .help("Write which guides were disqualified and why to this CSV file"),
        )
        .arg(
            arg!(--offtarget <offtarget>)
                .help("File containing off-target CRISPR sites, as generated by crispr_sites"),
        )
        .arg(
            arg!(--offtarget_radius <offtarget_radius>)
                .default_value(DEFAULT_RADIUS)
                .help("Remove a guide hitting an off-target when L, M, N nucleotides of its first 5, 10 and 20 positions match, given as L_M_N"),
        )
        .arg(
            arg!(--gc_freq_min <gc_freq_min>)
                .value_parser(value_parser!(usize))
                .help("Filter a guide if its number of Gs and Cs is strictly less than this"),
        )
        .arg(
            arg!(--gc_freq_max <gc_freq_max>)
                .value_parser(value_parser!(usize))
                .help("Filter a guide if its number of Gs and Cs is strictly greater than this"),
        )
        .arg(
            arg!(--homopolymer <homopolymer>)
                .value_parser(value_parser!(usize))
                .help("Filter a guide with a run of one nucleotide strictly longer than this"),
        )
        .arg(
            arg!(--dinucleotide_repeats <dinucleotide_repeats>)
                .value_parser(value_parser!(usize))
                .help("Filter a guide where one dinucleotide repeats strictly more than this many times"),
        )
        .arg(
            arg!(--hairpin_min_inner <hairpin_min_inner>)
                .value_parser(value_parser!(usize))
                .help("Filter a hairpin whose loop is at least this long"),
        )
        .arg(
            arg!(--hairpin_min_outer <hairpin_min_outer>)
                .value_parser(value_parser!(usize))
                .help("Filter a hairpin whose stem is at least this long"),
        )
}
