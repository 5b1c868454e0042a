use clap::{Arg, Command, arg, value_parser};

pub const READS_OPTIMIZE_CMD: &str = "reads-optimize";

pub fn create_reads_optimize_cli() -> Command {
    Command::new(READS_OPTIMIZE_CMD)
        .about("Greedily choose the sites of a sites-to-reads file that cover the most reads.")
        .arg(
            Arg::new("input")
                .required(true)
                .help("Sites-to-reads file, generated by crispr_sites -r"),
        )
        .arg(
            Arg::new("num_sites")
                .required(true)
                .value_parser(value_parser!(usize))
                .help("Number of sites to choose"),
        )
        .arg(
            Arg::new("coverage")
                .required(true)
                .value_parser(value_parser!(usize))
                .help("Number of times each read should be covered"),
        )
        .arg(
            arg!(--reads <reads>)
                .help("FASTA file of the reads; adds a random read hit by each chosen site"),
        )
        .arg(
            arg!(--seed <seed>)
                .value_parser(value_parser!(u64))
                .help("Seed for choosing representative reads"),
        )
}
