use thiserror::Error;

#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Can't read FASTA file: {0}")]
    FastaReadError(String),

    #[error("No sequence found in FASTA file: {0}")]
    EmptyFasta(String),

    #[error("Input sequence file can only contain a single sequence: {0}")]
    MultipleSequences(String),

    #[error("Invalid nucleotide '{base}' at position {position} in sequence {id}")]
    InvalidBase {
        id: String,
        base: char,
        position: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum GeneError {
    #[error("Gene {0} has not been cut with a library yet")]
    NotCut(String),

    #[error("Gene {0} has no candidate targets")]
    NoTargets(String),

    #[error("Malformed FASTA description field for gene {gene}: {field}")]
    InvalidDescription { gene: String, field: String },

    #[error("Sub-library for component {component} contains guides outside its library: {guides:?}")]
    LibraryInvariant {
        component: String,
        guides: Vec<String>,
    },

    #[error("Component {0} has no library assigned")]
    MissingLibrary(String),

    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error("Mutation index is missing required column: {0}")]
    MissingColumn(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type SequenceResult<T> = std::result::Result<T, SequenceError>;
pub type GeneResult<T> = std::result::Result<T, GeneError>;
