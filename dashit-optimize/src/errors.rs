use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("No candidate sites survived filtering, nothing to optimize")]
    NoCandidateSites,

    #[error("Optimal solution could not be found: the constraints are infeasible. Relax the spacing or filtering parameters")]
    Infeasible,

    #[error("The guide selection problem is unbounded")]
    Unbounded,

    #[error("Solver failed: {0}")]
    Solver(String),

    #[error("Expected a 20-mer guide in {file}, got {guide}")]
    InvalidGuide { file: String, guide: String },

    #[error("No guides found in {0}")]
    NoGuides(String),

    #[error("Can't read FASTA file: {0}")]
    FastaReadError(String),

    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type OptimizeResult<T> = std::result::Result<T, OptimizeError>;
