use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid off-target radius `{0}`: expected L_M_N with L <= 5, M <= 10, N <= 20 and L <= M <= N")]
    InvalidRadius(String),

    #[error("Invalid structure parameters: {0}")]
    InvalidStructureParams(String),

    #[error("Invalid design parameters: {0}")]
    InvalidDesignParams(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum OfftargetError {
    #[error("Off-target server unreachable at {url} after {attempts} attempts: {message}")]
    Unreachable {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("Off-target server returned HTTP status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Can't launch off-target server: {0}")]
    Launch(String),

    #[error("Off-target server exited unexpectedly with code {0:?}")]
    ServerExited(Option<i32>),

    #[error("Can't install interrupt handler: {0}")]
    Interrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("{0} is missing the total number of reads on line 1, re-run crispr_sites -r")]
    MissingReadCount(String),

    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error("Sites file {0} is empty")]
    EmptySitesFile(String),

    #[error(transparent)]
    Offtarget(#[from] OfftargetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type OfftargetResult<T> = std::result::Result<T, OfftargetError>;
pub type FilterResult<T> = std::result::Result<T, FilterError>;
