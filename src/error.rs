use thiserror::Error;

/// Failure to load a genome from its text encoding.
#[derive(Error, Debug)]
pub enum GenomeError {
    #[error("genome is empty")]
    Empty,

    #[error("invalid instruction symbol {symbol:?} at position {position}")]
    InvalidSymbol { position: usize, symbol: char },

    #[error("cannot read genome file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to load or validate a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Why a divide attempt was discarded. Never fatal: the organism keeps
/// running.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inviable {
    #[error("offspring would be empty (read-head {read}, write-head {write})")]
    EmptyOffspring { read: usize, write: usize },

    #[error("offspring size {size} outside [{min}, {max}]")]
    OffspringSize { size: usize, min: usize, max: usize },

    #[error("parent size {size} outside [{min}, {max}]")]
    ParentSize { size: usize, min: usize, max: usize },

    #[error("only {executed} of {required} required parent sites executed")]
    TooFewExecuted { executed: usize, required: usize },

    #[error("only {copied} of {required} required offspring sites copied")]
    TooFewCopied { copied: usize, required: usize },
}
