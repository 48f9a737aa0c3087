//! Error types for loading, classifying and drawing.

use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, KinError>;

#[derive(Debug, Error)]
pub enum KinError {
    /// A statistics table lacks columns the classifier needs.
    #[error("{table} is missing required columns: {}", .missing.join(", "))]
    MissingColumns { table: String, missing: Vec<String> },

    /// A statistics cell could not be read as a number.
    #[error("{table} row {row}: column {column} has non-numeric value {value:?}")]
    InvalidValue {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown color: {0:?}")]
    UnknownColor(String),

    #[error("Malformed statistics matrix: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Rendering failed: {0}")]
    Render(String),
}
