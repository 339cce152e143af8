//! Error types for configuration, model loading and the executive

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a configuration document from disk
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by a model while loading its configuration section
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Missing required element <{0}>")]
    MissingElement(String),

    #[error("Element <{element}> has invalid value '{value}'")]
    InvalidValue { element: String, value: String },

    #[error("Unknown unit '{unit}' for element <{element}>")]
    UnknownUnit { element: String, unit: String },

    #[error("No such property '{0}'")]
    NoSuchProperty(String),

    #[error("Could not find {what} '{name}' (searched {searched:?})")]
    ResourceNotFound {
        what: &'static str,
        name: String,
        searched: Vec<PathBuf>,
    },

    #[error("Could not write output {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading a vehicle definition into an executive
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Attempted to load a vehicle with undefined aircraft, engine or systems path")]
    UndefinedPaths,

    #[error(transparent)]
    Document(#[from] ConfigError),

    #[error("Incompatible configuration version '{found}' in {path} (expected '{needed}')")]
    Version {
        found: String,
        needed: &'static str,
        path: PathBuf,
    },

    #[error("No <{section}> element was found in {path}")]
    MissingSection { section: &'static str, path: PathBuf },

    #[error("Vehicle <{section}> element has problems in {path}: {source}")]
    Section {
        section: &'static str,
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("No location was found for child object '{0}'")]
    ChildPlacement(String),

    #[error("Model initialisation failed: {0}")]
    Allocation(#[source] ModelError),

    #[error("Child vehicle '{name}' failed to load: {source}")]
    Child {
        name: String,
        #[source]
        source: Box<LoadError>,
    },
}

impl LoadError {
    /// Name of the configuration section that caused the failure, if any
    pub fn section(&self) -> Option<&'static str> {
        match self {
            LoadError::MissingSection { section, .. } | LoadError::Section { section, .. } => {
                Some(section)
            }
            LoadError::ChildPlacement(_) | LoadError::Child { .. } => Some("child"),
            _ => None,
        }
    }
}

/// Errors surfaced by executive operations
#[derive(Error, Debug)]
pub enum ExecError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Illegal trimming mode {0}")]
    InvalidTrimMode(i32),

    #[error("Trim failed: {0}")]
    TrimFailed(String),

    #[error("Linearization failed: {0}")]
    LinearizationFailed(String),

    #[error("No {0} solver is attached to this executive")]
    NoSolver(&'static str),

    #[error("No vehicle is loaded")]
    NotLoaded,
}

/// Result type for executive operations
pub type ExecResult<T> = Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_reports_section() {
        let err = LoadError::MissingSection {
            section: "metrics",
            path: PathBuf::from("aircraft/c1/c1.json"),
        };
        assert_eq!(err.section(), Some("metrics"));
        assert!(err.to_string().contains("metrics"));
        assert!(err.to_string().contains("c1.json"));
    }

    #[test]
    fn test_section_error_chains_source() {
        let err = LoadError::Section {
            section: "mass_balance",
            path: PathBuf::from("x.json"),
            source: ModelError::MissingElement("emptywt".into()),
        };
        assert_eq!(err.section(), Some("mass_balance"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Missing required element <emptywt>"));
    }
}
