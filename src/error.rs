use std::{io, path::PathBuf};

use crate::kind::UnitKind;

pub type Result<T, E = UnitError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum UnitError {
    #[error("missing section header at line {line}")]
    MissingSectionHeader { line: usize },

    #[error("section '{section}' not found")]
    SectionNotFound { section: String },

    #[error("key '{key}' not found in section '{section}'")]
    KeyNotFound { section: String, key: String },

    #[error("section {section} is required in {kind} file")]
    MissingRequiredSection { section: String, kind: UnitKind },

    #[error("section {section} is not allowed in {kind} file")]
    SectionNotAllowed { section: String, kind: UnitKind },

    #[error("invalid unit name: '{name}'")]
    InvalidUnitName { name: String },

    #[error("units for {name} already exist: {}", .files.join(", "))]
    UnitsExist { name: String, files: Vec<String> },

    #[error("no units found for {name}")]
    NoExistingUnits { name: String },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed with {status}")]
    Command { command: String, status: String },
}

impl UnitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        UnitError::Io {
            path: path.into(),
            source,
        }
    }
}
