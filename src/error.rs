use std::{fmt::Display, path::PathBuf};

use thiserror::Error;

use crate::{data::KeyType, locate::LocatorReport, schema::Entity};

/// Fatal conditions that abort a pipeline run.
///
/// Date parse failures and unmatched foreign keys are not errors here:
/// the former are collected in a `DateParseReport`, the latter surface as
/// null fields in the master view.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    DataNotFound(Box<LocatorReport>),

    #[error("Failed to read {path:?} as tabular data: {reason}")]
    SourceRead { path: PathBuf, reason: String },

    #[error(
        "Cannot compute metrics: column '{column}' at row {row} \
         (id_venta={id_venta}, id_producto={id_producto}) expected a number but found '{value}'"
    )]
    MetricComputation {
        column: &'static str,
        row: usize,
        id_venta: String,
        id_producto: String,
        value: String,
    },

    #[error(
        "Join '{join}' cannot match any rows: key '{column}' holds {left_type} values in {left} \
         but {right_type} values in {right}"
    )]
    JoinKeyType {
        join: &'static str,
        left: Entity,
        right: Entity,
        column: &'static str,
        left_type: KeyType,
        right_type: KeyType,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn source_read(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        PipelineError::SourceRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
