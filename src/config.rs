//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is built once (defaults, optionally overlaid by a YAML
//! file and then by command-line flags) and passed by reference into
//! [`crate::pipeline::run`]. Nothing here is global, so runs with different
//! settings can coexist in one process.

use std::{
    env,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, de};

use crate::{
    error::PipelineError,
    io_utils::{self, parse_delimiter},
    metrics::MetricsConfig,
    schema::Entity,
};

pub const DEFAULT_SEARCH_PATH: &[&str] = &[
    ".",
    "./BaseDatos",
    "../BaseDatos",
    "./SofiaSuppia - Proyecto Aurelion/BaseDatos",
];

/// Rounding convention applied to the derived unit cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum RoundingMode {
    /// Midpoints round away from zero (2.345 -> 2.35)
    #[default]
    HalfUp,
    /// Midpoints round to the even neighbour (2.345 -> 2.34). This is the
    /// convention of pandas/numpy `round`, so it reproduces figures from
    /// reports computed that way.
    HalfEven,
}

impl RoundingMode {
    pub fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// Logical table name to expected file name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceFiles {
    pub clientes: String,
    pub productos: String,
    pub ventas: String,
    pub detalle: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            clientes: "Clientes.xlsx".to_string(),
            productos: "Productos.xlsx".to_string(),
            ventas: "Ventas.xlsx".to_string(),
            detalle: "Detalle_ventas.xlsx".to_string(),
        }
    }
}

impl SourceFiles {
    pub fn name(&self, entity: Entity) -> &str {
        match entity {
            Entity::Customer => &self.clientes,
            Entity::Product => &self.productos,
            Entity::Sale => &self.ventas,
            Entity::LineItem => &self.detalle,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        Entity::ALL.iter().map(|e| self.name(*e)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Base for relative search-path entries; the process directory when unset.
    pub working_dir: Option<PathBuf>,
    pub search_path: Vec<PathBuf>,
    pub files: SourceFiles,
    pub margin_factor: Decimal,
    pub rounding: RoundingMode,
    #[serde(deserialize_with = "deserialize_delimiter")]
    pub delimiter: Option<u8>,
    pub encoding: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            working_dir: None,
            search_path: DEFAULT_SEARCH_PATH.iter().map(PathBuf::from).collect(),
            files: SourceFiles::default(),
            margin_factor: default_margin_factor(),
            rounding: RoundingMode::default(),
            delimiter: None,
            encoding: None,
        }
    }
}

/// 30% margin over cost.
pub fn default_margin_factor() -> Decimal {
    Decimal::new(30, 2)
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let config: PipelineConfig =
            serde_yaml::from_reader(reader).context("Parsing config YAML")?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), PipelineError> {
        MetricsConfig::from_config(self)?;
        if self.search_path.is_empty() {
            return Err(PipelineError::Config(
                "search path must list at least one directory".to_string(),
            ));
        }
        for entity in Entity::ALL {
            if self.files.name(entity).trim().is_empty() {
                return Err(PipelineError::Config(format!(
                    "file name for '{}' cannot be empty",
                    entity.logical_name()
                )));
            }
        }
        io_utils::resolve_encoding(self.encoding.as_deref())
            .map_err(|err| PipelineError::Config(err.to_string()))?;
        Ok(())
    }

    pub fn resolved_working_dir(&self) -> std::result::Result<PathBuf, PipelineError> {
        match &self.working_dir {
            Some(dir) => Ok(dir.clone()),
            None => env::current_dir().map_err(|err| {
                PipelineError::Config(format!("cannot determine working directory: {err}"))
            }),
        }
    }
}

fn deserialize_delimiter<'de, D>(deserializer: D) -> std::result::Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| parse_delimiter(&value).map_err(de::Error::custom))
        .transpose()
}
