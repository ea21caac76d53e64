//! End-to-end orchestration: locate, load, normalize, price, join.

use std::path::PathBuf;

use log::info;

use crate::{
    config::PipelineConfig,
    error::{PipelineError, Result},
    io_utils,
    join::{self, MasterView},
    load::{self, LoadOptions},
    locate,
    metrics::{self, MetricsConfig},
    normalize::{self, DateParseReport},
};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Directory the four source files were read from.
    pub source_dir: PathBuf,
    pub view: MasterView,
    pub date_report: DateParseReport,
}

pub fn run(config: &PipelineConfig) -> Result<PipelineOutput> {
    config.validate()?;
    let metrics_config = MetricsConfig::from_config(config)?;
    let encoding = io_utils::resolve_encoding(config.encoding.as_deref())
        .map_err(|err| PipelineError::Config(err.to_string()))?;
    let options = LoadOptions {
        delimiter: config.delimiter,
        encoding,
    };

    let working_dir = config.resolved_working_dir()?;
    let paths = locate::locate(&working_dir, &config.search_path, &config.files)?;
    let sources = load::load_sources(&paths, &options)?;
    let (tables, date_report) = normalize::normalize(&sources)?;
    let priced = metrics::price_line_items(&tables.line_items, &metrics_config)?;
    let sales = metrics::attach_totals(&tables.sales, &priced)?;
    let view = join::build_master_view(&priced, &sales, &tables.customers, &tables.products)?;

    info!(
        "Pipeline finished: {} master row(s) from {:?}",
        view.len(),
        paths.directory
    );
    Ok(PipelineOutput {
        source_dir: paths.directory,
        view,
        date_report,
    })
}
