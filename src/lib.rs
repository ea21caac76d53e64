pub mod cli;
pub mod columns;
pub mod config;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod join;
pub mod load;
pub mod locate;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod table;

use std::{
    env,
    io::{self, Write},
    sync::OnceLock,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};
use rust_decimal::Decimal;

use crate::{
    cli::{Cli, Commands, RunArgs, SourceArgs},
    config::PipelineConfig,
    join::{MasterRecord, master_headers},
    pipeline::PipelineOutput,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sales_etl", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Locate(args) => handle_locate(&args.source),
        Commands::Run(args) => handle_run(&args),
        Commands::Columns => {
            columns::execute();
            Ok(())
        }
    }
}

/// Defaults, then the config file, then command-line flags.
pub fn build_config(source: &SourceArgs) -> Result<PipelineConfig> {
    let mut config = match &source.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Loading configuration from {path:?}"))?,
        None => PipelineConfig::default(),
    };
    if !source.search_path.is_empty() {
        config.search_path = source.search_path.clone();
    }
    if let Some(dir) = &source.working_dir {
        config.working_dir = Some(dir.clone());
    }
    let overrides = [
        (&source.clientes, &mut config.files.clientes),
        (&source.productos, &mut config.files.productos),
        (&source.ventas, &mut config.files.ventas),
        (&source.detalle, &mut config.files.detalle),
    ];
    for (flag, slot) in overrides {
        if let Some(name) = flag {
            *slot = name.clone();
        }
    }
    debug!("Effective configuration: {config:?}");
    Ok(config)
}

fn run_config(args: &RunArgs) -> Result<PipelineConfig> {
    let mut config = build_config(&args.source)?;
    if let Some(margin) = args.margin {
        config.margin_factor = margin;
    }
    if let Some(rounding) = args.rounding {
        config.rounding = rounding;
    }
    if args.delimiter.is_some() {
        config.delimiter = args.delimiter;
    }
    if args.input_encoding.is_some() {
        config.encoding = args.input_encoding.clone();
    }
    Ok(config)
}

fn handle_locate(source: &SourceArgs) -> Result<()> {
    let config = build_config(source)?;
    config.validate()?;
    let working_dir = config.resolved_working_dir()?;
    let paths = locate::locate(&working_dir, &config.search_path, &config.files)?;
    println!("directory: {}", paths.directory.display());
    for entity in schema::Entity::ALL {
        println!("{}: {}", entity.logical_name(), paths.get(entity).display());
    }
    Ok(())
}

fn handle_run(args: &RunArgs) -> Result<()> {
    let config = run_config(args)?;
    let output = pipeline::run(&config)?;
    if args.json {
        write_json_lines(&output.view.records).context("Writing JSON output")?;
        return Ok(());
    }

    print!("{}", table::render_summary(&summary_entries(&output)?));
    if args.rows > 0 && !output.view.is_empty() {
        println!();
        let preview = output
            .view
            .records
            .iter()
            .take(args.rows)
            .map(MasterRecord::cells)
            .collect::<Vec<_>>();
        table::print_table(&master_headers(), &preview);
    }
    info!(
        "Previewed {} of {} master row(s)",
        args.rows.min(output.view.len()),
        output.view.len()
    );
    Ok(())
}

pub fn summary_entries(output: &PipelineOutput) -> Result<Vec<(&'static str, String)>> {
    let records = &output.view.records;
    let revenue = checked_sum(records.iter().map(|r| r.importe)).context("Summing importe")?;
    let profit =
        checked_sum(records.iter().map(|r| r.ganancia_bruta)).context("Summing ganancia_bruta")?;
    let stats = &output.view.stats;
    Ok(vec![
        ("source directory", output.source_dir.display().to_string()),
        ("master rows", records.len().to_string()),
        ("revenue", revenue.to_string()),
        ("gross profit", profit.to_string()),
        ("line items without sale", stats.unmatched_sales.to_string()),
        ("line items without customer", stats.unmatched_customers.to_string()),
        ("line items without product", stats.unmatched_products.to_string()),
        ("invalid dates", output.date_report.failure_count().to_string()),
    ])
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> Result<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, value| {
        acc.checked_add(value)
            .with_context(|| format!("Sum overflowed after {acc}"))
    })
}

fn write_json_lines(records: &[MasterRecord]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for record in records {
        serde_json::to_writer(&mut handle, record)?;
        handle.write_all(b"\n")?;
    }
    handle.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_sum_adds_values_and_reports_overflow() {
        let values = [Decimal::new(1050, 2), Decimal::new(250, 2)];
        assert_eq!(checked_sum(values.into_iter()).unwrap(), Decimal::new(1300, 2));
        assert_eq!(checked_sum(std::iter::empty()).unwrap(), Decimal::ZERO);

        let err = checked_sum([Decimal::MAX, Decimal::ONE].into_iter()).unwrap_err();
        assert!(err.to_string().contains("Sum overflowed"));
    }
}
