//! Header canonicalization, schema validation, and record decoding.
//!
//! Every stage function here takes its input by reference and returns new
//! values. Date columns are parsed into [`DateCell`]s: an unparseable date
//! becomes null in the output and is recorded in a [`DateParseReport`]
//! instead of aborting the run.

use itertools::Itertools;
use log::{debug, warn};

use crate::{
    data::{DateCell, Key, non_empty, normalize_column_name},
    error::{PipelineError, Result},
    model::{Customer, LineItem, NormalizedTables, Product, RawTable, Sale, SourceTables},
    schema::{ColumnIndex, Entity, EntitySchema},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseFailure {
    pub entity: Entity,
    pub column: &'static str,
    pub row: usize,
    pub raw: String,
    pub reason: String,
}

/// Every date that could not be parsed during normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateParseReport {
    pub failures: Vec<DateParseFailure>,
}

impl DateParseReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn count_for(&self, entity: Entity, column: &str) -> usize {
        self.failures
            .iter()
            .filter(|f| f.entity == entity && f.column == column)
            .count()
    }

    fn record(&mut self, entity: Entity, column: &'static str, row: usize, cell: &DateCell) {
        if let DateCell::Invalid { raw, reason } = cell {
            self.failures.push(DateParseFailure {
                entity,
                column,
                row,
                raw: raw.clone(),
                reason: reason.clone(),
            });
        }
    }
}

/// Lowercases headers and folds the schema's aliases into canonical names.
///
/// An alias is renamed only when the canonical column is absent; if both are
/// present the canonical column wins and the alias column is left as is.
pub fn canonical_headers(headers: &[String], schema: &EntitySchema) -> Vec<String> {
    let mut canonical = headers
        .iter()
        .map(|h| normalize_column_name(h))
        .collect::<Vec<_>>();
    for alias in schema.aliases {
        if canonical.iter().any(|h| h == alias.canonical) {
            continue;
        }
        if let Some(slot) = canonical.iter_mut().find(|h| h.as_str() == alias.alias) {
            debug!(
                "Renaming column '{}' to '{}' in {} table",
                alias.alias, alias.canonical, schema.entity
            );
            *slot = alias.canonical.to_string();
        }
    }
    canonical
}

/// Canonicalizes a table's headers and validates them against its schema.
pub fn resolve_columns(table: &RawTable, entity: Entity) -> Result<ColumnIndex> {
    let schema = entity.schema();
    let headers = canonical_headers(&table.headers, schema);
    schema.resolve(&headers).map_err(|missing| {
        PipelineError::source_read(
            &table.path,
            format!(
                "{} table is missing required column(s) {}; found [{}]",
                entity,
                missing
                    .iter()
                    .map(|c| format!("{} ({})", c.name, c.datatype))
                    .join(", "),
                headers.join(", ")
            ),
        )
    })
}

pub fn normalize(sources: &SourceTables) -> Result<(NormalizedTables, DateParseReport)> {
    let mut report = DateParseReport::default();
    let tables = NormalizedTables {
        customers: normalize_customers(&sources.customers, &mut report)?,
        products: normalize_products(&sources.products)?,
        sales: normalize_sales(&sources.sales, &mut report)?,
        line_items: normalize_line_items(&sources.line_items)?,
    };
    if report.failure_count() > 0 {
        warn!(
            "{} date value(s) could not be parsed and were set to null",
            report.failure_count()
        );
    }
    Ok((tables, report))
}

pub fn normalize_customers(table: &RawTable, report: &mut DateParseReport) -> Result<Vec<Customer>> {
    let index = resolve_columns(table, Entity::Customer)?;
    Ok(table
        .rows
        .iter()
        .map(|row| {
            let cells = &row.cells;
            let fecha_registro = DateCell::parse(index.cell(cells, "fecha_registro"));
            report.record(Entity::Customer, "fecha_registro", row.line, &fecha_registro);
            Customer {
                row: row.line,
                id_cliente: Key::parse(index.cell(cells, "id_cliente")),
                nombre_cliente: non_empty(index.cell(cells, "nombre_cliente")),
                email: non_empty(index.cell(cells, "email")),
                ciudad: non_empty(index.cell(cells, "ciudad")),
                fecha_registro,
            }
        })
        .collect())
}

pub fn normalize_products(table: &RawTable) -> Result<Vec<Product>> {
    let index = resolve_columns(table, Entity::Product)?;
    Ok(table
        .rows
        .iter()
        .map(|row| {
            let cells = &row.cells;
            Product {
                row: row.line,
                id_producto: Key::parse(index.cell(cells, "id_producto")),
                nombre_producto: non_empty(index.cell(cells, "nombre_producto")),
                categoria: non_empty(index.cell(cells, "categoria")),
                precio_unitario: non_empty(index.cell(cells, "precio_unitario")),
            }
        })
        .collect())
}

pub fn normalize_sales(table: &RawTable, report: &mut DateParseReport) -> Result<Vec<Sale>> {
    let index = resolve_columns(table, Entity::Sale)?;
    Ok(table
        .rows
        .iter()
        .map(|row| {
            let cells = &row.cells;
            let fecha_venta = DateCell::parse(index.cell(cells, "fecha_venta"));
            report.record(Entity::Sale, "fecha_venta", row.line, &fecha_venta);
            Sale {
                row: row.line,
                id_venta: Key::parse(index.cell(cells, "id_venta")),
                fecha_venta,
                id_cliente: Key::parse(index.cell(cells, "id_cliente")),
                nombre_cliente: non_empty(index.cell(cells, "nombre_cliente")),
                email: non_empty(index.cell(cells, "email")),
                medio_pago: non_empty(index.cell(cells, "medio_pago")),
                monto_total: None,
            }
        })
        .collect())
}

pub fn normalize_line_items(table: &RawTable) -> Result<Vec<LineItem>> {
    let index = resolve_columns(table, Entity::LineItem)?;
    Ok(table
        .rows
        .iter()
        .map(|row| {
            let cells = &row.cells;
            LineItem {
                row: row.line,
                id_venta: Key::parse(index.cell(cells, "id_venta")),
                id_producto: Key::parse(index.cell(cells, "id_producto")),
                nombre_producto: non_empty(index.cell(cells, "nombre_producto")),
                cantidad: index.cell(cells, "cantidad").trim().to_string(),
                precio_unitario: index.cell(cells, "precio_unitario").trim().to_string(),
                importe: index.cell(cells, "importe").trim().to_string(),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CUSTOMER_SCHEMA, SALE_SCHEMA};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn canonical_headers_lowercase_and_apply_aliases() {
        let headers = strings(&["ID_Venta", "Fecha", "ID_Cliente", "Medio_Pago"]);
        assert_eq!(
            canonical_headers(&headers, &SALE_SCHEMA),
            strings(&["id_venta", "fecha_venta", "id_cliente", "medio_pago"])
        );
    }

    #[test]
    fn canonical_column_wins_over_alias() {
        let headers = strings(&["id_cliente", "fecha_alta", "Fecha_Registro"]);
        assert_eq!(
            canonical_headers(&headers, &CUSTOMER_SCHEMA),
            strings(&["id_cliente", "fecha_alta", "fecha_registro"])
        );
    }

    #[test]
    fn aliases_only_apply_to_their_own_table() {
        let headers = strings(&["fecha"]);
        assert_eq!(canonical_headers(&headers, &CUSTOMER_SCHEMA), strings(&["fecha"]));
    }
}
