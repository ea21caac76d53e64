use std::path::PathBuf;

use rust_decimal::Decimal;

use crate::data::{DateCell, Key};

// `row` is the 1-based source row number including the header line, so it
// points at the same line an operator sees in a spreadsheet.

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub row: usize,
    pub id_cliente: Option<Key>,
    pub nombre_cliente: Option<String>,
    pub email: Option<String>,
    pub ciudad: Option<String>,
    pub fecha_registro: DateCell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub row: usize,
    pub id_producto: Option<Key>,
    pub nombre_producto: Option<String>,
    pub categoria: Option<String>,
    /// Catalogue price, carried verbatim; metrics use the line item price.
    pub precio_unitario: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub row: usize,
    pub id_venta: Option<Key>,
    pub fecha_venta: DateCell,
    pub id_cliente: Option<Key>,
    pub nombre_cliente: Option<String>,
    pub email: Option<String>,
    pub medio_pago: Option<String>,
    /// Always `None` until the metrics stage attaches the line item total.
    pub monto_total: Option<Decimal>,
}

/// A line item as read from the source. Numeric cells stay as text until the
/// metrics stage coerces them, so a bad value can be reported with its row.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub row: usize,
    pub id_venta: Option<Key>,
    pub id_producto: Option<Key>,
    pub nombre_producto: Option<String>,
    pub cantidad: String,
    pub precio_unitario: String,
    pub importe: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedLineItem {
    pub row: usize,
    pub id_venta: Option<Key>,
    pub id_producto: Option<Key>,
    pub nombre_producto: Option<String>,
    pub cantidad: Decimal,
    pub precio_unitario: Decimal,
    pub costo_unitario: Decimal,
    pub importe: Decimal,
    pub ganancia_bruta: Decimal,
}

/// Cells of one source file, before any schema is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source, header included.
    pub line: usize,
    pub cells: Vec<String>,
}

impl RawTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// The four loaded source tables.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub customers: RawTable,
    pub products: RawTable,
    pub sales: RawTable,
    pub line_items: RawTable,
}

/// The four source tables decoded into typed records.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTables {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub sales: Vec<Sale>,
    pub line_items: Vec<LineItem>,
}
