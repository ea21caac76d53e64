use std::collections::{HashMap, hash_map::Entry};

use chrono::NaiveDate;
use log::{info, warn};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    data::{Key, KeyType},
    error::{PipelineError, Result},
    model::{Customer, PricedLineItem, Product, Sale},
    schema::Entity,
};

/// One left join: `left ⟕ right` on `column`.
#[derive(Debug, Clone, Copy)]
pub struct JoinSpec {
    pub name: &'static str,
    pub left: Entity,
    pub right: Entity,
    pub column: &'static str,
}

pub const TOTALS_JOIN: JoinSpec = JoinSpec {
    name: "sale totals",
    left: Entity::LineItem,
    right: Entity::Sale,
    column: "id_venta",
};

pub const SALE_JOIN: JoinSpec = JoinSpec {
    name: "line items to sales",
    left: Entity::LineItem,
    right: Entity::Sale,
    column: "id_venta",
};

pub const CUSTOMER_JOIN: JoinSpec = JoinSpec {
    name: "sales to customers",
    left: Entity::Sale,
    right: Entity::Customer,
    column: "id_cliente",
};

pub const PRODUCT_JOIN: JoinSpec = JoinSpec {
    name: "line items to products",
    left: Entity::LineItem,
    right: Entity::Product,
    column: "id_producto",
};

impl JoinSpec {
    /// Fails when one side's keys are all integers and the other's all text,
    /// which would make every lookup miss.
    pub fn check<'a, L, R>(&self, left_keys: L, right_keys: R) -> Result<()>
    where
        L: IntoIterator<Item = &'a Key>,
        R: IntoIterator<Item = &'a Key>,
    {
        let (Some(left_type), Some(right_type)) =
            (KeyType::of_column(left_keys), KeyType::of_column(right_keys))
        else {
            return Ok(());
        };
        if left_type.compatible_with(right_type) {
            Ok(())
        } else {
            Err(PipelineError::JoinKeyType {
                join: self.name,
                left: self.left,
                right: self.right,
                column: self.column,
                left_type,
                right_type,
            })
        }
    }
}

/// Where a master column comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterColumn {
    pub name: &'static str,
    pub origin: Entity,
    pub source: &'static str,
}

const fn column(name: &'static str, origin: Entity, source: &'static str) -> MasterColumn {
    MasterColumn {
        name,
        origin,
        source,
    }
}

/// Ordered catalogue of the master view. Source columns that exist in more
/// than one table are renamed here; everything else keeps its canonical name.
pub const MASTER_COLUMNS: &[MasterColumn] = &[
    column("id_venta", Entity::LineItem, "id_venta"),
    column("id_producto", Entity::LineItem, "id_producto"),
    column("nombre_producto_detalle", Entity::LineItem, "nombre_producto"),
    column("cantidad", Entity::LineItem, "cantidad"),
    column("precio_unitario", Entity::LineItem, "precio_unitario"),
    column("costo_unitario", Entity::LineItem, "costo_unitario"),
    column("importe", Entity::LineItem, "importe"),
    column("ganancia_bruta", Entity::LineItem, "ganancia_bruta"),
    column("fecha_venta", Entity::Sale, "fecha_venta"),
    column("id_cliente", Entity::Sale, "id_cliente"),
    column("nombre_cliente_venta", Entity::Sale, "nombre_cliente"),
    column("email_venta", Entity::Sale, "email"),
    column("medio_pago", Entity::Sale, "medio_pago"),
    column("monto_total", Entity::Sale, "monto_total"),
    column("nombre_cliente", Entity::Customer, "nombre_cliente"),
    column("email", Entity::Customer, "email"),
    column("ciudad", Entity::Customer, "ciudad"),
    column("fecha_registro", Entity::Customer, "fecha_registro"),
    column("nombre_producto", Entity::Product, "nombre_producto"),
    column("categoria", Entity::Product, "categoria"),
    column("precio_unitario_catalogo", Entity::Product, "precio_unitario"),
];

/// Master column name for a source column, if the column is carried.
pub fn master_name(origin: Entity, source: &str) -> Option<&'static str> {
    MASTER_COLUMNS
        .iter()
        .find(|c| c.origin == origin && c.source == source)
        .map(|c| c.name)
}

pub fn master_headers() -> Vec<String> {
    MASTER_COLUMNS.iter().map(|c| c.name.to_string()).collect()
}

/// One row of the master view: a line item with everything it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterRecord {
    pub id_venta: Option<Key>,
    pub id_producto: Option<Key>,
    pub nombre_producto_detalle: Option<String>,
    pub cantidad: Decimal,
    pub precio_unitario: Decimal,
    pub costo_unitario: Decimal,
    pub importe: Decimal,
    pub ganancia_bruta: Decimal,
    pub fecha_venta: Option<NaiveDate>,
    pub id_cliente: Option<Key>,
    pub nombre_cliente_venta: Option<String>,
    pub email_venta: Option<String>,
    pub medio_pago: Option<String>,
    pub monto_total: Option<Decimal>,
    pub nombre_cliente: Option<String>,
    pub email: Option<String>,
    pub ciudad: Option<String>,
    pub fecha_registro: Option<NaiveDate>,
    pub nombre_producto: Option<String>,
    pub categoria: Option<String>,
    pub precio_unitario_catalogo: Option<String>,
}

impl MasterRecord {
    /// Display cells in [`MASTER_COLUMNS`] order; `None` is a null field.
    pub fn cells(&self) -> Vec<Option<String>> {
        fn text<T: ToString>(value: &Option<T>) -> Option<String> {
            value.as_ref().map(ToString::to_string)
        }
        vec![
            text(&self.id_venta),
            text(&self.id_producto),
            self.nombre_producto_detalle.clone(),
            Some(self.cantidad.to_string()),
            Some(self.precio_unitario.to_string()),
            Some(self.costo_unitario.to_string()),
            Some(self.importe.to_string()),
            Some(self.ganancia_bruta.to_string()),
            self.fecha_venta.map(|d| d.format("%Y-%m-%d").to_string()),
            text(&self.id_cliente),
            self.nombre_cliente_venta.clone(),
            self.email_venta.clone(),
            self.medio_pago.clone(),
            text(&self.monto_total),
            self.nombre_cliente.clone(),
            self.email.clone(),
            self.ciudad.clone(),
            self.fecha_registro.map(|d| d.format("%Y-%m-%d").to_string()),
            self.nombre_producto.clone(),
            self.categoria.clone(),
            self.precio_unitario_catalogo.clone(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub unmatched_sales: usize,
    pub unmatched_customers: usize,
    pub unmatched_products: usize,
    pub duplicate_sale_keys: usize,
    pub duplicate_customer_keys: usize,
    pub duplicate_product_keys: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterView {
    pub records: Vec<MasterRecord>,
    pub stats: JoinStats,
}

impl MasterView {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Right side of a join, keyed by its unique identifier. The first row wins
/// when an identifier repeats so that the anchor row count never grows.
struct Lookup<'a, T> {
    rows: HashMap<&'a Key, &'a T>,
    duplicates: usize,
}

impl<'a, T> Lookup<'a, T> {
    fn build(rows: &'a [T], key_of: impl Fn(&'a T) -> Option<&'a Key>, entity: Entity) -> Self {
        let mut map = HashMap::with_capacity(rows.len());
        let mut duplicates = 0usize;
        for row in rows {
            let Some(key) = key_of(row) else {
                continue;
            };
            match map.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(row);
                }
                Entry::Occupied(_) => duplicates += 1,
            }
        }
        if duplicates > 0 {
            warn!("{duplicates} duplicate key(s) in {entity} table; keeping the first occurrence");
        }
        Self {
            rows: map,
            duplicates,
        }
    }

    fn get(&self, key: Option<&Key>) -> Option<&'a T> {
        key.and_then(|k| self.rows.get(k).copied())
    }
}

/// Builds the master view with three left joins anchored on the line items:
/// sales on `id_venta`, then customers on the sale's `id_cliente`, then
/// products on `id_producto`. The output has exactly one row per line item.
pub fn build_master_view(
    line_items: &[PricedLineItem],
    sales: &[Sale],
    customers: &[Customer],
    products: &[Product],
) -> Result<MasterView> {
    SALE_JOIN.check(
        line_items.iter().filter_map(|i| i.id_venta.as_ref()),
        sales.iter().filter_map(|s| s.id_venta.as_ref()),
    )?;
    CUSTOMER_JOIN.check(
        sales.iter().filter_map(|s| s.id_cliente.as_ref()),
        customers.iter().filter_map(|c| c.id_cliente.as_ref()),
    )?;
    PRODUCT_JOIN.check(
        line_items.iter().filter_map(|i| i.id_producto.as_ref()),
        products.iter().filter_map(|p| p.id_producto.as_ref()),
    )?;

    let sale_lookup = Lookup::build(sales, |s| s.id_venta.as_ref(), Entity::Sale);
    let customer_lookup = Lookup::build(customers, |c| c.id_cliente.as_ref(), Entity::Customer);
    let product_lookup = Lookup::build(products, |p| p.id_producto.as_ref(), Entity::Product);

    let mut stats = JoinStats {
        duplicate_sale_keys: sale_lookup.duplicates,
        duplicate_customer_keys: customer_lookup.duplicates,
        duplicate_product_keys: product_lookup.duplicates,
        ..JoinStats::default()
    };

    let mut records = Vec::with_capacity(line_items.len());
    for item in line_items {
        let sale = sale_lookup.get(item.id_venta.as_ref());
        let id_cliente = sale.and_then(|s| s.id_cliente.as_ref());
        let customer = customer_lookup.get(id_cliente);
        let product = product_lookup.get(item.id_producto.as_ref());

        if sale.is_none() {
            stats.unmatched_sales += 1;
        }
        if customer.is_none() {
            stats.unmatched_customers += 1;
        }
        if product.is_none() {
            stats.unmatched_products += 1;
        }

        records.push(MasterRecord {
            id_venta: item.id_venta.clone(),
            id_producto: item.id_producto.clone(),
            nombre_producto_detalle: item.nombre_producto.clone(),
            cantidad: item.cantidad,
            precio_unitario: item.precio_unitario,
            costo_unitario: item.costo_unitario,
            importe: item.importe,
            ganancia_bruta: item.ganancia_bruta,
            fecha_venta: sale.and_then(|s| s.fecha_venta.value()),
            id_cliente: id_cliente.cloned(),
            nombre_cliente_venta: sale.and_then(|s| s.nombre_cliente.clone()),
            email_venta: sale.and_then(|s| s.email.clone()),
            medio_pago: sale.and_then(|s| s.medio_pago.clone()),
            monto_total: sale.and_then(|s| s.monto_total),
            nombre_cliente: customer.and_then(|c| c.nombre_cliente.clone()),
            email: customer.and_then(|c| c.email.clone()),
            ciudad: customer.and_then(|c| c.ciudad.clone()),
            fecha_registro: customer.and_then(|c| c.fecha_registro.value()),
            nombre_producto: product.and_then(|p| p.nombre_producto.clone()),
            categoria: product.and_then(|p| p.categoria.clone()),
            precio_unitario_catalogo: product.and_then(|p| p.precio_unitario.clone()),
        });
    }

    if stats.unmatched_sales + stats.unmatched_customers + stats.unmatched_products > 0 {
        warn!(
            "Incomplete joins: {} line item(s) without a sale, {} without a customer, {} without a product",
            stats.unmatched_sales, stats.unmatched_customers, stats.unmatched_products
        );
    }
    info!("Join complete: {} master row(s)", records.len());
    Ok(MasterView { records, stats })
}
