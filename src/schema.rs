//! Statically declared schemas for the four source entities.
//!
//! Each [`Entity`] owns a fixed [`EntitySchema`]: the canonical (lowercase)
//! column names it understands, whether each is required, the kind of value
//! it carries, and the aliases that are folded into canonical names before
//! validation. Headers are validated exactly once per table, after
//! normalization, and resolved into a [`ColumnIndex`] that record decoding
//! reads through.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Customer,
    Product,
    Sale,
    LineItem,
}

impl Entity {
    /// Load order, which is also the order of the required file mapping.
    pub const ALL: [Entity; 4] = [
        Entity::Customer,
        Entity::Product,
        Entity::Sale,
        Entity::LineItem,
    ];

    /// Logical table name used in configuration and diagnostics.
    pub fn logical_name(self) -> &'static str {
        match self {
            Entity::Customer => "clientes",
            Entity::Product => "productos",
            Entity::Sale => "ventas",
            Entity::LineItem => "detalle",
        }
    }

    pub fn schema(self) -> &'static EntitySchema {
        match self {
            Entity::Customer => &CUSTOMER_SCHEMA,
            Entity::Product => &PRODUCT_SCHEMA,
            Entity::Sale => &SALE_SCHEMA,
            Entity::LineItem => &LINE_ITEM_SCHEMA,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.logical_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Key,
    Text,
    Decimal,
    Date,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnType::Key => "key",
            ColumnType::Text => "text",
            ColumnType::Decimal => "decimal",
            ColumnType::Date => "date",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub datatype: ColumnType,
    pub required: bool,
}

const fn required(name: &'static str, datatype: ColumnType) -> ColumnSpec {
    ColumnSpec {
        name,
        datatype,
        required: true,
    }
}

const fn optional(name: &'static str, datatype: ColumnType) -> ColumnSpec {
    ColumnSpec {
        name,
        datatype,
        required: false,
    }
}

/// Source column name that is renamed to a canonical one when present.
#[derive(Debug, Clone, Copy)]
pub struct ColumnAlias {
    pub alias: &'static str,
    pub canonical: &'static str,
}

#[derive(Debug)]
pub struct EntitySchema {
    pub entity: Entity,
    pub columns: &'static [ColumnSpec],
    pub aliases: &'static [ColumnAlias],
}

pub static CUSTOMER_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::Customer,
    columns: &[
        required("id_cliente", ColumnType::Key),
        required("nombre_cliente", ColumnType::Text),
        optional("email", ColumnType::Text),
        required("ciudad", ColumnType::Text),
        required("fecha_registro", ColumnType::Date),
    ],
    aliases: &[ColumnAlias {
        alias: "fecha_alta",
        canonical: "fecha_registro",
    }],
};

pub static PRODUCT_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::Product,
    columns: &[
        required("id_producto", ColumnType::Key),
        required("nombre_producto", ColumnType::Text),
        required("categoria", ColumnType::Text),
        optional("precio_unitario", ColumnType::Text),
    ],
    aliases: &[],
};

pub static SALE_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::Sale,
    columns: &[
        required("id_venta", ColumnType::Key),
        required("fecha_venta", ColumnType::Date),
        required("id_cliente", ColumnType::Key),
        optional("nombre_cliente", ColumnType::Text),
        optional("email", ColumnType::Text),
        required("medio_pago", ColumnType::Text),
    ],
    aliases: &[ColumnAlias {
        alias: "fecha",
        canonical: "fecha_venta",
    }],
};

pub static LINE_ITEM_SCHEMA: EntitySchema = EntitySchema {
    entity: Entity::LineItem,
    columns: &[
        required("id_venta", ColumnType::Key),
        required("id_producto", ColumnType::Key),
        optional("nombre_producto", ColumnType::Text),
        required("cantidad", ColumnType::Decimal),
        required("precio_unitario", ColumnType::Decimal),
        required("importe", ColumnType::Decimal),
    ],
    aliases: &[],
};

impl EntitySchema {
    /// Resolves every declared column against canonical headers.
    ///
    /// Returns the required columns that are absent; extra headers are
    /// ignored.
    pub fn resolve(&'static self, headers: &[String]) -> Result<ColumnIndex, Vec<&'static ColumnSpec>> {
        let positions = self
            .columns
            .iter()
            .map(|column| headers.iter().position(|h| h == column.name))
            .collect::<Vec<_>>();
        let missing = self
            .columns
            .iter()
            .zip(&positions)
            .filter(|(column, position)| column.required && position.is_none())
            .map(|(column, _)| column)
            .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(ColumnIndex {
                schema: self,
                positions,
            })
        } else {
            Err(missing)
        }
    }
}

/// Header positions of a validated table, aligned with its schema's columns.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    schema: &'static EntitySchema,
    positions: Vec<Option<usize>>,
}

impl ColumnIndex {
    pub fn position(&self, name: &str) -> Option<usize> {
        self.schema
            .columns
            .iter()
            .position(|c| c.name == name)
            .and_then(|idx| self.positions[idx])
    }

    /// Cell text for a declared column; empty when the column is optional
    /// and absent from the file, or when the row is short.
    pub fn cell<'a>(&self, row: &'a [String], name: &str) -> &'a str {
        self.position(name)
            .and_then(|idx| row.get(idx))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}
