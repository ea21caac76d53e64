use std::collections::HashMap;

use log::info;
use rust_decimal::Decimal;

use crate::{
    config::{PipelineConfig, RoundingMode},
    data::{Key, parse_decimal},
    error::{PipelineError, Result},
    join::TOTALS_JOIN,
    model::{LineItem, PricedLineItem, Sale},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsConfig {
    margin_factor: Decimal,
    /// `1 + margin_factor`, checked once at construction.
    cost_divisor: Decimal,
    rounding: RoundingMode,
}

impl MetricsConfig {
    pub fn new(margin_factor: Decimal, rounding: RoundingMode) -> Result<Self> {
        if margin_factor.is_sign_negative() {
            return Err(PipelineError::Config(format!(
                "margin factor must not be negative (found {margin_factor})"
            )));
        }
        let cost_divisor = Decimal::ONE.checked_add(margin_factor).ok_or_else(|| {
            PipelineError::Config(format!(
                "margin factor {margin_factor} is too large to derive a unit cost"
            ))
        })?;
        Ok(Self {
            margin_factor,
            cost_divisor,
            rounding,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.margin_factor, config.rounding)
    }

    /// `round(price / (1 + margin), 2)` under the configured convention.
    pub fn unit_cost(&self, unit_price: Decimal) -> Decimal {
        (unit_price / self.cost_divisor).round_dp_with_strategy(2, self.rounding.strategy())
    }
}

/// Derives `costo_unitario` and `ganancia_bruta` for every line item.
pub fn price_line_items(items: &[LineItem], config: &MetricsConfig) -> Result<Vec<PricedLineItem>> {
    let priced = items
        .iter()
        .map(|item| price_line_item(item, config))
        .collect::<Result<Vec<_>>>()?;
    info!(
        "Priced {} line item(s) with margin factor {}",
        priced.len(),
        config.margin_factor
    );
    Ok(priced)
}

pub fn price_line_item(item: &LineItem, config: &MetricsConfig) -> Result<PricedLineItem> {
    let cantidad = coerce(item, "cantidad", &item.cantidad)?;
    let precio_unitario = coerce(item, "precio_unitario", &item.precio_unitario)?;
    let importe = coerce(item, "importe", &item.importe)?;
    let costo_unitario = config.unit_cost(precio_unitario);
    let ganancia_bruta = costo_unitario
        .checked_mul(cantidad)
        .and_then(|cost| importe.checked_sub(cost))
        .ok_or_else(|| {
            metric_error(
                item,
                "ganancia_bruta",
                format!("{importe} - {costo_unitario} x {cantidad} (out of range)"),
            )
        })?;
    Ok(PricedLineItem {
        row: item.row,
        id_venta: item.id_venta.clone(),
        id_producto: item.id_producto.clone(),
        nombre_producto: item.nombre_producto.clone(),
        cantidad,
        precio_unitario,
        costo_unitario,
        importe,
        ganancia_bruta,
    })
}

fn coerce(item: &LineItem, column: &'static str, raw: &str) -> Result<Decimal> {
    parse_decimal(raw).map_err(|_| metric_error(item, column, raw.to_string()))
}

fn metric_error(item: &LineItem, column: &'static str, value: String) -> PipelineError {
    PipelineError::MetricComputation {
        column,
        row: item.row,
        id_venta: display_key(item.id_venta.as_ref()),
        id_producto: display_key(item.id_producto.as_ref()),
        value,
    }
}

fn display_key(key: Option<&Key>) -> String {
    key.map(Key::to_string).unwrap_or_else(|| "<empty>".to_string())
}

/// Sum of `importe` per sale id. Line items without a sale id are skipped.
pub fn sale_totals(items: &[PricedLineItem]) -> Result<HashMap<Key, Decimal>> {
    let mut totals: HashMap<Key, Decimal> = HashMap::new();
    for item in items {
        let Some(key) = &item.id_venta else {
            continue;
        };
        let total = totals.entry(key.clone()).or_insert(Decimal::ZERO);
        *total = total.checked_add(item.importe).ok_or_else(|| {
            PipelineError::MetricComputation {
                column: "importe",
                row: item.row,
                id_venta: key.to_string(),
                id_producto: display_key(item.id_producto.as_ref()),
                value: format!("{} (sale total out of range)", item.importe),
            }
        })?;
    }
    Ok(totals)
}

/// Left-joins the per-sale totals onto the sales table. Sales without any
/// line item keep `monto_total = None`.
pub fn attach_totals(sales: &[Sale], items: &[PricedLineItem]) -> Result<Vec<Sale>> {
    TOTALS_JOIN.check(
        items.iter().filter_map(|i| i.id_venta.as_ref()),
        sales.iter().filter_map(|s| s.id_venta.as_ref()),
    )?;
    let totals = sale_totals(items)?;
    let enriched = sales
        .iter()
        .map(|sale| Sale {
            monto_total: sale
                .id_venta
                .as_ref()
                .and_then(|key| totals.get(key))
                .copied(),
            ..sale.clone()
        })
        .collect::<Vec<_>>();
    let without_items = enriched.iter().filter(|s| s.monto_total.is_none()).count();
    info!(
        "Attached totals to {} sale(s); {} sale(s) have no line items",
        enriched.len() - without_items,
        without_items
    );
    Ok(enriched)
}
