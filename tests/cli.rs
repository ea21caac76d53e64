mod common;

use std::str::FromStr;

use assert_cmd::Command;
use common::{CLIENTES_CSV, DETALLE_CSV, PRODUCTOS_CSV, TestWorkspace, VENTAS_CSV};
use predicates::prelude::*;
use predicates::str::contains;
use rust_decimal::Decimal;

fn sales_etl() -> Command {
    Command::cargo_bin("sales-etl").expect("binary exists")
}

const CSV_FLAGS: [&str; 8] = [
    "--clientes",
    "Clientes.csv",
    "--productos",
    "Productos.csv",
    "--ventas",
    "Ventas.csv",
    "--detalle",
    "Detalle_ventas.csv",
];

#[test]
fn columns_lists_the_master_catalogue() {
    sales_etl()
        .arg("columns")
        .assert()
        .success()
        .stdout(contains("nombre_producto_detalle"))
        .stdout(contains("precio_unitario_catalogo"))
        .stdout(contains("monto_total"));
}

#[test]
fn locate_prints_the_resolved_files() {
    let workspace = TestWorkspace::new();
    workspace.write_dataset("BaseDatos");

    sales_etl()
        .current_dir(workspace.path())
        .arg("locate")
        .args(CSV_FLAGS)
        .assert()
        .success()
        .stdout(contains("BaseDatos"))
        .stdout(contains("detalle:"))
        .stdout(contains("Detalle_ventas.csv"));
}

#[test]
fn locate_failure_prints_diagnostic_and_exits_nonzero() {
    let workspace = TestWorkspace::new();
    workspace.write("Clientes.xlsx.bak", "stale");

    sales_etl()
        .arg("locate")
        .arg("--working-dir")
        .arg(workspace.path())
        .args(["--search-path", "."])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("error:"))
        .stderr(contains("Clientes.xlsx"))
        .stderr(contains("How to fix"));
}

#[test]
fn run_prints_summary_and_preview() {
    let workspace = TestWorkspace::new();
    workspace.write_dataset("");

    sales_etl()
        .current_dir(workspace.path())
        .args(["run", "--rows", "2"])
        .args(CSV_FLAGS)
        .assert()
        .success()
        .stdout(contains("master rows"))
        .stdout(contains("218.00"))
        .stdout(contains("50.33"))
        .stdout(contains("nombre_cliente_venta"))
        .stdout(contains("Dulce de Leche").not());
}

#[test]
fn run_json_emits_one_object_per_line_item() {
    let workspace = TestWorkspace::new();
    workspace.write_dataset("");

    let output = sales_etl()
        .args(["run", "--json", "--working-dir"])
        .arg(workspace.path())
        .args(["--search-path", "."])
        .args(CSV_FLAGS)
        .output()
        .expect("run binary");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let rows = stdout
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).expect("json line"))
        .collect::<Vec<_>>();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["id_venta"], serde_json::json!(100));
    assert_eq!(rows[0]["costo_unitario"], serde_json::json!("76.92"));
    assert_eq!(rows[0]["ganancia_bruta"], serde_json::json!("46.16"));
    assert_eq!(rows[0]["fecha_venta"], serde_json::json!("2024-01-10"));
}

#[test]
fn config_file_supplies_files_and_margin() {
    let workspace = TestWorkspace::new();
    workspace.write_tables("datos", CLIENTES_CSV, PRODUCTOS_CSV, VENTAS_CSV, DETALLE_CSV);
    let config = workspace.write(
        "pipeline.yaml",
        "search_path: [datos]\nmargin_factor: 0\nfiles:\n  clientes: Clientes.csv\n  productos: Productos.csv\n  ventas: Ventas.csv\n  detalle: Detalle_ventas.csv\n",
    );

    let output = sales_etl()
        .current_dir(workspace.path())
        .args(["run", "--json", "--config"])
        .arg(&config)
        .output()
        .expect("run binary");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let first: serde_json::Value =
        serde_json::from_str(stdout.lines().next().expect("first line")).expect("json");
    let cost = first["costo_unitario"].as_str().expect("decimal string");
    assert_eq!(Decimal::from_str(cost).expect("decimal"), Decimal::from(100));
}

#[test]
fn negative_margin_flag_is_rejected() {
    let workspace = TestWorkspace::new();
    workspace.write_dataset("");

    sales_etl()
        .current_dir(workspace.path())
        .args(["run", "--margin=-0.5"])
        .args(CSV_FLAGS)
        .assert()
        .failure()
        .stderr(contains("margin factor must not be negative"));
}
