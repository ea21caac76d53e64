use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use criterion::{Criterion, criterion_group, criterion_main};
use sales_etl::config::{PipelineConfig, SourceFiles};
use sales_etl::pipeline;
use tempfile::TempDir;

const CUSTOMERS: usize = 500;
const PRODUCTS: usize = 200;
const SALES: usize = 5_000;
const LINES_PER_SALE: usize = 4;

fn write_file(dir: &Path, name: &str, header: &str, rows: impl Iterator<Item = String>) {
    let mut file = File::create(dir.join(name)).expect("create csv");
    writeln!(file, "{header}").expect("header");
    for row in rows {
        writeln!(file, "{row}").expect("row");
    }
}

fn generate_dataset() -> (TempDir, PipelineConfig) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let dir = temp_dir.path();
    write_file(
        dir,
        "Clientes.csv",
        "id_cliente,nombre_cliente,email,ciudad,fecha_alta",
        (1..=CUSTOMERS).map(|i| {
            format!("{i},Cliente {i},c{i}@example.com,Ciudad {},2023-{:02}-01", i % 20, i % 12 + 1)
        }),
    );
    write_file(
        dir,
        "Productos.csv",
        "id_producto,nombre_producto,categoria,precio_unitario",
        (1..=PRODUCTS).map(|i| format!("{i},Producto {i},Categoria {},{}.50", i % 7, i % 90 + 1)),
    );
    write_file(
        dir,
        "Ventas.csv",
        "id_venta,fecha,id_cliente,nombre_cliente,email,medio_pago",
        (1..=SALES).map(|i| {
            let cliente = i % CUSTOMERS + 1;
            format!(
                "{i},2024-{:02}-{:02},{cliente},Cliente {cliente},c{cliente}@example.com,efectivo",
                i % 12 + 1,
                i % 28 + 1
            )
        }),
    );
    write_file(
        dir,
        "Detalle_ventas.csv",
        "id_venta,id_producto,nombre_producto,cantidad,precio_unitario,importe",
        (0..SALES * LINES_PER_SALE).map(|n| {
            let venta = n / LINES_PER_SALE + 1;
            let producto = n % PRODUCTS + 1;
            let cantidad = n % 5 + 1;
            let precio = producto % 90 + 1;
            format!(
                "{venta},{producto},Producto {producto},{cantidad},{precio}.50,{}",
                (precio * 100 + 50) * cantidad / 100
            )
        }),
    );

    let config = PipelineConfig {
        working_dir: Some(dir.to_path_buf()),
        search_path: vec![PathBuf::from(".")],
        files: SourceFiles {
            clientes: "Clientes.csv".to_string(),
            productos: "Productos.csv".to_string(),
            ventas: "Ventas.csv".to_string(),
            detalle: "Detalle_ventas.csv".to_string(),
        },
        ..PipelineConfig::default()
    };
    (temp_dir, config)
}

fn bench_pipeline(c: &mut Criterion) {
    let (_guard, config) = generate_dataset();
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);
    group.bench_function("csv_20k_line_items", |b| {
        b.iter(|| {
            let output = pipeline::run(&config).expect("pipeline run");
            assert_eq!(output.view.len(), SALES * LINES_PER_SALE);
        })
    });
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
