#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use sales_etl::config::{PipelineConfig, SourceFiles};
use tempfile::{TempDir, tempdir};

pub const CLIENTES_CSV: &str = "\
id_cliente,nombre_cliente,email,ciudad,fecha_alta
1,Ana Perez,ana@example.com,Cordoba,2023-01-15
2,Luis Gomez,luis@example.com,Rosario,2023-02-20
3,Marta Diaz,marta@example.com,Mendoza,2023-03-05
";

pub const PRODUCTOS_CSV: &str = "\
id_producto,nombre_producto,categoria,precio_unitario
10,Yerba Mate,Bebidas,100.00
11,Alfajor,Alimentos,2.50
12,Dulce de Leche,Alimentos,8.00
";

pub const VENTAS_CSV: &str = "\
id_venta,fecha,id_cliente,nombre_cliente,email,medio_pago
100,2024-01-10,1,Ana Perez,ana@example.com,tarjeta
101,2024-01-11,2,Luis Gomez,luis@example.com,efectivo
102,2024-01-12,3,Marta Diaz,marta@example.com,qr
";

pub const DETALLE_CSV: &str = "\
id_venta,id_producto,nombre_producto,cantidad,precio_unitario,importe
100,10,Yerba Mate,2,100.00,200.00
100,11,Alfajor,4,2.50,10.00
101,12,Dulce de Leche,1,8.00,8.00
";

/// One cell of a generated workbook.
#[derive(Debug, Clone, Copy)]
pub enum SheetCell {
    Text(&'static str),
    Number(f64),
    /// Excel serial day number, stored with a date number format.
    Date(f64),
}

/// File names of the CSV rendition of the sample dataset.
pub fn csv_files() -> SourceFiles {
    SourceFiles {
        clientes: "Clientes.csv".to_string(),
        productos: "Productos.csv".to_string(),
        ventas: "Ventas.csv".to_string(),
        detalle: "Detalle_ventas.csv".to_string(),
    }
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` under the workspace, creating parent directories.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes the four sample CSV files into `dir` (relative to the root).
    pub fn write_dataset(&self, dir: &str) -> PathBuf {
        self.write_tables(dir, CLIENTES_CSV, PRODUCTOS_CSV, VENTAS_CSV, DETALLE_CSV)
    }

    pub fn write_tables(
        &self,
        dir: &str,
        clientes: &str,
        productos: &str,
        ventas: &str,
        detalle: &str,
    ) -> PathBuf {
        let files = csv_files();
        let join = |name: &str| {
            if dir.is_empty() {
                name.to_string()
            } else {
                format!("{dir}/{name}")
            }
        };
        self.write(&join(&files.clientes), clientes);
        self.write(&join(&files.productos), productos);
        self.write(&join(&files.ventas), ventas);
        self.write(&join(&files.detalle), detalle);
        self.path().join(dir)
    }

    /// Writes `rows` into the first worksheet of a new `.xlsx` workbook.
    pub fn write_workbook(&self, name: &str, rows: &[Vec<SheetCell>]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut book = umya_spreadsheet::new_file();
        let sheet = book
            .get_sheet_by_name_mut("Sheet1")
            .expect("default worksheet");
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                let cell = sheet.get_cell_mut((col_idx as u32 + 1, row_idx as u32 + 1));
                match *value {
                    SheetCell::Text(text) => {
                        cell.set_value_string(text);
                    }
                    SheetCell::Number(number) => {
                        cell.set_value_number(number);
                    }
                    SheetCell::Date(serial) => {
                        cell.set_value_number(serial);
                        cell.get_style_mut()
                            .get_number_format_mut()
                            .set_format_code("yyyy-mm-dd");
                    }
                }
            }
        }
        umya_spreadsheet::writer::xlsx::write(&book, &path).expect("write workbook");
        path
    }

    /// Configuration that reads the CSV dataset from the workspace root.
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig {
            working_dir: Some(self.path().to_path_buf()),
            search_path: vec![PathBuf::from(".")],
            files: csv_files(),
            ..PipelineConfig::default()
        }
    }
}
