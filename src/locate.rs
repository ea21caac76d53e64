//! Resolution of the directory that holds the four source files.
//!
//! Candidates are probed in order and the first directory containing every
//! required file wins. When none qualifies the caller receives a
//! [`LocatorReport`] describing, per candidate, which files were found and
//! which were missing, plus the tabular files sitting in the working
//! directory. That report is the only recovery aid an operator gets, so it
//! is always complete: probing never stops at the first missing file.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use log::{debug, info};

use crate::{
    config::SourceFiles,
    error::{PipelineError, Result},
    io_utils,
    schema::Entity,
};

/// Full paths of the four source files inside the resolved directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub directory: PathBuf,
    pub clientes: PathBuf,
    pub productos: PathBuf,
    pub ventas: PathBuf,
    pub detalle: PathBuf,
}

impl SourcePaths {
    fn new(directory: PathBuf, files: &SourceFiles) -> Self {
        Self {
            clientes: directory.join(&files.clientes),
            productos: directory.join(&files.productos),
            ventas: directory.join(&files.ventas),
            detalle: directory.join(&files.detalle),
            directory,
        }
    }

    pub fn get(&self, entity: Entity) -> &Path {
        match entity {
            Entity::Customer => &self.clientes,
            Entity::Product => &self.productos,
            Entity::Sale => &self.ventas,
            Entity::LineItem => &self.detalle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryProbe {
    /// Search-path entry as configured.
    pub candidate: PathBuf,
    /// Entry resolved against the working directory.
    pub directory: PathBuf,
    pub exists: bool,
    pub found: Vec<String>,
    pub missing: Vec<String>,
}

impl DirectoryProbe {
    pub fn is_complete(&self) -> bool {
        self.exists && self.missing.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorReport {
    pub working_dir: PathBuf,
    pub expected: Vec<String>,
    pub probes: Vec<DirectoryProbe>,
    /// Tabular files in the working directory, sorted by name.
    pub working_dir_files: Vec<String>,
    pub listing_error: Option<String>,
}

/// Returns the first candidate directory holding every required file.
pub fn locate(working_dir: &Path, search_path: &[PathBuf], files: &SourceFiles) -> Result<SourcePaths> {
    let mut probes = Vec::with_capacity(search_path.len());
    for candidate in search_path {
        let probe = probe_directory(working_dir, candidate, files);
        debug!(
            "Probed {:?}: found [{}], missing [{}]",
            probe.directory,
            probe.found.join(", "),
            probe.missing.join(", ")
        );
        if probe.is_complete() {
            info!("Using data directory {:?}", probe.directory);
            return Ok(SourcePaths::new(probe.directory, files));
        }
        probes.push(probe);
    }

    let (working_dir_files, listing_error) = match list_tabular_files(working_dir) {
        Ok(found) => (found, None),
        Err(err) => (Vec::new(), Some(err.to_string())),
    };
    Err(PipelineError::DataNotFound(Box::new(LocatorReport {
        working_dir: working_dir.to_path_buf(),
        expected: files.names().into_iter().map(str::to_string).collect(),
        probes,
        working_dir_files,
        listing_error,
    })))
}

pub fn probe_directory(working_dir: &Path, candidate: &Path, files: &SourceFiles) -> DirectoryProbe {
    let directory = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        working_dir.join(candidate)
    };
    let exists = directory.is_dir();
    let (found, missing): (Vec<String>, Vec<String>) = files
        .names()
        .into_iter()
        .map(str::to_string)
        .partition(|name| exists && directory.join(name).is_file());
    DirectoryProbe {
        candidate: candidate.to_path_buf(),
        directory,
        exists,
        found,
        missing,
    }
}

pub fn list_tabular_files(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && io_utils::has_tabular_extension(&path) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

impl fmt::Display for LocatorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "No candidate directory contains all required files ({})",
            self.expected.join(", ")
        )?;
        writeln!(f, "Working directory: {}", self.working_dir.display())?;

        writeln!(f, "Tabular files in the working directory:")?;
        match (&self.listing_error, self.working_dir_files.is_empty()) {
            (Some(err), _) => writeln!(f, "  (cannot list directory: {err})")?,
            (None, true) => writeln!(f, "  (none with a {} extension)", tabular_extensions())?,
            (None, false) => {
                for name in &self.working_dir_files {
                    writeln!(f, "  - {name}")?;
                }
            }
        }

        writeln!(f, "Searched directories:")?;
        for probe in &self.probes {
            write!(f, "  {} ({})", probe.candidate.display(), probe.directory.display())?;
            if !probe.exists {
                writeln!(f, ": directory does not exist")?;
                continue;
            }
            writeln!(f)?;
            writeln!(f, "      found:   {}", or_none(&probe.found))?;
            writeln!(f, "      missing: {}", or_none(&probe.missing))?;
        }

        writeln!(f, "How to fix:")?;
        writeln!(
            f,
            "  1. Copy {} into {}",
            self.expected.iter().join(", "),
            self.working_dir.display()
        )?;
        writeln!(f, "  2. Or create a 'BaseDatos' folder there and place the files inside it")?;
        write!(
            f,
            "  3. Or run from the directory that holds the files (or pass --search-path)"
        )
    }
}

fn tabular_extensions() -> String {
    io_utils::SPREADSHEET_EXTENSIONS
        .iter()
        .chain(io_utils::DELIMITED_EXTENSIONS)
        .map(|ext| format!(".{ext}"))
        .join(", ")
}

fn or_none(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.iter().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_names_every_readable_extension() {
        let report = LocatorReport {
            working_dir: PathBuf::from("/data"),
            expected: vec!["Clientes.xlsx".to_string()],
            probes: Vec::new(),
            working_dir_files: Vec::new(),
            listing_error: None,
        };
        let message = report.to_string();
        for ext in io_utils::SPREADSHEET_EXTENSIONS
            .iter()
            .chain(io_utils::DELIMITED_EXTENSIONS)
        {
            assert!(message.contains(&format!(".{ext}")), "missing .{ext}");
        }
        assert!(message.contains(".xlsm, .xlsb"));
    }
}
