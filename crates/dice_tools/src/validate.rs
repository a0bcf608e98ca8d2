//! Catalog validation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use dice_core::data::{Catalog, UnlockCondition};
use dice_core::error::CatalogError;

/// Errors from the validation tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file or directory could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The catalog did not parse or failed its consistency checks.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Counts reported for a valid catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    /// Number of die tiers.
    pub tiers: usize,
    /// Number of skills.
    pub skills: usize,
    /// Number of legacy upgrades.
    pub upgrades: usize,
    /// Skills with no prerequisites.
    pub root_skills: Vec<String>,
    /// Skills that unlock a tier.
    pub unlock_skills: Vec<String>,
}

impl CatalogSummary {
    /// Summarize a catalog.
    #[must_use]
    pub fn of(catalog: &Catalog) -> Self {
        Self {
            tiers: catalog.tiers.len(),
            skills: catalog.skills.len(),
            upgrades: catalog.upgrades.len(),
            root_skills: catalog
                .skills
                .iter()
                .filter(|s| s.prerequisites.is_empty())
                .map(|s| s.id.clone())
                .collect(),
            unlock_skills: catalog
                .tiers
                .iter()
                .filter_map(|t| match &t.unlocked_by {
                    UnlockCondition::Skill(id) => Some(id.clone()),
                    UnlockCondition::Start => None,
                })
                .collect(),
        }
    }
}

/// Parse and validate a single RON catalog file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not parse, or fails
/// validation. Validation errors carry every problem found.
pub fn validate_catalog_file(path: &Path) -> Result<CatalogSummary, ToolError> {
    let text = fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = Catalog::from_ron_str(&path.display().to_string(), &text)?;
    let summary = CatalogSummary::of(&catalog);
    debug!("{}: {:?}", path.display(), summary);
    Ok(summary)
}

/// Validate every `.ron` file in a directory, in file name order.
///
/// # Errors
///
/// Returns an error only if the directory itself cannot be read. Per-file
/// failures are reported in the returned list.
pub fn validate_data_directory(
    dir: &Path,
) -> Result<Vec<(PathBuf, Result<CatalogSummary, ToolError>)>, ToolError> {
    let io_err = |source| ToolError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();

    info!("Validating {} catalog files in {}", files.len(), dir.display());
    Ok(files
        .into_iter()
        .map(|path| {
            let result = validate_catalog_file(&path);
            (path, result)
        })
        .collect())
}

/// Validate a file or every catalog in a directory.
///
/// # Errors
///
/// Returns the first failure.
pub fn validate_path(path: &Path) -> Result<Vec<(PathBuf, CatalogSummary)>, ToolError> {
    if path.is_dir() {
        validate_data_directory(path)?
            .into_iter()
            .map(|(p, result)| result.map(|summary| (p, summary)))
            .collect()
    } else {
        Ok(vec![(path.to_path_buf(), validate_catalog_file(path)?)])
    }
}
