//! Catalogue of standard orthogonal designs.
//!
//! A design is a `runs × factors` matrix of 1-based level indices in which
//! every pair of columns contains every pair of levels equally often. The
//! embedded catalogue holds the usual Taguchi designs:
//!
//! | Name | Runs | Levels | Factors |
//! |------|------|--------|---------|
//! | L4   | 4    | 2      | 3       |
//! | L8   | 8    | 2      | 7       |
//! | L9   | 9    | 3      | 4       |
//! | L12  | 12   | 2      | 11      |
//! | L16  | 16   | 2      | 15      |
//! | L16b | 16   | 4      | 5       |
//! | L25  | 25   | 5      | 6       |
//! | L27  | 27   | 3      | 13      |
//! | L32  | 32   | 2      | 31      |
//! | L49  | 49   | 7      | 8       |
//! | L64  | 64   | 8      | 9       |
//! | L81  | 81   | 9      | 10      |
//!
//! Designs are kept sorted by run count, so the first design that fits a
//! request is also the smallest.
//!
//! # Example
//!
//! ```
//! use casegen::catalogue::Catalogue;
//!
//! let catalogue = Catalogue::standard().unwrap();
//! let design = catalogue.select(3, 4).unwrap();
//! assert_eq!(design.name(), "L9");
//! assert_eq!(design.runs(), 9);
//! ```

mod verify;

pub use verify::{verify_strength, VerificationIssue, VerificationResult};

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use log::debug;
use ndarray::{Array2, ArrayView1};
use serde::Deserialize;

use crate::config::OrthogonalConfig;
use crate::error::{Error, Result};

/// The embedded standard catalogue.
const STANDARD_DESIGNS: &str = include_str!("../../data/designs.json");

/// Largest catalogue file accepted by [`Catalogue::load`].
const MAX_CATALOGUE_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// A named orthogonal design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Design {
    name: String,
    levels: u32,
    data: Array2<u32>,
}

impl Design {
    /// Create a design from a matrix of 1-based level indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalogue`] if the name is empty, `levels < 2`, the
    /// matrix is empty, or an entry lies outside `1..=levels`.
    pub fn new(name: impl Into<String>, levels: u32, data: Array2<u32>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::catalogue("design name must not be empty"));
        }
        if levels < 2 {
            return Err(Error::catalogue(format!(
                "design {name}: levels must be at least 2"
            )));
        }
        if data.is_empty() {
            return Err(Error::catalogue(format!("design {name} has no entries")));
        }
        if let Some(((row, col), value)) = data
            .indexed_iter()
            .find(|(_, &value)| value == 0 || value > levels)
        {
            return Err(Error::catalogue(format!(
                "design {name}: entry {value} at ({row}, {col}) is outside 1..={levels}"
            )));
        }
        Ok(Self { name, levels, data })
    }

    /// The design name, e.g. `L9`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of levels of every column.
    #[must_use]
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// Number of columns.
    #[must_use]
    pub fn factors(&self) -> usize {
        self.data.ncols()
    }

    /// Number of rows.
    #[must_use]
    pub fn runs(&self) -> usize {
        self.data.nrows()
    }

    /// Level index at `(row, col)`, 1-based.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.data[[row, col]]
    }

    /// View of a column.
    #[must_use]
    pub fn column(&self, col: usize) -> ArrayView1<'_, u32> {
        self.data.column(col)
    }

    /// The underlying matrix.
    #[must_use]
    pub fn data(&self) -> &Array2<u32> {
        &self.data
    }
}

/// On-disk form of a design.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DesignRecord {
    name: String,
    levels: u32,
    factors: usize,
    array: Vec<Vec<u32>>,
}

impl TryFrom<DesignRecord> for Design {
    type Error = Error;

    fn try_from(record: DesignRecord) -> Result<Self> {
        let DesignRecord {
            name,
            levels,
            factors,
            array,
        } = record;

        let runs = array.len();
        if let Some(row) = array.iter().position(|row| row.len() != factors) {
            return Err(Error::catalogue(format!(
                "design {name}: row {row} does not have {factors} columns"
            )));
        }
        let data = Array2::from_shape_vec((runs, factors), array.into_iter().flatten().collect())
            .map_err(|err| Error::catalogue(format!("design {name}: {err}")))?;
        Self::new(name, levels, data)
    }
}

/// An immutable set of designs, sorted by run count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalogue {
    designs: Vec<Design>,
}

impl Catalogue {
    /// Build a catalogue.
    ///
    /// Designs are ordered by run count; designs with equal run counts keep
    /// their given order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalogue`] if two designs share a name.
    pub fn new(mut designs: Vec<Design>) -> Result<Self> {
        let mut names = HashSet::new();
        if let Some(duplicate) = designs.iter().find(|d| !names.insert(d.name.as_str())) {
            return Err(Error::catalogue(format!(
                "duplicate design name {}",
                duplicate.name
            )));
        }
        designs.sort_by_key(Design::runs);
        Ok(Self { designs })
    }

    /// The embedded standard catalogue, parsed once and shared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalogue`] if the embedded data is malformed.
    pub fn standard() -> Result<Arc<Self>> {
        static STANDARD: OnceLock<Result<Arc<Catalogue>>> = OnceLock::new();
        STANDARD
            .get_or_init(|| Self::from_json_str(STANDARD_DESIGNS, false).map(Arc::new))
            .clone()
    }

    /// Parse a catalogue from its JSON form, an array of
    /// `{ "name", "levels", "factors", "array" }` records.
    ///
    /// With `verify` set, every design must also be strength-2 orthogonal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalogue`] if the document is malformed or a design
    /// fails validation.
    pub fn from_json_str(text: &str, verify: bool) -> Result<Self> {
        let records: Vec<DesignRecord> =
            serde_json::from_str(text).map_err(|err| Error::catalogue(err.to_string()))?;
        let designs = records
            .into_iter()
            .map(Design::try_from)
            .collect::<Result<Vec<_>>>()?;

        if verify {
            for design in &designs {
                let report = verify_strength(design, 2);
                if !report.is_valid {
                    return Err(Error::catalogue(format!(
                        "design {} is not orthogonal (verified strength {})",
                        design.name, report.actual_strength
                    )));
                }
            }
        }
        Self::new(designs)
    }

    /// Load a catalogue file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Catalogue`] if the file cannot be read, is too large
    /// or fails [`Catalogue::from_json_str`].
    pub fn load(path: &Path, verify: bool) -> Result<Self> {
        let metadata = fs::metadata(path)
            .map_err(|err| Error::catalogue(format!("{}: {err}", path.display())))?;
        if metadata.len() > MAX_CATALOGUE_FILE_SIZE {
            return Err(Error::catalogue(format!(
                "{} exceeds size limit",
                path.display()
            )));
        }
        let text = fs::read_to_string(path)
            .map_err(|err| Error::catalogue(format!("{}: {err}", path.display())))?;
        let catalogue = Self::from_json_str(&text, verify)?;
        debug!(
            "loaded {} design(s) from {}",
            catalogue.len(),
            path.display()
        );
        Ok(catalogue)
    }

    /// The catalogue selected by the settings: the configured file, or the
    /// standard catalogue.
    ///
    /// # Errors
    ///
    /// See [`Catalogue::load`] and [`Catalogue::standard`].
    pub fn from_config(config: &OrthogonalConfig) -> Result<Arc<Self>> {
        match &config.catalogue {
            Some(path) => Self::load(path, config.verify_catalogue).map(Arc::new),
            None => Self::standard(),
        }
    }

    /// The smallest design with exactly `levels` levels and room for at
    /// least `factors` columns.
    #[must_use]
    pub fn select(&self, levels: u32, factors: usize) -> Option<&Design> {
        self.designs
            .iter()
            .find(|d| d.levels == levels && d.factors() >= factors)
    }

    /// Look up a design by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Design> {
        self.designs.iter().find(|d| d.name == name)
    }

    /// Iterate over the designs in run-count order.
    pub fn iter(&self) -> impl Iterator<Item = &Design> {
        self.designs.iter()
    }

    /// Number of designs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.designs.len()
    }

    /// Whether the catalogue holds no design.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.designs.is_empty()
    }
}
