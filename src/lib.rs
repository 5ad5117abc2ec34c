//! # Overlap-base: overlaps between sequence annotations using SQLite.
//!
//! This crate reads a table of sequence annotations, where each row assigns a location on a sequence to an annotation type.
//! Each (sequence, type) pair forms a group, which covers every location between the smallest and the largest observed location.
//! The groups are stored in an ephemeral SQLite database, and overlapping groups are found with a self-join over the locations.
//!
//! See [`AnnotationTable`] for loading the annotations and [`LocationRange`] and [`TypeGroup`] for the materialized groups.
//! See [`Storage`] and [`OverlapBase`] for the database interface.
//! See [`PositionIndex`] for an in-memory alternative to the database.
//! See [`overlap`] and [`report`] for turning the join results into a report.
//!
//! ### Basic concepts
//!
//! Sequences and annotation types are accessed by handles, which are positive integers assigned in the order the labels first appear in the input.
//! Each sequence corresponds to a row in table `Sequence`, each type to a row in table `SequenceType`, and each covered location to a row in table `SequenceTypeLocation`.
//! A type is identified in the output by its composite label `<sequence> <type>`.
//!
//! The overlap join reports every ordered pair of distinct types sharing a location, once per shared location.
//! Both orientations (A, B) and (B, A) are reported.
//! The join results are ordered by the label of A, then the handle of B, and finally the location.
//!
//! # Examples
//!
//! ```
//! use overlap_base::{AnnotationTable, Engine, Orientation};
//! use overlap_base::report;
//!
//! let csv = "id,sequence_id,type,location\n\
//!            1,chr1,exon,10\n\
//!            2,chr1,exon,15\n\
//!            3,chr1,intron,13\n\
//!            4,chr1,intron,20\n";
//! let table = AnnotationTable::from_reader(csv.as_bytes()).unwrap();
//! let summaries = overlap_base::find_overlaps(&table, Engine::Sqlite, Orientation::FirstSeen).unwrap();
//!
//! let mut output: Vec<u8> = Vec::new();
//! report::write_report(&summaries, &mut output).unwrap();
//! let output = String::from_utf8(output).unwrap();
//! assert_eq!(output, "Overlaps occur between:\nchr1 exon and chr1 intron at locations 13 to 15\n");
//! ```

pub mod db;
pub mod error;
pub mod loader;
pub mod overlap;
pub mod position_index;
pub mod range;
pub mod report;
pub mod utils;

pub use db::{JoinRow, OverlapBase, Storage};
pub use error::{Error, Result};
pub use loader::{Annotation, AnnotationTable, SequenceRecord, TypeRecord};
pub use overlap::{Orientation, OverlapSummary, ResolvedRow};
pub use position_index::PositionIndex;
pub use range::{LocationRange, TypeGroup};

use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

#[cfg(test)]
mod internal;


//-----------------------------------------------------------------------------

/// Engine used for finding the overlaps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Engine {
    /// Self-join in an ephemeral SQLite database.
    #[default]
    Sqlite,
    /// In-memory [`PositionIndex`].
    Memory,
}

impl Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Engine::Sqlite => write!(f, "sqlite"),
            Engine::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(Engine::Sqlite),
            "memory" => Ok(Engine::Memory),
            _ => Err(format!("Unknown engine: {} (expected sqlite or memory)", s)),
        }
    }
}

//-----------------------------------------------------------------------------

/// Finds the overlaps between the annotation types in the table.
///
/// With [`Engine::Sqlite`], the database is stored in a temporary file in the system temporary directory.
/// See [`find_overlaps_in`] for choosing the directory.
///
/// # Errors
///
/// Returns [`Error::Schema`] if the database cannot be created and [`Error::Query`] if the queries fail.
pub fn find_overlaps(table: &AnnotationTable, engine: Engine, orientation: Orientation) -> Result<Vec<OverlapSummary>> {
    match engine {
        Engine::Sqlite => {
            let storage = Storage::new()?;
            overlaps_from_database(table, &storage, orientation)
        },
        Engine::Memory => overlaps_from_index(table, orientation),
    }
}

/// Finds the overlaps using an SQLite database in a temporary file in the given directory.
///
/// The temporary file is removed before returning, whether the queries succeeded or not.
pub fn find_overlaps_in<P: AsRef<Path>>(table: &AnnotationTable, temp_dir: P, orientation: Orientation) -> Result<Vec<OverlapSummary>> {
    let storage = Storage::new_in(temp_dir)?;
    overlaps_from_database(table, &storage, orientation)
}

fn overlaps_from_database(table: &AnnotationTable, storage: &Storage, orientation: Orientation) -> Result<Vec<OverlapSummary>> {
    OverlapBase::create(storage, table)?;
    let database = OverlapBase::open(storage)?;
    if let Some(size) = database.file_size() {
        log::info!("Database size: {}", size);
    }
    let rows = database.overlap_join()?;
    let labels = database.type_labels()?;
    summarize_rows(&rows, &labels, orientation)
}

fn overlaps_from_index(table: &AnnotationTable, orientation: Orientation) -> Result<Vec<OverlapSummary>> {
    let index = PositionIndex::new(&table.groups());
    log::info!("Indexed {} positions", index.positions());
    let rows = index.overlap_join();
    let labels = index.type_labels();
    summarize_rows(&rows, &labels, orientation)
}

fn summarize_rows(rows: &[JoinRow], labels: &HashMap<usize, String>, orientation: Orientation) -> Result<Vec<OverlapSummary>> {
    log::info!("The overlap join returned {} rows", rows.len());
    let resolved = overlap::resolve(rows, labels)?;
    let summaries = overlap::summarize(&resolved, orientation);
    log::info!("Found {} overlapping pairs", summaries.len());
    Ok(summaries)
}

//-----------------------------------------------------------------------------
