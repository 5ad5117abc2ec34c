use crate::{Annotation, AnnotationTable, OverlapBase, Storage, JoinRow};
use crate::utils;

use std::collections::HashMap;

//-----------------------------------------------------------------------------

// Loading annotations.

pub(crate) fn load_table(filename: &'static str) -> AnnotationTable {
    let csv_file = utils::get_test_data(filename);
    let table = AnnotationTable::from_file(&csv_file);
    assert!(table.is_ok(), "Failed to load annotations from {}: {}", csv_file.display(), table.unwrap_err());
    table.unwrap()
}

pub(crate) fn load_sample_data() -> AnnotationTable {
    load_table("sample_sequencing_data.csv")
}

// Builds a table from (sequence, type, location) triples.
pub(crate) fn table_from(rows: &[(&str, &str, i64)]) -> AnnotationTable {
    AnnotationTable::from_annotations(
        rows.iter().map(|(sequence, type_name, location)| Annotation::new(sequence, type_name, *location))
    )
}

// Builds a table with one annotation at each end of each range.
pub(crate) fn table_from_ranges(ranges: &[(&str, &str, i64, i64)]) -> AnnotationTable {
    let mut rows = Vec::new();
    for (sequence, type_name, start, end) in ranges.iter() {
        rows.push((*sequence, *type_name, *start));
        rows.push((*sequence, *type_name, *end));
    }
    table_from(&rows)
}

//-----------------------------------------------------------------------------

// Overlap-base utilities.

pub(crate) fn create_storage() -> Storage {
    let storage = Storage::new();
    assert!(storage.is_ok(), "Failed to create storage: {}", storage.unwrap_err());
    storage.unwrap()
}

pub(crate) fn create_database(table: &AnnotationTable) -> Storage {
    let storage = create_storage();
    let result = OverlapBase::create(&storage, table);
    assert!(result.is_ok(), "Failed to create database: {}", result.unwrap_err());
    storage
}

pub(crate) fn open_database(storage: &Storage) -> OverlapBase<'_> {
    let database = OverlapBase::open(storage);
    assert!(database.is_ok(), "Failed to open database: {}", database.unwrap_err());
    database.unwrap()
}

pub(crate) fn overlap_join(database: &OverlapBase) -> Vec<JoinRow> {
    let rows = database.overlap_join();
    assert!(rows.is_ok(), "Overlap join failed: {}", rows.unwrap_err());
    rows.unwrap()
}

pub(crate) fn type_labels(database: &OverlapBase) -> HashMap<usize, String> {
    let labels = database.type_labels();
    assert!(labels.is_ok(), "Failed to get type labels: {}", labels.unwrap_err());
    labels.unwrap()
}

//-----------------------------------------------------------------------------

// Expected results for the sample data.

// Ranges: chr1 exon 10-15 (1), chr1 intron 13-20 (2), chr1 promoter 1-5 (3), chr2 exon 14-18 (4), chr2 utr 30-35 (5).
pub(crate) const SAMPLE_LOCATIONS: usize = 30;

pub(crate) fn sample_join_rows() -> Vec<JoinRow> {
    let mut result = Vec::new();
    let blocks: [(&str, usize, i64, i64); 6] = [
        ("chr1 exon", 2, 13, 15),
        ("chr1 exon", 4, 14, 15),
        ("chr1 intron", 1, 13, 15),
        ("chr1 intron", 4, 14, 18),
        ("chr2 exon", 1, 14, 15),
        ("chr2 exon", 2, 14, 18),
    ];
    for (label, match_handle, start, end) in blocks {
        for location in start..=end {
            result.push(JoinRow::new(label, match_handle, location));
        }
    }
    result
}

pub(crate) const SAMPLE_REPORT: &str = "Overlaps occur between:
chr1 exon and chr1 intron at locations 13 to 15
chr1 exon and chr2 exon at locations 14 to 15
chr1 intron and chr2 exon at locations 14 to 18
";

//-----------------------------------------------------------------------------
