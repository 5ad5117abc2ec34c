//! Loading sequence annotations from CSV files.

use crate::{Error, Result, LocationRange, TypeGroup};
use crate::utils;

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use log::{debug, info, warn};
use serde::Deserialize;

//-----------------------------------------------------------------------------

/// A single annotation: a location on a sequence belonging to an annotation type.
///
/// This is a row of the input table.
/// Any other columns in the input, such as a row identifier, are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Annotation {
    /// Sequence name.
    pub sequence_id: String,
    /// Annotation type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Location on the sequence.
    pub location: i64,
}

impl Annotation {
    /// Creates a new annotation.
    pub fn new(sequence_id: &str, type_name: &str, location: i64) -> Self {
        Annotation {
            sequence_id: sequence_id.to_string(),
            type_name: type_name.to_string(),
            location,
        }
    }
}

/// Distinct annotation types observed on a sequence, in the order they were first encountered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceRecord {
    pub name: String,
    pub types: Vec<TypeRecord>,
}

/// Distinct locations observed for an annotation type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeRecord {
    pub name: String,
    pub locations: BTreeSet<i64>,
}

impl TypeRecord {
    /// Returns the range covering the observed locations, or [`None`] if there are none.
    pub fn range(&self) -> Option<LocationRange> {
        let start = self.locations.first()?;
        let end = self.locations.last()?;
        LocationRange::new(*start, *end)
    }
}

//-----------------------------------------------------------------------------

/// Deduplicated sequence annotations grouped by sequence and type.
///
/// Sequences are listed in the order their names were first encountered.
/// Within a sequence, types are listed in the order they were first encountered on that sequence.
/// Duplicate (sequence, type, location) rows are collapsed.
///
/// # Examples
///
/// ```
/// use overlap_base::AnnotationTable;
///
/// let csv = "id,sequence_id,type,location\n\
///            1,chr2,gene,5\n\
///            2,chr1,exon,10\n\
///            3,chr2,gene,5\n\
///            4,chr2,gene,9\n";
/// let table = AnnotationTable::from_reader(csv.as_bytes()).unwrap();
/// assert_eq!(table.raw_rows(), 4);
/// assert_eq!(table.len(), 3);
///
/// let groups = table.groups();
/// assert_eq!(groups.len(), 2);
/// assert_eq!(groups[0].label(), "chr2 gene");
/// assert_eq!(groups[0].len(), 5);
/// assert_eq!(groups[1].label(), "chr1 exon");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnotationTable {
    sequences: Vec<SequenceRecord>,
    raw_rows: usize,
    len: usize,
}

/// Required columns in the input.
pub const REQUIRED_COLUMNS: [&str; 3] = ["sequence_id", "type", "location"];

impl AnnotationTable {
    /// Loads the annotations from a CSV file, which may be gzip-compressed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the file cannot be opened or if [`AnnotationTable::from_reader`] fails.
    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self> {
        info!("Loading annotations from {}", filename.as_ref().display());
        let reader = utils::open_file(&filename).map_err(|x| {
            Error::Load(format!("{}: {}", filename.as_ref().display(), x))
        })?;
        Self::from_reader(reader)
    }

    /// Loads the annotations from CSV data with a header line.
    ///
    /// Fields are trimmed of surrounding whitespace.
    /// Columns other than `sequence_id`, `type`, and `location` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the data is not valid CSV, a required column is missing, or a location is not an integer.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers().map_err(Error::load)?;
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|header| header == column) {
                return Err(Error::Load(format!("Missing column: {}", column)));
            }
        }

        let mut builder = TableBuilder::default();
        for row in reader.deserialize() {
            let annotation: Annotation = row.map_err(Error::load)?;
            builder.insert(annotation);
        }
        let table = builder.build();
        info!("Loaded {} distinct annotations from {} rows", table.len(), table.raw_rows());

        Ok(table)
    }

    /// Builds the table from the given annotations.
    pub fn from_annotations<I: IntoIterator<Item = Annotation>>(annotations: I) -> Self {
        let mut builder = TableBuilder::default();
        for annotation in annotations {
            builder.insert(annotation);
        }
        builder.build()
    }

    /// Returns the sequences with their annotation types.
    #[inline]
    pub fn sequences(&self) -> &[SequenceRecord] {
        &self.sequences
    }

    /// Returns the number of input rows, including duplicates.
    #[inline]
    pub fn raw_rows(&self) -> usize {
        self.raw_rows
    }

    /// Returns the number of distinct annotations.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no annotations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of distinct annotation types over all sequences.
    pub fn types(&self) -> usize {
        self.sequences.iter().map(|sequence| sequence.types.len()).sum()
    }

    /// Returns the annotation types with their materialized ranges.
    ///
    /// Sequence handles and type handles are assigned starting from 1 in enumeration order.
    pub fn groups(&self) -> Vec<TypeGroup> {
        let mut result = Vec::with_capacity(self.types());
        for (seq_offset, sequence) in self.sequences.iter().enumerate() {
            for record in sequence.types.iter() {
                let range = record.range();
                if range.is_none() {
                    warn!("Type {} on sequence {} has no locations", record.name, sequence.name);
                }
                result.push(TypeGroup {
                    handle: result.len() + 1,
                    sequence_handle: seq_offset + 1,
                    sequence: sequence.name.clone(),
                    name: record.name.clone(),
                    range,
                });
            }
        }
        result
    }
}

//-----------------------------------------------------------------------------

#[derive(Default)]
struct TableBuilder {
    table: AnnotationTable,
    // Sequence name to offset in `table.sequences`.
    sequence_offsets: HashMap<String, usize>,
    // (sequence offset, type name) to offset in `types`.
    type_offsets: HashMap<(usize, String), usize>,
}

impl TableBuilder {
    fn insert(&mut self, annotation: Annotation) {
        self.table.raw_rows += 1;

        let sequences = &mut self.table.sequences;
        let seq_offset = *self.sequence_offsets.entry(annotation.sequence_id).or_insert_with_key(|name| {
            sequences.push(SequenceRecord { name: name.clone(), types: Vec::new() });
            sequences.len() - 1
        });

        let types = &mut sequences[seq_offset].types;
        let type_offset = *self.type_offsets.entry((seq_offset, annotation.type_name)).or_insert_with_key(|(_, name)| {
            types.push(TypeRecord { name: name.clone(), locations: BTreeSet::new() });
            types.len() - 1
        });

        if types[type_offset].locations.insert(annotation.location) {
            self.table.len += 1;
        }
    }

    fn build(self) -> AnnotationTable {
        let duplicates = self.table.raw_rows - self.table.len;
        if duplicates > 0 {
            debug!("Dropped {} duplicate rows", duplicates);
        }
        self.table
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::internal;

    fn load(csv: &str) -> AnnotationTable {
        let table = AnnotationTable::from_reader(csv.as_bytes());
        assert!(table.is_ok(), "Failed to load annotations: {}", table.unwrap_err());
        table.unwrap()
    }

    fn load_error(csv: &str) -> String {
        match AnnotationTable::from_reader(csv.as_bytes()) {
            Ok(_) => panic!("Loaded invalid annotations"),
            Err(Error::Load(message)) => message,
            Err(err) => panic!("Wrong error type: {}", err),
        }
    }

    #[test]
    fn deduplicates_rows() {
        let table = load("id,sequence_id,type,location\n1,chr1,exon,3\n2,chr1,exon,3\n3,chr1,exon,7\n");
        assert_eq!(table.raw_rows(), 3, "Wrong number of raw rows");
        assert_eq!(table.len(), 2, "Duplicate rows were not collapsed");
        let locations: Vec<i64> = table.sequences()[0].types[0].locations.iter().copied().collect();
        assert_eq!(locations, vec![3, 7], "Wrong distinct locations");
    }

    #[test]
    fn first_encountered_order() {
        let table = load(
            "id,sequence_id,type,location\n\
             1,chr2,intron,1\n\
             2,chr1,exon,2\n\
             3,chr2,exon,3\n\
             4,chr1,intron,4\n\
             5,chr2,intron,5\n"
        );
        let sequences: Vec<&str> = table.sequences().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(sequences, vec!["chr2", "chr1"], "Wrong sequence order");
        let types: Vec<&str> = table.sequences()[0].types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(types, vec!["intron", "exon"], "Wrong type order for chr2");

        let labels: Vec<String> = table.groups().iter().map(|g| g.label()).collect();
        assert_eq!(labels, vec!["chr2 intron", "chr2 exon", "chr1 exon", "chr1 intron"], "Wrong group order");
        let handles: Vec<(usize, usize)> = table.groups().iter().map(|g| (g.handle, g.sequence_handle)).collect();
        assert_eq!(handles, vec![(1, 1), (2, 1), (3, 2), (4, 2)], "Wrong handles");
    }

    #[test]
    fn same_type_on_different_sequences() {
        let table = load("sequence_id,type,location\nchr1,exon,1\nchr2,exon,1\n");
        assert_eq!(table.types(), 2, "Types on different sequences were merged");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn ignores_extra_columns_and_whitespace() {
        let table = load("location, type ,sequence_id,note\n 10 ,exon, chr1 ,x\n");
        let groups = table.groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label(), "chr1 exon");
        assert_eq!(groups[0].range, LocationRange::new(10, 10));
    }

    #[test]
    fn empty_input() {
        let table = load("id,sequence_id,type,location\n");
        assert!(table.is_empty());
        assert!(table.groups().is_empty());
    }

    #[test]
    fn missing_column() {
        let message = load_error("id,sequence_id,location\n1,chr1,5\n");
        assert!(message.contains("type"), "Error does not name the missing column: {}", message);
        let _ = load_error("id,sequence_id,type\n");
    }

    #[test]
    fn invalid_location() {
        let _ = load_error("id,sequence_id,type,location\n1,chr1,exon,five\n");
        let _ = load_error("id,sequence_id,type,location\n1,chr1,exon,\n");
    }

    #[test]
    fn missing_file() {
        let result = AnnotationTable::from_file("this-file-does-not-exist.csv");
        assert!(matches!(result, Err(Error::Load(_))), "Loaded a missing file");
    }

    #[test]
    fn sample_data() {
        let table = internal::load_sample_data();
        assert_eq!(table.raw_rows(), 24, "Wrong number of raw rows");
        assert_eq!(table.len(), 22, "Wrong number of distinct annotations");
        assert_eq!(table.sequences().len(), 2, "Wrong number of sequences");
        assert_eq!(table.types(), 5, "Wrong number of types");
    }

    #[test]
    fn gzipped_sample_data() {
        let plain = internal::load_sample_data();
        let gzipped = internal::load_table("sample_sequencing_data.csv.gz");
        assert_eq!(gzipped, plain, "Gzip-compressed input gives a different table");
    }
}

//-----------------------------------------------------------------------------
