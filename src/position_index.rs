//! An in-memory index from locations to the annotation types covering them.
//!
//! This index provides the same queries as [`crate::OverlapBase`] without a database.

use crate::{JoinRow, TypeGroup};

use std::collections::{BTreeMap, HashMap};

//-----------------------------------------------------------------------------

/// An index from each covered location to the handles of the annotation types covering it.
///
/// The combination of [`crate::AnnotationTable`] and [`PositionIndex`] is functionally equivalent to [`crate::OverlapBase`].
/// For identical input, [`PositionIndex::overlap_join`] returns the same rows in the same order as [`crate::OverlapBase::overlap_join`].
///
/// # Examples
///
/// ```
/// use overlap_base::{Annotation, AnnotationTable, JoinRow, PositionIndex};
///
/// let table = AnnotationTable::from_annotations(vec![
///     Annotation::new("chr1", "exon", 10),
///     Annotation::new("chr1", "exon", 15),
///     Annotation::new("chr1", "intron", 15),
///     Annotation::new("chr1", "intron", 20),
/// ]);
/// let index = PositionIndex::new(&table.groups());
/// assert_eq!(index.positions(), 11);
/// assert_eq!(index.types_at(15), &[1, 2]);
///
/// let rows = index.overlap_join();
/// assert_eq!(rows, vec![JoinRow::new("chr1 exon", 2, 15), JoinRow::new("chr1 intron", 1, 15)]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PositionIndex {
    // Covered location to sorted handles.
    types: BTreeMap<i64, Vec<usize>>,
    labels: HashMap<usize, String>,
}

impl PositionIndex {
    /// Builds the index for the given annotation types.
    pub fn new(groups: &[TypeGroup]) -> Self {
        let mut types: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        let mut labels: HashMap<usize, String> = HashMap::with_capacity(groups.len());
        for group in groups.iter() {
            labels.insert(group.handle, group.label());
            for location in group.locations() {
                types.entry(location).or_default().push(group.handle);
            }
        }
        for handles in types.values_mut() {
            handles.sort_unstable();
            handles.dedup();
        }
        PositionIndex { types, labels }
    }

    /// Returns the number of distinct covered locations.
    pub fn positions(&self) -> usize {
        self.types.len()
    }

    /// Returns the sorted handles of the types covering the location.
    pub fn types_at(&self, location: i64) -> &[usize] {
        self.types.get(&location).map(|handles| handles.as_slice()).unwrap_or(&[])
    }

    /// Returns every location shared by an ordered pair of distinct annotation types.
    ///
    /// See [`crate::OverlapBase::overlap_join`] for the semantics and the order of the rows.
    pub fn overlap_join(&self) -> Vec<JoinRow> {
        let mut result: Vec<JoinRow> = Vec::new();
        for (location, handles) in self.types.iter() {
            if handles.len() < 2 {
                continue;
            }
            for first in handles.iter() {
                let label = &self.labels[first];
                for second in handles.iter().filter(|handle| *handle != first) {
                    result.push(JoinRow { label: label.clone(), match_handle: *second, location: *location });
                }
            }
        }

        // The derived order is (label, match handle, location), which is the join order.
        result.sort_unstable();
        result
    }

    /// Returns a map from the handle of every annotation type to its composite label.
    pub fn type_labels(&self) -> HashMap<usize, String> {
        self.labels.clone()
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::internal;

    #[test]
    fn sample_data() {
        let table = internal::load_sample_data();
        let index = PositionIndex::new(&table.groups());
        assert_eq!(index.overlap_join(), internal::sample_join_rows(), "Wrong overlap join for the sample data");
        assert_eq!(index.type_labels().len(), 5, "Wrong number of labels");
        assert_eq!(index.types_at(14), &[1, 2, 4], "Wrong types at location 14");
        assert!(index.types_at(25).is_empty(), "Types at an uncovered location");
    }

    #[test]
    fn disjoint_and_single() {
        let table = internal::table_from_ranges(&[("chr1", "exon", 1, 5), ("chr1", "intron", 10, 15)]);
        let index = PositionIndex::new(&table.groups());
        assert_eq!(index.positions(), 11);
        assert!(index.overlap_join().is_empty(), "Disjoint types overlap");

        let table = internal::table_from_ranges(&[("chr1", "exon", 1, 5)]);
        let index = PositionIndex::new(&table.groups());
        assert!(index.overlap_join().is_empty(), "A type overlaps with itself");
    }

    #[test]
    fn empty_group() {
        let groups = vec![TypeGroup {
            handle: 1,
            sequence_handle: 1,
            sequence: String::from("chr1"),
            name: String::from("exon"),
            range: None,
        }];
        let index = PositionIndex::new(&groups);
        assert_eq!(index.positions(), 0);
        assert_eq!(index.type_labels().get(&1).map(String::as_str), Some("chr1 exon"));
    }
}

//-----------------------------------------------------------------------------
