//! Materialized location ranges for annotation types.

use std::fmt::Display;
use std::ops::RangeInclusive;

//-----------------------------------------------------------------------------

/// A non-empty inclusive range of locations.
///
/// An annotation type covers every location between the smallest and the largest observed location, even if some locations in between were not observed.
///
/// # Examples
///
/// ```
/// use overlap_base::LocationRange;
///
/// let range = LocationRange::covering([7, 3]).unwrap();
/// assert_eq!(range.start(), 3);
/// assert_eq!(range.end(), 7);
/// assert_eq!(range.iter().collect::<Vec<_>>(), vec![3, 4, 5, 6, 7]);
///
/// assert!(LocationRange::covering(Vec::new()).is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationRange {
    start: i64,
    end: i64,
}

impl LocationRange {
    /// Creates a new range `[start, end]`.
    ///
    /// Returns [`None`] if `start > end`.
    pub fn new(start: i64, end: i64) -> Option<Self> {
        if start > end {
            None
        } else {
            Some(LocationRange { start, end })
        }
    }

    /// Returns the smallest range covering the given locations, or [`None`] if there are no locations.
    pub fn covering<I: IntoIterator<Item = i64>>(locations: I) -> Option<Self> {
        let mut result: Option<LocationRange> = None;
        for location in locations {
            result = match result {
                Some(range) => Some(LocationRange {
                    start: range.start.min(location),
                    end: range.end.max(location),
                }),
                None => Some(LocationRange { start: location, end: location }),
            };
        }
        result
    }

    /// Returns the first location in the range.
    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Returns the last location in the range.
    #[inline]
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Returns the number of locations in the range.
    ///
    /// Saturates at [`usize::MAX`] for ranges that span the entire `i64` domain.
    #[inline]
    pub fn len(&self) -> usize {
        usize::try_from(self.end.abs_diff(self.start)).map_or(usize::MAX, |diff| diff.saturating_add(1))
    }

    /// Returns `true` if the range contains the location.
    #[inline]
    pub fn contains(&self, location: i64) -> bool {
        self.start <= location && location <= self.end
    }

    /// Returns the intersection of the ranges, or [`None`] if they are disjoint.
    pub fn intersection(&self, other: &LocationRange) -> Option<LocationRange> {
        LocationRange::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// Returns an iterator over the locations in the range.
    pub fn iter(&self) -> RangeInclusive<i64> {
        self.start..=self.end
    }
}

impl Display for LocationRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

//-----------------------------------------------------------------------------

/// An annotation type on a sequence with its materialized range.
///
/// Handles are positive integers, assigned in the order the groups are enumerated from an [`crate::AnnotationTable`].
/// They become the primary keys of tables `Sequence` and `SequenceType` in the database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeGroup {
    /// Handle of the annotation type.
    pub handle: usize,
    /// Handle of the sequence.
    pub sequence_handle: usize,
    /// Sequence name.
    pub sequence: String,
    /// Type name.
    pub name: String,
    /// Covered locations, or [`None`] for a type without observed locations.
    pub range: Option<LocationRange>,
}

impl TypeGroup {
    /// Returns the composite label `<sequence> <type>`.
    pub fn label(&self) -> String {
        format!("{} {}", self.sequence, self.name)
    }

    /// Returns the number of covered locations.
    pub fn len(&self) -> usize {
        self.range.map_or(0, |range| range.len())
    }

    /// Returns `true` if the group does not cover any locations.
    pub fn is_empty(&self) -> bool {
        self.range.is_none()
    }

    /// Returns an iterator over the covered locations.
    pub fn locations(&self) -> impl Iterator<Item = i64> {
        self.range.map(|range| range.iter()).into_iter().flatten()
    }
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
