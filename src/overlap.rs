//! Reducing the overlap join to one summary per pair of annotation types.
//!
//! The overlap join reports each shared location separately and includes both orientations of each pair.
//! [`resolve`] replaces the handles of the matching types with their labels, and [`summarize`] collapses the rows into [`OverlapSummary`] records.

use crate::{Error, Result, JoinRow, LocationRange};

use std::collections::HashMap;
use std::fmt::Display;


//-----------------------------------------------------------------------------

/// A row of the overlap join with both annotation types identified by their composite labels.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResolvedRow {
    /// Label of type A.
    pub first: String,
    /// Label of type B.
    pub second: String,
    /// Location shared by the types.
    pub location: i64,
}

impl ResolvedRow {
    /// Creates a new resolved row.
    pub fn new(first: &str, second: &str, location: i64) -> Self {
        ResolvedRow { first: first.to_string(), second: second.to_string(), location }
    }
}

/// Replaces the handle of type B in each join row with its label.
///
/// The rows remain in the same order.
///
/// # Errors
///
/// Returns [`Error::Query`] if a handle is not in the label map.
pub fn resolve(rows: &[JoinRow], labels: &HashMap<usize, String>) -> Result<Vec<ResolvedRow>> {
    let mut result: Vec<ResolvedRow> = Vec::with_capacity(rows.len());
    for row in rows.iter() {
        let second = labels.get(&row.match_handle).ok_or(
            Error::Query(format!("No label for annotation type {}", row.match_handle))
        )?;
        result.push(ResolvedRow {
            first: row.label.clone(),
            second: second.clone(),
            location: row.location,
        });
    }
    Ok(result)
}

//-----------------------------------------------------------------------------

/// Which orientations of an overlapping pair are reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Only the orientation that appears first in the join.
    #[default]
    FirstSeen,
    /// Both (A, B) and (B, A).
    Both,
}

/// A pair of overlapping annotation types with the smallest and largest shared location.
///
/// Because each type covers a contiguous range, the shared locations are exactly `min..=max`.
///
/// # Examples
///
/// ```
/// use overlap_base::OverlapSummary;
///
/// let summary = OverlapSummary::new("chr1 exon", "chr1 intron", 13, 15);
/// assert_eq!(summary.len(), 3);
/// assert_eq!(summary.to_string(), "chr1 exon and chr1 intron at locations 13 to 15");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OverlapSummary {
    /// Label of type A.
    pub first: String,
    /// Label of type B.
    pub second: String,
    /// Smallest shared location.
    pub min: i64,
    /// Largest shared location.
    pub max: i64,
}

impl OverlapSummary {
    /// Creates a new summary.
    pub fn new(first: &str, second: &str, min: i64, max: i64) -> Self {
        OverlapSummary { first: first.to_string(), second: second.to_string(), min, max }
    }

    /// Returns the range `[min, max]`, or [`None`] if `min > max`.
    pub fn range(&self) -> Option<LocationRange> {
        LocationRange::new(self.min, self.max)
    }

    /// Returns the number of locations in `[min, max]`.
    pub fn len(&self) -> usize {
        self.range().map_or(0, |range| range.len())
    }

    // Extends the summary to cover the location.
    fn extend(&mut self, location: i64) {
        self.min = self.min.min(location);
        self.max = self.max.max(location);
    }
}

impl Display for OverlapSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} and {} at locations {} to {}", self.first, self.second, self.min, self.max)
    }
}

/// Collapses the resolved join rows into one summary per pair of types.
///
/// Pairs are listed in the order their first row appears.
/// The summary for an ordered pair (A, B) covers the smallest and the largest location over all rows with exactly that pair.
/// With [`Orientation::FirstSeen`], the mirror pair (B, A) is skipped if (A, B) appeared first.
pub fn summarize(rows: &[ResolvedRow], orientation: Orientation) -> Vec<OverlapSummary> {
    let mut result: Vec<OverlapSummary> = Vec::new();
    let mut offsets: HashMap<(&str, &str), usize> = HashMap::new();

    for row in rows.iter() {
        let key = (row.first.as_str(), row.second.as_str());
        if let Some(offset) = offsets.get(&key) {
            result[*offset].extend(row.location);
            continue;
        }
        if orientation == Orientation::FirstSeen && offsets.contains_key(&(key.1, key.0)) {
            continue;
        }
        offsets.insert(key, result.len());
        result.push(OverlapSummary {
            first: row.first.clone(),
            second: row.second.clone(),
            min: row.location,
            max: row.location,
        });
    }

    result
}

//-----------------------------------------------------------------------------
