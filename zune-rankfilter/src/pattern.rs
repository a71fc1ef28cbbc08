/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The `Pattern` collaborator: three arrays of flat-index shifts.
//!
//! Converting an N-dimensional neighbourhood shape into these three arrays
//! is the caller's job; this module only stores and validates the
//! already-converted arrays.

use crate::errors::{RankFilterError, Result};

/// The aperture shift pattern the `ShiftDriver` slides with.
///
/// - `shifts`: every flat-index offset that composes the aperture.
/// - `left`/`right`: the per-step update sets. Sliding by `+1` excludes
///   each `right[j]` and includes each `left[j]`.
#[derive(Clone, Debug)]
pub struct Pattern {
    shifts: Vec<i64>,
    left:   Vec<i64>,
    right:  Vec<i64>
}

impl Pattern {
    /// Build a pattern from its three already-converted shift arrays.
    ///
    /// # Errors
    /// Returns [`RankFilterError::InvalidInput`] if `shifts` is empty or
    /// `left.len() != right.len()`; returns
    /// [`RankFilterError::TooLargePattern`] if any array would overflow an
    /// `i32`-sized index space.
    pub fn new(shifts: Vec<i64>, left: Vec<i64>, right: Vec<i64>) -> Result<Self> {
        if shifts.is_empty() {
            return Err(RankFilterError::InvalidInput(
                "pattern must contain at least one shift".to_string()
            ));
        }
        if left.len() != right.len() {
            return Err(RankFilterError::InvalidInput(format!(
                "left update set has {} entries but right has {}",
                left.len(),
                right.len()
            )));
        }
        let max_len = shifts.len().max(left.len());
        if max_len > i32::MAX as usize {
            return Err(RankFilterError::TooLargePattern(max_len));
        }
        Ok(Pattern { shifts, left, right })
    }

    #[inline]
    pub fn shifts(&self) -> &[i64] {
        &self.shifts
    }

    #[inline]
    pub fn left(&self) -> &[i64] {
        &self.left
    }

    #[inline]
    pub fn right(&self) -> &[i64] {
        &self.right
    }

    /// Aperture size `N`, i.e. the number of elements the histogram sums
    /// to.
    #[inline]
    pub fn aperture_size(&self) -> u32 {
        self.shifts.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_shifts() {
        assert!(Pattern::new(vec![], vec![], vec![]).is_err());
    }

    #[test]
    fn rejects_mismatched_update_sets() {
        assert!(Pattern::new(vec![0, 1, 2], vec![0], vec![2, 1]).is_err());
    }

    #[test]
    fn accepts_balanced_pattern() {
        let p = Pattern::new(vec![0, 1, 2], vec![0], vec![2]).unwrap();
        assert_eq!(p.aperture_size(), 3);
        assert_eq!(p.left(), &[0]);
        assert_eq!(p.right(), &[2]);
    }
}
