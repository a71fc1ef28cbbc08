/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The `ShiftDriver` collaborator: the generic sliding-window loop.
//!
//! For every output index the driver asks its aperture state for a result,
//! then slides by one: the elements leaving the aperture are excluded, the
//! index advances with circular wrap-around, and the elements entering the
//! aperture are included. The driver is generic over what "aperture state"
//! actually means — a histogram, a pair of cursors sharing a histogram, or
//! a running-sum accumulator all qualify, as long as they know how to
//! include and exclude one quantised bar.

use crate::context::{check_cancelled, Context};
use crate::cache::HistogramCache;
use crate::errors::{RankFilterError, Result};
use crate::pattern::Pattern;
use crate::quantize::Quantisable;
use crate::storage::{wrap_index, Storage};

/// Anything the driver can slide across one quantised bar at a time.
///
/// Implemented by [`crate::histogram::Bars`] and
/// [`crate::histogram::HistogramPair`] for the percentile kernels, and by
/// the summator's scalar accumulator.
pub trait ApertureState: Clone {
    fn include(&mut self, bar: u32);
    fn exclude(&mut self, bar: u32);
}

/// Like [`ApertureState`] but over the exact sample value rather than a
/// quantised bar index. Used by kernels (the running sum) for which
/// bucketing into `2^k` bars would throw away precision the kernel actually
/// needs.
pub trait ValueState<T>: Clone {
    fn include_value(&mut self, value: T);
    fn exclude_value(&mut self, value: T);
}

/// The sliding-window loop over one matrix, parameterised by element type
/// `T` and storage `S`.
pub struct ShiftDriver<'s, T, S: ?Sized> {
    storage: &'s S,
    // Cached once from `storage.backing_buffer()` when the caller opts into
    // the direct-buffer fast path. Both this and `storage.get` must produce
    // bit-identical quantised bars; this field only changes which one runs.
    direct:  Option<&'s [T]>,
    pattern: &'s Pattern,
    length:  usize,
    k:       u32,
    poll_interval: usize,
    _elem: std::marker::PhantomData<T>
}

impl<'s, T, S> ShiftDriver<'s, T, S>
where
    T: Quantisable,
    S: Storage<T> + ?Sized
{
    /// Build a driver over `storage` with aperture geometry `pattern`,
    /// quantising at resolution `k` and polling for cancellation every
    /// `poll_interval` elements.
    ///
    /// `optimise_direct_arrays` enables indexing `storage.backing_buffer()`
    /// directly instead of going through [`Storage::get`] on every read,
    /// when such a buffer exists.
    pub fn new(
        storage: &'s S, pattern: &'s Pattern, k: u32, poll_interval: usize,
        optimise_direct_arrays: bool
    ) -> Self {
        let direct = if optimise_direct_arrays {
            storage.backing_buffer()
        } else {
            None
        };
        ShiftDriver {
            storage,
            direct,
            pattern,
            length: storage.length(),
            k,
            poll_interval: poll_interval.max(1),
            _elem: std::marker::PhantomData
        }
    }

    #[inline]
    fn value_at(&self, array_pos: usize, shift: i64) -> T {
        let idx = wrap_index(array_pos as i64, shift, self.length);
        match self.direct {
            Some(buf) => buf[idx],
            None => self.storage.get(idx)
        }
    }

    #[inline]
    fn quantised_at(&self, array_pos: usize, shift: i64) -> u32 {
        self.value_at(array_pos, shift).quantise(self.k)
    }

    /// Populate `aperture` from scratch by including every shift in the
    /// pattern at `array_pos`.
    pub fn rebuild<A: ApertureState>(&self, array_pos: usize, aperture: &mut A) {
        for &s in self.pattern.shifts() {
            aperture.include(self.quantised_at(array_pos, s));
        }
    }

    /// Drive `count` consecutive outputs starting at `array_pos`, calling
    /// `compute` once per output index with the aperture state positioned
    /// correctly.
    ///
    /// If `cache` is given, a hit restores `aperture` from a previous run's
    /// stopping point instead of paying the full rebuild; the final
    /// aperture state is stored back into the cache under the position one
    /// past the last produced element, ready for the next contiguous read.
    ///
    /// # Errors
    /// Returns [`RankFilterError::OutOfRange`] if `array_pos + count`
    /// exceeds the storage length, or propagates [`RankFilterError::Cancelled`]
    /// from `ctx`.
    pub fn run<A, F, O>(
        &self,
        array_pos: usize,
        count: usize,
        ctx: &impl Context,
        mut cache: Option<&mut HistogramCache<A>>,
        mut aperture: A,
        mut compute: F
    ) -> Result<Vec<O>>
    where
        A: ApertureState,
        F: FnMut(&mut A) -> Result<O>
    {
        if array_pos + count > self.length {
            return Err(RankFilterError::OutOfRange {
                requested: array_pos + count,
                length:    self.length
            });
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let cached = match cache.as_mut() {
            Some(c) => c.get(array_pos).cloned(),
            None => None
        };
        let mut pos = array_pos;
        if let Some(snapshot) = cached {
            aperture = snapshot;
        } else {
            check_cancelled(ctx)?;
            self.rebuild(pos, &mut aperture);
        }

        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            if i % self.poll_interval == 0 {
                check_cancelled(ctx)?;
            }

            out.push(compute(&mut aperture)?);

            for &s in self.pattern.right() {
                aperture.exclude(self.quantised_at(pos, s));
            }
            pos = if pos + 1 == self.length { 0 } else { pos + 1 };
            for &s in self.pattern.left() {
                aperture.include(self.quantised_at(pos, s));
            }
        }

        ctx.report_progress(count, count);
        if let Some(cache) = cache {
            cache.put(pos, aperture);
        }
        Ok(out)
    }

    /// Populate `aperture` from scratch with the exact sample values (no
    /// quantisation) at `array_pos`.
    pub fn rebuild_values<A: ValueState<T>>(&self, array_pos: usize, aperture: &mut A) {
        for &s in self.pattern.shifts() {
            aperture.include_value(self.value_at(array_pos, s));
        }
    }

    /// Like [`ShiftDriver::run`], but the aperture state sees exact sample
    /// values instead of quantised bars.
    ///
    /// # Errors
    /// Returns [`RankFilterError::OutOfRange`] if `array_pos + count`
    /// exceeds the storage length, or propagates [`RankFilterError::Cancelled`]
    /// from `ctx`.
    pub fn run_values<A, F, O>(
        &self,
        array_pos: usize,
        count: usize,
        ctx: &impl Context,
        mut cache: Option<&mut HistogramCache<A>>,
        mut aperture: A,
        mut compute: F
    ) -> Result<Vec<O>>
    where
        A: ValueState<T>,
        F: FnMut(&mut A) -> Result<O>
    {
        if array_pos + count > self.length {
            return Err(RankFilterError::OutOfRange {
                requested: array_pos + count,
                length:    self.length
            });
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let cached = match cache.as_mut() {
            Some(c) => c.get(array_pos).cloned(),
            None => None
        };
        let mut pos = array_pos;
        if let Some(snapshot) = cached {
            aperture = snapshot;
        } else {
            check_cancelled(ctx)?;
            self.rebuild_values(pos, &mut aperture);
        }

        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            if i % self.poll_interval == 0 {
                check_cancelled(ctx)?;
            }

            out.push(compute(&mut aperture)?);

            for &s in self.pattern.right() {
                aperture.exclude_value(self.value_at(pos, s));
            }
            pos = if pos + 1 == self.length { 0 } else { pos + 1 };
            for &s in self.pattern.left() {
                aperture.include_value(self.value_at(pos, s));
            }
        }

        ctx.report_progress(count, count);
        if let Some(cache) = cache {
            cache.put(pos, aperture);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NullContext;

    #[derive(Clone, Default)]
    struct CountingSum {
        sum: u64
    }

    impl ApertureState for CountingSum {
        fn include(&mut self, bar: u32) {
            self.sum += u64::from(bar);
        }

        fn exclude(&mut self, bar: u32) {
            self.sum -= u64::from(bar);
        }
    }

    fn aperture_pattern() -> Pattern {
        // Three-wide aperture {0,1,2}; sliding by +1 excludes shift 2,
        // includes shift 0.
        Pattern::new(vec![0, 1, 2], vec![0], vec![2]).unwrap()
    }

    #[test]
    fn sums_match_naive_three_wide_window() {
        let data: [u8; 6] = [10, 20, 30, 40, 50, 60];
        let pattern = aperture_pattern();
        let driver = ShiftDriver::<u8, [u8]>::new(&data[..], &pattern, 8, 65536, true);

        let results = driver
            .run(
                0,
                6,
                &NullContext,
                None::<&mut HistogramCache<CountingSum>>,
                CountingSum::default(),
                |state| Ok(state.sum)
            )
            .unwrap();

        // aperture at i is {a[i], a[i-1], a[i-2]} (mod 6)
        let expected = [
            u64::from(data[0]) + u64::from(data[5]) + u64::from(data[4]),
            u64::from(data[1]) + u64::from(data[0]) + u64::from(data[5]),
            u64::from(data[2]) + u64::from(data[1]) + u64::from(data[0]),
            u64::from(data[3]) + u64::from(data[2]) + u64::from(data[1]),
            u64::from(data[4]) + u64::from(data[3]) + u64::from(data[2]),
            u64::from(data[5]) + u64::from(data[4]) + u64::from(data[3])
        ];
        assert_eq!(results, expected);
    }

    #[test]
    fn rejects_out_of_range_request() {
        let data: [u8; 4] = [1, 2, 3, 4];
        let pattern = aperture_pattern();
        let driver = ShiftDriver::<u8, [u8]>::new(&data[..], &pattern, 8, 65536, true);
        let result = driver.run(
            2,
            4,
            &NullContext,
            None::<&mut HistogramCache<CountingSum>>,
            CountingSum::default(),
            |state| Ok(state.sum)
        );
        assert!(matches!(result, Err(RankFilterError::OutOfRange { .. })));
    }

    #[test]
    fn cache_hit_resumes_without_rebuild() {
        let data: [u8; 6] = [10, 20, 30, 40, 50, 60];
        let pattern = aperture_pattern();
        let driver = ShiftDriver::<u8, [u8]>::new(&data[..], &pattern, 8, 65536, true);
        let mut cache = HistogramCache::new(4);

        let first = driver
            .run(
                0,
                3,
                &NullContext,
                Some(&mut cache),
                CountingSum::default(),
                |state| Ok(state.sum)
            )
            .unwrap();

        let second = driver
            .run(
                3,
                3,
                &NullContext,
                Some(&mut cache),
                CountingSum::default(),
                |state| Ok(state.sum)
            )
            .unwrap();

        let mut all = first;
        all.extend(second);
        let expected = [
            u64::from(data[0]) + u64::from(data[5]) + u64::from(data[4]),
            u64::from(data[1]) + u64::from(data[0]) + u64::from(data[5]),
            u64::from(data[2]) + u64::from(data[1]) + u64::from(data[0]),
            u64::from(data[3]) + u64::from(data[2]) + u64::from(data[1]),
            u64::from(data[4]) + u64::from(data[3]) + u64::from(data[2]),
            u64::from(data[5]) + u64::from(data[4]) + u64::from(data[3])
        ];
        assert_eq!(all, expected);
    }
}
