/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Percentile-based kernels: the mean of the sorted aperture between two
//! percentile positions.
//!
//! [`AverageBetweenPercentiles`] is the general, histogram-backed kernel for
//! every quantisable element type. [`bit_average_between_percentiles`] is
//! the closed-form special case for single-bit elements, which tracks only
//! a zero-count instead of building a histogram at all.

use crate::cache::HistogramCache;
use crate::context::{check_cancelled, Context};
use crate::driver::ShiftDriver;
use crate::errors::{RankFilterError, Result};
use crate::histogram::HistogramPair;
use crate::options::KernelOptions;
use crate::pattern::Pattern;
use crate::quantize::{Quantisable, Quantiser};
use crate::storage::{wrap_index, Storage};

/// The mean of the sorted aperture between percentile indices `pIndex1` and
/// `pIndex2`, realised over the general [`HistogramPair`] machinery.
///
/// One instance is built per kernel invocation and reused across however
/// many [`AverageBetweenPercentiles::get_range`] calls the caller makes;
/// the histogram cache it owns is what makes repeated contiguous reads
/// cheap.
pub struct AverageBetweenPercentiles<'s, T, S: ?Sized> {
    driver:      ShiftDriver<'s, T, S>,
    quantiser:   Quantiser,
    bit_levels:  Vec<u8>,
    aperture_size: f64,
    interpolated: bool,
    filler:      f64,
    cache:       HistogramCache<HistogramPair>
}

impl<'s, T, S> AverageBetweenPercentiles<'s, T, S>
where
    T: Quantisable,
    S: Storage<T> + ?Sized
{
    /// Build a kernel over `storage` with aperture geometry `pattern`.
    ///
    /// # Errors
    /// Returns [`RankFilterError::InvalidInput`] if
    /// `options.number_of_analysed_bits` is zero.
    pub fn new(storage: &'s S, pattern: &'s Pattern, options: &KernelOptions) -> Result<Self> {
        if options.number_of_analysed_bits == 0 {
            return Err(RankFilterError::InvalidInput(
                "number_of_analysed_bits must be at least 1".to_string()
            ));
        }
        let quantiser = Quantiser::new::<T>(options.number_of_analysed_bits);
        let cache_capacity = usize::from(options.optimise_get_range);
        Ok(AverageBetweenPercentiles {
            driver: ShiftDriver::new(
                storage,
                pattern,
                quantiser.k(),
                options.progress_poll_interval,
                options.optimise_direct_arrays
            ),
            quantiser,
            bit_levels: options.bit_levels.clone(),
            aperture_size: f64::from(pattern.aperture_size()),
            interpolated: options.interpolated,
            filler: options.filler,
            cache: HistogramCache::new(cache_capacity)
        })
    }

    /// Produce `count` outputs starting at `array_pos`, one per aperture
    /// position, for the fixed percentile pair `(p_index1, p_index2)`.
    ///
    /// # Errors
    /// Returns [`RankFilterError::InvalidInput`] if either percentile index
    /// is `NaN`, [`RankFilterError::OutOfRange`] if the requested range
    /// exceeds the matrix length, and propagates cancellation from `ctx`.
    pub fn get_range(
        &mut self, array_pos: usize, count: usize, p_index1: f64, p_index2: f64,
        ctx: &impl Context
    ) -> Result<Vec<f64>> {
        if p_index1.is_nan() || p_index2.is_nan() {
            return Err(RankFilterError::InvalidInput(
                "percentile index must not be NaN".to_string()
            ));
        }

        let n = p_index2 - p_index1;
        if n <= 0.0 {
            check_cancelled(ctx)?;
            return Ok(vec![self.filler; count]);
        }

        let p1 = p_index1.clamp(0.0, self.aperture_size);
        let p2 = p_index2.clamp(0.0, self.aperture_size);
        let multiplier_inv = self.quantiser.multiplier_inv();
        let interpolated = self.interpolated;

        let pair = HistogramPair::new(self.quantiser.k(), &self.bit_levels);
        self.driver.run(
            array_pos,
            count,
            ctx,
            Some(&mut self.cache),
            pair,
            move |state: &mut HistogramPair| {
                let integral = state.integral_between(p1, p2, interpolated)?;
                Ok((integral / n) * multiplier_inv)
            }
        )
    }
}

/// The zero-count-only closed form for single-bit elements: `b` is the
/// number of zero elements in the aperture, `N` its size, and the integral
/// of the sorted (0/1-valued) aperture between `p_index1` and `p_index2` is
/// a three-branch piecewise-quadratic in `(p_index1, p_index2, b, N)`.
///
/// Does not build a histogram at all: `b` is tracked with a single running
/// counter, incremented and decremented exactly like a one-bar histogram
/// would be.
///
/// # Errors
/// Returns [`RankFilterError::InvalidInput`] if either percentile index is
/// `NaN`, [`RankFilterError::OutOfRange`] if the requested range exceeds
/// the matrix length, and propagates cancellation from `ctx`.
pub fn bit_average_between_percentiles<S>(
    storage: &S, pattern: &Pattern, options: &KernelOptions, array_pos: usize, count: usize,
    p_index1: f64, p_index2: f64, ctx: &impl Context
) -> Result<Vec<f64>>
where
    S: Storage<u8> + ?Sized
{
    if p_index1.is_nan() || p_index2.is_nan() {
        return Err(RankFilterError::InvalidInput(
            "percentile index must not be NaN".to_string()
        ));
    }
    let length = storage.length();
    if array_pos + count > length {
        return Err(RankFilterError::OutOfRange {
            requested: array_pos + count,
            length
        });
    }

    let n = p_index2 - p_index1;
    if n <= 0.0 {
        check_cancelled(ctx)?;
        return Ok(vec![options.filler; count]);
    }

    let big_n = f64::from(pattern.aperture_size());
    let p1 = p_index1.clamp(0.0, big_n);
    let p2 = p_index2.clamp(0.0, big_n);
    let r1 = p1.floor();

    let read_zero = |pos: usize, shift: i64| -> bool {
        storage.get(wrap_index(pos as i64, shift, length)) == 0
    };

    let mut b: u32 = 0;
    for &s in pattern.shifts() {
        if read_zero(array_pos, s) {
            b += 1;
        }
    }

    let poll_interval = options.progress_poll_interval.max(1);
    let mut pos = array_pos;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        if i % poll_interval == 0 {
            check_cancelled(ctx)?;
        }

        let b_f = f64::from(b);
        let integral = if r1 == big_n || p2 == 0.0 {
            0.0
        } else if p2 <= b_f {
            (p2 - p1) * 0.5 * (p1 + p2) / b_f
        } else if r1 >= b_f {
            (p2 - p1) * (1.0 + (0.5 * (p1 + p2) - b_f) / (big_n - b_f))
        } else {
            (b_f - p1) * 0.5 * (p1 + b_f) / b_f
                + (p2 - b_f) * (1.0 + 0.5 * (p2 - b_f) / (big_n - b_f))
        };
        out.push(integral / n);

        for &s in pattern.right() {
            if read_zero(pos, s) {
                b -= 1;
            }
        }
        pos = if pos + 1 == length { 0 } else { pos + 1 };
        for &s in pattern.left() {
            if read_zero(pos, s) {
                b += 1;
            }
        }
    }
    ctx.report_progress(count, count);
    Ok(out)
}
