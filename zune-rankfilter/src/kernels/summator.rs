/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The running-sum kernel: a scalar accumulator slid across the aperture,
//! with a post-processing function applied to the raw sum.

use crate::context::{check_cancelled, Context};
use crate::driver::{ShiftDriver, ValueState};
use crate::errors::Result;
use crate::options::KernelOptions;
use crate::pattern::Pattern;
use crate::quantize::Quantisable;
use crate::storage::Storage;
use crate::traits::NumOps;

/// How the running sum is turned into an output value.
#[derive(Copy, Clone, Debug)]
pub enum PostProcess {
    /// `f(sum) = sum`.
    Identity,
    /// `f(sum) = a*sum + b`.
    Linear { a: f64, b: f64 },
    /// `f(sum) = (sum + 2^(log2-1)) >> log2`, i.e. a rounded mean by a
    /// power-of-two aperture size. Only meaningful for integer
    /// accumulators; `apply` falls back to plain float division when
    /// `special_optimise_power_of_two` is disabled.
    MeanByPowerOfTwo { log2: u32 }
}

impl PostProcess {
    pub(crate) fn apply(self, sum: f64, special_optimise_power_of_two: bool) -> f64 {
        match self {
            PostProcess::Identity => sum,
            PostProcess::Linear { a, b } => a * sum + b,
            PostProcess::MeanByPowerOfTwo { log2 } => {
                if special_optimise_power_of_two {
                    let half = 1u64 << (log2 - 1);
                    ((sum as u64 + half) >> log2) as f64
                } else {
                    sum / f64::from(1u32 << log2)
                }
            }
        }
    }
}

/// A plain running sum over exact sample values: every included element
/// contributes its raw value, never a quantised bar index, so the sum
/// never loses the precision a histogram's bucketing would cost it.
#[derive(Clone, Debug, Default)]
struct RunningSum {
    sum: f64
}

impl<T: Quantisable> ValueState<T> for RunningSum {
    fn include_value(&mut self, value: T) {
        self.sum += value.raw_value();
    }

    fn exclude_value(&mut self, value: T) {
        self.sum -= value.raw_value();
    }
}

/// The running-sum kernel. Unlike the percentile kernels, the summator
/// never quantises its input into bars at all: it slides over exact
/// sample values, since summation has no use for the coarser resolution
/// that makes rank-seeking cheap.
pub struct Summator<'s, T, S: ?Sized> {
    driver: ShiftDriver<'s, T, S>,
    post:   PostProcess,
    special_optimise_power_of_two: bool
}

impl<'s, T, S> Summator<'s, T, S>
where
    T: Quantisable,
    S: Storage<T> + ?Sized
{
    pub fn new(storage: &'s S, pattern: &'s Pattern, options: &KernelOptions, post: PostProcess) -> Self {
        Summator {
            // `k` only matters to the driver's quantised-bar path; the
            // summator always drives `run_values`, which reads exact
            // samples, so any in-range value works here.
            driver: ShiftDriver::new(storage, pattern, 1, options.progress_poll_interval, options.optimise_direct_arrays),
            post,
            special_optimise_power_of_two: options.special_optimise_power_of_two
        }
    }

    /// Produce `count` outputs (already post-processed, in native numeric
    /// range) starting at `array_pos`, converting the result to `O` with
    /// saturation at `O`'s range.
    ///
    /// # Errors
    /// Returns [`crate::errors::RankFilterError::OutOfRange`] if the
    /// requested range exceeds the matrix length, and propagates
    /// cancellation from `ctx`.
    pub fn get_range<O: NumOps<O>>(
        &mut self, array_pos: usize, count: usize, ctx: &impl Context
    ) -> Result<Vec<O>> {
        check_cancelled(ctx)?;
        let special = self.special_optimise_power_of_two;
        let post = self.post;
        let raw = self.driver.run_values(
            array_pos,
            count,
            ctx,
            None,
            RunningSum::default(),
            move |state: &mut RunningSum| Ok(post.apply(state.sum, special))
        )?;
        Ok(raw.into_iter().map(O::from_f64).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NullContext;
    use crate::element_type::ElementType;
    use crate::storage::wrap_index;

    fn three_wide_pattern() -> Pattern {
        Pattern::new(vec![0, 1, 2], vec![0], vec![2]).unwrap()
    }

    #[test]
    fn identity_matches_naive_three_wide_sum() {
        let data: [u8; 6] = [10, 20, 30, 40, 50, 60];
        let pattern = three_wide_pattern();
        let options = KernelOptions::new(ElementType::U8);
        let mut summator = Summator::<u8, [u8]>::new(&data[..], &pattern, &options, PostProcess::Identity);
        let out: Vec<u32> = summator.get_range(0, 6, &NullContext).unwrap();

        let naive: Vec<u32> = (0..6)
            .map(|i: i64| {
                let a = |s: i64| u32::from(data[wrap_index(i, s, 6)]);
                a(0) + a(1) + a(2)
            })
            .collect();
        assert_eq!(out, naive);
    }

    #[test]
    fn power_of_two_mean_matches_rounded_division() {
        let data: [u8; 6] = [10, 20, 30, 40, 50, 60];
        let pattern = three_wide_pattern();
        let options = KernelOptions::new(ElementType::U8);
        let mut summator = Summator::<u8, [u8]>::new(
            &data[..],
            &pattern,
            &options,
            PostProcess::MeanByPowerOfTwo { log2: 2 }
        );
        let out: Vec<u32> = summator.get_range(0, 6, &NullContext).unwrap();

        let naive: Vec<u32> = (0..6)
            .map(|i: i64| {
                let a = |s: i64| u32::from(data[wrap_index(i, s, 6)]);
                let sum = a(0) + a(1) + a(2);
                (sum + 2) >> 2
            })
            .collect();
        assert_eq!(out, naive);
    }

    #[test]
    fn disabling_power_of_two_fast_path_gives_plain_division() {
        let data: [u8; 6] = [10, 20, 30, 40, 50, 60];
        let pattern = three_wide_pattern();
        let options = KernelOptions {
            special_optimise_power_of_two: false,
            ..KernelOptions::new(ElementType::U8)
        };
        let mut summator = Summator::<u8, [u8]>::new(
            &data[..],
            &pattern,
            &options,
            PostProcess::MeanByPowerOfTwo { log2: 2 }
        );
        let out: Vec<f64> = summator.get_range(0, 6, &NullContext).unwrap();
        assert!((out[0] - 90.0 / 4.0).abs() < 1e-9);
    }
}
