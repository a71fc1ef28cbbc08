/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The axis-rectangle fast path: when the aperture is an axis-aligned
//! rectangle spanning the entire extent along some axis `k > 0`, sliding
//! along that axis reduces to a parallel per-column accumulator instead of
//! the generic indexed driver.
//!
//! Only triggered when the accumulator and the two I/O slabs fit inside
//! [`crate::options::KernelOptions::axis_rect_memory_budget_bytes`]; above
//! that the caller falls back to [`crate::kernels::summator::Summator`]
//! over an equivalent indexed pattern.

use crate::context::{check_cancelled, Context};
use crate::element_type::ElementType;
use crate::errors::{RankFilterError, Result};
use crate::kernels::summator::PostProcess;
use crate::options::KernelOptions;
use crate::quantize::Quantisable;
use crate::storage::Storage;
use crate::traits::NumOps;

/// Whether a rectangular pattern's geometry is eligible for the fast path:
/// one layer deep along axis 0, and the full point-set extent along axis
/// `k`. Callers that already have a [`crate::pattern::Pattern`] built for
/// the generic driver decide this for themselves; this kernel only ever
/// sees the already-classified `layer_size`/`depth` pair.
fn accumulator_fits_in_u32(element_type: ElementType, depth: usize) -> bool {
    // `is_signed` also covers the floats, so one check rules both out:
    // `ElementType::native_bits` reports a narrower ceiling (30) for
    // `i32`/`i64` than their true range (31/63 non-negative bits) — that
    // ceiling is the *quantiser's* resolution cap, not the range of the raw
    // sample values this accumulator actually sums (`layer_value` reads
    // `Quantisable::raw_value`, not a quantised bar). A negative sample
    // would wrap `as u32` to garbage, so signed types always go through the
    // float accumulator regardless of how small `depth` is.
    if element_type.is_signed() {
        return false;
    }
    let max_value = (1u128 << element_type.native_bits()) - 1;
    max_value * depth as u128 <= u128::from(u32::MAX)
}

/// Per-column running sum, laid out as one parallel vector covering every
/// column of a layer.
enum Accumulator {
    Int(Vec<u32>),
    Float(Vec<f64>)
}

impl Accumulator {
    fn new(layer_size: usize, use_u32: bool) -> Self {
        if use_u32 {
            Accumulator::Int(vec![0u32; layer_size])
        } else {
            Accumulator::Float(vec![0.0f64; layer_size])
        }
    }

    #[inline]
    fn add(&mut self, j: usize, value: f64) {
        match self {
            Accumulator::Int(v) => v[j] += value as u32,
            Accumulator::Float(v) => v[j] += value
        }
    }

    #[inline]
    fn sub(&mut self, j: usize, value: f64) {
        match self {
            Accumulator::Int(v) => v[j] -= value as u32,
            Accumulator::Float(v) => v[j] -= value
        }
    }

    #[inline]
    fn get(&self, j: usize) -> f64 {
        match self {
            Accumulator::Int(v) => f64::from(v[j]),
            Accumulator::Float(v) => v[j]
        }
    }

    fn len(&self) -> usize {
        match self {
            Accumulator::Int(v) => v.len(),
            Accumulator::Float(v) => v.len()
        }
    }
}

/// The per-column accumulator kernel for an axis-aligned rectangular
/// aperture of depth `depth` layers, each of `layer_size` elements, sliding
/// along the non-x axis.
pub struct AxisRectangleFastPath<'s, T, S: ?Sized> {
    storage: &'s S,
    layer_size: usize,
    depth: usize,
    num_layers: usize,
    poll_interval: usize,
    post: PostProcess,
    special_optimise_power_of_two: bool,
    use_u32_accumulator: bool,
    _elem: std::marker::PhantomData<T>
}

impl<'s, T, S> AxisRectangleFastPath<'s, T, S>
where
    T: Quantisable,
    S: Storage<T> + ?Sized
{
    /// Build a fast-path kernel over `storage`, laid out as `num_layers`
    /// consecutive layers of `layer_size` elements each, summing `depth`
    /// consecutive layers per output column.
    ///
    /// # Errors
    /// Returns [`RankFilterError::InvalidInput`] if `layer_size` is zero or
    /// does not evenly divide `storage.length()`, or if `depth` exceeds the
    /// number of layers; returns [`RankFilterError::TooLargeDimensions`] if
    /// `layer_size` would overflow an `i32`-sized index space.
    pub fn new(
        storage: &'s S, layer_size: usize, depth: usize, options: &KernelOptions, post: PostProcess
    ) -> Result<Self> {
        if layer_size == 0 || storage.length() % layer_size != 0 {
            return Err(RankFilterError::InvalidInput(format!(
                "layer_size {layer_size} does not evenly divide matrix length {}",
                storage.length()
            )));
        }
        if layer_size > i32::MAX as usize {
            return Err(RankFilterError::TooLargeDimensions(format!(
                "layer_size {layer_size} exceeds i32::MAX"
            )));
        }
        let num_layers = storage.length() / layer_size;
        if depth == 0 || depth > num_layers {
            return Err(RankFilterError::InvalidInput(format!(
                "rectangle depth {depth} does not fit {num_layers} layers"
            )));
        }
        Ok(AxisRectangleFastPath {
            storage,
            layer_size,
            depth,
            num_layers,
            poll_interval: options.progress_poll_interval.max(1),
            post,
            special_optimise_power_of_two: options.special_optimise_power_of_two,
            use_u32_accumulator: accumulator_fits_in_u32(options.element_type, depth),
            _elem: std::marker::PhantomData
        })
    }

    /// Bytes of scratch this kernel needs: the accumulator plus one input
    /// and one output slab of `layer_size` elements.
    pub fn memory_required<O>(&self) -> usize {
        let acc_elem = if self.use_u32_accumulator { 4 } else { 8 };
        self.layer_size * (acc_elem + std::mem::size_of::<T>() + std::mem::size_of::<O>())
    }

    /// Whether this kernel's scratch requirement fits `budget_bytes`; when
    /// it doesn't, the caller should fall back to the indexed driver
    /// ([`crate::kernels::summator::Summator`] over an equivalent pattern).
    pub fn fits_budget<O>(&self, budget_bytes: usize) -> bool {
        self.memory_required::<O>() <= budget_bytes
    }

    /// Build the fast path only if it fits `options.axis_rect_memory_budget_bytes`
    /// for output type `O`; otherwise returns `None` so the caller can fall
    /// back to [`crate::kernels::summator::Summator`], logging the
    /// degradation once.
    ///
    /// # Errors
    /// As [`AxisRectangleFastPath::new`].
    pub fn new_within_budget<O>(
        storage: &'s S, layer_size: usize, depth: usize, options: &KernelOptions, post: PostProcess
    ) -> Result<Option<Self>> {
        let kernel = Self::new(storage, layer_size, depth, options, post)?;
        if kernel.fits_budget::<O>(options.axis_rect_memory_budget_bytes) {
            Ok(Some(kernel))
        } else {
            zune_core::log::debug!(
                "axis-rectangle fast path needs {} bytes, over budget of {}; falling back to the indexed driver",
                kernel.memory_required::<O>(),
                options.axis_rect_memory_budget_bytes
            );
            Ok(None)
        }
    }

    #[inline]
    fn layer_value(&self, layer: usize, column: usize) -> f64 {
        self.storage.get(layer * self.layer_size + column).raw_value()
    }

    /// Produce `num_output_layers` consecutive output layers starting at
    /// `start_layer`, each `layer_size` elements, flattened row-major into
    /// one `Vec<O>`.
    ///
    /// # Errors
    /// Returns [`RankFilterError::OutOfRange`] if the requested layer range
    /// does not fit, and propagates cancellation from `ctx`.
    pub fn get_layers<O: NumOps<O>>(
        &self, start_layer: usize, num_output_layers: usize, ctx: &impl Context
    ) -> Result<Vec<O>> {
        let last_layer_needed = start_layer + self.depth - 1 + num_output_layers.saturating_sub(1);
        if num_output_layers > 0 && last_layer_needed >= self.num_layers {
            return Err(RankFilterError::OutOfRange {
                requested: last_layer_needed + 1,
                length:    self.num_layers
            });
        }
        if num_output_layers == 0 {
            return Ok(Vec::new());
        }

        check_cancelled(ctx)?;
        let mut acc = Accumulator::new(self.layer_size, self.use_u32_accumulator);
        for d in 0..self.depth {
            for j in 0..acc.len() {
                let value = self.layer_value(start_layer + d, j);
                acc.add(j, value);
            }
        }

        let special = self.special_optimise_power_of_two;
        let post = self.post;
        let mut out = Vec::with_capacity(num_output_layers * self.layer_size);
        for step in 0..num_output_layers {
            if step % self.poll_interval == 0 {
                check_cancelled(ctx)?;
            }

            for j in 0..acc.len() {
                out.push(O::from_f64(post.apply(acc.get(j), special)));
            }

            if step + 1 < num_output_layers {
                let oldest = start_layer + step;
                let newest = start_layer + step + self.depth;
                for j in 0..acc.len() {
                    let out_value = self.layer_value(oldest, j);
                    acc.sub(j, out_value);
                    let in_value = self.layer_value(newest, j);
                    acc.add(j, in_value);
                }
            }
        }

        ctx.report_progress(num_output_layers, num_output_layers);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NullContext;

    /// 3 layers deep, 2 columns wide: layer `l` is `data[2l..2l+2]`.
    fn layered_data() -> [u8; 10] {
        [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]
    }

    #[test]
    fn initial_pass_sums_first_depth_layers_per_column() {
        let data = layered_data();
        let options = KernelOptions::new(ElementType::U8);
        let kernel =
            AxisRectangleFastPath::<u8, [u8]>::new(&data[..], 2, 3, &options, PostProcess::Identity)
                .unwrap();
        let out: Vec<u32> = kernel.get_layers(0, 1, &NullContext).unwrap();
        // columns: (1+3+5, 2+4+6)
        assert_eq!(out, vec![9, 12]);
    }

    #[test]
    fn main_loop_matches_naive_per_column_sliding_sum() {
        let data = layered_data();
        let options = KernelOptions::new(ElementType::U8);
        let kernel =
            AxisRectangleFastPath::<u8, [u8]>::new(&data[..], 2, 3, &options, PostProcess::Identity)
                .unwrap();
        // 5 layers total, depth 3 -> 3 valid output positions (0,1,2)
        let out: Vec<u32> = kernel.get_layers(0, 3, &NullContext).unwrap();

        let naive: Vec<u32> = (0..3)
            .flat_map(|start: usize| {
                (0..2).map(move |j| {
                    (start..start + 3)
                        .map(|l| u32::from(data[l * 2 + j]))
                        .sum::<u32>()
                })
            })
            .collect();
        assert_eq!(out, naive);
    }

    #[test]
    fn rejects_layer_size_not_dividing_length() {
        let data = layered_data();
        let options = KernelOptions::new(ElementType::U8);
        let result =
            AxisRectangleFastPath::<u8, [u8]>::new(&data[..], 3, 2, &options, PostProcess::Identity);
        assert!(matches!(result, Err(RankFilterError::InvalidInput(_))));
    }

    #[test]
    fn rejects_out_of_range_layer_request() {
        let data = layered_data();
        let options = KernelOptions::new(ElementType::U8);
        let kernel =
            AxisRectangleFastPath::<u8, [u8]>::new(&data[..], 2, 3, &options, PostProcess::Identity)
                .unwrap();
        let result = kernel.get_layers::<u32>(0, 4, &NullContext);
        assert!(matches!(result, Err(RankFilterError::OutOfRange { .. })));
    }

    #[test]
    fn new_within_budget_returns_none_when_over_budget() {
        let data = layered_data();
        let options = KernelOptions {
            axis_rect_memory_budget_bytes: 1,
            ..KernelOptions::new(ElementType::U8)
        };
        let kernel = AxisRectangleFastPath::<u8, [u8]>::new_within_budget::<u32>(
            &data[..],
            2,
            3,
            &options,
            PostProcess::Identity
        )
        .unwrap();
        assert!(kernel.is_none());
    }

    #[test]
    fn new_within_budget_returns_some_when_comfortably_within_budget() {
        let data = layered_data();
        let options = KernelOptions::new(ElementType::U8);
        let kernel = AxisRectangleFastPath::<u8, [u8]>::new_within_budget::<u32>(
            &data[..],
            2,
            3,
            &options,
            PostProcess::Identity
        )
        .unwrap();
        assert!(kernel.is_some());
    }

    #[test]
    fn small_budget_is_rejected_by_fits_budget() {
        let data = layered_data();
        let options = KernelOptions::new(ElementType::U8);
        let kernel =
            AxisRectangleFastPath::<u8, [u8]>::new(&data[..], 2, 3, &options, PostProcess::Identity)
                .unwrap();
        assert!(!kernel.fits_budget::<u32>(1));
        assert!(kernel.fits_budget::<u32>(1024));
    }
}
