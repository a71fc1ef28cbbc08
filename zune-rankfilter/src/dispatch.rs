/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The kernel dispatcher: picks a concrete kernel from a runtime
//! [`ElementType`] tag instead of requiring the caller to already know which
//! generic instantiation they need.
//!
//! Every kernel in [`crate::kernels`] is generic over its element type `T`
//! and storage `S`, resolved at compile time — that's the cheapest way to
//! run the inner loop, and it's why §9 of the design notes says "the seven
//! type dispatches live at kernel-construction time, not inside the inner
//! loop". This module is that one construction-time dispatch site: a caller
//! holding a matrix whose element type is only known at runtime (e.g. read
//! off a file header) hands this module a [`Matrix`] and gets back the
//! dispatcher's choice of kernel already run, without writing the seven-way
//! match themselves.
//!
//! [`Matrix::Other`] exists because [`ElementType`] is `#[non_exhaustive]`:
//! a future element type can be represented by the enum before this crate
//! grows a matching [`crate::quantize::Quantisable`] impl, and that case
//! must fail cleanly rather than fail to compile.

use crate::context::Context;
use crate::element_type::ElementType;
use crate::errors::{RankFilterError, Result};
use crate::kernels::percentile::{bit_average_between_percentiles, AverageBetweenPercentiles};
use crate::kernels::summator::{PostProcess, Summator};
use crate::options::KernelOptions;
use crate::pattern::Pattern;
use crate::traits::NumOps;

/// A matrix whose element type is carried at runtime, as a tagged union of
/// the seven directly-addressable slice storages the dispatcher knows how
/// to drive.
///
/// This is the dispatcher's own concrete stand-in for the externalised
/// Storage collaborator (`spec.md` §1's "out of scope" list) — real callers
/// with a richer storage (tiled, memory-mapped, paged for continuation
/// mode) skip this module entirely and construct a kernel directly, the way
/// the tests in `kernels::percentile`/`kernels::summator` do.
pub enum Matrix<'s> {
    /// Bit-packed one-per-byte, `0` or `1`.
    Bit(&'s [u8]),
    U8(&'s [u8]),
    U16(&'s [u16]),
    I32(&'s [i32]),
    I64(&'s [i64]),
    F32(&'s [f32]),
    F64(&'s [f64]),
    /// A type the caller tagged as some [`ElementType`] this build has no
    /// [`crate::quantize::Quantisable`] impl for. Always rejected with
    /// [`RankFilterError::UnsupportedElementType`].
    Other(ElementType)
}

impl Matrix<'_> {
    /// The [`ElementType`] this matrix carries.
    pub const fn element_type(&self) -> ElementType {
        match self {
            Matrix::Bit(_) => ElementType::Bit,
            Matrix::U8(_) => ElementType::U8,
            Matrix::U16(_) => ElementType::U16,
            Matrix::I32(_) => ElementType::I32,
            Matrix::I64(_) => ElementType::I64,
            Matrix::F32(_) => ElementType::F32,
            Matrix::F64(_) => ElementType::F64,
            Matrix::Other(ty) => *ty
        }
    }
}

/// Compute the mean of the sorted aperture between percentile indices
/// `p_index1` and `p_index2`, for every output position in
/// `[array_pos, array_pos + count)`.
///
/// Picks the zero-count closed form for [`Matrix::Bit`] (§4.5's bit-only
/// closed form, which never builds a histogram), and the general
/// [`AverageBetweenPercentiles`] kernel for every other supported type.
/// `options.element_type` is not consulted for the choice itself — `matrix`
/// already carries the type tag — but a mismatch between the two is a
/// caller bug, not silently ignored.
///
/// # Errors
/// Returns [`RankFilterError::UnsupportedElementType`] for [`Matrix::Other`].
/// Returns [`RankFilterError::InvalidInput`] if `options.element_type`
/// disagrees with `matrix`'s actual type, if `options.number_of_analysed_bits`
/// is out of range, or if either percentile index is `NaN`. Returns
/// [`RankFilterError::OutOfRange`] if the requested range exceeds the
/// matrix length, and propagates cancellation from `ctx`.
pub fn average_between_percentiles(
    matrix: &Matrix, pattern: &Pattern, options: &KernelOptions, array_pos: usize, count: usize,
    p_index1: f64, p_index2: f64, ctx: &impl Context
) -> Result<Vec<f64>> {
    check_element_type(matrix, options)?;

    match matrix {
        Matrix::Bit(data) => bit_average_between_percentiles(
            *data, pattern, options, array_pos, count, p_index1, p_index2, ctx
        ),
        Matrix::U8(data) => {
            AverageBetweenPercentiles::new(*data, pattern, options)?
                .get_range(array_pos, count, p_index1, p_index2, ctx)
        }
        Matrix::U16(data) => {
            AverageBetweenPercentiles::new(*data, pattern, options)?
                .get_range(array_pos, count, p_index1, p_index2, ctx)
        }
        Matrix::I32(data) => {
            AverageBetweenPercentiles::new(*data, pattern, options)?
                .get_range(array_pos, count, p_index1, p_index2, ctx)
        }
        Matrix::I64(data) => {
            AverageBetweenPercentiles::new(*data, pattern, options)?
                .get_range(array_pos, count, p_index1, p_index2, ctx)
        }
        Matrix::F32(data) => {
            AverageBetweenPercentiles::new(*data, pattern, options)?
                .get_range(array_pos, count, p_index1, p_index2, ctx)
        }
        Matrix::F64(data) => {
            AverageBetweenPercentiles::new(*data, pattern, options)?
                .get_range(array_pos, count, p_index1, p_index2, ctx)
        }
        Matrix::Other(ty) => Err(RankFilterError::UnsupportedElementType(*ty))
    }
}

/// Run the running-sum kernel (C6) with post-processing function `post`,
/// producing `count` outputs of type `O` starting at `array_pos`.
///
/// # Errors
/// Returns [`RankFilterError::UnsupportedElementType`] for [`Matrix::Other`].
/// Returns [`RankFilterError::InvalidInput`] if `options.element_type`
/// disagrees with `matrix`'s actual type. Returns
/// [`RankFilterError::OutOfRange`] if the requested range exceeds the matrix
/// length, and propagates cancellation from `ctx`.
pub fn sum_with_post_process<O: NumOps<O>>(
    matrix: &Matrix, pattern: &Pattern, options: &KernelOptions, post: PostProcess,
    array_pos: usize, count: usize, ctx: &impl Context
) -> Result<Vec<O>> {
    check_element_type(matrix, options)?;

    match matrix {
        Matrix::Bit(data) | Matrix::U8(data) => {
            Summator::new(*data, pattern, options, post).get_range(array_pos, count, ctx)
        }
        Matrix::U16(data) => Summator::new(*data, pattern, options, post).get_range(array_pos, count, ctx),
        Matrix::I32(data) => Summator::new(*data, pattern, options, post).get_range(array_pos, count, ctx),
        Matrix::I64(data) => Summator::new(*data, pattern, options, post).get_range(array_pos, count, ctx),
        Matrix::F32(data) => Summator::new(*data, pattern, options, post).get_range(array_pos, count, ctx),
        Matrix::F64(data) => Summator::new(*data, pattern, options, post).get_range(array_pos, count, ctx),
        Matrix::Other(ty) => Err(RankFilterError::UnsupportedElementType(*ty))
    }
}

fn check_element_type(matrix: &Matrix, options: &KernelOptions) -> Result<()> {
    let actual = matrix.element_type();
    if actual != options.element_type {
        return Err(RankFilterError::InvalidInput(format!(
            "options.element_type is {} but the matrix carries {actual}",
            options.element_type
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NullContext;

    fn three_wide_pattern() -> Pattern {
        Pattern::new(vec![0, 1, 2], vec![0], vec![2]).unwrap()
    }

    #[test]
    fn dispatches_u8_percentile_to_general_kernel() {
        let data: [u8; 6] = [10, 20, 30, 40, 50, 60];
        let matrix = Matrix::U8(&data);
        let pattern = three_wide_pattern();
        let options = KernelOptions::new(ElementType::U8);
        let out = average_between_percentiles(&matrix, &pattern, &options, 0, 6, 0.0, 3.0, &NullContext)
            .unwrap();
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn dispatches_bit_percentile_to_closed_form() {
        let data: [u8; 6] = [1, 0, 1, 1, 0, 0];
        let matrix = Matrix::Bit(&data);
        let pattern = three_wide_pattern();
        let options = KernelOptions {
            filler: 99.0,
            ..KernelOptions::new(ElementType::Bit)
        };
        let out = average_between_percentiles(&matrix, &pattern, &options, 0, 6, 3.0, 3.0, &NullContext)
            .unwrap();
        assert_eq!(out, vec![99.0; 6]);
    }

    #[test]
    fn rejects_other_element_type() {
        let matrix = Matrix::Other(ElementType::F64);
        let pattern = three_wide_pattern();
        let options = KernelOptions::new(ElementType::F64);
        let result =
            average_between_percentiles(&matrix, &pattern, &options, 0, 1, 0.0, 1.0, &NullContext);
        assert!(matches!(result, Err(RankFilterError::UnsupportedElementType(_))));
    }

    #[test]
    fn rejects_mismatched_element_type() {
        let data: [u8; 4] = [1, 2, 3, 4];
        let matrix = Matrix::U8(&data);
        let pattern = three_wide_pattern();
        let options = KernelOptions::new(ElementType::U16);
        let result =
            average_between_percentiles(&matrix, &pattern, &options, 0, 4, 0.0, 1.0, &NullContext);
        assert!(matches!(result, Err(RankFilterError::InvalidInput(_))));
    }

    #[test]
    fn dispatches_summation_for_every_integer_and_float_type() {
        let pattern = three_wide_pattern();

        let u8_data: [u8; 3] = [1, 2, 3];
        let u16_data: [u16; 3] = [1, 2, 3];
        let i32_data: [i32; 3] = [1, 2, 3];
        let i64_data: [i64; 3] = [1, 2, 3];
        let f32_data: [f32; 3] = [1.0, 2.0, 3.0];
        let f64_data: [f64; 3] = [1.0, 2.0, 3.0];

        let cases: [(Matrix, ElementType); 6] = [
            (Matrix::U8(&u8_data), ElementType::U8),
            (Matrix::U16(&u16_data), ElementType::U16),
            (Matrix::I32(&i32_data), ElementType::I32),
            (Matrix::I64(&i64_data), ElementType::I64),
            (Matrix::F32(&f32_data), ElementType::F32),
            (Matrix::F64(&f64_data), ElementType::F64)
        ];

        for (matrix, ty) in cases {
            let options = KernelOptions::new(ty);
            let out: Vec<f64> =
                sum_with_post_process(&matrix, &pattern, &options, PostProcess::Identity, 0, 3, &NullContext)
                    .unwrap();
            assert!((out[0] - 6.0).abs() < 1e-9, "{ty} summed to {}", out[0]);
        }
    }
}
