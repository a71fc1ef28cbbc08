/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Kernel configuration.
//!
//! Every tunable the kernels read lives here as a public field, in the same
//! style as `zune_core::options::DecoderOptions`: no getters/setters, each
//! field documents its own default and effect directly above it.

use crate::element_type::ElementType;

/// Configuration shared by every kernel the dispatcher can pick.
///
/// Not every option is respected by every kernel — each field says which
/// kernels respect it.
#[derive(Debug, Clone)]
pub struct KernelOptions {
    /// The numeric type of the matrix elements.
    ///
    /// Selects the quantiser. Respected by: all kernels.
    pub element_type: ElementType,

    /// Histogram resolution `2^k`, clamped to `[1, 30]` for integers and
    /// `[1, 32]` for floats by `Quantiser::new`.
    ///
    /// - Default value: 8
    /// - Respected by: the histogram-backed kernels (not the bit kernel,
    ///   not the summator).
    pub number_of_analysed_bits: u32,

    /// Extra coarse companion histograms, sorted ascending; the last entry
    /// must equal `number_of_analysed_bits`. Empty means single-level.
    ///
    /// - Default value: empty (single-level histogram)
    /// - Respected by: `SummingHistogram`'s rank-seek.
    pub bit_levels: Vec<u8>,

    /// Simple (piecewise-constant) vs interpolated (piecewise-linear)
    /// integral.
    ///
    /// - Default value: `false`
    /// - Respected by: the percentile kernels.
    pub interpolated: bool,

    /// Output value for a degenerate percentile range (`pIndex1 >= pIndex2`).
    ///
    /// - Default value: `0.0`
    /// - Respected by: the percentile kernels.
    pub filler: f64,

    /// Enable the `HistogramCache`-driven ranged-read restart.
    ///
    /// - Default value: `true`
    /// - Respected by: the driver.
    pub optimise_get_range: bool,

    /// Enable the direct-buffer fast path when `Storage::backing_buffer`
    /// returns `Some`.
    ///
    /// - Default value: `true`
    /// - Respected by: the driver.
    pub optimise_direct_arrays: bool,

    /// Use the inline single-level, non-interpolated histogram instead of
    /// the full `SummingHistogram` machinery when `bit_levels` is empty and
    /// `interpolated` is `false`.
    ///
    /// - Default value: `true`
    /// - Respected by: nobody yet. `HistogramPair` is a single `Bars` plus
    ///   two cursors either way, so today's percentile kernel has no
    ///   separate "inline" representation to switch to — this field is
    ///   carried from the config table in spec.md §6 for a caller that
    ///   builds its own inline fast path on top of `Bars` directly. Reading
    ///   it is that caller's responsibility, not this crate's.
    pub inline_one_level: bool,

    /// Enable `AxisRectangleFastPath` for axis-aligned rectangular patterns.
    ///
    /// - Default value: `true`
    /// - Respected by: nobody yet. `dispatch::sum_with_post_process` only
    ///   ever builds a `Summator`: choosing `AxisRectangleFastPath` needs
    ///   the pattern's `layer_size`/`depth` classification, which is the
    ///   out-of-scope Pattern collaborator's job (see `DESIGN.md`), not
    ///   something `dispatch::Matrix`'s flat slices carry. A caller that
    ///   already has that classification reads this field itself before
    ///   choosing between `kernels::axis_rect::AxisRectangleFastPath` and
    ///   `kernels::summator::Summator`.
    pub optimise_segments_along_axes: bool,

    /// Use `(sum + 2^(L-1)) >> L` instead of floating-point division when
    /// the summator's post-processing function is "mean by a power of two".
    ///
    /// - Default value: `true`
    /// - Respected by: `Summator`.
    pub special_optimise_power_of_two: bool,

    /// Upper bound, in bytes, on the scratch memory `AxisRectangleFastPath`
    /// may allocate for its accumulator vector before falling back to the
    /// per-layer streaming indexed driver.
    ///
    /// - Default value: 64 MiB
    /// - Respected by: `AxisRectangleFastPath`.
    pub axis_rect_memory_budget_bytes: usize,

    /// How many processed elements pass between `Context::is_cancelled`
    /// polls.
    ///
    /// - Default value: 65536
    /// - Respected by: the driver.
    pub progress_poll_interval: usize
}

impl Default for KernelOptions {
    fn default() -> Self {
        KernelOptions {
            element_type: ElementType::U8,
            number_of_analysed_bits: 8,
            bit_levels: Vec::new(),
            interpolated: false,
            filler: 0.0,
            optimise_get_range: true,
            optimise_direct_arrays: true,
            inline_one_level: true,
            optimise_segments_along_axes: true,
            special_optimise_power_of_two: true,
            axis_rect_memory_budget_bytes: 64 * 1024 * 1024,
            progress_poll_interval: 65536
        }
    }
}

impl KernelOptions {
    /// Start from [`KernelOptions::default`] and set the element type —
    /// the one field nearly every caller needs to override immediately.
    #[must_use]
    pub fn new(element_type: ElementType) -> Self {
        KernelOptions {
            element_type,
            ..KernelOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let opts = KernelOptions::default();
        assert_eq!(opts.number_of_analysed_bits, 8);
        assert!(opts.bit_levels.is_empty());
        assert!(!opts.interpolated);
        assert_eq!(opts.progress_poll_interval, 65536);
    }
}
