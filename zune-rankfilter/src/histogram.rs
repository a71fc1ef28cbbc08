/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The incremental histogram / running-rank engine (C2).
//!
//! [`Bars`] owns the occupancy counts (and, optionally, a stack of coarser
//! companion histograms for faster rank seeks). [`Cursor`] is a
//! `(cur_value, cur_rank, cur_sum)` read position over those counts; more
//! than one `Cursor` can read the same `Bars` at once, which is exactly the
//! mechanism [`HistogramPair`] uses to answer "integral between rank₁ and
//! rank₂" without duplicating the bars array.

use crate::errors::{RankFilterError, Result};

/// One coarser companion histogram: `counts[g]` aggregates
/// `2^(k_finest - k)` consecutive fine bars into group `g`, and
/// `sums[g]` is the value-weighted sum of that same group, so a rank seek
/// can skip a whole group in O(1) instead of descending into it.
#[derive(Clone, Debug)]
struct Level {
    k:      u32,
    counts: Vec<u32>,
    sums:   Vec<u64>
}

impl Level {
    fn new(k: u32) -> Self {
        let size = 1usize << k;
        Level {
            k,
            counts: vec![0; size],
            sums: vec![0; size]
        }
    }
}

/// The occupancy array of a sliding aperture, plus its optional multi-level
/// companions.
#[derive(Clone, Debug)]
pub struct Bars {
    k:      u32,
    counts: Vec<u32>,
    levels: Vec<Level>,
    n:      u32
}

impl Bars {
    /// Build an empty `Bars` with `2^k` bars and coarse companion levels at
    /// each resolution in `bit_levels` strictly below `k`.
    ///
    /// A caller's `bit_levels` list conventionally ends with an entry equal
    /// to `number_of_analysed_bits` itself (the finest resolution); that
    /// entry is redundant with `counts` here and is filtered out rather
    /// than built as a duplicate level.
    pub fn new(k: u32, bit_levels: &[u8]) -> Self {
        let mut levels: Vec<Level> = bit_levels
            .iter()
            .map(|&lvl_k| u32::from(lvl_k))
            .filter(|&lvl_k| lvl_k < k)
            .map(Level::new)
            .collect();
        levels.sort_by_key(|lvl| lvl.k);
        levels.dedup_by_key(|lvl| lvl.k);
        Bars {
            k,
            counts: vec![0; 1usize << k],
            levels,
            n: 0
        }
    }

    #[inline]
    pub const fn k(&self) -> u32 {
        self.k
    }

    #[inline]
    pub const fn bar_count(&self) -> u32 {
        1u32 << self.k
    }

    /// `N`, the current aperture size (`sum(bars)`).
    #[inline]
    pub const fn count(&self) -> u32 {
        self.n
    }

    /// `bars[bar] += 1`. `sum(bars) == N` holds after any sequence of
    /// `include`/`exclude` calls.
    pub fn include(&mut self, bar: u32) {
        let k = self.k;
        self.counts[bar as usize] += 1;
        self.n += 1;
        for level in &mut self.levels {
            let g = (bar >> (k - level.k)) as usize;
            level.counts[g] += 1;
            level.sums[g] += u64::from(bar);
        }
    }

    /// `bars[bar] -= 1`. Panics (via `assert!`, not `debug_assert!` — this
    /// check must stay live in release builds) if `bars[bar]` is already
    /// zero.
    pub fn exclude(&mut self, bar: u32) {
        assert!(
            self.counts[bar as usize] > 0,
            "excluded bar {bar} has zero count: negative bar count"
        );
        let k = self.k;
        self.counts[bar as usize] -= 1;
        self.n -= 1;
        for level in &mut self.levels {
            let g = (bar >> (k - level.k)) as usize;
            level.counts[g] -= 1;
            level.sums[g] -= u64::from(bar);
        }
    }

    /// Locate the bar `v` such that `rank_before <= r < rank_before +
    /// bars[v]`, descending through the coarse levels (coarsest first) to
    /// skip whole groups before falling back to a bar-by-bar scan of the
    /// remaining (narrow) range. Returns `(v, rank_before, sum_before)`
    /// where `sum_before = Σ_{w<v} w·bars[w]`.
    ///
    /// Caller contract: `r < self.count()`; the `r == N` tie-break lives in
    /// [`Bars::locate_decreasing`].
    fn locate(&self, r: u32) -> (u32, u32, u64) {
        let mut range_start: u32 = 0;
        let mut range_width: u32 = self.bar_count();
        let mut rank: u32 = 0;
        let mut sum: u64 = 0;

        for level in &self.levels {
            let group_width = 1u32 << (self.k - level.k);
            let first_group = range_start / group_width;
            let num_groups = range_width / group_width;
            let mut narrowed = false;

            for g in first_group..(first_group + num_groups) {
                let c = level.counts[g as usize];
                if rank + c > r {
                    range_start = g * group_width;
                    range_width = group_width;
                    narrowed = true;
                    break;
                }
                rank += c;
                sum += level.sums[g as usize];
            }
            if !narrowed {
                // rank falls exactly on the boundary of the last group at
                // this level's resolution; nothing left to narrow, the
                // fine scan below covers the remaining tail.
                break;
            }
        }

        for v in range_start..(range_start + range_width) {
            let c = self.counts[v as usize];
            if rank + c > r {
                return (v, rank, sum);
            }
            rank += c;
            sum += u64::from(v) * u64::from(c);
        }
        // r == count(): every bar accounted for without one containing it.
        (self.bar_count(), rank, sum)
    }

    /// The `r == N` tie-break: the smallest `cur_value` such that every bar
    /// at or above it is zero.
    fn locate_decreasing(&self) -> (u32, u32, u64) {
        match self.counts.iter().rposition(|&c| c > 0) {
            Some(last_nonzero) => {
                let mut sum = 0u64;
                for (v, &c) in self.counts.iter().enumerate() {
                    sum += v as u64 * u64::from(c);
                }
                ((last_nonzero + 1) as u32, self.n, sum)
            }
            None => (0, 0, 0)
        }
    }
}

/// A `(cur_value, cur_rank, cur_sum)` read position over a [`Bars`].
#[derive(Copy, Clone, Debug, Default)]
pub struct Cursor {
    cur_value: u32,
    cur_rank:  u32,
    cur_sum:   u64
}

impl Cursor {
    pub const fn new() -> Self {
        Cursor {
            cur_value: 0,
            cur_rank:  0,
            cur_sum:   0
        }
    }

    #[inline]
    pub const fn cur_value(&self) -> u32 {
        self.cur_value
    }

    #[inline]
    pub const fn cur_rank(&self) -> u32 {
        self.cur_rank
    }

    fn note_include(&mut self, bar: u32) {
        if bar < self.cur_value {
            self.cur_rank += 1;
            self.cur_sum += u64::from(bar);
        }
    }

    fn note_exclude(&mut self, bar: u32) {
        if bar < self.cur_value {
            assert!(self.cur_rank > 0, "rank inconsistency: cur_rank underflow");
            self.cur_rank -= 1;
            self.cur_sum -= u64::from(bar);
        }
    }

    /// Advance so that `cur_rank <= r < cur_rank + bars[cur_value]`, except
    /// at `r == bars.count()` where the decreasing tie-break applies.
    pub fn move_to_rank(&mut self, bars: &Bars, r: u32) {
        let (value, rank, sum) = if r == bars.count() {
            bars.locate_decreasing()
        } else {
            bars.locate(r)
        };
        self.cur_value = value;
        self.cur_rank = rank;
        self.cur_sum = sum;
    }

    /// As [`Cursor::move_to_rank`], but `r` is real-valued: the integer
    /// floor is located and the fractional remainder is left for
    /// [`Cursor::current_integral`]/[`Cursor::current_precise_integral`] to
    /// interpolate with.
    pub fn move_to_precise_rank(&mut self, bars: &Bars, r: f64) {
        let clamped = r.max(0.0).min(f64::from(bars.count()));
        self.move_to_rank(bars, clamped.floor() as u32);
    }

    /// The simple (piecewise-constant histogram) integral evaluated at real
    /// rank `r`, with the cursor fixed at its current position:
    /// `Σ_{v<cur_value} v·bars[v] + (r−cur_rank)·cur_value`.
    pub fn current_integral(&self, r: f64) -> f64 {
        (self.cur_sum as f64) + (r - f64::from(self.cur_rank)) * f64::from(self.cur_value)
    }

    /// The piecewise-linear integral: the aperture is modelled as bars of
    /// width 1 in rank-space and height `1/bars[v]` in value-space.
    pub fn current_precise_integral(&self, bars: &Bars, r: f64) -> f64 {
        let base = (self.cur_sum as f64) + 0.5 * f64::from(self.cur_rank);
        let remainder = r - f64::from(self.cur_rank);
        let bar_at_cursor = bars
            .counts
            .get(self.cur_value as usize)
            .copied()
            .unwrap_or(0);
        let delta = if bar_at_cursor > 0 {
            remainder / f64::from(bar_at_cursor)
        } else {
            0.0
        };
        base + remainder * (f64::from(self.cur_value) + 0.5 * delta)
    }
}

/// Two cursors sharing one `Bars` array, used to answer "integral between
/// rank₁ and rank₂" with a single histogram instead of two independent
/// ones.
#[derive(Clone, Debug)]
pub struct HistogramPair {
    bars:    Bars,
    cursor1: Cursor,
    cursor2: Cursor
}

impl HistogramPair {
    pub fn new(k: u32, bit_levels: &[u8]) -> Self {
        HistogramPair {
            bars:    Bars::new(k, bit_levels),
            cursor1: Cursor::new(),
            cursor2: Cursor::new()
        }
    }

    #[inline]
    pub const fn bars(&self) -> &Bars {
        &self.bars
    }

    #[inline]
    pub const fn cursor1(&self) -> &Cursor {
        &self.cursor1
    }

    #[inline]
    pub const fn cursor2(&self) -> &Cursor {
        &self.cursor2
    }

    /// `include` on the shared bars, keeping both cursors' invariants in
    /// lock-step: a mutation is never visible to one cursor without the
    /// other.
    pub fn include(&mut self, bar: u32) {
        self.bars.include(bar);
        self.cursor1.note_include(bar);
        self.cursor2.note_include(bar);
    }

    pub fn exclude(&mut self, bar: u32) {
        self.bars.exclude(bar);
        self.cursor1.note_exclude(bar);
        self.cursor2.note_exclude(bar);
    }

    /// `current_integral(cursor2) - current_integral(cursor1)` after moving
    /// each cursor to its requested rank, simple or interpolated per
    /// `interpolated`. Used by the percentile kernels' "integral between
    /// pIndex1 and pIndex2".
    ///
    /// # Errors
    /// Returns [`RankFilterError::InternalInvariant`] if the resulting
    /// integral is negative. An integral must never be negative; a
    /// violation is a programmer error, not a data error.
    pub fn integral_between(&mut self, p1: f64, p2: f64, interpolated: bool) -> Result<f64> {
        self.cursor1.move_to_precise_rank(&self.bars, p1);
        self.cursor2.move_to_precise_rank(&self.bars, p2);

        let integral = if interpolated {
            self.cursor2.current_precise_integral(&self.bars, p2)
                - self.cursor1.current_precise_integral(&self.bars, p1)
        } else {
            self.cursor2.current_integral(p2) - self.cursor1.current_integral(p1)
        };

        if integral < -1e-9 {
            return Err(RankFilterError::InternalInvariant(format!(
                "integral between ranks {p1} and {p2} was negative: {integral}"
            )));
        }
        Ok(integral.max(0.0))
    }
}

impl crate::driver::ApertureState for Bars {
    fn include(&mut self, bar: u32) {
        Bars::include(self, bar);
    }

    fn exclude(&mut self, bar: u32) {
        Bars::exclude(self, bar);
    }
}

impl crate::driver::ApertureState for HistogramPair {
    fn include(&mut self, bar: u32) {
        HistogramPair::include(self, bar);
    }

    fn exclude(&mut self, bar: u32) {
        HistogramPair::exclude(self, bar);
    }
}

#[cfg(test)]
mod tests {
    use nanorand::{Rng, WyRand};

    use super::*;

    fn sum_conserved(bars: &Bars, expected: u32) {
        let total: u32 = bars.counts.iter().sum();
        assert_eq!(total, expected);
        assert_eq!(bars.count(), expected);
    }

    #[test]
    fn aperture_sum_conservation_single_level() {
        let mut pair = HistogramPair::new(3, &[]);
        for v in [1u32, 2, 2, 5, 7] {
            pair.include(v);
        }
        sum_conserved(pair.bars(), 5);
        pair.exclude(2);
        sum_conserved(pair.bars(), 4);
    }

    #[test]
    fn aperture_sum_conservation_multi_level_matches_single_level() {
        let mut rng = WyRand::new_seed(42);
        let mut with_levels = HistogramPair::new(6, &[2, 4]);
        let mut without_levels = HistogramPair::new(6, &[]);

        let mut present = Vec::new();
        for _ in 0..500 {
            let bar = rng.generate_range(0u32..64);
            if present.len() < 8 || rng.generate_range(0u32..2) == 0 {
                with_levels.include(bar);
                without_levels.include(bar);
                present.push(bar);
            } else {
                let idx = rng.generate_range(0..present.len());
                let bar = present.swap_remove(idx);
                with_levels.exclude(bar);
                without_levels.exclude(bar);
            }
            assert_eq!(with_levels.bars().count(), without_levels.bars().count());
        }

        // Same rank seek must agree regardless of whether coarse levels
        // are present: they are a speed optimisation, not a semantic
        // change.
        let n = with_levels.bars().count();
        for r in 0..=n {
            let mut c1 = Cursor::new();
            let mut c2 = Cursor::new();
            c1.move_to_rank(with_levels.bars(), r);
            c2.move_to_rank(without_levels.bars(), r);
            assert_eq!(c1.cur_value(), c2.cur_value());
            assert_eq!(c1.cur_rank(), c2.cur_rank());
        }
    }

    #[test]
    fn monotone_simple_integral_with_cursor_fixed() {
        let mut pair = HistogramPair::new(4, &[]);
        for v in [1u32, 3, 3, 7, 9, 9, 9, 12] {
            pair.include(v);
        }
        let n = pair.bars().count();
        let mut cursor = Cursor::new();
        cursor.move_to_rank(pair.bars(), n / 2);

        let mut last = f64::MIN;
        let mut r = 0.0;
        while r <= f64::from(n) {
            let integral = cursor.current_integral(r);
            assert!(integral + 1e-9 >= last);
            last = integral;
            r += 0.25;
        }
    }

    #[test]
    fn precise_equals_simple_plus_half_remainder_when_bars_are_singletons() {
        let mut pair = HistogramPair::new(5, &[]);
        for v in [0u32, 2, 5, 9, 17, 30] {
            pair.include(v);
        }
        let n = pair.bars().count();
        for r in 0..=n {
            let mut simple = Cursor::new();
            let mut precise = Cursor::new();
            simple.move_to_rank(pair.bars(), r);
            precise.move_to_rank(pair.bars(), r);

            let rf = f64::from(r);
            let expected = simple.current_integral(rf) + 0.5 * (rf - f64::from(simple.cur_rank()));
            let got = precise.current_precise_integral(pair.bars(), rf);
            assert!((expected - got).abs() < 1e-9, "r={r} expected={expected} got={got}");
        }
    }

    #[test]
    fn precise_integral_spans_full_range_to_value_weighted_total() {
        let mut pair = HistogramPair::new(4, &[]);
        let values = [1u32, 1, 3, 3, 3, 7, 9, 9, 12];
        for v in values {
            pair.include(v);
        }
        let n = pair.bars().count();

        let mut at_n = Cursor::new();
        at_n.move_to_rank(pair.bars(), n);
        let mut at_0 = Cursor::new();
        at_0.move_to_rank(pair.bars(), 0);

        let total = at_n.current_precise_integral(pair.bars(), f64::from(n))
            - at_0.current_precise_integral(pair.bars(), 0.0);
        let expected: f64 = values.iter().map(|&v| f64::from(v) + 0.5).sum();
        assert!((total - expected).abs() < 1e-9);
    }

    #[test]
    fn decreasing_branch_finds_smallest_all_zero_tail() {
        let mut pair = HistogramPair::new(2, &[]);
        pair.include(0);
        pair.include(0);
        // bars = [2, 0, 0, 0]; at r == N the cursor should land on 1, not 4.
        let mut cursor = Cursor::new();
        cursor.move_to_rank(pair.bars(), pair.bars().count());
        assert_eq!(cursor.cur_value(), 1);
        assert_eq!(cursor.cur_rank(), 2);
    }
}
