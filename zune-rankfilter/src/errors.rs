/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Errors possible while computing a sliding-aperture rank/sum statistic.
use std::fmt::{Debug, Display, Formatter};

use crate::element_type::ElementType;

/// All errors the core can raise.
///
/// This is deliberately a flat enum rather than a tree of per-component
/// error types: every variant already names the component that raised it,
/// and there is exactly one caller-facing surface (the kernel dispatcher),
/// so a tree would only add indirection.
pub enum RankFilterError {
    /// A percentile index (`pIndex1`/`pIndex2`) was `NaN`, `number_of_analysed_bits`
    /// was out of range, or the `left`/`right` update vectors had mismatched
    /// lengths.
    InvalidInput(String),
    /// The requested `array_pos` or `array_pos + count` exceeds the matrix
    /// length.
    OutOfRange {
        requested: usize,
        length:    usize
    },
    /// The input element type is none of the seven supported types.
    UnsupportedElementType(ElementType),
    /// `|shifts|` or a per-step update vector would exceed what fits in an
    /// `i32`-sized index space.
    TooLargePattern(usize),
    /// `layer_size` or the product of the matrix dimensions overflows what
    /// the core can address.
    TooLargeDimensions(String),
    /// A debug-mode cross-check fired: a negative bar count, a negative
    /// integral, or a rank inconsistent with the cursor invariant. This is
    /// always a programming bug in the caller or in this crate, never a
    /// user-data problem.
    InternalInvariant(String),
    /// The `Context` reported cancellation at a poll point. Surfaced as an
    /// error rather than a sentinel return value so it propagates through
    /// `?` exactly like every other abort condition.
    Cancelled
}

impl Display for RankFilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(reason) => write!(f, "invalid input: {reason}"),
            Self::OutOfRange { requested, length } => write!(
                f,
                "requested range end {requested} exceeds matrix length {length}"
            ),
            Self::UnsupportedElementType(ty) => {
                write!(f, "unsupported element type: {ty}")
            }
            Self::TooLargePattern(n) => {
                write!(f, "pattern of {n} shifts is too large to index with an i32")
            }
            Self::TooLargeDimensions(reason) => write!(f, "dimensions too large: {reason}"),
            Self::InternalInvariant(reason) => {
                write!(f, "internal invariant violated: {reason}")
            }
            Self::Cancelled => write!(f, "computation cancelled"),
        }
    }
}

impl Debug for RankFilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for RankFilterError {}

pub type Result<T> = std::result::Result<T, RankFilterError>;
