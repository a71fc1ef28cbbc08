/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

#![warn(
    clippy::correctness,
    clippy::perf,
    clippy::pedantic,
    clippy::inline_always,
    clippy::missing_errors_doc,
    clippy::panic
)]
#![allow(
    clippy::needless_return,
    clippy::similar_names,
    clippy::inline_always,
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::wildcard_imports
)]

//! Sliding-aperture rank/sum statistics over N-dimensional numeric
//! matrices, using an incremental histogram so that repeated contiguous
//! queries are O(1)-amortised instead of O(N) per query.
//!
//! The crate is a small set of collaborators wired together by
//! [`driver::ShiftDriver`]:
//! - [`element_type`] names the seven supported sample types.
//! - [`quantize`] buckets a sample into a bounded-resolution bar index.
//! - [`storage`] is the caller's array, addressed circularly.
//! - [`pattern`] is the aperture's shift geometry.
//! - [`histogram`] is the incremental rank/sum structure itself.
//! - [`cache`] remembers the aperture state across contiguous reads.
//! - [`context`] is the cancellation/progress-reporting seam.
//! - [`options`] is every tunable, gathered in one place.
//! - [`kernels`] are the type-specialised entry points callers actually use.
//! - [`dispatch`] picks one of those kernels from a runtime [`element_type::ElementType`]
//!   tag, for callers that don't already know `T` at compile time.

pub mod cache;
pub mod context;
pub mod dispatch;
pub mod driver;
pub mod element_type;
pub mod errors;
pub mod histogram;
pub mod kernels;
pub mod options;
pub mod pattern;
pub mod quantize;
pub mod storage;
pub mod traits;
