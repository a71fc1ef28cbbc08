/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Type-specialised realisations of the sliding-window driver.
//!
//! Each kernel owns the per-type quantisation and the choice of aperture
//! state the driver slides: [`percentile`] uses the histogram machinery,
//! [`summator`] uses a scalar running sum, and [`axis_rect`] bypasses the
//! driver entirely for axis-aligned rectangular patterns in favour of a
//! per-layer accumulator vector.

pub mod axis_rect;
pub mod percentile;
pub mod summator;
