/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Core utilities shared by the zune family of crates.
//!
//! Today that's just the namespaced logging macros in [`log`]; other zune
//! crates historically also put shared bit-depth/colorspace types here, but
//! `zune-rankfilter` has no use for those, so this build carries only the
//! ambient concern every kernel actually needs.

pub mod log;
