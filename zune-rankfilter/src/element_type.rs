/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The numeric element type a matrix is made of.
//!
//! This is bookkeeping only: it tells [`crate::options::KernelOptions`] and
//! error messages which of the seven supported sample types a caller is
//! using. The actual per-type behaviour lives in the
//! [`crate::quantize::Quantisable`] trait impls, not in a match on this
//! enum, so supporting an eighth type only ever means adding a trait impl.

/// One of the seven numeric element types the core understands.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum ElementType {
    /// A single bit per element, stored one-per-byte by the `Storage`
    /// collaborator. Never quantised into a general histogram; the bit
    /// kernel only ever needs the zero-count of the aperture.
    Bit,
    U8,
    U16,
    I32,
    I64,
    F32,
    F64
}

impl ElementType {
    /// Ceiling on `number_of_analysed_bits` for this type, i.e. the most
    /// resolution the quantiser can ever use. `i32`/`i64` cap below their
    /// real bit width (30, not 31/63) to leave the sign handling the
    /// quantiser does its own headroom; see
    /// [`crate::quantize::Quantisable`].
    pub const fn native_bits(self) -> u32 {
        match self {
            Self::Bit => 1,
            Self::U8 => 8,
            Self::U16 => 16,
            Self::I32 | Self::I64 => 30,
            Self::F32 | Self::F64 => 32
        }
    }

    pub const fn is_floating(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I32 | Self::I64 | Self::F32 | Self::F64)
    }

    /// Human-readable name, used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bit => "bit",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64"
        }
    }
}

impl core::fmt::Display for ElementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
