//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Low-level definitions for working with the wire format.
//!
//! External code generally should not use things from this module; the
//! `ser`, `de`, and `conv` modules provide the intended surface. It is
//! exposed for the benefit of the schema compiler and alternate
//! implementations.

use error::{Error, Result};

/// The maximum number of bytes a 64-bit varint can occupy.
pub const MAX_VINT_LEN: usize = 10;

/// The 4-bit body-encoding discipline carried in the low nibble of every
/// prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WireType {
    /// One varint body, zig-zagged when it holds a signed value.
    Vint = 0,
    /// Varint byte length, varint element count, then elements.
    Tuple = 1,
    /// 1-byte body.
    Bits8 = 2,
    /// Same layout as `Tuple`; the wire form of lists and arrays.
    Htuple = 3,
    /// 4-byte little-endian body.
    Bits32 = 4,
    /// Varint byte length then raw bytes.
    Bytes = 5,
    /// 8-byte little-endian body holding a long integer.
    Bits64Long = 6,
    /// Varint byte length then an opaque body. Reserved for a future map
    /// type; readers skip it but never promote it.
    Assoc = 7,
    /// 8-byte little-endian body holding an IEEE-754 double.
    Bits64Float = 8,
    /// A constant sum constructor. No body.
    Enum = 10,
}

impl WireType {
    /// Decodes a wire type from the low nibble of a prefix.
    ///
    /// Fails with `BadWireType` on the reserved sentinel 15 and on the
    /// nibbles that encode nothing (9, 11..14).
    pub fn from_nibble(n: u8) -> Result<Self> {
        use self::WireType::*;

        Ok(match n {
            0 => Vint,
            1 => Tuple,
            2 => Bits8,
            3 => Htuple,
            4 => Bits32,
            5 => Bytes,
            6 => Bits64Long,
            7 => Assoc,
            8 => Bits64Float,
            10 => Enum,
            _ => return Err(Error::BadWireType(n)),
        })
    }
}

/// The leading varint of every value, in structured form.
///
/// The low 4 bits of the packed varint select the wire type; the upper
/// bits carry a schema-defined tag identifying a sum constructor, 0 for
/// anonymous products. A single byte covers tags 0 through 7.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Prefix {
    /// The constructor discriminant, or 0 for anonymous values.
    pub tag: u64,
    /// The body encoding that follows.
    pub ty: WireType,
}

impl Prefix {
    /// A prefix for an anonymous value of the given wire type.
    pub fn untagged(ty: WireType) -> Self {
        Prefix { tag: 0, ty: ty }
    }

    /// Packs this prefix into the varint value that encodes it.
    pub fn to_vint(self) -> u64 {
        (self.tag << 4) | (self.ty as u64)
    }

    /// Unpacks a prefix from its varint value.
    pub fn from_vint(v: u64) -> Result<Self> {
        Ok(Prefix {
            tag: v >> 4,
            ty: WireType::from_nibble((v & 15) as u8)?,
        })
    }
}

/// ZigZag the given signed 64-bit integer into the unsigned storage format.
pub fn zigzag(i: i64) -> u64 {
    ((i << 1) ^ (i >> 63)) as u64
}

/// Invert `zigzag`.
pub fn unzigzag(i: u64) -> i64 {
    let sign = if (i & 1) != 0 { !0u64 } else { 0 };
    ((i >> 1) ^ sign) as i64
}
