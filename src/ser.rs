//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Defines traits and utilities for encoding values.
//!
//! Writers are strict where readers are liberal: every value is emitted
//! in its canonical wire form at its declared arity. Growing a schema is
//! purely a reading-side concern, so a writer never needs to know what
//! older or newer peers expect.

use buffer::MsgBuffer;
use error::Result;
use wire::WireType;

/// Trait for types encodable to the wire.
///
/// The schema compiler emits one implementation per message, sum type and
/// record; the implementations here cover the primitives and anonymous
/// composites those are built from.
pub trait Serialize {
    /// Appends this value, prefix first, to `dst`.
    fn serialize(&self, dst: &mut MsgBuffer) -> Result<()>;
}

/// Writes a TUPLE value: prefix, body length, element count, then
/// whatever `body` emits.
///
/// `tag` is 0 for anonymous tuples, records and messages, or the
/// constructor index for a non-constant sum constructor.
pub fn write_tuple<F>(dst: &mut MsgBuffer, tag: u64, count: usize, body: F)
                      -> Result<()>
    where F : FnOnce(&mut MsgBuffer) -> Result<()>
{
    dst.add_prefix(tag, WireType::Tuple);
    dst.write_length_prefixed(|dst| {
        dst.add_vint(count as u64);
        body(dst)
    })
}

/// Writes an HTUPLE value, the wire form of lists and arrays.
pub fn write_htuple<F>(dst: &mut MsgBuffer, tag: u64, count: usize, body: F)
                       -> Result<()>
    where F : FnOnce(&mut MsgBuffer) -> Result<()>
{
    dst.add_prefix(tag, WireType::Htuple);
    dst.write_length_prefixed(|dst| {
        dst.add_vint(count as u64);
        body(dst)
    })
}

/// Writes a constant sum constructor: a lone ENUM prefix, no body.
pub fn write_constant(dst: &mut MsgBuffer, tag: u64) {
    dst.add_prefix(tag, WireType::Enum);
}

impl<'a, T : Serialize + ?Sized> Serialize for &'a T {
    fn serialize(&self, dst: &mut MsgBuffer) -> Result<()> {
        (**self).serialize(dst)
    }
}

impl Serialize for bool {
    fn serialize(&self, dst: &mut MsgBuffer) -> Result<()> {
        dst.add_prefix(0, WireType::Bits8);
        dst.add_byte(*self as u8);
        Ok(())
    }
}

impl Serialize for u8 {
    fn serialize(&self, dst: &mut MsgBuffer) -> Result<()> {
        dst.add_prefix(0, WireType::Bits8);
        dst.add_byte(*self);
        Ok(())
    }
}

impl Serialize for i32 {
    fn serialize(&self, dst: &mut MsgBuffer) -> Result<()> {
        dst.add_prefix(0, WireType::Vint);
        dst.add_signed_vint(*self as i64);
        Ok(())
    }
}

impl Serialize for i64 {
    fn serialize(&self, dst: &mut MsgBuffer) -> Result<()> {
        dst.add_prefix(0, WireType::Bits64Long);
        dst.add_fixed_u64_le(*self as u64);
        Ok(())
    }
}

impl Serialize for f64 {
    fn serialize(&self, dst: &mut MsgBuffer) -> Result<()> {
        dst.add_prefix(0, WireType::Bits64Float);
        dst.add_fixed_u64_le(self.to_bits());
        Ok(())
    }
}

impl Serialize for str {
    fn serialize(&self, dst: &mut MsgBuffer) -> Result<()> {
        dst.add_prefix(0, WireType::Bytes);
        dst.add_length_prefixed_bytes(self.as_bytes());
        Ok(())
    }
}

impl Serialize for String {
    fn serialize(&self, dst: &mut MsgBuffer) -> Result<()> {
        self[..].serialize(dst)
    }
}

impl<T : Serialize> Serialize for [T] {
    fn serialize(&self, dst: &mut MsgBuffer) -> Result<()> {
        write_htuple(dst, 0, self.len(), |dst| {
            for e in self {
                e.serialize(dst)?;
            }
            Ok(())
        })
    }
}

impl<T : Serialize> Serialize for Vec<T> {
    fn serialize(&self, dst: &mut MsgBuffer) -> Result<()> {
        self[..].serialize(dst)
    }
}

macro_rules! ser_tuple {
    ($n:expr; $($t:ident : $v:tt),*) => {
        impl<$($t : Serialize),*> Serialize for ($($t,)*) {
            fn serialize(&self, dst: &mut MsgBuffer) -> Result<()> {
                write_tuple(dst, 0, $n, |dst| {
                    $(self.$v.serialize(dst)?;)*
                    Ok(())
                })
            }
        }
    }
}

ser_tuple!(1; F0 : 0);
ser_tuple!(2; F0 : 0, F1 : 1);
ser_tuple!(3; F0 : 0, F1 : 1, F2 : 2);
ser_tuple!(4; F0 : 0, F1 : 1, F2 : 2, F3 : 3);
ser_tuple!(5; F0 : 0, F1 : 1, F2 : 2, F3 : 3, F4 : 4);
ser_tuple!(6; F0 : 0, F1 : 1, F2 : 2, F3 : 3, F4 : 4, F5 : 5);
ser_tuple!(7; F0 : 0, F1 : 1, F2 : 2, F3 : 3, F4 : 4, F5 : 5, F6 : 6);
ser_tuple!(8; F0 : 0, F1 : 1, F2 : 2, F3 : 3, F4 : 4, F5 : 5, F6 : 6,
           F7 : 7);
