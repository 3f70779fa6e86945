//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Defines traits and utilities for type-directed decoding.
//!
//! Decoders in this module are deliberately liberal in what they accept:
//! a reader for a given schema type accepts the encoding of any schema
//! that is a compatible extension of it. Concretely,
//!
//! - trailing tuple elements the reader does not know are skipped (the
//!   sender's schema appended fields);
//!
//! - tuple elements the sender did not write are replaced by their type's
//!   default (the reader's schema appended fields);
//!
//! - a primitive reader offered a TUPLE body descends into its first
//!   element (the sender promoted the primitive to a tuple or sum);
//!
//! - a tuple reader offered a primitive body decodes its first element
//!   from it and defaults the rest (the reader promoted);
//!
//! - integer readers accept any integer wire encoding wide enough to be
//!   narrowed with a range check, so numbers can be widened over time.

use std::fmt;
use std::str;

use error::{Error, Result};
use reader::Reader;
use wire::{Prefix, WireType};

/// Run-time configuration for decoding.
#[derive(Debug, Clone)]
pub struct Config {
    /// The maximum recursion level to allow.
    ///
    /// The default is 64.
    pub recursion_limit: usize,
    /// The maximum frame body size `read` and friends will buffer from an
    /// IO stream.
    ///
    /// The default is 16 MiB.
    pub max_message_size: u64,
    _non_public: (),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            recursion_limit: 64,
            max_message_size: 16 * 1024 * 1024,
            _non_public: (),
        }
    }
}

/// Tracks contextual information during decoding.
///
/// This is used for constructing helpful error messages and controlling
/// recursion depth.
///
/// `Context` objects are typically constructed on the stack and passed to
/// sub-decoders by reference.
///
/// A `Context` can be formatted with `Display` to show the path to the
/// current location, including both element names and offsets.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    /// The context for the "container" of this level of decoding, if any.
    pub next: Option<&'a Context<'a>>,
    /// The name of the element being decoded at this level.
    pub field: &'a str,
    /// The position of the element being decoded at this level.
    pub pos: u64,
    /// The recursion depth.
    pub depth: usize,
    /// The configuration in use.
    pub config: &'a Config,
    _non_public: (),
}

impl<'a> Context<'a> {
    /// Returns a "top-level" context referencing the given config.
    pub fn top(config: &'a Config) -> Self {
        Context {
            next: None,
            field: "",
            pos: 0,
            depth: 0,
            config: config,
            _non_public: (),
        }
    }

    /// Creates a context subordinate to this one for the given element,
    /// provided it does not exceed the recursion limit.
    pub fn push(&'a self, field: &'a str, pos: u64) -> Result<Self> {
        if self.depth >= self.config.recursion_limit {
            Err(Error::DepthExceeded(self.to_string()))
        } else {
            Ok(Context {
                next: Some(self),
                field: field,
                pos: pos,
                depth: self.depth + 1,
                config: self.config,
                _non_public: (),
            })
        }
    }

    /// Returns the error for an absent element whose type has no default.
    pub fn missing_field(&self) -> Error {
        Error::MissingFieldNoDefault(self.to_string())
    }
}

impl<'a> fmt::Display for Context<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(ref next) = self.next {
            write!(f, "{}.{}{{{}}}", next, self.field, self.pos)
        } else {
            write!(f, "{}{{{}}}", self.field, self.pos)
        }
    }
}

/// Trait for types decodable from the wire.
///
/// The schema compiler emits one implementation per message, sum type and
/// record; the implementations here cover the primitives and anonymous
/// composites those are built from.
pub trait Deserialize : Sized {
    /// Decodes a value whose prefix has already been consumed.
    ///
    /// This is where wire-type polymorphism lives: implementations accept
    /// every wire type a compatible sender could have produced for this
    /// type, not just the canonical one.
    fn deserialize_prefixed<R : Reader + ?Sized>(
        context: &Context, src: &mut R, prefix: Prefix) -> Result<Self>;

    /// Reads a prefix and decodes the value it introduces.
    fn deserialize<R : Reader + ?Sized>(context: &Context, src: &mut R)
                                        -> Result<Self> {
        let prefix = src.read_prefix()?;
        Self::deserialize_prefixed(context, src, prefix)
    }

    /// Returns the value substituted when an element of this type is
    /// absent.
    ///
    /// `None` means absence is an error; the caller raises
    /// `MissingFieldNoDefault`.
    fn default_value() -> Option<Self> {
        None
    }
}

/// Cursor over the body of one TUPLE or HTUPLE value.
///
/// Tracks the end of the body so that trailing elements written by a
/// newer schema can be skipped, and hands out defaults for elements an
/// older schema did not write. Generated record and sum readers drive
/// one of these per constructor body.
#[derive(Debug)]
pub struct TupleBody {
    end: u64,
    count: u64,
    read: u64,
}

impl TupleBody {
    /// Consumes the byte-length and element-count varints of a composite
    /// body.
    pub fn open<R : Reader + ?Sized>(src: &mut R) -> Result<Self> {
        let len = src.read_vint()?;
        let start = src.position();
        let end = match start.checked_add(len) {
            Some(end) => end,
            None => return Err(Error::Overflow),
        };
        let count = src.read_vint()?;
        Ok(TupleBody {
            end: end,
            count: count,
            read: 0,
        })
    }

    /// Returns the number of elements the sender wrote.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns whether another sender-written element is available.
    pub fn has_next(&self) -> bool {
        self.read < self.count
    }

    /// Decodes the next element, or substitutes the type's default once
    /// the sender's elements are exhausted.
    pub fn read<T : Deserialize, R : Reader + ?Sized>(
        &mut self, context: &Context, src: &mut R) -> Result<T>
    {
        self.read_or(context, src, T::default_value)
    }

    /// Like `read`, but with an explicit default, for elements carrying a
    /// `[@default]` annotation in the schema.
    pub fn read_or<T : Deserialize, R : Reader + ?Sized, F>(
        &mut self, context: &Context, src: &mut R, default: F) -> Result<T>
        where F : FnOnce() -> Option<T>
    {
        if self.read < self.count {
            self.read += 1;
            T::deserialize(context, src)
        } else {
            default().ok_or_else(|| context.missing_field())
        }
    }

    /// Skips whatever the declared arity did not consume and lands the
    /// reader at the body end.
    pub fn finish<R : Reader + ?Sized>(&self, src: &mut R) -> Result<()> {
        let pos = src.position();
        if pos < self.end {
            src.skip(self.end - pos)?;
        }
        Ok(())
    }
}

/// Reads a primitive out of a TUPLE body: the sender promoted the
/// primitive to a tuple or a non-constant sum constructor, so the
/// original value is the body's first element.
fn expand_primitive<T : Deserialize, R : Reader + ?Sized>(
    context: &Context, src: &mut R) -> Result<T>
{
    let subcontext = context.push("0", src.position())?;
    let mut body = TupleBody::open(src)?;
    let value = body.read(&subcontext, src)?;
    body.finish(src)?;
    Ok(value)
}

fn narrow_to_i32(v: i64) -> Result<i32> {
    if v < i32::MIN as i64 || v > i32::MAX as i64 {
        Err(Error::Overflow)
    } else {
        Ok(v as i32)
    }
}

fn narrow_to_u8(v: u64) -> Result<u8> {
    if v > u8::MAX as u64 {
        Err(Error::Overflow)
    } else {
        Ok(v as u8)
    }
}

impl Deserialize for bool {
    fn deserialize_prefixed<R : Reader + ?Sized>(
        context: &Context, src: &mut R, prefix: Prefix) -> Result<Self>
    {
        match prefix.ty {
            WireType::Bits8 => Ok(0 != src.read_bits8()?),
            WireType::Vint => Ok(0 != src.read_vint()?),
            WireType::Tuple => expand_primitive(context, src),
            WireType::Enum => Ok(false),
            ty => Err(Error::BadWireType(ty as u8)),
        }
    }

    fn default_value() -> Option<Self> {
        Some(false)
    }
}

impl Deserialize for u8 {
    fn deserialize_prefixed<R : Reader + ?Sized>(
        context: &Context, src: &mut R, prefix: Prefix) -> Result<Self>
    {
        match prefix.ty {
            WireType::Bits8 => src.read_bits8(),
            WireType::Vint => narrow_to_u8(src.read_vint()?),
            WireType::Tuple => expand_primitive(context, src),
            WireType::Enum => Ok(0),
            ty => Err(Error::BadWireType(ty as u8)),
        }
    }

    fn default_value() -> Option<Self> {
        Some(0)
    }
}

impl Deserialize for i32 {
    fn deserialize_prefixed<R : Reader + ?Sized>(
        context: &Context, src: &mut R, prefix: Prefix) -> Result<Self>
    {
        match prefix.ty {
            WireType::Vint => narrow_to_i32(src.read_signed_vint()?),
            WireType::Bits8 => Ok(src.read_bits8()? as i32),
            WireType::Bits32 => Ok(src.read_bits32()? as i32),
            WireType::Bits64Long =>
                narrow_to_i32(src.read_bits64()? as i64),
            WireType::Tuple => expand_primitive(context, src),
            WireType::Enum => Ok(0),
            ty => Err(Error::BadWireType(ty as u8)),
        }
    }

    fn default_value() -> Option<Self> {
        Some(0)
    }
}

impl Deserialize for i64 {
    fn deserialize_prefixed<R : Reader + ?Sized>(
        context: &Context, src: &mut R, prefix: Prefix) -> Result<Self>
    {
        match prefix.ty {
            WireType::Bits64Long => Ok(src.read_bits64()? as i64),
            WireType::Vint => src.read_signed_vint(),
            WireType::Bits8 => Ok(src.read_bits8()? as i64),
            WireType::Bits32 => Ok(src.read_bits32()? as i32 as i64),
            WireType::Tuple => expand_primitive(context, src),
            WireType::Enum => Ok(0),
            ty => Err(Error::BadWireType(ty as u8)),
        }
    }

    fn default_value() -> Option<Self> {
        Some(0)
    }
}

impl Deserialize for f64 {
    fn deserialize_prefixed<R : Reader + ?Sized>(
        context: &Context, src: &mut R, prefix: Prefix) -> Result<Self>
    {
        match prefix.ty {
            WireType::Bits64Float =>
                Ok(f64::from_bits(src.read_bits64()?)),
            WireType::Tuple => expand_primitive(context, src),
            WireType::Enum => Ok(0.0),
            ty => Err(Error::BadWireType(ty as u8)),
        }
    }

    fn default_value() -> Option<Self> {
        Some(0.0)
    }
}

impl Deserialize for String {
    fn deserialize_prefixed<R : Reader + ?Sized>(
        context: &Context, src: &mut R, prefix: Prefix) -> Result<Self>
    {
        match prefix.ty {
            WireType::Bytes => {
                let len = src.read_vint()?;
                let bytes = src.read_bytes(len as usize)?;
                match str::from_utf8(bytes) {
                    Ok(s) => Ok(s.to_owned()),
                    Err(_) => Err(Error::InvalidUtf8),
                }
            },
            WireType::Tuple => expand_primitive(context, src),
            WireType::Enum => Ok(String::new()),
            ty => Err(Error::BadWireType(ty as u8)),
        }
    }

    fn default_value() -> Option<Self> {
        Some(String::new())
    }
}

impl<T : Deserialize> Deserialize for Vec<T> {
    fn deserialize_prefixed<R : Reader + ?Sized>(
        context: &Context, src: &mut R, prefix: Prefix) -> Result<Self>
    {
        match prefix.ty {
            WireType::Htuple => {
                let subcontext = context.push("[]", src.position())?;
                let mut body = TupleBody::open(src)?;
                let mut ret = Vec::new();
                while body.has_next() {
                    ret.push(body.read(&subcontext, src)?);
                }
                body.finish(src)?;
                Ok(ret)
            },
            WireType::Enum => Ok(Vec::new()),
            ty => Err(Error::BadWireType(ty as u8)),
        }
    }

    fn default_value() -> Option<Self> {
        Some(Vec::new())
    }
}

macro_rules! des_tuple {
    ($t0:ident : $n0:tt $(, $t:ident : $n:tt)*) => {
        impl<$t0 : Deserialize $(, $t : Deserialize)*> Deserialize
        for ($t0, $($t,)*) {
            fn deserialize_prefixed<R : Reader + ?Sized>(
                context: &Context, src: &mut R, prefix: Prefix)
                -> Result<Self>
            {
                match prefix.ty {
                    WireType::Tuple => {
                        let mut body = TupleBody::open(src)?;
                        let ret = ({
                            let subcontext =
                                context.push($n0, src.position())?;
                            body.read::<$t0, R>(&subcontext, src)?
                        }, $({
                            let subcontext =
                                context.push($n, src.position())?;
                            body.read::<$t, R>(&subcontext, src)?
                        },)*);
                        body.finish(src)?;
                        Ok(ret)
                    },
                    WireType::Enum =>
                        <Self as Deserialize>::default_value()
                            .ok_or_else(|| context.missing_field()),
                    WireType::Htuple | WireType::Assoc =>
                        Err(Error::BadWireType(prefix.ty as u8)),
                    // A primitive promoted to this tuple: element 0 takes
                    // the primitive's body, the rest default.
                    _ => {
                        let subcontext =
                            context.push($n0, src.position())?;
                        let first = $t0::deserialize_prefixed(
                            &subcontext, src, prefix)?;
                        Ok((first, $(
                            $t::default_value().ok_or_else(
                                || context.missing_field())?,
                        )*))
                    },
                }
            }

            fn default_value() -> Option<Self> {
                Some(($t0::default_value()?, $($t::default_value()?,)*))
            }
        }
    }
}

des_tuple!(F0 : "0");
des_tuple!(F0 : "0", F1 : "1");
des_tuple!(F0 : "0", F1 : "1", F2 : "2");
des_tuple!(F0 : "0", F1 : "1", F2 : "2", F3 : "3");
des_tuple!(F0 : "0", F1 : "1", F2 : "2", F3 : "3", F4 : "4");
des_tuple!(F0 : "0", F1 : "1", F2 : "2", F3 : "3", F4 : "4", F5 : "5");
des_tuple!(F0 : "0", F1 : "1", F2 : "2", F3 : "3", F4 : "4", F5 : "5",
           F6 : "6");
des_tuple!(F0 : "0", F1 : "1", F2 : "2", F3 : "3", F4 : "4", F5 : "5",
           F6 : "6", F7 : "7");

#[cfg(test)]
mod test {
    use super::*;
    use error::Error;
    use reader::StringReader;
    use test_helpers::bytes;
    use wire::WireType;

    fn decode<T : Deserialize>(text: &str) -> Result<T> {
        let config = Config::default();
        let data = bytes(text);
        let mut src = StringReader::from_slice(&data[..]);
        let value = T::deserialize(&Context::top(&config), &mut src)?;
        assert_eq!(0, src.remaining());
        Ok(value)
    }

    #[test]
    fn primitive_canonical_wires() {
        assert_eq!(false, decode::<bool>("02 00").unwrap());
        assert_eq!(true, decode::<bool>("02 01").unwrap());
        assert_eq!(7u8, decode::<u8>("02 07").unwrap());
        assert_eq!(7i32, decode::<i32>("00 0E").unwrap());
        assert_eq!(-1i32, decode::<i32>("00 01").unwrap());
        assert_eq!(7i64,
                   decode::<i64>("06 07 00 00 00 00 00 00 00").unwrap());
        assert_eq!(-1i64,
                   decode::<i64>("06 FF FF FF FF FF FF FF FF").unwrap());
        assert_eq!(1.0f64,
                   decode::<f64>("08 00 00 00 00 00 00 F0 3F").unwrap());
        assert_eq!("hi", decode::<String>("05 02 'hi'").unwrap());
        assert_eq!(Vec::<i32>::new(), decode::<Vec<i32>>("03 01 00")
                   .unwrap());
        assert_eq!(vec![1, 2], decode::<Vec<i32>>("03 05 02 00 02 00 04")
                   .unwrap());
    }

    #[test]
    fn integer_widening_and_narrowing() {
        // long reader accepts an int (vint) body
        assert_eq!(300i64, decode::<i64>("00 D8 04").unwrap());
        assert_eq!(-300i64, decode::<i64>("00 D7 04").unwrap());
        // int reader accepts a long body while it fits
        assert_eq!(300i32,
                   decode::<i32>("06 2C 01 00 00 00 00 00 00").unwrap());
        // ... and overflows when it does not
        match decode::<i32>("06 00 00 00 00 01 00 00 00") {
            Ok(v) => panic!("unexpectedly decoded {}", v),
            Err(Error::Overflow) => (),
            Err(e) => panic!("unexpected error: {}", e),
        }
        match decode::<u8>("00 80 02") {
            Ok(v) => panic!("unexpectedly decoded {}", v),
            Err(Error::Overflow) => (),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn primitive_expansion_from_tuple() {
        // (7,) encoded as a tuple, read as a plain int.
        assert_eq!(7i32, decode::<i32>("01 03 01 00 0E").unwrap());
        // Trailing elements are skipped.
        assert_eq!(7i32, decode::<i32>("01 07 02 00 0E 05 02 'hi'")
                   .unwrap());
        // An empty tuple body falls back to the default.
        assert_eq!(0i32, decode::<i32>("01 01 00").unwrap());
        assert_eq!("", decode::<String>("01 01 00").unwrap());
    }

    #[test]
    fn absent_composite_decodes_to_default() {
        // The zero-ENUM prefix stands for an absent optional value.
        assert_eq!(0i32, decode::<i32>("0A").unwrap());
        assert_eq!((0i32, String::new()),
                   decode::<(i32, String)>("0A").unwrap());
        assert_eq!(Vec::<i64>::new(), decode::<Vec<i64>>("0A").unwrap());
    }

    #[test]
    fn tuple_missing_elements_defaulted() {
        // A one-element tuple read as (int, string).
        assert_eq!((7, String::new()),
                   decode::<(i32, String)>("01 03 01 00 0E").unwrap());
        // An empty tuple read as (int, string).
        assert_eq!((0, String::new()),
                   decode::<(i32, String)>("01 01 00").unwrap());
    }

    #[test]
    fn tuple_extra_elements_skipped() {
        // A three-element tuple read as (int,).
        let v: (i32,) = decode("01 09 03 00 0E 05 02 'hi' 02 01").unwrap();
        assert_eq!((7,), v);
    }

    #[test]
    fn tuple_promoted_from_primitive() {
        // An old plain-int body read with a promoted schema.
        assert_eq!((7, String::new()),
                   decode::<(i32, String)>("00 0E").unwrap());
    }

    #[test]
    fn string_rejects_invalid_utf8() {
        match decode::<String>("05 02 FF FE") {
            Ok(s) => panic!("unexpectedly decoded {:?}", s),
            Err(Error::InvalidUtf8) => (),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn wire_type_mismatch_rejected() {
        match decode::<i32>("05 02 'hi'") {
            Ok(v) => panic!("unexpectedly decoded {}", v),
            Err(Error::BadWireType(w)) =>
                assert_eq!(WireType::Bytes as u8, w),
            Err(e) => panic!("unexpected error: {}", e),
        }
        match decode::<f64>("00 0E") {
            Ok(v) => panic!("unexpectedly decoded {}", v),
            Err(Error::BadWireType(w)) =>
                assert_eq!(WireType::Vint as u8, w),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn context_path_formatting() {
        let config = Config::default();
        let top = Context::top(&config);
        let a = top.push("shipment", 0).unwrap();
        let b = a.push("parcels", 2).unwrap();
        assert_eq!("{0}.shipment{0}.parcels{2}", b.to_string());
        assert_eq!(2, b.depth);
    }

    #[test]
    fn recursion_limit_enforced() {
        let mut config = Config::default();
        config.recursion_limit = 4;
        // Lists nested five deep against a limit of four.
        let data = bytes("03 0D 01 03 0A 01 03 07 01 03 04 01 03 01 00");
        let mut src = StringReader::from_slice(&data[..]);
        match Vec::<Vec<Vec<Vec<Vec<i32>>>>>::deserialize(
            &Context::top(&config), &mut src)
        {
            Ok(_) => panic!("deserialize unexpectedly succeeded"),
            Err(Error::DepthExceeded(..)) => (),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
}
