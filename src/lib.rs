//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! extprot is the wire runtime for a self-describing, extensible binary
//! serialisation format for structured messages defined in a small schema
//! language.
//!
//! # Introduction
//!
//! ## Features
//!
//! - Producers and consumers may evolve their schemas independently:
//! fields can be added, primitives promoted to tuples or tagged unions,
//! integers widened, and constructors introduced, while old and new peers
//! keep understanding each other.
//!
//! - Every composite value is length-prefixed, so a reader can skip data
//! it does not understand without knowing its inner structure.
//!
//! - Messages can carry an explicit 16-bit version selecting one of
//! several schema variants, with streams staying aligned even when an
//! unknown version arrives.
//!
//! - Encoding buffers are reusable, so steady-state encoding does not
//! allocate.
//!
//! ## What this crate is, and is not
//!
//! This crate is the *runtime* the schema compiler targets: the binary
//! encoding, the type-directed reader/writer discipline, and the
//! default-value computation. The schema language itself, the compiler
//! emitting `Serialize`/`Deserialize` implementations from it, and
//! pretty-printers for debugging all live elsewhere and consume only what
//! is exposed here. Nothing stops you hand-writing implementations the
//! way the compiler would — the test suite does exactly that — but for
//! real schemas the compiler is the intended author.
//!
//! # Getting Started
//!
//! A message is a record; its implementation serialises fields in
//! declaration order into a length-prefixed tuple, and deserialises them
//! back with defaults for anything an older writer did not send.
//!
//! ```
//! use extprot::buffer::MsgBuffer;
//! use extprot::de::{Config, Context, Deserialize, TupleBody};
//! use extprot::error::{Error, Result};
//! use extprot::reader::Reader;
//! use extprot::ser::{self, Serialize};
//! use extprot::wire::{Prefix, WireType};
//!
//! #[derive(Debug, PartialEq)]
//! struct Point { x: i32, y: i32 }
//!
//! impl Serialize for Point {
//!     fn serialize(&self, dst: &mut MsgBuffer) -> Result<()> {
//!         ser::write_tuple(dst, 0, 2, |dst| {
//!             self.x.serialize(dst)?;
//!             self.y.serialize(dst)
//!         })
//!     }
//! }
//!
//! impl Deserialize for Point {
//!     fn deserialize_prefixed<R : Reader + ?Sized>(
//!         context: &Context, src: &mut R, prefix: Prefix)
//!         -> Result<Point>
//!     {
//!         if WireType::Tuple != prefix.ty {
//!             return Err(Error::BadWireType(prefix.ty as u8));
//!         }
//!         let mut body = TupleBody::open(src)?;
//!         let x = {
//!             let subcontext = context.push("x", src.position())?;
//!             body.read(&subcontext, src)?
//!         };
//!         let y = {
//!             let subcontext = context.push("y", src.position())?;
//!             body.read(&subcontext, src)?
//!         };
//!         body.finish(src)?;
//!         Ok(Point { x: x, y: y })
//!     }
//! }
//!
//! let p = Point { x: 1, y: -1 };
//! let bytes = extprot::conv::serialize(&p).unwrap();
//! assert_eq!(&b"\x01\x05\x02\x00\x02\x00\x01"[..], &bytes[..]);
//!
//! let q: Point = extprot::conv::deserialize(
//!     &bytes[..], &Config::default()).unwrap();
//! assert_eq!(p, q);
//! ```
//!
//! # The wire format
//!
//! Every value begins with a *prefix*: a varint whose low 4 bits name the
//! *wire type* — the body-encoding discipline — and whose upper bits
//! carry a schema-defined *tag*, 0 for anonymous products and the
//! constructor index for sum types.
//!
//! The wire types are:
//!
//! - `VINT` (0) — one varint body, zig-zagged for signed values.
//! - `TUPLE` (1) — varint byte length, varint element count, elements.
//! - `BITS8` (2) — 1-byte body.
//! - `HTUPLE` (3) — same layout as `TUPLE`; the form of lists and arrays.
//! - `BITS32` (4) — 4-byte little-endian body.
//! - `BYTES` (5) — varint byte length, then raw bytes.
//! - `BITS64_LONG` (6) — 8-byte little-endian integer body.
//! - `ASSOC` (7) — reserved for a future map type; skippable.
//! - `BITS64_FLOAT` (8) — 8-byte little-endian IEEE-754 double.
//! - `ENUM` (10) — a constant sum constructor; no body at all.
//!
//! Varints are little-endian base-128 with the continuation bit high, at
//! most ten bytes for a 64-bit value. Signed integers are ZigZagged
//! rather than sign-extended.
//!
//! A top-level message is simply a `TUPLE` value with tag 0 (or the
//! constructor index, for a message that is a union of records). A
//! versioned frame puts a 16-bit little-endian version index in front of
//! the message; see the `conv` module.
//!
//! # Maintaining compatibility
//!
//! Compatibility rests on four reader-side behaviours:
//!
//! - length-prefixed skipping: elements past a reader's declared arity
//! are discarded wholesale;
//!
//! - default substitution: elements a writer did not send take their
//! type's default, and fail only if the type has none;
//!
//! - primitive expansion: a reader expecting a primitive but finding a
//! tuple (or a non-constant constructor) descends into its first element,
//! so a primitive can be promoted to a composite after the fact;
//!
//! - wire-type polymorphism: integer readers accept any integer encoding
//! wide enough, narrowing with a range check, so numbers can be widened.
//!
//! The upshot, per kind of schema change:
//!
//! - Adding fields or tuple elements whose types have defaults is both
//! backward- and forward-compatible.
//!
//! - Adding elements without defaults is forward-compatible only: old
//! readers skip them, but new readers reject their absence.
//!
//! - Adding a sum constructor is backward-compatible; an old reader that
//! encounters the new constructor fails with `UnknownTag`.
//!
//! - Promoting a primitive to a tuple or sum whose first element is that
//! primitive is compatible in both directions.
//!
//! - Widening `int` to `long` is backward-compatible.
//!
//! # Limitations
//!
//! Integers wider than 64 bits are not supported, and neither is
//! narrowing a value that no longer fits its destination type: that
//! fails with `Overflow` rather than truncating.
//!
//! The runtime is strictly synchronous. An `IoReader` blocks until each
//! requested count of bytes arrives; cancellation and timeouts belong to
//! the IO layer underneath it. Apart from `WrongProtocolVersion`, which
//! leaves the stream aligned on the next frame, an error part-way
//! through a stream poisons it.

#![deny(missing_docs)]

#[macro_use] extern crate quick_error;

pub mod buffer;
pub mod conv;
pub mod de;
pub mod error;
pub mod reader;
pub mod ser;
pub mod wire;

#[cfg(test)] mod test_helpers;

pub use buffer::MsgBuffer;
pub use conv::deserialize;
pub use conv::deserialize_versioned;
pub use conv::read;
pub use conv::read_frame;
pub use conv::read_versioned;
pub use conv::serialize;
pub use conv::serialize_versioned;
pub use conv::write;
pub use conv::write_versioned;
pub use de::Config;
pub use de::Context;
pub use de::Deserialize;
pub use de::TupleBody;
pub use error::Error;
pub use error::Result;
pub use reader::IoReader;
pub use reader::Reader;
pub use reader::StringReader;
pub use ser::Serialize;
