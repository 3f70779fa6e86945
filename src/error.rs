//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The error type shared by every layer of the runtime.

use std::io;

quick_error! {
    /// Errors that can be produced while encoding or decoding values.
    ///
    /// None of these is ever retried by the runtime; they surface to the
    /// caller unmodified. Any error other than `WrongProtocolVersion`
    /// raised part-way through a stream leaves the stream poisoned.
    #[derive(Debug)]
    pub enum Error {
        /// An error was returned by the underlying byte source or sink.
        Io(err: io::Error) {
            description("IO error")
            display("IO error: {}", err)
            cause(err)
            from()
        }
        /// The input ended in the middle of a value.
        EndOfInput {
            description("unexpected end of input")
            display("unexpected end of input")
        }
        /// A prefix carried a reserved or invalid wire-type nibble, or a
        /// value's wire type cannot carry the type being decoded.
        BadWireType(wire: u8) {
            description("bad wire type")
            display("bad wire type {}", wire)
        }
        /// A sum-type constructor tag not present in the reader's schema.
        UnknownTag(tag: u64) {
            description("unknown constructor tag")
            display("unknown constructor tag {}", tag)
        }
        /// A varint exceeded 64 bits, or an integer was out of range for
        /// the type it was narrowed to.
        Overflow {
            description("integer overflow")
            display("integer overflow")
        }
        /// A required element was absent and its type has no default.
        ///
        /// The string names the element path that was being decoded.
        MissingFieldNoDefault(wo: String) {
            description("missing field with no default")
            display("missing field with no default at {}", wo)
        }
        /// Decoding recursed too deeply.
        ///
        /// See `de::Config::recursion_limit` to control the cut-off point.
        DepthExceeded(wo: String) {
            description("recursion limit exceeded")
            display("recursion limit exceeded at {}", wo)
        }
        /// A BYTES body holding a string was not valid UTF-8.
        InvalidUtf8 {
            description("invalid UTF-8 data")
            display("invalid UTF-8 data")
        }
        /// Bytes remained after a top-level decode that should have
        /// consumed its whole input.
        ExtraDataAfterValue(remaining: usize) {
            description("extra data after value")
            display("{} bytes of extra data after value", remaining)
        }
        /// The version passed to a versioned serialise was outside the
        /// codec table.
        InvalidVersion(version: usize) {
            description("invalid protocol version")
            display("invalid protocol version {}", version)
        }
        /// A versioned frame named a version this reader does not know.
        WrongProtocolVersion(max_known: usize, found: usize) {
            description("wrong protocol version")
            display("wrong protocol version {} (max known {})",
                    found, max_known)
        }
        /// A frame declared a body larger than
        /// `de::Config::max_message_size`.
        OversizedMessage(size: u64) {
            description("message size over limit")
            display("message of {} bytes is over the size limit", size)
        }
    }
}

/// The result type used throughout the crate.
pub type Result<T> = ::std::result::Result<T, Error>;
