//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Cursor abstractions over the byte sources values are decoded from.
//!
//! Two concrete readers share one semantic interface: `StringReader`
//! serves an in-memory byte range and never blocks; `IoReader` serves a
//! blocking byte stream. Everything above the `Reader` trait is agnostic
//! to which is in use.

use std::io::{self, Read};

use buffer::MsgBuffer;
use error::{Error, Result};
use wire::{self, Prefix, WireType};

/// The semantic interface every byte source implements.
///
/// The position of a reader is always immediately after the last content
/// read, unless a method returns an error, in which case the exact
/// position is unspecified and the stream must be considered poisoned.
pub trait Reader {
    /// Consumes and returns one byte.
    fn read_byte(&mut self) -> Result<u8>;

    /// Consumes `n` bytes and returns them as a slice.
    ///
    /// The slice is only valid until the next operation on the reader.
    fn read_bytes(&mut self, n: usize) -> Result<&[u8]>;

    /// Discards `n` bytes.
    fn skip(&mut self, n: u64) -> Result<()>;

    /// Returns the byte offset from where this reader started.
    fn position(&self) -> u64;

    /// Consumes one varint, decoding up to 64 bits.
    ///
    /// Denormalised encodings are accepted, but any encoding longer than
    /// ten bytes or carrying payload past 64 bits fails with `Overflow`.
    fn read_vint(&mut self) -> Result<u64> {
        let mut accum = 0u64;
        let mut shift = 0;
        loop {
            let b = self.read_byte()?;
            let v = (b & 0x7F) as u64;
            if 0 != v {
                if shift >= 64 || v << shift >> shift != v {
                    return Err(Error::Overflow);
                }
                accum |= v << shift;
            }
            shift += 7;

            if 0 == (b & 0x80) {
                break;
            }
            if shift >= 7 * wire::MAX_VINT_LEN {
                return Err(Error::Overflow);
            }
        }

        Ok(accum)
    }

    /// Consumes one varint and unZigZags it to a signed value.
    fn read_signed_vint(&mut self) -> Result<i64> {
        Ok(wire::unzigzag(self.read_vint()?))
    }

    /// Consumes one prefix varint.
    fn read_prefix(&mut self) -> Result<Prefix> {
        Prefix::from_vint(self.read_vint()?)
    }

    /// Consumes a 1-byte body.
    fn read_bits8(&mut self) -> Result<u8> {
        self.read_byte()
    }

    /// Consumes a 4-byte little-endian body.
    fn read_bits32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok((b[0] as u32)
           | (b[1] as u32) << 8
           | (b[2] as u32) << 16
           | (b[3] as u32) << 24)
    }

    /// Consumes an 8-byte little-endian body.
    fn read_bits64(&mut self) -> Result<u64> {
        let b = self.read_bytes(8)?;
        let mut n = 0u64;
        for i in 0..8 {
            n |= (b[i] as u64) << (8 * i);
        }
        Ok(n)
    }

    /// Discards one whole value whose prefix has already been consumed.
    ///
    /// Composite bodies are length-prefixed, so this never needs to know
    /// their inner structure.
    fn skip_value(&mut self, prefix: Prefix) -> Result<()> {
        match prefix.ty {
            WireType::Vint => { self.read_vint()?; },
            WireType::Enum => (),
            WireType::Bits8 => self.skip(1)?,
            WireType::Bits32 => self.skip(4)?,
            WireType::Bits64Long | WireType::Bits64Float => self.skip(8)?,
            WireType::Tuple | WireType::Htuple |
            WireType::Bytes | WireType::Assoc => {
                let len = self.read_vint()?;
                self.skip(len)?;
            },
        }
        Ok(())
    }
}

/// A reader over an in-memory byte range.
///
/// Position queries and bounds checks are O(1); nothing ever blocks.
#[derive(Debug, Clone)]
pub struct StringReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StringReader<'a> {
    /// Creates a reader over the whole of `bytes`.
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        StringReader { data: bytes, pos: 0 }
    }

    /// Creates a reader over `bytes[offset..]`.
    ///
    /// Fails with `EndOfInput` if `offset` is out of bounds.
    pub fn from_slice_at(bytes: &'a [u8], offset: usize) -> Result<Self> {
        if offset > bytes.len() {
            return Err(Error::EndOfInput);
        }
        Ok(StringReader { data: &bytes[offset..], pos: 0 })
    }

    /// Returns the number of unconsumed bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Moves the cursor to an absolute position, usually one recorded
    /// earlier with `position()`.
    ///
    /// Fails with `EndOfInput` if `pos` is past the end of the range.
    pub fn set_position(&mut self, pos: u64) -> Result<()> {
        if pos > self.data.len() as u64 {
            return Err(Error::EndOfInput);
        }
        self.pos = pos as usize;
        Ok(())
    }
}

impl<'a> Reader for StringReader<'a> {
    fn read_byte(&mut self) -> Result<u8> {
        if self.pos >= self.data.len() {
            return Err(Error::EndOfInput);
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&[u8]> {
        if n > self.remaining() {
            return Err(Error::EndOfInput);
        }
        let ret = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(ret)
    }

    fn skip(&mut self, n: u64) -> Result<()> {
        if n > self.remaining() as u64 {
            return Err(Error::EndOfInput);
        }
        self.pos += n as usize;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos as u64
    }
}

/// A reader over a blocking byte stream.
///
/// Reads loop until the requested count is satisfied; EOF mid-value
/// surfaces as `EndOfInput`. The underlying reader should be buffered if
/// it is based on a heavyweight resource like a file or socket handle, as
/// many decoding operations read exactly one byte.
#[derive(Debug)]
pub struct IoReader<R> {
    inner: R,
    pos: u64,
    scratch: Vec<u8>,
}

impl<R : Read> IoReader<R> {
    /// Creates a reader starting at byte offset 0.
    pub fn new(inner: R) -> Self {
        IoReader {
            inner: inner,
            pos: 0,
            scratch: Vec::new(),
        }
    }

    /// Consumes this reader and returns the underlying byte stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads one length-prefixed top-level message and returns its bytes,
    /// including the prefix and length framing, ready to be decoded from
    /// a `StringReader`.
    ///
    /// The frame must be TUPLE-wire; anything else fails with
    /// `BadWireType`. A declared body larger than `max_size` fails with
    /// `OversizedMessage` before anything is buffered. On success the
    /// stream is positioned at the start of the next frame.
    pub fn read_message(&mut self, max_size: u64) -> Result<Vec<u8>> {
        let prefix = self.read_prefix()?;
        if WireType::Tuple != prefix.ty {
            return Err(Error::BadWireType(prefix.ty as u8));
        }
        let len = self.read_vint()?;
        if len > max_size {
            return Err(Error::OversizedMessage(len));
        }

        let mut framed = MsgBuffer::with_capacity(
            len as usize + 2 * wire::MAX_VINT_LEN);
        framed.add_vint(prefix.to_vint());
        framed.add_vint(len);
        framed.add_bytes(self.read_bytes(len as usize)?);
        Ok(framed.into_vec())
    }
}

fn read_fully<R : Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    match r.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(ref e) if io::ErrorKind::UnexpectedEof == e.kind() =>
            Err(Error::EndOfInput),
        Err(e) => Err(Error::Io(e)),
    }
}

impl<R : Read> Reader for IoReader<R> {
    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        read_fully(&mut self.inner, &mut buf)?;
        self.pos += 1;
        Ok(buf[0])
    }

    fn read_bytes(&mut self, n: usize) -> Result<&[u8]> {
        self.scratch.resize(n, 0);
        read_fully(&mut self.inner, &mut self.scratch[..])?;
        self.pos += n as u64;
        Ok(&self.scratch[..])
    }

    fn skip(&mut self, n: u64) -> Result<()> {
        let skipped = io::copy(&mut self.inner.by_ref().take(n),
                               &mut io::sink())?;
        if skipped < n {
            return Err(Error::EndOfInput);
        }
        self.pos += n;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos
    }
}
