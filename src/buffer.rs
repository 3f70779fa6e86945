//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The append-only buffer values are encoded into.

use error::Result;
use wire::{self, Prefix, WireType};

/// An appendable byte buffer with primitive-encoding helpers.
///
/// Buffers are deliberately reusable: `clear()` drops the contents but
/// retains the allocation, and every `conv` entry point that accepts a
/// caller-supplied buffer clears it on entry and keeps no reference to it
/// after returning. A caller encoding many messages can thus amortise the
/// allocation across all of them.
#[derive(Debug, Clone, Default)]
pub struct MsgBuffer {
    data: Vec<u8>,
}

impl MsgBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        MsgBuffer { data: Vec::new() }
    }

    /// Creates an empty buffer with room for `n` bytes.
    pub fn with_capacity(n: usize) -> Self {
        MsgBuffer { data: Vec::with_capacity(n) }
    }

    /// Discards the contents, retaining the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Returns the bytes encoded so far.
    pub fn contents(&self) -> &[u8] {
        &self.data[..]
    }

    /// Consumes the buffer, returning the encoded bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Returns the number of bytes encoded so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends a single byte.
    pub fn add_byte(&mut self, b: u8) {
        self.data.push(b);
    }

    /// Appends raw bytes verbatim.
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Appends an unsigned varint: little-endian base-128, 7 payload bits
    /// per byte, continuation bit high.
    pub fn add_vint(&mut self, mut n: u64) {
        loop {
            let mut b = (n & 0x7F) as u8;
            n >>= 7;
            if n > 0 {
                b |= 0x80;
            }
            self.data.push(b);
            if 0 == n {
                break;
            }
        }
    }

    /// ZigZags `n`, then appends it as a varint.
    pub fn add_signed_vint(&mut self, n: i64) {
        self.add_vint(wire::zigzag(n));
    }

    /// Appends a 32-bit value in little-endian order.
    pub fn add_fixed_u32_le(&mut self, n: u32) {
        self.add_bytes(&[n as u8,
                         (n >> 8) as u8,
                         (n >> 16) as u8,
                         (n >> 24) as u8]);
    }

    /// Appends a 64-bit value in little-endian order.
    pub fn add_fixed_u64_le(&mut self, n: u64) {
        self.add_bytes(&[n as u8,
                         (n >> 8) as u8,
                         (n >> 16) as u8,
                         (n >> 24) as u8,
                         (n >> 32) as u8,
                         (n >> 40) as u8,
                         (n >> 48) as u8,
                         (n >> 56) as u8]);
    }

    /// Appends the prefix varint for `tag` and `ty`.
    pub fn add_prefix(&mut self, tag: u64, ty: WireType) {
        self.add_vint(Prefix { tag: tag, ty: ty }.to_vint());
    }

    /// Appends a varint byte length followed by the bytes themselves.
    pub fn add_length_prefixed_bytes(&mut self, bytes: &[u8]) {
        self.add_vint(bytes.len() as u64);
        self.add_bytes(bytes);
    }

    /// Runs `body` against this buffer, then prepends the varint byte
    /// length of everything it wrote.
    ///
    /// The body is materialised in place and the length varint rotated in
    /// front of it, so no scratch buffer is needed. Composite writers
    /// nest calls to this to build tuple-in-tuple encodings.
    pub fn write_length_prefixed<F>(&mut self, body: F) -> Result<()>
        where F : FnOnce(&mut MsgBuffer) -> Result<()>
    {
        let start = self.data.len();
        body(self)?;
        let body_len = (self.data.len() - start) as u64;

        let mark = self.data.len();
        self.add_vint(body_len);
        let vint_len = self.data.len() - mark;
        self.data[start..].rotate_right(vint_len);
        Ok(())
    }
}
