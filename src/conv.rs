//-
// Copyright 2017 Jason Lingle
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The stable entry points: serialise and deserialise over byte vectors
//! and IO channels, plus the versioned framings.
//!
//! A versioned frame is a serialised message preceded by a 16-bit
//! little-endian version index selecting one entry of a codec table. The
//! table is a slice of plain `fn` pointers, one reader (or writer) per
//! schema version, all producing (or consuming) the same in-memory type;
//! the schema compiler emits the functions, callers assemble the slices.

use std::io::{Read, Write};

use buffer::MsgBuffer;
use de::{Config, Context, Deserialize};
use error::{Error, Result};
use reader::{IoReader, Reader, StringReader};
use ser::Serialize;

/// A per-version message reader, as stored in a codec table.
pub type ReadFn<T> = fn(&Context, &mut StringReader) -> Result<T>;

/// A per-version message writer, as stored in a codec table.
pub type WriteFn<T> = fn(&mut MsgBuffer, &T) -> Result<()>;

/// Serialises `x` into a fresh byte vector.
pub fn serialize<T : Serialize + ?Sized>(x: &T) -> Result<Vec<u8>> {
    let mut buf = MsgBuffer::new();
    x.serialize(&mut buf)?;
    Ok(buf.into_vec())
}

/// Serialises `x` into `buf`, clearing it first.
///
/// The buffer retains its allocation across calls, so a caller encoding
/// many messages can reuse one buffer instead of allocating per message.
pub fn serialize_into<T : Serialize + ?Sized>(x: &T, buf: &mut MsgBuffer)
                                              -> Result<()> {
    buf.clear();
    x.serialize(buf)
}

/// Deserialises one complete value from `bytes`.
///
/// Fails with `ExtraDataAfterValue` if the value does not consume the
/// whole slice.
pub fn deserialize<T : Deserialize>(bytes: &[u8], config: &Config)
                                    -> Result<T> {
    deserialize_from(bytes, 0, config)
}

/// Like `deserialize`, but starts at byte offset `offset`.
pub fn deserialize_from<T : Deserialize>(bytes: &[u8], offset: usize,
                                         config: &Config) -> Result<T> {
    let mut src = StringReader::from_slice_at(bytes, offset)?;
    let value = T::deserialize(&Context::top(config), &mut src)?;
    if src.remaining() > 0 {
        return Err(Error::ExtraDataAfterValue(src.remaining()));
    }
    Ok(value)
}

/// Writes one message frame to `io`.
pub fn write<T : Serialize + ?Sized, W : Write>(io: &mut W, x: &T)
                                                -> Result<()> {
    let mut buf = MsgBuffer::new();
    write_buffered(io, x, &mut buf)
}

/// Like `write`, but encodes through the caller's buffer.
pub fn write_buffered<T : Serialize + ?Sized, W : Write>(
    io: &mut W, x: &T, buf: &mut MsgBuffer) -> Result<()>
{
    serialize_into(x, buf)?;
    io.write_all(buf.contents())?;
    Ok(())
}

/// Reads one message frame from `io` and deserialises it.
///
/// Blocks until a whole frame is available; EOF mid-frame surfaces as
/// `EndOfInput`. On success the stream is aligned to the next frame.
pub fn read<T : Deserialize, R : Read>(io: &mut IoReader<R>,
                                       config: &Config) -> Result<T> {
    let bytes = io.read_message(config.max_message_size)?;
    deserialize(&bytes[..], config)
}

/// Serialises `x` with a 2-byte little-endian version prefix, encoding
/// the body with `fs[version]`.
///
/// Fails with `InvalidVersion` if `version` does not fit in 16 bits or
/// names no entry of the codec table.
pub fn serialize_versioned<T>(fs: &[WriteFn<T>], version: usize, x: &T)
                              -> Result<Vec<u8>> {
    let mut buf = MsgBuffer::new();
    serialize_versioned_into(fs, version, x, &mut buf)?;
    Ok(buf.into_vec())
}

/// Like `serialize_versioned`, but encodes into the caller's buffer,
/// clearing it first.
pub fn serialize_versioned_into<T>(fs: &[WriteFn<T>], version: usize,
                                   x: &T, buf: &mut MsgBuffer)
                                   -> Result<()> {
    if version > 0xFFFF || version >= fs.len() {
        return Err(Error::InvalidVersion(version));
    }
    buf.clear();
    buf.add_byte(version as u8);
    buf.add_byte((version >> 8) as u8);
    fs[version](buf, x)
}

/// Deserialises a versioned blob, routing on its embedded version.
///
/// Fails with `WrongProtocolVersion` when the embedded version is outside
/// the codec table, or when the blob is too short to carry a version at
/// all.
pub fn deserialize_versioned<T>(fs: &[ReadFn<T>], bytes: &[u8],
                                config: &Config) -> Result<T> {
    if bytes.len() < 2 {
        let found = bytes.first().map(|&b| b as usize).unwrap_or(0);
        return Err(Error::WrongProtocolVersion(fs.len(), found));
    }
    let version = bytes[0] as usize | (bytes[1] as usize) << 8;
    if version >= fs.len() {
        return Err(Error::WrongProtocolVersion(fs.len(), version));
    }
    run_read(fs[version], &bytes[2..], config)
}

/// Deserialises an unversioned frame with an explicitly chosen version.
pub fn deserialize_version<T>(fs: &[ReadFn<T>], version: usize,
                              bytes: &[u8], config: &Config) -> Result<T> {
    if version >= fs.len() {
        return Err(Error::WrongProtocolVersion(fs.len(), version));
    }
    run_read(fs[version], bytes, config)
}

/// Writes a versioned frame to `io`: the 2-byte little-endian version,
/// then the message frame.
///
/// The version always precedes the body on the channel, matching
/// `read_versioned`. A peer expecting a trailing-version framing is not
/// interoperable with this pair.
pub fn write_versioned<T, W : Write>(fs: &[WriteFn<T>], version: usize,
                                     io: &mut W, x: &T) -> Result<()> {
    let mut buf = MsgBuffer::new();
    write_versioned_buffered(fs, version, io, x, &mut buf)
}

/// Like `write_versioned`, but encodes through the caller's buffer.
pub fn write_versioned_buffered<T, W : Write>(
    fs: &[WriteFn<T>], version: usize, io: &mut W, x: &T,
    buf: &mut MsgBuffer) -> Result<()>
{
    serialize_versioned_into(fs, version, x, buf)?;
    io.write_all(buf.contents())?;
    Ok(())
}

/// Reads a versioned frame from `io`, routing on its version.
///
/// When the version is unknown, the offending frame is drained in full
/// before `WrongProtocolVersion` is raised, so the stream stays aligned
/// and the next frame remains readable.
pub fn read_versioned<T, R : Read>(fs: &[ReadFn<T>],
                                   io: &mut IoReader<R>,
                                   config: &Config) -> Result<T> {
    let version = read_version(io)?;
    if version >= fs.len() {
        let prefix = io.read_prefix()?;
        io.skip_value(prefix)?;
        return Err(Error::WrongProtocolVersion(fs.len(), version));
    }
    let bytes = io.read_message(config.max_message_size)?;
    run_read(fs[version], &bytes[..], config)
}

/// Reads a versioned frame and returns the version and the raw message
/// bytes for downstream dispatch, without decoding them.
pub fn read_frame<R : Read>(io: &mut IoReader<R>, config: &Config)
                            -> Result<(u16, Vec<u8>)> {
    let version = read_version(io)?;
    let bytes = io.read_message(config.max_message_size)?;
    Ok((version as u16, bytes))
}

fn read_version<R : Read>(io: &mut IoReader<R>) -> Result<usize> {
    let lo = io.read_byte()?;
    let hi = io.read_byte()?;
    Ok(lo as usize | (hi as usize) << 8)
}

fn run_read<T>(f: ReadFn<T>, bytes: &[u8], config: &Config) -> Result<T> {
    let mut src = StringReader::from_slice(bytes);
    let value = f(&Context::top(config), &mut src)?;
    if src.remaining() > 0 {
        return Err(Error::ExtraDataAfterValue(src.remaining()));
    }
    Ok(value)
}

#[cfg(test)]
mod test {
    use std::io;

    use super::*;
    use buffer::MsgBuffer;
    use de::{Config, Context, Deserialize};
    use error::Error;
    use reader::{IoReader, StringReader};
    use test_helpers::bytes;

    fn read_int(context: &Context, src: &mut StringReader)
                -> Result<(i32,)> {
        Deserialize::deserialize(context, src)
    }

    fn write_int(dst: &mut MsgBuffer, x: &(i32,)) -> Result<()> {
        use ser::Serialize;
        x.serialize(dst)
    }

    const READERS: &'static [ReadFn<(i32,)>] = &[read_int, read_int];
    const WRITERS: &'static [WriteFn<(i32,)>] = &[write_int, write_int];

    #[test]
    fn roundtrip_through_slice() {
        let config = Config::default();
        let bytes = serialize(&(42i32,)).unwrap();
        assert_eq!((42,), deserialize::<(i32,)>(&bytes[..], &config)
                   .unwrap());
    }

    #[test]
    fn deserialize_from_offset() {
        let config = Config::default();
        let mut data = bytes("AA BB");
        data.extend(serialize(&(42i32,)).unwrap());
        assert_eq!((42,),
                   deserialize_from::<(i32,)>(&data[..], 2, &config)
                   .unwrap());
    }

    #[test]
    fn trailing_garbage_rejected() {
        let config = Config::default();
        let mut bytes = serialize(&(42i32,)).unwrap();
        bytes.push(0xFF);
        match deserialize::<(i32,)>(&bytes[..], &config) {
            Ok(v) => panic!("unexpectedly decoded {:?}", v),
            Err(Error::ExtraDataAfterValue(n)) => assert_eq!(1, n),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn serialize_reuses_buffer() {
        let mut buf = MsgBuffer::new();
        serialize_into(&(1i32,), &mut buf).unwrap();
        let first = buf.contents().to_vec();
        serialize_into(&(1i32,), &mut buf).unwrap();
        assert_eq!(first, buf.contents());
    }

    #[test]
    fn write_read_over_io() {
        let config = Config::default();
        let mut channel = Vec::new();
        write(&mut channel, &(7i32,)).unwrap();
        write(&mut channel, &(8i32,)).unwrap();

        let mut io = IoReader::new(io::Cursor::new(channel));
        assert_eq!((7,), read::<(i32,), _>(&mut io, &config).unwrap());
        assert_eq!((8,), read::<(i32,), _>(&mut io, &config).unwrap());
        match read::<(i32,), _>(&mut io, &config) {
            Ok(v) => panic!("unexpectedly decoded {:?}", v),
            Err(Error::EndOfInput) => (),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn versioned_roundtrip() {
        let config = Config::default();
        let bytes = serialize_versioned(WRITERS, 1, &(42i32,)).unwrap();
        assert_eq!(&[0x01, 0x00], &bytes[..2]);
        assert_eq!((42,),
                   deserialize_versioned(READERS, &bytes[..], &config)
                   .unwrap());
    }

    #[test]
    fn invalid_version_rejected_on_write() {
        match serialize_versioned(WRITERS, 2, &(42i32,)) {
            Ok(b) => panic!("unexpectedly serialised {:?}", b),
            Err(Error::InvalidVersion(v)) => assert_eq!(2, v),
            Err(e) => panic!("unexpected error: {}", e),
        }
        match serialize_versioned(WRITERS, 0x1_0000, &(42i32,)) {
            Ok(b) => panic!("unexpectedly serialised {:?}", b),
            Err(Error::InvalidVersion(..)) => (),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn unknown_version_rejected_without_reading_payload() {
        let config = Config::default();
        let data = bytes("05 00 01 03 01 00 0E");
        match deserialize_versioned(READERS, &data[..], &config) {
            Ok(v) => panic!("unexpectedly decoded {:?}", v),
            Err(Error::WrongProtocolVersion(max, found)) => {
                assert_eq!(2, max);
                assert_eq!(5, found);
            },
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[test]
    fn short_versioned_blob_rejected() {
        let config = Config::default();
        match deserialize_versioned(READERS, &[][..], &config) {
            Err(Error::WrongProtocolVersion(2, 0)) => (),
            r => panic!("unexpected result: {:?}", r),
        }
        match deserialize_versioned(READERS, &[7][..], &config) {
            Err(Error::WrongProtocolVersion(2, 7)) => (),
            r => panic!("unexpected result: {:?}", r),
        }
    }

    #[test]
    fn explicit_version_decodes_bare_frame() {
        let config = Config::default();
        let bytes = serialize(&(42i32,)).unwrap();
        assert_eq!((42,),
                   deserialize_version(READERS, 0, &bytes[..], &config)
                   .unwrap());
        match deserialize_version(READERS, 9, &bytes[..], &config) {
            Err(Error::WrongProtocolVersion(2, 9)) => (),
            r => panic!("unexpected result: {:?}", r),
        }
    }

    #[test]
    fn unknown_version_keeps_stream_aligned() {
        let config = Config::default();
        let mut channel = Vec::new();
        // A frame from a hypothetical version 9 of the protocol...
        channel.extend(bytes("09 00"));
        channel.extend(serialize(&(1i32,)).unwrap());
        // ...followed by one this reader understands.
        write_versioned(WRITERS, 1, &mut channel, &(2i32,)).unwrap();

        let mut io = IoReader::new(io::Cursor::new(channel));
        match read_versioned(READERS, &mut io, &config) {
            Err(Error::WrongProtocolVersion(2, 9)) => (),
            r => panic!("unexpected result: {:?}", r),
        }
        assert_eq!((2,), read_versioned(READERS, &mut io, &config)
                   .unwrap());
    }

    #[test]
    fn read_frame_returns_raw_bytes() {
        let config = Config::default();
        let mut channel = Vec::new();
        write_versioned(WRITERS, 1, &mut channel, &(42i32,)).unwrap();

        let mut io = IoReader::new(io::Cursor::new(channel));
        let (version, bytes) = read_frame(&mut io, &config).unwrap();
        assert_eq!(1, version);
        assert_eq!(serialize(&(42i32,)).unwrap(), bytes);
    }
}
