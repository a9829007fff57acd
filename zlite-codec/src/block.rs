//! Block container: glues [`RolzCodec`] and [`PolarCoder`] together and
//! drives the on-wire block format.
//!
//! A stream is a concatenation of zero or more blocks, each up to
//! [`MAX_BLOCK_IN`] input bytes. A block is `rlen` (4 bytes, native
//! endianness), `olen` (4 bytes, native endianness), then `olen` payload
//! bytes: a 256-byte packed length table followed by the Polar bitstream.

use std::io::{Read, Write};

use zlite_core::bitstream::{BitReader, BitWriter};
use zlite_core::error::{Result, ZliteError};

use crate::polar::{self, PolarCoder, SYMBOLS};
use crate::rolz::RolzCodec;

/// Maximum number of input bytes accepted in a single block.
pub const MAX_BLOCK_IN: usize = 1 << 24;

/// Size of the packed on-wire length table, in bytes.
const LENGTH_TABLE_BYTES: usize = polar::PACKED_LEN;

/// Orchestrates one block end-to-end: ROLZ, Polar table construction, and
/// the block header/payload framing.
///
/// Owns its working buffers so repeated calls across many blocks reuse
/// the same allocations instead of reallocating per block.
pub struct BlockPipeline {
    rolz: RolzCodec,
    input: Vec<u8>,
    symbols: Vec<u16>,
    freq: [u32; SYMBOLS],
    bitstream: Vec<u8>,
    payload: Vec<u8>,
    decoded: Vec<u8>,
}

impl BlockPipeline {
    /// Construct a pipeline with freshly allocated, empty working buffers.
    pub fn new() -> Self {
        Self {
            rolz: RolzCodec::new(),
            input: Vec::with_capacity(MAX_BLOCK_IN),
            symbols: Vec::with_capacity(MAX_BLOCK_IN),
            freq: [0u32; SYMBOLS],
            bitstream: Vec::new(),
            payload: Vec::new(),
            decoded: Vec::new(),
        }
    }

    /// Read up to one block's worth of input, compress it, and write the
    /// framed block to `writer`.
    ///
    /// Returns `Ok(false)` with nothing written when `reader` is already
    /// at end of stream (a clean place to stop). Returns `Ok(true)` after
    /// writing exactly one block.
    pub fn encode_block<R: Read, W: Write>(&mut self, reader: &mut R, writer: &mut W) -> Result<bool> {
        self.input.resize(MAX_BLOCK_IN, 0);
        let n = read_partial(reader, &mut self.input)?;
        self.input.truncate(n);
        if n == 0 {
            return Ok(false);
        }

        self.rolz.reset();
        self.symbols.clear();
        self.rolz.encode(&self.input, &mut self.symbols);

        let rlen = self.symbols.len() as u32;

        self.freq = [0u32; SYMBOLS];
        for &s in &self.symbols {
            self.freq[s as usize] += 1;
        }

        let coder = PolarCoder::from_frequencies(&self.freq);
        let packed_lengths = coder.pack_lengths();

        self.bitstream.clear();
        {
            let mut bit_writer = BitWriter::new(&mut self.bitstream);
            for &s in &self.symbols {
                coder.encode_symbol(&mut bit_writer, s)?;
            }
            bit_writer.flush()?;
        }

        let olen = (LENGTH_TABLE_BYTES + self.bitstream.len()) as u32;

        writer.write_all(&rlen.to_ne_bytes())?;
        writer.write_all(&olen.to_ne_bytes())?;
        writer.write_all(&packed_lengths)?;
        writer.write_all(&self.bitstream)?;

        Ok(true)
    }

    /// Read one framed block from `reader`, decompress it, and write the
    /// recovered bytes to `writer`.
    ///
    /// Returns `Ok(false)` with nothing written when `reader` is at a
    /// clean end of stream (no header bytes present at all). A header
    /// that is only partially present is a corrupt stream, not a clean
    /// EOF.
    pub fn decode_block<R: Read, W: Write>(&mut self, reader: &mut R, writer: &mut W) -> Result<bool> {
        let mut header = [0u8; 8];
        let header_len = read_partial(reader, &mut header)?;
        if header_len == 0 {
            return Ok(false);
        }
        if header_len != 8 {
            return Err(ZliteError::CorruptHeader);
        }

        let rlen = u32::from_ne_bytes(header[0..4].try_into().unwrap());
        let olen = u32::from_ne_bytes(header[4..8].try_into().unwrap());

        if rlen as usize > MAX_BLOCK_IN {
            return Err(ZliteError::block_too_large(rlen));
        }

        self.payload.resize(olen as usize, 0);
        let payload_len = read_partial(reader, &mut self.payload)?;
        if payload_len != olen as usize {
            return Err(ZliteError::truncated_payload(olen, payload_len as u32));
        }
        if (olen as usize) < LENGTH_TABLE_BYTES {
            return Err(ZliteError::truncated_payload(olen, olen));
        }

        let length_table: [u8; LENGTH_TABLE_BYTES] =
            self.payload[..LENGTH_TABLE_BYTES].try_into().unwrap();
        let lengths = polar::unpack_lengths(&length_table);
        let coder = PolarCoder::from_lengths(lengths)?;

        let bitstream_bytes = self.payload.len() - LENGTH_TABLE_BYTES;
        let available_bits = (bitstream_bytes as u64) * 8;
        let mut consumed_bits: u64 = 0;

        self.symbols.clear();
        {
            let mut bit_reader = BitReader::new(&self.payload[LENGTH_TABLE_BYTES..]);
            for decoded in 0..rlen {
                let symbol = coder.decode_symbol(&mut bit_reader)?;
                consumed_bits += u64::from(coder.lengths()[symbol as usize]);
                // A legitimate stream only ever zero-pads its final byte
                // (at most 7 bits); consuming more than that past the
                // declared bitstream length means the payload was cut
                // short mid-symbol.
                if consumed_bits > available_bits + 7 {
                    return Err(ZliteError::bitstream_exhausted(decoded + 1, rlen));
                }
                self.symbols.push(symbol);
            }
        }

        self.rolz.reset();
        self.decoded.clear();
        self.rolz.decode(&self.symbols, &mut self.decoded)?;
        writer.write_all(&self.decoded)?;

        Ok(true)
    }

    /// Compress every block of `reader` into `writer` until `reader` is
    /// exhausted.
    pub fn encode_stream<R: Read, W: Write>(&mut self, reader: &mut R, writer: &mut W) -> Result<()> {
        while self.encode_block(reader, writer)? {}
        Ok(())
    }

    /// Decompress every block of `reader` into `writer` until `reader` is
    /// exhausted.
    pub fn decode_stream<R: Read, W: Write>(&mut self, reader: &mut R, writer: &mut W) -> Result<()> {
        while self.decode_block(reader, writer)? {}
        Ok(())
    }
}

impl Default for BlockPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Read into `buf` until it is full or the reader reaches end of stream,
/// returning the number of bytes actually read.
fn read_partial<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(input: &[u8]) -> Vec<u8> {
        let mut pipeline = BlockPipeline::new();
        let mut compressed = Vec::new();
        let mut reader = Cursor::new(input);
        pipeline.encode_stream(&mut reader, &mut compressed).unwrap();

        let mut decompressed = Vec::new();
        let mut payload = Cursor::new(&compressed);
        pipeline.decode_stream(&mut payload, &mut decompressed).unwrap();
        decompressed
    }

    #[test]
    fn test_empty_input_produces_no_blocks() {
        let mut pipeline = BlockPipeline::new();
        let mut compressed = Vec::new();
        let mut reader = Cursor::new(&b""[..]);
        let wrote = pipeline.encode_block(&mut reader, &mut compressed).unwrap();
        assert!(!wrote);
        assert!(compressed.is_empty());
    }

    #[test]
    fn test_single_byte_roundtrip() {
        assert_eq!(roundtrip(b"A"), b"A");
    }

    #[test]
    fn test_zero_run_roundtrip() {
        let input = vec![0u8; 32];
        assert_eq!(roundtrip(&input), input);
    }

    #[test]
    fn test_abab_pattern_roundtrip() {
        assert_eq!(roundtrip(b"abababababab"), b"abababababab");
    }

    #[test]
    fn test_one_mib_random_roundtrip() {
        let mut state: u32 = 0xC0FFEE;
        let input: Vec<u8> = (0..1 << 20)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state & 0xFF) as u8
            })
            .collect();
        assert_eq!(roundtrip(&input), input);
    }

    #[test]
    fn test_two_block_boundary_at_16_mib() {
        let mut input = vec![0u8; MAX_BLOCK_IN];
        for (i, b) in input.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        input.extend(std::iter::repeat(0xAB).take(1024));

        let mut pipeline = BlockPipeline::new();
        let mut compressed = Vec::new();
        let mut reader = Cursor::new(&input);
        pipeline.encode_stream(&mut reader, &mut compressed).unwrap();

        let mut decompressed = Vec::new();
        let mut payload = Cursor::new(&compressed);
        pipeline.decode_stream(&mut payload, &mut decompressed).unwrap();

        assert_eq!(decompressed, input);
    }

    #[test]
    fn test_partial_header_is_corrupt_not_eof() {
        let mut pipeline = BlockPipeline::new();
        let mut compressed = Vec::new();
        {
            let mut reader = Cursor::new(b"hello world");
            pipeline.encode_stream(&mut reader, &mut compressed).unwrap();
        }
        compressed.truncate(5);

        let mut pipeline = BlockPipeline::new();
        let mut out = Vec::new();
        let mut reader = Cursor::new(&compressed);
        let err = pipeline.decode_stream(&mut reader, &mut out).unwrap_err();
        assert!(matches!(err, ZliteError::CorruptHeader));
    }

    #[test]
    fn test_truncated_payload_is_corrupt() {
        let mut pipeline = BlockPipeline::new();
        let mut compressed = Vec::new();
        {
            let mut reader = Cursor::new(b"hello world, this has some repetition, repetition");
            pipeline.encode_stream(&mut reader, &mut compressed).unwrap();
        }
        compressed.truncate(compressed.len() - 4);

        let mut pipeline = BlockPipeline::new();
        let mut out = Vec::new();
        let mut reader = Cursor::new(&compressed);
        let err = pipeline.decode_stream(&mut reader, &mut out).unwrap_err();
        assert!(matches!(err, ZliteError::TruncatedPayload { .. }));
    }

    #[test]
    fn test_oversized_rlen_is_rejected() {
        let mut header = Vec::new();
        header.extend_from_slice(&(MAX_BLOCK_IN as u32 + 1).to_ne_bytes());
        header.extend_from_slice(&0u32.to_ne_bytes());

        let mut pipeline = BlockPipeline::new();
        let mut out = Vec::new();
        let mut reader = Cursor::new(&header);
        let err = pipeline.decode_block(&mut reader, &mut out).unwrap_err();
        assert!(matches!(err, ZliteError::BlockTooLarge { .. }));
    }
}
