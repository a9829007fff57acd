//! Polar coder: a length-limited prefix code over the 512-symbol ROLZ
//! alphabet.
//!
//! Construction is a four-stage pipeline: a symbol-frequency histogram
//! produces a code-length table (`build_lengths`), the length table
//! produces canonical, bit-reversed codes (`build_codes`), and the codes
//! produce a flat 65536-entry decode lookup (`build_decode`). Encoding and
//! decoding a symbol then only ever touch these flat tables.

use std::io::{Read, Write};
use zlite_core::bitstream::{BitReader, BitWriter};
use zlite_core::error::{Result, ZliteError};

/// Size of the symbol alphabet: 256 literals plus 256 match codes.
pub const SYMBOLS: usize = 512;

/// Maximum code length, in bits, that the Polar coder will assign.
pub const MAX_LENGTH: u8 = 15;

/// Number of bytes in the packed on-wire length table (two 4-bit lengths
/// per byte).
pub const PACKED_LEN: usize = SYMBOLS / 2;

/// Size of the flat decode lookup table (every possible 16-bit bit window).
const DECODE_SIZE: usize = 1 << 16;

/// Largest power of two less than or equal to `x` (`0` maps to `0`).
fn round_down(x: u32) -> u32 {
    if x == 0 {
        0
    } else {
        1u32 << (31 - x.leading_zeros())
    }
}

/// Smallest power of two greater than or equal to `x` (`0` maps to `0`).
fn round_up(x: u32) -> u32 {
    if x == 0 {
        return 0;
    }
    let down = round_down(x);
    if down == x { down } else { down << 1 }
}

/// Reverse the low `len` bits of `value`.
fn reverse_bits(value: u16, len: u8) -> u16 {
    let mut v = value;
    let mut r = 0u16;
    for _ in 0..len {
        r = (r << 1) | (v & 1);
        v >>= 1;
    }
    r
}

/// Build a length-limited prefix code's length table from a symbol
/// frequency histogram.
///
/// Each nonzero-frequency symbol is assigned a code length such that the
/// resulting lengths satisfy the Kraft inequality with equality (a complete
/// code). Rescales and retries whenever a length would exceed
/// [`MAX_LENGTH`].
pub fn build_lengths(freq: &[u32; SYMBOLS]) -> [u8; SYMBOLS] {
    let mut shift: u32 = 0;

    loop {
        let mut w = [0u32; SYMBOLS];
        for s in 0..SYMBOLS {
            w[s] = if shift == 0 {
                freq[s]
            } else {
                let scaled = freq[s] >> shift;
                if scaled == 0 && freq[s] > 0 { 1 } else { scaled }
            };
        }

        let mut order: Vec<usize> = (0..SYMBOLS).collect();
        order.sort_by(|&a, &b| w[b].cmp(&w[a]).then(a.cmp(&b)));

        let sum: u64 = w.iter().map(|&x| u64::from(x)).sum();
        let total = round_up(sum as u32);

        let mut s_sum: u32 = 0;
        for x in w.iter_mut() {
            *x = round_down(*x);
            s_sum += *x;
        }

        while s_sum < total {
            let mut progressed = false;
            for &s in &order {
                if w[s] > 0 && s_sum + w[s] <= total {
                    s_sum += w[s];
                    w[s] *= 2;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        let mut lengths = [0u8; SYMBOLS];
        let mut overflow = false;
        for s in 0..SYMBOLS {
            if w[s] > 0 {
                let ratio = total / w[s];
                let mut k: u32 = 1;
                while (ratio >> (k + 1)) != 0 {
                    k += 1;
                }
                if k > u32::from(MAX_LENGTH) {
                    overflow = true;
                }
                lengths[s] = k as u8;
            }
        }

        if !overflow {
            return lengths;
        }
        shift += 1;
    }
}

/// Assign canonical, bit-reversed codes from a length table.
///
/// Codes are assigned shorter-first, then by ascending symbol index within
/// a length, then bit-reversed within their own length so a decoder can
/// match them against the low bits of an LSB-first bit buffer.
pub fn build_codes(lengths: &[u8; SYMBOLS]) -> [u16; SYMBOLS] {
    let mut codes = [0u16; SYMBOLS];
    let mut c: u32 = 0;

    for len in 1..=MAX_LENGTH {
        for (s, &l) in lengths.iter().enumerate() {
            if l == len {
                codes[s] = c as u16;
                c += 1;
            }
        }
        c *= 2;
    }

    for (s, &len) in lengths.iter().enumerate() {
        if len > 0 {
            codes[s] = reverse_bits(codes[s], len);
        }
    }

    codes
}

/// Build the flat 65536-entry decode lookup from a length/code table pair.
///
/// For every symbol with a nonzero length, every slot whose low
/// `length[s]` bits match `code[s]` is assigned to that symbol. When the
/// lengths came from [`build_lengths`], the resulting code is complete and
/// every slot ends up assigned.
pub fn build_decode(lengths: &[u8; SYMBOLS], codes: &[u16; SYMBOLS]) -> Box<[u16]> {
    let mut table = vec![0u16; DECODE_SIZE].into_boxed_slice();

    for (s, &len) in lengths.iter().enumerate() {
        if len == 0 {
            continue;
        }
        let step = 1usize << len;
        let mut i = codes[s] as usize;
        while i < DECODE_SIZE {
            table[i] = s as u16;
            i += step;
        }
    }

    table
}

/// Pack a length table into the on-wire form: two 4-bit lengths per byte,
/// high nibble first.
pub fn pack_lengths(lengths: &[u8; SYMBOLS]) -> [u8; PACKED_LEN] {
    let mut out = [0u8; PACKED_LEN];
    for (k, byte) in out.iter_mut().enumerate() {
        *byte = lengths[2 * k] * 16 + lengths[2 * k + 1];
    }
    out
}

/// Unpack an on-wire length table.
///
/// Nibbles are structurally bounded to 0..15, so this never fails on its
/// own; the check is carried so a generic length table built outside the
/// packed format (e.g. by a future format revision) is still rejected by
/// [`PolarCoder::from_lengths`].
pub fn unpack_lengths(bytes: &[u8; PACKED_LEN]) -> [u8; SYMBOLS] {
    let mut lengths = [0u8; SYMBOLS];
    for (k, &byte) in bytes.iter().enumerate() {
        lengths[2 * k] = byte >> 4;
        lengths[2 * k + 1] = byte & 0x0F;
    }
    lengths
}

/// A constructed Polar code: a length/code table pair, and on the decode
/// side the flat decode lookup built from them.
#[derive(Debug)]
pub struct PolarCoder {
    lengths: [u8; SYMBOLS],
    codes: [u16; SYMBOLS],
    decode_table: Option<Box<[u16]>>,
}

impl PolarCoder {
    /// Build a coder from a symbol frequency histogram (the encode path).
    pub fn from_frequencies(freq: &[u32; SYMBOLS]) -> Self {
        let lengths = build_lengths(freq);
        let codes = build_codes(&lengths);
        Self {
            lengths,
            codes,
            decode_table: None,
        }
    }

    /// Build a coder from a length table read off the wire (the decode
    /// path). Also builds the flat decode lookup.
    pub fn from_lengths(lengths: [u8; SYMBOLS]) -> Result<Self> {
        if let Some(&bad) = lengths.iter().find(|&&l| l > MAX_LENGTH) {
            return Err(ZliteError::corrupt_length_table(bad));
        }
        let codes = build_codes(&lengths);
        let decode_table = build_decode(&lengths, &codes);
        Ok(Self {
            lengths,
            codes,
            decode_table: Some(decode_table),
        })
    }

    /// The code-length table.
    pub fn lengths(&self) -> &[u8; SYMBOLS] {
        &self.lengths
    }

    /// The packed on-wire length table.
    pub fn pack_lengths(&self) -> [u8; PACKED_LEN] {
        pack_lengths(&self.lengths)
    }

    /// Write one symbol's code to the bitstream.
    pub fn encode_symbol<W: Write>(&self, writer: &mut BitWriter<W>, symbol: u16) -> Result<()> {
        let len = self.lengths[symbol as usize];
        debug_assert!(len > 0, "encoding a symbol absent from the frequency table");
        writer.write_bits(u32::from(self.codes[symbol as usize]), len)
    }

    /// Read one symbol's code from the bitstream.
    ///
    /// Panics (via `debug_assert`) if this coder was built with
    /// [`PolarCoder::from_frequencies`] rather than
    /// [`PolarCoder::from_lengths`], since only the latter carries a decode
    /// table.
    pub fn decode_symbol<R: Read>(&self, reader: &mut BitReader<R>) -> Result<u16> {
        let table = self
            .decode_table
            .as_ref()
            .expect("decode_symbol requires a coder built from a length table");

        let bits = reader.peek_bits_padded(16);
        let symbol = table[bits as usize];
        let len = self.lengths[symbol as usize];
        reader.skip_bits(len)?;
        Ok(symbol)
    }
}
