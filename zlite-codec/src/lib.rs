//! # zlite-codec
//!
//! The `zlite` compression core: a reduced-offset Lempel-Ziv matcher (ROLZ)
//! paired with a length-limited prefix code (Polar), glued together by a
//! block container.
//!
//! - [`polar`]: frequency table → code length table → canonical code table
//!   → flat decode lookup, plus the bitstream symbol encode/decode.
//! - [`rolz`]: byte stream ↔ 16-bit symbol stream, via a per-context ring
//!   of recent positions.
//! - [`block`]: orchestrates one block end-to-end on both the encode and
//!   decode paths.
//!
//! ## Example
//!
//! ```rust
//! use zlite_codec::block::BlockPipeline;
//! use std::io::Cursor;
//!
//! let data = b"abababababab".repeat(4);
//!
//! let mut pipeline = BlockPipeline::new();
//! let mut compressed = Vec::new();
//! let mut input = Cursor::new(&data);
//! pipeline.encode_block(&mut input, &mut compressed).unwrap();
//!
//! let mut decompressed = Vec::new();
//! let mut payload = Cursor::new(&compressed);
//! pipeline.decode_block(&mut payload, &mut decompressed).unwrap();
//!
//! assert_eq!(decompressed, data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod polar;
pub mod rolz;

pub use block::BlockPipeline;
pub use polar::PolarCoder;
pub use rolz::RolzCodec;
