//! # zlite-core
//!
//! Shared building blocks for the `zlite` codec:
//!
//! - [`bitstream`]: LSB-first bit-level I/O (`BitReader`/`BitWriter`), used
//!   by the Polar coder's bitstream.
//! - [`error`]: The crate-wide error type and `Result` alias.
//!
//! ## Example
//!
//! ```rust
//! use zlite_core::bitstream::{BitReader, BitWriter};
//! use std::io::Cursor;
//!
//! let mut output = Vec::new();
//! {
//!     let mut writer = BitWriter::new(&mut output);
//!     writer.write_bits(0b101, 3).unwrap();
//!     writer.flush().unwrap();
//! }
//!
//! let mut reader = BitReader::new(Cursor::new(&output));
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod error;

pub use bitstream::{BitReader, BitWriter};
pub use error::{Result, ZliteError};
