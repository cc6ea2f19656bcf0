//! # H.264/AVC bitstream parsing
//!
//! - Annex-B start code scanning that survives arbitrary buffer splits
//! - Sequence parameter set decoding (dimensions, aspect ratio, codec string)
//! - Slice type inspection for keyframe detection
//! - SEI caption and user data extraction
//!
//! ## Example: scanning a buffer split in two
//!
//! ```rust
//! use bytes::Bytes;
//! use tsdemux::codec::h264::NalScanner;
//!
//! let mut scanner = NalScanner::new();
//! let first = scanner.scan(&Bytes::from_static(&[0, 0, 0, 1, 0x09, 0xF0, 0, 0]));
//! let second = scanner.scan(&Bytes::from_static(&[1, 0x65, 0x88]));
//!
//! assert_eq!(first.units[0].nal_type, 9);
//! assert_eq!(second.units[0].nal_type, 5);
//! // the two zeros that opened the second start code belong to no unit
//! assert_eq!(second.spill.unwrap().trim, 2);
//! ```

/// Start code scanning
pub mod nal;
/// SPS and slice header parsing
pub mod parser;
/// SEI payload parsing
pub mod sei;
/// NAL unit types
pub mod types;

#[doc(inline)]
pub use nal::{NalScan, NalScanner, Spill, ZeroRun};
#[doc(inline)]
pub use parser::{codec_string, discard_epb, is_intra_slice, parse_sps, read_slice_type};
#[doc(inline)]
pub use sei::{parse_sei, SeiMessage};
#[doc(inline)]
pub use types::{NALUnit, NALUnitType, SPSInfo};
