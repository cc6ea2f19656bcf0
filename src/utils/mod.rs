//! # Utility Functions and Types
//!
//! Bit-level reading for the Exp-Golomb coded fields found in H.264
//! parameter sets, slice headers and SEI messages:
//!
//! ```rust
//! use tsdemux::utils::BitReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = vec![0b10110011u8];
//! let mut reader = BitReader::new(&data);
//!
//! assert_eq!(reader.read_bits(3)?, 0b101);
//! assert_eq!(reader.read_golomb()?, 2); // "011"
//! # Ok(())
//! # }
//! ```

/// Bitstream reading utilities
pub mod bits;

pub use bits::BitReader;
