use crate::error::{DemuxError, Result};

/// A bit-level reader over H.264 RBSP data.
///
/// Supports the field kinds needed by SPS, slice header and SEI parsing:
/// - fixed-width big-endian fields (u(n))
/// - unsigned and signed exponential Golomb codes (ue(v), se(v))
/// - whole bytes, shorts and words at the current position
///
/// Example:
/// ```
/// use tsdemux::utils::BitReader;
///
/// let data = [0b10110011];
/// let mut reader = BitReader::new(&data);
///
/// assert_eq!(reader.read_bit().unwrap(), true);
/// assert_eq!(reader.read_bits(3).unwrap(), 0b011);
/// ```
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_offset: usize,
    bit_offset: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            data,
            byte_offset: 0,
            bit_offset: 0,
        }
    }

    /// Reads a single bit, `true` for 1.
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.byte_offset >= self.data.len() {
            return Err(DemuxError::Codec("no bits available".into()));
        }

        let bit = (self.data[self.byte_offset] >> (7 - self.bit_offset)) & 1;
        self.bit_offset += 1;

        if self.bit_offset == 8 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }

        Ok(bit == 1)
    }

    /// Reads `n` bits as a big-endian number. `n` may not exceed 32.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        if n > 32 {
            return Err(DemuxError::Codec(format!("cannot read {} bits at once", n)));
        }
        if (n as usize) > self.available_bits() {
            return Err(DemuxError::Codec("no bits available".into()));
        }

        let mut value = 0u32;
        for _ in 0..n {
            value = (value << 1) | self.read_bit()? as u32;
        }
        Ok(value)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_bit()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.read_bits(16)? as u16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_bits(32)
    }

    /// Reads an unsigned exponential Golomb code (ue(v)).
    ///
    /// `M` leading zeros, a one, then `M` info bits: value = 2^M + INFO - 1.
    /// "00110" has M=2, INFO=0b10, so decodes to 5.
    pub fn read_golomb(&mut self) -> Result<u32> {
        let mut leading_zeros = 0;
        while !self.read_bit()? {
            leading_zeros += 1;
            if leading_zeros > 31 {
                return Err(DemuxError::Codec("invalid Exp-Golomb code".into()));
            }
        }

        if leading_zeros == 0 {
            return Ok(0);
        }

        let info = self.read_bits(leading_zeros)?;
        Ok(((1u64 << leading_zeros) + info as u64 - 1) as u32)
    }

    /// Reads a signed exponential Golomb code (se(v)).
    ///
    /// Odd codes map to positive values, even codes to negative:
    /// 1 -> 1, 2 -> -1, 3 -> 2, 4 -> -2.
    pub fn read_signed_golomb(&mut self) -> Result<i32> {
        let k = self.read_golomb()?;
        let magnitude = ((k as i64 + 1) >> 1) as i32;
        if k & 1 == 1 {
            Ok(magnitude)
        } else {
            Ok(-magnitude)
        }
    }

    pub fn skip_golomb(&mut self) -> Result<()> {
        self.read_golomb().map(|_| ())
    }

    pub fn skip_signed_golomb(&mut self) -> Result<()> {
        self.read_signed_golomb().map(|_| ())
    }

    pub fn skip_bits(&mut self, n: u32) -> Result<()> {
        if (n as usize) > self.available_bits() {
            return Err(DemuxError::Codec("no bits available".into()));
        }
        let position = self.byte_offset * 8 + self.bit_offset as usize + n as usize;
        self.byte_offset = position / 8;
        self.bit_offset = (position % 8) as u8;
        Ok(())
    }

    pub fn skip_bytes(&mut self, n: usize) -> Result<()> {
        self.skip_bits((n * 8) as u32)
    }

    /// Skips the remaining bits of the current byte.
    pub fn align_byte(&mut self) {
        if self.bit_offset != 0 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }
    }

    pub fn available_bits(&self) -> usize {
        (self.data.len() - self.byte_offset) * 8 - self.bit_offset as usize
    }

    /// Whole bytes left to read.
    pub fn bytes_available(&self) -> usize {
        self.available_bits() / 8
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    /// Packs bits MSB-first, padding the final byte with zeros.
    #[derive(Default)]
    pub struct BitWriter {
        bits: Vec<bool>,
    }

    impl BitWriter {
        pub fn bits(&mut self, value: u32, n: u32) -> &mut Self {
            for i in (0..n).rev() {
                self.bits.push((value >> i) & 1 == 1);
            }
            self
        }

        pub fn golomb(&mut self, value: u32) -> &mut Self {
            let coded = value as u64 + 1;
            let width = 64 - coded.leading_zeros();
            for _ in 0..width - 1 {
                self.bits.push(false);
            }
            for i in (0..width).rev() {
                self.bits.push((coded >> i) & 1 == 1);
            }
            self
        }

        pub fn into_bytes(&self) -> Vec<u8> {
            self.bits
                .chunks(8)
                .map(|chunk| {
                    chunk
                        .iter()
                        .enumerate()
                        .fold(0u8, |byte, (i, &bit)| byte | ((bit as u8) << (7 - i)))
                })
                .collect()
        }
    }
}
