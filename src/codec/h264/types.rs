use bytes::Bytes;

use super::nal::ZeroRun;

/// A NAL unit extracted from an Annex-B byte stream, start code excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct NALUnit {
    pub nal_type: u8,
    pub data: Bytes,
    /// Zero run observed at the end of the buffer this unit was cut from.
    /// Only meaningful for the last unit of a buffer, where those zeros may
    /// turn out to be the beginning of the next start code.
    pub(crate) trailing: ZeroRun,
}

impl NALUnit {
    pub fn new(nal_type: u8, data: Bytes) -> Self {
        Self {
            nal_type,
            data,
            trailing: ZeroRun::NoZero,
        }
    }

    pub fn unit_type(&self) -> NALUnitType {
        NALUnitType::from(self.nal_type)
    }

    pub fn nal_ref_idc(&self) -> u8 {
        self.data.first().map_or(0, |header| (header >> 5) & 0x03)
    }
}

/// Dimensions and sample aspect ratio decoded from an SPS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SPSInfo {
    pub profile_idc: u8,
    pub level_idc: u8,
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: (u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NALUnitType {
    Unspecified = 0,
    CodedSliceNonIDR = 1,
    CodedSliceDataPartitionA = 2,
    CodedSliceDataPartitionB = 3,
    CodedSliceDataPartitionC = 4,
    CodedSliceIDR = 5,
    SEI = 6,
    SPS = 7,
    PPS = 8,
    AccessUnitDelimiter = 9,
    EndOfSequence = 10,
    EndOfStream = 11,
    FillerData = 12,
}

impl From<u8> for NALUnitType {
    fn from(value: u8) -> Self {
        match value & 0x1f {
            1 => NALUnitType::CodedSliceNonIDR,
            2 => NALUnitType::CodedSliceDataPartitionA,
            3 => NALUnitType::CodedSliceDataPartitionB,
            4 => NALUnitType::CodedSliceDataPartitionC,
            5 => NALUnitType::CodedSliceIDR,
            6 => NALUnitType::SEI,
            7 => NALUnitType::SPS,
            8 => NALUnitType::PPS,
            9 => NALUnitType::AccessUnitDelimiter,
            10 => NALUnitType::EndOfSequence,
            11 => NALUnitType::EndOfStream,
            12 => NALUnitType::FillerData,
            _ => NALUnitType::Unspecified,
        }
    }
}
