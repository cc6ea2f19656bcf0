use bytes::Bytes;

use crate::codec::h264::NALUnit;

/// One H.264 access unit. Timestamps are 90 kHz ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSample {
    pub key: bool,
    pub pts: i64,
    pub dts: i64,
    /// Constituent NAL units, start codes excluded.
    pub units: Vec<NALUnit>,
}

impl VideoSample {
    /// Total payload size of all units.
    pub fn len(&self) -> usize {
        self.units.iter().map(|unit| unit.data.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// One ADTS or MPEG audio frame.
///
/// For AAC, `unit` is the raw frame with its ADTS header removed; MPEG audio
/// frames keep their header.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSample {
    pub unit: Bytes,
    pub pts: i64,
    pub dts: i64,
}

/// A timed-metadata (ID3) PES payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataSample {
    pub pts: i64,
    pub dts: i64,
    pub data: Bytes,
    pub len: usize,
}

/// Caption or user data carried in H.264 SEI messages.
#[derive(Debug, Clone, PartialEq)]
pub enum UserDataSample {
    /// Raw CEA-608 byte pairs wrapped in an ATSC A/53 (`GA94`) payload:
    /// the two header bytes followed by three bytes per caption.
    Cea608 { pts: i64, bytes: Vec<u8> },
    /// `user_data_registered_itu_t_t35` / unregistered payload with a UUID prefix.
    Registered {
        pts: i64,
        payload_type: u32,
        uuid: String,
        user_data: String,
        user_data_bytes: Bytes,
    },
}

impl UserDataSample {
    pub fn pts(&self) -> i64 {
        match self {
            UserDataSample::Cea608 { pts, .. } => *pts,
            UserDataSample::Registered { pts, .. } => *pts,
        }
    }
}
