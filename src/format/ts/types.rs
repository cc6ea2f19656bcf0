// PIDs
pub const PID_PAT: u16 = 0x0000;
/// Service description table, never demuxed.
pub const PID_SDT: u16 = 0x0011;
pub const PID_NULL: u16 = 0x1FFF;

// Elementary stream types
pub const STREAM_TYPE_MPEG1_AUDIO: u8 = 0x03;
pub const STREAM_TYPE_MPEG2_AUDIO: u8 = 0x04;
pub const STREAM_TYPE_AAC: u8 = 0x0f;
pub const STREAM_TYPE_METADATA: u8 = 0x15;
pub const STREAM_TYPE_H264: u8 = 0x1b;
pub const STREAM_TYPE_H265: u8 = 0x24;
pub const STREAM_TYPE_SAMPLE_AES_AAC: u8 = 0xcf;
pub const STREAM_TYPE_SAMPLE_AES_H264: u8 = 0xdb;

// Constants
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_HEADER_SIZE: usize = 4;
pub const SYNC_BYTE: u8 = 0x47;
pub const MAX_PES_HEADER_SIZE: usize = 19;
pub const PTS_HZ: i64 = 90_000;
/// Largest tolerated PTS - DTS gap.
pub const MAX_PTS_DTS_GAP: i64 = 60 * PTS_HZ;
pub const MIN_PROBE_BYTE_LENGTH: usize = TS_PACKET_SIZE;
/// Bytes scanned for the first aligned sync triplet.
pub const SYNC_SCAN_WINDOW: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TSHeader {
    pub transport_error: bool,
    pub payload_unit_start: bool,
    pub pid: u16,
    /// adaptation_field_control
    pub adaptation_field: u8,
    pub continuity_counter: u8,
}

impl TSHeader {
    /// Decodes the 4-byte header, `None` when the sync byte is missing.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < TS_HEADER_SIZE || data[0] != SYNC_BYTE {
            return None;
        }
        Some(Self {
            transport_error: (data[1] & 0x80) != 0,
            payload_unit_start: (data[1] & 0x40) != 0,
            pid: (((data[1] & 0x1F) as u16) << 8) | data[2] as u16,
            adaptation_field: (data[3] & 0x30) >> 4,
            continuity_counter: data[3] & 0x0F,
        })
    }

    /// Offset of the payload within the packet.
    ///
    /// Only `adaptation_field` values 2 and 3 carry an adaptation field; the
    /// length byte follows the header.
    pub fn payload_offset(&self, packet: &[u8]) -> usize {
        if self.adaptation_field > 1 {
            TS_HEADER_SIZE + 1 + packet.get(TS_HEADER_SIZE).copied().unwrap_or(0) as usize
        } else {
            TS_HEADER_SIZE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_ts_header() {
        let data = [0x47, 0x41, 0x00, 0x3A, 0x07];
        let header = TSHeader::parse(&data).unwrap();
        assert_eq!(
            header,
            TSHeader {
                transport_error: false,
                payload_unit_start: true,
                pid: 0x100,
                adaptation_field: 3,
                continuity_counter: 0x0A,
            }
        );
        assert_eq!(header.payload_offset(&data), 12);
    }

    #[test]
    fn test_missing_sync_byte() {
        assert_eq!(TSHeader::parse(&[0x46, 0x40, 0x00, 0x10]), None);
        assert_eq!(TSHeader::parse(&[0x47, 0x40]), None);
    }

    #[test]
    fn test_payload_only() {
        let data = [0x47, 0x1F, 0xFF, 0x10];
        let header = TSHeader::parse(&data).unwrap();
        assert_eq!(header.pid, PID_NULL);
        assert_eq!(header.payload_offset(&data), 4);
    }
}
