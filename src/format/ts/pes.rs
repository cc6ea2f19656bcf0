use bytes::{Bytes, BytesMut};

use super::types::{MAX_PES_HEADER_SIZE, MAX_PTS_DTS_GAP, PTS_HZ};

/// Helper for assembling PES packets from TS payloads.
///
/// Fragments are kept as slices of the input chunks; they are only copied
/// when a packet spans more than one TS payload.
#[derive(Debug, Default, Clone)]
pub struct PESBuilder {
    fragments: Vec<Bytes>,
    /// Accumulated payload bytes
    size: usize,
}

impl PESBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the payload of one TS packet.
    pub fn push_data(&mut self, data: Bytes) {
        self.size += data.len();
        self.fragments.push(data);
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// A reassembled PES packet. Timestamps are 90 kHz ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct PESPacket {
    pub data: Bytes,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    /// Declared payload length, `None` for unbounded (video) PES.
    pub len: Option<usize>,
}

/// Decodes a 33-bit PTS/DTS from its 5-byte marker-delimited encoding.
pub fn parse_timestamp(data: &[u8]) -> i64 {
    ((data[0] as i64 & 0x0E) << 29)
        | ((data[1] as i64) << 22)
        | ((data[2] as i64 & 0xFE) << 14)
        | ((data[3] as i64) << 7)
        | ((data[4] as i64 & 0xFE) >> 1)
}

/// First `MAX_PES_HEADER_SIZE` bytes, merged across fragments when the first
/// one is too short.
fn header_bytes(fragments: &[Bytes]) -> Option<Bytes> {
    let first = fragments.first()?;
    if first.len() >= MAX_PES_HEADER_SIZE {
        return Some(first.clone());
    }
    let mut merged = BytesMut::with_capacity(MAX_PES_HEADER_SIZE);
    for fragment in fragments {
        merged.extend_from_slice(fragment);
        if merged.len() >= MAX_PES_HEADER_SIZE {
            return Some(merged.freeze());
        }
    }
    None
}

/// Parses the accumulated fragments into a PES packet.
///
/// Returns `None` when the header is incomplete, the start code prefix is
/// wrong, or fewer bytes than the declared PES length were received.
pub fn parse_pes(builder: &PESBuilder) -> Option<PESPacket> {
    let header = header_bytes(&builder.fragments)?;

    let prefix = ((header[0] as u32) << 16) | ((header[1] as u32) << 8) | header[2] as u32;
    if prefix != 1 {
        return None;
    }

    let pes_len = ((header[4] as usize) << 8) | header[5] as usize;
    if pes_len != 0 && pes_len > builder.size - 6 {
        return None;
    }

    let flags = header[7];
    let mut pts = None;
    let mut dts = None;
    if flags & 0xC0 != 0 {
        let pes_pts = parse_timestamp(&header[9..14]);
        if flags & 0x40 != 0 {
            let pes_dts = parse_timestamp(&header[14..19]);
            if pes_pts - pes_dts > MAX_PTS_DTS_GAP {
                log::warn!(
                    "{}s delta between PTS and DTS, align them",
                    ((pes_pts - pes_dts) as f64 / PTS_HZ as f64).round()
                );
                pts = Some(pes_dts);
            } else {
                pts = Some(pes_pts);
            }
            dts = Some(pes_dts);
        } else {
            pts = Some(pes_pts);
            dts = Some(pes_pts);
        }
    }

    let header_len = header[8] as usize;
    // 6 bytes of packet header and 3 of optional header
    let payload_start = header_len + 9;
    if builder.size <= payload_start {
        return None;
    }

    let mut skip = payload_start;
    let mut payload: Vec<Bytes> = Vec::with_capacity(builder.fragments.len());
    for fragment in &builder.fragments {
        if skip >= fragment.len() {
            skip -= fragment.len();
            continue;
        }
        payload.push(fragment.slice(skip..));
        skip = 0;
    }

    let data = match payload.len() {
        1 => payload.swap_remove(0),
        _ => {
            let mut data = BytesMut::with_capacity(builder.size - payload_start);
            for fragment in &payload {
                data.extend_from_slice(fragment);
            }
            data.freeze()
        }
    };

    Some(PESPacket {
        data,
        pts,
        dts,
        len: (pes_len != 0).then(|| pes_len.saturating_sub(header_len + 3)),
    })
}
