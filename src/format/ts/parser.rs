use super::types::*;

/// PIDs announced by a PMT. Only the first stream of each kind is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PMTInfo {
    pub video: Option<u16>,
    pub audio: Option<u16>,
    pub id3: Option<u16>,
    /// `false` when the audio PID carries MPEG-1/2 audio.
    pub is_aac: bool,
}

impl Default for PMTInfo {
    fn default() -> Self {
        Self {
            video: None,
            audio: None,
            id3: None,
            is_aac: true,
        }
    }
}

/// Offset of the first of three sync bytes spaced one packet apart, within
/// the first `SYNC_SCAN_WINDOW` bytes.
pub fn sync_offset(data: &[u8]) -> Option<usize> {
    let scan_window = SYNC_SCAN_WINDOW.min(data.len().saturating_sub(2 * TS_PACKET_SIZE));
    (0..scan_window).find(|&i| {
        data[i] == SYNC_BYTE
            && data[i + TS_PACKET_SIZE] == SYNC_BYTE
            && data[i + 2 * TS_PACKET_SIZE] == SYNC_BYTE
    })
}

/// PMT PID of the first program. `offset` points at the table id.
pub fn parse_pat(data: &[u8], offset: usize) -> Option<u16> {
    let high = *data.get(offset + 10)?;
    let low = *data.get(offset + 11)?;
    Some((((high & 0x1F) as u16) << 8) | low as u16)
}

fn read_pid(data: &[u8], pos: usize) -> u16 {
    (((data[pos] & 0x1F) as u16) << 8) | data[pos + 1] as u16
}

fn read_length(data: &[u8], pos: usize) -> usize {
    (((data[pos] & 0x0F) as usize) << 8) | data[pos + 1] as usize
}

/// Maps the stream entries of a PMT section to track PIDs. `offset` points
/// at the table id. The CRC is not checked.
pub fn parse_pmt(data: &[u8], offset: usize, mpeg_supported: bool, is_sample_aes: bool) -> PMTInfo {
    let mut result = PMTInfo::default();
    if offset + 12 > data.len() {
        return result;
    }

    let section_length = read_length(data, offset + 1);
    // section_length counts from after its own field and includes the CRC
    let table_end = (offset + 3 + section_length)
        .saturating_sub(4)
        .min(data.len());
    let program_info_length = read_length(data, offset + 10);
    let mut pos = offset + 12 + program_info_length;

    while pos < table_end && pos + 5 <= data.len() {
        let stream_type = data[pos];
        let pid = read_pid(data, pos + 1);
        match stream_type {
            STREAM_TYPE_SAMPLE_AES_AAC if !is_sample_aes => {
                log::debug!("ADTS AAC with AES-128-CBC frame encryption found in unencrypted stream");
            }
            STREAM_TYPE_AAC | STREAM_TYPE_SAMPLE_AES_AAC => {
                result.audio.get_or_insert(pid);
            }
            STREAM_TYPE_METADATA => {
                result.id3.get_or_insert(pid);
            }
            STREAM_TYPE_SAMPLE_AES_H264 if !is_sample_aes => {
                log::debug!("H.264 with AES-128-CBC slice encryption found in unencrypted stream");
            }
            STREAM_TYPE_H264 | STREAM_TYPE_SAMPLE_AES_H264 => {
                result.video.get_or_insert(pid);
            }
            STREAM_TYPE_MPEG1_AUDIO | STREAM_TYPE_MPEG2_AUDIO => {
                if !mpeg_supported {
                    log::debug!("MPEG audio found, not supported by the configured playback stack");
                } else if result.audio.is_none() {
                    result.audio = Some(pid);
                    result.is_aac = false;
                }
            }
            STREAM_TYPE_H265 => {
                log::warn!("Unsupported HEVC stream type found");
            }
            _ => {}
        }
        pos += read_length(data, pos + 3) + 5;
    }

    result
}

#[cfg(test)]
pub(crate) mod test_utils {
    /// PAT section (table id first, no pointer field) for one program.
    pub fn pat_section(pmt_pid: u16) -> Vec<u8> {
        vec![
            0x00, // table id
            0xB0, 13, // section syntax, section length
            0x00, 0x01, // transport stream id
            0xC1, 0x00, 0x00, // version, section number, last section number
            0x00, 0x01, // program number
            0xE0 | (pmt_pid >> 8) as u8,
            pmt_pid as u8,
            0x00, 0x00, 0x00, 0x00, // CRC, not checked
        ]
    }

    /// PMT section listing `(stream_type, pid)` entries without descriptors.
    pub fn pmt_section(streams: &[(u8, u16)]) -> Vec<u8> {
        let section_length = 13 + 5 * streams.len();
        let mut section = vec![
            0x02,
            0xB0 | (section_length >> 8) as u8,
            section_length as u8,
            0x00, 0x01, // program number
            0xC1, 0x00, 0x00,
            0xE1, 0x00, // PCR PID
            0xF0, 0x00, // program info length
        ];
        for &(stream_type, pid) in streams {
            section.extend_from_slice(&[
                stream_type,
                0xE0 | (pid >> 8) as u8,
                pid as u8,
                0xF0,
                0x00,
            ]);
        }
        section.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        section
    }
}
