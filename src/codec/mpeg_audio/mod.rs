//! MPEG-1/2 audio (layers I-III) frame headers.

const BITRATES_KBPS: [u32; 70] = [
    32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, // v1 layer I
    32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, // v1 layer II
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, // v1 layer III
    32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, // v2 layer I
    8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, // v2 layers II & III
];

const SAMPLING_RATES: [u32; 9] = [
    44100, 48000, 32000, // MPEG-1
    22050, 24000, 16000, // MPEG-2
    11025, 12000, 8000, // MPEG-2.5
];

/// Indexed by version bits then layer bits.
const SAMPLES_COEFFICIENTS: [[u32; 4]; 4] = [
    [0, 72, 144, 12], // MPEG-2.5
    [0, 0, 0, 0],     // reserved
    [0, 72, 144, 12], // MPEG-2
    [0, 144, 144, 12], // MPEG-1
];

/// Indexed by layer bits.
const BYTES_IN_SLOT: [u32; 4] = [0, 1, 1, 4];

/// Minimum bytes needed before a frame is extracted.
pub const MIN_FRAME_BYTES: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpegAudioHeader {
    pub sample_rate: u32,
    pub channel_count: u8,
    /// Whole frame, header included.
    pub frame_length: usize,
    pub samples_per_frame: u32,
}

impl MpegAudioHeader {
    /// Frame duration in 90 kHz ticks.
    pub fn frame_duration(&self) -> f64 {
        (self.samples_per_frame as f64 * 90_000.0) / self.sample_rate as f64
    }
}

/// 11-bit sync and a non-reserved layer.
pub fn is_header_pattern(data: &[u8], offset: usize) -> bool {
    data[offset] == 0xFF && (data[offset + 1] & 0xE0) == 0xE0 && (data[offset + 1] & 0x06) != 0
}

pub fn is_header(data: &[u8], offset: usize) -> bool {
    offset + 1 < data.len() && is_header_pattern(data, offset)
}

pub fn parse_header(data: &[u8], offset: usize) -> Option<MpegAudioHeader> {
    let header = data.get(offset..offset + 4)?;
    let version = (header[1] >> 3) & 3;
    let layer = (header[1] >> 1) & 3;
    let bitrate_index = (header[2] >> 4) & 15;
    let sample_rate_index = (header[2] >> 2) & 3;

    if version == 1 || bitrate_index == 0 || bitrate_index == 15 || sample_rate_index == 3 {
        return None;
    }

    let padding = ((header[2] >> 1) & 1) as u32;
    let channel_mode = header[3] >> 6;
    let column = if version == 3 {
        3 - layer as usize
    } else if layer == 3 {
        3
    } else {
        4
    };
    let bitrate = BITRATES_KBPS[column * 14 + bitrate_index as usize - 1] * 1000;
    let rate_row = match version {
        3 => 0,
        2 => 1,
        _ => 2,
    };
    let sample_rate = SAMPLING_RATES[rate_row * 3 + sample_rate_index as usize];
    let coefficient = SAMPLES_COEFFICIENTS[version as usize][layer as usize];
    let slot = BYTES_IN_SLOT[layer as usize];
    let frame_length = ((coefficient * bitrate / sample_rate + padding) * slot) as usize;

    Some(MpegAudioHeader {
        sample_rate,
        channel_count: if channel_mode == 3 { 1 } else { 2 },
        frame_length,
        samples_per_frame: coefficient * 8 * slot,
    })
}

/// Header of a frame that is entirely contained in `data`.
pub fn parse_frame(data: &[u8], offset: usize) -> Option<MpegAudioHeader> {
    if offset + MIN_FRAME_BYTES > data.len() {
        return None;
    }
    parse_header(data, offset)
        .filter(|header| header.frame_length > 0 && offset + header.frame_length <= data.len())
}

#[cfg(test)]
pub(crate) mod test_utils {
    /// MPEG-1 layer III, 128 kbps, 44.1 kHz, joint stereo: 417 bytes.
    pub fn mp3_frame() -> Vec<u8> {
        let mut frame = vec![0xFF, 0xFB, 0x90, 0x40];
        frame.resize(417, 0x55);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::mp3_frame;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_layer3_header() {
        let frame = mp3_frame();
        assert!(is_header(&frame, 0));
        let header = parse_header(&frame, 0).unwrap();
        assert_eq!(
            header,
            MpegAudioHeader {
                sample_rate: 44100,
                channel_count: 2,
                frame_length: 417,
                samples_per_frame: 1152,
            }
        );
    }

    #[test]
    fn test_mpeg2_layer2_header() {
        // MPEG-2 layer II, 64 kbps, 24 kHz, padding, mono
        let header = parse_header(&[0xFF, 0xF4, 0x86, 0xC0], 0).unwrap();
        assert_eq!(header.sample_rate, 24000);
        assert_eq!(header.channel_count, 1);
        assert_eq!(header.frame_length, 385);
        assert_eq!(header.samples_per_frame, 1152);
    }

    #[test]
    fn test_rejects_reserved_fields() {
        // free format bitrate
        assert_eq!(parse_header(&[0xFF, 0xFB, 0x00, 0x40], 0), None);
        // reserved sample rate
        assert_eq!(parse_header(&[0xFF, 0xFB, 0x9C, 0x40], 0), None);
        // reserved version
        assert_eq!(parse_header(&[0xFF, 0xEB, 0x90, 0x40], 0), None);
        // reserved layer
        assert!(!is_header(&[0xFF, 0xF9], 0));
    }

    #[test]
    fn test_parse_frame_needs_whole_frame() {
        let frame = mp3_frame();
        assert!(parse_frame(&frame, 0).is_some());
        assert_eq!(parse_frame(&frame[..416], 0), None);
        assert_eq!(parse_frame(&frame[..20], 0), None);
    }
}
