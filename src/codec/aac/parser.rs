use super::types::{AACConfig, ADTSHeader, ProfileType, AAC_FRAME_SAMPLES};
use crate::error::{DemuxError, Result};
use crate::utils::BitReader;

/// Sync word plus layer `00`; the ID and protection bits may take any value.
pub fn is_header_pattern(data: &[u8], offset: usize) -> bool {
    data[offset] == 0xFF && (data[offset + 1] & 0xF6) == 0xF0
}

pub fn is_header(data: &[u8], offset: usize) -> bool {
    offset + 1 < data.len() && is_header_pattern(data, offset)
}

pub fn header_length(data: &[u8], offset: usize) -> usize {
    if data[offset + 1] & 0x01 != 0 {
        7
    } else {
        9
    }
}

/// `aac_frame_length`: header and payload.
pub fn full_frame_length(data: &[u8], offset: usize) -> usize {
    ((data[offset + 3] as usize & 0x03) << 11)
        | ((data[offset + 4] as usize) << 3)
        | ((data[offset + 5] as usize & 0xE0) >> 5)
}

pub fn can_get_frame_length(data: &[u8], offset: usize) -> bool {
    offset + 5 < data.len()
}

/// Frame duration in 90 kHz ticks.
pub fn frame_duration(samplerate: u32) -> f64 {
    (AAC_FRAME_SAMPLES as f64 * 90_000.0) / samplerate as f64
}

/// Returns `(header_length, payload_length)` when a complete frame starts at
/// `offset`.
pub fn parse_frame_header(data: &[u8], offset: usize) -> Option<(usize, usize)> {
    if !can_get_frame_length(data, offset) {
        return None;
    }
    let header_length = header_length(data, offset);
    let payload_length = full_frame_length(data, offset).checked_sub(header_length)?;
    if payload_length > 0 && offset + header_length + payload_length <= data.len() {
        Some((header_length, payload_length))
    } else {
        None
    }
}

pub fn parse_adts_header(data: &[u8]) -> Result<ADTSHeader> {
    if data.len() < 7 {
        return Err(DemuxError::Parser("ADTS header too short".into()));
    }

    let mut reader = BitReader::new(data);

    let sync_word = reader.read_bits(12)?;
    if sync_word != 0xFFF {
        return Err(DemuxError::Parser("invalid ADTS sync word".into()));
    }

    let id = reader.read_bits(1)? as u8;
    let layer = reader.read_bits(2)? as u8;
    let protection_absent = reader.read_bool()?;
    let profile = ProfileType::from(reader.read_bits(2)? as u8);
    let sample_rate_index = reader.read_bits(4)? as u8;
    reader.skip_bits(1)?; // private_bit
    let channel_configuration = reader.read_bits(3)? as u8;
    reader.skip_bits(4)?; // original_copy, home, copyright id bit and start
    let frame_length = reader.read_bits(13)? as u16;
    reader.skip_bits(11)?; // adts_buffer_fullness
    let number_of_raw_blocks = reader.read_bits(2)? as u8;

    Ok(ADTSHeader {
        sync_word,
        id,
        layer,
        protection_absent,
        profile,
        sample_rate_index,
        channel_configuration,
        frame_length,
        number_of_raw_blocks,
    })
}

/// Builds the track configuration from the ADTS header at `offset`.
///
/// HE-AAC (object type 5, SBR at half the output rate) is signalled when the
/// codec hint names it, or when there is no hint and the sampling rate is
/// 24 kHz or lower.
pub fn audio_config(data: &[u8], offset: usize, audio_codec: Option<&str>) -> Result<AACConfig> {
    let header = parse_adts_header(data.get(offset..).unwrap_or_default())?;
    let sampling_index = header.sample_rate_index;
    let samplerate = header
        .sample_rate()
        .ok_or(DemuxError::InvalidSamplingIndex(sampling_index))?;
    let channel_count = header.channel_configuration;

    let he_aac = match audio_codec {
        Some(codec) => codec.contains("mp4a.40.29") || codec.contains("mp4a.40.5"),
        None => sampling_index >= 6,
    };
    let (object_type, extension_index) = if he_aac {
        (5u8, sampling_index.saturating_sub(3))
    } else {
        (header.profile.object_type(), sampling_index)
    };

    let mut config = vec![
        (object_type << 3) | ((sampling_index & 0x0E) >> 1),
        ((sampling_index & 0x01) << 7) | (channel_count << 3),
    ];
    if object_type == 5 {
        config[1] |= (extension_index & 0x0E) >> 1;
        config.push(((extension_index & 0x01) << 7) | (2 << 2));
        config.push(0);
    }

    Ok(AACConfig {
        config,
        samplerate,
        channel_count,
        codec: format!("mp4a.40.{}", object_type),
        manifest_codec: audio_codec.map(str::to_owned),
    })
}
