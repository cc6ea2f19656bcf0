use bytes::{Bytes, BytesMut};

use crate::av::{AudioSample, AudioTrack, MetadataSample, MetadataTrack};
use crate::codec::{aac, mpeg_audio};
use crate::error::{DemuxError, ErrorEvent, ErrorSink};

use super::pes::PESPacket;

/// ADTS state carried between PES packets: the bytes of a frame cut by the
/// PES boundary, and the timestamp of the last frame extracted.
#[derive(Debug, Default)]
pub struct AacState {
    overflow: Option<Bytes>,
    last_pts: Option<i64>,
}

impl AacState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.overflow = None;
        self.last_pts = None;
    }

    pub fn overflow(&self) -> Option<&Bytes> {
        self.overflow.as_ref()
    }

    pub fn last_pts(&self) -> Option<i64> {
        self.last_pts
    }

    /// Extracts the ADTS frames of a PES, prefixed with the previous
    /// overflow. Incomplete trailing frames are kept for the next PES.
    pub fn parse_pes(
        &mut self,
        pes: &PESPacket,
        track: &mut AudioTrack,
        audio_codec: Option<&str>,
        sink: &mut dyn ErrorSink,
    ) {
        let overflow = self.overflow.take();
        let data = match &overflow {
            Some(overflow) => {
                let mut merged = BytesMut::with_capacity(overflow.len() + pes.data.len());
                merged.extend_from_slice(overflow);
                merged.extend_from_slice(&pes.data);
                merged.freeze()
            }
            None => pes.data.clone(),
        };
        let len = data.len();

        let Some(mut offset) = (0..len.saturating_sub(1)).find(|&i| aac::is_header(&data, i))
        else {
            log::warn!("parsing error: {}", DemuxError::AdtsMissing);
            sink.report(ErrorEvent::parsing(DemuxError::AdtsMissing, true));
            return;
        };
        if offset > 0 {
            let error = DemuxError::AdtsMisaligned(offset);
            log::warn!("parsing error: {}", error);
            sink.report(ErrorEvent::parsing(error, false));
        }

        let samplerate = match track.samplerate {
            Some(samplerate) => samplerate,
            None => match aac::audio_config(&data, offset, audio_codec) {
                Ok(config) => {
                    log::debug!(
                        "parsed codec:{}, rate:{}, channels:{}",
                        config.codec,
                        config.samplerate,
                        config.channel_count
                    );
                    track.samplerate = Some(config.samplerate);
                    track.channel_count = Some(config.channel_count);
                    track.config = Some(config.config);
                    track.codec = Some(config.codec);
                    track.manifest_codec = config.manifest_codec;
                    config.samplerate
                }
                Err(error) => {
                    sink.report(ErrorEvent::parsing(error, true));
                    return;
                }
            },
        };
        let frame_duration = aac::frame_duration(samplerate);

        // without a PES timestamp, continue after the last frame
        let mut pts = match (pes.pts, self.last_pts) {
            (Some(pts), _) => pts,
            (None, Some(last_pts)) => last_pts + frame_duration.round() as i64,
            (None, None) => {
                log::warn!("AAC PES unknown PTS");
                return;
            }
        };
        // keep timestamps contiguous across a frame cut by the PES boundary
        if let (Some(_), Some(last_pts)) = (&overflow, self.last_pts) {
            let expected = last_pts + frame_duration.round() as i64;
            if (expected - pts).abs() > 1 {
                log::debug!(
                    "AAC: align PTS for overlapping frames by {}",
                    ((expected - pts) as f64 / 90.0).round()
                );
                pts = expected;
            }
        }

        let mut stamp = None;
        let mut frame_index = 0usize;
        while offset < len {
            if !aac::is_header(&data, offset) {
                offset += 1;
                continue;
            }
            let Some((header_length, payload_length)) = aac::parse_frame_header(&data, offset)
            else {
                if aac::can_get_frame_length(&data, offset)
                    && aac::full_frame_length(&data, offset) <= aac::header_length(&data, offset)
                {
                    let error = DemuxError::Parser(format!(
                        "invalid ADTS frame length {} at offset {}",
                        aac::full_frame_length(&data, offset),
                        offset
                    ));
                    log::warn!("parsing error: {}", error);
                    sink.report(ErrorEvent::parsing(error, false));
                    offset += 1;
                    continue;
                }
                // incomplete frame, completed by the next PES
                break;
            };
            let sample_pts = pts + (frame_index as f64 * frame_duration).round() as i64;
            let start = offset + header_length;
            track.samples.push(AudioSample {
                unit: data.slice(start..start + payload_length),
                pts: sample_pts,
                dts: sample_pts,
            });
            stamp = Some(sample_pts);
            frame_index += 1;
            offset = start + payload_length;
        }

        self.overflow = (offset < len).then(|| data.slice(offset..));
        self.last_pts = stamp;
    }
}

/// Extracts the MPEG-1/2 audio frames of a PES. Frames never span PES
/// packets, so nothing is carried over.
pub fn parse_mpeg_pes(pes: &PESPacket, track: &mut AudioTrack) {
    let Some(pts) = pes.pts else {
        log::warn!("MPEG PES unknown PTS");
        return;
    };
    let data = &pes.data;
    let mut offset = 0;
    let mut frame_index = 0u32;

    while offset < data.len() {
        if !mpeg_audio::is_header(data, offset) {
            offset += 1;
            continue;
        }
        let Some(header) = mpeg_audio::parse_frame(data, offset) else {
            break;
        };
        if track.samplerate.is_none() {
            track.samplerate = Some(header.sample_rate);
            track.channel_count = Some(header.channel_count);
        }
        let sample_pts = pts + (frame_index as f64 * header.frame_duration()).round() as i64;
        track.samples.push(AudioSample {
            unit: data.slice(offset..offset + header.frame_length),
            pts: sample_pts,
            dts: sample_pts,
        });
        frame_index += 1;
        offset += header.frame_length;
    }
}

/// Timed metadata: one sample per PES.
pub fn parse_id3_pes(pes: &PESPacket, track: &mut MetadataTrack) {
    let Some(pts) = pes.pts else {
        log::warn!("ID3 PES unknown PTS");
        return;
    };
    track.samples.push(MetadataSample {
        pts,
        dts: pes.dts.unwrap_or(pts),
        data: pes.data.clone(),
        len: pes.data.len(),
    });
}
