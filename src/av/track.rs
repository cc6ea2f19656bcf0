use bytes::Bytes;

use super::{
    AudioSample, CodecType, MetadataSample, TrackKind, UserDataSample, VideoSample,
    INPUT_TIME_SCALE,
};
use crate::format::ts::pes::PESBuilder;

#[derive(Debug)]
pub struct VideoTrack {
    pub id: u32,
    /// PID carrying the stream, `None` until a PMT assigns one.
    pub pid: Option<u16>,
    pub input_time_scale: u32,
    pub sequence_number: u32,
    pub samples: Vec<VideoSample>,
    /// Access units discarded because no timestamp could be assigned.
    pub dropped: usize,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub pixel_ratio: Option<(u32, u32)>,
    /// `avc1.PPCCLL`
    pub codec: Option<String>,
    /// Raw SPS/PPS units, recorded on first occurrence.
    pub sps: Option<Bytes>,
    pub pps: Option<Bytes>,
    pub duration: f64,
    /// Whether access unit delimiters were ever seen on this track.
    pub aud_found: bool,
    pub(crate) pes_data: Option<PESBuilder>,
}

impl VideoTrack {
    pub fn new(duration: f64) -> Self {
        Self {
            id: TrackKind::Video.id(),
            pid: None,
            input_time_scale: INPUT_TIME_SCALE,
            sequence_number: 0,
            samples: Vec::new(),
            dropped: 0,
            width: None,
            height: None,
            pixel_ratio: None,
            codec: None,
            sps: None,
            pps: None,
            duration,
            aud_found: false,
            pes_data: None,
        }
    }
}

#[derive(Debug)]
pub struct AudioTrack {
    pub id: u32,
    pub pid: Option<u16>,
    pub input_time_scale: u32,
    pub sequence_number: u32,
    pub samples: Vec<AudioSample>,
    pub dropped: usize,
    /// Either [`CodecType::AAC`] or [`CodecType::MPEG`], as announced by the PMT.
    pub codec_type: CodecType,
    pub samplerate: Option<u32>,
    pub channel_count: Option<u8>,
    /// AudioSpecificConfig for AAC streams.
    pub config: Option<Vec<u8>>,
    /// `mp4a.40.<object type>`
    pub codec: Option<String>,
    /// Codec hint supplied with the init segment.
    pub manifest_codec: Option<String>,
    pub duration: f64,
    pub(crate) pes_data: Option<PESBuilder>,
}

impl AudioTrack {
    pub fn new(duration: f64) -> Self {
        Self {
            id: TrackKind::Audio.id(),
            pid: None,
            input_time_scale: INPUT_TIME_SCALE,
            sequence_number: 0,
            samples: Vec::new(),
            dropped: 0,
            codec_type: CodecType::AAC,
            samplerate: None,
            channel_count: None,
            config: None,
            codec: None,
            manifest_codec: None,
            duration,
            pes_data: None,
        }
    }

    pub fn is_aac(&self) -> bool {
        self.codec_type == CodecType::AAC
    }
}

#[derive(Debug)]
pub struct MetadataTrack {
    pub id: u32,
    pub pid: Option<u16>,
    pub input_time_scale: u32,
    pub sequence_number: u32,
    pub samples: Vec<MetadataSample>,
    pub dropped: usize,
    pub(crate) pes_data: Option<PESBuilder>,
}

impl MetadataTrack {
    pub fn new() -> Self {
        Self {
            id: TrackKind::Id3.id(),
            pid: None,
            input_time_scale: INPUT_TIME_SCALE,
            sequence_number: 0,
            samples: Vec::new(),
            dropped: 0,
            pes_data: None,
        }
    }
}

impl Default for MetadataTrack {
    fn default() -> Self {
        Self::new()
    }
}

/// Captions and SEI user data, kept in ascending PTS order.
#[derive(Debug)]
pub struct UserDataTrack {
    pub id: u32,
    pub input_time_scale: u32,
    pub sequence_number: u32,
    pub samples: Vec<UserDataSample>,
    pub dropped: usize,
}

impl UserDataTrack {
    pub fn new() -> Self {
        Self {
            id: TrackKind::Text.id(),
            input_time_scale: INPUT_TIME_SCALE,
            sequence_number: 0,
            samples: Vec::new(),
            dropped: 0,
        }
    }

    /// Inserts after every sample with a PTS lower than or equal to the new one.
    pub fn insert_in_order(&mut self, sample: UserDataSample) {
        let pts = sample.pts();
        let pos = self.samples.partition_point(|s| s.pts() <= pts);
        self.samples.insert(pos, sample);
    }
}

impl Default for UserDataTrack {
    fn default() -> Self {
        Self::new()
    }
}

/// The four tracks after a demux call.
///
/// Samples accumulate across calls until the consumer drains them, e.g. with
/// `std::mem::take(&mut result.video.samples)`.
#[derive(Debug)]
pub struct DemuxResult<'a> {
    pub video: &'a mut VideoTrack,
    pub audio: &'a mut AudioTrack,
    pub id3: &'a mut MetadataTrack,
    pub text: &'a mut UserDataTrack,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn caption(pts: i64) -> UserDataSample {
        UserDataSample::Cea608 {
            pts,
            bytes: vec![0xC1, 0xFF],
        }
    }

    #[test]
    fn test_captions_inserted_in_pts_order() {
        let mut track = UserDataTrack::new();
        for pts in [300, 100, 200] {
            track.insert_in_order(caption(pts));
        }
        let order: Vec<i64> = track.samples.iter().map(|s| s.pts()).collect();
        assert_eq!(order, vec![100, 200, 300]);
    }

    #[test]
    fn test_equal_pts_keeps_arrival_order() {
        let mut track = UserDataTrack::new();
        track.insert_in_order(caption(100));
        track.insert_in_order(UserDataSample::Cea608 {
            pts: 100,
            bytes: vec![0x01],
        });
        track.insert_in_order(caption(50));
        assert_eq!(track.samples[0].pts(), 50);
        assert_eq!(track.samples[2], UserDataSample::Cea608 { pts: 100, bytes: vec![0x01] });
    }

    #[test]
    fn test_new_tracks() {
        let video = VideoTrack::new(12.5);
        assert_eq!(video.id, 1);
        assert_eq!(video.pid, None);
        assert_eq!(video.input_time_scale, 90_000);
        assert_eq!(video.duration, 12.5);

        let audio = AudioTrack::new(12.5);
        assert!(audio.is_aac());
        assert_eq!(audio.id, 2);
    }
}
