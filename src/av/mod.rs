//! Output model of the demuxer: one track per elementary stream kind, each an
//! ordered buffer of samples plus the codec parameters discovered so far.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecType {
    H264,
    AAC,
    /// MPEG-1/2 audio (MP2/MP3)
    MPEG,
}

/// Kind of output track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
    Id3,
    Text,
}

impl TrackKind {
    /// Fixed track identifier handed to the remuxer.
    pub const fn id(self) -> u32 {
        match self {
            TrackKind::Video => 1,
            TrackKind::Audio => 2,
            TrackKind::Id3 => 3,
            TrackKind::Text => 4,
        }
    }
}

/// Timescale of every PTS/DTS value produced by the demuxer.
pub const INPUT_TIME_SCALE: u32 = 90_000;

mod sample;
mod track;

pub use sample::*;
pub use track::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_ids() {
        assert_eq!(TrackKind::Video.id(), 1);
        assert_eq!(TrackKind::Audio.id(), 2);
        assert_eq!(TrackKind::Id3.id(), 3);
        assert_eq!(TrackKind::Text.id(), 4);
    }
}
