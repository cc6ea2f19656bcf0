use std::env;

/// Playback capabilities of the environment consuming demuxed samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeSupported {
    /// MPEG-1/2 audio can be played in an `audio/mpeg` container.
    pub mpeg: bool,
    /// MP3 can be played inside an MP4 container.
    pub mp3: bool,
}

impl TypeSupported {
    /// Whether PMT entries of stream type 0x03/0x04 should be followed.
    pub fn mpeg_audio(&self) -> bool {
        self.mpeg || self.mp3
    }
}

#[derive(Debug, Clone, Default)]
pub struct DemuxerConfig {
    pub type_supported: TypeSupported,
}

impl DemuxerConfig {
    /// Builds a configuration from defaults, overridden by the
    /// `TSDEMUX_MPEG_SUPPORTED` and `TSDEMUX_MP3_SUPPORTED` environment
    /// variables when they are set.
    pub fn from_env() -> Self {
        let mut config = DemuxerConfig::default();

        if let Some(flag) = env_flag("TSDEMUX_MPEG_SUPPORTED") {
            config.type_supported.mpeg = flag;
        }
        if let Some(flag) = env_flag("TSDEMUX_MP3_SUPPORTED") {
            config.type_supported.mp3 = flag;
        }

        config
    }

    pub fn with_type_supported(mut self, type_supported: TypeSupported) -> Self {
        self.type_supported = type_supported;
        self
    }
}

/// Codec hints and container duration supplied whenever the init context
/// resets (stream start, discontinuity, codec switch).
#[derive(Debug, Clone, Default)]
pub struct InitSegment {
    pub audio_codec: Option<String>,
    pub video_codec: Option<String>,
    /// Declared duration in seconds.
    pub duration: f64,
}

impl InitSegment {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }

    pub fn with_audio_codec(mut self, codec: impl Into<String>) -> Self {
        self.audio_codec = Some(codec.into());
        self
    }

    pub fn with_video_codec(mut self, codec: impl Into<String>) -> Self {
        self.video_codec = Some(codec.into());
        self
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        other => {
            log::warn!("ignoring {}={:?}, expected a boolean", name, other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides() {
        env::set_var("TSDEMUX_MPEG_SUPPORTED", "yes");
        env::set_var("TSDEMUX_MP3_SUPPORTED", "maybe");
        let config = DemuxerConfig::from_env();
        assert!(config.type_supported.mpeg);
        assert!(!config.type_supported.mp3);
        assert!(config.type_supported.mpeg_audio());
        env::remove_var("TSDEMUX_MPEG_SUPPORTED");
        env::remove_var("TSDEMUX_MP3_SUPPORTED");
    }

    #[test]
    fn test_init_segment_builder() {
        let init = InitSegment::new(10.0).with_audio_codec("mp4a.40.5");
        assert_eq!(init.audio_codec.as_deref(), Some("mp4a.40.5"));
        assert!(init.video_codec.is_none());
    }
}
