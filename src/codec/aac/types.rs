pub const ADTS_SAMPLING_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// Samples per AAC frame.
pub const AAC_FRAME_SAMPLES: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileType {
    Main = 0,
    LC = 1,
    SSR = 2,
    LTP = 3,
}

impl From<u8> for ProfileType {
    fn from(value: u8) -> Self {
        match value & 0x03 {
            0 => ProfileType::Main,
            1 => ProfileType::LC,
            2 => ProfileType::SSR,
            _ => ProfileType::LTP,
        }
    }
}

impl ProfileType {
    /// MPEG-4 audio object type signalled by this ADTS profile.
    pub fn object_type(self) -> u8 {
        self as u8 + 1
    }
}

/// Track-level audio configuration derived from the first ADTS header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AACConfig {
    /// AudioSpecificConfig: 2 bytes, or 4 with an SBR extension.
    pub config: Vec<u8>,
    pub samplerate: u32,
    pub channel_count: u8,
    /// `mp4a.40.<object type>`
    pub codec: String,
    pub manifest_codec: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ADTSHeader {
    pub sync_word: u32,            // 12 bits
    pub id: u8,                    // 1 bit, 0=MPEG-4, 1=MPEG-2
    pub layer: u8,                 // 2 bits
    pub protection_absent: bool,   // 1 bit
    pub profile: ProfileType,      // 2 bits
    pub sample_rate_index: u8,     // 4 bits
    pub channel_configuration: u8, // 3 bits
    pub frame_length: u16,         // 13 bits, header included
    pub number_of_raw_blocks: u8,  // 2 bits
}

impl ADTSHeader {
    pub fn sync_word_valid(&self) -> bool {
        self.sync_word == 0xFFF
    }

    pub fn header_length(&self) -> usize {
        if self.protection_absent {
            7
        } else {
            9
        }
    }

    pub fn sample_rate(&self) -> Option<u32> {
        ADTS_SAMPLING_RATES
            .get(self.sample_rate_index as usize)
            .copied()
    }
}
