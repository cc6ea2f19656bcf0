//! ADTS framing for AAC elementary streams.

/// ADTS header parsing and AudioSpecificConfig derivation
pub mod parser;
/// AAC types and tables
pub mod types;

pub use parser::{
    audio_config, can_get_frame_length, frame_duration, full_frame_length, header_length, is_header, parse_adts_header,
    parse_frame_header,
};
pub use types::{AACConfig, ADTSHeader, ProfileType, ADTS_SAMPLING_RATES};
