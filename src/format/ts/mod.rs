//! # MPEG Transport Stream demuxing
//!
//! The engine walks 188-byte packets, follows PAT and PMT to find one video,
//! one audio and one timed-metadata PID, reassembles PES packets and hands
//! them to the codec extractors:
//!
//! - **H.264**: NAL units grouped into access units, captions from SEI
//! - **AAC**: ADTS frames, with frames cut by a PES boundary carried over
//! - **MPEG audio**: MP2/MP3 frames
//! - **ID3**: one metadata sample per PES
//!
//! ## Example
//!
//! ```rust
//! use tsdemux::format::ts::{TSDemuxer, TS_PACKET_SIZE};
//! use tsdemux::DemuxerConfig;
//!
//! // three null packets
//! let mut data = Vec::new();
//! for _ in 0..3 {
//!     let mut packet = vec![0xFF; TS_PACKET_SIZE];
//!     packet[..4].copy_from_slice(&[0x47, 0x1F, 0xFF, 0x10]);
//!     data.extend(packet);
//! }
//! assert!(TSDemuxer::probe(&data));
//!
//! let mut demuxer = TSDemuxer::new(DemuxerConfig::default());
//! let result = demuxer.demux(&data[..100], false, false);
//! assert!(result.video.samples.is_empty());
//! ```

/// Audio and timed metadata extraction
pub mod audio;

/// TS demuxer engine
pub mod demuxer;

/// PAT/PMT parsing and packet synchronization
pub mod parser;

/// PES reassembly
pub mod pes;

/// Sample-AES decryption hook
pub mod sample_aes;

/// Core TS types and constants
pub mod types;

/// H.264 access unit assembly
pub mod video;


pub use audio::AacState;
pub use demuxer::TSDemuxer;
pub use parser::{parse_pat, parse_pmt, sync_offset, PMTInfo};
pub use pes::{parse_pes, PESBuilder, PESPacket};
pub use sample_aes::SampleDecrypter;
pub use types::{
    TSHeader, MIN_PROBE_BYTE_LENGTH, PID_PAT, STREAM_TYPE_AAC, STREAM_TYPE_H264,
    TS_PACKET_SIZE,
};
pub use video::{AccessUnit, AvcParser};
