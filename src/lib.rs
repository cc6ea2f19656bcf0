#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::missing_crate_level_docs)]

//! # tsdemux - streaming MPEG-2 Transport Stream demuxer
//!
//! `tsdemux` turns arbitrary chunks of an MPEG-2 Transport Stream into ordered,
//! timestamped codec samples, ready to be handed to a remuxer.
//!
//! ## Features
//!
//! - 188-byte packet re-synchronization and carry-over of partial packets
//! - PAT/PMT discovery of one video, one audio and one timed-metadata stream
//! - PES reassembly with 33-bit PTS/DTS
//! - H.264 NAL unit extraction across chunk boundaries, access units and
//!   keyframe detection, SPS dimensions and codec strings
//! - CEA-608 captions and user-data-registered SEI payloads
//! - ADTS/AAC and MPEG-1/2 audio frames with timestamp extrapolation
//! - Optional sample-AES decryption through an external [`SampleDecrypter`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tsdemux::{DemuxerConfig, InitSegment, TSDemuxer};
//!
//! # async fn run(chunks: Vec<Vec<u8>>) {
//! let mut demuxer = TSDemuxer::new(DemuxerConfig::from_env());
//! demuxer.reset_init_segment(InitSegment::new(10.0));
//!
//! for chunk in &chunks {
//!     let result = demuxer.demux(chunk, false, false);
//!     let frames = std::mem::take(&mut result.video.samples);
//!     println!("{} video samples", frames.len());
//! }
//!
//! let result = demuxer.flush().await;
//! println!("{} trailing audio frames", result.audio.samples.len());
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - `av`: track and sample model shared by all extractors
//! - `codec`: H.264, AAC (ADTS) and MPEG audio bitstream parsing
//! - `format`: the transport stream engine
//! - `error`: error types, parse-error events and sinks
//! - `config`: capability flags and per-segment init information
//! - `utils`: bit reader for Exp-Golomb coded fields

/// Track and sample model
pub mod av;

/// Codec-level bitstream parsers
pub mod codec;

/// Configuration types
pub mod config;

/// Error types and parse-error reporting
pub mod error;

/// Container formats
pub mod format;

/// Common utilities
pub mod utils;

pub use av::{
    AudioSample, AudioTrack, DemuxResult, MetadataSample, MetadataTrack, TrackKind,
    UserDataSample, UserDataTrack, VideoSample, VideoTrack,
};
pub use config::{DemuxerConfig, InitSegment, TypeSupported};
pub use error::{DemuxError, ErrorEvent, ErrorKind, ErrorSink, LogSink, Result};
pub use format::ts::{SampleDecrypter, TSDemuxer};
