use bytes::{Bytes, BytesMut};

use super::audio::{parse_id3_pes, parse_mpeg_pes, AacState};
use super::parser::{parse_pat, parse_pmt, sync_offset};
use super::pes::{parse_pes, PESBuilder, PESPacket};
use super::sample_aes::{decrypt_tracks, SampleDecrypter};
use super::types::*;
use super::video::AvcParser;
use crate::av::{
    AudioTrack, CodecType, DemuxResult, MetadataTrack, UserDataTrack, VideoTrack,
};
use crate::config::{DemuxerConfig, InitSegment};
use crate::error::{DemuxError, ErrorEvent, ErrorSink, LogSink};

/// Elementary streams that are reassembled from PES packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Video,
    Audio,
    Id3,
}

/// MPEG Transport Stream demuxer.
///
/// Fed with arbitrary chunks of a transport stream, it extracts:
/// - H.264 access units with keyframe flags, SPS/PPS and dimensions
/// - ADTS/AAC or MPEG audio frames with per-frame timestamps
/// - timed metadata (ID3) PES payloads
/// - CEA-608 captions and SEI user data
///
/// Partial packets, PES packets and NAL units are carried over between
/// calls, so chunk boundaries may fall anywhere.
pub struct TSDemuxer {
    config: DemuxerConfig,
    sink: Box<dyn ErrorSink>,
    sample_aes: Option<Box<dyn SampleDecrypter>>,
    pmt_parsed: bool,
    pmt_pid: Option<u16>,
    audio_codec: Option<String>,
    video_codec: Option<String>,
    duration: f64,
    video: VideoTrack,
    audio: AudioTrack,
    id3: MetadataTrack,
    text: UserDataTrack,
    avc: AvcParser,
    aac: AacState,
    /// Trailing bytes too short to hold a whole packet.
    remainder: Option<BytesMut>,
}

impl std::fmt::Debug for TSDemuxer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TSDemuxer")
            .field("pmt_parsed", &self.pmt_parsed)
            .field("pmt_pid", &self.pmt_pid)
            .field("sample_aes", &self.sample_aes.is_some())
            .field("remainder", &self.remainder.as_ref().map(BytesMut::len))
            .finish_non_exhaustive()
    }
}

impl TSDemuxer {
    /// Creates a demuxer reporting parse errors through [`LogSink`].
    pub fn new(config: DemuxerConfig) -> Self {
        let mut demuxer = Self {
            config,
            sink: Box::new(LogSink),
            sample_aes: None,
            pmt_parsed: false,
            pmt_pid: None,
            audio_codec: None,
            video_codec: None,
            duration: 0.0,
            video: VideoTrack::new(0.0),
            audio: AudioTrack::new(0.0),
            id3: MetadataTrack::new(),
            text: UserDataTrack::new(),
            avc: AvcParser::new(),
            aac: AacState::new(),
            remainder: None,
        };
        demuxer.reset_init_segment(InitSegment::default());
        demuxer
    }

    pub fn with_error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Whether `data` looks like a transport stream.
    pub fn probe(data: &[u8]) -> bool {
        match sync_offset(data) {
            Some(0) => true,
            Some(offset) => {
                log::warn!(
                    "MPEG2-TS detected but first sync word found @ offset {}, junk ahead ?",
                    offset
                );
                true
            }
            None => false,
        }
    }

    /// Offset of the first of three sync bytes one packet apart.
    pub fn sync_offset(data: &[u8]) -> Option<usize> {
        sync_offset(data)
    }

    /// Starts a new init context: fresh tracks, PMT to be found again, and
    /// no partial NAL unit, access unit or ADTS frame.
    pub fn reset_init_segment(&mut self, init: InitSegment) {
        self.pmt_parsed = false;
        self.pmt_pid = None;

        self.video = VideoTrack::new(init.duration);
        self.audio = AudioTrack::new(init.duration);
        self.id3 = MetadataTrack::new();
        self.text = UserDataTrack::new();

        self.aac.reset();
        self.avc.reset();
        self.audio_codec = init.audio_codec;
        self.video_codec = init.video_codec;
        self.duration = init.duration;
    }

    /// Drops every partially received PES, NAL unit and ADTS frame, keeping
    /// the samples already extracted.
    pub fn reset_contiguity(&mut self) {
        self.video.pes_data = None;
        self.audio.pes_data = None;
        self.id3.pes_data = None;
        self.avc.reset();
        self.aac.reset();
    }

    pub fn reset_timestamp(&mut self) {}

    pub fn destroy(&mut self) {
        self.sample_aes = None;
        self.duration = 0.0;
    }

    pub fn video_track(&self) -> &VideoTrack {
        &self.video
    }

    pub fn audio_track(&self) -> &AudioTrack {
        &self.audio
    }

    pub fn id3_track(&self) -> &MetadataTrack {
        &self.id3
    }

    pub fn text_track(&self) -> &UserDataTrack {
        &self.text
    }

    /// Video codec hint of the current init segment.
    pub fn video_codec(&self) -> Option<&str> {
        self.video_codec.as_deref()
    }

    /// Demuxes one chunk. With `flush` set, trailing bytes are consumed
    /// instead of being kept for the next call.
    pub fn demux(&mut self, data: &[u8], is_sample_aes: bool, flush: bool) -> DemuxResult<'_> {
        if !is_sample_aes {
            self.sample_aes = None;
        }
        self.demux_packets(data, is_sample_aes, flush);
        self.result()
    }

    /// Demuxes one sample-AES encrypted chunk and decrypts the extracted
    /// samples, audio first.
    pub async fn demux_sample_aes(
        &mut self,
        data: &[u8],
        decrypter: Box<dyn SampleDecrypter>,
    ) -> DemuxResult<'_> {
        self.demux_packets(data, true, false);
        let decrypter = self.sample_aes.insert(decrypter);
        decrypt_tracks(
            decrypter.as_mut(),
            &mut self.audio,
            &mut self.video,
            self.sink.as_mut(),
        )
        .await;
        self.result()
    }

    /// Consumes the stored remainder and every pending PES, then decrypts if
    /// the session is encrypted.
    pub async fn flush(&mut self) -> DemuxResult<'_> {
        if let Some(remainder) = self.remainder.take() {
            let is_sample_aes = self.sample_aes.is_some();
            self.demux_packets(&remainder, is_sample_aes, true);
        }
        self.extract_remaining_samples();
        if let Some(decrypter) = self.sample_aes.as_mut() {
            decrypt_tracks(
                decrypter.as_mut(),
                &mut self.audio,
                &mut self.video,
                self.sink.as_mut(),
            )
            .await;
        }
        self.result()
    }

    #[cfg(test)]
    pub(crate) fn remainder(&self) -> Option<&[u8]> {
        self.remainder.as_deref()
    }

    fn result(&mut self) -> DemuxResult<'_> {
        DemuxResult {
            video: &mut self.video,
            audio: &mut self.audio,
            id3: &mut self.id3,
            text: &mut self.text,
        }
    }

    fn demux_packets(&mut self, data: &[u8], is_sample_aes: bool, flush: bool) {
        let data: Bytes = match self.remainder.take() {
            Some(mut remainder) => {
                remainder.extend_from_slice(data);
                remainder.freeze()
            }
            None => Bytes::copy_from_slice(data),
        };

        if data.len() < TS_PACKET_SIZE && !flush {
            self.remainder = Some(BytesMut::from(&data[..]));
            return;
        }

        let sync = sync_offset(&data).unwrap_or(0);
        let len = data.len() - (data.len() - sync) % TS_PACKET_SIZE;
        if len < data.len() && !flush {
            self.remainder = Some(BytesMut::from(&data[len..]));
        }

        let mpeg_supported = self.config.type_supported.mpeg_audio();
        let mut unknown_pids = false;
        let mut start = sync;

        while start + TS_PACKET_SIZE <= len {
            let end = start + TS_PACKET_SIZE;
            let packet = &data[start..end];

            let Some(header) = TSHeader::parse(packet) else {
                self.sink
                    .report(ErrorEvent::parsing(DemuxError::SyncByte, false));
                start = end;
                continue;
            };
            let stt = header.payload_unit_start;
            let pid = header.pid;
            let mut offset = header.payload_offset(packet);
            // adaptation field only
            if offset >= TS_PACKET_SIZE {
                start = end;
                continue;
            }

            match pid {
                _ if Some(pid) == self.video.pid => {
                    self.accumulate(Stream::Video, stt, data.slice(start + offset..end));
                }
                _ if Some(pid) == self.audio.pid => {
                    self.accumulate(Stream::Audio, stt, data.slice(start + offset..end));
                }
                _ if Some(pid) == self.id3.pid => {
                    self.accumulate(Stream::Id3, stt, data.slice(start + offset..end));
                }
                PID_PAT => {
                    if stt {
                        // pointer_field
                        offset += packet[offset] as usize + 1;
                    }
                    if let Some(pmt_pid) = parse_pat(packet, offset) {
                        self.pmt_pid = Some(pmt_pid);
                    }
                }
                _ if Some(pid) == self.pmt_pid => {
                    if stt {
                        offset += packet[offset] as usize + 1;
                    }
                    let pmt = parse_pmt(packet, offset, mpeg_supported, is_sample_aes);

                    // a PID missing from this PMT keeps its previous value
                    if let Some(pid) = pmt.video {
                        self.video.pid = Some(pid);
                    }
                    if let Some(pid) = pmt.audio {
                        self.audio.pid = Some(pid);
                        self.audio.codec_type = if pmt.is_aac {
                            CodecType::AAC
                        } else {
                            CodecType::MPEG
                        };
                    }
                    if let Some(pid) = pmt.id3 {
                        self.id3.pid = Some(pid);
                    }

                    if unknown_pids && !self.pmt_parsed {
                        log::debug!("reparse from beginning");
                        unknown_pids = false;
                        self.pmt_parsed = true;
                        start = sync;
                        continue;
                    }
                    self.pmt_parsed = true;
                }
                PID_SDT | PID_NULL => {}
                _ => unknown_pids = true,
            }

            start = end;
        }
    }

    fn pes_data(&mut self, stream: Stream) -> &mut Option<PESBuilder> {
        match stream {
            Stream::Video => &mut self.video.pes_data,
            Stream::Audio => &mut self.audio.pes_data,
            Stream::Id3 => &mut self.id3.pes_data,
        }
    }

    /// Appends a TS payload to the stream's PES. A payload unit start first
    /// completes the PES gathered so far.
    fn accumulate(&mut self, stream: Stream, stt: bool, payload: Bytes) {
        if stt {
            let previous = self.pes_data(stream).replace(PESBuilder::new());
            if let Some(pes) = previous.as_ref().and_then(parse_pes) {
                self.handle_pes(stream, &pes, false);
            }
        }
        if let Some(builder) = self.pes_data(stream) {
            builder.push_data(payload);
        }
    }

    fn handle_pes(&mut self, stream: Stream, pes: &PESPacket, last: bool) {
        match stream {
            Stream::Video => {
                self.avc
                    .parse_pes(pes, last, &mut self.video, &mut self.text, self.duration);
            }
            Stream::Audio if self.audio.is_aac() => {
                self.aac.parse_pes(
                    pes,
                    &mut self.audio,
                    self.audio_codec.as_deref(),
                    self.sink.as_mut(),
                );
            }
            Stream::Audio => parse_mpeg_pes(pes, &mut self.audio),
            Stream::Id3 => parse_id3_pes(pes, &mut self.id3),
        }
    }

    fn extract_remaining_samples(&mut self) {
        for stream in [Stream::Video, Stream::Audio, Stream::Id3] {
            let Some(builder) = self.pes_data(stream).take() else {
                continue;
            };
            match parse_pes(&builder) {
                Some(pes) => self.handle_pes(stream, &pes, true),
                None if !builder.is_empty() => {
                    let pid = match stream {
                        Stream::Video => self.video.pid,
                        Stream::Audio => self.audio.pid,
                        Stream::Id3 => self.id3.pid,
                    };
                    let error = DemuxError::TruncatedPes {
                        pid: pid.unwrap_or(PID_NULL),
                        received: builder.size(),
                    };
                    log::debug!("{}", error);
                    self.sink.report(ErrorEvent::parsing(error, false));
                }
                None => {}
            }
        }
        self.avc.finish(&mut self.video);
    }
}
