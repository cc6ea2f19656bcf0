use crate::av::{UserDataSample, UserDataTrack, VideoSample, VideoTrack};
use crate::codec::h264::{
    codec_string, is_intra_slice, parse_sei, parse_sps, read_slice_type, NALUnit, NALUnitType,
    NalScanner, SeiMessage,
};

use super::pes::PESPacket;

/// Access unit being assembled from the NAL units of one or more PES.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessUnit {
    pub key: bool,
    /// Set once a slice was seen; units without one are never emitted.
    pub frame: bool,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    pub units: Vec<NALUnit>,
}

impl AccessUnit {
    fn new(key: bool, pes: &PESPacket) -> Self {
        Self {
            key,
            frame: false,
            pts: pes.pts,
            dts: pes.dts,
            units: Vec::new(),
        }
    }
}

/// Emits the access unit if it holds a frame. A unit without timestamps
/// reuses the previous sample's, or is dropped when there is none.
pub fn push_access_unit(au: AccessUnit, track: &mut VideoTrack) {
    if au.units.is_empty() || !au.frame {
        return;
    }
    let (pts, dts) = match au.pts {
        Some(pts) => (pts, au.dts.unwrap_or(pts)),
        None => match track.samples.last() {
            Some(last) => (last.pts, last.dts),
            None => {
                track.dropped += 1;
                return;
            }
        },
    };
    if log::log_enabled!(log::Level::Trace) {
        let composition: Vec<NALUnitType> = au.units.iter().map(NALUnit::unit_type).collect();
        log::trace!("{}/{}: {:?}", pts, dts, composition);
    }
    track.samples.push(VideoSample {
        key: au.key,
        pts,
        dts,
        units: au.units,
    });
}

/// H.264 elementary stream state: start code scanner and pending access unit.
#[derive(Debug, Default)]
pub struct AvcParser {
    scanner: NalScanner,
    pending: Option<AccessUnit>,
}

impl AvcParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&AccessUnit> {
        self.pending.as_ref()
    }

    /// Drops partial NAL and access unit state, e.g. after a discontinuity.
    pub fn reset(&mut self) {
        self.scanner.reset();
        self.pending = None;
    }

    /// Splits a PES payload into NAL units and groups them into access
    /// units. With `last` set the pending access unit is emitted as well.
    pub fn parse_pes(
        &mut self,
        pes: &PESPacket,
        last: bool,
        track: &mut VideoTrack,
        text: &mut UserDataTrack,
        duration: f64,
    ) {
        let scan = self.scanner.scan(&pes.data);

        if let Some(spill) = scan.spill {
            let last_unit = match self.pending.as_mut().filter(|au| !au.units.is_empty()) {
                Some(au) => au.units.last_mut(),
                None => track.samples.last_mut().and_then(|s| s.units.last_mut()),
            };
            if let Some(unit) = last_unit {
                spill.apply(unit);
            }
        }

        // streams without AUD: every PES starts a new access unit
        if !scan.units.is_empty() && !track.aud_found {
            if let Some(au) = self.pending.take() {
                push_access_unit(au, track);
                self.pending = Some(AccessUnit::new(false, pes));
            }
        }

        let mut sps_found = false;
        for unit in scan.units {
            let push = match unit.unit_type() {
                NALUnitType::CodedSliceNonIDR => {
                    let au = self.pending.get_or_insert_with(|| AccessUnit::new(false, pes));
                    au.frame = true;
                    // keyframes are preceded by an SPS
                    if sps_found && unit.data.len() > 4 {
                        match read_slice_type(&unit.data) {
                            Ok(slice_type) if is_intra_slice(slice_type) => au.key = true,
                            Ok(_) => {}
                            Err(e) => log::debug!("unreadable slice header: {}", e),
                        }
                    }
                    true
                }
                NALUnitType::CodedSliceIDR => {
                    let au = self.pending.get_or_insert_with(|| AccessUnit::new(true, pes));
                    au.key = true;
                    au.frame = true;
                    true
                }
                NALUnitType::SEI => {
                    self.handle_sei(&unit, pes, text);
                    true
                }
                NALUnitType::SPS => {
                    sps_found = true;
                    if track.sps.is_none() {
                        match parse_sps(&unit.data) {
                            Ok(info) => {
                                track.width = Some(info.width);
                                track.height = Some(info.height);
                                track.pixel_ratio = Some(info.pixel_ratio);
                                track.codec = codec_string(&unit.data);
                                track.sps = Some(unit.data.clone());
                                track.duration = duration;
                            }
                            Err(e) => log::warn!("failed to parse SPS: {}", e),
                        }
                    }
                    true
                }
                NALUnitType::PPS => {
                    if track.pps.is_none() {
                        track.pps = Some(unit.data.clone());
                    }
                    true
                }
                NALUnitType::AccessUnitDelimiter => {
                    track.aud_found = true;
                    if let Some(au) = self.pending.take() {
                        push_access_unit(au, track);
                    }
                    self.pending = Some(AccessUnit::new(false, pes));
                    false
                }
                NALUnitType::FillerData => false,
                other => {
                    log::trace!("ignoring NAL unit {:?}", other);
                    false
                }
            };

            if push {
                if let Some(au) = self.pending.as_mut() {
                    au.units.push(unit);
                }
            }
        }

        if last {
            self.finish(track);
        }
    }

    /// Emits the pending access unit, if any.
    pub fn finish(&mut self, track: &mut VideoTrack) {
        if let Some(au) = self.pending.take() {
            push_access_unit(au, track);
        }
    }

    fn handle_sei(&self, unit: &NALUnit, pes: &PESPacket, text: &mut UserDataTrack) {
        let message = match parse_sei(&unit.data) {
            Ok(Some(message)) => message,
            Ok(None) => return,
            Err(e) => {
                log::debug!("truncated SEI payload: {}", e);
                return;
            }
        };
        let Some(pts) = pes.pts else {
            log::debug!("SEI user data without PTS, skipping");
            return;
        };
        let sample = match message {
            SeiMessage::Cea608(bytes) => UserDataSample::Cea608 { pts, bytes },
            SeiMessage::UserData {
                payload_type,
                uuid,
                user_data,
                user_data_bytes,
            } => UserDataSample::Registered {
                pts,
                payload_type,
                uuid,
                user_data,
                user_data_bytes,
            },
        };
        text.insert_in_order(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::h264::sei::test_utils::cea608_sei;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    const AUD: &[u8] = &[0x09, 0xF0];
    const SPS: &[u8] = &[0x67, 0x42, 0xC0, 0x1E, 0xDA, 0x05, 0x07, 0xE4];
    const PPS: &[u8] = &[0x68, 0xCE, 0x3C, 0x80];
    const IDR: &[u8] = &[0x65, 0x88, 0x84, 0x21, 0xA0];
    // first_mb 0, slice_type 7 (I)
    const I_SLICE: &[u8] = &[0x41, 0x88, 0x84, 0x21, 0xA0];
    // first_mb 0, slice_type 5 (P)
    const P_SLICE: &[u8] = &[0x41, 0x9A, 0x84, 0x21, 0xA0];

    fn annex_b(units: &[&[u8]]) -> Bytes {
        let mut out = Vec::new();
        for unit in units {
            out.extend_from_slice(&[0, 0, 0, 1]);
            out.extend_from_slice(unit);
        }
        Bytes::from(out)
    }

    fn pes(pts: Option<i64>, units: &[&[u8]]) -> PESPacket {
        PESPacket {
            data: annex_b(units),
            pts,
            dts: pts,
            len: None,
        }
    }

    struct Harness {
        parser: AvcParser,
        track: VideoTrack,
        text: UserDataTrack,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                parser: AvcParser::new(),
                track: VideoTrack::new(0.0),
                text: UserDataTrack::new(),
            }
        }

        fn feed(&mut self, pes: PESPacket, last: bool) {
            self.parser
                .parse_pes(&pes, last, &mut self.track, &mut self.text, 10.0);
        }
    }

    #[test]
    fn test_aud_delimited_access_unit() {
        let mut h = Harness::new();
        h.feed(pes(Some(9000), &[AUD, SPS, PPS, IDR, AUD]), false);

        assert_eq!(h.track.samples.len(), 1);
        let sample = &h.track.samples[0];
        assert!(sample.key);
        assert_eq!(sample.pts, 9000);
        let types: Vec<u8> = sample.units.iter().map(|u| u.nal_type).collect();
        assert_eq!(types, vec![7, 8, 5]);

        assert!(h.track.aud_found);
        assert_eq!(h.track.width, Some(320));
        assert_eq!(h.track.height, Some(240));
        assert_eq!(h.track.codec.as_deref(), Some("avc1.42c01e"));
        assert_eq!(h.track.duration, 10.0);
        assert_eq!(h.track.pps.as_deref(), Some(PPS));
    }

    #[test]
    fn test_lone_aud_emits_nothing() {
        let mut h = Harness::new();
        h.feed(pes(Some(0), &[AUD]), true);
        assert!(h.track.samples.is_empty());
        assert_eq!(h.track.dropped, 0);
    }

    #[test]
    fn test_slice_type_keyframe_after_sps() {
        let mut h = Harness::new();
        h.feed(pes(Some(0), &[AUD, SPS, PPS, I_SLICE]), false);
        h.feed(pes(Some(3000), &[AUD, P_SLICE]), false);
        h.feed(pes(Some(6000), &[AUD, I_SLICE]), true);

        let keys: Vec<bool> = h.track.samples.iter().map(|s| s.key).collect();
        // an I slice without SPS in the same PES is not inspected
        assert_eq!(keys, vec![true, false, false]);
    }

    #[test]
    fn test_streams_without_aud_split_on_pes() {
        let mut h = Harness::new();
        h.feed(pes(Some(0), &[SPS, PPS, IDR]), false);
        h.feed(pes(Some(3000), &[P_SLICE]), false);
        assert_eq!(h.track.samples.len(), 1);

        h.parser.finish(&mut h.track);
        let pts: Vec<i64> = h.track.samples.iter().map(|s| s.pts).collect();
        assert_eq!(pts, vec![0, 3000]);
    }

    #[test]
    fn test_missing_timestamp_inherits_or_drops() {
        let mut h = Harness::new();
        h.feed(pes(None, &[AUD, IDR]), true);
        assert!(h.track.samples.is_empty());
        assert_eq!(h.track.dropped, 1);

        h.feed(pes(Some(1000), &[AUD, IDR]), true);
        h.feed(pes(None, &[AUD, P_SLICE]), true);
        assert_eq!(h.track.samples.len(), 2);
        assert_eq!(h.track.samples[1].pts, 1000);
        assert_eq!(h.track.samples[1].dts, 1000);
    }

    #[test]
    fn test_unit_split_across_pes() {
        let mut h = Harness::new();
        let whole = annex_b(&[AUD, SPS, PPS, IDR, AUD]);
        let (a, b) = (whole.slice(..20), whole.slice(20..));
        h.feed(PESPacket { data: a, pts: Some(0), dts: Some(0), len: None }, false);
        h.feed(PESPacket { data: b, pts: None, dts: None, len: None }, false);

        assert_eq!(h.track.samples.len(), 1);
        let data: Vec<&[u8]> = h.track.samples[0].units.iter().map(|u| &u.data[..]).collect();
        assert_eq!(data, vec![SPS, PPS, IDR]);
    }

    #[test]
    fn test_captions_ordered_by_pts() {
        let mut h = Harness::new();
        let sei = cea608_sei(&[[0xFC, 0x94, 0x20]]);
        for pts in [300, 100, 200] {
            h.feed(pes(Some(pts), &[AUD, &sei, IDR]), false);
        }
        let order: Vec<i64> = h.text.samples.iter().map(|s| s.pts()).collect();
        assert_eq!(order, vec![100, 200, 300]);

        h.feed(pes(None, &[AUD, &sei, IDR]), false);
        assert_eq!(h.text.samples.len(), 3);
    }

    #[test]
    fn test_reset_drops_pending() {
        let mut h = Harness::new();
        h.feed(pes(Some(0), &[AUD, IDR]), false);
        assert!(h.parser.pending().is_some());
        h.parser.reset();
        h.parser.finish(&mut h.track);
        assert!(h.track.samples.is_empty());
    }
}
