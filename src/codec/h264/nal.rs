use bytes::{Bytes, BytesMut};

use super::types::NALUnit;

/// Zero bytes seen just before the current scan position.
///
/// `ThreeZeros` stands for three or more; `PendingType` means a start code
/// ended on the last byte of the previous buffer and the next byte is the
/// NAL header of a new unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroRun {
    #[default]
    NoZero,
    OneZero,
    TwoZeros,
    ThreeZeros,
    PendingType,
}

impl ZeroRun {
    pub fn zeros(self) -> usize {
        match self {
            ZeroRun::NoZero | ZeroRun::PendingType => 0,
            ZeroRun::OneZero => 1,
            ZeroRun::TwoZeros => 2,
            ZeroRun::ThreeZeros => 3,
        }
    }
}

/// Bytes of the current buffer that belong to the last NAL unit of the
/// previous buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Spill {
    /// Trailing zeros of the previous unit that turned out to open a start code.
    pub trim: usize,
    pub bytes: Bytes,
    /// New trailing state when the whole buffer was appended.
    pub trailing: Option<ZeroRun>,
}

impl Spill {
    pub fn apply(self, unit: &mut NALUnit) {
        let trim = self
            .trim
            .min(unit.trailing.zeros())
            .min(unit.data.len());
        if trim > 0 || !self.bytes.is_empty() {
            let keep = unit.data.len() - trim;
            let mut data = BytesMut::with_capacity(keep + self.bytes.len());
            data.extend_from_slice(&unit.data[..keep]);
            data.extend_from_slice(&self.bytes);
            unit.data = data.freeze();
        }
        if let Some(trailing) = self.trailing {
            unit.trailing = trailing;
        }
    }
}

#[derive(Debug, Default)]
pub struct NalScan {
    pub units: Vec<NALUnit>,
    /// To be applied to the last unit of the previous buffer before `units`
    /// are appended after it.
    pub spill: Option<Spill>,
}

/// Annex-B start code scanner keeping its zero-run state between buffers, so
/// units and start codes may straddle buffer boundaries.
#[derive(Debug, Default)]
pub struct NalScanner {
    state: ZeroRun,
}

impl NalScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ZeroRun {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = ZeroRun::NoZero;
    }

    pub fn scan(&mut self, data: &Bytes) -> NalScan {
        let len = data.len();
        let last_state = self.state;
        let mut state = self.state;
        let mut scan = NalScan::default();
        let mut unit_start: Option<(usize, u8)> = None;
        let mut found_start = false;
        let mut i = 0;

        if state == ZeroRun::PendingType {
            if len == 0 {
                return scan;
            }
            unit_start = Some((0, data[0] & 0x1f));
            found_start = true;
            state = ZeroRun::NoZero;
            i = 1;
        }

        while i < len {
            let value = data[i];
            i += 1;

            match state {
                ZeroRun::NoZero => {
                    state = if value == 0 { ZeroRun::OneZero } else { ZeroRun::NoZero };
                    continue;
                }
                ZeroRun::OneZero => {
                    state = if value == 0 { ZeroRun::TwoZeros } else { ZeroRun::NoZero };
                    continue;
                }
                _ => {}
            }

            if value == 0 {
                state = ZeroRun::ThreeZeros;
                continue;
            }
            if value != 1 {
                state = ZeroRun::NoZero;
                continue;
            }

            // start code: `zeros` zero bytes then the 0x01 at i - 1
            let zeros = state.zeros();
            match unit_start {
                Some((start, nal_type)) => {
                    let end = i - 1 - zeros;
                    scan.units.push(NALUnit::new(nal_type, data.slice(start..end)));
                }
                None => {
                    let (trim, end) = match (i - 1).checked_sub(zeros) {
                        Some(end) => (0, end),
                        None => ((zeros - (i - 1)).min(last_state.zeros()), 0),
                    };
                    scan.spill = Some(Spill {
                        trim,
                        bytes: data.slice(..end),
                        trailing: None,
                    });
                }
            }
            found_start = true;

            if i < len {
                unit_start = Some((i, data[i] & 0x1f));
                state = ZeroRun::NoZero;
            } else {
                state = ZeroRun::PendingType;
            }
        }

        if let Some((start, nal_type)) = unit_start {
            if state != ZeroRun::PendingType {
                let mut unit = NALUnit::new(nal_type, data.slice(start..));
                unit.trailing = state;
                scan.units.push(unit);
            }
        }

        if !found_start && len > 0 {
            scan.spill = Some(Spill {
                trim: 0,
                bytes: data.clone(),
                trailing: Some(state),
            });
        }

        self.state = state;
        scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    fn scan_chunks(chunks: &[&[u8]]) -> Vec<(u8, Vec<u8>)> {
        let mut scanner = NalScanner::new();
        let mut all: Vec<NALUnit> = Vec::new();
        for chunk in chunks {
            let scan = scanner.scan(&Bytes::copy_from_slice(chunk));
            if let (Some(spill), Some(last)) = (scan.spill, all.last_mut()) {
                spill.apply(last);
            }
            all.extend(scan.units);
        }
        all.into_iter()
            .map(|unit| (unit.nal_type, unit.data.to_vec()))
            .collect()
    }

    fn annexb(units: &[Vec<u8>], four_byte: bool) -> Vec<u8> {
        let mut out = Vec::new();
        for unit in units {
            if four_byte {
                out.push(0);
            }
            out.extend_from_slice(&[0, 0, 1]);
            out.extend_from_slice(unit);
        }
        out
    }

    fn sample_units() -> Vec<Vec<u8>> {
        vec![
            vec![0x09, 0xF0],
            vec![0x67, 0x42, 0xC0, 0x1E, 0xDA, 0x05, 0x07, 0xE4],
            vec![0x68, 0xCE, 0x38, 0x80],
            vec![0x65, 0x88, 0x84, 0x10, 0x33, 0xFF],
        ]
    }

    #[test]
    fn test_single_buffer() {
        let stream = annexb(&sample_units(), true);
        let units = scan_chunks(&[&stream]);
        let expected: Vec<(u8, Vec<u8>)> = sample_units()
            .into_iter()
            .map(|u| (u[0] & 0x1f, u))
            .collect();
        assert_eq!(units, expected);
    }

    #[test]
    fn test_three_byte_start_codes() {
        let stream = annexb(&sample_units(), false);
        let units = scan_chunks(&[&stream]);
        assert_eq!(units.len(), 4);
        assert_eq!(units[3].1, sample_units()[3]);
    }

    #[test]
    fn test_start_code_at_buffer_end() {
        let mut scanner = NalScanner::new();
        let scan = scanner.scan(&Bytes::from_static(&[0, 0, 0, 1, 0x09, 0xF0, 0, 0, 1]));
        assert_eq!(scan.units.len(), 1);
        assert_eq!(scanner.state(), ZeroRun::PendingType);

        let scan = scanner.scan(&Bytes::from_static(&[0x65, 0x88]));
        assert_eq!(scan.spill, None);
        assert_eq!(scan.units[0].nal_type, 5);
        assert_eq!(&scan.units[0].data[..], &[0x65, 0x88]);
    }

    #[test]
    fn test_buffer_without_start_code_appends() {
        let units = scan_chunks(&[&[0, 0, 1, 0x65, 0x88], &[0x84, 0x10], &[0x33]]);
        assert_eq!(units, vec![(5, vec![0x65, 0x88, 0x84, 0x10, 0x33])]);
    }

    #[test]
    fn test_straddling_start_code_is_trimmed() {
        let units = scan_chunks(&[&[0, 0, 1, 0x65, 0x88, 0, 0], &[0, 1, 0x41, 0x9A]]);
        assert_eq!(
            units,
            vec![(5, vec![0x65, 0x88]), (1, vec![0x41, 0x9A])]
        );
    }

    #[test]
    fn test_every_split_point() {
        let stream = annexb(&sample_units(), true);
        let whole = scan_chunks(&[&stream]);
        for split in 0..=stream.len() {
            let (a, b) = stream.split_at(split);
            assert_eq!(scan_chunks(&[a, b]), whole, "split at {}", split);
        }
    }

    #[derive(Debug, Clone)]
    struct Stream {
        units: Vec<Vec<u8>>,
        four_byte: bool,
        cuts: Vec<usize>,
    }

    impl Arbitrary for Stream {
        fn arbitrary(g: &mut Gen) -> Self {
            let count = usize::arbitrary(g) % 6 + 1;
            let units = (0..count)
                .map(|_| {
                    let len = usize::arbitrary(g) % 12 + 1;
                    (0..len).map(|_| u8::arbitrary(g).max(2)).collect()
                })
                .collect();
            Stream {
                units,
                four_byte: bool::arbitrary(g),
                cuts: Vec::arbitrary(g),
            }
        }
    }

    #[quickcheck]
    fn prop_split_invariance(stream: Stream) -> bool {
        let bytes = annexb(&stream.units, stream.four_byte);
        let mut cuts: Vec<usize> = stream.cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
        cuts.sort_unstable();
        let mut chunks: Vec<&[u8]> = Vec::new();
        let mut from = 0;
        for cut in cuts {
            chunks.push(&bytes[from..cut]);
            from = cut;
        }
        chunks.push(&bytes[from..]);
        scan_chunks(&chunks) == scan_chunks(&[&bytes])
    }
}
