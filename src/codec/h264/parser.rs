use std::borrow::Cow;

use super::types::SPSInfo;
use crate::utils::BitReader;
use crate::Result;

const HIGH_PROFILES: [u8; 10] = [100, 110, 122, 244, 44, 83, 86, 118, 128, 138];

/// Removes emulation prevention bytes (the `0x03` in `00 00 03`).
///
/// Strip positions are collected first and the output is allocated once; when
/// there is nothing to strip the input is borrowed as is.
pub fn discard_epb(data: &[u8]) -> Cow<'_, [u8]> {
    let mut positions = Vec::new();
    let mut i = 0;
    while i + 2 < data.len() {
        if data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x03 {
            positions.push(i + 2);
            i += 2;
        } else {
            i += 1;
        }
    }

    if positions.is_empty() {
        return Cow::Borrowed(data);
    }

    let mut out = Vec::with_capacity(data.len() - positions.len());
    let mut from = 0;
    for pos in positions {
        out.extend_from_slice(&data[from..pos]);
        from = pos + 1;
    }
    out.extend_from_slice(&data[from..]);
    Cow::Owned(out)
}

/// Parses an SPS NAL unit (header byte included) for the fields a remuxer
/// needs: profile, level, cropped dimensions and sample aspect ratio.
pub fn parse_sps(nal: &[u8]) -> Result<SPSInfo> {
    let rbsp = discard_epb(nal);
    let mut reader = BitReader::new(&rbsp);

    reader.skip_bits(8)?; // NAL header
    let profile_idc = reader.read_u8()?;
    reader.skip_bits(5)?; // constraint_set0..4_flag
    reader.skip_bits(3)?; // reserved_zero_3bits
    let level_idc = reader.read_u8()?;
    reader.skip_golomb()?; // seq_parameter_set_id

    if HIGH_PROFILES.contains(&profile_idc) {
        let chroma_format_idc = reader.read_golomb()?;
        if chroma_format_idc == 3 {
            reader.skip_bits(1)?; // separate_colour_plane_flag
        }
        reader.skip_golomb()?; // bit_depth_luma_minus8
        reader.skip_golomb()?; // bit_depth_chroma_minus8
        reader.skip_bits(1)?; // qpprime_y_zero_transform_bypass_flag

        if reader.read_bool()? {
            let count = if chroma_format_idc != 3 { 8 } else { 12 };
            for i in 0..count {
                if reader.read_bool()? {
                    skip_scaling_list(&mut reader, if i < 6 { 16 } else { 64 })?;
                }
            }
        }
    }

    reader.skip_golomb()?; // log2_max_frame_num_minus4
    let pic_order_cnt_type = reader.read_golomb()?;
    if pic_order_cnt_type == 0 {
        reader.skip_golomb()?; // log2_max_pic_order_cnt_lsb_minus4
    } else if pic_order_cnt_type == 1 {
        reader.skip_bits(1)?; // delta_pic_order_always_zero_flag
        reader.skip_signed_golomb()?; // offset_for_non_ref_pic
        reader.skip_signed_golomb()?; // offset_for_top_to_bottom_field
        let cycle = reader.read_golomb()?;
        for _ in 0..cycle {
            reader.skip_signed_golomb()?;
        }
    }

    reader.skip_golomb()?; // max_num_ref_frames
    reader.skip_bits(1)?; // gaps_in_frame_num_value_allowed_flag

    let pic_width_in_mbs_minus1 = reader.read_golomb()?;
    let pic_height_in_map_units_minus1 = reader.read_golomb()?;
    let frame_mbs_only_flag = reader.read_bits(1)?;
    if frame_mbs_only_flag == 0 {
        reader.skip_bits(1)?; // mb_adaptive_frame_field_flag
    }
    reader.skip_bits(1)?; // direct_8x8_inference_flag

    let (mut crop_left, mut crop_right, mut crop_top, mut crop_bottom) = (0, 0, 0, 0);
    if reader.read_bool()? {
        crop_left = reader.read_golomb()?;
        crop_right = reader.read_golomb()?;
        crop_top = reader.read_golomb()?;
        crop_bottom = reader.read_golomb()?;
    }

    let mut pixel_ratio = (1, 1);
    if reader.read_bool()? && reader.read_bool()? {
        // vui_parameters_present_flag, aspect_ratio_info_present_flag
        pixel_ratio = match reader.read_u8()? {
            1 => (1, 1),
            2 => (12, 11),
            3 => (10, 11),
            4 => (16, 11),
            5 => (40, 33),
            6 => (24, 11),
            7 => (20, 11),
            8 => (32, 11),
            9 => (80, 33),
            10 => (18, 11),
            11 => (15, 11),
            12 => (64, 33),
            13 => (160, 99),
            14 => (4, 3),
            15 => (3, 2),
            16 => (2, 1),
            255 => (reader.read_u16()? as u32, reader.read_u16()? as u32),
            _ => (1, 1),
        };
    }

    let width = ((pic_width_in_mbs_minus1 as i64 + 1) * 16
        - 2 * (crop_left as i64 + crop_right as i64))
        .max(0);
    let crop_unit = if frame_mbs_only_flag == 1 { 2 } else { 4 };
    let height = ((2 - frame_mbs_only_flag as i64) * (pic_height_in_map_units_minus1 as i64 + 1) * 16
        - crop_unit * (crop_top as i64 + crop_bottom as i64))
        .max(0);

    Ok(SPSInfo {
        profile_idc,
        level_idc,
        width: width as u32,
        height: height as u32,
        pixel_ratio,
    })
}

fn skip_scaling_list(reader: &mut BitReader, size: usize) -> Result<()> {
    let mut last_scale = 8;
    let mut next_scale = 8;

    for _ in 0..size {
        if next_scale != 0 {
            let delta_scale = reader.read_signed_golomb()?;
            next_scale = (last_scale + delta_scale + 256) % 256;
        }
        last_scale = if next_scale == 0 { last_scale } else { next_scale };
    }

    Ok(())
}

/// Reads `slice_type` from the start of a slice NAL unit (header included).
pub fn read_slice_type(nal: &[u8]) -> Result<u32> {
    let mut reader = BitReader::new(nal);
    reader.skip_bits(8)?;
    reader.skip_golomb()?; // first_mb_in_slice
    reader.read_golomb()
}

/// I and SI slices, in both the "all slices" and "this slice" numbering.
pub fn is_intra_slice(slice_type: u32) -> bool {
    matches!(slice_type, 2 | 4 | 7 | 9)
}

/// RFC 6381 codec string built from profile_idc, constraint flags and level_idc.
pub fn codec_string(sps: &[u8]) -> Option<String> {
    let bytes = sps.get(1..4)?;
    Some(format!("avc1.{:02x}{:02x}{:02x}", bytes[0], bytes[1], bytes[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bits::test_utils::BitWriter;
    use pretty_assertions::assert_eq;

    const SPS_320X240: [u8; 8] = [0x67, 0x42, 0xC0, 0x1E, 0xDA, 0x05, 0x07, 0xE4];

    #[test]
    fn test_discard_epb() {
        let input = [0x06, 0x00, 0x00, 0x03, 0x01];
        assert_eq!(&*discard_epb(&input), &[0x06, 0x00, 0x00, 0x01]);

        let input = [0x06, 0x00, 0x00, 0x03, 0x01, 0x00, 0x00, 0x03, 0x02];
        assert_eq!(
            &*discard_epb(&input),
            &[0x06, 0x00, 0x00, 0x01, 0x00, 0x00, 0x02]
        );

        let input = [0x06, 0x00, 0x01, 0x03];
        assert!(matches!(discard_epb(&input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_parse_baseline_sps() {
        let info = parse_sps(&SPS_320X240).unwrap();
        assert_eq!(info.profile_idc, 66);
        assert_eq!(info.level_idc, 30);
        assert_eq!((info.width, info.height), (320, 240));
        assert_eq!(info.pixel_ratio, (1, 1));
        assert_eq!(codec_string(&SPS_320X240).as_deref(), Some("avc1.42c01e"));
    }

    #[test]
    fn test_parse_high_profile_sps_with_cropping_and_sar() {
        let mut w = BitWriter::default();
        w.bits(0x67, 8).bits(100, 8).bits(0, 8).bits(40, 8);
        w.golomb(0); // sps id
        w.golomb(1); // chroma_format_idc 4:2:0
        w.golomb(0).golomb(0).bits(0, 1);
        w.bits(1, 1); // seq_scaling_matrix_present_flag
        w.bits(1, 1); // list 0 present: 16 entries, delta 0 keeps scale at 8
        for _ in 0..16 {
            w.golomb(0);
        }
        w.bits(0, 7);
        w.golomb(0); // log2_max_frame_num_minus4
        w.golomb(0).golomb(0); // poc type 0
        w.golomb(4).bits(0, 1);
        w.golomb(119).golomb(67); // 1920 x 1088
        w.bits(1, 1).bits(1, 1);
        w.bits(1, 1).golomb(0).golomb(0).golomb(0).golomb(4); // crop 8 lines
        w.bits(1, 1).bits(1, 1).bits(255, 8).bits(4, 16).bits(3, 16);
        let nal = w.into_bytes();

        let info = parse_sps(&nal).unwrap();
        assert_eq!(info.profile_idc, 100);
        assert_eq!((info.width, info.height), (1920, 1080));
        assert_eq!(info.pixel_ratio, (4, 3));
    }

    #[test]
    fn test_truncated_sps() {
        assert!(parse_sps(&SPS_320X240[..4]).is_err());
        assert_eq!(codec_string(&[0x67, 0x42]), None);
    }

    #[test]
    fn test_read_slice_type() {
        assert_eq!(read_slice_type(&[0x41, 0x88, 0x80, 0x40, 0x11]).unwrap(), 7);
        assert_eq!(read_slice_type(&[0x41, 0x98, 0x80, 0x40, 0x11]).unwrap(), 5);
        assert!(is_intra_slice(7));
        assert!(!is_intra_slice(5));
    }
}
