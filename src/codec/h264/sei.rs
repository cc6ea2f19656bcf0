use bytes::Bytes;

use super::parser::discard_epb;
use crate::utils::BitReader;
use crate::Result;

const PAYLOAD_TYPE_USER_DATA_REGISTERED: u32 = 4;
const PAYLOAD_TYPE_USER_DATA_UNREGISTERED: u32 = 5;

const ITU_T_T35_COUNTRY_CODE_US: u8 = 181;
const ITU_T_T35_PROVIDER_ATSC: u16 = 49;
/// "GA94"
const ATSC_USER_IDENTIFIER: u32 = 0x4741_3934;
const ATSC_CC_DATA: u8 = 3;

/// Caption-carrying content of an SEI NAL unit.
#[derive(Debug, Clone, PartialEq)]
pub enum SeiMessage {
    /// `cc_data` header byte pair followed by `cc_count` byte triplets.
    Cea608(Vec<u8>),
    UserData {
        payload_type: u32,
        uuid: String,
        user_data: String,
        user_data_bytes: Bytes,
    },
}

/// Walks the SEI payloads of a NAL unit (header included) and returns the
/// first caption or user-data payload, if any.
///
/// Payloads of other types are skipped. A registered payload that is not
/// ATSC `cc_data` still ends the walk.
pub fn parse_sei(nal: &[u8]) -> Result<Option<SeiMessage>> {
    let rbsp = discard_epb(nal);
    let mut reader = BitReader::new(&rbsp);
    reader.skip_bits(8)?;

    while reader.bytes_available() > 1 {
        let payload_type = read_ff_coded(&mut reader)?;
        let payload_size = read_ff_coded(&mut reader)? as usize;

        if payload_type == PAYLOAD_TYPE_USER_DATA_REGISTERED && reader.bytes_available() != 0 {
            return read_cc_data(&mut reader);
        }

        if payload_type == PAYLOAD_TYPE_USER_DATA_UNREGISTERED && reader.bytes_available() != 0 {
            if payload_size <= 16 {
                return Ok(None);
            }
            return read_user_data(&mut reader, payload_type, payload_size).map(Some);
        }

        if payload_size < reader.bytes_available() {
            reader.skip_bytes(payload_size)?;
        } else {
            break;
        }
    }

    Ok(None)
}

/// Payload type and size use 0xFF as "add 255 and continue".
fn read_ff_coded(reader: &mut BitReader) -> Result<u32> {
    let mut value = 0u32;
    loop {
        let byte = reader.read_u8()?;
        value += byte as u32;
        if byte != 0xFF {
            return Ok(value);
        }
    }
}

fn read_cc_data(reader: &mut BitReader) -> Result<Option<SeiMessage>> {
    if reader.read_u8()? != ITU_T_T35_COUNTRY_CODE_US
        || reader.read_u16()? != ITU_T_T35_PROVIDER_ATSC
        || reader.read_u32()? != ATSC_USER_IDENTIFIER
        || reader.read_u8()? != ATSC_CC_DATA
    {
        return Ok(None);
    }

    let first = reader.read_u8()?;
    let second = reader.read_u8()?;
    let cc_count = (first & 0x1f) as usize;

    let mut bytes = Vec::with_capacity(2 + cc_count * 3);
    bytes.push(first);
    bytes.push(second);
    for _ in 0..cc_count * 3 {
        bytes.push(reader.read_u8()?);
    }
    Ok(Some(SeiMessage::Cea608(bytes)))
}

fn read_user_data(
    reader: &mut BitReader,
    payload_type: u32,
    payload_size: usize,
) -> Result<SeiMessage> {
    let mut uuid = String::with_capacity(36);
    for i in 0..16 {
        uuid.push_str(&format!("{:02x}", reader.read_u8()?));
        if matches!(i, 3 | 5 | 7 | 9) {
            uuid.push('-');
        }
    }

    let mut bytes = Vec::with_capacity(payload_size - 16);
    for _ in 16..payload_size {
        bytes.push(reader.read_u8()?);
    }

    Ok(SeiMessage::UserData {
        payload_type,
        uuid,
        user_data: String::from_utf8_lossy(&bytes).into_owned(),
        user_data_bytes: Bytes::from(bytes),
    })
}

#[cfg(test)]
pub(crate) mod test_utils {
    /// SEI NAL unit carrying one ATSC A/53 cc_data payload.
    pub fn cea608_sei(triplets: &[[u8; 3]]) -> Vec<u8> {
        let mut payload = vec![181, 0x00, 49, b'G', b'A', b'9', b'4', 3];
        payload.push(0x40 | triplets.len() as u8);
        payload.push(0xFF);
        for triplet in triplets {
            payload.extend_from_slice(triplet);
        }
        payload.push(0xFF); // marker_bits

        let mut nal = vec![0x06, 4, payload.len() as u8];
        nal.extend_from_slice(&payload);
        nal.push(0x80); // rbsp trailing bits
        nal
    }
}
