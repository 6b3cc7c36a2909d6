//! FCI (File Control Information) decoding — spec §4.2.
//!
//! STARCOS only ever returns short-form BER-TLV length bytes inside the
//! `6F` wrapper, so this scans with a one-byte length like the original
//! driver rather than pulling in a general BER/DER parser for two tags.

use crate::card::{EfStructure, FileDescriptor};
use crate::error::Error;

/// Finds the first occurrence of `tag` in a flat (non-nested) TLV
/// sequence, short-form length only.
fn find_tag(buf: &[u8], tag: u8) -> Option<&[u8]> {
    let mut i = 0;
    while i + 2 <= buf.len() {
        let t = buf[i];
        let len = buf[i + 1] as usize;
        let start = i + 2;
        if start + len > buf.len() {
            break;
        }
        if t == tag {
            return Some(&buf[start..start + len]);
        }
        i = start + len;
    }
    None
}

/// Decodes a SELECT response body into a [`FileDescriptor`].
///
/// Fails with [`Error::InvalidData`] if the outer wrapper isn't tag
/// `0x6F` or its declared length doesn't fit the buffer; with
/// [`Error::Internal`] if the buffer is too short to contain even the
/// tag/length header, mirroring the original's `buflen < 2` check.
pub fn decode_fci(buf: &[u8]) -> Result<FileDescriptor, Error> {
    if buf.len() < 2 {
        return Err(Error::Internal);
    }
    if buf[0] != 0x6F {
        return Err(Error::InvalidData);
    }
    let len = buf[1] as usize;
    if buf.len() - 2 < len {
        return Err(Error::InvalidData);
    }
    let body = &buf[2..2 + len];

    let mut file = FileDescriptor::working_ef();

    if let Some(tag) = find_tag(body, 0x80) {
        if tag.len() >= 2 {
            file.size = ((tag[0] as u32) << 8) | tag[1] as u32;
        }
    }

    if let Some(tag) = find_tag(body, 0x82) {
        match tag {
            [0x01] => {
                file.ef_structure = EfStructure::Transparent;
            }
            // "object EF", reported as transparent per spec §4.2 / the
            // upstream TODO — an eventual distinct descriptor variant
            // is the open question noted in spec §9, not resolved here.
            [0x11] => {
                file.ef_structure = EfStructure::Transparent;
            }
            [first, 0x21, record_length] => {
                file.record_length = *record_length;
                file.ef_structure = match first {
                    0x02 => EfStructure::LinearFixed,
                    0x07 => EfStructure::Cyclic,
                    0x17 => {
                        file.record_length = 0;
                        EfStructure::Unknown
                    }
                    _ => EfStructure::Unknown,
                };
            }
            _ => {}
        }
    }

    file.valid = true;
    Ok(file)
}
