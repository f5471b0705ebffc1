//! Minimal binary property list reader.
//!
//! Only the subset needed to pull a single timestamp out of the
//! `com.apple.assetsd.*` attributes is supported: the trailer, the offset
//! table and a root object tagged as a real number or a date. Values are
//! returned as raw seconds relative to 2001-01-01T00:00:00Z.

use crate::error::PlistError;

const MAGIC: &[u8; 6] = b"bplist";
const HEADER_LEN: usize = 8;
const TRAILER_LEN: usize = 32;

const MARKER_REAL_F32: u8 = 0x22;
const MARKER_REAL_F64: u8 = 0x23;
const MARKER_DATE: u8 = 0x33;

/// Table geometry stored in the last 32 bytes of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Trailer {
    offset_int_size: usize,
    object_ref_size: usize,
    num_objects: u64,
    top_object: u64,
    offset_table_offset: u64,
}

/// Decode `data` and return the root timestamp in reference-epoch seconds.
pub fn decode_timestamp(data: &[u8]) -> Result<f64, PlistError> {
    if data.len() < HEADER_LEN + TRAILER_LEN {
        return Err(PlistError::TooShort { len: data.len() });
    }
    if &data[..MAGIC.len()] != MAGIC {
        return Err(PlistError::BadMagic);
    }

    let trailer = parse_trailer(data)?;
    let root_offset = root_object_offset(data, &trailer)?;
    read_root_value(data, root_offset, trailer.offset_table_offset as usize)
}

fn parse_trailer(data: &[u8]) -> Result<Trailer, PlistError> {
    // Layout: 5 unused bytes, sort version, offset size, ref size, then three u64s.
    let raw = &data[data.len() - TRAILER_LEN..];
    let trailer = Trailer {
        offset_int_size: raw[6] as usize,
        object_ref_size: raw[7] as usize,
        num_objects: read_uint_be(raw, 8, 8).unwrap_or(0),
        top_object: read_uint_be(raw, 16, 8).unwrap_or(0),
        offset_table_offset: read_uint_be(raw, 24, 8).unwrap_or(0),
    };

    if !(1..=8).contains(&trailer.offset_int_size) {
        return Err(PlistError::InvalidTrailer("offset int size"));
    }
    if !(1..=8).contains(&trailer.object_ref_size) {
        return Err(PlistError::InvalidTrailer("object ref size"));
    }
    if trailer.num_objects == 0 {
        return Err(PlistError::InvalidTrailer("object count"));
    }
    if trailer.top_object >= trailer.num_objects {
        return Err(PlistError::InvalidTrailer("top object index"));
    }

    let table_start = trailer.offset_table_offset;
    let table_len = trailer
        .num_objects
        .checked_mul(trailer.offset_int_size as u64)
        .ok_or(PlistError::InvalidTrailer("offset table size"))?;
    let table_end = table_start
        .checked_add(table_len)
        .ok_or(PlistError::InvalidTrailer("offset table size"))?;
    if table_start < HEADER_LEN as u64 || table_end > (data.len() - TRAILER_LEN) as u64 {
        return Err(PlistError::InvalidTrailer("offset table position"));
    }
    Ok(trailer)
}

fn root_object_offset(data: &[u8], trailer: &Trailer) -> Result<usize, PlistError> {
    let entry = trailer.offset_table_offset as usize
        + trailer.top_object as usize * trailer.offset_int_size;
    let offset = read_uint_be(data, entry, trailer.offset_int_size)
        .ok_or(PlistError::InvalidTrailer("offset table entry"))?;
    if offset < HEADER_LEN as u64 || offset >= trailer.offset_table_offset {
        return Err(PlistError::OffsetOutOfRange { offset });
    }
    Ok(offset as usize)
}

fn read_root_value(data: &[u8], offset: usize, objects_end: usize) -> Result<f64, PlistError> {
    let marker = data[offset];
    let width = match marker {
        MARKER_REAL_F32 => 4,
        MARKER_REAL_F64 | MARKER_DATE => 8,
        _ => return Err(PlistError::UnsupportedRoot { marker }),
    };
    let start = offset + 1;
    if start + width > objects_end {
        return Err(PlistError::OffsetOutOfRange {
            offset: offset as u64,
        });
    }

    let bits = read_uint_be(data, start, width).ok_or(PlistError::OffsetOutOfRange {
        offset: offset as u64,
    })?;
    if width == 4 {
        Ok(f32::from_bits(bits as u32) as f64)
    } else {
        Ok(f64::from_bits(bits))
    }
}

/// Big-endian unsigned integer of `width` bytes (1..=8) at `offset`.
fn read_uint_be(data: &[u8], offset: usize, width: usize) -> Option<u64> {
    let bytes = data.get(offset..offset.checked_add(width)?)?;
    Some(bytes.iter().fold(0u64, |acc, byte| (acc << 8) | *byte as u64))
}
