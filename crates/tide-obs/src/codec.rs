//! Binary encode/decode for the frame format.
//!
//! All integers and floats are little-endian. Strings are length-prefixed
//! with a `u32` length. No compression, no alignment padding.

use std::io::{ErrorKind, Read, Write};

use tide_core::{Attributes, OutputError};

use crate::payload::{OutputArray, Payload, Shape};
use crate::{FORMAT_VERSION, MAGIC};

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), OutputError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), OutputError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), OutputError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f64.
pub fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), OutputError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a length-prefixed UTF-8 string (u32 length + bytes).
pub fn write_str(w: &mut dyn Write, s: &str) -> Result<(), OutputError> {
    let len = u32::try_from(s.len()).map_err(|_| OutputError::MalformedFrame {
        detail: format!("string of {} bytes exceeds u32 length prefix", s.len()),
    })?;
    write_u32_le(w, len)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, OutputError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, OutputError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, OutputError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a little-endian f64.
pub fn read_f64_le(r: &mut dyn Read) -> Result<f64, OutputError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Read a length-prefixed UTF-8 string.
///
/// The buffer grows with the bytes actually read, so a corrupt length
/// prefix yields an error rather than a huge allocation.
pub fn read_str(r: &mut dyn Read) -> Result<String, OutputError> {
    let len = read_u32_le(r)?;
    let mut buf = Vec::new();
    let got = (&mut *r).take(u64::from(len)).read_to_end(&mut buf)?;
    if got as u64 != u64::from(len) {
        return Err(OutputError::MalformedFrame {
            detail: format!("truncated string: got {got} of {len} bytes"),
        });
    }
    String::from_utf8(buf).map_err(|e| OutputError::MalformedFrame {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

fn to_u64(n: usize) -> u64 {
    n as u64
}

fn to_usize(n: u64, what: &str) -> Result<usize, OutputError> {
    usize::try_from(n).map_err(|_| OutputError::MalformedFrame {
        detail: format!("{what} {n} does not fit in usize"),
    })
}

// Upper bound on speculative pre-allocation while decoding; larger
// arrays grow as their values arrive.
const MAX_PREALLOC: usize = 1 << 16;

fn element_count(name: &str, shape: &Shape) -> Result<usize, OutputError> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| OutputError::MalformedFrame {
            detail: format!("array '{name}' shape {shape:?} overflows usize"),
        })
}

// ── Header encode/decode ────────────────────────────────────────

/// Encode the stream header: magic, version, schedule name.
pub fn encode_header(w: &mut dyn Write, name: &str) -> Result<(), OutputError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    write_str(w, name)
}

/// Decode and validate the stream header, returning the schedule name.
pub fn decode_header(r: &mut dyn Read) -> Result<String, OutputError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(OutputError::InvalidMagic);
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(OutputError::UnsupportedVersion { found: version });
    }
    read_str(r)
}

// ── Frame encode/decode ─────────────────────────────────────────

/// Encode one frame: time, array count, then each array as
/// `name, ndim, dims.., long_name, units, len, values..`.
pub fn encode_frame(w: &mut dyn Write, time: f64, payload: &Payload) -> Result<(), OutputError> {
    write_f64_le(w, time)?;
    let count = u32::try_from(payload.len()).map_err(|_| OutputError::MalformedFrame {
        detail: format!("{} arrays exceed u32 count prefix", payload.len()),
    })?;
    write_u32_le(w, count)?;
    for (name, array) in payload.iter() {
        if !array.is_consistent() {
            return Err(OutputError::MalformedFrame {
                detail: format!(
                    "array '{name}' has {} values but shape {:?}",
                    array.len(),
                    array.shape.as_slice()
                ),
            });
        }
        write_str(w, name)?;
        let ndim = u8::try_from(array.shape.len()).map_err(|_| OutputError::MalformedFrame {
            detail: format!("array '{name}' has {} dimensions", array.shape.len()),
        })?;
        write_u8(w, ndim)?;
        for &dim in &array.shape {
            write_u64_le(w, to_u64(dim))?;
        }
        write_str(w, &array.attributes.long_name)?;
        write_str(w, &array.attributes.units)?;
        write_u64_le(w, to_u64(array.data.len()))?;
        for &v in &array.data {
            write_f64_le(w, v)?;
        }
    }
    Ok(())
}

/// Decode one frame.
///
/// Returns `Ok(None)` on clean EOF (no bytes available), `Ok(Some(..))`
/// on success, or an error on truncated or corrupt data.
pub fn decode_frame(r: &mut dyn Read) -> Result<Option<(f64, Payload)>, OutputError> {
    // Read the time field byte-by-byte to distinguish clean EOF from
    // truncation inside the first field.
    let mut time_buf = [0u8; 8];
    let mut filled = 0;
    while filled < 8 {
        match r.read(&mut time_buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(OutputError::MalformedFrame {
                    detail: format!("truncated frame header: got {filled} of 8 bytes for time"),
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(OutputError::Io(e)),
        }
    }
    let time = f64::from_le_bytes(time_buf);

    let count = read_u32_le(r)? as usize;
    let mut payload = Payload::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        let name = read_str(r)?;
        let ndim = read_u8(r)? as usize;
        if ndim > 3 {
            return Err(OutputError::MalformedFrame {
                detail: format!("array '{name}' has {ndim} dimensions"),
            });
        }
        let mut shape = Shape::new();
        for _ in 0..ndim {
            shape.push(to_usize(read_u64_le(r)?, "dimension")?);
        }
        let long_name = read_str(r)?;
        let units = read_str(r)?;
        let len = to_usize(read_u64_le(r)?, "array length")?;
        if len != element_count(&name, &shape)? {
            return Err(OutputError::MalformedFrame {
                detail: format!("array '{name}' has {len} values but shape {shape:?}"),
            });
        }
        let mut data = Vec::with_capacity(len.min(MAX_PREALLOC));
        for read in 0..len {
            match read_f64_le(r) {
                Ok(v) => data.push(v),
                Err(OutputError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    return Err(OutputError::MalformedFrame {
                        detail: format!("array '{name}' truncated after {read} of {len} values"),
                    })
                }
                Err(e) => return Err(e),
            }
        }
        payload.insert(
            name,
            OutputArray {
                data,
                shape,
                attributes: Attributes { long_name, units },
            },
        );
    }
    Ok(Some((time, payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn sample() -> Payload {
        let mut p = Payload::new();
        p.insert(
            "T_y1",
            OutputArray {
                data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
                shape: smallvec![3, 2],
                attributes: Attributes::new("potential temperature", "degC"),
            },
        );
        p.insert(
            "max_nu",
            OutputArray::scalar(1e-4, Attributes::new("maximum turbulent viscosity", "m2/s")),
        );
        p
    }

    #[test]
    fn header_rejects_bad_magic() {
        let bytes = b"NOPE\x01";
        assert!(matches!(
            decode_header(&mut &bytes[..]),
            Err(OutputError::InvalidMagic)
        ));
    }

    #[test]
    fn header_rejects_future_version() {
        let mut bytes = MAGIC.to_vec();
        bytes.push(FORMAT_VERSION + 1);
        match decode_header(&mut bytes.as_slice()) {
            Err(OutputError::UnsupportedVersion { found }) => assert_eq!(found, FORMAT_VERSION + 1),
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn frame_decodes_what_was_encoded() {
        let mut buf = Vec::new();
        encode_frame(&mut buf, 600.0, &sample()).unwrap();
        let (time, payload) = decode_frame(&mut buf.as_slice()).unwrap().unwrap();
        assert_eq!(time, 600.0);
        assert_eq!(payload, sample());
    }

    #[test]
    fn empty_stream_is_clean_eof() {
        let empty: &[u8] = &[];
        assert!(decode_frame(&mut &empty[..]).unwrap().is_none());
    }

    #[test]
    fn truncated_time_is_malformed() {
        let partial: &[u8] = &[0, 0, 0];
        assert!(matches!(
            decode_frame(&mut &partial[..]),
            Err(OutputError::MalformedFrame { .. })
        ));
    }

    fn frame_prefix(dims: &[u64], len: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_f64_le(&mut buf, 0.0).unwrap();
        write_u32_le(&mut buf, 1).unwrap();
        write_str(&mut buf, "T").unwrap();
        write_u8(&mut buf, dims.len() as u8).unwrap();
        for &d in dims {
            write_u64_le(&mut buf, d).unwrap();
        }
        write_str(&mut buf, "potential temperature").unwrap();
        write_str(&mut buf, "degC").unwrap();
        write_u64_le(&mut buf, len).unwrap();
        buf
    }

    #[test]
    fn huge_declared_length_is_malformed() {
        let bytes = frame_prefix(&[1 << 61], 1 << 61);
        match decode_frame(&mut bytes.as_slice()) {
            Err(OutputError::MalformedFrame { detail }) => assert!(detail.contains("truncated")),
            other => panic!("expected MalformedFrame, got {other:?}"),
        }
    }

    #[test]
    fn overflowing_shape_is_malformed() {
        let bytes = frame_prefix(&[1 << 40, 1 << 40], 0);
        match decode_frame(&mut bytes.as_slice()) {
            Err(OutputError::MalformedFrame { detail }) => assert!(detail.contains("overflows")),
            other => panic!("expected MalformedFrame, got {other:?}"),
        }
    }

    #[test]
    fn huge_string_length_is_malformed() {
        let mut bytes = Vec::new();
        write_u32_le(&mut bytes, u32::MAX).unwrap();
        bytes.extend_from_slice(b"abc");
        assert!(matches!(
            read_str(&mut bytes.as_slice()),
            Err(OutputError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn too_many_dimensions_are_not_encoded() {
        let mut p = Payload::new();
        p.insert(
            "deep",
            OutputArray {
                data: vec![0.0],
                shape: std::iter::repeat(1).take(300).collect(),
                attributes: Attributes::new("deep", "1"),
            },
        );
        let mut buf = Vec::new();
        match encode_frame(&mut buf, 0.0, &p) {
            Err(OutputError::MalformedFrame { detail }) => assert!(detail.contains("300 dimensions")),
            other => panic!("expected MalformedFrame, got {other:?}"),
        }
    }

    #[test]
    fn inconsistent_array_is_not_encoded() {
        let mut p = Payload::new();
        p.insert(
            "bad",
            OutputArray {
                data: vec![0.0; 5],
                shape: smallvec![2, 2],
                attributes: Attributes::new("bad", "1"),
            },
        );
        let mut buf = Vec::new();
        assert!(matches!(
            encode_frame(&mut buf, 0.0, &p),
            Err(OutputError::MalformedFrame { .. })
        ));
    }
}
