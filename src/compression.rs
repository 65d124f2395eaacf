use std::io::{Read, Write};

use base64::{engine::general_purpose, Engine as _};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use thiserror::Error;

/// Name of the archive entry holding the canonical JSON declaration.
pub const MODEL_ENTRY: &str = "model.json";

// Entry timestamps are pinned (2009-01-03 00:00:00 UTC, DOS format) so the
// encoding is deterministic and content-addressable.
const ENTRY_DOS_TIME: u16 = 0;
const ENTRY_DOS_DATE: u16 = ((2009 - 1980) << 9) | (1 << 5) | 3;

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_SIG: u32 = 0x0605_4b50;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

/// Failures decoding external payloads. Payloads the library itself
/// produced decode infallibly; callers treat these as recoverable only for
/// foreign URLs.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("missing z= query parameter")]
    MissingParam,
    #[error("invalid base64 payload")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid archive: {0}")]
    BadArchive(&'static str),
    #[error("archive entry not found: {0}")]
    MissingEntry(String),
    #[error("entry is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn get_u16(buf: &[u8], pos: usize) -> Result<u16, CodecError> {
    buf.get(pos..pos + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(CodecError::BadArchive("truncated header"))
}

fn get_u32(buf: &[u8], pos: usize) -> Result<u32, CodecError> {
    buf.get(pos..pos + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(CodecError::BadArchive("truncated header"))
}

/// Builds a single-entry archive with a deflate body and a pinned
/// timestamp.
pub fn zip_encode(filename: &str, contents: &str) -> Result<Vec<u8>, CodecError> {
    let data = contents.as_bytes();

    let mut crc = Crc::new();
    crc.update(data);
    let checksum = crc.sum();

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    let compressed = encoder.finish()?;

    let name = filename.as_bytes();
    let mut archive = Vec::new();

    // local file header
    put_u32(&mut archive, LOCAL_HEADER_SIG);
    put_u16(&mut archive, 20); // version needed
    put_u16(&mut archive, 0); // flags
    put_u16(&mut archive, METHOD_DEFLATE);
    put_u16(&mut archive, ENTRY_DOS_TIME);
    put_u16(&mut archive, ENTRY_DOS_DATE);
    put_u32(&mut archive, checksum);
    put_u32(&mut archive, compressed.len() as u32);
    put_u32(&mut archive, data.len() as u32);
    put_u16(&mut archive, name.len() as u16);
    put_u16(&mut archive, 0); // extra field length
    archive.extend_from_slice(name);
    archive.extend_from_slice(&compressed);

    // central directory
    let central_offset = archive.len() as u32;
    put_u32(&mut archive, CENTRAL_HEADER_SIG);
    put_u16(&mut archive, 20); // version made by
    put_u16(&mut archive, 20); // version needed
    put_u16(&mut archive, 0); // flags
    put_u16(&mut archive, METHOD_DEFLATE);
    put_u16(&mut archive, ENTRY_DOS_TIME);
    put_u16(&mut archive, ENTRY_DOS_DATE);
    put_u32(&mut archive, checksum);
    put_u32(&mut archive, compressed.len() as u32);
    put_u32(&mut archive, data.len() as u32);
    put_u16(&mut archive, name.len() as u16);
    put_u16(&mut archive, 0); // extra field length
    put_u16(&mut archive, 0); // comment length
    put_u16(&mut archive, 0); // disk number start
    put_u16(&mut archive, 0); // internal attributes
    put_u32(&mut archive, 0); // external attributes
    put_u32(&mut archive, 0); // local header offset
    archive.extend_from_slice(name);
    let central_size = archive.len() as u32 - central_offset;

    // end of central directory
    put_u32(&mut archive, END_OF_CENTRAL_SIG);
    put_u16(&mut archive, 0); // disk number
    put_u16(&mut archive, 0); // central directory disk
    put_u16(&mut archive, 1); // entries on this disk
    put_u16(&mut archive, 1); // total entries
    put_u32(&mut archive, central_size);
    put_u32(&mut archive, central_offset);
    put_u16(&mut archive, 0); // comment length

    Ok(archive)
}

/// Extracts the named entry from an archive, accepting stored and deflate
/// bodies. The entry checksum is verified.
pub fn zip_extract(archive: &[u8], filename: &str) -> Result<String, CodecError> {
    let mut pos = 0;
    loop {
        let sig = get_u32(archive, pos)?;
        if sig != LOCAL_HEADER_SIG {
            if sig == CENTRAL_HEADER_SIG || sig == END_OF_CENTRAL_SIG {
                return Err(CodecError::MissingEntry(filename.to_string()));
            }
            return Err(CodecError::BadArchive("bad header signature"));
        }
        let flags = get_u16(archive, pos + 6)?;
        if flags & 0x08 != 0 {
            return Err(CodecError::BadArchive("streamed entries are unsupported"));
        }
        let method = get_u16(archive, pos + 8)?;
        let checksum = get_u32(archive, pos + 14)?;
        let compressed_len = get_u32(archive, pos + 18)? as usize;
        let name_len = get_u16(archive, pos + 26)? as usize;
        let extra_len = get_u16(archive, pos + 28)? as usize;

        let name_start = pos + 30;
        let data_start = name_start + name_len + extra_len;
        let name = archive
            .get(name_start..name_start + name_len)
            .ok_or(CodecError::BadArchive("truncated entry name"))?;
        let body = archive
            .get(data_start..data_start + compressed_len)
            .ok_or(CodecError::BadArchive("truncated entry body"))?;

        if name == filename.as_bytes() {
            let data = match method {
                METHOD_STORED => body.to_vec(),
                METHOD_DEFLATE => {
                    let mut decoder = DeflateDecoder::new(body);
                    let mut data = Vec::new();
                    decoder.read_to_end(&mut data)?;
                    data
                }
                _ => return Err(CodecError::BadArchive("unsupported compression method")),
            };
            let mut crc = Crc::new();
            crc.update(&data);
            if crc.sum() != checksum {
                return Err(CodecError::BadArchive("checksum mismatch"));
            }
            return Ok(String::from_utf8(data)?);
        }
        pos = data_start + compressed_len;
    }
}

/// Compresses contents into a base64-encoded single-entry archive.
pub fn compress_encode(filename: &str, contents: &str) -> Result<String, CodecError> {
    Ok(general_purpose::STANDARD.encode(zip_encode(filename, contents)?))
}

/// Decodes a base64 archive and extracts the named entry.
pub fn decompress_decode(encoded: &str, filename: &str) -> Result<String, CodecError> {
    let decoded = general_purpose::STANDARD.decode(encoded)?;
    zip_extract(&decoded, filename)
}

/// Extracts the `z` query parameter from a URL and decodes the named entry
/// from its base64 archive payload.
pub fn unzip_url(url: &str, filename: &str) -> Result<String, CodecError> {
    let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
    let z = query
        .split('&')
        .find_map(|param| param.strip_prefix("z="))
        .ok_or(CodecError::MissingParam)?;
    decompress_decode(z, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_roundtrip() {
        let archive = zip_encode(MODEL_ENTRY, "{\"modelType\":\"petriNet\"}").expect("encode");
        let contents = zip_extract(&archive, MODEL_ENTRY).expect("extract");
        assert_eq!(contents, "{\"modelType\":\"petriNet\"}");
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = compress_encode(MODEL_ENTRY, "payload").expect("encode");
        let b = compress_encode(MODEL_ENTRY, "payload").expect("encode");
        assert_eq!(a, b);
    }

    #[test]
    fn test_unzip_url() {
        let encoded = compress_encode(MODEL_ENTRY, "hello").expect("encode");
        let url = format!("https://example.com/p/?v=0&z={encoded}");
        let contents = unzip_url(&url, MODEL_ENTRY).expect("decode");
        assert_eq!(contents, "hello");
    }

    #[test]
    fn test_unzip_url_missing_param() {
        let err = unzip_url("https://example.com/?a=b", MODEL_ENTRY).expect_err("missing z=");
        assert!(matches!(err, CodecError::MissingParam));
    }

    #[test]
    fn test_unzip_url_bad_base64() {
        let err = unzip_url("?z=!!!not-base64!!!", MODEL_ENTRY).expect_err("bad base64");
        assert!(matches!(err, CodecError::Base64(_)));
    }

    #[test]
    fn test_missing_entry() {
        let archive = zip_encode("other.json", "{}").expect("encode");
        let err = zip_extract(&archive, MODEL_ENTRY).expect_err("wrong entry name");
        assert!(matches!(err, CodecError::MissingEntry(_)));
    }

    #[test]
    fn test_malformed_archive() {
        let err = zip_extract(b"not an archive at all", MODEL_ENTRY).expect_err("garbage");
        assert!(matches!(err, CodecError::BadArchive(_)));
    }

    #[test]
    fn test_timestamp_is_pinned() {
        let archive = zip_encode(MODEL_ENTRY, "x").expect("encode");
        // mod time / mod date of the local header
        assert_eq!(&archive[10..12], &0u16.to_le_bytes());
        assert_eq!(&archive[12..14], &0x3A23u16.to_le_bytes());
    }
}
