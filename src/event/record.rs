//! TFRecord framing
//!
//! ```text
//! u64 LE  length
//! u32 LE  masked crc32c(length bytes)
//! [u8]    data (length bytes)
//! u32 LE  masked crc32c(data)
//! ```

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Error, Result};

const MASK_DELTA: u32 = 0xa282_ead8;

/// Records larger than this are treated as corruption rather than allocated.
pub const MAX_RECORD_BYTES: u64 = 256 * 1024 * 1024;

/// CRC32C of `data`, masked the way TFRecord stores it.
#[must_use]
pub fn masked_crc32c(data: &[u8]) -> u32 {
    crc32c::crc32c(data).rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Sequential reader over the records of one file.
///
/// A record cut short by end-of-file (the writer is still running or was
/// killed mid-write) ends iteration quietly; checksum mismatches are
/// errors.
pub struct RecordReader<R> {
    inner: R,
    path: PathBuf,
    records_read: usize,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    /// Wrap a byte source; `path` is only used in error messages.
    pub fn new(inner: R, path: impl AsRef<Path>) -> Self {
        Self {
            inner,
            path: path.as_ref().to_path_buf(),
            records_read: 0,
            done: false,
        }
    }

    /// Number of complete records returned so far.
    #[must_use]
    pub const fn records_read(&self) -> usize {
        self.records_read
    }

    /// Read the next record payload, `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns `Error::Corrupt` on checksum mismatch or an implausible
    /// length, `Error::Io` on read failure.
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        if self.done {
            return Ok(None);
        }

        let mut header = [0u8; 12];
        let n = read_full(&mut self.inner, &mut header)?;
        if n == 0 {
            self.done = true;
            return Ok(None);
        }
        if n < header.len() {
            return Ok(self.truncated("header"));
        }

        let (len_bytes, len_crc) = header.split_at(8);
        let expected = u32::from_le_bytes([len_crc[0], len_crc[1], len_crc[2], len_crc[3]]);
        if masked_crc32c(len_bytes) != expected {
            return Err(self.corrupt("length checksum mismatch"));
        }

        let mut len_buf = [0u8; 8];
        len_buf.copy_from_slice(len_bytes);
        let len = u64::from_le_bytes(len_buf);
        if len > MAX_RECORD_BYTES {
            return Err(self.corrupt(&format!("record length {len} exceeds {MAX_RECORD_BYTES}")));
        }

        let len = usize::try_from(len).map_err(|_| self.corrupt("record length overflows usize"))?;
        let mut data = vec![0u8; len];
        if read_full(&mut self.inner, &mut data)? < len {
            return Ok(self.truncated("payload"));
        }

        let mut footer = [0u8; 4];
        if read_full(&mut self.inner, &mut footer)? < footer.len() {
            return Ok(self.truncated("footer"));
        }
        if masked_crc32c(&data) != u32::from_le_bytes(footer) {
            return Err(self.corrupt("payload checksum mismatch"));
        }

        self.records_read += 1;
        Ok(Some(data))
    }

    fn truncated(&mut self, part: &str) -> Option<Vec<u8>> {
        debug!(
            path = %self.path.display(),
            records = self.records_read,
            "Truncated {part} at end of event file, stopping"
        );
        self.done = true;
        None
    }

    fn corrupt(&mut self, reason: &str) -> Error {
        self.done = true;
        Error::Corrupt {
            path: self.path.clone(),
            reason: format!("record {}: {reason}", self.records_read),
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

/// Read until `buf` is full or the source is exhausted; returns bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Append one framed record to `writer`.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub fn write_record<W: Write>(writer: &mut W, data: &[u8]) -> io::Result<()> {
    let len = (data.len() as u64).to_le_bytes();
    writer.write_all(&len)?;
    writer.write_all(&masked_crc32c(&len).to_le_bytes())?;
    writer.write_all(data)?;
    writer.write_all(&masked_crc32c(data).to_le_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn framed(payloads: &[&[u8]]) -> Vec<u8> {
        let mut buf = Vec::new();
        for payload in payloads {
            write_record(&mut buf, payload).unwrap();
        }
        buf
    }

    #[test]
    fn test_masked_crc_known_value() {
        // crc32c("") == 0, so the masked value is the mask delta itself
        assert_eq!(masked_crc32c(b""), MASK_DELTA);
    }

    #[test]
    fn test_reads_all_records() {
        let bytes = framed(&[b"first", b"", b"third"]);
        let records: Vec<Vec<u8>> = RecordReader::new(Cursor::new(bytes), "mem")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records, vec![b"first".to_vec(), Vec::new(), b"third".to_vec()]);
    }

    #[test]
    fn test_truncated_tail_is_not_an_error() {
        let mut bytes = framed(&[b"complete", b"partial-record"]);
        bytes.truncate(bytes.len() - 6);
        let mut reader = RecordReader::new(Cursor::new(bytes), "mem");
        assert_eq!(reader.read_record().unwrap(), Some(b"complete".to_vec()));
        assert_eq!(reader.read_record().unwrap(), None);
        assert_eq!(reader.records_read(), 1);
    }

    #[test]
    fn test_flipped_payload_byte_is_corrupt() {
        let mut bytes = framed(&[b"payload"]);
        bytes[13] ^= 0xff;
        let err = RecordReader::new(Cursor::new(bytes), "mem")
            .read_record()
            .unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }));
        assert!(err.to_string().contains("payload checksum mismatch"));
    }

    #[test]
    fn test_flipped_length_byte_is_corrupt() {
        let mut bytes = framed(&[b"payload"]);
        bytes[0] ^= 0x01;
        let err = RecordReader::new(Cursor::new(bytes), "mem")
            .read_record()
            .unwrap_err();
        assert!(err.to_string().contains("length checksum mismatch"));
    }

    #[test]
    fn test_iteration_stops_after_error() {
        let mut bytes = framed(&[b"payload", b"next"]);
        bytes[13] ^= 0xff;
        let mut reader = RecordReader::new(Cursor::new(bytes), "mem");
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }
}
