//! Utility functions for DNS names on the wire.
//!
//! This module provides helpers for reading and writing domain names in
//! RFC 1035 label format.

use crate::errors::WireError;
use crate::message::{DnsName, MAX_NAME_LEN};

/// Top two bits of a length byte that mark a compression pointer.
const POINTER_MASK: u8 = 0xC0;

/// Read a domain name starting at `start`.
///
/// Compression pointers are followed, but only backward: each pointer must
/// target an offset before the start of the label run that contains it, which
/// rules out both forward references and loops.
///
/// # Arguments
/// * `buf` - The whole DNS message.
/// * `start` - Offset of the first length byte.
///
/// # Returns
/// The name and the offset just past it in the original (uncompressed) stream.
pub fn read_name(buf: &[u8], start: usize) -> Result<(DnsName, usize), WireError> {
    let mut labels = Vec::new();
    let mut pos = start;
    // Start of the label run being read; pointers must land before it.
    let mut run_start = start;
    let mut end = None;
    let mut wire_len = 1;

    loop {
        let len_byte = *buf.get(pos).ok_or(WireError::UnexpectedEnd {
            offset: pos,
            needed: 1,
            len: buf.len(),
        })?;

        match len_byte & POINTER_MASK {
            0x00 => {}
            POINTER_MASK => {
                let low = *buf.get(pos + 1).ok_or(WireError::UnexpectedEnd {
                    offset: pos,
                    needed: 2,
                    len: buf.len(),
                })?;
                let target = (usize::from(len_byte & !POINTER_MASK) << 8) | usize::from(low);
                if target >= run_start {
                    return Err(WireError::BadPointer {
                        offset: pos,
                        target,
                    });
                }
                end.get_or_insert(pos + 2);
                pos = target;
                run_start = target;
                continue;
            }
            _ => {
                return Err(WireError::LabelTooLong {
                    offset: pos,
                    byte: len_byte,
                })
            }
        }

        let len = usize::from(len_byte);
        if len == 0 {
            let end = end.unwrap_or(pos + 1);
            return Ok((DnsName::from_labels(labels)?, end));
        }

        wire_len += len + 1;
        if wire_len > MAX_NAME_LEN {
            return Err(WireError::NameTooLong { offset: start });
        }

        let label = buf
            .get(pos + 1..pos + 1 + len)
            .ok_or(WireError::UnexpectedEnd {
                offset: pos + 1,
                needed: len,
                len: buf.len(),
            })?;
        labels.push(label.to_vec());
        pos += len + 1;
    }
}

/// Encode a domain name in DNS wire format, without compression.
///
/// # Arguments
/// * `out` - Buffer to append to.
/// * `name` - The domain name to encode.
pub fn write_name(out: &mut Vec<u8>, name: &DnsName) {
    for label in name.labels() {
        // DnsName guarantees 1..=63 bytes per label.
        out.push(label.len() as u8);
        out.extend_from_slice(label);
    }
    out.push(0); // Root label
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(name: &str) -> Vec<u8> {
        let mut out = Vec::new();
        write_name(&mut out, &DnsName::parse(name).unwrap());
        out
    }

    #[test]
    fn test_write_name() {
        assert_eq!(
            encoded("blog.ksaquib.dev"),
            b"\x04blog\x07ksaquib\x03dev\x00".to_vec()
        );
        assert_eq!(encoded("."), vec![0]);
    }

    #[test]
    fn test_read_name() {
        let buf = encoded("ksaquib.surge.sh");
        let (name, end) = read_name(&buf, 0).unwrap();
        assert_eq!(name, DnsName::parse("ksaquib.surge.sh").unwrap());
        assert_eq!(end, buf.len());
    }

    #[test]
    fn test_read_name_with_pointer() {
        // "surge.sh" at 0, then "ksaquib" + pointer to 0.
        let mut buf = encoded("surge.sh");
        let second = buf.len();
        buf.extend_from_slice(b"\x07ksaquib\xC0\x00");
        let (name, end) = read_name(&buf, second).unwrap();
        assert_eq!(name.to_string(), "ksaquib.surge.sh.");
        assert_eq!(end, buf.len());
    }

    #[test]
    fn test_read_name_rejects_forward_pointer() {
        let buf = [0xC0, 0x02, 0x00];
        assert_eq!(
            read_name(&buf, 0),
            Err(WireError::BadPointer {
                offset: 0,
                target: 2
            })
        );
    }

    #[test]
    fn test_read_name_rejects_pointer_loop() {
        // Pointer to itself.
        let buf = [0x01, b'a', 0xC0, 0x02];
        assert!(matches!(
            read_name(&buf, 2),
            Err(WireError::BadPointer { .. })
        ));
        // Two labels that point at each other through a run.
        let buf = [0x01, b'a', 0xC0, 0x00];
        assert!(matches!(
            read_name(&buf, 0),
            Err(WireError::BadPointer { .. })
        ));
    }

    #[test]
    fn test_read_name_truncated() {
        assert!(matches!(
            read_name(b"\x07ksa", 0),
            Err(WireError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            read_name(b"\x03abc", 0),
            Err(WireError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            read_name(&[0xC0], 0),
            Err(WireError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn test_read_name_rejects_reserved_label_type() {
        let mut buf = vec![64];
        buf.extend_from_slice(&[b'a'; 64]);
        buf.push(0);
        assert_eq!(
            read_name(&buf, 0),
            Err(WireError::LabelTooLong {
                offset: 0,
                byte: 64
            })
        );
    }

    #[test]
    fn test_read_name_too_long() {
        let mut buf = Vec::new();
        for _ in 0..5 {
            buf.push(63);
            buf.extend_from_slice(&[b'a'; 63]);
        }
        buf.push(0);
        assert_eq!(
            read_name(&buf, 0),
            Err(WireError::NameTooLong { offset: 0 })
        );
    }
}
