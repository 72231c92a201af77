use std::fmt::Write;

use crate::error::{Error, Result};

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;

//The top two bits of a length byte mark a compression pointer
const POINTER_MASK: u8 = 0xC0;
const MAX_POINTER_HOPS: usize = 64;

//Domain names are sent with "length" separators and are null-terminated
//The domain 'microsoft.com' becomes "0x09microsoft0x03com0x00"
//No compression is ever produced here.
pub fn encode_name(name: &str) -> Result<Vec<u8>> {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    //Need one byte for size of each part, n bytes for the text, and a null byte
    let mut buffer: Vec<u8> = Vec::with_capacity(trimmed.len() + 2);
    if !trimmed.is_empty() {
        for part in trimmed.split('.') {
            if part.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "empty label in domain name \"{}\"",
                    name
                )));
            }
            if part.len() > MAX_LABEL_LEN {
                return Err(Error::InvalidArgument(format!(
                    "label \"{}\" exceeds {} bytes",
                    part, MAX_LABEL_LEN
                )));
            }
            //Write the size byte first
            buffer.push(part.len() as u8);
            buffer.extend_from_slice(part.as_bytes());
        }
    }
    //Write terminating null byte
    buffer.push(0);
    if buffer.len() > MAX_NAME_LEN {
        return Err(Error::InvalidArgument(format!(
            "domain name \"{}\" exceeds {} bytes",
            name, MAX_NAME_LEN
        )));
    }
    Ok(buffer)
}

/// Decodes the (possibly compressed) name starting at `offset` of the
/// message `buf`.
///
/// Returns the dotted name and the number of bytes the name occupies at
/// `offset`. Once a compression pointer is followed, bytes read at the
/// pointer target are not counted. Every pointer has to point strictly
/// before the position it was read from.
pub fn decode_name(buf: &[u8], offset: usize) -> Result<(String, usize)> {
    let mut name = String::new();
    let mut pos = offset;
    let mut consumed: Option<usize> = None;
    let mut hops = 0;
    let mut wire_len = 0;

    loop {
        let len = *buf
            .get(pos)
            .ok_or_else(|| malformed(format!("name at offset {} runs past end of message", offset)))?;

        if len & POINTER_MASK == POINTER_MASK {
            let low = *buf
                .get(pos + 1)
                .ok_or_else(|| malformed(format!("truncated compression pointer at offset {}", pos)))?;
            let target = (((len & !POINTER_MASK) as usize) << 8) | low as usize;
            if target >= pos {
                return Err(malformed(format!(
                    "compression pointer at offset {} targets offset {}",
                    pos, target
                )));
            }
            hops += 1;
            if hops > MAX_POINTER_HOPS {
                return Err(malformed(format!("too many compression pointers in name at offset {}", offset)));
            }
            if consumed.is_none() {
                consumed = Some(pos + 2 - offset);
            }
            pos = target;
            continue;
        }
        if len & POINTER_MASK != 0 {
            return Err(malformed(format!("unsupported label type {:#04x} at offset {}", len, pos)));
        }

        pos += 1;
        wire_len += len as usize + 1;
        if wire_len > MAX_NAME_LEN {
            return Err(malformed(format!("name at offset {} exceeds {} bytes", offset, MAX_NAME_LEN)));
        }
        if len == 0 {
            break;
        }

        let end = pos + len as usize;
        let label = buf
            .get(pos..end)
            .ok_or_else(|| malformed(format!("label at offset {} runs past end of message", pos - 1)))?;
        if !name.is_empty() {
            name.push('.');
        }
        escape_label(label, &mut name);
        pos = end;
    }

    Ok((name, consumed.unwrap_or_else(|| pos - offset)))
}

//Dots and backslashes inside a label are quoted with a backslash so the
//dotted form stays unambiguous; anything unprintable becomes \DDD.
fn escape_label(label: &[u8], out: &mut String) {
    for &b in label {
        match b {
            b'.' | b'\\' => {
                out.push('\\');
                out.push(b as char);
            }
            0x21..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{:03}", b);
            }
        }
    }
}

fn malformed(msg: String) -> Error {
    Error::MalformedResponse(msg)
}
