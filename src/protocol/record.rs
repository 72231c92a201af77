use std::fmt;
use std::net::Ipv4Addr;
use std::ops::Range;

use byteorder::{ByteOrder, NetworkEndian};

use super::name::decode_name;
use crate::error::{Error, Result};

/// Max # of entries kept from a single response.
pub const MAX_ENTRIES: usize = 30;

//SOA rdata ends in SERIAL, REFRESH, RETRY, EXPIRE and MINIMUM
const SOA_FIXED_TAIL: usize = 5 * 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    NS,
    SOA,
    PTR,
    HINFO,
    MX,
    Other(u16),
}

impl RecordType {
    pub fn code(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::SOA => 6,
            RecordType::PTR => 12,
            RecordType::HINFO => 13,
            RecordType::MX => 15,
            RecordType::Other(code) => code,
        }
    }
}

impl From<u16> for RecordType {
    fn from(code: u16) -> Self {
        match code {
            1 => RecordType::A,
            2 => RecordType::NS,
            6 => RecordType::SOA,
            12 => RecordType::PTR,
            13 => RecordType::HINFO,
            15 => RecordType::MX,
            other => RecordType::Other(other),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordType::A => f.write_str("A"),
            RecordType::NS => f.write_str("NS"),
            RecordType::SOA => f.write_str("SOA"),
            RecordType::PTR => f.write_str("PTR"),
            RecordType::HINFO => f.write_str("HINFO"),
            RecordType::MX => f.write_str("MX"),
            RecordType::Other(code) => write!(f, "TYPE{}", code),
        }
    }
}

/// CPU and operating system of a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub cpu: String,
    pub os: String,
}

impl HostInfo {
    /// Splits the dotted form produced by the name decoder. The two fields
    /// are separated by the first unescaped dot and real dots are quoted
    /// by a backslash, e.g. `Sun\.OS.unix` is CPU `Sun.OS`, OS `unix`.
    pub fn parse(raw: &str) -> HostInfo {
        let (cpu, rest) = split_unescaped(raw);
        let (os, _) = split_unescaped(rest);
        HostInfo {
            cpu: unescape(cpu),
            os: unescape(os),
        }
    }
}

impl fmt::Display for HostInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.cpu, self.os)
    }
}

fn split_unescaped(s: &str) -> (&str, &str) {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i] != b'.' {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            i += 1;
        }
        i += 1;
    }
    if i < bytes.len() {
        (&s[..i], &s[i + 1..])
    } else {
        (s, "")
    }
}

//Drops every backslash and keeps the character it quotes; \DDD stands
//for the byte with that decimal value.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let digits: String = chars.clone().take(3).take_while(char::is_ascii_digit).collect();
        match digits.parse::<u8>() {
            Ok(byte) if digits.len() == 3 => {
                out.push(byte as char);
                chars.nth(2);
            }
            _ => {
                if let Some(quoted) = chars.next() {
                    out.push(quoted);
                }
            }
        }
    }
    out
}

/// One decoded record payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Address(Ipv4Addr),
    Name(String),
    MailExchanger { exchange: String, priority: u16 },
    HostInfo(HostInfo),
    Authority(String),
}

impl Entry {
    pub fn record_type(&self) -> RecordType {
        match self {
            Entry::Address(_) => RecordType::A,
            Entry::Name(_) => RecordType::PTR,
            Entry::MailExchanger { .. } => RecordType::MX,
            Entry::HostInfo(_) => RecordType::HINFO,
            Entry::Authority(_) => RecordType::SOA,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Entry::Address(addr) => fmt::Display::fmt(addr, f),
            Entry::Name(name) => f.write_str(name),
            Entry::MailExchanger { exchange, priority } => write!(f, "{} {}", exchange, priority),
            Entry::HostInfo(hinfo) => fmt::Display::fmt(hinfo, f),
            Entry::Authority(primary) => f.write_str(primary),
        }
    }
}

/// Entries collected from one response.
///
/// The first accepted entry fixes the record type; later entries of any
/// other type are ignored, as is everything past [`MAX_ENTRIES`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    record_type: Option<RecordType>,
    entries: Vec<Entry>,
}

impl Answer {
    pub fn new() -> Answer {
        Answer::default()
    }

    pub fn record_type(&self) -> Option<RecordType> {
        self.record_type
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if this answer holds at least one entry of `record_type`.
    pub fn answers(&self, record_type: RecordType) -> bool {
        self.record_type == Some(record_type) && !self.entries.is_empty()
    }

    /// Appends `entry` if its type matches the answer's. Returns whether
    /// the entry was kept.
    pub fn accept(&mut self, entry: Entry) -> bool {
        let record_type = entry.record_type();
        if let Some(current) = self.record_type {
            if current != record_type {
                return false;
            }
        }
        self.record_type = Some(record_type);
        if self.entries.len() >= MAX_ENTRIES {
            return false;
        }
        self.entries.push(entry);
        true
    }
}

/// Decodes the payload of one record. `rdata` is the payload's range
/// within `msg`; names inside it may point anywhere earlier in `msg`.
///
/// Returns `None` for record types that never produce an entry.
pub fn extract(msg: &[u8], record_type: RecordType, rdata: Range<usize>) -> Result<Option<Entry>> {
    let start = rdata.start;
    let entry = match record_type {
        RecordType::A => {
            let raw = fixed(msg, &rdata, 4)?;
            Entry::Address(Ipv4Addr::from(NetworkEndian::read_u32(raw)))
        }
        RecordType::PTR => {
            let (name, _) = name_within(msg, &rdata, start)?;
            Entry::Name(name)
        }
        RecordType::MX => {
            let priority = NetworkEndian::read_u16(fixed(msg, &rdata, 2)?);
            let (exchange, _) = name_within(msg, &rdata, start + 2)?;
            Entry::MailExchanger { exchange, priority }
        }
        RecordType::HINFO => {
            //The payload is read as one dotted name; the zero byte
            //terminates it at the end of the payload.
            let mut payload = msg
                .get(rdata.clone())
                .ok_or_else(|| {
                    Error::MalformedResponse(format!("HINFO record at offset {} runs past end of message", start))
                })?
                .to_vec();
            payload.push(0);
            let (raw, _) = decode_name(&payload, 0)?;
            Entry::HostInfo(HostInfo::parse(&raw))
        }
        RecordType::SOA => {
            let (mname, mlen) = name_within(msg, &rdata, start)?;
            let (_rname, rlen) = name_within(msg, &rdata, start + mlen)?;
            if start + mlen + rlen + SOA_FIXED_TAIL > rdata.end {
                return Err(Error::MalformedResponse(format!(
                    "SOA record at offset {} is shorter than its fields",
                    start
                )));
            }
            Entry::Authority(mname)
        }
        RecordType::NS => {
            name_within(msg, &rdata, start)?;
            return Ok(None);
        }
        RecordType::Other(_) => return Ok(None),
    };
    Ok(Some(entry))
}

//A name inside record data must end within the record, though its
//pointers may lead anywhere earlier in the message.
fn name_within(msg: &[u8], rdata: &Range<usize>, at: usize) -> Result<(String, usize)> {
    let (name, len) = decode_name(msg, at)?;
    if at + len > rdata.end {
        return Err(Error::MalformedResponse(format!(
            "name at offset {} runs past record data ending at {}",
            at, rdata.end
        )));
    }
    Ok((name, len))
}

fn fixed<'a>(msg: &'a [u8], rdata: &Range<usize>, len: usize) -> Result<&'a [u8]> {
    if rdata.len() < len {
        return Err(Error::MalformedResponse(format!(
            "record data at offset {} is shorter than {} bytes",
            rdata.start, len
        )));
    }
    msg.get(rdata.start..rdata.start + len).ok_or_else(|| {
        Error::MalformedResponse(format!("record data at offset {} runs past end of message", rdata.start))
    })
}
