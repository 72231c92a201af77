pub mod name;
pub mod record;

use std::io::{Cursor, Read, Write};

use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use tracing::{debug, trace, warn};

use self::name::{decode_name, encode_name};
use self::record::{Answer, RecordType};
use crate::error::{Error, Result};

/// Largest message sent or received over UDP.
pub const MAX_PACKET_SIZE: usize = 512;

//QTYPE and QCLASS following the question name
const QUESTION_FIXED_LEN: u64 = 4;

const CLASS_IN: u16 = 1;

//Standard query with the recursion desired bit set
const QUERY_FLAGS: u16 = 0x0100;
const RCODE_MASK: u16 = 0x000F;
const RESPONSE_BIT: u16 = 0x8000;

#[derive(Debug)]
pub struct DnsQuery {
    header: DnsHeader,
    question: QueryQuestion,
}

#[derive(Debug)]
pub struct DnsHeader {
    pub transaction_id: u16,
    pub flags: u16,
    pub question_rr_count: u16,
    pub answer_rr_count: u16,
    pub authority_rr_count: u16,
    pub additional_rr_count: u16,
}

#[derive(Debug)]
struct QueryQuestion {
    name: String,
    qtype: RecordType,
    qclass: u16,
}

#[derive(Debug)]
struct RecordHeader {
    name: String,
    rr_type: RecordType,
    rr_class: u16,
    ttl: u32,
    length: u16,
}

impl DnsQuery {
    /// A recursive IN-class query for `name` with a fresh random id.
    pub fn new(name: &str, qtype: RecordType) -> DnsQuery {
        DnsQuery {
            header: DnsHeader {
                transaction_id: rand::random::<u16>(),
                flags: QUERY_FLAGS,
                question_rr_count: 1,
                answer_rr_count: 0,
                authority_rr_count: 0,
                additional_rr_count: 0,
            },
            question: QueryQuestion {
                name: name.to_string(),
                qtype,
                qclass: CLASS_IN,
            },
        }
    }

    pub fn transaction_id(&self) -> u16 {
        self.header.transaction_id
    }

    pub fn encode_packet(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(MAX_PACKET_SIZE);
        self.header.encode(&mut buffer)?;
        self.question.encode(&mut buffer)?;
        if buffer.len() > MAX_PACKET_SIZE {
            return Err(Error::InvalidArgument(format!(
                "query for \"{}\" exceeds {} bytes",
                self.question.name, MAX_PACKET_SIZE
            )));
        }
        Ok(buffer)
    }
}

impl DnsHeader {
    pub fn parse<R: Read>(rdr: &mut R) -> std::io::Result<DnsHeader> {
        Ok(DnsHeader {
            transaction_id: rdr.read_u16::<NetworkEndian>()?,
            flags: rdr.read_u16::<NetworkEndian>()?,
            question_rr_count: rdr.read_u16::<NetworkEndian>()?,
            answer_rr_count: rdr.read_u16::<NetworkEndian>()?,
            authority_rr_count: rdr.read_u16::<NetworkEndian>()?,
            additional_rr_count: rdr.read_u16::<NetworkEndian>()?,
        })
    }

    fn encode(&self, buffer: &mut Vec<u8>) -> Result<()> {
        buffer.write_u16::<NetworkEndian>(self.transaction_id)?;
        buffer.write_u16::<NetworkEndian>(self.flags)?;
        buffer.write_u16::<NetworkEndian>(self.question_rr_count)?;
        buffer.write_u16::<NetworkEndian>(self.answer_rr_count)?;
        buffer.write_u16::<NetworkEndian>(self.authority_rr_count)?;
        buffer.write_u16::<NetworkEndian>(self.additional_rr_count)?;
        Ok(())
    }

    pub fn rcode(&self) -> u8 {
        (self.flags & RCODE_MASK) as u8
    }

    pub fn is_response(&self) -> bool {
        self.flags & RESPONSE_BIT != 0
    }

    /// Number of records to walk: the answer section, or the authority
    /// section when there are no answers, or else the additional section.
    pub fn record_count(&self) -> u16 {
        [self.answer_rr_count, self.authority_rr_count, self.additional_rr_count]
            .iter()
            .copied()
            .find(|&n| n != 0)
            .unwrap_or(0)
    }
}

impl QueryQuestion {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<()> {
        let encoded_name = encode_name(&self.name)?;
        buffer.write_all(&encoded_name)?;
        buffer.write_u16::<NetworkEndian>(self.qtype.code())?;
        buffer.write_u16::<NetworkEndian>(self.qclass)?;
        Ok(())
    }
}

impl RecordHeader {
    fn parse(rdr: &mut Cursor<&[u8]>) -> Result<RecordHeader> {
        let buf: &[u8] = *rdr.get_ref();
        let (name, len) = decode_name(buf, rdr.position() as usize)?;
        rdr.set_position(rdr.position() + len as u64);
        Ok(RecordHeader {
            name,
            rr_type: RecordType::from(rdr.read_u16::<NetworkEndian>().map_err(truncated)?),
            rr_class: rdr.read_u16::<NetworkEndian>().map_err(truncated)?,
            ttl: rdr.read_u32::<NetworkEndian>().map_err(truncated)?,
            length: rdr.read_u16::<NetworkEndian>().map_err(truncated)?,
        })
    }
}

/// Reads the transaction id of a raw message.
pub fn transaction_id(buf: &[u8]) -> Option<u16> {
    buf.get(..2).map(|id| u16::from_be_bytes([id[0], id[1]]))
}

/// Decodes a response into the entries it carries.
///
/// A non-zero response code is returned as its error. A record that cannot
/// be decoded ends the walk, and the entries gathered up to that record
/// are returned.
pub fn decode_response(buf: &[u8]) -> Result<Answer> {
    let mut rdr = Cursor::new(buf);
    let header = DnsHeader::parse(&mut rdr).map_err(|_| {
        Error::MalformedResponse(format!("response of {} bytes is shorter than a header", buf.len()))
    })?;

    let rcode = header.rcode();
    if rcode != 0 {
        debug!(id = header.transaction_id, rcode, "response carries an error code");
        return Err(Error::from_rcode(rcode));
    }

    let mut answer = Answer::new();
    if let Err(e) = walk_records(&mut rdr, &header, &mut answer) {
        warn!(
            id = header.transaction_id,
            error = %e,
            decoded = answer.len(),
            "record walk aborted"
        );
    }

    debug!(
        id = header.transaction_id,
        answers = header.answer_rr_count,
        authority = header.authority_rr_count,
        additional = header.additional_rr_count,
        record_type = ?answer.record_type(),
        entries = answer.len(),
        "DNS response decoded"
    );
    Ok(answer)
}

fn walk_records(rdr: &mut Cursor<&[u8]>, header: &DnsHeader, answer: &mut Answer) -> Result<()> {
    let buf: &[u8] = *rdr.get_ref();

    //Skip over question section: [ QNAME, QTYPE, QCLASS ]
    if header.question_rr_count > 0 {
        let (_, len) = decode_name(buf, rdr.position() as usize)?;
        rdr.set_position(rdr.position() + len as u64 + QUESTION_FIXED_LEN);
    }

    for _ in 0..header.record_count() {
        let rr = RecordHeader::parse(rdr)?;
        let start = rdr.position() as usize;
        let end = start + rr.length as usize;
        if end > buf.len() {
            return Err(Error::MalformedResponse(format!(
                "record data at offset {} runs {} bytes past end of message",
                start,
                end - buf.len()
            )));
        }
        trace!(
            name = %rr.name,
            rr_type = %rr.rr_type,
            rr_class = rr.rr_class,
            ttl = rr.ttl,
            length = rr.length,
            "record"
        );

        if let Some(entry) = record::extract(buf, rr.rr_type, start..end)? {
            answer.accept(entry);
        }
        rdr.set_position(end as u64);
    }
    Ok(())
}

fn truncated(_: std::io::Error) -> Error {
    Error::MalformedResponse("record header runs past end of message".to_string())
}
