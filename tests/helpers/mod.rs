#![allow(dead_code)]

use std::cell::RefCell;

use dnsquery::protocol::name::{decode_name, encode_name};
use dnsquery::protocol::transaction_id;
use dnsquery::{RecordType, ResolverConfig, Result, Transport};

type Handler = Box<dyn Fn(&str, RecordType, u16) -> Result<Vec<u8>>>;

/// Records every query it is handed and answers from a closure.
pub struct SpyTransport {
    handler: Handler,
    sent: RefCell<Vec<(String, RecordType)>>,
}

impl SpyTransport {
    pub fn new<F>(handler: F) -> SpyTransport
    where
        F: Fn(&str, RecordType, u16) -> Result<Vec<u8>> + 'static,
    {
        SpyTransport {
            handler: Box::new(handler),
            sent: RefCell::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, RecordType)> {
        self.sent.borrow().clone()
    }

    pub fn sent_of(&self, record_type: RecordType) -> usize {
        self.sent.borrow().iter().filter(|(_, t)| *t == record_type).count()
    }
}

impl Transport for SpyTransport {
    fn send(&self, query: &[u8], _config: &ResolverConfig) -> Result<Vec<u8>> {
        let (name, len) = decode_name(query, 12).unwrap();
        let qtype = RecordType::from(u16::from_be_bytes([query[12 + len], query[13 + len]]));
        self.sent.borrow_mut().push((name.clone(), qtype));
        (self.handler)(&name, qtype, transaction_id(query).unwrap())
    }
}

/// Builds wire-format responses; record owners point at the question name.
pub struct ResponseBuilder {
    id: u16,
    rcode: u8,
    name: String,
    qtype: RecordType,
    answers: Vec<(RecordType, Vec<u8>)>,
    authority: Vec<(RecordType, Vec<u8>)>,
}

impl ResponseBuilder {
    pub fn new(id: u16, name: &str, qtype: RecordType) -> ResponseBuilder {
        ResponseBuilder {
            id,
            rcode: 0,
            name: name.to_string(),
            qtype,
            answers: Vec::new(),
            authority: Vec::new(),
        }
    }

    pub fn rcode(mut self, rcode: u8) -> Self {
        self.rcode = rcode;
        self
    }

    pub fn answer(mut self, record_type: RecordType, rdata: Vec<u8>) -> Self {
        self.answers.push((record_type, rdata));
        self
    }

    pub fn authority(mut self, record_type: RecordType, rdata: Vec<u8>) -> Self {
        self.authority.push((record_type, rdata));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let flags = 0x8180 | self.rcode as u16;
        let mut buf = vec![];
        for field in [
            self.id,
            flags,
            1,
            self.answers.len() as u16,
            self.authority.len() as u16,
            0,
        ] {
            buf.extend_from_slice(&field.to_be_bytes());
        }
        buf.extend_from_slice(&encode_name(&self.name).unwrap());
        buf.extend_from_slice(&self.qtype.code().to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes());

        for (record_type, rdata) in self.answers.iter().chain(self.authority.iter()) {
            buf.extend_from_slice(&[0xC0, 0x0C]);
            buf.extend_from_slice(&record_type.code().to_be_bytes());
            buf.extend_from_slice(&1u16.to_be_bytes());
            buf.extend_from_slice(&3600u32.to_be_bytes());
            buf.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
            buf.extend_from_slice(rdata);
        }
        buf
    }
}

pub fn nxdomain(id: u16, name: &str, qtype: RecordType) -> Vec<u8> {
    ResponseBuilder::new(id, name, qtype).rcode(3).build()
}

pub fn a(addr: [u8; 4]) -> Vec<u8> {
    addr.to_vec()
}

pub fn domain(name: &str) -> Vec<u8> {
    encode_name(name).unwrap()
}

pub fn mx(priority: u16, exchange: &str) -> Vec<u8> {
    let mut rdata = priority.to_be_bytes().to_vec();
    rdata.extend_from_slice(&domain(exchange));
    rdata
}

pub fn soa(mname: &str, rname: &str) -> Vec<u8> {
    let mut rdata = domain(mname);
    rdata.extend_from_slice(&domain(rname));
    for field in [2024010101u32, 7200, 3600, 1209600, 300] {
        rdata.extend_from_slice(&field.to_be_bytes());
    }
    rdata
}

pub fn hinfo(cpu: &str, os: &str) -> Vec<u8> {
    let mut rdata = vec![cpu.len() as u8];
    rdata.extend_from_slice(cpu.as_bytes());
    rdata.push(os.len() as u8);
    rdata.extend_from_slice(os.as_bytes());
    rdata
}

pub fn config_with_search(domains: &[&str]) -> ResolverConfig {
    let mut config = ResolverConfig::default();
    config
        .set_search_domains(domains.iter().map(|d| d.to_string()).collect())
        .unwrap();
    config
}
