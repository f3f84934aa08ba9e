//! DNS wire codec.
//!
//! `decode` turns a datagram into a [`Message`]; `encode` does the reverse.
//! Names are never compressed on output.

use std::net::Ipv4Addr;

use crate::errors::WireError;
use crate::message::{
    DnsName, Header, Message, Opcode, Question, RecordClass, RecordData, RecordType,
    ResourceRecord, ResponseCode,
};
use crate::utils::{read_name, write_name};

/// Size of the fixed header.
pub const HEADER_LEN: usize = 12;

/// Bounds-checked cursor over a received datagram.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        let bytes = self
            .buf
            .get(self.pos..self.pos + n)
            .ok_or(WireError::UnexpectedEnd {
                offset: self.pos,
                needed: n,
                len: self.buf.len(),
            })?;
        self.pos += n;
        Ok(bytes)
    }

    fn u16(&mut self) -> Result<u16, WireError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, WireError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn name(&mut self) -> Result<DnsName, WireError> {
        let (name, end) = read_name(self.buf, self.pos)?;
        self.pos = end;
        Ok(name)
    }
}

/// Parse a raw DNS message.
///
/// # Arguments
/// * `buf` - The received datagram.
///
/// # Returns
/// The decoded message, or the first structural problem found.
pub fn decode(buf: &[u8]) -> Result<Message, WireError> {
    if buf.len() < HEADER_LEN {
        return Err(WireError::HeaderTooShort { len: buf.len() });
    }
    let mut reader = Reader::new(buf);

    let id = reader.u16()?;
    let flags = reader.bytes(2)?;
    let header = Header {
        id,
        is_response: (flags[0] >> 7) == 1,
        opcode: Opcode::new((flags[0] >> 3) & 0x0F),
        authoritative: ((flags[0] >> 2) & 1) == 1,
        truncated: ((flags[0] >> 1) & 1) == 1,
        recursion_desired: (flags[0] & 1) == 1,
        recursion_available: (flags[1] >> 7) == 1,
        response_code: ResponseCode::new(flags[1] & 0x0F),
    };
    let question_count = reader.u16()?;
    let answer_count = reader.u16()?;
    let authority_count = reader.u16()?;
    let additional_count = reader.u16()?;

    // Counts come from the peer, so don't pre-allocate from them.
    let mut questions = Vec::new();
    for _ in 0..question_count {
        let name = reader.name()?;
        let typ = RecordType::new(reader.u16()?);
        let class = RecordClass::new(reader.u16()?);
        questions.push(Question { name, typ, class });
    }

    let answers = read_records(&mut reader, answer_count)?;
    let authorities = read_records(&mut reader, authority_count)?;
    let additionals = read_records(&mut reader, additional_count)?;

    Ok(Message {
        header,
        questions,
        answers,
        authorities,
        additionals,
    })
}

fn read_records(reader: &mut Reader<'_>, count: u16) -> Result<Vec<ResourceRecord>, WireError> {
    let mut records = Vec::new();
    for _ in 0..count {
        records.push(read_record(reader)?);
    }
    Ok(records)
}

fn read_record(reader: &mut Reader<'_>) -> Result<ResourceRecord, WireError> {
    let name = reader.name()?;
    let typ = reader.u16()?;
    let class = RecordClass::new(reader.u16()?);
    let ttl = reader.u32()?;
    let rdlength = usize::from(reader.u16()?);

    let rdata_start = reader.pos;
    let rdata_end = rdata_start + rdlength;
    if rdata_end > reader.buf.len() {
        return Err(WireError::RdataOverrun {
            offset: rdata_start,
            rdlength,
        });
    }

    let data = match RecordType::new(typ) {
        RecordType::A => {
            let b = reader.bytes(rdlength)?;
            if rdlength != 4 {
                return Err(WireError::BadRdata {
                    typ,
                    offset: rdata_start,
                });
            }
            RecordData::A(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
        }
        RecordType::CNAME => {
            // Pointers may reach earlier in the message, but the name itself
            // has to end exactly at the end of the rdata.
            let (target, end) = read_name(&reader.buf[..rdata_end], rdata_start)?;
            if end != rdata_end {
                return Err(WireError::BadRdata {
                    typ,
                    offset: rdata_start,
                });
            }
            reader.pos = rdata_end;
            RecordData::Cname(target)
        }
        _ => RecordData::Unknown {
            typ,
            rdata: reader.bytes(rdlength)?.to_vec(),
        },
    };

    Ok(ResourceRecord {
        name,
        class,
        ttl,
        data,
    })
}

/// Serialize a message.
///
/// Section counts are taken from the lengths of the message's sections. Output
/// is deterministic and uncompressed.
///
/// # Arguments
/// * `message` - The message to encode.
///
/// # Returns
/// The wire bytes, or an error if a section or rdata does not fit a 16-bit length.
pub fn encode(message: &Message) -> Result<Vec<u8>, WireError> {
    let mut out = Vec::with_capacity(512);
    let header = &message.header;

    out.extend_from_slice(&header.id.to_be_bytes());
    out.push(
        (u8::from(header.is_response) << 7)
            | (header.opcode.num() << 3)
            | (u8::from(header.authoritative) << 2)
            | (u8::from(header.truncated) << 1)
            | u8::from(header.recursion_desired),
    );
    out.push((u8::from(header.recursion_available) << 7) | header.response_code.num());
    for len in [
        message.questions.len(),
        message.answers.len(),
        message.authorities.len(),
        message.additionals.len(),
    ] {
        let count = u16::try_from(len).map_err(|_| WireError::TooManyEntries(len))?;
        out.extend_from_slice(&count.to_be_bytes());
    }

    for question in &message.questions {
        write_name(&mut out, &question.name);
        out.extend_from_slice(&question.typ.num().to_be_bytes());
        out.extend_from_slice(&question.class.num().to_be_bytes());
    }

    for record in message
        .answers
        .iter()
        .chain(&message.authorities)
        .chain(&message.additionals)
    {
        write_record(&mut out, record)?;
    }

    Ok(out)
}

fn write_record(out: &mut Vec<u8>, record: &ResourceRecord) -> Result<(), WireError> {
    write_name(out, &record.name);
    out.extend_from_slice(&record.typ().num().to_be_bytes());
    out.extend_from_slice(&record.class.num().to_be_bytes());
    out.extend_from_slice(&record.ttl.to_be_bytes());

    let mut rdata = Vec::new();
    match &record.data {
        RecordData::A(addr) => rdata.extend_from_slice(&addr.octets()),
        RecordData::Cname(target) => write_name(&mut rdata, target),
        RecordData::Unknown { rdata: raw, .. } => rdata.extend_from_slice(raw),
    }
    let rdlength = u16::try_from(rdata.len()).map_err(|_| WireError::RdataTooLong(rdata.len()))?;
    out.extend_from_slice(&rdlength.to_be_bytes());
    out.extend_from_slice(&rdata);
    Ok(())
}
