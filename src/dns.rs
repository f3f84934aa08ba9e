//! Query resolution.
//!
//! This module turns a decoded query into a response using the zone store,
//! and wires decode, resolve and encode together for a single datagram.

use log::debug;

use crate::codec::{decode, encode};
use crate::errors::DnsError;
use crate::message::{
    Header, Message, Opcode, RecordClass, RecordType, ResourceRecord, ResponseCode,
};
use crate::zone::{Lookup, ZoneStore};

/// How a query was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// NOERROR with one answer.
    Answered,
    /// NXDOMAIN.
    NameNotFound,
    /// NOERROR with no answers (NODATA).
    TypeNotFound,
    /// FORMERR or NOTIMP; the query was outside what this server handles.
    Rejected,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Answered => "answered",
            Outcome::NameNotFound => "nxdomain",
            Outcome::TypeNotFound => "nodata",
            Outcome::Rejected => "rejected",
        }
    }
}

/// A response together with the outcome that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub response: Message,
    pub outcome: Outcome,
}

/// Resolve a query against the zone.
///
/// Only the first question is answered; every question is echoed back.
///
/// # Arguments
/// * `query` - The decoded query.
/// * `zone` - The zone this server is authoritative for.
///
/// # Returns
/// The response message and how the query was classified.
pub fn resolve(query: &Message, zone: &ZoneStore) -> Resolution {
    let question = match query.questions.first() {
        Some(question) => question,
        None => return reject(query, ResponseCode::FormatError),
    };
    if query.header.opcode != Opcode::Query {
        return reject(query, ResponseCode::NotImplemented);
    }

    // The zone only holds class IN data.
    if !matches!(question.class, RecordClass::IN | RecordClass::ANY) {
        return Resolution {
            response: build_response(query, ResponseCode::NameError, Vec::new()),
            outcome: Outcome::NameNotFound,
        };
    }

    match zone.lookup(&question.name, question.typ) {
        Lookup::Found(record) => Resolution {
            response: build_response(
                query,
                ResponseCode::NoError,
                vec![record.to_resource_record(&question.name)],
            ),
            outcome: Outcome::Answered,
        },
        // An alias answers every type; its target is left to the client.
        Lookup::TypeMismatch(record) if record.typ() == RecordType::CNAME => Resolution {
            response: build_response(
                query,
                ResponseCode::NoError,
                vec![record.to_resource_record(&question.name)],
            ),
            outcome: Outcome::Answered,
        },
        Lookup::TypeMismatch(_) => Resolution {
            response: build_response(query, ResponseCode::NoError, Vec::new()),
            outcome: Outcome::TypeNotFound,
        },
        Lookup::NotFound => Resolution {
            response: build_response(query, ResponseCode::NameError, Vec::new()),
            outcome: Outcome::NameNotFound,
        },
    }
}

fn reject(query: &Message, response_code: ResponseCode) -> Resolution {
    Resolution {
        response: build_response(query, response_code, Vec::new()),
        outcome: Outcome::Rejected,
    }
}

/// Build a response to `query`.
///
/// Id, opcode, RD and the question section are copied from the query. AA is
/// always set and RA always clear.
fn build_response(
    query: &Message,
    response_code: ResponseCode,
    answers: Vec<ResourceRecord>,
) -> Message {
    Message {
        header: Header {
            id: query.header.id,
            is_response: true,
            opcode: query.header.opcode,
            authoritative: true,
            truncated: false,
            recursion_desired: query.header.recursion_desired,
            recursion_available: false,
            response_code,
        },
        questions: query.questions.clone(),
        answers,
        authorities: Vec::new(),
        additionals: Vec::new(),
    }
}

/// Handle one datagram end to end.
///
/// # Arguments
/// * `datagram` - The bytes received from the client.
/// * `zone` - The zone this server is authoritative for.
///
/// # Returns
/// The encoded response. Any error means no reply should be sent:
/// `Malformed` and `NotAQuery` for packets to drop, `Encode` if the response
/// could not be serialized.
pub fn process_datagram(datagram: &[u8], zone: &ZoneStore) -> Result<Vec<u8>, DnsError> {
    let query = decode(datagram)?;
    if query.header.is_response {
        return Err(DnsError::NotAQuery);
    }

    let Resolution { response, outcome } = resolve(&query, zone);
    if let Some(question) = query.questions.first() {
        debug!(
            "query id={} {} {:?}: {:?}",
            query.header.id,
            question.name,
            question.typ,
            outcome
        );
    }
    metrics::increment_counter!("dns_queries_total", "outcome" => outcome.as_str());

    encode(&response).map_err(DnsError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{DnsName, Question, RecordData};
    use crate::zone::ZoneRecord;
    use std::net::Ipv4Addr;

    fn zone() -> ZoneStore {
        ZoneStore::new([
            ZoneRecord::parse("ksaquib.surge.sh", "A", "1.2.3.4", 3600).unwrap(),
            ZoneRecord::parse("blog.ksaquib.dev", "CNAME", "saquib.com", 3600).unwrap(),
        ])
        .unwrap()
    }

    fn query(name: &str, typ: RecordType) -> Message {
        let mut query = Message::query(
            0xBEEF,
            Question::new(DnsName::parse(name).unwrap(), typ),
        );
        query.header.recursion_desired = true;
        query
    }

    fn assert_response_header(query: &Message, response: &Message, code: ResponseCode) {
        assert_eq!(response.header.id, query.header.id);
        assert!(response.header.is_response);
        assert!(response.header.authoritative);
        assert!(!response.header.recursion_available);
        assert!(!response.header.truncated);
        assert_eq!(response.header.response_code, code);
        assert_eq!(response.questions, query.questions);
        assert!(response.authorities.is_empty());
        assert!(response.additionals.is_empty());
    }

    #[test]
    fn test_answered_a() {
        let query = query("ksaquib.surge.sh", RecordType::A);
        let Resolution { response, outcome } = resolve(&query, &zone());
        assert_eq!(outcome, Outcome::Answered);
        assert_response_header(&query, &response, ResponseCode::NoError);
        assert!(response.header.recursion_desired);
        assert_eq!(response.answers.len(), 1);
        let answer = &response.answers[0];
        assert_eq!(answer.name, query.questions[0].name);
        assert_eq!(answer.ttl, 3600);
        assert_eq!(answer.data, RecordData::A(Ipv4Addr::new(1, 2, 3, 4)));
    }

    #[test]
    fn test_cname_not_chased() {
        let query = query("blog.ksaquib.dev", RecordType::CNAME);
        let Resolution { response, outcome } = resolve(&query, &zone());
        assert_eq!(outcome, Outcome::Answered);
        assert_eq!(
            response.answers[0].data,
            RecordData::Cname(DnsName::parse("saquib.com").unwrap())
        );
        assert_eq!(response.answers.len(), 1);
    }

    #[test]
    fn test_cname_answers_other_types() {
        for typ in [RecordType::A, RecordType::AAAA, RecordType::MX] {
            let query = query("blog.ksaquib.dev", typ);
            let Resolution { response, outcome } = resolve(&query, &zone());
            assert_eq!(outcome, Outcome::Answered);
            assert_response_header(&query, &response, ResponseCode::NoError);
            assert_eq!(response.answers.len(), 1);
            assert_eq!(response.answers[0].typ(), RecordType::CNAME);
        }
    }

    #[test]
    fn test_nodata() {
        let query = query("ksaquib.surge.sh", RecordType::CNAME);
        let Resolution { response, outcome } = resolve(&query, &zone());
        assert_eq!(outcome, Outcome::TypeNotFound);
        assert_response_header(&query, &response, ResponseCode::NoError);
        assert!(response.answers.is_empty());
    }

    #[test]
    fn test_nxdomain() {
        let query = query("unknown.example.com", RecordType::A);
        let Resolution { response, outcome } = resolve(&query, &zone());
        assert_eq!(outcome, Outcome::NameNotFound);
        assert_response_header(&query, &response, ResponseCode::NameError);
        assert!(response.answers.is_empty());
    }

    #[test]
    fn test_no_questions_is_formerr() {
        let mut query = query("ksaquib.surge.sh", RecordType::A);
        query.questions.clear();
        let Resolution { response, outcome } = resolve(&query, &zone());
        assert_eq!(outcome, Outcome::Rejected);
        assert_response_header(&query, &response, ResponseCode::FormatError);
        assert!(response.answers.is_empty());
    }

    #[test]
    fn test_other_opcode_is_notimp() {
        let mut query = query("ksaquib.surge.sh", RecordType::A);
        query.header.opcode = Opcode::Status;
        let Resolution { response, outcome } = resolve(&query, &zone());
        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(response.header.opcode, Opcode::Status);
        assert_response_header(&query, &response, ResponseCode::NotImplemented);
    }

    #[test]
    fn test_only_first_question_answered() {
        let mut query = query("unknown.example.com", RecordType::A);
        query.questions.push(Question::new(
            DnsName::parse("ksaquib.surge.sh").unwrap(),
            RecordType::A,
        ));
        let Resolution { response, outcome } = resolve(&query, &zone());
        assert_eq!(outcome, Outcome::NameNotFound);
        assert_eq!(response.questions.len(), 2);
        assert!(response.answers.is_empty());
    }

    #[test]
    fn test_non_in_class() {
        let mut query = query("ksaquib.surge.sh", RecordType::A);
        query.questions[0].class = RecordClass::Unknown(3);
        let Resolution { response, outcome } = resolve(&query, &zone());
        assert_eq!(outcome, Outcome::NameNotFound);
        assert_eq!(response.questions[0].class, RecordClass::Unknown(3));
    }

    #[test]
    fn test_process_datagram_drops_garbage() {
        let zone = zone();
        assert!(matches!(
            process_datagram(&[0, 1, 2, 3, 4], &zone),
            Err(DnsError::Malformed(_))
        ));
    }

    #[test]
    fn test_process_datagram_drops_responses() {
        let mut message = query("ksaquib.surge.sh", RecordType::A);
        message.header.is_response = true;
        let bytes = encode(&message).unwrap();
        assert!(matches!(
            process_datagram(&bytes, &zone()),
            Err(DnsError::NotAQuery)
        ));
    }

    #[test]
    fn test_process_datagram_is_idempotent() {
        let zone = zone();
        let bytes = encode(&query("ksaquib.surge.sh", RecordType::A)).unwrap();
        let first = process_datagram(&bytes, &zone).unwrap();
        let second = process_datagram(&bytes, &zone).unwrap();
        assert_eq!(first, second);
        assert_eq!(&first[..2], &[0xBE, 0xEF]);
    }
}
