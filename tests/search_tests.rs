mod helpers;

use dnsquery::search::search;
use dnsquery::{Entry, Error, RecordType, ResolverConfig};
use helpers::*;
use std::net::Ipv4Addr;

#[test]
fn first_matching_search_domain_wins() {
    let config = config_with_search(&["example.com", "example.org"]);
    let spy = SpyTransport::new(|name, qtype, id| {
        Ok(match name {
            "host.example.org" => ResponseBuilder::new(id, name, qtype)
                .answer(RecordType::A, a([192, 0, 2, 10]))
                .build(),
            _ => nxdomain(id, name, qtype),
        })
    });

    let answer = search(&spy, &config, "host", RecordType::A, 0).unwrap();
    assert_eq!(answer.entries(), &[Entry::Address(Ipv4Addr::new(192, 0, 2, 10))]);
    assert_eq!(
        spy.sent(),
        vec![
            ("host".to_string(), RecordType::A),
            ("host.example.com".to_string(), RecordType::A),
            ("host.example.org".to_string(), RecordType::A),
        ]
    );
}

#[test]
fn later_candidates_are_not_tried_after_a_match() {
    let config = config_with_search(&["example.com", "example.org"]);
    let spy = SpyTransport::new(|name, qtype, id| {
        Ok(ResponseBuilder::new(id, name, qtype)
            .answer(RecordType::A, a([198, 51, 100, 1]))
            .build())
    });

    search(&spy, &config, "host", RecordType::A, 0).unwrap();
    assert_eq!(spy.sent().len(), 1);
}

#[test]
fn reverse_and_authority_lookups_send_one_query() {
    let config = config_with_search(&["a.example", "b.example", "c.example"]);
    for record_type in [RecordType::PTR, RecordType::SOA] {
        let spy = SpyTransport::new(|name, qtype, id| Ok(nxdomain(id, name, qtype)));
        let outcome = search(&spy, &config, "example.net", record_type, 0);
        assert!(matches!(outcome, Err(Error::NameError)));
        assert_eq!(spy.sent().len(), 1);
    }
}

#[test]
fn second_pass_accepts_any_records() {
    let config = config_with_search(&["example.com"]);
    let spy = SpyTransport::new(|name, qtype, id| {
        Ok(match name {
            "host" => ResponseBuilder::new(id, name, qtype)
                .authority(RecordType::SOA, soa("ns.example.net", "admin.example.net"))
                .build(),
            _ => ResponseBuilder::new(id, name, qtype).build(),
        })
    });

    let answer = search(&spy, &config, "host", RecordType::A, 0).unwrap();
    assert_eq!(answer.record_type(), Some(RecordType::SOA));
    assert_eq!(answer.entries(), &[Entry::Authority("ns.example.net".to_string())]);
    //Both candidates in the first pass, then the bare name again
    assert_eq!(spy.sent().len(), 3);
}

#[test]
fn transport_failures_move_on_to_the_next_candidate() {
    let config = config_with_search(&["example.com"]);
    let spy = SpyTransport::new(|name, qtype, id| match name {
        "host" => Err(Error::TransportTimeout),
        _ => Ok(ResponseBuilder::new(id, name, qtype)
            .answer(RecordType::A, a([192, 0, 2, 20]))
            .build()),
    });

    let answer = search(&spy, &config, "host", RecordType::A, 0).unwrap();
    assert_eq!(answer.entries(), &[Entry::Address(Ipv4Addr::new(192, 0, 2, 20))]);
}

#[test]
fn last_candidate_outcome_is_returned() {
    let config = config_with_search(&["example.com"]);
    let spy = SpyTransport::new(|name, qtype, id| match name {
        "host" => Ok(nxdomain(id, name, qtype)),
        _ => Err(Error::SendFailure("network unreachable".to_string())),
    });

    let outcome = search(&spy, &config, "host", RecordType::MX, 0);
    assert!(matches!(outcome, Err(Error::SendFailure(_))));
    assert_eq!(spy.sent().len(), 4);
}

#[test]
fn nested_search_is_refused() {
    let spy = SpyTransport::new(|name, qtype, id| Ok(nxdomain(id, name, qtype)));
    let answer = search(&spy, &ResolverConfig::default(), "host", RecordType::A, 2).unwrap();
    assert!(answer.is_empty());
    assert_eq!(answer.record_type(), None);
    assert!(spy.sent().is_empty());
}

#[test]
fn results_are_capped_at_thirty() {
    let spy = SpyTransport::new(|name, qtype, id| {
        let mut builder = ResponseBuilder::new(id, name, qtype);
        for i in 0..40u8 {
            builder = builder.answer(RecordType::A, a([10, 0, 0, i]));
        }
        Ok(builder.build())
    });

    let answer = search(&spy, &ResolverConfig::default(), "many.example.com", RecordType::A, 0).unwrap();
    assert_eq!(answer.len(), 30);
}

#[test]
fn truncated_response_yields_earlier_records() {
    let spy = SpyTransport::new(|name, qtype, id| {
        let mut response = ResponseBuilder::new(id, name, qtype)
            .answer(RecordType::A, a([192, 0, 2, 1]))
            .answer(RecordType::A, a([192, 0, 2, 2]))
            .answer(RecordType::A, a([192, 0, 2, 3]))
            .build();
        response.truncate(response.len() - 3);
        Ok(response)
    });

    let answer = search(&spy, &ResolverConfig::default(), "www.example.com", RecordType::A, 0).unwrap();
    assert_eq!(
        answer.entries(),
        &[
            Entry::Address(Ipv4Addr::new(192, 0, 2, 1)),
            Entry::Address(Ipv4Addr::new(192, 0, 2, 2)),
        ]
    );
}

#[test]
fn first_record_type_fixes_the_answer() {
    let spy = SpyTransport::new(|name, qtype, id| {
        Ok(ResponseBuilder::new(id, name, qtype)
            .answer(RecordType::NS, domain("ns1.example.com"))
            .answer(RecordType::MX, mx(10, "mail.example.com"))
            .answer(RecordType::A, a([192, 0, 2, 1]))
            .answer(RecordType::MX, mx(20, "backup.example.com"))
            .build())
    });

    let answer = search(&spy, &ResolverConfig::default(), "example.com", RecordType::MX, 0).unwrap();
    assert_eq!(answer.record_type(), Some(RecordType::MX));
    assert_eq!(answer.len(), 2);
}

#[test]
fn compressed_names_point_back_into_the_message() {
    //Question "example.com" sits at 12; the first record's data starts at 41.
    let spy = SpyTransport::new(|name, qtype, id| {
        Ok(ResponseBuilder::new(id, name, qtype)
            .answer(RecordType::PTR, vec![3, b'w', b'w', b'w', 0xC0, 0x0C])
            .answer(RecordType::PTR, vec![4, b'm', b'a', b'i', b'l', 0xC0, 41])
            .build())
    });

    let answer = search(&spy, &ResolverConfig::default(), "example.com", RecordType::PTR, 0).unwrap();
    assert_eq!(
        answer.entries(),
        &[
            Entry::Name("www.example.com".to_string()),
            Entry::Name("mail.www.example.com".to_string()),
        ]
    );
}
