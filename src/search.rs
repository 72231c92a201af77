use std::iter;

use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::error::Result;
use crate::protocol::record::{Answer, RecordType};
use crate::protocol::{decode_response, DnsQuery};
use crate::transport::Transport;

/// Deepest nesting of [`search`] that still issues queries.
pub const MAX_DEPTH: u32 = 1;

/// Names to try for `name`: the name itself, then the name with each
/// search domain appended. A name ending in a dot is tried as is.
pub fn candidates<'a>(name: &'a str, config: &'a ResolverConfig) -> impl Iterator<Item = String> + 'a {
    let domains = if name.ends_with('.') {
        &[][..]
    } else {
        config.search_domains()
    };
    iter::once(name.to_string()).chain(domains.iter().map(move |domain| format!("{}.{}", name, domain)))
}

/// Resolves `name` across the search domains.
///
/// The first pass returns the first candidate answering with records of
/// `record_type`. PTR and SOA lookups stop after the bare name. The second
/// pass takes the first candidate answering with anything at all. When both
/// passes come up empty the outcome of the last candidate is returned.
pub fn search<T: Transport>(
    transport: &T,
    config: &ResolverConfig,
    name: &str,
    record_type: RecordType,
    depth: u32,
) -> Result<Answer> {
    if depth > MAX_DEPTH {
        warn!(qname = %name, depth, "search nested too deeply");
        return Ok(Answer::new());
    }

    let bare_only = matches!(record_type, RecordType::PTR | RecordType::SOA);
    let mut last = Ok(Answer::new());

    for candidate in candidates(name, config) {
        let outcome = query(transport, config, &candidate, record_type);
        if bare_only || matches!(&outcome, Ok(answer) if answer.answers(record_type)) {
            return outcome;
        }
        last = outcome;
    }

    debug!(qname = %name, %record_type, "no exact answer, accepting any records");
    for candidate in candidates(name, config) {
        let outcome = query(transport, config, &candidate, record_type);
        if matches!(&outcome, Ok(answer) if !answer.is_empty()) {
            return outcome;
        }
        last = outcome;
    }
    last
}

/// Sends one query for `name` and decodes the response.
pub fn query<T: Transport>(
    transport: &T,
    config: &ResolverConfig,
    name: &str,
    record_type: RecordType,
) -> Result<Answer> {
    let query = DnsQuery::new(name, record_type);
    let packet = query.encode_packet()?;
    debug!(qname = %name, %record_type, id = query.transaction_id(), "querying");

    let outcome = transport.send(&packet, config).and_then(|response| decode_response(&response));
    if let Err(e) = &outcome {
        debug!(qname = %name, %record_type, error = %e, "query failed");
    }
    outcome
}
