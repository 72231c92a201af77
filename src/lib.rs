//! A small DNS query engine: builds queries, decodes responses, and walks
//! the configured search domains.

pub mod config;
pub mod error;
pub mod lookup;
pub mod protocol;
pub mod search;
pub mod transport;

pub use config::ResolverConfig;
pub use error::{Error, Result};
pub use lookup::Resolver;
pub use protocol::record::{Answer, Entry, HostInfo, RecordType};
pub use transport::{Transport, UdpTransport};
