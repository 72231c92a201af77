use thiserror::Error;

use crate::protocol::record::RecordType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("format error")]
    FormatError,

    #[error("server failure")]
    ServerFailure,

    #[error("non existent domain")]
    NameError,

    #[error("not implemented")]
    NotImplemented,

    #[error("query refused")]
    Refused,

    #[error("unknown error {0}")]
    UnknownServerError(u8),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("timeout waiting for a response from any name server")]
    TransportTimeout,

    #[error("cannot send query: {0}")]
    SendFailure(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("no {record_type} records for \"{name}\"")]
    NoRecords { name: String, record_type: RecordType },

    #[error("cannot reverse lookup \"{address}\"")]
    ReverseLookup {
        address: String,
        #[source]
        source: Box<Error>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Maps a non-zero header response code to its error.
    pub fn from_rcode(rcode: u8) -> Error {
        match rcode {
            1 => Error::FormatError,
            2 => Error::ServerFailure,
            3 => Error::NameError,
            4 => Error::NotImplemented,
            5 => Error::Refused,
            other => Error::UnknownServerError(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rcode_messages() {
        assert_eq!(Error::from_rcode(1).to_string(), "format error");
        assert_eq!(Error::from_rcode(3).to_string(), "non existent domain");
        assert_eq!(Error::from_rcode(5).to_string(), "query refused");
        assert_eq!(Error::from_rcode(9).to_string(), "unknown error 9");
    }
}
