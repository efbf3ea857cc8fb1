//! Server error type.

use std::io;
use std::net::AddrParseError;

/// The error type returned by [`Server::serve`](crate::Server::serve).
///
/// Request-level failures never show up here: they are [`Failure`](crate::Failure)s,
/// translated into error pages. This type surfaces infrastructure failures:
/// a bad bind address or a socket that cannot be opened.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid bind address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("io: {0}")]
    Io(#[from] io::Error),
}
