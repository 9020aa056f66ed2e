//! The error type covering everything this library can fail with.

use super::*;

error_enum! {
    /// Any error returned by this library.
    #[derive(Debug)]
    #[non_exhaustive]
    pub enum Error {
        Transport(TransportError),
        Timeout(TimeoutError),
        SessionState(SessionStateError),
        ReservedCharacter(ReservedCharacterError),
        Parse(ParseError),
        BlockMalformed(BlockMalformedError),
        ResourceAddress(ResourceAddressError),
    }

    impl From<SendError> {
        SessionState => SessionState,
        Transport => Transport,
        ReservedCharacter => ReservedCharacter,
    }

    impl From<SyncError> {
        Timeout => Timeout,
        Transport => Transport,
        SessionState => SessionState,
        ReservedCharacter => ReservedCharacter,
    }
}
impl_is_variant! {
    Error {
        Transport,
        Timeout,
        SessionState,
        ReservedCharacter,
        Parse,
        BlockMalformed,
        ResourceAddress,
    }
}

impl From<std::io::Error> for Error {
    fn from(other: std::io::Error) -> Self {
        Error::Transport(other.into())
    }
}

impl Error {
    /// Whether the error leaves the session faulted.
    ///
    /// Transport failures, timeouts, and malformed blocks leave the response
    /// stream in an unknown position, so the session must be reopened.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Timeout(_) | Error::BlockMalformed(_)
        )
    }
}
