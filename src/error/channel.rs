//! Error types raised while exchanging commands and responses on a channel.

use super::{TimeoutError, TransportError};
use crate::channel::SessionState;

/// An operation was attempted on a session that is closed or faulted.
///
/// A faulted session must be reopened before it can be used again; the
/// reason it faulted is available via [`reason`](SessionStateError::reason).
#[derive(Debug, PartialEq, Eq)]
pub struct SessionStateError(Box<(SessionState, Option<String>)>);

impl SessionStateError {
    /// Create a new `SessionStateError`.
    pub(crate) fn new(state: SessionState, reason: Option<&str>) -> Self {
        SessionStateError(Box::new((state, reason.map(ToString::to_string))))
    }

    /// The state the session was in.
    pub fn state(&self) -> SessionState {
        self.0 .0
    }

    /// Why the session faulted, if it is faulted.
    pub fn reason(&self) -> Option<&str> {
        self.0 .1.as_deref()
    }
}

impl_error_display! {
    SessionStateError,
    self => "the session is {}{}",
    self.0.0,
    self.0.1.as_ref().map_or_else(String::new, |reason| format!(" ({reason})"))
}

/// A response that should have been a number was not.
///
/// This is not a link failure, so the session remains usable.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ParseError(Box<str>);

impl ParseError {
    /// Create a new `ParseError` for the offending response text.
    pub(crate) fn new(text: &str) -> Self {
        ParseError(text.into())
    }

    /// The response text that could not be parsed.
    pub fn text(&self) -> &str {
        &self.0
    }
}

impl_error_display! {
    ParseError,
    self => "response is not a finite number: {:?}", self.0
}

/// The text of a command contains a character that cannot be sent.
///
/// Line terminators would split one command into two, so they are rejected
/// before anything is written. Quotes are rejected where the text is embedded
/// in a quoted string argument.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ReservedCharacterError(Box<(String, char)>);

impl ReservedCharacterError {
    /// Create a new `ReservedCharacterError`.
    pub(crate) fn new(text: &str, reserved: char) -> Self {
        ReservedCharacterError(Box::new((text.to_string(), reserved)))
    }

    /// The rejected text.
    pub fn text(&self) -> &str {
        &self.0 .0
    }

    /// The offending character.
    pub fn reserved(&self) -> char {
        self.0 .1
    }
}

impl_error_display! {
    ReservedCharacterError,
    self => "command contains a reserved character ({:?}): {:?}", self.0.1, self.0.0
}

/// A block response did not start with a valid `#<n><length>` header.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct BlockMalformedError(Box<[u8]>);

impl BlockMalformedError {
    /// Create a new `BlockMalformedError` from the bytes read so far.
    pub(crate) fn new<R: AsRef<[u8]>>(bytes: R) -> Self {
        BlockMalformedError(Box::from(bytes.as_ref()))
    }

    /// Get the bytes of the malformed header.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl_error_display! {
    BlockMalformedError,
    self => "malformed block header: {}", String::from_utf8_lossy(&self.0)
}

/// An instrument resource address could not be understood.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ResourceAddressError(Box<str>);

impl ResourceAddressError {
    /// Create a new `ResourceAddressError`.
    pub(crate) fn new(address: &str) -> Self {
        ResourceAddressError(address.into())
    }

    /// The address that could not be parsed.
    pub fn address(&self) -> &str {
        &self.0
    }
}

impl_error_display! {
    ResourceAddressError,
    self => "unrecognized resource address: {:?}", self.0
}

error_enum! {
    /// Any error returned when writing a command.
    #[derive(Debug)]
    #[non_exhaustive]
    pub enum SendError {
        SessionState(SessionStateError),
        Transport(TransportError),
        ReservedCharacter(ReservedCharacterError),
    }
}
impl_is_variant! { SendError { SessionState, Transport, ReservedCharacter } }

error_enum! {
    /// Any error returned when a command must be answered, such as when
    /// awaiting a completion barrier or a query's response.
    #[derive(Debug)]
    #[non_exhaustive]
    pub enum SyncError {
        Timeout(TimeoutError),
        Transport(TransportError),
        SessionState(SessionStateError),
        ReservedCharacter(ReservedCharacterError),
    }

    impl From<SendError> {
        SessionState => SessionState,
        Transport => Transport,
        ReservedCharacter => ReservedCharacter,
    }
}
impl_is_variant! { SyncError { Timeout, Transport, SessionState, ReservedCharacter } }

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn session_state_display() {
        let err = SessionStateError::new(SessionState::Faulted, Some("link dropped"));
        assert_eq!(err.to_string(), "the session is faulted (link dropped)");
        let err = SessionStateError::new(SessionState::Closed, None);
        assert_eq!(err.to_string(), "the session is closed");
    }

    #[test]
    fn send_error_converts_into_sync_error() {
        let err: SyncError = SendError::from(ReservedCharacterError::new("*RST\n", '\n')).into();
        assert!(err.is_reserved_character());
        let err = ReservedCharacterError::try_from(err).unwrap();
        assert_eq!(err.reserved(), '\n');

        let err = SyncError::from(TimeoutError::new("*OPC?", None));
        assert!(SendError::try_from(err).is_err());
    }
}
