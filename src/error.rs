//! Error types.
//!
//! Each error is represented by a unique type that implements [`std::error::Error`].
//! However, most APIs can fail in more than one way and so return one of the
//! higher level [enums](#enums), such as [`SendError`], [`SyncError`], or
//! [`Error`]. Where appropriate, the error types are convertible to the
//! higher level enums, allowing them to be used with `?`:
//!
//! ```
//! use scpisync::error::{Error, SyncError};
//!
//! fn foo() -> Result<(), SyncError> {
//!     // ...
//! # unimplemented!();
//! }
//!
//! fn bar() -> Result<(), Error> {
//!     foo()?;
//!     // ...
//! # Ok(())
//! }
//! ```
//!
//! The enums can also be narrowed back down to the concrete error with
//! [`TryFrom`]:
//!
//! ```
//! # use scpisync::error::{Error, TimeoutError};
//! # fn wrapper(error: Error) {
//! if let Ok(timeout) = TimeoutError::try_from(error) {
//!     println!("gave up waiting on `{}`", timeout.command());
//! }
//! # }
//! ```

use std::{io, time::Duration};

/// Implement Error and Display traits for the specified type.
///
/// After the type define the format string and any arguments it should
/// reference after `self =>` (to abide by macro hygiene rules).
macro_rules! impl_error_display {
    (
        $name:path,
        $self:ident =>
        $display:literal
        $(,
            $($arg:expr),+
        )?
    ) => {
        impl std::error::Error for $name {}

        impl std::fmt::Display for $name {
            fn fmt(&$self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    $display
                    $(,
                        $($arg),+
                    )?
                )
            }
        }
    };
}

/// Implement an `is_<variant>()` predicate for every variant of an error enum.
macro_rules! impl_is_variant {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        paste::paste! {
            impl $name {
                $(
                    #[doc = "Whether this is a [`" $name "::" $variant "`] error."]
                    pub fn [< is_ $variant:snake >](&self) -> bool {
                        matches!(self, $name::$variant(_))
                    }
                )+
            }
        }
    };
}

/// Define error enums that contain concrete error types (not other error enums).
///
/// From and TryFrom traits will be implemented for the enum and its underlying
/// errors. The enum's Display implementation will defer to the underlying errors'
/// Display implementations.
///
/// Simple implementations of From and TryFrom with other error enums can be
/// added by appending a succinct impl block, which assumes that:
///   * it is being implemented for this error enum,
///   * each variant has a single tuple value, and can be converted to the value
///     in this enum with its own From implementation.
///
/// ```compile_fail
/// # // This fails to compile because the macro is not exported.
/// error_enum!{
///     // This defines the enum and From/TryFrom between ThisError and A and B.
///     #[non_exhaustive]
///     pub enum ThisError {
///         VariantA(A),
///         VariantB(B),
///         // ...
///     }
///
///     // This implements a simple From/TryFrom between ThisError and OtherType.
///     impl From<OtherType> {
///         FromVariantA => VariantA,
///         // ...
///     }
/// }
/// ```
macro_rules! error_enum {
    (
        $(#[$attr:meta])*
        pub enum $name:ident {
            $(
                $variant:ident($inner:path)
            ),+
            $(,)?
        }
        // Additional information for From/TryFrom impl blocks.
        $(
            impl From<$from_t:ident>
            {
                $($from_variant:ident => $to_variant:ident),+
                $(,)?
            }
        )*
    ) => {
        // Define the error enum itself
        $(
            #[$attr]
        )*
        #[allow(missing_docs)]
        pub enum $name {
            $(
                $variant($inner)
            ),+
        }

        impl std::error::Error for $name {}

        // Defer the display to the inner error type
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        $name::$variant(e) => e.fmt(f)
                    ),+
                }
            }
        }

        // Allow the enum to be convertible from an infallible error
        impl From<std::convert::Infallible> for $name {
            fn from(_: std::convert::Infallible) -> Self {
                unreachable!();
            }
        }

        // Conversions with underlying errors
        $(
            impl From<$inner> for $name {
                fn from(other: $inner) -> Self {
                    $name::$variant(other)
                }
            }

            impl TryFrom<$name> for $inner {
                type Error = $name;
                fn try_from(other: $name) -> Result<Self, Self::Error> {
                    match other {
                        $name::$variant(value) => Ok(value),
                        #[allow(unreachable_patterns)]
                        value => Err(value)
                    }
                }
            }
        )+

        // Conversions from other enum errors
        $(
            impl From<$from_t> for $name {
                fn from(other: $from_t) -> Self {
                    match other {
                        $($from_t::$from_variant(e) => $name::$to_variant(From::from(e))),+
                    }
                }
            }

            impl TryFrom<$name> for $from_t {
                type Error = $name;
                fn try_from(other: $name) -> Result<Self, Self::Error> {
                    match other {
                        $(
                            $name::$to_variant(e) => Ok($from_t::$from_variant(From::from(e)))
                        ),+
                        ,
                        #[allow(unreachable_patterns)]
                        _ => Err(other)
                    }
                }

            }
        )*
    };
}

mod all;
mod channel;
mod sweep;
pub use all::*;
pub use channel::*;
pub use sweep::*;

/// The link to the instrument failed.
///
/// This covers failing to open the link (e.g., the connection was refused or
/// the serial device does not exist) as well as the link dropping while it was
/// in use. A transport error on an open session faults the session.
#[derive(Debug)]
pub struct TransportError(io::Error);

impl TransportError {
    /// Get the kind of the underlying I/O error.
    pub fn kind(&self) -> io::ErrorKind {
        self.0.kind()
    }

    /// Get the underlying I/O error.
    pub fn io(&self) -> &io::Error {
        &self.0
    }
}

impl_error_display! {
    TransportError,
    self => "transport failure: {}", self.0
}

impl From<io::Error> for TransportError {
    fn from(other: io::Error) -> Self {
        TransportError(other)
    }
}

impl From<TransportError> for io::Error {
    fn from(other: TransportError) -> Self {
        other.0
    }
}

impl From<serialport::Error> for TransportError {
    fn from(other: serialport::Error) -> Self {
        let kind = match other.kind() {
            serialport::ErrorKind::NoDevice => io::ErrorKind::NotFound,
            serialport::ErrorKind::InvalidInput => io::ErrorKind::InvalidInput,
            serialport::ErrorKind::Unknown => io::ErrorKind::Other,
            serialport::ErrorKind::Io(kind) => kind,
        };
        TransportError(io::Error::new(kind, other.description))
    }
}

/// No response arrived within the allotted time.
///
/// The session is faulted when this happens: the instrument may still answer
/// later, and that late answer would be mistaken for the reply to the next
/// command.
#[derive(Debug)]
pub struct TimeoutError(Box<(String, Option<Duration>)>);

impl TimeoutError {
    /// Create a new `TimeoutError` for the named command.
    pub(crate) fn new<S: Into<String>>(command: S, timeout: Option<Duration>) -> Self {
        TimeoutError(Box::new((command.into(), timeout)))
    }

    /// The command whose response never arrived.
    pub fn command(&self) -> &str {
        &self.0 .0
    }

    /// How long the read waited, if known.
    pub fn timeout(&self) -> Option<Duration> {
        self.0 .1
    }
}

impl_error_display! {
    TimeoutError,
    self => "no response to `{}` within {}",
    self.0.0,
    self.0.1.map_or_else(|| "the read timeout".to_string(), |t| format!("{t:?}"))
}
