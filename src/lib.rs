//! Barrier-synchronized command/response sessions for SCPI-style test
//! instruments.
//!
//! Instruments such as oscilloscopes execute commands asynchronously: a write
//! returns long before an autoset or a screen capture has finished. Every
//! state-changing command is therefore followed by a completion barrier
//! (`*OPC?`), and the caller blocks, for a bounded time, until the instrument
//! answers it.
//!
//! The library is layered:
//!
//!   * [`backend`]: the bytes, over a serial port or a TCP socket.
//!   * [`channel`]: the synchronized command/response engine.
//!   * [`session`]: the operations of an automated measurement.
//!   * [`sweep`]: stepping through a list of stimulus values.
//!
//! ```rust
//! # use scpisync::{address::OpenResourceOptions, session::InstrumentSession};
//! # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let mut scope = InstrumentSession::open(
//!     OpenResourceOptions::new(),
//!     "TCPIP0::192.168.0.10::5025::SOCKET",
//! )?;
//! scope.reset()?;
//! scope.set_stimulus_frequency(1e6)?;
//! scope.autoset()?;
//! let freq = scope.fetch_numeric_result("MEASUREMENT:MEAS1:RESULTS:CURRENTACQ:MEAN?")?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(all(doc, feature = "doc_cfg"), feature(doc_cfg))]

pub mod address;
pub mod backend;
pub mod channel;
pub mod command;
pub mod error;
pub mod response;
pub mod session;
pub mod sweep;
pub mod timeout_guard;
