//! A session with one instrument.
//!
//! An [`InstrumentSession`] drives an instrument through the handful of
//! operations an automated measurement needs: reset, configuring measurements,
//! autoset, setting the stimulus, capturing the screen, and fetching results.
//! Every operation that changes the instrument's state waits on a completion
//! barrier before it returns, so the next operation always sees its effect.
//!
//! ```rust
//! # use scpisync::{channel::OpenTcpOptions, session::InstrumentSession};
//! # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
//! let mut scope = InstrumentSession::open(OpenTcpOptions::new(), "192.168.0.10:5025")?;
//! println!("connected to {}", scope.identity());
//! scope.reset()?;
//! scope.configure_measurement(1, "FREQUENCY", "CH1")?;
//! scope.autoset()?;
//! scope.force_capture("E:/test.png")?;
//! scope.close()?;
//! # Ok(())
//! # }
//! ```

mod vocabulary;

pub use vocabulary::Vocabulary;

use crate::{
	address::OpenResourceOptions,
	backend::{Backend, Serial},
	channel::{Channel, OpenSerialOptions, OpenTcpOptions, SessionState},
	error::{Error, ReservedCharacterError, SyncError, TransportError},
	response::parse_numeric,
};
use std::{net::TcpStream, time::Duration};

/// The default amount of time to wait on a completion barrier: 10 seconds.
pub const DEFAULT_BARRIER_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can open a [`Channel`] to an address.
///
/// It is implemented for the channel options types, so a session opened with
/// them can be reopened with the same options, and for closures, which is
/// handy for tests:
///
/// ```rust
/// # use scpisync::{channel::OpenTcpOptions, session::InstrumentSession};
/// # use std::time::Duration;
/// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
/// let connect = |address: &str| {
///     log::info!("connecting to {address}");
///     OpenTcpOptions::new()
///         .timeout(Duration::from_secs(1))
///         .open(address)
/// };
/// let session = InstrumentSession::open(connect, "192.168.0.10:5025")?;
/// # Ok(())
/// # }
/// ```
pub trait Connect<'a> {
	/// The type of backend the channel uses.
	type Backend: Backend;

	/// Open a channel to `address`.
	fn connect(&mut self, address: &str) -> Result<Channel<'a, Self::Backend>, Error>;
}

impl<'a> Connect<'a> for OpenSerialOptions {
	type Backend = Serial;

	fn connect(&mut self, address: &str) -> Result<Channel<'a, Serial>, Error> {
		Ok(self.open(address)?)
	}
}

impl<'a> Connect<'a> for OpenTcpOptions {
	type Backend = TcpStream;

	fn connect(&mut self, address: &str) -> Result<Channel<'a, TcpStream>, Error> {
		Ok(self.open(address)?)
	}
}

impl<'a> Connect<'a> for OpenResourceOptions {
	type Backend = Box<dyn Backend>;

	fn connect(&mut self, address: &str) -> Result<Channel<'a, Box<dyn Backend>>, Error> {
		self.open(address)
	}
}

impl<'a, F, B, E> Connect<'a> for F
where
	F: FnMut(&str) -> Result<Channel<'a, B>, E>,
	B: Backend,
	E: Into<Error>,
{
	type Backend = B;

	fn connect(&mut self, address: &str) -> Result<Channel<'a, B>, Error> {
		(self)(address).map_err(Into::into)
	}
}

/// A session with one instrument.
///
/// The session is [open](SessionState::Open) once the instrument has answered
/// the identity query. A barrier or query that times out, or a link failure,
/// leaves it [faulted](SessionState::Faulted); every later operation then
/// fails until it is [reopened](InstrumentSession::reopen).
///
/// The link is released when the session is [closed](InstrumentSession::close)
/// or dropped, whichever comes first.
pub struct InstrumentSession<'a, C: Connect<'a>> {
	connector: C,
	address: String,
	vocabulary: Vocabulary,
	barrier_timeout: Duration,
	identity: String,
	channel: Channel<'a, C::Backend>,
}

impl<'a, C: Connect<'a>> std::fmt::Debug for InstrumentSession<'a, C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InstrumentSession")
			.field("address", &self.address)
			.field("identity", &self.identity)
			.field("state", &self.state())
			.finish_non_exhaustive()
	}
}

impl<'a, C: Connect<'a>> InstrumentSession<'a, C> {
	/// Open a session to the instrument at `address` using the default
	/// [`Vocabulary`].
	pub fn open(connector: C, address: &str) -> Result<Self, Error> {
		InstrumentSession::open_with(connector, address, Vocabulary::default())
	}

	/// Open a session to the instrument at `address` using a custom
	/// [`Vocabulary`].
	///
	/// The session is only returned once the instrument has answered the
	/// identity query. Otherwise the link is released and the error returned.
	pub fn open_with(
		mut connector: C,
		address: &str,
		vocabulary: Vocabulary,
	) -> Result<Self, Error> {
		let channel = connector.connect(address)?;
		let mut session = InstrumentSession {
			connector,
			address: address.to_string(),
			vocabulary,
			barrier_timeout: DEFAULT_BARRIER_TIMEOUT,
			identity: String::new(),
			channel,
		};
		// On failure, dropping the session releases the channel.
		session.identify()?;
		Ok(session)
	}

	/// Query the identity of a freshly connected instrument.
	fn identify(&mut self) -> Result<(), Error> {
		self.channel.set_barrier_query(self.vocabulary.barrier());
		match self
			.channel
			.query_with_timeout(self.vocabulary.identity(), self.barrier_timeout)
		{
			Ok(identity) => {
				log::info!("{} identified as {}", self.address, identity);
				self.identity = identity;
				Ok(())
			}
			Err(e) => {
				if let Err(release) = self.channel.release() {
					log::warn!("{} failed to release: {}", self.address, release);
				}
				Err(e.into())
			}
		}
	}

	/// Reconnect to the instrument.
	///
	/// The current link is released (if it was not already) and a new one is
	/// opened to the same address with the same connector. This is how a
	/// [faulted](SessionState::Faulted) session is recovered. It also reopens
	/// a [closed](SessionState::Closed) session.
	pub fn reopen(&mut self) -> Result<(), Error> {
		log::info!("{} reopening (was {})", self.address, self.state());
		if let Err(e) = self.channel.release() {
			log::warn!("{} failed to release: {}", self.address, e);
		}
		self.identity.clear();
		self.channel = self.connector.connect(&self.address)?;
		self.identify()
	}

	/// Get the current state of the session.
	pub fn state(&self) -> SessionState {
		self.channel.state()
	}

	/// Get the instrument's answer to the identity query.
	pub fn identity(&self) -> &str {
		&self.identity
	}

	/// Get the address the session was opened with.
	pub fn address(&self) -> &str {
		&self.address
	}

	/// Get the session's vocabulary.
	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	/// Get the underlying channel.
	pub fn channel(&self) -> &Channel<'a, C::Backend> {
		&self.channel
	}

	/// Get mutable access to the underlying channel, e.g., to send commands
	/// the vocabulary does not cover.
	pub fn channel_mut(&mut self) -> &mut Channel<'a, C::Backend> {
		&mut self.channel
	}

	/// Set how long to wait on each completion barrier.
	///
	/// The default is 10 seconds.
	pub fn set_barrier_timeout(&mut self, timeout: Duration) -> Duration {
		std::mem::replace(&mut self.barrier_timeout, timeout)
	}

	/// Get how long to wait on each completion barrier.
	pub fn barrier_timeout(&self) -> Duration {
		self.barrier_timeout
	}

	/// Send a command and await the completion barrier.
	fn synchronized(&mut self, command: &str) -> Result<(), SyncError> {
		self.channel
			.send_and_await_barrier(command, self.barrier_timeout)
			.map(drop)
	}

	/// Reset the instrument to its default state.
	pub fn reset(&mut self) -> Result<(), SyncError> {
		let command = self.vocabulary.reset().to_string();
		self.synchronized(&command)
	}

	/// Configure the measurement in `slot` to measure `kind` on `source`.
	///
	/// The kind and the source are set by separate commands, each followed
	/// by its own barrier.
	pub fn configure_measurement(
		&mut self,
		slot: u32,
		kind: &str,
		source: &str,
	) -> Result<(), SyncError> {
		let command = self.vocabulary.measurement_type(slot, kind);
		self.synchronized(&command)?;
		let command = self.vocabulary.measurement_source(slot, source);
		self.synchronized(&command)
	}

	/// Add a measurement of `kind`.
	pub fn add_measurement(&mut self, kind: &str) -> Result<(), SyncError> {
		let command = self.vocabulary.add_measurement(kind);
		self.synchronized(&command)
	}

	/// Let the instrument choose its own scales for the current signal.
	pub fn autoset(&mut self) -> Result<(), SyncError> {
		let command = self.vocabulary.autoset().to_string();
		self.synchronized(&command)
	}

	/// Set the stimulus frequency.
	pub fn set_stimulus_frequency(&mut self, value: f64) -> Result<(), SyncError> {
		let command = self.vocabulary.stimulus_frequency(value);
		self.synchronized(&command)
	}

	/// Turn on the stimulus output.
	pub fn enable_stimulus(&mut self) -> Result<(), SyncError> {
		let command = self.vocabulary.stimulus_enable().to_string();
		self.synchronized(&command)
	}

	/// Stop acquiring.
	pub fn stop_acquisition(&mut self) -> Result<(), SyncError> {
		let command = self.vocabulary.stop_acquisition().to_string();
		self.synchronized(&command)
	}

	/// Run one triggered acquisition and wait for it to finish.
	pub fn single_acquisition(&mut self) -> Result<(), SyncError> {
		for command in self.vocabulary.single_acquisition() {
			self.channel.send(command)?;
		}
		self.channel.barrier(self.barrier_timeout).map(drop)
	}

	/// Save a screen capture on the instrument as `name`.
	///
	/// The name is embedded in a quoted string, so it may not contain quotes.
	pub fn force_capture(&mut self, name: &str) -> Result<(), SyncError> {
		if let Some(quote) = name.chars().find(|c| matches!(c, '"' | '\'')) {
			return Err(ReservedCharacterError::new(name, quote).into());
		}
		let command = self.vocabulary.capture(name);
		self.synchronized(&command)
	}

	/// Send a query and parse its answer as a number.
	///
	/// An answer that is not a number is a [`ParseError`](crate::error::ParseError),
	/// which leaves the session open.
	pub fn fetch_numeric_result(&mut self, query: &str) -> Result<f64, Error> {
		let text = self
			.channel
			.query_with_timeout(query, self.barrier_timeout)?;
		Ok(parse_numeric(&text)?)
	}

	/// Close the session, releasing the link to the instrument.
	///
	/// Dropping the session does the same, but ignores any error.
	pub fn close(mut self) -> Result<(), TransportError> {
		log::info!("{} closing", self.address);
		self.channel.release()
	}
}
