//! The synchronized command/response engine.
//!
//! A [`Channel`] owns the [`Backend`] linked to one instrument and is the only
//! thing that writes to it. Instruments process commands asynchronously with
//! respect to the host, so a command that changes the instrument's state must
//! be followed by a completion barrier before any command that depends on it:
//!
//! ```
//! # use scpisync::{backend::Backend, channel::Channel, error::SyncError};
//! # use std::time::Duration;
//! # fn wrapper<B: Backend>(mut channel: Channel<'_, B>) -> Result<(), SyncError> {
//! // Writes `AFG:FREQUENCY 1000000`, then `*OPC?`, then blocks until the
//! // instrument answers the `*OPC?` (or 5 seconds pass).
//! channel.send_and_await_barrier("AFG:FREQUENCY 1000000", Duration::from_secs(5))?;
//! // Only now is it safe to autoset at the new frequency.
//! channel.send_and_await_barrier("AUTOSET EXECUTE", Duration::from_secs(5))?;
//! # Ok(())
//! # }
//! ```
//!
//! Every response is bounded, as a whole, by a timeout. A reply that arrives
//! a byte at a time cannot stretch the wait. When a read times out, or the link
//! fails, the channel becomes [`Faulted`](SessionState::Faulted): a late
//! answer could otherwise be mistaken for the answer to the next command. A
//! faulted channel refuses all further commands until it is reopened (see
//! [`InstrumentSession::reopen`](crate::session::InstrumentSession::reopen)).
//! Nothing is ever retried.

mod options;
#[cfg(test)]
mod test;

use crate::backend::{Backend, UNKNOWN_BACKEND_NAME};
#[cfg(any(test, feature = "mock"))]
use crate::backend::Mock;
use crate::{
	command::{find_line_terminator, Arity, Command},
	error::{
		BlockMalformedError, Error, ReservedCharacterError, SendError, SessionStateError,
		SyncError, TimeoutError, TransportError,
	},
	response::{block_digit_count, block_length, line_text, BlockLength, Reply},
	timeout_guard::TimeoutGuard,
};
pub use options::*;
use std::{
	io,
	time::{Duration, Instant},
};

/// The line feed that terminates every command and line response.
pub(crate) const LINE_FEED: u8 = b'\n';

/// The default completion barrier query.
pub const DEFAULT_BARRIER_QUERY: &str = "*OPC?";

/// The default gap between bytes after which an unterminated response is
/// considered complete (see [`Termination::Optional`]).
pub const DEFAULT_INTER_CHAR_TIMEOUT: Duration = Duration::from_millis(300);

/// The state of the link to an instrument.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SessionState {
	/// The link has been released.
	Closed,
	/// The link is usable.
	Open,
	/// The link failed or an answer never arrived. It must be reopened.
	Faulted,
}

impl std::fmt::Display for SessionState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			SessionState::Closed => "closed",
			SessionState::Open => "open",
			SessionState::Faulted => "faulted",
		})
	}
}

/// Whether a line feed is required to end a response.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Termination {
	/// A response is only complete once a line feed arrives.
	#[default]
	Required,
	/// A response is also complete once no byte has arrived for the
	/// inter-character timeout, provided at least one byte was read.
	Optional,
}

/// The direction a line was sent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
	/// The line was transmitted to an instrument.
	Tx,
	/// The line was received from an instrument.
	Recv,
}

/// A callback that is called after a line is either transmitted or received.
///
/// See [`Channel::set_line_handler`] for more details.
pub type LineHandler<'a> = Box<dyn FnMut(&[u8], Direction) + 'a>;

/// How a read failed, before the failure is turned into an [`Error`].
enum ReadFailure {
	Io(io::Error),
	Malformed(BlockMalformedError),
}

impl From<io::Error> for ReadFailure {
	fn from(other: io::Error) -> Self {
		ReadFailure::Io(other)
	}
}

impl From<BlockMalformedError> for ReadFailure {
	fn from(other: BlockMalformedError) -> Self {
		ReadFailure::Malformed(other)
	}
}

/// Whether an I/O error means the read timed out.
///
/// Depending on the platform, a socket read timeout surfaces as either
/// `TimedOut` or `WouldBlock`.
fn is_timeout(e: &io::Error) -> bool {
	matches!(
		e.kind(),
		io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
	)
}

/// The longest line response accepted, terminator included.
pub const MAX_LINE_LENGTH: usize = 1 << 20;

/// Block payloads are read, and their buffer grown, this much at a time.
const BLOCK_CHUNK_SIZE: usize = 64 * 1024;

fn timed_out() -> io::Error {
	io::Error::new(
		io::ErrorKind::TimedOut,
		"the response did not complete in time",
	)
}

fn hung_up() -> io::Error {
	io::Error::new(
		io::ErrorKind::UnexpectedEof,
		"the instrument closed the connection",
	)
}

/// Read exactly one byte. End of stream means the instrument hung up.
fn read_byte<B: Backend>(backend: &mut B) -> io::Result<u8> {
	let mut byte = [0u8; 1];
	loop {
		match backend.read(&mut byte) {
			Ok(0) => return Err(hung_up()),
			Ok(_) => return Ok(byte[0]),
			Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
			Err(e) => return Err(e),
		}
	}
}

/// Reads one response from a backend.
///
/// The backend's read timeout when the reader is created bounds the whole
/// response, not each read: before every read the backend's timeout is
/// lowered to whatever is left. The original timeout is put back afterwards.
struct ResponseReader<'b, B: Backend> {
	backend: &'b mut B,
	/// The read timeout to restore once the response has been read.
	timeout: Option<Duration>,
	/// When the whole response must have arrived by.
	deadline: Option<Instant>,
}

impl<'b, B: Backend> ResponseReader<'b, B> {
	/// Read a response with `read`, then restore the backend's read timeout.
	fn run<T, E, F>(backend: &'b mut B, read: F) -> Result<T, E>
	where
		E: From<io::Error>,
		F: FnOnce(&mut Self) -> Result<T, E>,
	{
		let timeout = backend.read_timeout()?;
		let mut reader = ResponseReader {
			backend,
			timeout,
			deadline: timeout.map(|timeout| Instant::now() + timeout),
		};
		let result = read(&mut reader);
		let restored = reader.backend.set_read_timeout(reader.timeout);
		let value = result?;
		restored?;
		Ok(value)
	}

	/// Set the backend's read timeout to what is left before the deadline, or
	/// to `gap` if that is shorter.
	fn arm(&mut self, gap: Option<Duration>) -> io::Result<()> {
		let remaining = match self.deadline {
			Some(deadline) => {
				let remaining = deadline.saturating_duration_since(Instant::now());
				if remaining.is_zero() {
					return Err(timed_out());
				}
				Some(remaining)
			}
			None => None,
		};
		let timeout = match (remaining, gap) {
			(Some(remaining), Some(gap)) => Some(remaining.min(gap)),
			(remaining, gap) => remaining.or(gap),
		};
		self.backend.set_read_timeout(timeout)
	}

	fn read_byte(&mut self, gap: Option<Duration>) -> io::Result<u8> {
		self.arm(gap)?;
		read_byte(&mut *self.backend)
	}

	/// Read bytes into `buf` until a line feed, failing once `buf` holds
	/// `max_len` bytes without one.
	///
	/// If `gap` is set, going that long without a byte, or reaching the
	/// deadline, ends the line instead of failing.
	fn read_until_line_feed(
		&mut self,
		buf: &mut Vec<u8>,
		gap: Option<Duration>,
		max_len: usize,
	) -> io::Result<()> {
		loop {
			if buf.len() >= max_len {
				return Err(io::Error::new(
					io::ErrorKind::InvalidData,
					format!("no line feed within {max_len} bytes"),
				));
			}
			match self.read_byte(gap) {
				Ok(byte) => {
					buf.push(byte);
					if byte == LINE_FEED {
						return Ok(());
					}
				}
				Err(e) if gap.is_some() && is_timeout(&e) => return Ok(()),
				Err(e) => return Err(e),
			}
		}
	}

	/// Read exactly `length` bytes. The buffer never runs more than a chunk
	/// ahead of the data that has arrived.
	fn read_exact(&mut self, length: usize) -> io::Result<Vec<u8>> {
		let mut buf = Vec::new();
		while buf.len() < length {
			self.arm(None)?;
			let start = buf.len();
			buf.resize(start + (length - start).min(BLOCK_CHUNK_SIZE), 0);
			match self.backend.read(&mut buf[start..]) {
				Ok(0) => return Err(hung_up()),
				Ok(n) => buf.truncate(start + n),
				Err(e) if e.kind() == io::ErrorKind::Interrupted => buf.truncate(start),
				Err(e) => return Err(e),
			}
		}
		Ok(buf)
	}
}

/// A synchronized command channel to one instrument.
///
/// Open one with [`OpenSerialOptions`], [`OpenTcpOptions`], or
/// [`OpenResourceOptions`](crate::address::OpenResourceOptions). The link is
/// released when the channel is [released](Channel::release) or dropped,
/// whichever comes first.
pub struct Channel<'a, B: Backend> {
	/// The underlying backend. `None` once released.
	backend: Option<B>,
	/// The backend's name, kept for logging after release.
	name: String,
	/// Whether responses must end with a line feed.
	termination: Termination,
	/// The query whose answer signals that all previous commands completed.
	barrier_query: String,
	/// The gap between bytes that ends an unterminated response.
	inter_char_timeout: Duration,
	/// If populated, why the channel is faulted. It stays faulted until it is
	/// released and a new channel is opened.
	fault: Option<String>,
	/// User supplied line handler
	line_handler: Option<LineHandler<'a>>,
}

impl<'a, B: Backend> std::fmt::Debug for Channel<'a, B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Channel")
			.field("name", &self.name)
			.field("state", &self.state())
			.finish_non_exhaustive()
	}
}

#[cfg(any(test, feature = "mock"))]
#[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "mock")))]
impl<'a> Channel<'a, Mock> {
	/// Open a channel over a mock backend.
	pub fn open_mock(mock: Mock) -> Self {
		Channel::from_backend(mock, Termination::default())
	}
}

impl<'a, B: Backend> Channel<'a, B> {
	/// Create a `Channel` from a [`Backend`] type.
	pub(crate) fn from_backend(backend: B, termination: Termination) -> Self {
		let name = backend
			.name()
			.unwrap_or_else(|| UNKNOWN_BACKEND_NAME.to_string());
		Channel {
			backend: Some(backend),
			name,
			termination,
			barrier_query: DEFAULT_BARRIER_QUERY.to_string(),
			inter_char_timeout: DEFAULT_INTER_CHAR_TIMEOUT,
			fault: None,
			line_handler: None,
		}
	}

	/// Get the current state of the channel.
	pub fn state(&self) -> SessionState {
		if self.backend.is_none() {
			SessionState::Closed
		} else if self.fault.is_some() {
			SessionState::Faulted
		} else {
			SessionState::Open
		}
	}

	/// Get why the channel faulted, if it has.
	pub fn fault(&self) -> Option<&str> {
		self.fault.as_deref()
	}

	/// Get the backend, but only if the channel can be used for I/O.
	fn usable_backend(&mut self) -> Result<&mut B, SessionStateError> {
		if let Some(reason) = &self.fault {
			return Err(SessionStateError::new(SessionState::Faulted, Some(reason.as_str())));
		}
		self.backend
			.as_mut()
			.ok_or_else(|| SessionStateError::new(SessionState::Closed, None))
	}

	/// Mark the channel as faulted and hand back the error that caused it.
	pub(crate) fn fault_with<E: std::fmt::Display>(&mut self, error: E) -> E {
		let reason = error.to_string();
		log::warn!("{} faulted: {}", self.name, reason);
		if self.fault.is_none() {
			self.fault = Some(reason);
		}
		error
	}

	/// Get mutable access to the backend, if it has not been released.
	pub(crate) fn backend_slot(&mut self) -> Option<&mut B> {
		self.backend.as_mut()
	}

	/// Call the line handler, if one is registered.
	fn notify(&mut self, line: &[u8], direction: Direction) {
		if let Some(callback) = self.line_handler.as_mut() {
			(callback)(line, direction);
		}
	}

	/// Write one line to the instrument.
	fn write_line(&mut self, text: &str) -> Result<(), SendError> {
		if let Some(reserved) = find_line_terminator(text) {
			return Err(ReservedCharacterError::new(text, reserved).into());
		}
		let mut buffer = Vec::with_capacity(text.len() + 1);
		buffer.extend_from_slice(text.as_bytes());
		buffer.push(LINE_FEED);

		let backend = self.usable_backend()?;
		let result = backend.write_all(&buffer).and_then(|()| backend.flush());
		if let Err(e) = result {
			return Err(self.fault_with(TransportError::from(e)).into());
		}
		log::debug!("{} TX:   {}", self.name, text);
		self.notify(&buffer, Direction::Tx);
		Ok(())
	}

	/// Read one line, or, if termination is optional, whatever arrives
	/// before the inter-character gap.
	///
	/// The whole line is bounded by the current read timeout.
	fn read_line_bytes(&mut self) -> io::Result<Vec<u8>> {
		let gap = match self.termination {
			Termination::Required => None,
			Termination::Optional => Some(self.inter_char_timeout),
		};
		let backend = self.usable_backend().map_err(|_| {
			io::Error::new(io::ErrorKind::NotConnected, "the channel is not open")
		})?;

		ResponseReader::run(backend, |reader| -> io::Result<Vec<u8>> {
			let mut buf = Vec::with_capacity(64);
			// Silence before the first byte is never the end of a line.
			let byte = reader.read_byte(None)?;
			buf.push(byte);
			if byte != LINE_FEED {
				reader.read_until_line_feed(&mut buf, gap, MAX_LINE_LENGTH)?;
			}
			Ok(buf)
		})
	}

	/// Read a block response: `#<n><length><payload>` or `#0<payload>\n`.
	///
	/// The whole block is bounded by the current read timeout.
	fn read_block_bytes(&mut self) -> Result<Vec<u8>, ReadFailure> {
		let termination = self.termination;
		let backend = self.usable_backend().map_err(|_| {
			io::Error::new(io::ErrorKind::NotConnected, "the channel is not open")
		})?;

		ResponseReader::run(backend, |reader| -> Result<Vec<u8>, ReadFailure> {
			let header = [reader.read_byte(None)?, reader.read_byte(None)?];
			let digits = reader.read_exact(block_digit_count(&header)?)?;
			match block_length(&header, &digits)? {
				BlockLength::Definite(length) => {
					let payload = reader.read_exact(length)?;
					if termination == Termination::Required {
						// Consume the terminator that follows the payload.
						reader.read_until_line_feed(&mut Vec::new(), None, MAX_LINE_LENGTH)?;
					}
					Ok(payload)
				}
				BlockLength::Indefinite => {
					let mut payload = Vec::new();
					reader.read_until_line_feed(&mut payload, None, usize::MAX)?;
					if payload.last() == Some(&LINE_FEED) {
						payload.pop();
					}
					Ok(payload)
				}
			}
		})
	}

	/// Turn a failed read into an error, faulting the channel.
	fn io_failed(&mut self, label: &str, e: io::Error) -> SyncError {
		if let Err(state) = self.usable_backend() {
			return state.into();
		}
		if is_timeout(&e) {
			let timeout = self.read_timeout();
			self.fault_with(TimeoutError::new(label, timeout)).into()
		} else {
			self.fault_with(TransportError::from(e)).into()
		}
	}

	/// Read a response to `label`, bounded by the current read timeout.
	fn read_response(&mut self, label: &str) -> Result<Vec<u8>, SyncError> {
		match self.read_line_bytes() {
			Ok(bytes) => {
				log::debug!(
					"{} RECV: {}",
					self.name,
					String::from_utf8_lossy(&bytes).trim_end()
				);
				self.notify(&bytes, Direction::Recv);
				Ok(bytes)
			}
			Err(e) => Err(self.io_failed(label, e)),
		}
	}

	/// Send a command. A response is not read.
	///
	/// The command is terminated with a line feed. Fails if the channel is
	/// closed or faulted, or if the link fails, in which case the channel
	/// becomes faulted.
	pub fn send<C: AsRef<str>>(&mut self, command: C) -> Result<(), SendError> {
		self.write_line(command.as_ref())
	}

	/// Send a command followed by the completion barrier query and block until
	/// the barrier is answered or `timeout` elapses.
	///
	/// On success the raw barrier response is returned. Its content is not
	/// interpreted; receiving it is what matters.
	///
	/// Fails with [`SyncError::Timeout`] if nothing is received in time and
	/// [`SyncError::Transport`] if the link fails. Either way the channel is
	/// faulted.
	pub fn send_and_await_barrier<C: AsRef<str>>(
		&mut self,
		command: C,
		timeout: Duration,
	) -> Result<Vec<u8>, SyncError> {
		let command = command.as_ref();
		self.write_line(command)?;
		let label = format!("{command};{}", self.barrier_query);
		self.await_barrier(&label, timeout)
	}

	/// Send only the completion barrier query and wait for its answer.
	///
	/// This is useful for synchronizing several unsynchronized commands at
	/// once.
	pub fn barrier(&mut self, timeout: Duration) -> Result<Vec<u8>, SyncError> {
		let label = self.barrier_query.clone();
		self.await_barrier(&label, timeout)
	}

	fn await_barrier(&mut self, label: &str, timeout: Duration) -> Result<Vec<u8>, SyncError> {
		let query = self.barrier_query.clone();
		self.write_line(&query)?;
		let mut guard = self.timeout_guard(timeout)?;
		guard.read_response(label)
	}

	/// Send a command and read a single line response.
	///
	/// The read is bounded by the channel's read timeout. The line terminator
	/// is removed. No barrier is issued.
	pub fn query<C: AsRef<str>>(&mut self, command: C) -> Result<String, SyncError> {
		let command = command.as_ref();
		self.write_line(command)?;
		let bytes = self.read_response(command)?;
		Ok(line_text(&bytes))
	}

	/// The same as [`query`](Channel::query) but with a specific timeout.
	pub fn query_with_timeout<C: AsRef<str>>(
		&mut self,
		command: C,
		timeout: Duration,
	) -> Result<String, SyncError> {
		let command = command.as_ref();
		self.write_line(command)?;
		let mut guard = self.timeout_guard(timeout)?;
		let bytes = guard.read_response(command)?;
		Ok(line_text(&bytes))
	}

	/// Send a command and read an IEEE 488.2 block response, such as a
	/// waveform or a screen image.
	///
	/// Both definite (`#<n><length><payload>`) and indefinite (`#0<payload>\n`)
	/// blocks are accepted. A malformed header faults the channel, as the
	/// position in the response stream is lost.
	pub fn query_block<C: AsRef<str>>(
		&mut self,
		command: C,
		timeout: Duration,
	) -> Result<Vec<u8>, Error> {
		let command = command.as_ref();
		self.write_line(command)?;
		let mut guard = self.timeout_guard(timeout)?;
		match guard.read_block_bytes() {
			Ok(payload) => {
				log::debug!("{} RECV: <block of {} bytes>", guard.name, payload.len());
				guard.notify(&payload, Direction::Recv);
				Ok(payload)
			}
			Err(ReadFailure::Io(e)) => Err(guard.io_failed(command, e).into()),
			Err(ReadFailure::Malformed(e)) => Err(guard.fault_with(e).into()),
		}
	}

	/// Run a [`Command`], reading whatever response it elicits and, if it is
	/// synchronized, awaiting the completion barrier afterwards.
	///
	/// `timeout` bounds each response.
	pub fn execute(&mut self, command: &Command, timeout: Duration) -> Result<Reply, Error> {
		let reply = match command.arity() {
			Arity::None if command.synchronize() => {
				self.send_and_await_barrier(command, timeout)?;
				return Ok(Reply::None);
			}
			Arity::None => {
				self.send(command)?;
				Reply::None
			}
			Arity::SingleLine => Reply::Line(self.query_with_timeout(command, timeout)?),
			Arity::RawBlock => Reply::Block(self.query_block(command, timeout)?),
		};
		if command.synchronize() {
			self.barrier(timeout)?;
		}
		Ok(reply)
	}

	/// Set the read timeout and return a "scope guard" that will reset the
	/// timeout when it goes out of scope.
	///
	/// While the guard is in scope, the channel can only be accessed through
	/// the guard. However, because the guard implements [`Deref`](std::ops::Deref)
	/// and [`DerefMut`](std::ops::DerefMut) callers can treat the guard as the
	/// channel.
	///
	/// ## Example
	/// ```rust
	/// # use scpisync::{backend::Backend, channel::Channel, error::SyncError};
	/// # use std::time::Duration;
	/// # fn helper<B: Backend>(mut channel: Channel<'_, B>) -> Result<(), SyncError> {
	/// {
	///     let mut guard = channel.timeout_guard(Duration::from_secs(30))?;
	///     // Saving an image can take a while.
	///     guard.query("SAVE:IMAGE:STATE?")?;
	/// }  // The guard is dropped and the timeout is reset.
	///
	/// // This query uses the original timeout
	/// channel.query("*IDN?")?;
	/// # Ok(())
	/// # }
	/// ```
	pub fn timeout_guard(
		&mut self,
		timeout: Duration,
	) -> Result<TimeoutGuard<'_, 'a, B>, SyncError> {
		self.usable_backend()?;
		TimeoutGuard::new(self, timeout)
	}

	/// Set the read timeout and return the old timeout.
	pub fn set_read_timeout(&mut self, timeout: Duration) -> Result<Option<Duration>, SyncError> {
		let backend = self.usable_backend()?;
		let result = backend
			.read_timeout()
			.and_then(|old| backend.set_read_timeout(Some(timeout)).map(|()| old));
		result.map_err(|e| self.fault_with(TransportError::from(e)).into())
	}

	/// Get the read timeout.
	pub fn read_timeout(&self) -> Option<Duration> {
		self.backend
			.as_ref()
			.and_then(|backend| backend.read_timeout().ok().flatten())
	}

	/// Set the completion barrier query. The default is `*OPC?`.
	///
	/// The previous value is returned.
	pub fn set_barrier_query<S: Into<String>>(&mut self, query: S) -> String {
		std::mem::replace(&mut self.barrier_query, query.into())
	}

	/// Get the completion barrier query.
	pub fn barrier_query(&self) -> &str {
		&self.barrier_query
	}

	/// Set whether responses must be terminated by a line feed.
	///
	/// The previous value is returned.
	pub fn set_termination(&mut self, termination: Termination) -> Termination {
		std::mem::replace(&mut self.termination, termination)
	}

	/// Get whether responses must be terminated by a line feed.
	pub fn termination(&self) -> Termination {
		self.termination
	}

	/// Set the gap between bytes that ends a response when termination is
	/// [optional](Termination::Optional).
	///
	/// The previous value is returned.
	pub fn set_inter_char_timeout(&mut self, timeout: Duration) -> Duration {
		std::mem::replace(&mut self.inter_char_timeout, timeout)
	}

	/// Get the "name" of the channel's backend.
	///
	/// This is often the address the channel was opened with.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Get a reference to the backend, unless it has been released.
	pub fn backend(&self) -> Option<&B> {
		self.backend.as_ref()
	}

	/// Release the link to the instrument.
	///
	/// The backend is released exactly once: calling this again, or dropping
	/// the channel afterwards, does nothing. The channel is closed even if
	/// releasing the backend fails.
	pub fn release(&mut self) -> Result<(), TransportError> {
		let Some(mut backend) = self.backend.take() else {
			return Ok(());
		};
		self.fault = None;
		log::info!("{} released", self.name);
		backend.release().map_err(TransportError::from)
	}

	/// Set a callback that will be called immediately after any line is sent
	/// or received.
	///
	/// If a previous callback was set, it is returned.
	///
	/// The callback is passed the raw bytes, including any terminator, and the
	/// direction. Note, the channel already logs every line via the [`log`]
	/// crate, so logging is best handled via a log handler rather than a line
	/// callback. However, there are instances when you need access to the
	/// lines directly (for instance, to show them in an application).
	///
	/// ## Example
	///
	/// ```
	/// # use scpisync::{backend::Backend, channel::Channel};
	/// # use std::cell::RefCell;
	/// # fn wrapper<B: Backend>(mut channel: Channel<'_, B>) {
	/// let transcript = RefCell::new(Vec::new());
	/// channel.set_line_handler(move |line, dir| {
	///     transcript
	///         .borrow_mut()
	///         .push(format!("{dir:?}: {}", String::from_utf8_lossy(line)));
	/// });
	/// # }
	/// ```
	pub fn set_line_handler<F>(&mut self, callback: F) -> Option<LineHandler<'a>>
	where
		F: FnMut(&[u8], Direction) + 'a,
	{
		self.line_handler.replace(Box::new(callback))
	}

	/// Clear any callback registered via [`set_line_handler`](Channel::set_line_handler) and return it.
	pub fn clear_line_handler(&mut self) -> Option<LineHandler<'a>> {
		self.line_handler.take()
	}
}

impl<'a, B: Backend> Drop for Channel<'a, B> {
	fn drop(&mut self) {
		if let Err(e) = self.release() {
			log::warn!("{} failed to release cleanly: {}", self.name, e);
		}
	}
}
