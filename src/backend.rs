//! Types that can exchange (read/write) bytes with a connected instrument.
//!
//! The [`Backend`] trait represents all such types.

use std::io;
use std::time::Duration;

use serialport as sp;

#[cfg(windows)]
use sp::COMPort as ExternSerial;
use sp::SerialPort;
#[cfg(unix)]
use sp::TTYPort as ExternSerial;

#[cfg(any(test, feature = "mock"))]
use std::{cell::RefCell, io::Read as _, rc::Rc};

/// The placeholder name for a backend that doesn't have a name.
pub(crate) const UNKNOWN_BACKEND_NAME: &str = "<unknown backend>";

/// Types that allow reading and writing bytes with a connected instrument.
pub trait Backend: io::Read + io::Write + private::Sealed {
	/// Set the read timeout.
	///
	/// If timeout is `None`, reads will block indefinitely.
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error>;

	/// Get the read timeout.
	///
	/// If timeout is `None`, reads will block indefinitely.
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error>;

	/// Get the "name" of the backend.
	///
	/// This can be in any format, but should uniquely identify the backend
	/// instance.
	fn name(&self) -> Option<String>;

	/// Release the link to the instrument.
	///
	/// This is called exactly once, right before the backend is dropped by the
	/// [`Channel`](crate::channel::Channel) that owns it.
	fn release(&mut self) -> Result<(), io::Error>;
}

impl<C: Backend + ?Sized> Backend for Box<C> {
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		(**self).set_read_timeout(timeout)
	}
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		(**self).read_timeout()
	}
	fn name(&self) -> Option<String> {
		(**self).name()
	}
	fn release(&mut self) -> Result<(), io::Error> {
		(**self).release()
	}
}

impl<C: Backend + ?Sized> Backend for &mut C {
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		(**self).set_read_timeout(timeout)
	}
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		(**self).read_timeout()
	}
	fn name(&self) -> Option<String> {
		(**self).name()
	}
	fn release(&mut self) -> Result<(), io::Error> {
		(**self).release()
	}
}

impl Backend for std::net::TcpStream {
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		std::net::TcpStream::set_read_timeout(self, timeout)
	}
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		std::net::TcpStream::read_timeout(self)
	}
	fn name(&self) -> Option<String> {
		self.peer_addr().map(|addr| format!("{addr}")).ok()
	}
	fn release(&mut self) -> Result<(), io::Error> {
		match self.shutdown(std::net::Shutdown::Both) {
			// The instrument already hung up. There is nothing left to release.
			Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
			other => other,
		}
	}
}

/// A platform agnostic serial port backend.
//
// The `serialport` crate exposes two platform specific serial ports, `COMPort`
// and `TTYPort` for windows and unix, respectively. Wrapping whichever one
// the platform uses in a new type keeps the platform specific types out of
// every signature that mentions a serial backend.
#[derive(Debug)]
pub struct Serial(pub(crate) ExternSerial);

impl io::Read for Serial {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.0.read(buf)
	}
}

impl io::Write for Serial {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.write(buf)
	}

	fn flush(&mut self) -> io::Result<()> {
		self.0.flush()
	}
}

impl Backend for Serial {
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		// The serialport API does not support infinite timeouts, so simply set
		// the timeout to the largest possible duration if `timeout` is `None`,
		// which is practically infinite.
		Ok(self.0.set_timeout(timeout.unwrap_or(Duration::MAX))?)
	}
	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		Ok(Some(self.0.timeout()))
	}
	fn name(&self) -> Option<String> {
		self.0.name()
	}
	fn release(&mut self) -> Result<(), io::Error> {
		// The device is closed when the port is dropped. Make sure nothing
		// written is still sitting in the output buffer when that happens.
		io::Write::flush(&mut self.0)
	}
}

/// A record of what was written to one or more [`Mock`] backends.
///
/// The recorder is shared, so it can still be inspected after the mock has
/// been moved into a channel, or released and dropped.
#[cfg(any(test, feature = "mock"))]
#[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "mock")))]
#[derive(Debug, Clone, Default)]
pub struct MockRecorder(Rc<RefCell<Recorded>>);

#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Default)]
struct Recorded {
	lines: Vec<String>,
	releases: usize,
}

#[cfg(any(test, feature = "mock"))]
impl MockRecorder {
	/// Create an empty recorder.
	pub fn new() -> Self {
		MockRecorder::default()
	}
	/// All complete lines written so far, without their terminators.
	pub fn lines(&self) -> Vec<String> {
		self.0.borrow().lines.clone()
	}
	/// The number of times a backend using this recorder was released.
	pub fn releases(&self) -> usize {
		self.0.borrow().releases
	}
	/// Forget the recorded lines. The release count is kept.
	pub fn clear_lines(&self) {
		self.0.borrow_mut().lines.clear();
	}
	fn push_line(&self, line: String) {
		self.0.borrow_mut().lines.push(line);
	}
	fn count_release(&self) {
		self.0.borrow_mut().releases += 1;
	}
}

/// A mock backend for use in testing.
///
/// It has the following features:
///   * Every line written to it is recorded in its [`MockRecorder`].
///   * It can be filled with data for reading, either directly or by
///     replying automatically when a specific line is written.
///   * Specific errors can be inserted for calls to `read`, `write`, `flush`,
///     `set_read_timeout`, and `release`.
#[cfg(any(test, feature = "mock"))]
#[cfg_attr(all(doc, feature = "doc_cfg"), doc(cfg(feature = "mock")))]
#[derive(Debug)]
pub struct Mock {
	/// The buffer data is read from
	buffer: io::Cursor<Vec<u8>>,
	/// Bytes written since the last line feed.
	partial_line: Vec<u8>,
	/// Lines that, once written, append their reply to the read buffer.
	replies: Vec<(String, Vec<u8>)>,
	/// Where written lines and releases are recorded.
	recorder: MockRecorder,
	/// The error to surface on the next read, if any. It is only surfaced once.
	read_error: Option<io::Error>,
	/// The error to surface on the next write, if any. It is only surfaced once.
	write_error: Option<io::Error>,
	/// The error to surface on the next flush, if any. It is only surfaced once.
	flush_error: Option<io::Error>,
	/// The error to surface on the next set_read_timeout, if any. It is only surfaced once.
	set_read_timeout_error: Option<io::Error>,
	/// The error to surface on the next release, if any. It is only surfaced once.
	release_error: Option<io::Error>,
	/// The read timeout, which is ignored. Reads never block, so it starts
	/// out unset.
	ignored_read_timeout: Option<Duration>,
}

#[cfg(any(test, feature = "mock"))]
impl Mock {
	/// Create a new Mock backend with its own recorder.
	pub fn new() -> Self {
		Mock::with_recorder(MockRecorder::new())
	}
	/// Create a new Mock backend that records into an existing recorder.
	pub fn with_recorder(recorder: MockRecorder) -> Self {
		Mock {
			buffer: io::Cursor::new(Vec::new()),
			partial_line: Vec::new(),
			replies: Vec::new(),
			recorder,
			read_error: None,
			write_error: None,
			flush_error: None,
			set_read_timeout_error: None,
			release_error: None,
			ignored_read_timeout: None,
		}
	}
	/// Get the recorder for this backend.
	pub fn recorder(&self) -> MockRecorder {
		self.recorder.clone()
	}
	/// Append data to the read buffer.
	///
	/// The data is not validated in any way.
	pub fn append_data<T: AsRef<[u8]>>(&mut self, bytes: T) {
		self.buffer.get_mut().extend_from_slice(bytes.as_ref());
	}
	/// Append `reply` to the read buffer every time exactly `line` is written.
	///
	/// If several replies are registered for the same line they are used in
	/// turn, and the last one is repeated from then on. An empty reply means
	/// the line is never answered.
	pub fn reply_to<L: Into<String>, T: AsRef<[u8]>>(&mut self, line: L, reply: T) -> &mut Self {
		self.replies.push((line.into(), reply.as_ref().to_vec()));
		self
	}
	/// Clear the read buffer.
	pub fn clear_buffer(&mut self) {
		self.buffer.get_mut().clear();
		self.buffer.set_position(0);
	}
	/// Whether the mock has any data available or not
	pub fn is_empty(&self) -> bool {
		usize::try_from(self.buffer.position()).unwrap_or(usize::MAX) >= self.buffer.get_ref().len()
	}
	/// Set the error for the next `read`, if any.
	pub fn read_error(&mut self, err: Option<io::Error>) {
		self.read_error = err;
	}
	/// Set the error for the next `write`, if any.
	pub fn write_error(&mut self, err: Option<io::Error>) {
		self.write_error = err;
	}
	/// Set the error for the next `flush`, if any.
	pub fn flush_error(&mut self, err: Option<io::Error>) {
		self.flush_error = err;
	}
	/// Set the error for the next `set_read_timeout`, if any.
	pub fn set_read_timeout_error(&mut self, err: Option<io::Error>) {
		self.set_read_timeout_error = err;
	}
	/// Set the error for the next `release`, if any.
	pub fn release_error(&mut self, err: Option<io::Error>) {
		self.release_error = err;
	}

	/// Record any complete lines and queue their automatic replies.
	fn drain_lines(&mut self) {
		while let Some(end) = self.partial_line.iter().position(|&b| b == b'\n') {
			let raw: Vec<u8> = self.partial_line.drain(..=end).collect();
			let line = String::from_utf8_lossy(&raw)
				.trim_end_matches(['\r', '\n'])
				.to_string();
			if let Some(i) = self.replies.iter().position(|(trigger, _)| *trigger == line) {
				// Queued replies are used once each, except the last.
				let queued = self.replies[i + 1..]
					.iter()
					.any(|(trigger, _)| *trigger == line);
				let reply = if queued {
					self.replies.remove(i).1
				} else {
					self.replies[i].1.clone()
				};
				self.append_data(reply);
			}
			self.recorder.push_line(line);
		}
	}
}

#[cfg(any(test, feature = "mock"))]
impl Default for Mock {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(any(test, feature = "mock"))]
impl Backend for Mock {
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		if let Some(err) = self.set_read_timeout_error.take() {
			Err(err)
		} else {
			self.ignored_read_timeout = timeout;
			Ok(())
		}
	}

	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		Ok(self.ignored_read_timeout)
	}

	fn name(&self) -> Option<String> {
		Some(format!("<mock {self:p}>"))
	}

	fn release(&mut self) -> Result<(), io::Error> {
		self.recorder.count_release();
		match self.release_error.take() {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}
}

#[cfg(any(test, feature = "mock"))]
impl io::Read for Mock {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		if let Some(err) = self.read_error.take() {
			Err(err)
		} else if self.is_empty() {
			// For a real instrument, having no data ready would result in a
			// wait and then eventual timeout error. However, as our data is in
			// memory that does not happen here. So simulate that behaviour by
			// returning a timeout error immediately.
			Err(io::Error::new(
				io::ErrorKind::TimedOut,
				"Simulated timeout error",
			))
		} else {
			self.buffer.read(buf)
		}
	}
}

#[cfg(any(test, feature = "mock"))]
impl io::Write for Mock {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		if let Some(err) = self.write_error.take() {
			Err(err)
		} else {
			self.partial_line.extend_from_slice(buf);
			self.drain_lines();
			Ok(buf.len())
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		if let Some(err) = self.flush_error.take() {
			Err(err)
		} else {
			Ok(())
		}
	}
}

mod private {
	pub trait Sealed {}

	impl Sealed for super::Serial {}
	impl Sealed for std::net::TcpStream {}
	#[cfg(any(test, feature = "mock"))]
	impl Sealed for super::Mock {}
	impl<C: super::Backend + ?Sized> Sealed for Box<C> {}
	impl<C: super::Backend + ?Sized> Sealed for &mut C {}
}

#[cfg(test)]
mod test {
	use super::*;
	use std::io::Write as _;

	#[test]
	fn mock_records_lines_and_replies() {
		let mut mock = Mock::new();
		let recorder = mock.recorder();
		mock.reply_to("*OPC?", "1\n");

		mock.write_all(b"*RST\n*OP").unwrap();
		assert!(mock.is_empty());
		mock.write_all(b"C?\r\n").unwrap();
		assert_eq!(recorder.lines(), ["*RST", "*OPC?"]);

		let mut buf = [0u8; 8];
		let n = mock.read(&mut buf).unwrap();
		assert_eq!(&buf[..n], b"1\n");
		let err = mock.read(&mut buf).unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::TimedOut);
	}

	#[test]
	fn mock_queues_replies_to_the_same_line() {
		let mut mock = Mock::new();
		mock.reply_to("*OPC?", "1\n").reply_to("*OPC?", "");
		mock.write_all(b"*OPC?\n").unwrap();
		assert!(!mock.is_empty());
		mock.clear_buffer();
		mock.write_all(b"*OPC?\n*OPC?\n").unwrap();
		assert!(mock.is_empty());
	}

	#[test]
	fn mock_counts_releases_after_drop() {
		let recorder = MockRecorder::new();
		{
			let mut mock = Mock::with_recorder(recorder.clone());
			mock.release_error(Some(io::Error::new(io::ErrorKind::Other, "oops")));
			assert!(mock.release().is_err());
		}
		assert_eq!(recorder.releases(), 1);
	}
}
