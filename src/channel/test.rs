use std::{cell::RefCell, io, time::Duration};

use crate::{
	backend::Mock,
	channel::{Channel, Direction, SessionState, Termination, LINE_FEED, MAX_LINE_LENGTH},
	command::Command,
	error::*,
	response::Reply,
};

const TIMEOUT: Duration = Duration::from_millis(250);

#[test]
fn send_writes_one_terminated_line() {
	let mut channel = Channel::open_mock(Mock::new());
	let recorder = channel.backend().unwrap().recorder();
	channel.send("*RST").unwrap();
	channel.send(Command::write("*CLS")).unwrap();
	assert_eq!(recorder.lines(), ["*RST", "*CLS"]);
	assert_eq!(channel.state(), SessionState::Open);
}

#[test]
fn barrier_returns_only_once_answered() {
	let mut mock = Mock::new();
	mock.reply_to("*OPC?", "1\n");
	let recorder = mock.recorder();
	let mut channel = Channel::open_mock(mock);

	let reply = channel
		.send_and_await_barrier("AUTOSET EXECUTE", TIMEOUT)
		.unwrap();
	assert_eq!(reply, b"1\n");
	assert_eq!(recorder.lines(), ["AUTOSET EXECUTE", "*OPC?"]);
	// Nothing is left over to be mistaken for the next answer.
	assert!(channel.backend().unwrap().is_empty());

	// The barrier's content is not interpreted.
	channel.set_barrier_query("*ESR?");
	channel.backend.as_mut().unwrap().reply_to("*ESR?", "32\n");
	assert_eq!(channel.barrier(TIMEOUT).unwrap(), b"32\n");
}

#[test]
fn unanswered_barrier_times_out_and_faults() {
	let mut channel = Channel::open_mock(Mock::new());
	let recorder = channel.backend().unwrap().recorder();

	let err = channel
		.send_and_await_barrier("AUTOSET EXECUTE", TIMEOUT)
		.unwrap_err();
	let err = TimeoutError::try_from(err).unwrap();
	assert_eq!(err.command(), "AUTOSET EXECUTE;*OPC?");
	assert_eq!(err.timeout(), Some(TIMEOUT));
	assert_eq!(channel.state(), SessionState::Faulted);
	assert!(channel.fault().is_some());

	// A faulted channel writes nothing further.
	recorder.clear_lines();
	let err = channel.send("*RST").unwrap_err();
	let SendError::SessionState(err) = err else {
		panic!("unexpected error: {err:?}");
	};
	assert_eq!(err.state(), SessionState::Faulted);
	assert!(channel.query("*IDN?").unwrap_err().is_session_state());
	assert!(recorder.lines().is_empty());
}

#[test]
fn barrier_restores_the_read_timeout() {
	let mut mock = Mock::new();
	mock.reply_to("*OPC?", "1\n");
	let mut channel = Channel::open_mock(mock);
	channel.set_read_timeout(Duration::from_secs(5)).unwrap();

	channel.barrier(Duration::from_secs(30)).unwrap();
	assert_eq!(channel.read_timeout(), Some(Duration::from_secs(5)));

	{
		let guard = channel.timeout_guard(TIMEOUT).unwrap();
		assert_eq!(guard.read_timeout(), Some(TIMEOUT));
	}
	assert_eq!(channel.read_timeout(), Some(Duration::from_secs(5)));
}

#[test]
fn failing_to_set_the_timeout_faults() {
	let mut channel = Channel::open_mock(Mock::new());
	channel
		.backend
		.as_mut()
		.unwrap()
		.set_read_timeout_error(Some(io::Error::new(io::ErrorKind::Other, "oops")));
	let err = channel.barrier(TIMEOUT).unwrap_err();
	assert!(err.is_transport(), "{err:?}");
	assert_eq!(channel.state(), SessionState::Faulted);
}

#[test]
fn query_strips_the_terminator() {
	let mut mock = Mock::new();
	mock.reply_to("*IDN?", "TEKTRONIX,MSO58B,C000001,CF:91.1CT FV:1.0\r\n");
	mock.reply_to("MEASUREMENT:MEAS1:RESULTS:CURRENTACQ:MEAN?", "1.0E+6\n");
	let mut channel = Channel::open_mock(mock);

	assert_eq!(
		channel.query("*IDN?").unwrap(),
		"TEKTRONIX,MSO58B,C000001,CF:91.1CT FV:1.0"
	);
	assert_eq!(
		channel
			.query_with_timeout("MEASUREMENT:MEAS1:RESULTS:CURRENTACQ:MEAN?", TIMEOUT)
			.unwrap(),
		"1.0E+6"
	);
}

#[test]
fn optional_termination_ends_on_silence() {
	let mut mock = Mock::new();
	mock.reply_to("*IDN?", "SIM,1");
	let mut channel = Channel::open_mock(mock);

	// Without a terminator, a required terminator never arrives.
	let err = channel.query("*IDN?").unwrap_err();
	assert!(err.is_timeout());
	channel.release().unwrap();

	let mut mock = Mock::new();
	mock.reply_to("*IDN?", "SIM,1");
	let mut channel = Channel::open_mock(mock);
	assert_eq!(channel.set_termination(Termination::Optional), Termination::Required);
	assert_eq!(channel.query("*IDN?").unwrap(), "SIM,1");

	// Silence before the first byte is still a timeout.
	let err = channel.query("*OPC?").unwrap_err();
	assert!(err.is_timeout());
}

#[test]
fn reserved_characters_are_rejected_without_faulting() {
	let mut channel = Channel::open_mock(Mock::new());
	let recorder = channel.backend().unwrap().recorder();

	let err = channel.send("*RST\n*CLS").unwrap_err();
	let err = ReservedCharacterError::try_from(err).unwrap();
	assert_eq!(err.reserved(), '\n');
	assert!(channel
		.send_and_await_barrier("*RST\r", TIMEOUT)
		.unwrap_err()
		.is_reserved_character());

	assert_eq!(channel.state(), SessionState::Open);
	assert!(recorder.lines().is_empty());
}

#[test]
fn transport_failures_fault() {
	let mut channel = Channel::open_mock(Mock::new());
	channel
		.backend
		.as_mut()
		.unwrap()
		.write_error(Some(io::Error::new(io::ErrorKind::BrokenPipe, "gone")));
	let err = channel.send("*RST").unwrap_err();
	assert!(err.is_transport());
	assert_eq!(channel.state(), SessionState::Faulted);

	let mut channel = Channel::open_mock(Mock::new());
	channel
		.backend
		.as_mut()
		.unwrap()
		.read_error(Some(io::Error::new(io::ErrorKind::ConnectionReset, "reset")));
	let err = channel.query("*IDN?").unwrap_err();
	let err = TransportError::try_from(err).unwrap();
	assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
	assert_eq!(channel.state(), SessionState::Faulted);
}

#[test]
fn block_queries() {
	let mut mock = Mock::new();
	mock.reply_to("CURVE?", b"#15\x00\x01\n\x03\x04\n")
		.reply_to("WAVFRM?", "#0abc\n")
		.reply_to("*IDN?", "SIM\n");
	let mut channel = Channel::open_mock(mock);

	// A definite block may contain line feeds.
	assert_eq!(
		channel.query_block("CURVE?", TIMEOUT).unwrap(),
		b"\x00\x01\n\x03\x04"
	);
	// The terminator following the block was consumed.
	assert_eq!(channel.query("*IDN?").unwrap(), "SIM");
	assert_eq!(channel.query_block("WAVFRM?", TIMEOUT).unwrap(), b"abc");

	// A block cut short times out.
	channel.backend.as_mut().unwrap().reply_to("SHORT?", "#210abc");
	let err = channel.query_block("SHORT?", TIMEOUT).unwrap_err();
	assert!(err.is_timeout(), "{err:?}");
	assert_eq!(channel.state(), SessionState::Faulted);
}

#[test]
fn malformed_block_faults() {
	let mut mock = Mock::new();
	mock.reply_to("CURVE?", "1,2,3\n");
	let mut channel = Channel::open_mock(mock);
	let err = channel.query_block("CURVE?", TIMEOUT).unwrap_err();
	let err = BlockMalformedError::try_from(err).unwrap();
	assert_eq!(err.as_bytes(), b"1,");
	assert_eq!(channel.state(), SessionState::Faulted);
}

#[test]
fn oversized_block_header_does_not_preallocate() {
	let mut mock = Mock::new();
	// Claims almost a gigabyte, then stops.
	mock.reply_to("CURVE?", "#9999999999abc");
	let mut channel = Channel::open_mock(mock);

	let err = channel.query_block("CURVE?", TIMEOUT).unwrap_err();
	assert!(err.is_timeout(), "{err:?}");
	assert_eq!(channel.state(), SessionState::Faulted);
}

#[test]
fn lines_without_a_line_feed_are_capped() {
	let mut reply = vec![b'x'; MAX_LINE_LENGTH];
	reply.push(LINE_FEED);
	let mut mock = Mock::new();
	mock.reply_to("CURVE?", &reply);
	let mut channel = Channel::open_mock(mock);

	let err = channel.query("CURVE?").unwrap_err();
	let err = TransportError::try_from(err).unwrap();
	assert_eq!(err.kind(), io::ErrorKind::InvalidData);
	assert_eq!(channel.state(), SessionState::Faulted);

	// One byte shorter fits.
	let mut mock = Mock::new();
	mock.reply_to("CURVE?", &reply[1..]);
	let mut channel = Channel::open_mock(mock);
	assert_eq!(channel.query("CURVE?").unwrap().len(), MAX_LINE_LENGTH - 1);
}

#[test]
fn execute_follows_arity_and_synchronization() {
	let mut mock = Mock::new();
	mock.reply_to("*OPC?", "1\n")
		.reply_to("*IDN?", "SIM\n")
		.reply_to("CURVE?", "#13xyz\n");
	let recorder = mock.recorder();
	let mut channel = Channel::open_mock(mock);

	let reply = channel
		.execute(&Command::write("*RST").synchronized(), TIMEOUT)
		.unwrap();
	assert_eq!(reply, Reply::None);
	let reply = channel.execute(&Command::write("*CLS"), TIMEOUT).unwrap();
	assert_eq!(reply, Reply::None);
	let reply = channel.execute(&Command::query("*IDN?"), TIMEOUT).unwrap();
	assert_eq!(reply.line(), Some("SIM"));
	let reply = channel
		.execute(&Command::block_query("CURVE?").synchronized(), TIMEOUT)
		.unwrap();
	assert_eq!(reply.block(), Some(&b"xyz"[..]));

	assert_eq!(
		recorder.lines(),
		["*RST", "*OPC?", "*CLS", "*IDN?", "CURVE?", "*OPC?"]
	);
}

#[test]
fn custom_barrier_query() {
	let mut mock = Mock::new();
	mock.reply_to("*WAI;*OPC?", "1\n");
	let recorder = mock.recorder();
	let mut channel = Channel::open_mock(mock);
	assert_eq!(channel.set_barrier_query("*WAI;*OPC?"), "*OPC?");
	channel.send_and_await_barrier("TRIGGER FORCE", TIMEOUT).unwrap();
	assert_eq!(recorder.lines(), ["TRIGGER FORCE", "*WAI;*OPC?"]);
}

#[test]
fn line_handler() {
	let lines = RefCell::new(Vec::new());
	let mut mock = Mock::new();
	mock.reply_to("*OPC?", "1\n");
	let mut channel = Channel::open_mock(mock);
	channel.set_line_handler(|line, dir| lines.borrow_mut().push((line.to_vec(), dir)));

	channel.send_and_await_barrier("*RST", TIMEOUT).unwrap();
	assert!(channel.clear_line_handler().is_some());
	channel.send("*CLS").unwrap();
	drop(channel);

	assert_eq!(
		lines.into_inner(),
		[
			(b"*RST\n".to_vec(), Direction::Tx),
			(b"*OPC?\n".to_vec(), Direction::Tx),
			(b"1\n".to_vec(), Direction::Recv),
		]
	);
}

#[test]
fn release_happens_exactly_once() {
	let mut channel = Channel::open_mock(Mock::new());
	let recorder = channel.backend().unwrap().recorder();

	channel.release().unwrap();
	channel.release().unwrap();
	assert_eq!(channel.state(), SessionState::Closed);
	let err = channel.send("*RST").unwrap_err();
	let err = SessionStateError::try_from(err).unwrap();
	assert_eq!(err.state(), SessionState::Closed);
	drop(channel);
	assert_eq!(recorder.releases(), 1);

	// Dropping an open channel releases it.
	let channel = Channel::open_mock(Mock::with_recorder(recorder.clone()));
	drop(channel);
	assert_eq!(recorder.releases(), 2);
}

#[test]
fn release_closes_even_when_faulted_or_failing() {
	let mut mock = Mock::new();
	mock.release_error(Some(io::Error::new(io::ErrorKind::Other, "oops")));
	let recorder = mock.recorder();
	let mut channel = Channel::open_mock(mock);

	assert!(channel.barrier(TIMEOUT).is_err());
	assert_eq!(channel.state(), SessionState::Faulted);
	assert!(channel.release().is_err());
	assert_eq!(channel.state(), SessionState::Closed);
	assert!(channel.fault().is_none());
	drop(channel);
	assert_eq!(recorder.releases(), 1);
}
