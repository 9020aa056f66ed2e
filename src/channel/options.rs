//! Types defining the different options when opening a channel.

use super::{Channel, Termination};
use crate::{
    backend::{Backend, Serial},
    error::TransportError,
};
use serialport as sp;
use std::{
    io,
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

/// The default read timeout for a newly opened channel: 5 seconds.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for configuring and opening a channel over a serial port.
///
/// ## Example
///
/// ```rust
/// # use scpisync::channel::OpenSerialOptions;
/// # use std::time::Duration;
/// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
/// let mut channel = OpenSerialOptions::new()
///     .baud_rate(115_200)
///     .timeout(Duration::from_millis(500))
///     .open("/dev/ttyUSB0")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OpenSerialOptions {
    /// The custom baud rate
    baud_rate: u32,
    /// The custom timeout
    timeout: Duration,
    /// Whether responses must end in a line feed.
    termination: Termination,
}

impl OpenSerialOptions {
    /// The default baud rate for most bench instruments: 9,600.
    pub const DEFAULT_BAUD_RATE: u32 = 9_600;

    /// Create a blank set of options ready for configuration.
    ///
    /// The default baud rate and read timeout are 9,600 and 5 seconds,
    /// respectively. Responses must be terminated by a line feed.
    ///
    /// Equivalent to [`default`](OpenSerialOptions::default).
    pub fn new() -> Self {
        OpenSerialOptions {
            baud_rate: OpenSerialOptions::DEFAULT_BAUD_RATE,
            timeout: DEFAULT_READ_TIMEOUT,
            termination: Termination::Required,
        }
    }

    /// Set a custom baud rate.
    ///
    /// The default is 9,600.
    pub fn baud_rate(&mut self, baud_rate: u32) -> &mut Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set a custom read timeout.
    ///
    /// The default is 5 seconds.
    pub fn timeout(&mut self, duration: Duration) -> &mut Self {
        self.timeout = duration;
        self
    }

    /// Set whether responses must be terminated by a line feed.
    ///
    /// The default is [`Termination::Required`].
    pub fn termination(&mut self, termination: Termination) -> &mut Self {
        self.termination = termination;
        self
    }

    /// Open a [`Serial`] port at the specified path.
    fn open_serial_port(&self, path: &str) -> Result<Serial, TransportError> {
        // Due to https://gitlab.com/susurrus/serialport-rs/-/issues/102, the
        // baud rate passed to new is ignored. It must be defined using the
        // baud_rate method below.
        sp::new(path, OpenSerialOptions::DEFAULT_BAUD_RATE)
            .data_bits(sp::DataBits::Eight)
            .parity(sp::Parity::None)
            .flow_control(sp::FlowControl::None)
            .stop_bits(sp::StopBits::One)
            .timeout(self.timeout)
            .baud_rate(self.baud_rate)
            .open_native()
            .map(Serial)
            .map_err(Into::into)
    }

    /// Open the channel at the specified path with the custom options.
    pub fn open<'a>(&self, path: &str) -> Result<Channel<'a, Serial>, TransportError> {
        let channel = Channel::from_backend(self.open_serial_port(path)?, self.termination);
        log::info!("{} opened at {} baud", channel.name(), self.baud_rate);
        Ok(channel)
    }

    /// Open the channel at the specified path with the custom options.
    ///
    /// The type of the underlying backend is erased via dynamic dispatch,
    /// which does have runtime overhead. [`OpenSerialOptions::open`] should
    /// generally be used instead, except when the type of the underlying
    /// backend may not be known at compile time.
    pub fn open_dyn<'a>(
        &self,
        path: &str,
    ) -> Result<Channel<'a, Box<dyn Backend>>, TransportError> {
        let channel: Channel<'a, Box<dyn Backend>> =
            Channel::from_backend(Box::new(self.open_serial_port(path)?), self.termination);
        log::info!("{} opened at {} baud", channel.name(), self.baud_rate);
        Ok(channel)
    }
}

impl Default for OpenSerialOptions {
    fn default() -> Self {
        OpenSerialOptions::new()
    }
}

/// Options for configuring and opening a channel over a raw TCP socket.
///
/// ## Example
///
/// ```rust
/// # use scpisync::channel::OpenTcpOptions;
/// # use std::time::Duration;
/// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
/// let mut channel = OpenTcpOptions::new()
///     .timeout(Duration::from_secs(2))
///     .open("192.168.0.10:5025")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OpenTcpOptions {
    /// The custom timeout
    timeout: Duration,
    /// Whether responses must end in a line feed.
    termination: Termination,
}

impl OpenTcpOptions {
    /// Create a blank set of options ready for configuration.
    ///
    /// The default read timeout is 5 seconds, which also bounds how long
    /// connecting may take. Responses must be terminated by a line feed.
    ///
    /// Equivalent to [`default`](OpenTcpOptions::default).
    pub fn new() -> Self {
        OpenTcpOptions {
            timeout: DEFAULT_READ_TIMEOUT,
            termination: Termination::Required,
        }
    }

    /// Set a custom read timeout.
    ///
    /// The default is 5 seconds.
    pub fn timeout(&mut self, duration: Duration) -> &mut Self {
        self.timeout = duration;
        self
    }

    /// Set whether responses must be terminated by a line feed.
    ///
    /// The default is [`Termination::Required`].
    pub fn termination(&mut self, termination: Termination) -> &mut Self {
        self.termination = termination;
        self
    }

    /// Open a [`TcpStream`] at the specified address.
    ///
    /// Each resolved address is tried in turn until one connects.
    fn open_tcp_stream<A: ToSocketAddrs>(&self, address: A) -> io::Result<TcpStream> {
        let mut last_error = None;
        for addr in address.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "the address did not resolve to any socket address",
            )
        }))
    }

    /// Open the channel at the specified address with the custom options.
    pub fn open<'a, A: ToSocketAddrs>(
        &self,
        address: A,
    ) -> Result<Channel<'a, TcpStream>, TransportError> {
        let channel = Channel::from_backend(self.open_tcp_stream(address)?, self.termination);
        log::info!("{} opened", channel.name());
        Ok(channel)
    }

    /// Open the channel at the specified address with the custom options.
    ///
    /// The type of the underlying backend is erased via dynamic dispatch,
    /// which does have runtime overhead. [`OpenTcpOptions::open`] should
    /// generally be used instead, except when the type of the underlying
    /// backend may not be known at compile time.
    pub fn open_dyn<'a, A: ToSocketAddrs>(
        &self,
        address: A,
    ) -> Result<Channel<'a, Box<dyn Backend>>, TransportError> {
        let channel: Channel<'a, Box<dyn Backend>> =
            Channel::from_backend(Box::new(self.open_tcp_stream(address)?), self.termination);
        log::info!("{} opened", channel.name());
        Ok(channel)
    }
}

impl Default for OpenTcpOptions {
    fn default() -> Self {
        OpenTcpOptions::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{io::Write as _, net::TcpListener};

    #[test]
    fn tcp_channel_reads_within_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"1\n").unwrap();
            stream
        });

        let mut channel = OpenTcpOptions::new()
            .timeout(Duration::from_millis(500))
            .open(address)
            .unwrap();
        let _stream = server.join().unwrap();
        assert_eq!(channel.read_timeout(), Some(Duration::from_millis(500)));
        assert_eq!(
            channel
                .barrier(Duration::from_millis(500))
                .unwrap(),
            b"1\n"
        );
        channel.release().unwrap();
        assert_eq!(channel.state(), super::super::SessionState::Closed);
    }

    #[test]
    fn trickled_reply_is_bounded_by_one_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            // One byte every 50 ms, and never a line feed.
            for _ in 0..40 {
                if stream.write_all(b"x").is_err() {
                    break;
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        });

        let mut channel = OpenTcpOptions::new().open(address).unwrap();
        let timeout = Duration::from_millis(250);
        let start = std::time::Instant::now();
        let err = channel.barrier(timeout).unwrap_err();
        let waited = start.elapsed();
        assert!(waited < Duration::from_secs(1), "waited {waited:?}");

        let err = crate::error::TimeoutError::try_from(err).unwrap();
        assert_eq!(err.timeout(), Some(timeout));
        assert_eq!(channel.state(), super::super::SessionState::Faulted);
        assert_eq!(channel.read_timeout(), Some(DEFAULT_READ_TIMEOUT));
        channel.release().unwrap();
        server.join().unwrap();
    }

    #[test]
    fn refused_connection_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        let err = OpenTcpOptions::new()
            .timeout(Duration::from_millis(200))
            .open(address)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
    }
}
