//! Instrument resource addresses.
//!
//! Instruments are usually identified by VISA-style resource strings. The
//! subset that maps onto a transport this library can drive is understood:
//!
//! | Address | Transport |
//! |---|---|
//! | `TCPIP0::192.168.0.10::5025::SOCKET` | raw TCP socket on port 5025 |
//! | `TCPIP::192.168.0.10::INSTR` | raw TCP socket on the default port, 5025 |
//! | `ASRL/dev/ttyUSB0::INSTR`, `ASRL3::INSTR` | serial port (`ASRL3` is `COM3`) |
//! | `192.168.0.10:5025` | raw TCP socket |
//! | `/dev/ttyUSB0`, `COM3` | serial port |
//!
//! `USB` and `GPIB` resources are recognized, but opening them fails with an
//! [`Unsupported`](std::io::ErrorKind::Unsupported) transport error.

use crate::{
    backend::Backend,
    channel::{Channel, OpenSerialOptions, OpenTcpOptions, Termination, DEFAULT_READ_TIMEOUT},
    error::{Error, ResourceAddressError, TransportError},
};
use std::{fmt, io, str::FromStr, time::Duration};

/// The port instruments listen on for raw SCPI socket connections.
pub const DEFAULT_SOCKET_PORT: u16 = 5025;

/// A parsed instrument resource address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceAddress {
    /// A raw TCP socket.
    Tcp {
        /// The host name or IP address.
        host: String,
        /// The port number.
        port: u16,
    },
    /// A serial port.
    Serial {
        /// The path of the serial device.
        path: String,
    },
    /// A resource on an interface no transport exists for.
    Unsupported {
        /// The interface, such as `USB` or `GPIB`.
        interface: String,
        /// The full resource string.
        resource: String,
    },
}

/// If `segment` starts with the interface `name` (ignoring case), return
/// what follows it, e.g. the board number of `TCPIP0`.
fn interface_prefix<'s>(segment: &'s str, name: &str) -> Option<&'s str> {
    let head = segment.get(..name.len())?;
    if head.eq_ignore_ascii_case(name) {
        Some(&segment[name.len()..])
    } else {
        None
    }
}

fn is_board_number(text: &str) -> bool {
    text.bytes().all(|b| b.is_ascii_digit())
}

fn parse_visa(address: &str) -> Option<Result<ResourceAddress, ResourceAddressError>> {
    let error = || ResourceAddressError::new(address);
    let parts: Vec<&str> = address.split("::").collect();
    let first = parts[0];

    if let Some(board) = interface_prefix(first, "TCPIP") {
        if !is_board_number(board) {
            return None;
        }
        let endpoint = match parts[1..] {
            [host, port, kind] if kind.eq_ignore_ascii_case("SOCKET") => {
                port.parse::<u16>().ok().map(|port| (host, port))
            }
            [host] => Some((host, DEFAULT_SOCKET_PORT)),
            [host, kind] | [host, _, kind] if kind.eq_ignore_ascii_case("INSTR") => {
                Some((host, DEFAULT_SOCKET_PORT))
            }
            _ => None,
        };
        let result = match endpoint {
            Some((host, port)) if !host.is_empty() => Ok(ResourceAddress::Tcp {
                host: host.to_string(),
                port,
            }),
            _ => Err(error()),
        };
        return Some(result);
    }

    if let Some(device) = interface_prefix(first, "ASRL") {
        let result = match parts[1..] {
            [] => Ok(device),
            [kind] if kind.eq_ignore_ascii_case("INSTR") => Ok(device),
            _ => Err(error()),
        }
        .and_then(|device| match device {
            "" => Err(error()),
            number if is_board_number(number) => Ok(format!("COM{number}")),
            path => Ok(path.to_string()),
        })
        .map(|path| ResourceAddress::Serial { path });
        return Some(result);
    }

    for interface in ["USB", "GPIB", "VXI", "PXI"] {
        if interface_prefix(first, interface).is_some() && parts.len() > 1 {
            return Some(Ok(ResourceAddress::Unsupported {
                interface: interface.to_string(),
                resource: address.to_string(),
            }));
        }
    }
    None
}

impl FromStr for ResourceAddress {
    type Err = ResourceAddressError;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ResourceAddressError::new(address));
        }
        if address.contains("::") {
            if let Some(result) = parse_visa(address) {
                return result;
            }
        }
        if let Some((host, port)) = address.rsplit_once(':') {
            if let Ok(port) = port.parse::<u16>() {
                let host = host.trim_start_matches('[').trim_end_matches(']');
                if host.is_empty() {
                    return Err(ResourceAddressError::new(address));
                }
                return Ok(ResourceAddress::Tcp {
                    host: host.to_string(),
                    port,
                });
            }
        }
        if address.contains("::") || address.contains(char::is_whitespace) {
            return Err(ResourceAddressError::new(address));
        }
        Ok(ResourceAddress::Serial {
            path: address.to_string(),
        })
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceAddress::Tcp { host, port } if host.contains(':') => {
                write!(f, "[{host}]:{port}")
            }
            ResourceAddress::Tcp { host, port } => write!(f, "{host}:{port}"),
            ResourceAddress::Serial { path } => f.write_str(path),
            ResourceAddress::Unsupported { resource, .. } => f.write_str(resource),
        }
    }
}

/// Options for opening a channel from a resource address, whatever its
/// transport.
///
/// ## Example
///
/// ```rust
/// # use scpisync::address::OpenResourceOptions;
/// # use std::time::Duration;
/// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
/// let mut channel = OpenResourceOptions::new()
///     .timeout(Duration::from_secs(2))
///     .open("TCPIP0::192.168.0.10::5025::SOCKET")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OpenResourceOptions {
    /// The baud rate used for serial resources.
    baud_rate: u32,
    /// The custom timeout
    timeout: Duration,
    /// Whether responses must end in a line feed.
    termination: Termination,
}

impl OpenResourceOptions {
    /// Create a blank set of options ready for configuration.
    ///
    /// The defaults match [`OpenSerialOptions`] and [`OpenTcpOptions`].
    pub fn new() -> Self {
        OpenResourceOptions {
            baud_rate: OpenSerialOptions::DEFAULT_BAUD_RATE,
            timeout: DEFAULT_READ_TIMEOUT,
            termination: Termination::Required,
        }
    }

    /// Set the baud rate used for serial resources.
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

    /// Open a channel to the resource at `address`.
    pub fn open<'a>(&self, address: &str) -> Result<Channel<'a, Box<dyn Backend>>, Error> {
        let resource: ResourceAddress = address.parse()?;
        self.open_address(&resource)
    }

    /// Open a channel to an already parsed resource address.
    pub fn open_address<'a>(
        &self,
        resource: &ResourceAddress,
    ) -> Result<Channel<'a, Box<dyn Backend>>, Error> {
        log::debug!("opening {resource}");
        match resource {
            ResourceAddress::Tcp { host, port } => Ok(OpenTcpOptions::new()
                .timeout(self.timeout)
                .termination(self.termination)
                .open_dyn((host.as_str(), *port))?),
            ResourceAddress::Serial { path } => Ok(OpenSerialOptions::new()
                .baud_rate(self.baud_rate)
                .timeout(self.timeout)
                .termination(self.termination)
                .open_dyn(path)?),
            ResourceAddress::Unsupported { interface, resource } => {
                Err(TransportError::from(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("no transport for {interface} resources ({resource})"),
                ))
                .into())
            }
        }
    }
}

impl Default for OpenResourceOptions {
    fn default() -> Self {
        OpenResourceOptions::new()
    }
}

/// Open a channel to the resource at `address` with the default options.
///
/// See [`OpenResourceOptions`] for more control.
pub fn open_resource<'a>(address: &str) -> Result<Channel<'a, Box<dyn Backend>>, Error> {
    OpenResourceOptions::new().open(address)
}
