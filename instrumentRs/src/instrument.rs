//! Blocking text interface over any byte stream.
//!
//! [`Instrument`] can be built from any type that implements [`std::io::Read`] and
//! [`std::io::Write`], such as [`std::net::TcpStream`] or a boxed [`serialport::SerialPort`].

use std::{
    fmt,
    io::{Read, Write},
    time::Duration,
};

use crate::{InstrumentError, InstrumentInterface};

/// A general instrument interface that can be built with any port that implements
/// [`std::io::Read`] and [`std::io::Write`].
///
/// The shortcuts [`crate::TcpIpInterface`] and `SerialInterface` (feature `serial`) return an
/// [`Instrument`] that is already configured. Use this struct directly if your port is of a
/// different kind.
///
/// # Example
///
/// ```no_run
/// use std::{net::TcpStream, time::Duration};
///
/// use instrumentrs::{Instrument, InstrumentInterface};
///
/// let port = TcpStream::connect("192.168.10.1:5025").unwrap();
/// let mut inst = Instrument::new(port, Duration::from_secs(3));
/// println!("{}", inst.query("*IDN?").unwrap());
/// ```
pub struct Instrument<P: Read + Write> {
    port: P,
    terminator: String,
    timeout: Duration,
}

impl<P: Read + Write> Instrument<P> {
    /// Create a new [`Instrument`] with a given port and read timeout.
    ///
    /// The terminator defaults to `"\n"`, which is what SCPI instruments expect.
    pub fn new(port: P, timeout: Duration) -> Self {
        Self {
            port,
            terminator: "\n".to_string(),
            timeout,
        }
    }

    /// Set the timeout that is used while waiting for responses.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

impl<P: Read + Write> fmt::Debug for Instrument<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrument")
            .field("terminator", &self.terminator)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<P: Read + Write> InstrumentInterface for Instrument<P> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        self.port.read_exact(buf)?;
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }

    fn get_timeout(&self) -> Duration {
        self.timeout
    }
}
