//! InstrumentRs: cached instrument properties on top of simple text interfaces
//!
//! This crate has two layers. The lower one moves commands and responses between host and
//! instrument: every interface implements [`InstrumentInterface`] and every fallible call returns
//! an [`InstrumentError`]. The upper one is a property engine around [`Session`]. Drivers declare
//! the settings of an instrument model as named, cached properties, e.g., `"advanced.auto_zero"`,
//! each with a getter and an optional setter. The session then decides whether a read can be
//! served from the cache, keeps simulated sessions away from the interface, and looks up the
//! command that governs a setting for the measurement function that is currently active.
//!
//! # Interfaces
//! - Serial (blocking) using the [`serialport`] crate (feature `serial`).
//! - TCP/IP (blocking) using [`std::net::TcpStream`], with a shortcut for raw SCPI sockets.
//! - Any type that implements [`std::io::Read`] and [`std::io::Write`] via [`Instrument`].
//! - [`LoopbackInterfaceString`] for tests, which replays a scripted conversation.
//!
//! # Writing a driver
//!
//! A driver supplies the data: an enum of measurement functions, one [`VocabularyTable`] per
//! function-dependent capability, and a [`PropertyRegistry`] with its properties. Caching,
//! simulation, invalidation on function changes, and rejection of illegal values come from the
//! engine. Drivers are tested against the [`LoopbackInterfaceString`], an empty loopback being
//! the way to assert that no I/O happens.
//!
//! # License
//!
//! Licensed under either of
//!
//! - Apache License, Version 2.0 ([LICENSE-APACHE](http://www.apache.org/licenses/LICENSE-2.0))
//! - MIT license ([LICENSE-MIT](http://opensource.org/licenses/MIT))
//!
//! at your option.
//!
//! # Contribution
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted
//! for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
//! dual licensed as above, without any additional terms or conditions.

#![warn(missing_docs)]

mod instrument;
mod loopback;
mod property;
#[cfg(feature = "serial")]
mod serial;
mod tcp_ip;

pub use instrument::Instrument;
pub use loopback::LoopbackInterfaceString;
pub use property::{
    CachedProperty, Dispatch, FunctionKey, Getter, PropertyKind, PropertyRegistry, PropertyValue,
    Session, SessionConfig, Setter, VocabularyTable,
};
#[cfg(feature = "serial")]
pub use serial::SerialInterface;
pub use tcp_ip::{SCPI_RAW_PORT, TcpIpInterface};

use std::time::{Duration, Instant};

use thiserror::Error;

/// Error type of all interfaces, of the property engine, and of the drivers built on them.
///
/// Everything that can fail returns this enum, such that errors can be passed on with `?` from the
/// interface through the session up to the caller of a driver.
///
/// Errors that come from the interface (I/O, timeouts, serial port) are passed on unchanged. The
/// property engine adds its own variants for values that are not supported, unknown properties,
/// and measurement functions the driver does not know.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstrumentError {
    /// A given float value is out of the specified range. The error contains the value that was
    /// sent, the minimum value that is allowed, and the maximum value that is allowed.
    #[error("Float value {value} is out of range. Allowed range is [{min}, {max}]")]
    FloatValueOutOfRange {
        /// The value that is out of range.
        value: f64,
        /// The minimum value that is allowed.
        min: f64,
        /// The maximum value that is allowed.
        max: f64,
    },
    /// Error when reading from/writing to an interface. See [`std::io::Error`] for more details.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Instrument status is not okay, e.g., the error queue of the instrument reported an error.
    /// The string is displayed without any further formatting.
    #[error("{0}")]
    InstrumentStatus(String),
    /// A property was set that was registered without a setter.
    #[error("Property '{0}' is read-only.")]
    ReadOnlyProperty(String),
    /// Instrument response could not be parsed becuase it was unexpected by the driver. This error
    /// contains the response that was received from the instrument.
    #[error("Response from instrument could not be parsed. Response was: {0}")]
    ResponseParseError(String),
    #[cfg(feature = "serial")]
    /// Serial port errors can occur when opening a serial interface. See the [`serialport::Error`]
    /// documentation for more information.
    #[error(transparent)]
    Serialport(#[from] serialport::Error),
    /// Timeout occurred while waiting for a response from the instrument. The error contains the
    /// timeout that was exceeded.
    #[error(
        "Timeout occured while waiting for a response from the instrument. Timeout was set to {0:?}."
    )]
    Timeout(Duration),
    /// Timeout occurred while waiting for a response to a query. The error contains the query
    /// that was sent and the timeout that was exceeded.
    #[error(
        "Timeout occured while waiting for a response to query: {query}. Timeout was set to {timeout:?}."
    )]
    TimeoutQuery {
        /// The query that timed out.
        query: String,
        /// The timeout that was set.
        timeout: Duration,
    },
    /// No property is registered under the given dotted name.
    #[error("Unknown property: '{0}'")]
    UnknownProperty(String),
    /// The instrument reported a measurement function that the driver does not know. The error
    /// contains the function as it was reported.
    #[error("Measurement function '{0}' is not supported by this driver.")]
    UnsupportedFunction(String),
    /// A value was set that is not in the set of legal values of a property, or that has the
    /// wrong kind for the property.
    #[error("Value '{value}' is not supported by property '{property}'.")]
    ValueNotSupported {
        /// Name of the property.
        property: String,
        /// The rejected value.
        value: String,
    },
}

/// The `InstrumentInterface` trait defines the interface for controlling instruments.
///
/// Implementors must provide raw reading and writing of bytes. Sending commands, reading until
/// the terminator, and querying are provided on top of that and can be overwritten if an
/// interface needs to do something special.
pub trait InstrumentInterface {
    /// Read exactly as many bytes from the instrument as fit into `buf`.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError>;

    /// Write raw bytes to the instrument and flush the interface.
    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError>;

    /// Get the terminator of the interface. Defaults to `"\n"`.
    fn get_terminator(&self) -> &str {
        "\n"
    }

    /// Set the terminator of an interface from a `&str`.
    ///
    /// # Arguments:
    /// - `_terminator` - A string slice that will be used as the terminator for commands
    fn set_terminator(&mut self, _terminator: &str) {}

    /// Get the timeout that is used while waiting for a response. Defaults to three seconds.
    fn get_timeout(&self) -> Duration {
        Duration::from_secs(3)
    }

    /// Write a string to the instrument without appending the terminator.
    fn write(&mut self, data: &str) -> Result<(), InstrumentError> {
        self.write_raw(data.as_bytes())
    }

    /// Send a command to the instrument.
    ///
    /// This function takes the command, appends the terminator, and writes it to the instrument.
    ///
    /// # Arguments:
    /// - `cmd` - A string slice that will be sent to the instrument.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let cmd = format!("{cmd}{}", self.get_terminator());
        self.write_raw(cmd.as_bytes())
    }

    /// Read from the instrument until the terminator is found and return the trimmed response.
    ///
    /// Bytes that are not valid UTF-8 are skipped. If no terminator is received before the
    /// timeout is reached, a [`InstrumentError::Timeout`] is returned.
    fn read_until_terminator(&mut self) -> Result<String, InstrumentError> {
        let terminator = self.get_terminator().to_string();
        let timeout = self.get_timeout();
        let mut response = String::new();
        let mut single_buf = [0u8];

        let tic = Instant::now();
        while tic.elapsed() < timeout {
            self.read_exact(&mut single_buf)?;
            match std::str::from_utf8(&single_buf) {
                Ok(val) => response.push_str(val),
                Err(_) => log::warn!("Received invalid UTF-8 data: {single_buf:?}"),
            }
            if response.ends_with(&terminator) {
                return Ok(response.trim().to_string());
            }
        }
        Err(InstrumentError::Timeout(timeout))
    }

    /// Query the instrument with a command and return the response as a String.
    ///
    /// This function uses `sendcmd` to send the command and then reads the response until the
    /// terminator. A timeout while reading is reported together with the query that was sent.
    ///
    /// # Arguments
    /// * `cmd` - The command to send to the instrument for which we expect a response.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.sendcmd(cmd)?;
        self.read_until_terminator().map_err(|err| match err {
            InstrumentError::Timeout(timeout) => InstrumentError::TimeoutQuery {
                query: cmd.to_string(),
                timeout,
            },
            other => other,
        })
    }
}
