//! This module provides the implementation for an instrument controlled via a serial port.
//!
//! The blocking implementation uses the `serialport` crate. The returned interface is an
//! [`Instrument`] around a boxed [`serialport::SerialPort`].

use std::time::Duration;

use serialport::{SerialPort, SerialPortBuilder};

use crate::{Instrument, InstrumentError};

/// Shortcuts to open a blocking serial interface.
#[derive(Debug)]
pub struct SerialInterface {}

impl SerialInterface {
    /// Try to open a serial interface with 8N1 settings and a three second timeout.
    ///
    /// # Arguments
    /// * `port` - The name of the serial port, e.g., `"/dev/ttyUSB0"` or `"COM3"`.
    /// * `baud` - The baud rate.
    pub fn simple(
        port: &str,
        baud: u32,
    ) -> Result<Instrument<Box<dyn SerialPort>>, InstrumentError> {
        let spb = serialport::new(port, baud).timeout(Duration::from_secs(3));
        Self::full(spb)
    }

    /// Try to open a serial interface from a fully configured [`SerialPortBuilder`].
    ///
    /// The timeout of the builder is used as the timeout of the interface as well. See
    /// [`serialport::new`] for how to create the builder.
    pub fn full(
        spb: SerialPortBuilder,
    ) -> Result<Instrument<Box<dyn SerialPort>>, InstrumentError> {
        let port = spb.open()?;
        let timeout = port.timeout();
        log::debug!("Opened serial interface {:?}", port.name());
        Ok(Instrument::new(port, timeout))
    }
}
