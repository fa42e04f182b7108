//! This module provides the implementation for an instrument controlled via TCP/IP.
//!
//! SCPI instruments usually listen for plain text commands on a raw socket, port 5025 by
//! convention. The returned interface is a blocking [`Instrument`] around a
//! [`std::net::TcpStream`].

use std::{
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use crate::{Instrument, InstrumentError};

/// Port on which most SCPI instruments accept raw socket connections.
pub const SCPI_RAW_PORT: u16 = 5025;

/// Shortcuts to open a blocking TCP/IP interface.
#[derive(Debug)]
pub struct TcpIpInterface {}

impl TcpIpInterface {
    /// Try to open a TCP/IP interface to the given socket address.
    ///
    /// Read and write timeouts are set to three seconds, such that a silent instrument never
    /// blocks forever. The terminator is `"\n"` and can be changed with `set_terminator`.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address, e.g., `"192.168.1.10:5025"`.
    pub fn simple<A: ToSocketAddrs>(
        sock_addr: A,
    ) -> Result<Instrument<TcpStream>, InstrumentError> {
        Self::full(sock_addr, Duration::from_secs(3))
    }

    /// Try to open a TCP/IP interface on the default SCPI port of the given host.
    ///
    /// # Arguments
    /// * `host` - Host name or IP address of the instrument.
    pub fn scpi(host: &str) -> Result<Instrument<TcpStream>, InstrumentError> {
        Self::simple((host, SCPI_RAW_PORT))
    }

    /// Try to open a TCP/IP interface with a given timeout.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address.
    /// * `timeout` - Read and write timeout of the socket and the interface.
    pub fn full<A: ToSocketAddrs>(
        sock_addr: A,
        timeout: Duration,
    ) -> Result<Instrument<TcpStream>, InstrumentError> {
        let stream = TcpStream::connect(sock_addr)?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        log::debug!("Opened TCP/IP interface to {:?}", stream.peer_addr().ok());
        Ok(Instrument::new(stream, timeout))
    }
}
