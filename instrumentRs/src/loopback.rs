//! The loopback module provides an instrument simulator for testing purposes.
//!
//! The [`LoopbackInterfaceString`] allows to test instruments drivers that communicate using
//! strings with a fixed terminator. You script the commands you expect from the host and the
//! responses the instrument should give. Anything unexpected makes the test panic.

use std::collections::VecDeque;

use crate::{InstrumentError, InstrumentInterface};

/// An interface that allows you to simply write tests for your instrument driver.
///
/// # Example
///
/// ```
/// use instrumentrs::{InstrumentInterface, LoopbackInterfaceString};
///
/// let host2inst = vec!["*IDN?".to_string()];
/// let inst2host = vec!["Keysight,34465A,MY1234,A.03".to_string()];
/// let mut lbk = LoopbackInterfaceString::new(host2inst, inst2host, "\n");
///
/// assert_eq!(lbk.query("*IDN?").unwrap(), "Keysight,34465A,MY1234,A.03");
/// ```
///
/// An empty loopback interface is the easiest way to assert that some code path does not talk to
/// the instrument at all: any command sent to it panics.
#[derive(Debug)]
pub struct LoopbackInterfaceString {
    from_host: VecDeque<String>,
    from_inst: VecDeque<String>,
    terminator_exp: String,
    curr_bytes: VecDeque<u8>,
    terminator: String,
}

impl LoopbackInterfaceString {
    /// Create a new loopback instrument with given commands to and from instrument.
    ///
    /// The commands are consumed in order. When the [`LoopbackInterfaceString`] is dropped,
    /// `finalize` checks that all scripted commands and responses have been used.
    ///
    /// # Arguments:
    /// * `from_host` - Commands from host to instrument.
    /// * `from_inst` - Commands from instrument to host.
    /// * `terminator_exp` - The terminator the driver is expected to use.
    pub fn new(from_host: Vec<String>, from_inst: Vec<String>, terminator_exp: &str) -> Self {
        LoopbackInterfaceString {
            from_host: from_host.into(),
            from_inst: from_inst.into(),
            terminator_exp: terminator_exp.to_string(),
            curr_bytes: VecDeque::new(),
            terminator: "\n".to_string(),
        }
    }

    /// Panic if not all commands in the [`LoopbackInterfaceString`] have been used.
    ///
    /// It is automatically called on drop, but you can also call it manually at any point.
    pub fn finalize(&mut self) {
        if let Some(cmd) = self.from_host.front() {
            panic!("Leftover expected commands found from host to instrument: {cmd}");
        }
        if let Some(resp) = self.from_inst.front() {
            panic!("Leftover expected commands found from instrument to host: {resp}");
        }
    }

    /// Number of scripted host commands that have not been sent yet.
    pub fn pending_commands(&self) -> usize {
        self.from_host.len()
    }

    /// Read exactly one byte of the next response, or panic if none is scripted.
    fn read_one_byte(&mut self) -> u8 {
        if let Some(byte) = self.curr_bytes.pop_front() {
            return byte;
        }
        let next = self
            .from_inst
            .pop_front()
            .expect("No more commands were expected from instrument to host.");
        self.curr_bytes = format!("{next}{}", self.terminator_exp).into_bytes().into();
        self.read_one_byte()
    }
}

impl InstrumentInterface for LoopbackInterfaceString {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        for byte in buf.iter_mut() {
            *byte = self.read_one_byte();
        }
        Ok(())
    }

    fn write_raw(&mut self, cmd: &[u8]) -> Result<(), InstrumentError> {
        let exp = self
            .from_host
            .pop_front()
            .map(|c| format!("{c}{}", self.terminator_exp))
            .unwrap_or_else(|| {
                panic!(
                    "No more commands were expected from host to instrument, got {:?}",
                    String::from_utf8_lossy(cmd)
                )
            });
        assert_eq!(
            exp.as_bytes(),
            cmd,
            "Expected sendcmd {exp:?}, got {:?}",
            String::from_utf8_lossy(cmd)
        );
        Ok(())
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }
}

impl Drop for LoopbackInterfaceString {
    fn drop(&mut self) {
        // A failing assertion already unwinds, do not turn it into an abort.
        if !std::thread::panicking() {
            self.finalize();
        }
    }
}
