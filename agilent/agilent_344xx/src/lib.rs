//! A rust driver for the Agilent/Keysight 3446x digital multimeters.
//!
//! Two models are supported: the [`Agilent34461a`] and the [`Agilent34465a`], which adds
//! auto-zero, aperture time, and a sample interval on top of the 34461A. All settings of the
//! instruments are cached properties that can be read and written by their dotted name, e.g.,
//! `"advanced.auto_zero"`, or through the typed accessors of the [`Dmm`] trait and of the
//! individual models.
//!
//! Several settings, e.g., the range or the auto-zero, are controlled by a different command for
//! every measurement function. The driver looks up the correct command for the function that is
//! currently active. If a setting does not exist for that function, reading it returns the last
//! cached value and writing it only updates the cache.
//!
//! # Example
//!
//! ```no_run
//! use agilent_344xx::{Agilent34465a, AutoZero, Dmm, MeasurementFunction};
//! use instrumentrs::TcpIpInterface;
//!
//! let interface = TcpIpInterface::scpi("192.168.1.10").unwrap();
//! let mut dmm = Agilent34465a::try_new(interface).unwrap();
//!
//! dmm.set_function(MeasurementFunction::DcVolts).unwrap();
//! dmm.set_auto_zero(AutoZero::Once).unwrap();
//! println!("Reading: {}", dmm.read().unwrap());
//! ```
//!
//! A simulated instrument does not talk to the interface at all:
//!
//! ```
//! use agilent_344xx::{Agilent34461a, Dmm};
//! use instrumentrs::{LoopbackInterfaceString, SessionConfig};
//!
//! let interface = LoopbackInterfaceString::new(vec![], vec![], "\n");
//! let mut dmm = Agilent34461a::with_config(interface, SessionConfig::simulated()).unwrap();
//!
//! dmm.set("trigger.delay", 0.5).unwrap();
//! assert_eq!(dmm.get("trigger.delay").unwrap().as_float(), Some(0.5));
//! ```

#![warn(missing_docs)]

mod agilent34461a;
mod agilent34465a;
mod function;
mod measurement;
pub mod vocabulary;

pub use agilent34461a::{Agilent34461a, TriggerCount, TriggerSource};
pub use agilent34465a::{Agilent34465a, AutoZero};
pub use function::MeasurementFunction;
pub use measurement::DmmMeasurement;

use std::time::Duration;

use instrumentrs::{InstrumentError, InstrumentInterface, PropertyValue, Session};

/// Session type of all 3446x models.
pub type DmmSession<T> = Session<T, MeasurementFunction>;

/// Error queue entry when the queue is empty.
const NO_ERROR: (i32, &str) = (0, "No error");

/// Functionality that all models of the 3446x family share.
///
/// A model only has to give access to its session, all other methods are provided. Properties
/// that a model does not register return [`InstrumentError::UnknownProperty`].
pub trait Dmm {
    /// The interface the instrument is connected with.
    type Interface: InstrumentInterface;

    /// Model number, e.g., `"34461A"`.
    const MODEL: &'static str;

    /// Get the session of the instrument.
    fn session(&self) -> &DmmSession<Self::Interface>;

    /// Get mutable access to the session of the instrument.
    fn session_mut(&mut self) -> &mut DmmSession<Self::Interface>;

    /// Whether the instrument is simulated.
    fn is_simulated(&self) -> bool {
        self.session().simulating()
    }

    /// Names of all properties of the instrument, in registration order.
    fn names(&self) -> Vec<&'static str> {
        self.session().names().collect()
    }

    /// Read a property by its dotted name.
    fn get(&mut self, name: &str) -> Result<PropertyValue, InstrumentError> {
        self.session_mut().get(name)
    }

    /// Write a property by its dotted name.
    fn set(&mut self, name: &str, value: impl Into<PropertyValue>) -> Result<(), InstrumentError> {
        self.session_mut().set(name, value)
    }

    /// Mark the cached value of a property as outdated, e.g., after the front panel was used.
    fn invalidate(&mut self, name: &str) -> Result<(), InstrumentError> {
        self.session_mut().invalidate(name)
    }

    /// Mark all cached values as outdated.
    fn invalidate_all(&mut self) {
        self.session_mut().invalidate_all();
    }

    /// Get the active measurement function.
    fn get_function(&mut self) -> Result<MeasurementFunction, InstrumentError> {
        self.session_mut().current_function()
    }

    /// Set the measurement function.
    ///
    /// This invalidates all cached settings that depend on the function.
    fn set_function(&mut self, function: MeasurementFunction) -> Result<(), InstrumentError> {
        self.set(agilent34461a::FUNCTION, function.name())
    }

    /// Get the range of the active function in its native unit, e.g., volts.
    fn get_range(&mut self) -> Result<f64, InstrumentError> {
        float(self.get(agilent34461a::RANGE)?)
    }

    /// Set the range of the active function in its native unit.
    ///
    /// The instrument picks the smallest range that contains the given value and turns auto-range
    /// off.
    fn set_range(&mut self, range: f64) -> Result<(), InstrumentError> {
        check_float(range, 0.0, f64::MAX)?;
        self.set(agilent34461a::RANGE, range)
    }

    /// Whether auto-range is enabled for the active function.
    fn get_auto_range(&mut self) -> Result<bool, InstrumentError> {
        let value = self.get(agilent34461a::AUTO_RANGE)?;
        value
            .as_bool()
            .ok_or_else(|| InstrumentError::ResponseParseError(value.to_string()))
    }

    /// Enable or disable auto-range for the active function.
    fn set_auto_range(&mut self, auto: bool) -> Result<(), InstrumentError> {
        self.set(agilent34461a::AUTO_RANGE, auto)
    }

    /// Get the trigger source.
    fn get_trigger_source(&mut self) -> Result<TriggerSource, InstrumentError> {
        self.get(agilent34461a::TRIGGER_SOURCE)?.to_string().parse()
    }

    /// Set the trigger source.
    fn set_trigger_source(&mut self, source: TriggerSource) -> Result<(), InstrumentError> {
        self.set(agilent34461a::TRIGGER_SOURCE, source.name())
    }

    /// Get the delay between trigger and measurement.
    fn get_trigger_delay(&mut self) -> Result<Duration, InstrumentError> {
        duration(self.get(agilent34461a::TRIGGER_DELAY)?)
    }

    /// Set the delay between trigger and measurement, at most one hour.
    fn set_trigger_delay(&mut self, delay: Duration) -> Result<(), InstrumentError> {
        let secs = delay.as_secs_f64();
        check_float(secs, 0.0, 3600.0)?;
        self.set(agilent34461a::TRIGGER_DELAY, secs)
    }

    /// Get the number of samples that are taken per trigger.
    fn get_sample_count(&mut self) -> Result<u32, InstrumentError> {
        count(self.get(agilent34461a::SAMPLE_COUNT)?)
    }

    /// Set the number of samples that are taken per trigger.
    fn set_sample_count(&mut self, samples: u32) -> Result<(), InstrumentError> {
        check_float(samples.into(), 1.0, 1e6)?;
        self.set(agilent34461a::SAMPLE_COUNT, i64::from(samples))
    }

    /// Get the number of triggers that are accepted before returning to idle.
    fn get_trigger_count(&mut self) -> Result<TriggerCount, InstrumentError> {
        TriggerCount::from_f64(float(self.get(agilent34461a::TRIGGER_COUNT)?)?)
    }

    /// Set the number of triggers that are accepted before returning to idle.
    ///
    /// A finite count must be between 1 and 1,000,000.
    fn set_trigger_count(&mut self, count: TriggerCount) -> Result<(), InstrumentError> {
        if let TriggerCount::Finite(triggers) = count {
            check_float(triggers.into(), 1.0, 1e6)?;
        }
        self.set(agilent34461a::TRIGGER_COUNT, count.as_f64())
    }

    /// Query the identification string of the instrument.
    ///
    /// A simulated instrument reports a fixed identification with the model number.
    fn get_name(&mut self) -> Result<String, InstrumentError> {
        if self.is_simulated() {
            return Ok(format!("Agilent Technologies,{},SIMULATED,0.0", Self::MODEL));
        }
        Ok(self.session_mut().ask("*IDN?")?.trim().to_string())
    }

    /// Reset the instrument to its power-on state.
    ///
    /// All cached values are invalidated.
    fn reset(&mut self) -> Result<(), InstrumentError> {
        self.send("*RST")?;
        self.invalidate_all();
        Ok(())
    }

    /// Clear the status registers and the error queue.
    fn clear_status(&mut self) -> Result<(), InstrumentError> {
        self.send("*CLS")
    }

    /// Read the oldest entry of the error queue as error code and message.
    ///
    /// An empty queue returns `(0, "No error")`.
    fn error_query(&mut self) -> Result<(i32, String), InstrumentError> {
        if self.is_simulated() {
            return Ok((NO_ERROR.0, NO_ERROR.1.to_string()));
        }
        let resp = self.session_mut().ask("syst:err?")?;
        parse_error_entry(&resp)
    }

    /// Read the oldest entry of the error queue and turn it into an error if there is one.
    ///
    /// Returns [`InstrumentError::InstrumentStatus`] with code and message of the entry.
    fn check_errors(&mut self) -> Result<(), InstrumentError> {
        match self.error_query()? {
            (0, _) => Ok(()),
            (code, msg) => Err(InstrumentError::InstrumentStatus(format!("{code}: {msg}"))),
        }
    }

    /// Arm the trigger system, readings are stored in the instrument memory.
    fn initiate(&mut self) -> Result<(), InstrumentError> {
        self.send("init")
    }

    /// Abort a measurement in progress.
    fn abort(&mut self) -> Result<(), InstrumentError> {
        self.send("abor")
    }

    /// Transfer all readings from the instrument memory after [`Dmm::initiate`].
    fn fetch(&mut self) -> Result<Vec<DmmMeasurement>, InstrumentError> {
        let function = reading_function(self)?;
        if self.is_simulated() {
            return Ok(vec![DmmMeasurement::from_value(function, 0.0)]);
        }
        let resp = self.session_mut().ask("fetc?")?;
        Ok(parse_readings(&resp)?
            .into_iter()
            .map(|value| DmmMeasurement::from_value(function, value))
            .collect())
    }

    /// Trigger a measurement and return the reading.
    ///
    /// If more than one sample is configured, the first one is returned.
    fn read(&mut self) -> Result<DmmMeasurement, InstrumentError> {
        let function = reading_function(self)?;
        if self.is_simulated() {
            return Ok(DmmMeasurement::from_value(function, 0.0));
        }
        let resp = self.session_mut().ask("read?")?;
        let value = parse_readings(&resp)?
            .into_iter()
            .next()
            .ok_or(InstrumentError::ResponseParseError(resp))?;
        Ok(DmmMeasurement::from_value(function, value))
    }

    /// Send a command without response, unless the instrument is simulated.
    fn send(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        if self.is_simulated() {
            return Ok(());
        }
        self.session_mut().write(cmd)
    }
}

/// Active function for unit conversion, `None` if the driver does not know it.
fn reading_function<D: Dmm + ?Sized>(
    dmm: &mut D,
) -> Result<Option<MeasurementFunction>, InstrumentError> {
    match dmm.get_function() {
        Ok(function) => Ok(Some(function)),
        Err(InstrumentError::UnsupportedFunction(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Parse a comma separated list of readings, e.g., `+1.2E+00,+1.3E+00`.
fn parse_readings(resp: &str) -> Result<Vec<f64>, InstrumentError> {
    resp.split(',')
        .map(|val| {
            val.trim()
                .parse::<f64>()
                .map_err(|_| InstrumentError::ResponseParseError(resp.to_string()))
        })
        .collect()
}

/// Parse an error queue entry, e.g., `-113,"Undefined header"`.
fn parse_error_entry(resp: &str) -> Result<(i32, String), InstrumentError> {
    let err = || InstrumentError::ResponseParseError(resp.to_string());
    let (code, msg) = resp.split_once(',').ok_or_else(err)?;
    let code = code.trim().parse::<i32>().map_err(|_| err())?;
    Ok((code, msg.trim().trim_matches('"').to_string()))
}

fn check_float(value: f64, min: f64, max: f64) -> Result<(), InstrumentError> {
    if !(min..=max).contains(&value) {
        return Err(InstrumentError::FloatValueOutOfRange { value, min, max });
    }
    Ok(())
}

fn float(value: PropertyValue) -> Result<f64, InstrumentError> {
    value
        .as_float()
        .ok_or_else(|| InstrumentError::ResponseParseError(value.to_string()))
}

fn duration(value: PropertyValue) -> Result<Duration, InstrumentError> {
    let secs = float(value)?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| InstrumentError::ResponseParseError(secs.to_string()))
}

fn count(value: PropertyValue) -> Result<u32, InstrumentError> {
    value
        .as_int()
        .and_then(|val| u32::try_from(val).ok())
        .ok_or_else(|| InstrumentError::ResponseParseError(value.to_string()))
}
