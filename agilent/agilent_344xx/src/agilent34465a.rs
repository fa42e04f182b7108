//! The Agilent/Keysight 34465A: all of the 34461A plus auto-zero, aperture, and sample interval.

use std::{fmt::Display, str::FromStr, time::Duration};

use instrumentrs::{
    CachedProperty, Dispatch, InstrumentError, InstrumentInterface, PropertyKind, PropertyRegistry,
    PropertyValue, Session, SessionConfig,
};

use crate::agilent34461a::{self, FUNCTION, ask_scoped_value, ask_value, write_value};
use crate::{Dmm, DmmSession, MeasurementFunction, check_float, duration, vocabulary};

pub(crate) const AUTO_ZERO: &str = "advanced.auto_zero";
pub(crate) const APERTURE_TIME: &str = "advanced.aperture_time";
pub(crate) const SAMPLE_INTERVAL: &str = "trigger.multi_point.sample_interval";

/// Auto-zero modes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AutoZero {
    /// Zero reading after every measurement.
    #[default]
    On,
    /// Never take a zero reading.
    Off,
    /// Take one zero reading now, then turn auto-zero off.
    Once,
}

impl AutoZero {
    const ALL: [AutoZero; 3] = [AutoZero::On, AutoZero::Off, AutoZero::Once];

    /// Name of the mode, which is also the token sent to the instrument.
    pub fn name(&self) -> &'static str {
        match self {
            AutoZero::On => "on",
            AutoZero::Off => "off",
            AutoZero::Once => "once",
        }
    }

    fn from_cmd_str(token: &str) -> Result<Self, InstrumentError> {
        match token {
            "1" | "on" => Ok(AutoZero::On),
            "0" | "off" => Ok(AutoZero::Off),
            "once" => Ok(AutoZero::Once),
            _ => Err(InstrumentError::ResponseParseError(token.to_string())),
        }
    }
}

impl Display for AutoZero {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AutoZero {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AutoZero::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| InstrumentError::ResponseParseError(s.to_string()))
    }
}

type Res<T> = Result<T, InstrumentError>;

// The instrument answers 0/1, which is cached as off/on.
fn get_auto_zero<T: InstrumentInterface>(s: &mut DmmSession<T>) -> Res<Option<PropertyValue>> {
    match s.ask_scoped(&vocabulary::AUTO_ZERO)? {
        Some(token) => Ok(Some(AutoZero::from_cmd_str(&token)?.name().into())),
        None => Ok(None),
    }
}

// `once` zeroes a single time and leaves auto-zero off.
fn set_auto_zero<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
    value: &PropertyValue,
) -> Res<Dispatch> {
    let dispatch = s.write_scoped(&vocabulary::AUTO_ZERO, value)?;
    if dispatch == Dispatch::Applied && value.as_text() == Some(AutoZero::Once.name()) {
        return Ok(Dispatch::Transient);
    }
    Ok(dispatch)
}

fn get_aperture_time<T: InstrumentInterface>(s: &mut DmmSession<T>) -> Res<Option<PropertyValue>> {
    ask_scoped_value(s, &vocabulary::APERTURE, PropertyKind::Float)
}

fn set_aperture_time<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
    value: &PropertyValue,
) -> Res<Dispatch> {
    s.write_scoped(&vocabulary::APERTURE, value)
}

fn get_sample_interval<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
) -> Res<Option<PropertyValue>> {
    ask_value(s, "samp:tim?", PropertyKind::Float)
}

fn set_sample_interval<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
    value: &PropertyValue,
) -> Res<Dispatch> {
    write_value(s, "samp:tim", value)
}

/// All properties of the 34461A followed by the ones only the 34465A has.
pub(crate) fn registry<T: InstrumentInterface>() -> PropertyRegistry<T, MeasurementFunction> {
    let mut registry = agilent34461a::registry();
    registry.extend([
        CachedProperty::new(AUTO_ZERO, AutoZero::default().name(), get_auto_zero)
            .with_setter(set_auto_zero)
            .with_legal_values(AutoZero::ALL.map(|mode| mode.name()))
            .function_scoped(),
        CachedProperty::new(APERTURE_TIME, 0.1, get_aperture_time)
            .with_setter(set_aperture_time)
            .function_scoped(),
        CachedProperty::new(SAMPLE_INTERVAL, 0.001, get_sample_interval)
            .with_setter(set_sample_interval),
    ]);
    registry
}

/// A rust driver for the Agilent/Keysight 34465A.
///
/// Everything the [`crate::Agilent34461a`] can do is available through the [`Dmm`] trait.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
///
/// use agilent_344xx::{Agilent34465a, AutoZero, Dmm, MeasurementFunction};
/// use instrumentrs::TcpIpInterface;
///
/// let interface = TcpIpInterface::scpi("192.168.1.10").unwrap();
/// let mut dmm = Agilent34465a::try_new(interface).unwrap();
///
/// dmm.set_function(MeasurementFunction::DcCurrent).unwrap();
/// dmm.set_auto_zero(AutoZero::Off).unwrap();
/// dmm.set_aperture_time(Duration::from_millis(100)).unwrap();
/// println!("Current: {}", dmm.read().unwrap());
/// ```
pub struct Agilent34465a<T: InstrumentInterface> {
    session: DmmSession<T>,
}

impl<T: InstrumentInterface> Agilent34465a<T> {
    /// Create a new 34465A instance with the given instrument interface.
    ///
    /// No commands are sent here. All properties are read from the instrument the first time they
    /// are accessed.
    ///
    /// # Arguments
    /// - `interface`: An instrument interface that implements the [`InstrumentInterface`] trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        Self::with_config(interface, SessionConfig::default())
    }

    /// Create a new 34465A instance with a given session configuration, e.g., to simulate it.
    ///
    /// # Arguments
    /// - `interface`: An instrument interface that implements the [`InstrumentInterface`] trait.
    /// - `config`: Simulation and cache configuration.
    pub fn with_config(mut interface: T, config: SessionConfig) -> Result<Self, InstrumentError> {
        interface.set_terminator("\n");
        let session = Session::new(interface, config, FUNCTION, registry())?;
        Ok(Self { session })
    }

    /// Consume the driver and return the instrument interface.
    pub fn into_interface(self) -> T {
        self.session.into_interface()
    }

    /// Get the auto-zero mode of the active function.
    ///
    /// Functions without auto-zero, e.g., frequency, return the last cached mode.
    pub fn get_auto_zero(&mut self) -> Result<AutoZero, InstrumentError> {
        self.get(AUTO_ZERO)?.to_string().parse()
    }

    /// Set the auto-zero mode of the active function.
    ///
    /// Functions without auto-zero only cache the mode. After [`AutoZero::Once`], the instrument
    /// is left with auto-zero off, which the next read reports.
    pub fn set_auto_zero(&mut self, mode: AutoZero) -> Result<(), InstrumentError> {
        self.set(AUTO_ZERO, mode.name())
    }

    /// Get the integration aperture of the active function.
    pub fn get_aperture_time(&mut self) -> Result<Duration, InstrumentError> {
        duration(self.get(APERTURE_TIME)?)
    }

    /// Set the integration aperture of the active function, at most one second.
    pub fn set_aperture_time(&mut self, aperture: Duration) -> Result<(), InstrumentError> {
        let secs = aperture.as_secs_f64();
        check_float(secs, 0.0, 1.0)?;
        self.set(APERTURE_TIME, secs)
    }

    /// Get the interval between samples of a multi-point measurement.
    pub fn get_sample_interval(&mut self) -> Result<Duration, InstrumentError> {
        duration(self.get(SAMPLE_INTERVAL)?)
    }

    /// Set the interval between samples of a multi-point measurement, at most one hour.
    pub fn set_sample_interval(&mut self, interval: Duration) -> Result<(), InstrumentError> {
        let secs = interval.as_secs_f64();
        check_float(secs, 0.0, 3600.0)?;
        self.set(SAMPLE_INTERVAL, secs)
    }
}

impl<T: InstrumentInterface> Dmm for Agilent34465a<T> {
    type Interface = T;

    const MODEL: &'static str = "34465A";

    fn session(&self) -> &DmmSession<T> {
        &self.session
    }

    fn session_mut(&mut self) -> &mut DmmSession<T> {
        &mut self.session
    }
}
