//! The Agilent/Keysight 34461A, base model of the family.

use std::{fmt::Display, str::FromStr};

use instrumentrs::{
    CachedProperty, Dispatch, InstrumentError, InstrumentInterface, PropertyKind, PropertyRegistry,
    PropertyValue, Session, SessionConfig, VocabularyTable,
};

use crate::{Dmm, DmmSession, MeasurementFunction, vocabulary};

pub(crate) const FUNCTION: &str = "measurement.function";
pub(crate) const RANGE: &str = "range";
pub(crate) const AUTO_RANGE: &str = "auto_range";
pub(crate) const TRIGGER_SOURCE: &str = "trigger.source";
pub(crate) const TRIGGER_DELAY: &str = "trigger.delay";
pub(crate) const SAMPLE_COUNT: &str = "trigger.multi_point.sample_count";
pub(crate) const TRIGGER_COUNT: &str = "trigger.multi_point.count";

/// Response of the instrument for an infinite count.
const SCPI_INFINITY: f64 = 9.9e37;

/// Sources the trigger system can be armed with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// Trigger immediately, the power-on default.
    #[default]
    Immediate,
    /// Software trigger via `*TRG`.
    Bus,
    /// Trigger input on the rear panel.
    External,
}

impl TriggerSource {
    const ALL: [TriggerSource; 3] = [
        TriggerSource::Immediate,
        TriggerSource::Bus,
        TriggerSource::External,
    ];

    /// Name of the source as it is cached in the `trigger.source` property.
    pub fn name(&self) -> &'static str {
        match self {
            TriggerSource::Immediate => "immediate",
            TriggerSource::Bus => "bus",
            TriggerSource::External => "external",
        }
    }

    fn as_cmd_str(&self) -> &'static str {
        match self {
            TriggerSource::Immediate => "imm",
            TriggerSource::Bus => "bus",
            TriggerSource::External => "ext",
        }
    }

    fn from_cmd_str(token: &str) -> Result<Self, InstrumentError> {
        match token {
            "imm" | "immediate" => Ok(TriggerSource::Immediate),
            "bus" => Ok(TriggerSource::Bus),
            "ext" | "external" => Ok(TriggerSource::External),
            _ => Err(InstrumentError::ResponseParseError(token.to_string())),
        }
    }
}

impl Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for TriggerSource {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TriggerSource::ALL
            .into_iter()
            .find(|src| src.name() == s)
            .ok_or_else(|| InstrumentError::ResponseParseError(s.to_string()))
    }
}

/// Number of triggers that are accepted before the instrument returns to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCount {
    /// A fixed number of triggers.
    Finite(u32),
    /// Accept triggers until the measurement is aborted.
    Infinite,
}

impl TriggerCount {
    /// Count as it is cached in the `trigger.multi_point.count` property.
    pub fn as_f64(&self) -> f64 {
        match self {
            TriggerCount::Finite(count) => f64::from(*count),
            TriggerCount::Infinite => f64::INFINITY,
        }
    }

    pub(crate) fn from_f64(value: f64) -> Result<Self, InstrumentError> {
        if value == f64::INFINITY {
            Ok(TriggerCount::Infinite)
        } else if value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value) {
            Ok(TriggerCount::Finite(value as u32))
        } else {
            Err(InstrumentError::ResponseParseError(value.to_string()))
        }
    }
}

impl Display for TriggerCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerCount::Finite(count) => write!(f, "{count}"),
            TriggerCount::Infinite => write!(f, "infinite"),
        }
    }
}

type Res<T> = Result<T, InstrumentError>;

/// Query a fixed command and parse the response into the given kind.
pub(crate) fn ask_value<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
    cmd: &str,
    kind: PropertyKind,
) -> Res<Option<PropertyValue>> {
    let resp = s.ask(cmd)?;
    PropertyValue::parse(kind, &resp).map(Some)
}

/// Write a value to a fixed command.
pub(crate) fn write_value<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
    cmd: &str,
    value: &PropertyValue,
) -> Res<Dispatch> {
    s.write(&format!("{cmd} {value}"))?;
    Ok(Dispatch::Applied)
}

/// Query the command of the active function and parse the response into the given kind.
pub(crate) fn ask_scoped_value<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
    table: &VocabularyTable<MeasurementFunction>,
    kind: PropertyKind,
) -> Res<Option<PropertyValue>> {
    s.ask_scoped(table)?
        .map(|resp| PropertyValue::parse(kind, &resp))
        .transpose()
}

// An unknown token is cached as is and surfaces as unsupported function.
fn get_function<T: InstrumentInterface>(s: &mut DmmSession<T>) -> Res<Option<PropertyValue>> {
    let token = PropertyValue::normalize(&s.ask("func?")?);
    let name = match MeasurementFunction::from_cmd_str(&token) {
        Some(func) => func.name().to_string(),
        None => token,
    };
    Ok(Some(PropertyValue::Text(name)))
}

fn set_function<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
    value: &PropertyValue,
) -> Res<Dispatch> {
    let func: MeasurementFunction = value.to_string().parse()?;
    s.write(&format!("func \"{}\"", func.as_cmd_str()))?;
    Ok(Dispatch::Applied)
}

fn get_range<T: InstrumentInterface>(s: &mut DmmSession<T>) -> Res<Option<PropertyValue>> {
    ask_scoped_value(s, &vocabulary::RANGE, PropertyKind::Float)
}

fn set_range<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
    value: &PropertyValue,
) -> Res<Dispatch> {
    s.write_scoped(&vocabulary::RANGE, value)
}

fn get_auto_range<T: InstrumentInterface>(s: &mut DmmSession<T>) -> Res<Option<PropertyValue>> {
    ask_scoped_value(s, &vocabulary::AUTO_RANGE, PropertyKind::Bool)
}

fn set_auto_range<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
    value: &PropertyValue,
) -> Res<Dispatch> {
    s.write_scoped(&vocabulary::AUTO_RANGE, value)
}

fn get_trigger_source<T: InstrumentInterface>(s: &mut DmmSession<T>) -> Res<Option<PropertyValue>> {
    let token = PropertyValue::normalize(&s.ask("trig:sour?")?);
    let source = TriggerSource::from_cmd_str(&token)?;
    Ok(Some(source.name().into()))
}

fn set_trigger_source<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
    value: &PropertyValue,
) -> Res<Dispatch> {
    let source: TriggerSource = value.to_string().parse()?;
    s.write(&format!("trig:sour {}", source.as_cmd_str()))?;
    Ok(Dispatch::Applied)
}

fn get_trigger_delay<T: InstrumentInterface>(s: &mut DmmSession<T>) -> Res<Option<PropertyValue>> {
    ask_value(s, "trig:del?", PropertyKind::Float)
}

fn set_trigger_delay<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
    value: &PropertyValue,
) -> Res<Dispatch> {
    write_value(s, "trig:del", value)
}

fn get_sample_count<T: InstrumentInterface>(s: &mut DmmSession<T>) -> Res<Option<PropertyValue>> {
    ask_value(s, "samp:coun?", PropertyKind::Int)
}

fn set_sample_count<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
    value: &PropertyValue,
) -> Res<Dispatch> {
    write_value(s, "samp:coun", value)
}

// An infinite count is answered with 9.9E+37.
fn get_trigger_count<T: InstrumentInterface>(s: &mut DmmSession<T>) -> Res<Option<PropertyValue>> {
    match PropertyValue::parse(PropertyKind::Float, &s.ask("trig:coun?")?)? {
        PropertyValue::Float(count) if count >= SCPI_INFINITY => Ok(Some(f64::INFINITY.into())),
        count => Ok(Some(count)),
    }
}

fn set_trigger_count<T: InstrumentInterface>(
    s: &mut DmmSession<T>,
    value: &PropertyValue,
) -> Res<Dispatch> {
    if value.as_float() == Some(f64::INFINITY) {
        s.write("trig:coun inf")?;
        return Ok(Dispatch::Applied);
    }
    write_value(s, "trig:coun", value)
}

/// All properties of the 34461A. Defaults are the power-on state of the instrument.
pub(crate) fn registry<T: InstrumentInterface>() -> PropertyRegistry<T, MeasurementFunction> {
    [
        CachedProperty::new(
            FUNCTION,
            MeasurementFunction::default().name(),
            get_function,
        )
        .with_setter(set_function)
        .with_legal_values(MeasurementFunction::ALL.map(|func| func.name())),
        CachedProperty::new(RANGE, 10.0, get_range)
            .with_setter(set_range)
            .function_scoped()
            .invalidates(&[AUTO_RANGE]),
        CachedProperty::new(AUTO_RANGE, true, get_auto_range)
            .with_setter(set_auto_range)
            .function_scoped()
            .invalidates(&[RANGE]),
        CachedProperty::new(
            TRIGGER_SOURCE,
            TriggerSource::default().name(),
            get_trigger_source,
        )
        .with_setter(set_trigger_source)
        .with_legal_values(TriggerSource::ALL.map(|src| src.name())),
        CachedProperty::new(TRIGGER_DELAY, 0.0, get_trigger_delay)
            .with_setter(set_trigger_delay),
        CachedProperty::new(SAMPLE_COUNT, 1i64, get_sample_count)
            .with_setter(set_sample_count),
        CachedProperty::new(TRIGGER_COUNT, 1.0, get_trigger_count)
            .with_setter(set_trigger_count),
    ]
    .into_iter()
    .collect()
}

/// A rust driver for the Agilent/Keysight 34461A.
///
/// # Example
/// ```no_run
/// use agilent_344xx::{Agilent34461a, Dmm, MeasurementFunction};
/// use instrumentrs::TcpIpInterface;
///
/// let interface = TcpIpInterface::scpi("192.168.1.10").unwrap();
/// let mut dmm = Agilent34461a::try_new(interface).unwrap();
///
/// dmm.set_function(MeasurementFunction::TwoWireResistance).unwrap();
/// dmm.set_auto_range(true).unwrap();
/// println!("Resistance: {}", dmm.read().unwrap());
/// ```
pub struct Agilent34461a<T: InstrumentInterface> {
    session: DmmSession<T>,
}

impl<T: InstrumentInterface> Agilent34461a<T> {
    /// Create a new 34461A instance with the given instrument interface.
    ///
    /// No commands are sent here. All properties are read from the instrument the first time they
    /// are accessed.
    ///
    /// # Arguments
    /// - `interface`: An instrument interface that implements the [`InstrumentInterface`] trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        Self::with_config(interface, SessionConfig::default())
    }

    /// Create a new 34461A instance with a given session configuration, e.g., to simulate it.
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
}

impl<T: InstrumentInterface> Dmm for Agilent34461a<T> {
    type Interface = T;

    const MODEL: &'static str = "34461A";

    fn session(&self) -> &DmmSession<T> {
        &self.session
    }

    fn session_mut(&mut self) -> &mut DmmSession<T> {
        &mut self.session
    }
}
