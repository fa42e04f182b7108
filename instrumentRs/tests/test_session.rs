//! Tests for the property engine: cache, simulation, and function-scoped dispatch.
//!
//! A small instrument with three measurement functions is declared here. Only volts and amps have
//! aperture and auto-zero commands, hertz has neither.

use std::{collections::VecDeque, fmt, io, str::FromStr, time::Duration};

use rstest::*;

use instrumentrs::{
    CachedProperty, Dispatch, Instrument, InstrumentError, InstrumentInterface,
    LoopbackInterfaceString, PropertyKind, PropertyRegistry, PropertyValue, Session, SessionConfig,
    VocabularyTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Volts,
    Amps,
    Hertz,
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Func::Volts => "volts",
            Func::Amps => "amps",
            Func::Hertz => "hertz",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Func {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volts" => Ok(Func::Volts),
            "amps" => Ok(Func::Amps),
            "hertz" => Ok(Func::Hertz),
            _ => Err(()),
        }
    }
}

static APERTURE: VocabularyTable<Func> = VocabularyTable::new(
    "aperture",
    &[(Func::Volts, "volt:aper"), (Func::Amps, "curr:aper")],
);

static AUTO_ZERO: VocabularyTable<Func> = VocabularyTable::new(
    "auto-zero",
    &[(Func::Volts, "volt:zero"), (Func::Amps, "curr:zero")],
);

type Res<T> = Result<T, InstrumentError>;

fn get_function<T: InstrumentInterface>(s: &mut Session<T, Func>) -> Res<Option<PropertyValue>> {
    let resp = s.ask("func?")?;
    PropertyValue::parse(PropertyKind::Text, &resp).map(Some)
}

fn set_function<T: InstrumentInterface>(
    s: &mut Session<T, Func>,
    v: &PropertyValue,
) -> Res<Dispatch> {
    s.write(&format!("func {v}"))?;
    Ok(Dispatch::Applied)
}

fn get_aperture<T: InstrumentInterface>(s: &mut Session<T, Func>) -> Res<Option<PropertyValue>> {
    s.ask_scoped(&APERTURE)?
        .map(|resp| PropertyValue::parse(PropertyKind::Float, &resp))
        .transpose()
}

fn set_aperture<T: InstrumentInterface>(
    s: &mut Session<T, Func>,
    v: &PropertyValue,
) -> Res<Dispatch> {
    s.write_scoped(&APERTURE, v)
}

fn get_auto_zero<T: InstrumentInterface>(s: &mut Session<T, Func>) -> Res<Option<PropertyValue>> {
    s.ask_scoped(&AUTO_ZERO)?
        .map(|resp| PropertyValue::parse(PropertyKind::Text, &resp))
        .transpose()
}

fn set_auto_zero<T: InstrumentInterface>(
    s: &mut Session<T, Func>,
    v: &PropertyValue,
) -> Res<Dispatch> {
    s.write_scoped(&AUTO_ZERO, v)
}

fn get_interval<T: InstrumentInterface>(s: &mut Session<T, Func>) -> Res<Option<PropertyValue>> {
    let resp = s.ask("samp:tim?")?;
    PropertyValue::parse(PropertyKind::Float, &resp).map(Some)
}

fn set_interval<T: InstrumentInterface>(
    s: &mut Session<T, Func>,
    v: &PropertyValue,
) -> Res<Dispatch> {
    s.write(&format!("samp:tim {v}"))?;
    Ok(Dispatch::Applied)
}

fn get_identity<T: InstrumentInterface>(s: &mut Session<T, Func>) -> Res<Option<PropertyValue>> {
    s.ask("*IDN?").map(|resp| Some(PropertyValue::Text(resp)))
}

fn registry<T: InstrumentInterface>() -> PropertyRegistry<T, Func> {
    [
        CachedProperty::new("function", "volts", get_function)
            .with_setter(set_function)
            .with_legal_values(["volts", "amps", "hertz"]),
        CachedProperty::new("advanced.aperture_time", 0.1, get_aperture)
            .with_setter(set_aperture)
            .function_scoped(),
        CachedProperty::new("advanced.auto_zero", "on", get_auto_zero)
            .with_setter(set_auto_zero)
            .with_legal_values(["on", "off", "once"])
            .function_scoped(),
        CachedProperty::new("trigger.sample_interval", 0.001, get_interval)
            .with_setter(set_interval),
        CachedProperty::new("identity", "", get_identity),
    ]
    .into_iter()
    .collect()
}

type Sess = Session<LoopbackInterfaceString, Func>;

/// Interface that answers every query with `+5.0E-03` and refuses all other commands.
#[derive(Default)]
struct QueryOnlyPort {
    pending: VecDeque<u8>,
}

impl InstrumentInterface for QueryOnlyPort {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        for byte in buf.iter_mut() {
            *byte = self
                .pending
                .pop_front()
                .ok_or(InstrumentError::Timeout(Duration::ZERO))?;
        }
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        if !data.ends_with(b"?\n") {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe).into());
        }
        self.pending.extend(b"+5.0E-03\n");
        Ok(())
    }
}

fn crt_session(host2inst: Vec<&str>, inst2host: Vec<&str>, config: SessionConfig) -> Sess {
    let h2i = host2inst.iter().map(|s| s.to_string()).collect();
    let i2h = inst2host.iter().map(|s| s.to_string()).collect();
    let interface = LoopbackInterfaceString::new(h2i, i2h, "\n");
    Session::new(interface, config, "function", registry()).unwrap()
}

#[fixture]
fn sim_session() -> Sess {
    crt_session(vec![], vec![], SessionConfig::simulated())
}

/// All properties are invalid when a session starts.
#[rstest]
fn test_new_session_is_invalid(sim_session: Sess) {
    for name in sim_session.names() {
        assert!(!sim_session.is_valid(name).unwrap());
    }
}

/// Enumeration follows registration order.
#[rstest]
fn test_enumerate(sim_session: Sess) {
    assert_eq!(
        sim_session.names().collect::<Vec<_>>(),
        vec![
            "function",
            "advanced.aperture_time",
            "advanced.auto_zero",
            "trigger.sample_interval",
            "identity",
        ]
    );
    let auto_zero = sim_session.property("advanced.auto_zero").unwrap();
    assert!(auto_zero.is_function_scoped());
    assert!(sim_session.property("identity").unwrap().is_read_only());
}

#[rstest]
fn test_missing_function_property() {
    let interface = LoopbackInterfaceString::new(vec![], vec![], "\n");
    let registry: PropertyRegistry<_, Func> = PropertyRegistry::new();
    match Session::new(interface, SessionConfig::default(), "function", registry) {
        Err(InstrumentError::UnknownProperty(name)) => assert_eq!(name, "function"),
        other => panic!("Expected unknown property, got {other:?}"),
    }
}

/// The second read is served from the cache, the loopback would panic otherwise.
#[rstest]
fn test_cache_coherence() {
    let mut sess = crt_session(
        vec!["samp:tim?"],
        vec!["+1.00000000E-03"],
        SessionConfig::default(),
    );
    let first = sess.get("trigger.sample_interval").unwrap();
    let second = sess.get("trigger.sample_interval").unwrap();
    assert_eq!(first, PropertyValue::Float(0.001));
    assert_eq!(first, second);
    assert!(sess.is_valid("trigger.sample_interval").unwrap());
}

/// Without caching, every read goes to the instrument.
#[rstest]
fn test_cache_disabled() {
    let mut sess = crt_session(
        vec!["func?", "volt:aper?", "func?", "volt:aper?"],
        vec!["\"VOLTS\"", "+1.0E-01", "\"VOLTS\"", "+2.0E-01"],
        SessionConfig::default().with_cache(false),
    );
    assert_eq!(
        sess.get("advanced.aperture_time").unwrap(),
        PropertyValue::Float(0.1)
    );
    assert_eq!(
        sess.get("advanced.aperture_time").unwrap(),
        PropertyValue::Float(0.2)
    );
}

/// An empty loopback panics on any I/O, so nothing here talks to the instrument.
#[rstest]
fn test_simulation_isolation(mut sim_session: Sess) {
    assert!(sim_session.simulating());
    assert_eq!(
        sim_session.get("advanced.auto_zero").unwrap(),
        PropertyValue::from("on")
    );

    sim_session.set("advanced.aperture_time", 0.5).unwrap();
    assert_eq!(
        sim_session.get("advanced.aperture_time").unwrap(),
        PropertyValue::Float(0.5)
    );
    assert!(sim_session.is_valid("advanced.aperture_time").unwrap());

    sim_session.set("function", "hertz").unwrap();
    sim_session.set("advanced.auto_zero", "once").unwrap();
    assert_eq!(
        sim_session.get("advanced.auto_zero").unwrap(),
        PropertyValue::from("once")
    );
    assert_eq!(sim_session.current_function().unwrap(), Func::Hertz);
}

/// The command keyword follows the active function.
#[rstest]
fn test_function_scoped_dispatch() {
    let mut sess = crt_session(
        vec!["func?", "volt:aper?", "func amps", "curr:aper?"],
        vec!["\"VOLTS\"", "+1.0E-01", "+2.0E-02"],
        SessionConfig::default(),
    );
    assert_eq!(
        sess.get("advanced.aperture_time").unwrap(),
        PropertyValue::Float(0.1)
    );

    sess.set("function", "amps").unwrap();
    assert!(!sess.is_valid("advanced.aperture_time").unwrap());
    assert!(!sess.is_valid("trigger.sample_interval").unwrap());

    assert_eq!(
        sess.get("advanced.aperture_time").unwrap(),
        PropertyValue::Float(0.02)
    );
    assert_eq!(sess.current_function().unwrap(), Func::Amps);
}

#[rstest]
fn test_set_scoped_writes_keyword() {
    let mut sess = crt_session(
        vec!["func?", "curr:aper 0.2"],
        vec!["amps"],
        SessionConfig::default(),
    );
    sess.set("advanced.aperture_time", 0.2).unwrap();
    assert!(sess.is_valid("advanced.aperture_time").unwrap());
    assert_eq!(
        sess.get("advanced.aperture_time").unwrap(),
        PropertyValue::Float(0.2)
    );
}

/// A rejected value leaves value and validity untouched.
#[rstest]
fn test_invalid_value_rejection() {
    let mut sess = crt_session(
        vec!["func?", "volt:zero?"],
        vec!["volts", "ON"],
        SessionConfig::default(),
    );
    assert_eq!(
        sess.get("advanced.auto_zero").unwrap(),
        PropertyValue::from("on")
    );

    match sess.set("advanced.auto_zero", "sometimes") {
        Err(InstrumentError::ValueNotSupported { property, value }) => {
            assert_eq!(property, "advanced.auto_zero");
            assert_eq!(value, "sometimes");
        }
        other => panic!("Expected value not supported, got {other:?}"),
    }
    assert!(sess.is_valid("advanced.auto_zero").unwrap());
    assert_eq!(
        sess.get("advanced.auto_zero").unwrap(),
        PropertyValue::from("on")
    );
}

/// Values of the wrong kind are rejected as well.
#[rstest]
fn test_wrong_kind_rejection(mut sim_session: Sess) {
    assert!(matches!(
        sim_session.set("advanced.aperture_time", "fast"),
        Err(InstrumentError::ValueNotSupported { .. })
    ));
    assert!(!sim_session.is_valid("advanced.aperture_time").unwrap());
}

/// Reading a capability that the active function does not have returns the cache and only
/// resolves the function.
#[rstest]
fn test_not_applicable_get() {
    let mut sess = crt_session(vec!["func?"], vec!["\"HERTZ\""], SessionConfig::default());
    assert_eq!(
        sess.get("advanced.auto_zero").unwrap(),
        PropertyValue::from("on")
    );
    assert!(!sess.is_valid("advanced.auto_zero").unwrap());

    // function is cached now, still nothing to ask
    assert_eq!(
        sess.get("advanced.auto_zero").unwrap(),
        PropertyValue::from("on")
    );
}

/// Writing a capability that the active function does not have only updates the cache.
#[rstest]
fn test_not_applicable_set() {
    let mut sess = crt_session(vec!["func?"], vec!["hertz"], SessionConfig::default());
    sess.set("advanced.auto_zero", "off").unwrap();
    assert!(!sess.is_valid("advanced.auto_zero").unwrap());
    assert_eq!(
        sess.get("advanced.auto_zero").unwrap(),
        PropertyValue::from("off")
    );
}

/// A function the driver does not know makes function-scoped capabilities not applicable.
#[rstest]
fn test_unsupported_function() {
    let mut sess = crt_session(
        vec!["func?"],
        vec!["\"VOLT:RAT\""],
        SessionConfig::default(),
    );
    match sess.current_function() {
        Err(InstrumentError::UnsupportedFunction(token)) => assert_eq!(token, "volt:rat"),
        other => panic!("Expected unsupported function, got {other:?}"),
    }
    assert_eq!(
        sess.get("advanced.aperture_time").unwrap(),
        PropertyValue::Float(0.1)
    );
}

/// Writing a scoped capability while the function is unknown only updates the cache.
#[rstest]
fn test_set_with_unsupported_function() {
    let mut sess = crt_session(
        vec!["func?"],
        vec!["\"VOLT:RAT\""],
        SessionConfig::default(),
    );
    sess.set("advanced.aperture_time", 0.3).unwrap();
    assert!(!sess.is_valid("advanced.aperture_time").unwrap());
    assert_eq!(
        sess.get("advanced.aperture_time").unwrap(),
        PropertyValue::Float(0.3)
    );
}

#[rstest]
fn test_round_trip() {
    let mut sess = crt_session(
        vec!["samp:tim 0.01", "samp:tim?"],
        vec!["+1.00000000E-02"],
        SessionConfig::default(),
    );
    sess.set("trigger.sample_interval", 0.01).unwrap();
    assert_eq!(
        sess.get("trigger.sample_interval").unwrap(),
        PropertyValue::Float(0.01)
    );

    sess.invalidate("trigger.sample_interval").unwrap();
    assert_eq!(
        sess.get("trigger.sample_interval").unwrap(),
        PropertyValue::Float(0.01)
    );
}

/// Re-reading the function only invalidates scoped properties if the function changed.
#[rstest]
fn test_function_change_on_read() {
    let mut sess = crt_session(
        vec!["func?", "volt:aper?", "func?", "func?", "curr:aper?"],
        vec!["volts", "+1.0E-01", "volts", "amps", "+3.0E-01"],
        SessionConfig::default(),
    );
    sess.get("advanced.aperture_time").unwrap();

    sess.invalidate("function").unwrap();
    sess.get("function").unwrap();
    assert!(sess.is_valid("advanced.aperture_time").unwrap());

    sess.invalidate("function").unwrap();
    assert_eq!(sess.get("function").unwrap(), PropertyValue::from("amps"));
    assert!(!sess.is_valid("advanced.aperture_time").unwrap());
    assert_eq!(
        sess.get("advanced.aperture_time").unwrap(),
        PropertyValue::Float(0.3)
    );
}

#[rstest]
fn test_invalidate_all() {
    let mut sess = crt_session(
        vec!["samp:tim?", "samp:tim?"],
        vec!["0.001", "0.002"],
        SessionConfig::default(),
    );
    sess.get("trigger.sample_interval").unwrap();
    sess.invalidate_all();
    assert_eq!(
        sess.get("trigger.sample_interval").unwrap(),
        PropertyValue::Float(0.002)
    );
}

#[rstest]
fn test_unknown_property(mut sim_session: Sess) {
    assert!(matches!(
        sim_session.get("advanced.nope"),
        Err(InstrumentError::UnknownProperty(_))
    ));
    assert!(matches!(
        sim_session.set("advanced.nope", 1.0),
        Err(InstrumentError::UnknownProperty(_))
    ));
    assert!(matches!(
        sim_session.invalidate("advanced.nope"),
        Err(InstrumentError::UnknownProperty(_))
    ));
}

#[rstest]
fn test_read_only_property(mut sim_session: Sess) {
    match sim_session.set("identity", "fake") {
        Err(InstrumentError::ReadOnlyProperty(name)) => assert_eq!(name, "identity"),
        other => panic!("Expected read-only error, got {other:?}"),
    }
}

/// Transport errors are passed on unchanged and leave the cache invalid.
#[rstest]
fn test_transport_error_propagates() {
    let interface = Instrument::new(VecDeque::<u8>::new(), Duration::from_secs(0));
    let mut sess: Session<_, Func> =
        Session::new(interface, SessionConfig::default(), "function", registry()).unwrap();

    match sess.get("trigger.sample_interval") {
        Err(InstrumentError::TimeoutQuery { query, .. }) => assert_eq!(query, "samp:tim?"),
        other => panic!("Expected a query timeout, got {other:?}"),
    }
    assert!(!sess.is_valid("trigger.sample_interval").unwrap());
}

/// A write that fails in the transport leaves value and validity untouched.
#[rstest]
fn test_failed_set_keeps_cache() {
    let mut sess: Session<_, Func> = Session::new(
        QueryOnlyPort::default(),
        SessionConfig::default(),
        "function",
        registry(),
    )
    .unwrap();
    assert_eq!(
        sess.get("trigger.sample_interval").unwrap(),
        PropertyValue::Float(0.005)
    );

    match sess.set("trigger.sample_interval", 0.01) {
        Err(InstrumentError::Io(err)) => assert_eq!(err.kind(), io::ErrorKind::BrokenPipe),
        other => panic!("Expected an I/O error, got {other:?}"),
    }
    assert!(sess.is_valid("trigger.sample_interval").unwrap());
    assert_eq!(
        sess.get("trigger.sample_interval").unwrap(),
        PropertyValue::Float(0.005)
    );
}
