//! Module to convert readings into unitful values.

use std::{fmt::Display, time::Duration};

use measurements::{Current, Frequency, Resistance, Temperature, Voltage};

use crate::MeasurementFunction;

/// A single reading of the multimeter.
///
/// The unit of the reading depends on the measurement function that was active when it was taken.
/// Functions without a matching quantity in the `measurements` crate, e.g., capacitance, return
/// the raw value in the native unit of the instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum DmmMeasurement {
    /// DC or AC voltage.
    Voltage(Voltage),
    /// DC or AC current.
    Current(Current),
    /// Two- or four-wire resistance, also continuity.
    Resistance(Resistance),
    /// Frequency.
    Frequency(Frequency),
    /// Period.
    Period(Duration),
    /// Temperature, the instrument is assumed to report in degrees Celsius.
    Temperature(Temperature),
    /// Any other reading in instrument-native units.
    Raw(f64),
}

impl DmmMeasurement {
    /// Convert a raw reading for the given function into a measurement.
    ///
    /// If the function is unknown, the raw value is returned.
    pub fn from_value(function: Option<MeasurementFunction>, value: f64) -> Self {
        match function {
            Some(
                MeasurementFunction::DcVolts
                | MeasurementFunction::AcVolts
                | MeasurementFunction::Diode,
            ) => DmmMeasurement::Voltage(Voltage::from_volts(value)),
            Some(MeasurementFunction::DcCurrent | MeasurementFunction::AcCurrent) => {
                DmmMeasurement::Current(Current::from_amperes(value))
            }
            Some(
                MeasurementFunction::TwoWireResistance
                | MeasurementFunction::FourWireResistance
                | MeasurementFunction::Continuity,
            ) => DmmMeasurement::Resistance(Resistance::from_ohms(value)),
            Some(MeasurementFunction::Frequency) => {
                DmmMeasurement::Frequency(Frequency::from_hertz(value))
            }
            // overload is reported as 9.9E+37, which does not fit into a duration
            Some(MeasurementFunction::Period) => match Duration::try_from_secs_f64(value) {
                Ok(period) => DmmMeasurement::Period(period),
                Err(_) => DmmMeasurement::Raw(value),
            },
            Some(MeasurementFunction::Temperature) => {
                DmmMeasurement::Temperature(Temperature::from_celsius(value))
            }
            Some(MeasurementFunction::Capacitance) | None => DmmMeasurement::Raw(value),
        }
    }
}

impl Display for DmmMeasurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DmmMeasurement::Voltage(v) => write!(f, "{v}"),
            DmmMeasurement::Current(c) => write!(f, "{c}"),
            DmmMeasurement::Resistance(r) => write!(f, "{r}"),
            DmmMeasurement::Frequency(fr) => write!(f, "{fr}"),
            DmmMeasurement::Period(p) => write!(f, "{p:?}"),
            DmmMeasurement::Temperature(t) => write!(f, "{t}"),
            DmmMeasurement::Raw(val) => write!(f, "{val}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(MeasurementFunction::DcVolts)]
    #[case(MeasurementFunction::AcVolts)]
    #[case(MeasurementFunction::Diode)]
    fn test_voltage(#[case] func: MeasurementFunction) {
        match DmmMeasurement::from_value(Some(func), 1.5) {
            DmmMeasurement::Voltage(v) => assert_eq!(v.as_volts(), 1.5),
            other => panic!("Expected a voltage measurement, got {other:?}"),
        }
    }

    #[rstest]
    fn test_current() {
        match DmmMeasurement::from_value(Some(MeasurementFunction::DcCurrent), 0.002) {
            DmmMeasurement::Current(c) => assert_eq!(c.as_amperes(), 0.002),
            other => panic!("Expected a current measurement, got {other:?}"),
        }
    }

    #[rstest]
    fn test_resistance() {
        match DmmMeasurement::from_value(Some(MeasurementFunction::FourWireResistance), 100.0) {
            DmmMeasurement::Resistance(r) => assert_eq!(r.as_ohms(), 100.0),
            other => panic!("Expected a resistance measurement, got {other:?}"),
        }
    }

    #[rstest]
    fn test_frequency() {
        match DmmMeasurement::from_value(Some(MeasurementFunction::Frequency), 1000.0) {
            DmmMeasurement::Frequency(fr) => assert_eq!(fr.as_hertz(), 1000.0),
            other => panic!("Expected a frequency measurement, got {other:?}"),
        }
    }

    #[rstest]
    fn test_temperature() {
        match DmmMeasurement::from_value(Some(MeasurementFunction::Temperature), 21.5) {
            DmmMeasurement::Temperature(t) => assert!((t.as_celsius() - 21.5).abs() < 1e-9),
            other => panic!("Expected a temperature measurement, got {other:?}"),
        }
    }

    #[rstest]
    #[case(0.001, DmmMeasurement::Period(Duration::from_millis(1)))]
    #[case(9.9e37, DmmMeasurement::Raw(9.9e37))]
    #[case(-1.0, DmmMeasurement::Raw(-1.0))]
    fn test_period(#[case] value: f64, #[case] exp: DmmMeasurement) {
        assert_eq!(
            DmmMeasurement::from_value(Some(MeasurementFunction::Period), value),
            exp
        );
    }

    #[rstest]
    #[case(Some(MeasurementFunction::Capacitance))]
    #[case(None)]
    fn test_raw(#[case] func: Option<MeasurementFunction>) {
        assert_eq!(
            DmmMeasurement::from_value(func, 1e-9),
            DmmMeasurement::Raw(1e-9)
        );
    }
}
