//! Measurement functions of the 3446x family.

use std::{fmt::Display, str::FromStr};

/// All measurement functions a 3446x multimeter can be configured for.
///
/// The function is displayed with its IVI name, e.g., `dc_volts`, which is also the value that is
/// cached in the `measurement.function` property. On the wire, the SCPI token is used, see
/// [`MeasurementFunction::as_cmd_str`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementFunction {
    /// DC voltage, the power-on default.
    #[default]
    DcVolts,
    /// AC voltage.
    AcVolts,
    /// DC current.
    DcCurrent,
    /// AC current.
    AcCurrent,
    /// Two-wire resistance.
    TwoWireResistance,
    /// Four-wire resistance.
    FourWireResistance,
    /// Frequency.
    Frequency,
    /// Period.
    Period,
    /// Temperature.
    Temperature,
    /// Capacitance.
    Capacitance,
    /// Continuity test.
    Continuity,
    /// Diode test.
    Diode,
}

impl MeasurementFunction {
    /// All functions in the order they are listed in the manual.
    pub const ALL: [MeasurementFunction; 12] = [
        MeasurementFunction::DcVolts,
        MeasurementFunction::AcVolts,
        MeasurementFunction::DcCurrent,
        MeasurementFunction::AcCurrent,
        MeasurementFunction::TwoWireResistance,
        MeasurementFunction::FourWireResistance,
        MeasurementFunction::Frequency,
        MeasurementFunction::Period,
        MeasurementFunction::Temperature,
        MeasurementFunction::Capacitance,
        MeasurementFunction::Continuity,
        MeasurementFunction::Diode,
    ];

    /// IVI name of the function.
    pub fn name(&self) -> &'static str {
        match self {
            MeasurementFunction::DcVolts => "dc_volts",
            MeasurementFunction::AcVolts => "ac_volts",
            MeasurementFunction::DcCurrent => "dc_current",
            MeasurementFunction::AcCurrent => "ac_current",
            MeasurementFunction::TwoWireResistance => "two_wire_resistance",
            MeasurementFunction::FourWireResistance => "four_wire_resistance",
            MeasurementFunction::Frequency => "frequency",
            MeasurementFunction::Period => "period",
            MeasurementFunction::Temperature => "temperature",
            MeasurementFunction::Capacitance => "capacitance",
            MeasurementFunction::Continuity => "continuity",
            MeasurementFunction::Diode => "diode",
        }
    }

    /// SCPI token that selects this function with `FUNC`.
    pub(crate) fn as_cmd_str(&self) -> &'static str {
        match self {
            MeasurementFunction::DcVolts => "volt",
            MeasurementFunction::AcVolts => "volt:ac",
            MeasurementFunction::DcCurrent => "curr",
            MeasurementFunction::AcCurrent => "curr:ac",
            MeasurementFunction::TwoWireResistance => "res",
            MeasurementFunction::FourWireResistance => "fres",
            MeasurementFunction::Frequency => "freq",
            MeasurementFunction::Period => "per",
            MeasurementFunction::Temperature => "temp",
            MeasurementFunction::Capacitance => "cap",
            MeasurementFunction::Continuity => "cont",
            MeasurementFunction::Diode => "diod",
        }
    }

    /// Convert a normalized `FUNC?` response into a function.
    ///
    /// The instrument answers with the short form, e.g., `volt` for DC and `volt:ac` for AC
    /// voltage. The explicit `:dc` suffix and the long forms are accepted as well.
    pub(crate) fn from_cmd_str(token: &str) -> Option<Self> {
        let func = match token {
            "volt" | "volt:dc" | "voltage" | "voltage:dc" => MeasurementFunction::DcVolts,
            "volt:ac" | "voltage:ac" => MeasurementFunction::AcVolts,
            "curr" | "curr:dc" | "current" | "current:dc" => MeasurementFunction::DcCurrent,
            "curr:ac" | "current:ac" => MeasurementFunction::AcCurrent,
            "res" | "resistance" => MeasurementFunction::TwoWireResistance,
            "fres" | "fresistance" => MeasurementFunction::FourWireResistance,
            "freq" | "frequency" => MeasurementFunction::Frequency,
            "per" | "period" => MeasurementFunction::Period,
            "temp" | "temperature" => MeasurementFunction::Temperature,
            "cap" | "capacitance" => MeasurementFunction::Capacitance,
            "cont" | "continuity" => MeasurementFunction::Continuity,
            "diod" | "diode" => MeasurementFunction::Diode,
            _ => return None,
        };
        Some(func)
    }
}

impl Display for MeasurementFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MeasurementFunction {
    type Err = instrumentrs::InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MeasurementFunction::ALL
            .into_iter()
            .find(|func| func.name() == s)
            .ok_or_else(|| instrumentrs::InstrumentError::UnsupportedFunction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("volt", MeasurementFunction::DcVolts)]
    #[case("volt:dc", MeasurementFunction::DcVolts)]
    #[case("volt:ac", MeasurementFunction::AcVolts)]
    #[case("curr", MeasurementFunction::DcCurrent)]
    #[case("fres", MeasurementFunction::FourWireResistance)]
    #[case("diod", MeasurementFunction::Diode)]
    fn test_from_cmd_str(#[case] token: &str, #[case] exp: MeasurementFunction) {
        assert_eq!(MeasurementFunction::from_cmd_str(token), Some(exp));
    }

    #[rstest]
    fn test_from_cmd_str_unknown() {
        assert_eq!(MeasurementFunction::from_cmd_str("volt:ratio"), None);
    }

    /// Every function reads back from its own command token and its own name.
    #[rstest]
    fn test_tokens_and_names_are_consistent() {
        for func in MeasurementFunction::ALL {
            assert_eq!(
                MeasurementFunction::from_cmd_str(func.as_cmd_str()),
                Some(func)
            );
            assert_eq!(
                func.to_string().parse::<MeasurementFunction>().unwrap(),
                func
            );
        }
    }

    #[rstest]
    fn test_parse_unknown_name() {
        assert!(matches!(
            "ac_plus_dc_volts".parse::<MeasurementFunction>(),
            Err(instrumentrs::InstrumentError::UnsupportedFunction(_))
        ));
    }
}
