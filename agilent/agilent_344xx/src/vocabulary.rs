//! Command keywords of the function-scoped capabilities.
//!
//! A function that is missing from a table does not have the capability, e.g., there is no
//! auto-zero while measuring frequency.

use instrumentrs::VocabularyTable;

use crate::MeasurementFunction::{self, *};

/// Measurement range.
pub static RANGE: VocabularyTable<MeasurementFunction> = VocabularyTable::new(
    "range",
    &[
        (DcVolts, "volt:dc:range"),
        (AcVolts, "volt:ac:range"),
        (DcCurrent, "curr:dc:range"),
        (AcCurrent, "curr:ac:range"),
        (TwoWireResistance, "res:range"),
        (FourWireResistance, "fres:range"),
        (Capacitance, "cap:range"),
    ],
);

/// Automatic range selection.
pub static AUTO_RANGE: VocabularyTable<MeasurementFunction> = VocabularyTable::new(
    "auto-range",
    &[
        (DcVolts, "volt:dc:range:auto"),
        (AcVolts, "volt:ac:range:auto"),
        (DcCurrent, "curr:dc:range:auto"),
        (AcCurrent, "curr:ac:range:auto"),
        (TwoWireResistance, "res:range:auto"),
        (FourWireResistance, "fres:range:auto"),
        (Capacitance, "cap:range:auto"),
    ],
);

/// Auto-zero, 34465A only.
pub static AUTO_ZERO: VocabularyTable<MeasurementFunction> = VocabularyTable::new(
    "auto-zero",
    &[
        (DcVolts, "volt:dc:zero:auto"),
        (DcCurrent, "curr:dc:zero:auto"),
        (TwoWireResistance, "res:zero:auto"),
        (Temperature, "temp:zero:auto"),
    ],
);

/// Integration aperture, 34465A only.
pub static APERTURE: VocabularyTable<MeasurementFunction> = VocabularyTable::new(
    "aperture",
    &[
        (DcVolts, "volt:dc:aperture"),
        (DcCurrent, "curr:dc:aperture"),
        (TwoWireResistance, "res:aperture"),
        (FourWireResistance, "fres:aperture"),
        (Frequency, "freq:aperture"),
        (Period, "per:aperture"),
        (Capacitance, "cap:aperture"),
    ],
);
