//! Static vocabulary tables that map a measurement function to a command keyword.

use std::{fmt, str::FromStr};

/// Requirements for the enumeration of measurement functions of an instrument.
///
/// The function is displayed and parsed with the name that is cached in the function property,
/// e.g., `"dc_volts"`. Any type with the right traits implements this automatically.
pub trait FunctionKey: Copy + Eq + fmt::Debug + fmt::Display + FromStr + 'static {}

impl<F> FunctionKey for F where F: Copy + Eq + fmt::Debug + fmt::Display + FromStr + 'static {}

/// A closed, read-only mapping from measurement function to the command keyword that governs one
/// capability, e.g., auto-zero.
///
/// Tables are meant to be declared as `static` items by the driver of an instrument model. A
/// function that is missing from the table means that the capability is not defined while this
/// function is active. This is not an error.
///
/// ```
/// use instrumentrs::VocabularyTable;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Func {
///     Volts,
///     Amps,
///     Hertz,
/// }
///
/// static APERTURE: VocabularyTable<Func> =
///     VocabularyTable::new("aperture", &[(Func::Volts, "volt:aper"), (Func::Amps, "curr:aper")]);
///
/// assert_eq!(APERTURE.get(Func::Amps), Some("curr:aper"));
/// assert_eq!(APERTURE.get(Func::Hertz), None);
/// ```
pub struct VocabularyTable<F: 'static> {
    capability: &'static str,
    entries: &'static [(F, &'static str)],
}

impl<F> VocabularyTable<F> {
    /// Create a new table for a capability from its entries.
    pub const fn new(capability: &'static str, entries: &'static [(F, &'static str)]) -> Self {
        Self {
            capability,
            entries,
        }
    }

    /// Name of the capability this table belongs to.
    pub fn capability(&self) -> &'static str {
        self.capability
    }

    /// Number of functions for which the capability is defined.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the capability is not defined for any function.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F: Copy + PartialEq> VocabularyTable<F> {
    /// Look up the command keyword for the given function.
    pub fn get(&self, function: F) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(func, _)| *func == function)
            .map(|(_, keyword)| *keyword)
    }

    /// Whether the capability is defined for the given function.
    pub fn contains(&self, function: F) -> bool {
        self.get(function).is_some()
    }

    /// All functions for which the capability is defined, in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = F> + '_ {
        self.entries.iter().map(|(func, _)| *func)
    }
}

impl<F: fmt::Debug> fmt::Debug for VocabularyTable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VocabularyTable")
            .field("capability", &self.capability)
            .field("entries", &self.entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Func {
        A,
        B,
        C,
    }

    static TABLE: VocabularyTable<Func> =
        VocabularyTable::new("test", &[(Func::A, "a:cmd"), (Func::C, "c:cmd")]);

    #[test]
    fn test_lookup() {
        assert_eq!(TABLE.get(Func::A), Some("a:cmd"));
        assert_eq!(TABLE.get(Func::B), None);
        assert!(TABLE.contains(Func::C));
        assert!(!TABLE.contains(Func::B));
    }

    #[test]
    fn test_functions_in_order() {
        assert_eq!(
            TABLE.functions().collect::<Vec<_>>(),
            vec![Func::A, Func::C]
        );
        assert_eq!(TABLE.len(), 2);
        assert!(!TABLE.is_empty());
        assert_eq!(TABLE.capability(), "test");
    }
}
