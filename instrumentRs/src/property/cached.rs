//! A single named instrument property with its cache state.

use std::fmt;

use crate::InstrumentError;

use super::{PropertyKind, PropertyValue, Session};

/// Procedure that reads a property from the instrument.
///
/// Returns `Ok(None)` if the property is not applicable for the current configuration of the
/// instrument, e.g., because the active measurement function does not have the capability.
pub type Getter<T, F> = fn(&mut Session<T, F>) -> Result<Option<PropertyValue>, InstrumentError>;

/// Procedure that writes a property to the instrument.
pub type Setter<T, F> = fn(&mut Session<T, F>, &PropertyValue) -> Result<Dispatch, InstrumentError>;

/// Outcome of a setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The value was written to the instrument.
    Applied,
    /// The value was written, but the instrument does not keep it, e.g., a one-shot action.
    /// The value is cached as invalid, such that the next read asks the instrument.
    Transient,
    /// The property has no command for the current configuration, nothing was written.
    NotApplicable,
}

/// A named, typed property of an instrument with a local cache.
///
/// The property holds the last known value, a validity flag, the getter and setter that talk to
/// the instrument, and optionally the set of legal values. Properties start out invalid and are
/// seeded with a default value, which is also the value that simulation mode starts from.
///
/// Properties are created with a builder and then handed to a [`super::PropertyRegistry`]:
///
/// ```
/// use std::{fmt, str::FromStr};
///
/// use instrumentrs::{
///     CachedProperty, Dispatch, InstrumentError, LoopbackInterfaceString, PropertyKind,
///     PropertyValue, Session,
/// };
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// struct Func;
///
/// impl fmt::Display for Func {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "func")
///     }
/// }
///
/// impl FromStr for Func {
///     type Err = ();
///     fn from_str(_: &str) -> Result<Self, ()> {
///         Ok(Func)
///     }
/// }
///
/// type Sess = Session<LoopbackInterfaceString, Func>;
///
/// fn get_source(s: &mut Sess) -> Result<Option<PropertyValue>, InstrumentError> {
///     let resp = s.ask("trig:sour?")?;
///     PropertyValue::parse(PropertyKind::Text, &resp).map(Some)
/// }
///
/// fn set_source(s: &mut Sess, val: &PropertyValue) -> Result<Dispatch, InstrumentError> {
///     s.write(&format!("trig:sour {val}"))?;
///     Ok(Dispatch::Applied)
/// }
///
/// let trigger_source = CachedProperty::new("trigger.source", "imm", get_source)
///     .with_setter(set_source)
///     .with_legal_values(["imm", "bus", "ext"]);
///
/// assert!(!trigger_source.is_valid());
/// assert_eq!(trigger_source.legal_values().unwrap().len(), 3);
/// ```
pub struct CachedProperty<T, F> {
    name: &'static str,
    value: PropertyValue,
    valid: bool,
    legal_values: Option<Vec<PropertyValue>>,
    getter: Getter<T, F>,
    setter: Option<Setter<T, F>>,
    function_scoped: bool,
    invalidates: &'static [&'static str],
}

impl<T, F> CachedProperty<T, F> {
    /// Create a new read-only property with a dotted name, a default value, and a getter.
    ///
    /// The kind of the default value fixes the kind of the property.
    pub fn new(
        name: &'static str,
        default: impl Into<PropertyValue>,
        getter: Getter<T, F>,
    ) -> Self {
        Self {
            name,
            value: default.into(),
            valid: false,
            legal_values: None,
            getter,
            setter: None,
            function_scoped: false,
            invalidates: &[],
        }
    }

    /// Make the property settable with the given setter.
    pub fn with_setter(mut self, setter: Setter<T, F>) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Restrict the values that can be set to the given ones.
    pub fn with_legal_values<V, I>(mut self, values: I) -> Self
    where
        V: Into<PropertyValue>,
        I: IntoIterator<Item = V>,
    {
        self.legal_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Mark the property as depending on the active measurement function.
    ///
    /// Function-scoped properties are invalidated whenever the measurement function changes.
    pub fn function_scoped(mut self) -> Self {
        self.function_scoped = true;
        self
    }

    /// Name other properties that the instrument changes when this one is written.
    ///
    /// Their cached values are invalidated after every write of this property, e.g., setting a
    /// fixed range turns auto-range off.
    pub fn invalidates(mut self, names: &'static [&'static str]) -> Self {
        self.invalidates = names;
        self
    }

    /// Dotted name of the property.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last known value.
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Kind of the values this property holds.
    pub fn kind(&self) -> PropertyKind {
        self.value.kind()
    }

    /// Whether the cached value is known to match the instrument.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether the command of this property depends on the measurement function.
    pub fn is_function_scoped(&self) -> bool {
        self.function_scoped
    }

    /// Whether the property was registered without a setter.
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    /// Properties whose cached values are invalidated when this one is written.
    pub fn side_effects(&self) -> &'static [&'static str] {
        self.invalidates
    }

    /// Legal values, if the property declares any.
    pub fn legal_values(&self) -> Option<&[PropertyValue]> {
        self.legal_values.as_deref()
    }

    /// Check a value against kind and legal values and return it in the kind of the property.
    pub(crate) fn validate(&self, value: PropertyValue) -> Result<PropertyValue, InstrumentError> {
        let rejected = |value: &PropertyValue| InstrumentError::ValueNotSupported {
            property: self.name.to_string(),
            value: value.to_string(),
        };
        let value = match value.clone().coerce(self.kind()) {
            Some(val) => val,
            None => return Err(rejected(&value)),
        };
        match &self.legal_values {
            Some(legal) if !legal.contains(&value) => Err(rejected(&value)),
            _ => Ok(value),
        }
    }

    pub(crate) fn getter(&self) -> Getter<T, F> {
        self.getter
    }

    pub(crate) fn setter(&self) -> Option<Setter<T, F>> {
        self.setter
    }

    pub(crate) fn store(&mut self, value: PropertyValue, valid: bool) {
        self.value = value;
        self.valid = valid;
    }

    pub(crate) fn invalidate(&mut self) {
        self.valid = false;
    }
}

impl<T, F> fmt::Debug for CachedProperty<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedProperty")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("valid", &self.valid)
            .field("legal_values", &self.legal_values)
            .field("read_only", &self.is_read_only())
            .field("function_scoped", &self.function_scoped)
            .field("invalidates", &self.invalidates)
            .finish()
    }
}
