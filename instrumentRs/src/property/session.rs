//! The instrument session: interface, configuration, and property cache in one place.

use log::{debug, trace, warn};

use crate::{InstrumentError, InstrumentInterface};

use super::{
    CachedProperty, Dispatch, FunctionKey, PropertyRegistry, PropertyValue, VocabularyTable,
};

/// Configuration of a [`Session`].
///
/// Both switches are fixed when the session is created.
///
/// ```
/// use instrumentrs::SessionConfig;
///
/// let config = SessionConfig::default().with_simulate(true);
/// assert!(config.simulate);
/// assert!(config.cache);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Skip all instrument I/O and serve every property from the cache.
    pub simulate: bool,
    /// Trust valid cached values. If `false`, every read goes to the instrument.
    pub cache: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            simulate: false,
            cache: true,
        }
    }
}

impl SessionConfig {
    /// Configuration for a simulated session.
    pub fn simulated() -> Self {
        Self::default().with_simulate(true)
    }

    /// Set the simulation switch.
    pub fn with_simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    /// Set whether valid cached values are trusted.
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }
}

/// One logical session with a physical instrument.
///
/// The session owns the interface, the [`PropertyRegistry`], and the [`SessionConfig`]. Reading a
/// property goes through [`Session::get`], writing through [`Session::set`]. One registered
/// property plays the role of the function resolver: its value is the name of the measurement
/// function that is currently active, and all function-scoped properties look up their command in
/// a [`VocabularyTable`] with it.
///
/// Access is blocking and not meant to be shared between threads. If you need that, wrap the
/// whole session (or the driver owning it) into a mutex.
pub struct Session<T, F> {
    interface: T,
    config: SessionConfig,
    registry: PropertyRegistry<T, F>,
    function_property: &'static str,
}

impl<T: InstrumentInterface, F: FunctionKey> Session<T, F> {
    /// Create a new session.
    ///
    /// All properties start out invalid. This fails with [`InstrumentError::UnknownProperty`] if
    /// `function_property` is not part of the registry.
    ///
    /// # Arguments
    /// * `interface` - Interface to the instrument.
    /// * `config` - Simulation and cache switches.
    /// * `function_property` - Name of the property that holds the active measurement function.
    /// * `registry` - All properties of the instrument model.
    pub fn new(
        interface: T,
        config: SessionConfig,
        function_property: &'static str,
        mut registry: PropertyRegistry<T, F>,
    ) -> Result<Self, InstrumentError> {
        if !registry.contains(function_property) {
            return Err(InstrumentError::UnknownProperty(function_property.to_string()));
        }
        registry.invalidate_all();
        debug!(
            "New session with {} properties, simulate: {}, cache: {}",
            registry.len(),
            config.simulate,
            config.cache
        );
        Ok(Self {
            interface,
            config,
            registry,
            function_property,
        })
    }

    /// Whether the session is simulated, i.e., no I/O takes place.
    pub fn simulating(&self) -> bool {
        self.config.simulate
    }

    /// Whether valid cached values are trusted.
    pub fn caching(&self) -> bool {
        self.config.cache
    }

    /// Get the configuration of this session.
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Names of all properties in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.registry.names()
    }

    /// Look up a property for introspection.
    pub fn property(&self, name: &str) -> Result<&CachedProperty<T, F>, InstrumentError> {
        self.registry.resolve(name)
    }

    /// Get the registry of this session.
    pub fn registry(&self) -> &PropertyRegistry<T, F> {
        &self.registry
    }

    /// Whether the cached value of a property is valid.
    pub fn is_valid(&self, name: &str) -> Result<bool, InstrumentError> {
        Ok(self.registry.resolve(name)?.is_valid())
    }

    /// Invalidate the cached value of a single property.
    ///
    /// Invalidating the function property does not touch the function-scoped properties. They are
    /// only invalidated once the next read of the function shows that it actually changed.
    pub fn invalidate(&mut self, name: &str) -> Result<(), InstrumentError> {
        self.registry.resolve_mut(name)?.invalidate();
        Ok(())
    }

    /// Invalidate all cached values, e.g., after the instrument was reset.
    pub fn invalidate_all(&mut self) {
        debug!("Invalidating all cached properties");
        self.registry.invalidate_all();
    }

    /// Read a property.
    ///
    /// In simulation, the cached value is returned unconditionally. Otherwise a valid cached value
    /// is returned without I/O. If the cache is invalid, the getter of the property reads it from
    /// the instrument and the fresh value is cached. If the getter finds the property not
    /// applicable for the current measurement function, the last cached value is returned and the
    /// cache stays invalid.
    pub fn get(&mut self, name: &str) -> Result<PropertyValue, InstrumentError> {
        let prop = self.registry.resolve(name)?;
        if self.config.simulate {
            return Ok(prop.value().clone());
        }
        if self.config.cache && prop.is_valid() {
            trace!("Cache hit for {name}");
            return Ok(prop.value().clone());
        }

        let getter = prop.getter();
        let fresh = getter(self)?;

        let prop = self.registry.resolve_mut(name)?;
        let Some(value) = fresh else {
            debug!("Property {name} not applicable, returning cached value");
            return Ok(prop.value().clone());
        };
        let changed = prop.value() != &value;
        prop.store(value.clone(), true);
        if changed && name == self.function_property {
            debug!("Measurement function changed to {value}");
            self.registry.invalidate_function_scoped();
        }
        Ok(value)
    }

    /// Write a property.
    ///
    /// The value is checked against the kind and the legal values of the property first. If it is
    /// rejected, [`InstrumentError::ValueNotSupported`] is returned and nothing changes. In
    /// simulation, the value is only cached. Otherwise the setter writes it to the instrument
    /// before it is cached. If the setter finds the property not applicable for the current
    /// measurement function, or the instrument does not keep the value, the value is still cached
    /// but marked invalid. Writes that reach the instrument invalidate the properties named with
    /// [`CachedProperty::invalidates`].
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), InstrumentError> {
        let prop = self.registry.resolve(name)?;
        let Some(setter) = prop.setter() else {
            return Err(InstrumentError::ReadOnlyProperty(name.to_string()));
        };
        let value = prop.validate(value.into())?;

        let dispatch = if self.config.simulate {
            Dispatch::Applied
        } else {
            setter(self, &value)?
        };
        match dispatch {
            Dispatch::Applied => {}
            Dispatch::Transient => debug!("Property {name} does not keep {value}"),
            Dispatch::NotApplicable => {
                debug!("Property {name} not applicable, only caching {value}");
            }
        }

        let prop = self.registry.resolve_mut(name)?;
        prop.store(value, dispatch == Dispatch::Applied);
        let side_effects = prop.side_effects();
        if dispatch != Dispatch::NotApplicable {
            for other in side_effects {
                debug!("Writing {name} invalidates {other}");
                self.registry.resolve_mut(other)?.invalidate();
            }
        }
        if name == self.function_property {
            self.registry.invalidate_function_scoped();
        }
        Ok(())
    }

    /// Get the measurement function that is currently active.
    ///
    /// The function is read through the function property and obeys the same cache rules as any
    /// other property. If the instrument reports a function that `F` does not know,
    /// [`InstrumentError::UnsupportedFunction`] is returned.
    pub fn current_function(&mut self) -> Result<F, InstrumentError> {
        let name = self.function_property;
        let token = self.get(name)?.to_string();
        token.parse::<F>().map_err(|_| {
            warn!("Instrument reported unknown measurement function '{token}'");
            InstrumentError::UnsupportedFunction(token)
        })
    }

    /// Look up the command keyword of a capability for the active measurement function.
    ///
    /// Returns `Ok(None)` if the capability is not defined for the active function, or if the
    /// active function is not known to the driver.
    pub fn resolve_keyword(
        &mut self,
        table: &VocabularyTable<F>,
    ) -> Result<Option<&'static str>, InstrumentError> {
        let function = match self.current_function() {
            Ok(function) => function,
            Err(InstrumentError::UnsupportedFunction(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        let keyword = table.get(function);
        if keyword.is_none() {
            debug!("No {} command for function {function}", table.capability());
        }
        Ok(keyword)
    }

    /// Query a capability for the active measurement function.
    ///
    /// Sends `"<keyword>?"` and returns the normalized response, see [`PropertyValue::normalize`],
    /// or `None` if the capability is not applicable.
    pub fn ask_scoped(
        &mut self,
        table: &VocabularyTable<F>,
    ) -> Result<Option<String>, InstrumentError> {
        match self.resolve_keyword(table)? {
            Some(keyword) => {
                let resp = self.ask(&format!("{keyword}?"))?;
                Ok(Some(PropertyValue::normalize(&resp)))
            }
            None => Ok(None),
        }
    }

    /// Write a capability for the active measurement function.
    ///
    /// Sends `"<keyword> <value>"`, or nothing if the capability is not applicable.
    pub fn write_scoped(
        &mut self,
        table: &VocabularyTable<F>,
        value: &PropertyValue,
    ) -> Result<Dispatch, InstrumentError> {
        match self.resolve_keyword(table)? {
            Some(keyword) => {
                self.write(&format!("{keyword} {value}"))?;
                Ok(Dispatch::Applied)
            }
            None => Ok(Dispatch::NotApplicable),
        }
    }

    /// Query the instrument and return the raw response.
    ///
    /// This always talks to the instrument, simulation is the caller's business.
    pub fn ask(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        trace!("ask: {cmd}");
        let resp = self.interface.query(cmd)?;
        trace!("response: {resp}");
        Ok(resp)
    }

    /// Send a command to the instrument.
    ///
    /// This always talks to the instrument, simulation is the caller's business.
    pub fn write(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        trace!("write: {cmd}");
        self.interface.sendcmd(cmd)
    }

    /// Get mutable access to the interface, e.g., to change the terminator.
    pub fn interface_mut(&mut self) -> &mut T {
        &mut self.interface
    }

    /// Consume the session and return the interface.
    pub fn into_interface(self) -> T {
        self.interface
    }
}

impl<T, F> std::fmt::Debug for Session<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("function_property", &self.function_property)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
