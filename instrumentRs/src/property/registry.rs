//! Registry of all cached properties of one instrument session.

use std::collections::HashMap;

use crate::InstrumentError;

use super::CachedProperty;

/// An insertion-ordered mapping from dotted property names to [`CachedProperty`] instances.
///
/// Registering a name that is already present replaces the old property completely, including its
/// getter and setter, but keeps its position in the enumeration order. This is how an extended
/// instrument model overrides a property of its base model.
pub struct PropertyRegistry<T, F> {
    properties: Vec<CachedProperty<T, F>>,
    index: HashMap<&'static str, usize>,
}

impl<T, F> PropertyRegistry<T, F> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            properties: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Install a property under its name.
    ///
    /// Returns the property that was replaced, if the name was already registered.
    pub fn register(&mut self, property: CachedProperty<T, F>) -> Option<CachedProperty<T, F>> {
        match self.index.get(property.name()).copied() {
            Some(idx) => Some(std::mem::replace(&mut self.properties[idx], property)),
            None => {
                self.index.insert(property.name(), self.properties.len());
                self.properties.push(property);
                None
            }
        }
    }

    /// Names of all registered properties in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.properties.iter().map(|prop| prop.name())
    }

    /// All registered properties in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CachedProperty<T, F>> {
        self.properties.iter()
    }

    /// Look up a property by name.
    pub fn resolve(&self, name: &str) -> Result<&CachedProperty<T, F>, InstrumentError> {
        self.index
            .get(name)
            .map(|&idx| &self.properties[idx])
            .ok_or_else(|| InstrumentError::UnknownProperty(name.to_string()))
    }

    /// Look up a property by name for modification.
    pub fn resolve_mut(
        &mut self,
        name: &str,
    ) -> Result<&mut CachedProperty<T, F>, InstrumentError> {
        match self.index.get(name) {
            Some(&idx) => Ok(&mut self.properties[idx]),
            None => Err(InstrumentError::UnknownProperty(name.to_string())),
        }
    }

    /// Whether a property with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of registered properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Mark every cached value as invalid.
    pub fn invalidate_all(&mut self) {
        self.properties
            .iter_mut()
            .for_each(CachedProperty::invalidate);
    }

    /// Mark every cached value whose command depends on the measurement function as invalid.
    pub fn invalidate_function_scoped(&mut self) {
        self.properties
            .iter_mut()
            .filter(|prop| prop.is_function_scoped())
            .for_each(CachedProperty::invalidate);
    }
}

impl<T, F> Default for PropertyRegistry<T, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F> FromIterator<CachedProperty<T, F>> for PropertyRegistry<T, F> {
    fn from_iter<I: IntoIterator<Item = CachedProperty<T, F>>>(iter: I) -> Self {
        let mut registry = Self::new();
        iter.into_iter().for_each(|prop| {
            registry.register(prop);
        });
        registry
    }
}

impl<T, F> Extend<CachedProperty<T, F>> for PropertyRegistry<T, F> {
    fn extend<I: IntoIterator<Item = CachedProperty<T, F>>>(&mut self, iter: I) {
        iter.into_iter().for_each(|prop| {
            self.register(prop);
        });
    }
}

impl<T, F> std::fmt::Debug for PropertyRegistry<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.properties.iter()).finish()
    }
}
