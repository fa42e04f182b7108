//! Cached, function-scoped instrument properties.
//!
//! The building blocks, from the bottom up:
//! - [`PropertyValue`]: a typed value as it is cached and sent to the instrument.
//! - [`VocabularyTable`]: maps a measurement function to the command keyword of one capability.
//! - [`CachedProperty`]: a named value with validity flag, legal values, getter, and setter.
//! - [`PropertyRegistry`]: all properties of an instrument model, by dotted name.
//! - [`Session`]: ties the registry to an interface and decides when to talk to the instrument.

mod cached;
mod registry;
mod session;
mod value;
mod vocabulary;

pub use cached::{CachedProperty, Dispatch, Getter, Setter};
pub use registry::PropertyRegistry;
pub use session::{Session, SessionConfig};
pub use value::{PropertyKind, PropertyValue};
pub use vocabulary::{FunctionKey, VocabularyTable};
