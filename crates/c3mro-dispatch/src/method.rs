//! Method bodies and the instances they run against.
//!
//! Arguments and results are JSON [`Value`]s. A [`Method`] receives the
//! instance (or `None` for unit-level calls, the equivalent of a static
//! method) and the argument slice, and returns a value or a [`MethodError`].

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use c3mro_core::{Hierarchy, UnitId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use serde_json::Value;

/// A hierarchy whose units carry callable [`Method`] bodies.
pub type ClassHierarchy = Hierarchy<Method>;

type Body = dyn Fn(Option<&mut Object>, &[Value]) -> Result<Value, MethodError> + Send + Sync;

/// A callable method body. Cheap to clone.
#[derive(Clone)]
pub struct Method(Arc<Body>);

impl Method {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(Option<&mut Object>, &[Value]) -> Result<Value, MethodError> + Send + Sync + 'static,
    {
        Method(Arc::new(body))
    }

    /// A body that ignores its inputs and returns `value`.
    pub fn constant(value: Value) -> Self {
        Method::new(move |_, _| Ok(value.clone()))
    }

    pub fn call(&self, instance: Option<&mut Object>, args: &[Value]) -> Result<Value, MethodError> {
        (self.0)(instance, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({:p})", Arc::as_ptr(&self.0))
    }
}

/// An instance of a unit: its unit identity plus named fields that method
/// bodies may read and update. Serializes as `{ "unit": 3, "fields": {..} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    unit: UnitId,
    #[serde(default)]
    pub fields: IndexMap<String, Value>,
}

impl Object {
    pub fn new(unit: UnitId) -> Self {
        Object {
            unit,
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// The unit this object is an instance of.
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }
}

/// Error raised by a method body.
///
/// Wraps whatever the body failed with; `execute` hands it back to the caller
/// as is.
#[derive(Debug)]
pub struct MethodError(Box<dyn Error + Send + Sync>);

impl MethodError {
    pub fn new(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        MethodError(err.into())
    }

    /// An error carrying only a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        MethodError(message.to_string().into())
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    pub fn into_inner(self) -> Box<dyn Error + Send + Sync> {
        self.0
    }
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for MethodError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}
