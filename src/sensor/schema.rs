//! Declarative constructor parameters for sensor classes.
//!
//! A class publishes a static [`ParamSpec`] table. The same table drives the
//! `--list-sensor-classes` output and the validation of [`SensorArgs`] when
//! the daemon builds an instance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::traits::SensorError;

/// One constructor parameter of a sensor class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Argument name, as used in `CLASS=ARG=VALUE`.
    pub name: &'static str,
    /// Type label shown in listings (e.g. "str").
    pub type_name: Option<&'static str>,
    /// Human-readable description.
    pub description: &'static str,
    /// Value used when the argument is not supplied.
    pub default: Option<&'static str>,
    /// Whether the argument must be supplied.
    pub required: bool,
}

impl ParamSpec {
    /// An optional, untyped parameter without a default.
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            type_name: None,
            description,
            default: None,
            required: false,
        }
    }

    /// Set the type label.
    pub const fn with_type(mut self, type_name: &'static str) -> Self {
        self.type_name = Some(type_name);
        self
    }

    /// Set the default value.
    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    /// Mark the parameter as required.
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Named string arguments for one sensor class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorArgs(BTreeMap<String, String>);

impl SensorArgs {
    /// Create an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an argument, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder form of [`SensorArgs::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Merge `other` into `self`; values in `other` win.
    pub fn extend(&mut self, other: SensorArgs) {
        self.0.extend(other.0);
    }

    /// Raw lookup, ignoring defaults.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of arguments supplied.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no arguments were supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check the arguments against a class parameter table.
    ///
    /// # Errors
    /// Returns [`SensorError::InvalidArgument`] for an undeclared argument and
    /// [`SensorError::MissingArgument`] for an absent required one.
    pub fn validate(&self, class: &str, params: &[ParamSpec]) -> Result<(), SensorError> {
        if let Some(unknown) = self
            .0
            .keys()
            .find(|k| !params.iter().any(|p| p.name == k.as_str()))
        {
            return Err(SensorError::InvalidArgument {
                class: class.to_string(),
                arg: unknown.clone(),
            });
        }

        if let Some(missing) = params
            .iter()
            .find(|p| p.required && p.default.is_none() && !self.0.contains_key(p.name))
        {
            return Err(SensorError::MissingArgument {
                class: class.to_string(),
                arg: missing.name.to_string(),
            });
        }

        Ok(())
    }

    /// Look up an argument, falling back to the declared default.
    pub fn value<'a>(&'a self, spec: &ParamSpec) -> Option<&'a str> {
        self.get(spec.name).or(spec.default)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SensorArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
