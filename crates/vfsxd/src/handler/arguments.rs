//! Positional argument access for handler methods.

use std::fmt::Display;
use std::str::FromStr;

use super::HandlerError;

/// Positional string arguments carried by a request.
///
/// The wire format has no typing: a mode of `493` and a path of `docs` both
/// arrive as text. Handlers pull values out by index and parse them as they
/// see fit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    values: Vec<String>,
}

impl Arguments {
    /// Wraps already split arguments.
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the request carried no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Arguments in wire order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.values
    }

    /// Iterates over the arguments in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    /// Argument at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Argument at `index`, or a [`HandlerError::MissingArgument`] naming it.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::MissingArgument`] when fewer than `index + 1`
    /// arguments were sent.
    pub fn require(&self, index: usize, name: &'static str) -> Result<&str, HandlerError> {
        self.get(index)
            .ok_or(HandlerError::MissingArgument { index, name })
    }

    /// Parses the argument at `index` with [`FromStr`].
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::MissingArgument`] when the argument is absent
    /// and [`HandlerError::InvalidArgument`] when it does not parse.
    pub fn parse<T>(&self, index: usize, name: &'static str) -> Result<T, HandlerError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let value = self.require(index, name)?;
        value
            .trim()
            .parse::<T>()
            .map_err(|error| HandlerError::InvalidArgument {
                name,
                value: value.to_owned(),
                message: error.to_string(),
            })
    }
}

impl From<Vec<String>> for Arguments {
    fn from(values: Vec<String>) -> Self {
        Self::new(values)
    }
}

impl From<&[String]> for Arguments {
    fn from(values: &[String]) -> Self {
        Self::new(values.to_vec())
    }
}
