//! Named-value parameter sets describing one input binding.
//!
//! Text form is `key:value,key:value`, sorted by key. Separators inside keys
//! or values are escaped: `:` as `$0`, `,` as `$1` and `$` as `$2`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

const KEY_VALUE_SEPARATOR: char = ':';
const PARAM_SEPARATOR: char = ',';
const ESCAPE_CHARACTER: char = '$';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("Malformed key/value pair: {0:?}")]
    MalformedPair(String),

    #[error("Invalid escape sequence in {0:?}")]
    InvalidEscape(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamPackage {
    data: BTreeMap<String, String>,
}

impl ParamPackage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        self.data.insert(key.to_string(), value.to_string());
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn erase(&mut self, key: &str) -> Option<String> {
        self.data.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Raw text of `key`, or `default` when absent.
    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.data.get(key).map(String::as_str).unwrap_or(default)
    }

    /// Parsed value of `key`, or `default` when absent or unparsable.
    pub fn get<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let Some(raw) = self.data.get(key) else {
            return default;
        };
        match raw.parse() {
            Ok(value) => value,
            Err(e) => {
                warn!("Parameter {}={:?} is not valid ({}), using default", key, raw, e);
                default
            }
        }
    }
}

impl<K: ToString, V: ToString> FromIterator<(K, V)> for ParamPackage {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            KEY_VALUE_SEPARATOR => out.push_str("$0"),
            PARAM_SEPARATOR => out.push_str("$1"),
            ESCAPE_CHARACTER => out.push_str("$2"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(text: &str) -> Result<String, ParamError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != ESCAPE_CHARACTER {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push(KEY_VALUE_SEPARATOR),
            Some('1') => out.push(PARAM_SEPARATOR),
            Some('2') => out.push(ESCAPE_CHARACTER),
            _ => return Err(ParamError::InvalidEscape(text.to_string())),
        }
    }
    Ok(out)
}

impl fmt::Display for ParamPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.data.iter().enumerate() {
            if index > 0 {
                write!(f, "{}", PARAM_SEPARATOR)?;
            }
            write!(f, "{}{}{}", escape(key), KEY_VALUE_SEPARATOR, escape(value))?;
        }
        Ok(())
    }
}

impl FromStr for ParamPackage {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut package = Self::new();
        if s.is_empty() {
            return Ok(package);
        }

        for pair in s.split(PARAM_SEPARATOR) {
            let mut parts = pair.split(KEY_VALUE_SEPARATOR);
            let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(ParamError::MalformedPair(pair.to_string()));
            };
            package
                .data
                .insert(unescape(key)?, unescape(value)?);
        }
        Ok(package)
    }
}
