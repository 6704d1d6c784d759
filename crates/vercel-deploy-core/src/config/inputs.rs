//! Named action inputs
//!
//! GitHub Actions hands `with:` inputs to the step as `INPUT_<NAME>`
//! environment variables. Local runs usually export the bare name
//! instead, so every lookup tries `INPUT_<NAME>` first and `<NAME>` second.

use crate::error::{Error, Result};

/// Source of raw variables (process environment or fixed pairs in tests)
pub trait VarSource {
    /// Look up a variable by exact name
    fn var(&self, name: &str) -> Option<String>;
}

/// Process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

fn lookup_pairs(pairs: &[(&str, &str)], name: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(k, _)| *k == name)
        .map(|(_, v)| (*v).to_string())
}

impl VarSource for Vec<(&str, &str)> {
    fn var(&self, name: &str) -> Option<String> {
        lookup_pairs(self, name)
    }
}

impl<const N: usize> VarSource for [(&str, &str); N] {
    fn var(&self, name: &str) -> Option<String> {
        lookup_pairs(self, name)
    }
}

/// Options for list inputs
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayOptions<'a> {
    /// Value used when the input is absent
    pub default: &'a [&'a str],
    /// Whether the literal `false` switches the list off
    pub disableable: bool,
}

/// Typed reader over a [`VarSource`]
pub struct Inputs<'a> {
    vars: &'a dyn VarSource,
}

impl<'a> Inputs<'a> {
    /// Create a reader over the given variables
    pub fn new(vars: &'a dyn VarSource) -> Self {
        Self { vars }
    }

    /// Raw value of the first candidate name that is set and non-blank
    pub fn raw(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| {
            let key = format!("INPUT_{}", name.replace(' ', "_").to_uppercase());
            self.vars
                .var(&key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| self.vars.var(name).filter(|v| !v.trim().is_empty()))
        })
    }

    /// Optional string input, trimmed
    pub fn string(&self, names: &[&str]) -> Option<String> {
        self.raw(names).map(|v| v.trim().to_string())
    }

    /// Required string input
    pub fn required_string(&self, names: &[&str]) -> Result<String> {
        self.string(names).ok_or_else(|| {
            Error::Config(format!(
                "Input `{}` is required but was not supplied",
                names.join("` or `")
            ))
        })
    }

    /// Boolean input with a default for absent values
    pub fn boolean(&self, name: &str, default: bool) -> Result<bool> {
        match self.raw(&[name]) {
            None => Ok(default),
            Some(value) => parse_bool(&value).ok_or_else(|| {
                Error::Config(format!(
                    "Input `{}` must be a boolean (true/false), got `{}`",
                    name,
                    value.trim()
                ))
            }),
        }
    }

    /// List input split on newlines and commas
    pub fn array(&self, name: &str, options: ArrayOptions<'_>) -> Vec<String> {
        match self.raw(&[name]) {
            None => options.default.iter().map(|s| s.to_string()).collect(),
            Some(value) if options.disableable && value.trim() == "false" => Vec::new(),
            Some(value) => split_list(&value),
        }
    }
}

/// Parse a boolean the way workflow authors write them
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Split a list input on newlines and commas, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(['\n', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
