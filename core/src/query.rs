//! Request URL assembly from a base URL and optional query parameters.
//!
//! # Design
//! Parameters are kept in insertion order and may be absent. Only present
//! values reach the URL: the first one follows the caller's separator and the
//! rest follow `&`. After assembly every `"` and whitespace character is
//! stripped from the whole string. That pass is a sanitizer, not URL
//! encoding, so reserved characters inside values are passed through as-is.

use std::fmt;

use crate::error::{ApiError, Result};

/// Separator placed before the first present query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `?`, for a base URL without a query string yet.
    Question,
    /// `&`, for a base URL that already carries `?fields=...`.
    Ampersand,
}

impl Separator {
    pub fn as_char(self) -> char {
        match self {
            Separator::Question => '?',
            Separator::Ampersand => '&',
        }
    }
}

impl TryFrom<char> for Separator {
    type Error = ApiError;

    fn try_from(c: char) -> Result<Self> {
        match c {
            '?' => Ok(Separator::Question),
            '&' => Ok(Separator::Ampersand),
            other => Err(ApiError::config(format!(
                "Invalid `first_optional_parameter_separator: {other}`, expected `?` or `&`"
            ))),
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Ordered set of optional query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: Vec<(&'static str, Option<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter; `None` values are kept but never rendered.
    pub fn push<V: ToString>(&mut self, name: &'static str, value: Option<V>) -> &mut Self {
        self.params.push((name, value.map(|v| v.to_string())));
        self
    }

    /// Builder-style variant of [`QueryParams::push`].
    pub fn with<V: ToString>(mut self, name: &'static str, value: Option<V>) -> Self {
        self.push(name, value);
        self
    }

    /// True when no parameter was declared at all, present or not.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over the parameters that carry a value.
    pub fn present(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.params
            .iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (*name, v)))
    }
}

/// Append `params` to `request_url` and sanitize the result.
///
/// An empty `request_url` is rejected, as is a separator other than `?` or
/// `&` whenever `params` declares anything. Both checks happen before any
/// network I/O.
pub fn build_request_url(request_url: &str, separator: char, params: &QueryParams) -> Result<String> {
    if request_url.is_empty() {
        return Err(ApiError::config("A request URL string must be provided"));
    }

    let mut url = request_url.to_string();
    if !params.is_empty() {
        let separator = Separator::try_from(separator)?;
        for (i, (name, value)) in params.present().enumerate() {
            let sep = if i == 0 { separator.as_char() } else { '&' };
            url.push(sep);
            url.push_str(name);
            url.push('=');
            url.push_str(value);
        }
    }

    Ok(sanitize_url(&url))
}

/// Strip every double quote and whitespace character.
pub fn sanitize_url(url: &str) -> String {
    url.chars().filter(|c| *c != '"' && !c.is_whitespace()).collect()
}
