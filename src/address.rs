//! Visible-address abstraction.
//!
//! The dashboard's redirect flows communicate through query parameters on
//! the address the user lands on (`?token=...`, `?spotify=connected`).
//! This module models that address explicitly so consuming a parameter can
//! remove it and the same signal is never observed twice.

use std::fmt;

/// A path plus its ordered query parameters.
///
/// No percent-decoding is performed: tokens and connector markers are
/// opaque URL-safe strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    path: String,
    params: Vec<(String, String)>,
}

impl Address {
    /// Parse an address from a path-with-query string or a full URL.
    pub fn parse(raw: &str) -> Self {
        // Strip scheme and host if a full URL was pasted.
        let raw = match raw.find("://") {
            Some(idx) => {
                let rest = &raw[idx + 3..];
                rest.find('/').map(|slash| &rest[slash..]).unwrap_or("/")
            }
            None => raw,
        };

        let (path, query) = match raw.split_once('?') {
            Some((p, q)) => (p, q),
            None => (raw, ""),
        };

        let params = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect();

        Self {
            path: path.to_string(),
            params,
        }
    }

    #[allow(dead_code)] // Accessor for routing displays
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Value of the first parameter with the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Remove every occurrence of a parameter. Returns true if any was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.params.len();
        self.params.retain(|(k, _)| k != key);
        self.params.len() != before
    }

    /// Drop the entire query string, keeping the path.
    pub fn clear_query(&mut self) {
        self.params.clear();
    }

    #[allow(dead_code)] // Utility accessor
    pub fn has_query(&self) -> bool {
        !self.params.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            if v.is_empty() {
                write!(f, "{}{}", sep, k)?;
            } else {
                write!(f, "{}{}={}", sep, k, v)?;
            }
        }
        Ok(())
    }
}
