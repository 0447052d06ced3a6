//! Semicolon-separated `key=value` connection strings.
//!
//! Keys are matched case-insensitively and well-known synonyms (`Server`,
//! `User ID`, ...) collapse onto one canonical name. Values containing `;`,
//! `=` or `"` are written in double quotes with inner quotes
//! doubled.

use std::fmt;
use std::str::FromStr;

use crate::error::{FixtureError, Result};

pub const HOST: &str = "Host";
pub const PORT: &str = "Port";
pub const USERNAME: &str = "Username";
pub const PASSWORD: &str = "Password";
pub const DATABASE: &str = "Database";

const SYNONYMS: &[(&str, &[&str])] = &[
    (HOST, &["host", "server"]),
    (PORT, &["port"]),
    (USERNAME, &["username", "user id", "userid", "user name", "user"]),
    (PASSWORD, &["password", "psw", "pwd"]),
    (DATABASE, &["database", "db"]),
];

fn canonical_key(key: &str) -> String {
    let lowered = key.trim().to_lowercase();
    SYNONYMS
        .iter()
        .find(|(_, names)| names.contains(&lowered.as_str()))
        .map_or_else(|| key.trim().to_string(), |(canonical, _)| (*canonical).to_string())
}

/// Structured connection parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStringBuilder {
    entries: Vec<(String, String)>,
}

impl ConnectionStringBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse an existing connection string.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidConnectionString`] for a segment without
    /// `=`, an empty key, or an unterminated quoted value.
    pub fn parse(s: &str) -> Result<Self> {
        let mut builder = Self::new();
        let mut rest = s;

        while !rest.trim().is_empty() {
            let (segment, remainder) = split_segment(rest)?;
            rest = remainder;
            if segment.trim().is_empty() {
                continue;
            }
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                FixtureError::InvalidConnectionString {
                    segment: segment.to_string(),
                    reason: "expected key=value".to_string(),
                }
            })?;
            if key.trim().is_empty() {
                return Err(FixtureError::InvalidConnectionString {
                    segment: segment.to_string(),
                    reason: "empty key".to_string(),
                });
            }
            builder.set(key, unquote(value.trim()));
        }

        Ok(builder)
    }

    /// Set a parameter, replacing any earlier value under the same canonical key.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        let key = canonical_key(key);
        let value = value.into();
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&key))
        {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
        self
    }

    /// Remove a parameter, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let key = canonical_key(key);
        let idx = self
            .entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(&key))?;
        Some(self.entries.remove(idx).1)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = canonical_key(key);
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&key))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.get(HOST)
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.get(USERNAME)
    }

    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.get(PASSWORD)
    }

    #[must_use]
    pub fn database(&self) -> Option<&str> {
        self.get(DATABASE)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.set(HOST, host);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.set(PORT, port.to_string());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.set(USERNAME, username);
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.set(PASSWORD, password);
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.set(DATABASE, database);
        self
    }

    /// Iterate parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render with the password replaced by `***`, for display.
    #[must_use]
    pub fn masked(&self) -> String {
        let mut copy = self.clone();
        if copy.password().is_some() {
            copy.set(PASSWORD, "***");
        }
        copy.to_string()
    }
}

impl FromStr for ConnectionStringBuilder {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ConnectionStringBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{key}={}", quote(value))?;
        }
        Ok(())
    }
}

/// Split off one segment, honouring double-quoted values.
fn split_segment(s: &str) -> Result<(&str, &str)> {
    let mut in_quotes = false;
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek().is_some_and(|&(_, n)| n == '"') => {
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => return Ok((&s[..i], &s[i + 1..])),
            _ => {}
        }
    }
    if in_quotes {
        return Err(FixtureError::InvalidConnectionString {
            segment: s.to_string(),
            reason: "unterminated quoted value".to_string(),
        });
    }
    Ok((s, ""))
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .map_or_else(|| value.to_string(), |inner| inner.replace("\"\"", "\""))
}

fn quote(value: &str) -> String {
    if value.contains([';', '=', '"']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
