//! Credential material.

use std::fmt;

use serde::Serialize;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// A password that is wiped on drop and never printed.
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Borrow the plaintext. Callers must not log it.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// OpenSearch admin credentials, stored as one JSON secret.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Password,
}

#[derive(Serialize)]
struct Payload<'a> {
    username: &'a str,
    password: &'a str,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: Password) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// `{"username": "...", "password": "..."}`
    pub fn to_json(&self) -> Result<Zeroizing<String>> {
        let payload = Payload {
            username: &self.username,
            password: self.password.expose(),
        };
        serde_json::to_string(&payload)
            .map(Zeroizing::new)
            .map_err(|e| Error::Other(format!("failed to encode credentials: {}", e)))
    }
}
