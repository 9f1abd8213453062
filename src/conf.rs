// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Credentials and environment configuration.
//!
//! Reddit's API requires an application registered at
//! <https://www.reddit.com/prefs/apps>. Registering a "script" application
//! yields a client ID and a client secret; together with a descriptive
//! user agent they are enough for read-only access.
//!
//! The three values are read from the environment variables `client_id`,
//! `client_secret`, and `user_agent`. They are usually kept in a `.env`
//! file next to wherever the tool is run, which should never be committed
//! to version control:
//!
//! ```text
//! client_id=abcdefghijklmn
//! client_secret=ThisIsMySecret
//! user_agent=linux:subscrape:v0.1.0 (by /u/someone)
//! ```

use log::debug;
use std::path::Path;
use std::{env, fmt};
use thiserror::Error;

/// Name of the environment variable holding the client ID.
pub const CLIENT_ID: &str = "client_id";

/// Name of the environment variable holding the client secret.
pub const CLIENT_SECRET: &str = "client_secret";

/// Name of the environment variable holding the user agent.
pub const USER_AGENT: &str = "user_agent";

/// Reddit application credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    user_agent: String,
}

impl Credentials {
    /// Creates a new set of credentials.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Retrieves credentials from the environment.
    ///
    /// Returns an error naming the first variable that is missing (or
    /// empty, or not valid Unicode).
    pub fn from_env() -> CredentialResult {
        let client_id = Self::var(CLIENT_ID)?;
        let client_secret = Self::var(CLIENT_SECRET)?;
        let user_agent = Self::var(USER_AGENT)?;
        Ok(Self {
            client_id,
            client_secret,
            user_agent,
        })
    }

    /// Loads variables from a dotenv file, then reads credentials from
    /// the environment.
    ///
    /// If `path` is `None`, a `.env` file is searched for in the current
    /// directory and its ancestors; it is not an error if none exists,
    /// since the variables may already be exported. An explicitly given
    /// `path` must exist.
    pub fn load(path: Option<&Path>) -> CredentialResult {
        match path {
            Some(path) => {
                dotenv::from_path(path).map_err(|err| CredentialError::EnvFile {
                    path: path.display().to_string(),
                    source: err,
                })?;
                debug!("Loaded environment from {}", path.display());
            }
            None => match dotenv::dotenv() {
                Ok(path) => debug!("Loaded environment from {}", path.display()),
                Err(err) => debug!("No .env file loaded: {err}"),
            },
        }
        Self::from_env()
    }

    fn var(name: &'static str) -> Result<String, CredentialError> {
        match env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(CredentialError::MissingCredential(name)),
        }
    }

    /// The application's client ID.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The application's client secret.
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// The user agent sent with every API request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"********")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Standard result type for [`Credentials`] creation.
pub type CredentialResult = Result<Credentials, CredentialError>;

/// Indicates credentials could not be loaded.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// A required variable is not set.
    #[error("Missing credential: ${0} is not set (add it to your .env file)")]
    MissingCredential(&'static str),

    /// An explicitly requested dotenv file could not be read.
    #[error("Could not load environment from {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenv::Error,
    },
}
