// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Application-only OAuth for the Reddit API.
//!
//! Read-only access uses the OAuth2 "client credentials" grant: the
//! application's client ID and secret are exchanged for a short-lived
//! bearer token, which is then sent with every request to
//! `oauth.reddit.com`.

use crate::conf::Credentials;
use crate::http::{self, HTTPError};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Endpoint that hands out access tokens.
pub const ACCESS_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// A bearer token for the Reddit API.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    access_token: String,
    expires_in: Duration,
}

impl Token {
    /// Exchanges `credentials` for an access token.
    pub async fn fetch(client: &Client, credentials: &Credentials) -> Result<Self, AuthError> {
        debug!("Requesting access token from {ACCESS_TOKEN_URL}");
        let resp = client
            .post(ACCESS_TOKEN_URL)
            .basic_auth(credentials.client_id(), Some(credentials.client_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(HTTPError::from)?;

        let status = resp.status();
        if status.is_client_error() {
            return Err(AuthError::Rejected(format!("HTTP {status}")));
        } else if !status.is_success() {
            return Err(HTTPError::Http(status).into());
        }

        http::ensure_json(resp.headers())?;
        let body = resp.text().await.map_err(HTTPError::Body)?;
        Self::parse(&body)
    }

    /// Parses the body of an access token response.
    ///
    /// Reddit reports bad credentials with a successful HTTP status and
    /// an `error` field in the body, so both shapes are handled here.
    pub fn parse(body: &str) -> Result<Self, AuthError> {
        let resp: TokenResponse = serde_json::from_str(body)?;
        match resp {
            TokenResponse::Granted {
                access_token,
                expires_in,
            } => Ok(Self {
                access_token,
                expires_in: Duration::from_secs(expires_in),
            }),
            TokenResponse::Denied { error } => {
                let reason = error
                    .as_str()
                    .map(String::from)
                    .unwrap_or_else(|| error.to_string());
                Err(AuthError::Rejected(reason))
            }
        }
    }

    /// The token itself.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// How long the token was valid for when it was issued.
    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"********")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenResponse {
    Granted {
        access_token: String,

        #[serde(default = "default_expiry")]
        expires_in: u64,
    },
    Denied {
        error: serde_json::Value,
    },
}

fn default_expiry() -> u64 {
    3600
}

/// Indicates authentication failed.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Reddit refused the credentials.
    #[error("Authentication failed: {0} (check client_id and client_secret)")]
    Rejected(String),

    /// The token endpoint could not be reached.
    #[error("Authentication failed: {0}")]
    Service(#[from] HTTPError),

    /// The token endpoint returned something unintelligible.
    #[error("Could not parse access token: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_a_granted_token() {
        let body = r#"{"access_token": "abc.def", "token_type": "bearer", "expires_in": 86400, "scope": "*"}"#;
        let token = Token::parse(body).unwrap();
        assert_eq!(token.access_token(), "abc.def");
        assert_eq!(token.expires_in(), Duration::from_secs(86400));
    }

    #[test]
    fn it_defaults_the_expiry_if_it_is_missing() {
        let token = Token::parse(r#"{"access_token": "abc.def"}"#).unwrap();
        assert_eq!(token.expires_in(), Duration::from_secs(3600));
    }

    #[test]
    fn it_reports_rejected_credentials() {
        let result = Token::parse(r#"{"error": "invalid_grant"}"#);
        assert!(matches!(result, Err(AuthError::Rejected(e)) if e == "invalid_grant"));
    }

    #[test]
    fn it_reports_numeric_errors() {
        let result = Token::parse(r#"{"message": "Unauthorized", "error": 401}"#);
        assert!(matches!(result, Err(AuthError::Rejected(e)) if e == "401"));
    }

    #[test]
    fn it_reports_garbage() {
        assert!(matches!(Token::parse("<html>"), Err(AuthError::Parse(_))));
    }

    #[test]
    fn it_does_not_leak_the_token_when_debugging() {
        let token = Token::parse(r#"{"access_token": "sekrit"}"#).unwrap();
        assert!(!format!("{token:?}").contains("sekrit"));
    }
}
