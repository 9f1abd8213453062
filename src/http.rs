// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Shared plumbing for talking to remote services over HTTP.

use reqwest::header::{self, HeaderMap};
use reqwest::{Client, ClientBuilder, StatusCode, redirect};
use std::time::Duration;
use std::{error, fmt};

/// How long a single request may take before it is abandoned.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds HTTP clients that identify themselves with a fixed user agent.
///
/// Reddit asks API consumers to send a descriptive, unique user agent,
/// so unlike most HTTP clients the user agent here is supplied by the
/// caller (usually from the [credentials](crate::conf::Credentials))
/// rather than derived from the crate name.
#[derive(Debug, Clone)]
pub struct HTTPClientFactory {
    user_agent: String,
}

impl HTTPClientFactory {
    /// Creates a factory that stamps every client with `user_agent`.
    pub fn new(user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        Self { user_agent }
    }

    /// The user agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Creates a new HTTP client.
    ///
    /// Redirects are never followed: Reddit answers requests for
    /// subreddits that do not exist with a redirect to its search page,
    /// and callers need to see that redirect to report the problem.
    pub fn create(&self) -> HTTPResult<Client> {
        ClientBuilder::new()
            .user_agent(&self.user_agent)
            .redirect(redirect::Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(HTTPError::Request)
    }
}

impl Default for HTTPClientFactory {
    fn default() -> Self {
        Self::new(format!(
            "{} v{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ))
    }
}

/// Checks that `headers` declare a JSON body.
pub fn ensure_json(headers: &HeaderMap) -> HTTPResult<()> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .ok_or(HTTPError::MissingContentType)?
        .to_str()?;
    if content_type.starts_with("application/json") {
        Ok(())
    } else {
        Err(HTTPError::UnexpectedContentType(content_type.to_string()))
    }
}

/// The result of an HTTP request.
pub type HTTPResult<T> = Result<T, HTTPError>;

/// Indicates an error has occurred when making an HTTP call.
#[derive(Debug)]
pub enum HTTPError {
    /// An error retrieving the body of a response.
    Body(reqwest::Error),

    /// An error that occurred while making an HTTP request.
    Request(reqwest::Error),

    /// An unsuccessful HTTP status code in an HTTP response.
    Http(StatusCode),

    /// The server answered with a redirect, which is never followed.
    Redirect(StatusCode, Option<String>),

    /// A missing Content-Type header in a response.
    MissingContentType,

    /// An invalid Content-Type header.
    InvalidContentType(header::ToStrError),

    /// A Content-Type that is not understood by the service.
    UnexpectedContentType(String),
}

impl HTTPError {
    /// True if the error means the requested resource does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            HTTPError::Http(status) => *status == StatusCode::NOT_FOUND,
            HTTPError::Redirect(_, _) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for HTTPError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_body() || error.is_decode() {
            HTTPError::Body(error)
        } else {
            HTTPError::Request(error)
        }
    }
}

impl From<header::ToStrError> for HTTPError {
    fn from(error: header::ToStrError) -> Self {
        HTTPError::InvalidContentType(error)
    }
}

impl fmt::Display for HTTPError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HTTPError::Body(err) => write!(f, "Error retrieving body of HTTP response: {err}"),
            HTTPError::Request(err) => write!(f, "Error while making HTTP request: {err}"),
            HTTPError::Http(status) => write!(f, "Request returned HTTP {status}"),
            HTTPError::Redirect(status, Some(location)) => {
                write!(f, "Request was redirected ({status}) to {location}")
            }
            HTTPError::Redirect(status, None) => write!(f, "Request was redirected ({status})"),
            HTTPError::MissingContentType => write!(f, "Missing Content-Type header"),
            HTTPError::InvalidContentType(err) => {
                write!(f, "Invalid Content-Type header value: {err}")
            }
            HTTPError::UnexpectedContentType(content_type) => {
                write!(f, "Unexpected content type: {content_type}")
            }
        }
    }
}

impl error::Error for HTTPError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            HTTPError::Body(err) => Some(err),
            HTTPError::Request(err) => Some(err),
            HTTPError::Http(_) => None,
            HTTPError::Redirect(_, _) => None,
            HTTPError::MissingContentType => None,
            HTTPError::InvalidContentType(err) => Some(err),
            HTTPError::UnexpectedContentType(_) => None,
        }
    }
}
