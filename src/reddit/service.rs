// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! HTTPS connector for the Reddit API.
//!
//! Service structures in this module provide a low-level way to interact
//! with the Reddit API over HTTPS, essentially a specialized HTTPS client
//! specifically for Reddit.

use crate::conf::Credentials;
use crate::http::{self, HTTPClientFactory, HTTPError, HTTPResult};
use crate::reddit::auth::{AuthError, Token};
use log::{debug, trace};
use reqwest::{Client, header};

/// Base URI for authenticated API requests.
pub const API_BASE: &str = "https://oauth.reddit.com";

/// A query string parameter.
pub type Param<'a> = (&'a str, String);

/// A service for retrieving raw resources from the Reddit API.
///
/// Using this trait, clients can implement different ways of connecting
/// to the Reddit API, such as an actual connector for production code,
/// and a mocked connector for testing purposes.
///
/// Services are shared between concurrent tasks, so they must be
/// [`Send`] and [`Sync`].
pub trait Service: Send + Sync {
    /// Performs a GET request for the resource at `path` (relative to the
    /// API root, e.g. `/r/rust/top`) with the given query parameters and
    /// returns the raw JSON body.
    fn get_resource(
        &self,
        path: &str,
        params: &[Param<'_>],
    ) -> impl Future<Output = HTTPResult<String>> + Send;
}

impl<T: Service> Service for &T {
    fn get_resource(
        &self,
        path: &str,
        params: &[Param<'_>],
    ) -> impl Future<Output = HTTPResult<String>> + Send {
        (**self).get_resource(path, params)
    }
}

/// A service that contacts the Reddit API directly to retrieve information.
#[derive(Debug)]
pub struct RedditService {
    client: Client,
    token: Token,
}

impl RedditService {
    /// Authenticates with Reddit and creates a new service.
    pub async fn authenticate(credentials: &Credentials) -> Result<Self, AuthError> {
        let factory = HTTPClientFactory::new(credentials.user_agent());
        let client = factory.create()?;
        let token = Token::fetch(&client, credentials).await?;
        debug!(
            "Authenticated; token valid for {} seconds",
            token.expires_in().as_secs()
        );
        Ok(Self { client, token })
    }

    fn uri(&self, path: &str) -> String {
        format!("{API_BASE}{path}")
    }
}

impl Service for RedditService {
    async fn get_resource(&self, path: &str, params: &[Param<'_>]) -> HTTPResult<String> {
        let uri = self.uri(path);
        debug!("GET {uri} {params:?}");

        let resp = self
            .client
            .get(&uri)
            .bearer_auth(self.token.access_token())
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        trace!("{uri} returned HTTP {status}");
        if status.is_redirection() {
            let location = resp
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            Err(HTTPError::Redirect(status, location))
        } else if !status.is_success() {
            Err(HTTPError::Http(status))
        } else {
            http::ensure_json(resp.headers())?;
            Ok(resp.text().await.map_err(HTTPError::Body)?)
        }
    }
}
