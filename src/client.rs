//! HTTP client for the Perks API.
//!
//! Provides both async and blocking client variants behind feature flags.

/// Base URL used when none is configured.
const DEFAULT_BASE_URL: &str = "http://localhost:4000/api";

/// Listing endpoint path.
const LIST_PATH: &str = "/perks/all";

/// Generates a Perks client (async or blocking) with builder, methods, and tests.
macro_rules! define_client {
    (
        client_name: $client:ident,
        builder_name: $builder:ident,
        http_type: $http_type:ty,
        response_type: $resp_type:ty,
        client_doc: $client_doc:expr,
        builder_doc: $builder_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
    ) => {
        #[doc = $builder_doc]
        #[derive(Debug)]
        pub struct $builder {
            /// Optional bearer token for API authentication.
            token: Option<SecretString>,
            /// Base URL override.
            base_url: Option<String>,
            /// Per-request timeout.
            timeout: Option<Duration>,
        }

        impl $builder {
            /// Sets the bearer token sent with every request.
            #[inline]
            #[must_use]
            pub fn token<T: Into<String>>(mut self, token: T) -> Self {
                self.token = Some(SecretString::from(token.into()));
                self
            }

            /// Overrides the base URL (useful for testing with a mock server).
            #[inline]
            #[must_use]
            pub fn base_url<T: Into<String>>(mut self, url: T) -> Self {
                self.base_url = Some(url.into());
                self
            }

            /// Sets a timeout applied to each request.
            #[inline]
            #[must_use]
            pub const fn timeout(mut self, timeout: Duration) -> Self {
                self.timeout = Some(timeout);
                self
            }

            /// Builds the client.
            ///
            /// # Errors
            ///
            /// Returns [`PerksError::InvalidBaseUrl`] if the base URL does not parse.
            /// Returns [`PerksError::Http`] if the HTTP client fails to build.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub fn build(self) -> Result<$client> {
                let raw = self
                    .base_url
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
                let _parsed = url::Url::parse(&raw)?;
                let base_url = raw.trim_end_matches('/').to_owned();
                tracing::debug!(base_url = %base_url, "building client");

                let mut http = <$http_type>::builder();
                if let Some(timeout) = self.timeout {
                    http = http.timeout(timeout);
                }

                Ok($client {
                    http: http.build()?,
                    token: self.token,
                    base_url,
                })
            }
        }

        #[doc = $client_doc]
        #[derive(Debug)]
        pub struct $client {
            /// Underlying HTTP client.
            http: $http_type,
            /// Optional bearer token.
            token: Option<SecretString>,
            /// API base URL without a trailing slash.
            base_url: String,
        }

        impl $client {
            /// Creates a new builder for configuring the client.
            #[inline]
            #[must_use]
            pub const fn builder() -> $builder {
                $builder {
                    token: None,
                    base_url: None,
                    timeout: None,
                }
            }

            /// Returns the configured base URL.
            #[inline]
            #[must_use]
            pub fn base_url(&self) -> &str {
                &self.base_url
            }

            /// Lists perks via the `/perks/all` endpoint.
            ///
            /// Filters that are empty after trimming are omitted from the
            /// query string.
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status, or the response cannot be deserialized.
            #[inline]
            #[tracing::instrument(skip_all, fields(
                search = query.search().unwrap_or_default(),
                merchant = query.merchant().unwrap_or_default()
            ))]
            pub $($async_kw)? fn list_perks(&self, query: &PerkQuery) -> Result<PerksResponse> {
                tracing::debug!("calling list endpoint");
                self.get_json(LIST_PATH, query) $( .$await_ext )?
            }

            /// Sends a GET request with the given query and deserializes the
            /// response.
            #[tracing::instrument(skip_all, fields(path = %path))]
            $($async_kw)? fn get_json<Resp: serde::de::DeserializeOwned>(
                &self,
                path: &str,
                query: &PerkQuery,
            ) -> Result<Resp> {
                let url = format!("{}{path}", self.base_url);
                tracing::trace!(url = %url, "sending GET request");
                let mut request = self.http.get(&url).header(ACCEPT, "application/json");
                if let Some(token) = self.token.as_ref() {
                    request = request.bearer_auth(token.expose_secret());
                }
                let response: $resp_type = request.query(query).send() $( .$await_ext )? ?;

                let status = response.status();
                tracing::debug!(status = %status, "received response");
                if status.is_success() {
                    let body = response.text() $( .$await_ext )? ?;
                    tracing::trace!(body_len = body.len(), "parsing response body");
                    serde_json::from_str(&body).map_err(PerksError::from)
                } else {
                    let body = response.text() $( .$await_ext )? .unwrap_or_default();
                    let message = serde_json::from_str::<ApiErrorBody>(&body)
                        .ok()
                        .and_then(|parsed| parsed.message);
                    tracing::debug!(status = status.as_u16(), body_len = body.len(), "API error");
                    Err(PerksError::Api {
                        status: status.as_u16(),
                        message,
                    })
                }
            }
        }

    };
}

#[cfg(feature = "async")]
mod async_client {
    //! Async HTTP client for the Perks API.

    use core::time::Duration;

    use reqwest::header::ACCEPT;
    use secrecy::{ExposeSecret, SecretString};

    use super::{DEFAULT_BASE_URL, LIST_PATH};
    use crate::error::{PerksError, Result};
    use crate::models::{ApiErrorBody, PerkQuery, PerksResponse};
    use crate::source::PerkSource;

    define_client! {
        client_name: PerksClient,
        builder_name: PerksClientBuilder,
        http_type: reqwest::Client,
        response_type: reqwest::Response,
        client_doc: "Async client for the Perks API.\n\nUse [`PerksClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`PerksClient`].",
        async_kw: async,
        await_kw: await,
    }

    impl PerkSource for PerksClient {
        #[inline]
        async fn fetch_perks(&self, query: &PerkQuery) -> Result<PerksResponse> {
            self.list_perks(query).await
        }
    }
}

#[cfg(feature = "blocking")]
mod blocking_client {
    //! Blocking (synchronous) HTTP client for the Perks API.

    use core::time::Duration;

    use reqwest::header::ACCEPT;
    use secrecy::{ExposeSecret, SecretString};

    use super::{DEFAULT_BASE_URL, LIST_PATH};
    use crate::error::{PerksError, Result};
    use crate::models::{ApiErrorBody, PerkQuery, PerksResponse};

    define_client! {
        client_name: PerksBlockingClient,
        builder_name: PerksBlockingClientBuilder,
        http_type: reqwest::blocking::Client,
        response_type: reqwest::blocking::Response,
        client_doc: "Blocking (synchronous) client for the Perks API.\n\nUse [`PerksBlockingClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`PerksBlockingClient`].",
    }
}

#[cfg(feature = "async")]
pub use async_client::{PerksClient, PerksClientBuilder};
#[cfg(feature = "blocking")]
pub use blocking_client::{PerksBlockingClient, PerksBlockingClientBuilder};
