//! Request context: one HTTP client bound to a base URL and default headers.

mod helpers;
mod response;
mod transcript;
mod types;

use std::time::Instant;

use futures::future::BoxFuture;
use log::{debug, warn};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;

use crate::error::{BoxedStr, HarnessError};

use self::helpers::{build_headers, join_path, normalise_base};
use self::transcript::Transcript;

pub use self::response::ApiResponse;
pub use self::types::{ClientOptions, Params};

/// Configured session against one remote API.
///
/// The base URL and default headers are fixed when the context is created.
/// All verb helpers borrow `&self`, so one context can serve a burst of
/// concurrent requests. Dropping the context releases the connection pool
/// and flushes the transcript.
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    base: Url,
    transcript: Option<Transcript>,
}

impl HttpClient {
    /// Create a context for `base_url` with extra default `headers`.
    ///
    /// A `User-Agent` is added unless `headers` supplies one.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidBaseUrl`] when `base_url` is not an
    /// absolute URL and [`HarnessError::InvalidHeader`] for malformed headers.
    ///
    /// # Examples
    /// ```no_run
    /// use apicheck::HttpClient;
    /// # async fn run() -> Result<(), apicheck::HarnessError> {
    /// let client = HttpClient::init("https://fakestoreapi.com", &[("Accept", "application/json")])?;
    /// let resp = client.get("products", &[("limit", "3")]).await?;
    /// assert_eq!(resp.status(), 200);
    /// # Ok(())
    /// # }
    /// ```
    pub fn init(base_url: &str, headers: &[(&str, &str)]) -> Result<Self, HarnessError> {
        Self::with_options(base_url, headers, &ClientOptions::default())
    }

    /// Create a context with explicit [`ClientOptions`].
    ///
    /// # Errors
    ///
    /// As for [`HttpClient::init`], plus [`HarnessError::Io`] when the
    /// transcript cannot be opened and [`HarnessError::Transport`] when the
    /// underlying client cannot be built.
    pub fn with_options(
        base_url: &str,
        headers: &[(&str, &str)],
        options: &ClientOptions,
    ) -> Result<Self, HarnessError> {
        let base = normalise_base(base_url)?;
        let headers = build_headers(headers)?;
        let transcript = options
            .transcript
            .as_deref()
            .map(Transcript::open)
            .transpose()?;
        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = options.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().map_err(|e| HarnessError::Transport {
            context: "build client".boxed(),
            source: e,
        })?;
        debug!("opened request context for {base}");
        Ok(Self {
            client,
            base,
            transcript,
        })
    }

    /// Run `body` with a fresh context and release it on every exit path.
    ///
    /// The context is dropped when `body` completes, fails or unwinds.
    ///
    /// # Errors
    ///
    /// Returns construction errors, or whatever `body` returns.
    ///
    /// # Examples
    /// ```no_run
    /// use apicheck::{ClientOptions, HttpClient};
    /// use futures::FutureExt as _;
    /// # async fn run() -> Result<(), apicheck::HarnessError> {
    /// let count = HttpClient::scope("https://fakestoreapi.com", &[], &ClientOptions::default(), |client| {
    ///     async move {
    ///         let resp = client.get("products", &[]).await?;
    ///         Ok(resp.text().len())
    ///     }
    ///     .boxed()
    /// })
    /// .await?;
    /// # let _ = count;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scope<T, F>(
        base_url: &str,
        headers: &[(&str, &str)],
        options: &ClientOptions,
        body: F,
    ) -> Result<T, HarnessError>
    where
        F: for<'c> FnOnce(&'c Self) -> BoxFuture<'c, Result<T, HarnessError>>,
    {
        let client = Self::with_options(base_url, headers, options)?;
        let result = body(&client).await;
        drop(client);
        result
    }

    /// Base URL every path is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// GET `path` and require status 200.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::UnexpectedStatus`] for any status other than
    /// exactly 200, and [`HarnessError::Transport`] on network failure.
    pub async fn get(&self, path: &str, params: Params<'_>) -> Result<ApiResponse, HarnessError> {
        let resp = self.get_raw(path, params).await?;
        if resp.status() != StatusCode::OK {
            warn!(
                "GET {} returned {} where 200 was required",
                resp.url(),
                resp.status()
            );
            return Err(HarnessError::UnexpectedStatus {
                method: resp.method().as_str().boxed(),
                url: resp.url().as_str().boxed(),
                status: resp.status(),
                snippet: resp.snippet().boxed(),
            });
        }
        Ok(resp)
    }

    /// GET `path` without any status check.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] on network failure.
    pub async fn get_raw(
        &self,
        path: &str,
        params: Params<'_>,
    ) -> Result<ApiResponse, HarnessError> {
        let mut url = join_path(&self.base, path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter().copied());
        }
        self.send(Method::GET, url, None).await
    }

    /// POST `data` as JSON to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] on network failure and
    /// [`HarnessError::Payload`] when `data` cannot be serialised.
    pub async fn post<B>(&self, path: &str, data: Option<&B>) -> Result<ApiResponse, HarnessError>
    where
        B: Serialize + ?Sized,
    {
        self.with_body(Method::POST, path, data).await
    }

    /// PUT `data` as JSON to `path`.
    ///
    /// # Errors
    ///
    /// As for [`HttpClient::post`].
    pub async fn put<B>(&self, path: &str, data: Option<&B>) -> Result<ApiResponse, HarnessError>
    where
        B: Serialize + ?Sized,
    {
        self.with_body(Method::PUT, path, data).await
    }

    /// PATCH `data` as JSON to `path`.
    ///
    /// # Errors
    ///
    /// As for [`HttpClient::post`].
    pub async fn patch<B>(&self, path: &str, data: Option<&B>) -> Result<ApiResponse, HarnessError>
    where
        B: Serialize + ?Sized,
    {
        self.with_body(Method::PATCH, path, data).await
    }

    /// DELETE `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`] on network failure.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, HarnessError> {
        let url = join_path(&self.base, path)?;
        self.send(Method::DELETE, url, None).await
    }

    async fn with_body<B>(
        &self,
        method: Method,
        path: &str,
        data: Option<&B>,
    ) -> Result<ApiResponse, HarnessError>
    where
        B: Serialize + ?Sized,
    {
        let url = join_path(&self.base, path)?;
        let payload = data
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| HarnessError::Payload(format!("{method} {url}: {e}").boxed()))?;
        self.send(method, url, payload).await
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        payload: Option<Value>,
    ) -> Result<ApiResponse, HarnessError> {
        let context = |stage: &str| format!("{stage} {method} {url}").boxed();
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = &payload {
            request = request.json(body);
        }
        let started = Instant::now();
        let response = request.send().await.map_err(|e| HarnessError::Transport {
            context: context("send"),
            source: e,
        })?;
        let status = response.status();
        let headers = response.headers().clone();
        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| HarnessError::Transport {
            context: context("read body of"),
            source: e,
        })?;
        let elapsed = started.elapsed();
        debug!(
            "{method} {final_url} -> {} in {}ms",
            status.as_u16(),
            elapsed.as_millis()
        );
        let resp = ApiResponse::new(method, final_url, status, headers, body, elapsed);
        if let Some(t) = &self.transcript {
            t.record(payload.as_ref(), &resp);
        }
        Ok(resp)
    }
}

impl Drop for HttpClient {
    fn drop(&mut self) {
        if let Some(t) = &self.transcript {
            t.flush();
        }
        debug!("released request context for {}", self.base);
    }
}
