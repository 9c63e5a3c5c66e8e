use crate::config::RecallConfig;
use crate::todo::{ArchivedTodo, NewArchivedTodo, NewTodo, RecordId, Todo};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Failure of a single remote call. Not-found is reported like any other
/// non-success status.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{method} {url} failed: {source}")]
    Request {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned HTTP {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("HTTP client build failed: {0}")]
    Client(#[source] reqwest::Error),
    #[error("server URL is empty")]
    EmptyServerUrl,
}

/// A named remote collection of records.
pub trait RemoteCollection {
    type Record;
    type Draft;

    fn name(&self) -> &str;
    fn list(&self) -> Result<Vec<Self::Record>, TransportError>;
    fn create(&self, draft: &Self::Draft) -> Result<Self::Record, TransportError>;
    fn delete(&self, id: &RecordId) -> Result<(), TransportError>;
}

impl<C: RemoteCollection + ?Sized> RemoteCollection for &C {
    type Record = C::Record;
    type Draft = C::Draft;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn list(&self) -> Result<Vec<Self::Record>, TransportError> {
        (**self).list()
    }

    fn create(&self, draft: &Self::Draft) -> Result<Self::Record, TransportError> {
        (**self).create(draft)
    }

    fn delete(&self, id: &RecordId) -> Result<(), TransportError> {
        (**self).delete(id)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

fn log_http_request(method: &str, url: &str, body: Option<&str>) {
    debug!("[HTTP OUT] {} {}", method, url);
    if let Some(b) = body {
        debug!("  Body: {}", truncate(b, 4000));
    }
}

fn log_http_response(status: u16, body: &str) {
    debug!("[HTTP IN] Status: {}", status);
    debug!("  Body: {}", truncate(body, 4000));
}

/// Blocking HTTP access to the remote store.
#[derive(Clone)]
pub struct RemoteClient {
    pub base_url: String,
    pub client: Client,
    active_path: String,
    archived_path: String,
}

impl RemoteClient {
    pub fn from_config(cfg: &RecallConfig) -> Result<Self, TransportError> {
        let base = cfg.server_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(TransportError::EmptyServerUrl);
        }
        let client = Client::builder().build().map_err(TransportError::Client)?;
        debug!("RemoteClient for {}", base);
        Ok(Self {
            base_url: base.to_string(),
            client,
            active_path: cfg.active_collection.trim_matches('/').to_string(),
            archived_path: cfg.archived_collection.trim_matches('/').to_string(),
        })
    }

    pub fn active(&self) -> HttpCollection<Todo, NewTodo> {
        HttpCollection::new(self, &self.active_path)
    }

    pub fn archived(&self) -> HttpCollection<ArchivedTodo, NewArchivedTodo> {
        HttpCollection::new(self, &self.archived_path)
    }

    // Sends the request and returns the body text of a 2xx response.
    fn send(
        &self,
        method: &'static str,
        url: &str,
        req: RequestBuilder,
        body: Option<&str>,
    ) -> Result<String, TransportError> {
        log_http_request(method, url, body);
        let resp = req
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|source| TransportError::Request {
                method,
                url: url.to_string(),
                source,
            })?;
        let status = resp.status();
        let text = resp.text().map_err(|source| TransportError::Request {
            method,
            url: url.to_string(),
            source,
        })?;
        log_http_response(status.as_u16(), &text);
        if !status.is_success() {
            return Err(TransportError::Status {
                method,
                url: url.to_string(),
                status: status.as_u16(),
                body: truncate(&text, 500),
            });
        }
        Ok(text)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, TransportError> {
        let text = self.send("GET", url, self.client.get(url), None)?;
        decode(url, &text)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let payload = serde_json::to_string(body).map_err(|source| TransportError::Decode {
            url: url.to_string(),
            source,
        })?;
        let req = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        let text = self.send("POST", url, req, Some(&payload))?;
        decode(url, &text)
    }

    fn delete(&self, url: &str) -> Result<(), TransportError> {
        self.send("DELETE", url, self.client.delete(url), None)?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(url: &str, text: &str) -> Result<T, TransportError> {
    serde_json::from_str(text).map_err(|source| TransportError::Decode {
        url: url.to_string(),
        source,
    })
}

/// One collection on the remote store, e.g. `{server}/active`.
pub struct HttpCollection<R, D> {
    remote: RemoteClient,
    name: String,
    url: String,
    _records: PhantomData<fn() -> (R, D)>,
}

impl<R, D> HttpCollection<R, D> {
    fn new(remote: &RemoteClient, path: &str) -> Self {
        Self {
            remote: remote.clone(),
            name: path.to_string(),
            url: format!("{}/{}", remote.base_url, path),
            _records: PhantomData,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl<R, D> RemoteCollection for HttpCollection<R, D>
where
    R: DeserializeOwned,
    D: Serialize,
{
    type Record = R;
    type Draft = D;

    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self) -> Result<Vec<R>, TransportError> {
        self.remote.get_json(&self.url)
    }

    fn create(&self, draft: &D) -> Result<R, TransportError> {
        self.remote.post_json(&self.url, draft)
    }

    fn delete(&self, id: &RecordId) -> Result<(), TransportError> {
        let url = format!("{}/{}", self.url, id);
        self.remote.delete(&url)
    }
}
