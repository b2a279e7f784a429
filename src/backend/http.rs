//! `reqwest`-based backend for a live admin server.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, Response, header, redirect};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

use super::{
    CSRF_HEADER, CellEditNotice, GRID_REQUEST_HEADER, GridBackend, ListActionResponse,
    PageRequest, PageResponse, RowMoveNotice, form_value,
};
use crate::config::{GridConfig, Transport};
use crate::error::{GridError, Result};

static FILENAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"filename\*?=(?:UTF-8'')?"?([^";]+)"?"#)
        .expect("content disposition regex should be valid")
});

const CONNECT_TIMEOUT_SECS: u64 = 10;
/// List actions report a redirect only when the client followed one.
const MAX_REDIRECTS: usize = 10;

/// Extract the download filename from a `Content-Disposition` header value.
pub fn disposition_filename(value: &str) -> Option<String> {
    FILENAME_REGEX
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

/// The final location of a followed redirect, if the response came from elsewhere.
fn redirected_to(requested: &Url, landed: &Url) -> Option<String> {
    (requested != landed).then(|| landed.to_string())
}

pub struct HttpBackend {
    client: Client,
    origin: Url,
    csrf_token: Option<SecretString>,
    edit_url: Option<String>,
    move_url: Option<String>,
}

impl HttpBackend {
    /// Create a backend resolving the grid's relative endpoints against `origin`.
    pub fn new(origin: &str, config: &GridConfig) -> Result<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| GridError::Config(format!("invalid server origin '{origin}': {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            origin,
            csrf_token: config
                .csrf_token
                .as_ref()
                .map(|t| SecretString::from(t.expose_secret().to_string())),
            edit_url: config.table_data_edit_url.clone(),
            move_url: config.table_action_move_url.clone(),
        })
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        self.origin
            .join(url)
            .map_err(|e| GridError::Config(format!("invalid endpoint '{url}': {e}")))
    }

    fn with_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header(GRID_REQUEST_HEADER, "true");
        match &self.csrf_token {
            Some(token) => builder.header(CSRF_HEADER, token.expose_secret()),
            None => builder,
        }
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .ok()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| status.to_string());
        Err(GridError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Read a notification reply, keeping non-JSON bodies as a string.
    async fn reply_body(response: Response) -> Result<Value> {
        let text = response.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    async fn post_form(&self, endpoint: &'static str, url: Option<&str>, form: &[(&str, String)]) -> Result<Value> {
        let url = url.ok_or(GridError::EndpointMissing { endpoint })?;
        let url = self.resolve(url)?;
        let response = self
            .with_headers(self.client.post(url))
            .form(form)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Self::reply_body(response).await
    }
}

#[async_trait::async_trait]
impl GridBackend for HttpBackend {
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse> {
        let url = self.resolve(&request.url)?;
        tracing::debug!(url = %url, transport = %request.transport, "fetching page");

        let builder = match request.transport {
            Transport::Get => self.client.get(url),
            Transport::Post => {
                let body = request.body.clone().unwrap_or(Value::Object(Default::default()));
                self.client.post(url).json(&body)
            }
        };
        let response = self.with_headers(builder).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json::<PageResponse>().await?)
    }

    async fn notify_row_moved(&self, notice: &RowMoveNotice) -> Result<Value> {
        let replaced = notice
            .replaced
            .as_ref()
            .map(|id| form_value(&id.to_value()))
            .unwrap_or_else(|| "null".to_string());
        let form = [
            ("currentRowId", form_value(&notice.current.to_value())),
            ("replacedRowId", replaced),
        ];
        self.post_form("row move", self.move_url.as_deref(), &form).await
    }

    async fn notify_cell_edited(&self, notice: &CellEditNotice) -> Result<Value> {
        let form = [
            ("currentRowId", form_value(&notice.row_id.to_value())),
            ("columnFieldName", notice.field.clone()),
            ("cellValue", form_value(&notice.value)),
        ];
        self.post_form("cell edit", self.edit_url.as_deref(), &form).await
    }

    async fn list_action(&self, url: &str, body: &Value) -> Result<ListActionResponse> {
        let url = self.resolve(url)?;
        let response = self
            .with_headers(self.client.post(url.clone()))
            .json(body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        if let Some(url) = redirected_to(&url, response.url()) {
            return Ok(ListActionResponse::Redirect { url });
        }

        let filename = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename);

        match filename {
            Some(filename) => {
                let bytes = response.bytes().await?.to_vec();
                Ok(ListActionResponse::Download { filename, bytes })
            }
            None => Ok(ListActionResponse::Notification {
                html: response.text().await?,
            }),
        }
    }
}
