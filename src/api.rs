// API client module: a small blocking HTTP client for the remote database
// service. The importer only talks to it through the `DatabaseApi` trait so
// tests can run against an in-memory database instead.

use crate::error::{ImportError, Result};
use anyhow::Context;
use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Base URL used when neither `--api-url` nor `CSV2DB_API_URL` is set.
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Field type given to every column this tool creates.
pub const TEXT_FIELD: &str = "text";

/// One field of a remote database schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl SchemaField {
    pub fn text(name: &str) -> Self {
        SchemaField {
            name: name.to_string(),
            field_type: TEXT_FIELD.to_string(),
        }
    }
}

/// A database as returned by the service.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Database {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub schema: Vec<SchemaField>,
}

impl Database {
    pub fn has_field(&self, name: &str) -> bool {
        self.schema.iter().any(|f| f.name == name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateDatabaseRequest {
    pub title: String,
    pub schema: Vec<SchemaField>,
}

/// A row stored in a remote database. Field values are kept as raw JSON
/// because existing databases may hold typed values.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RemoteRow {
    pub id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl RemoteRow {
    /// Field value rendered as text, the way it would appear in a CSV cell.
    pub fn field_text(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum IconPayload {
    Url(String),
    Emoji(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub url: String,
    pub caption: String,
}

/// Body of an add-row or update-row request.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPayload {
    pub fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,
}

#[derive(Serialize, Deserialize, Debug)]
struct AddColumnRequest<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    field_type: &'a str,
}

#[derive(Serialize, Deserialize, Debug)]
struct UploadResponse {
    url: String,
}

/// Operations the importer needs from the remote service.
pub trait DatabaseApi {
    fn fetch_database(&self, id: &str) -> Result<Database>;
    fn create_database(&self, request: &CreateDatabaseRequest) -> Result<Database>;
    fn add_column(&self, database_id: &str, name: &str) -> Result<()>;
    fn list_rows(&self, database_id: &str) -> Result<Vec<RemoteRow>>;
    fn add_row(&self, database_id: &str, row: &RowPayload) -> Result<RemoteRow>;
    fn update_row(&self, row_id: &str, row: &RowPayload) -> Result<()>;
    /// Upload a local file and return the URL it is served from.
    fn upload_file(&self, path: &Path) -> Result<String>;
}

/// Blocking client holding the reqwest client and the service base URL.
/// The bearer token is installed as a default header.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> anyhow::Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("Token contains characters not allowed in a header")?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }
}

/// Turn a non-success response into `ImportError::Api` with the body text.
fn check_status(res: Response) -> Result<Response> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status().as_u16();
    let body = res.text().unwrap_or_default();
    Err(ImportError::Api { status, body })
}

impl DatabaseApi for ApiClient {
    fn fetch_database(&self, id: &str) -> Result<Database> {
        let url = self.endpoint(&format!("databases/{}", id));
        tracing::debug!(%url, "fetching database");
        let res = check_status(self.client.get(&url).send()?)?;
        Ok(res.json()?)
    }

    fn create_database(&self, request: &CreateDatabaseRequest) -> Result<Database> {
        let url = self.endpoint("databases");
        tracing::debug!(%url, title = %request.title, "creating database");
        let res = check_status(self.client.post(&url).json(request).send()?)?;
        Ok(res.json()?)
    }

    fn add_column(&self, database_id: &str, name: &str) -> Result<()> {
        let url = self.endpoint(&format!("databases/{}/columns", database_id));
        let body = AddColumnRequest {
            name,
            field_type: TEXT_FIELD,
        };
        check_status(self.client.post(&url).json(&body).send()?)?;
        Ok(())
    }

    fn list_rows(&self, database_id: &str) -> Result<Vec<RemoteRow>> {
        let url = self.endpoint(&format!("databases/{}/rows", database_id));
        let res = check_status(self.client.get(&url).send()?)?;
        Ok(res.json()?)
    }

    fn add_row(&self, database_id: &str, row: &RowPayload) -> Result<RemoteRow> {
        let url = self.endpoint(&format!("databases/{}/rows", database_id));
        let res = check_status(self.client.post(&url).json(row).send()?)?;
        Ok(res.json()?)
    }

    fn update_row(&self, row_id: &str, row: &RowPayload) -> Result<()> {
        let url = self.endpoint(&format!("rows/{}", row_id));
        check_status(self.client.patch(&url).json(row).send()?)?;
        Ok(())
    }

    fn upload_file(&self, path: &Path) -> Result<String> {
        let url = self.endpoint("uploads");
        let file = File::open(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload")
            .to_string();

        let part = multipart::Part::reader(file)
            .file_name(file_name)
            .mime_str(mime_guess::from_path(path).first_or_octet_stream().as_ref())?;
        let form = multipart::Form::new().part("file", part);

        tracing::debug!(path = %path.display(), "uploading file");
        let res = check_status(self.client.post(&url).multipart(form).send()?)?;
        let uploaded: UploadResponse = res.json()?;
        Ok(uploaded.url)
    }
}

/// Extract the database id from a database URL: its last non-empty path
/// segment. A bare id is accepted as-is.
pub fn database_id_from_url(value: &str) -> Result<String> {
    let value = value.trim();
    match Url::parse(value) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string)
            .ok_or_else(|| ImportError::InvalidDatabaseUrl(value.to_string())),
        Err(_) if !value.is_empty() && !value.contains('/') => Ok(value.to_string()),
        Err(_) => Err(ImportError::InvalidDatabaseUrl(value.to_string())),
    }
}
