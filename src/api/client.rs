use reqwest::{Client, Method};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::api::envelope::{unwrap_envelope, ApiError};
use crate::config::ApiConfig;
use crate::model::{CatalogKind, FieldDefinition, FileHandle, Id};
use crate::store::{BackofficeApi, ResponseCache, Uploader};

const PROPERTIES_PATH: &str = "/properties";

/// `reqwest` implementation of the back-office REST API
pub struct HttpBackofficeClient {
    client: Client,
    base_url: String,
    cache: Arc<ResponseCache>,
}

impl HttpBackofficeClient {
    pub fn new(config: &ApiConfig, cache: Arc<ResponseCache>) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET through the response cache
    async fn get_data(&self, path: &str) -> Result<Value, ApiError> {
        if let Some(entry) = self.cache.get(path) {
            log::debug!("Cache hit for {} (fetched {})", path, entry.fetched_at);
            return Ok(entry.body);
        }

        let response = self.client.get(self.url(path)).send().await?;
        let data = read_response(response).await?;
        self.cache.set(path, data.clone());
        Ok(data)
    }

    async fn send_data(&self, method: Method, path: &str, payload: &Map<String, Value>) -> Result<Value, ApiError> {
        log::debug!("{} {}", method, path);
        let response = self.client.request(method, self.url(path)).json(payload).send().await?;
        read_response(response).await
    }
}

async fn read_response(response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => body,
            // Error pages are often HTML; the status is what matters
            Err(_) if !status.is_success() => Value::Null,
            Err(e) => return Err(e.into()),
        }
    };

    unwrap_envelope(status.as_u16(), body)
}

#[async_trait::async_trait]
impl BackofficeApi for HttpBackofficeClient {
    async fn fetch_catalog(&self, kind: CatalogKind) -> Result<Vec<FieldDefinition>, ApiError> {
        let data = self.get_data(kind.endpoint()).await?;
        Ok(serde_json::from_value(data)?)
    }

    async fn fetch_property(&self, id: &Id) -> Result<Map<String, Value>, ApiError> {
        let path = format!("{}/{}", PROPERTIES_PATH, id);
        match self.get_data(&path).await? {
            Value::Object(record) => Ok(record),
            _ => Err(ApiError::Decode(format!("property {} is not an object", id))),
        }
    }

    async fn create_property(&self, payload: Map<String, Value>) -> Result<Value, ApiError> {
        let data = self.send_data(Method::POST, PROPERTIES_PATH, &payload).await?;
        self.cache.invalidate_prefix(PROPERTIES_PATH);
        Ok(data)
    }

    async fn update_property(&self, id: &Id, payload: Map<String, Value>) -> Result<Value, ApiError> {
        let path = format!("{}/{}", PROPERTIES_PATH, id);
        let data = self.send_data(Method::PUT, &path, &payload).await?;
        self.cache.invalidate_prefix(PROPERTIES_PATH);
        Ok(data)
    }

    async fn patch_record(&self, resource: &str, id: &Id, payload: Map<String, Value>) -> Result<Value, ApiError> {
        let collection = format!("/{}", resource.trim_matches('/'));
        let path = format!("{}/{}", collection, id);
        let data = self.send_data(Method::PATCH, &path, &payload).await?;
        self.cache.invalidate_prefix(&collection);
        Ok(data)
    }
}

/// Multipart uploader for form attachments
pub struct HttpUploader {
    client: Client,
    url: String,
}

impl HttpUploader {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            url: format!("{}{}", config.base_url.trim_end_matches('/'), config.upload_path),
        })
    }
}

#[async_trait::async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, files: Vec<FileHandle>) -> Result<Vec<String>, ApiError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let count = files.len();
        let mut form = reqwest::multipart::Form::new();
        for file in files {
            let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.name);
            if let Some(content_type) = &file.content_type {
                part = part.mime_str(content_type)?;
            }
            form = form.part("files", part);
        }

        let response = self.client.post(&self.url).multipart(form).send().await?;
        let urls = upload_urls(read_response(response).await?)?;
        if urls.len() != count {
            log::warn!("Uploaded {} file(s) but received {} URL(s)", count, urls.len());
        }
        Ok(urls)
    }
}

/// Accepts `["url", ...]` or `{"urls": ["url", ...]}`
fn upload_urls(data: Value) -> Result<Vec<String>, ApiError> {
    let list = match data {
        Value::Object(mut map) => map.remove("urls").unwrap_or(Value::Null),
        other => other,
    };
    serde_json::from_value(list).map_err(|e| ApiError::Decode(format!("upload response: {}", e)))
}
