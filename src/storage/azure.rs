//! Azure Blob Storage provider with SharedKey signing and SAS URLs.
//!
//! Writes, deletes, and listings are authorized with SharedKey request
//! signatures; reads and presigned access use Shared Access Signature
//! (SAS) URLs.
//!
//! ## Configuration
//!
//! ```bash
//! STORAGE_PROVIDER=azure
//! AZURE_STORAGE_ACCOUNT=myaccount
//! AZURE_STORAGE_ACCESS_KEY=base64-encoded-key
//! AZURE_STORAGE_ENDPOINT=...   # optional, for Azure Government / Azurite
//! ```

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::StreamExt;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;

use super::{
    ByteStream, CloudStorageProvider, HttpMethod, ObjectInfo, ObjectMetadata, ObjectPage,
};
use crate::config::Config;
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const API_VERSION: &str = "2021-06-08";

/// Azure Blob Storage configuration
#[derive(Debug, Clone)]
pub struct AzureConfig {
    /// Storage account name
    pub account_name: String,
    /// Storage account access key (base64 encoded)
    pub access_key: String,
    /// Optional custom endpoint (for Azure Government, Azurite, etc.)
    pub endpoint: Option<String>,
}

impl AzureConfig {
    /// Extract the Azure section from the application config
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            account_name: Config::require(&config.azure_account, "AZURE_STORAGE_ACCOUNT")?
                .to_string(),
            access_key: Config::require(&config.azure_access_key, "AZURE_STORAGE_ACCESS_KEY")?
                .to_string(),
            endpoint: config.azure_endpoint.clone(),
        })
    }
}

/// Azure Blob Storage provider
pub struct AzureProvider {
    config: AzureConfig,
    client: reqwest::Client,
    decoded_key: Vec<u8>,
}

impl AzureProvider {
    /// Create a new Azure Blob Storage provider
    pub fn new(config: AzureConfig) -> Result<Self> {
        let decoded_key = BASE64.decode(&config.access_key).map_err(|e| {
            AppError::Config(format!(
                "Invalid AZURE_STORAGE_ACCESS_KEY (not valid base64): {}",
                e
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Storage(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            decoded_key,
        })
    }

    /// Base URL for the storage account
    fn base_url(&self) -> String {
        self.config.endpoint.clone().unwrap_or_else(|| {
            format!("https://{}.blob.core.windows.net", self.config.account_name)
        })
    }

    /// Full URL for a blob
    fn blob_url(&self, container: &str, key: &str) -> String {
        format!("{}/{}/{}", self.base_url(), container, key)
    }

    fn hmac_sign(&self, string_to_sign: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.decoded_key)
            .map_err(|e| AppError::Storage(format!("Failed to create HMAC: {}", e)))?;
        mac.update(string_to_sign.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// Build the SharedKey Authorization header for one request.
    ///
    /// `resource_path` is the account-relative path ("/container/key",
    /// "/container", or "/"); `query` must contain every query parameter of
    /// the request, and `x_ms_headers` every x-ms-* header to be sent.
    /// Reference: https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key
    fn shared_key_auth(
        &self,
        verb: &str,
        resource_path: &str,
        query: &[(String, String)],
        x_ms_headers: &[(String, String)],
        content_length: usize,
        content_type: Option<&str>,
    ) -> Result<String> {
        let mut headers: Vec<(String, String)> = x_ms_headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();
        headers.sort();
        let canonicalized_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v))
            .collect();

        let mut canonicalized_resource =
            format!("/{}{}", self.config.account_name, resource_path);
        let mut sorted_query: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();
        sorted_query.sort();
        for (name, value) in &sorted_query {
            canonicalized_resource.push_str(&format!("\n{}:{}", name, value));
        }

        // Content-Length is an empty string when the body is empty
        let content_length = if content_length == 0 {
            String::new()
        } else {
            content_length.to_string()
        };

        let string_to_sign = format!(
            "{verb}\n\n\n{content_length}\n\n{content_type}\n\n\n\n\n\n\n{canonicalized_headers}{canonicalized_resource}",
            verb = verb,
            content_length = content_length,
            content_type = content_type.unwrap_or(""),
            canonicalized_headers = canonicalized_headers,
            canonicalized_resource = canonicalized_resource,
        );

        let signature = self.hmac_sign(&string_to_sign)?;
        Ok(format!(
            "SharedKey {}:{}",
            self.config.account_name, signature
        ))
    }

    fn date_header() -> String {
        Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
    }

    /// Generate a service SAS token.
    ///
    /// `resource` is "b" for a blob or "c" for a container;
    /// `canonical_path` matches it ("/container/key" or "/container").
    fn generate_sas_token(
        &self,
        resource: &str,
        canonical_path: &str,
        permissions: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let now = Utc::now();
        let expiry = now + ChronoDuration::seconds(expires_in.as_secs() as i64);

        let signed_start = now.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let signed_expiry = expiry.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let signed_protocol = "https";

        let canonicalized_resource = format!(
            "/blob/{}{}",
            self.config.account_name, canonical_path
        );

        // Field order is fixed by the service SAS spec
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}\n\n{}\n\n\n\n{}\n\n\n\n",
            permissions,
            signed_start,
            signed_expiry,
            canonicalized_resource,
            signed_protocol,
            API_VERSION,
        );

        let signature = self.hmac_sign(&string_to_sign)?;
        Ok(format!(
            "sv={}&st={}&se={}&sr={}&sp={}&spr={}&sig={}",
            urlencoding::encode(API_VERSION),
            urlencoding::encode(&signed_start),
            urlencoding::encode(&signed_expiry),
            resource,
            permissions,
            signed_protocol,
            urlencoding::encode(&signature),
        ))
    }

    /// SAS URL for reading one blob
    fn blob_sas_url(
        &self,
        container: &str,
        key: &str,
        permissions: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let token = self.generate_sas_token(
            "b",
            &format!("/{}/{}", container, key),
            permissions,
            expires_in,
        )?;
        Ok(format!("{}?{}", self.blob_url(container, key), token))
    }

    async fn error_from_response(
        response: reqwest::Response,
        container: &str,
        key: &str,
        context: &str,
    ) -> AppError {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return AppError::NotFound(format!("Blob not found: {}/{}", container, key));
        }
        let body = response.text().await.unwrap_or_default();
        AppError::Storage(format!(
            "Azure {} failed with status {}: {}",
            context, status, body
        ))
    }
}

#[derive(Debug, Deserialize)]
struct BlobEnumeration {
    #[serde(rename = "Blobs", default)]
    blobs: BlobItems,
    #[serde(rename = "NextMarker")]
    next_marker: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct BlobItems {
    #[serde(rename = "Blob", default)]
    blob: Vec<BlobEntry>,
}

#[derive(Debug, Deserialize)]
struct BlobEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Properties", default)]
    properties: BlobProperties,
}

#[derive(Debug, Deserialize, Default)]
struct BlobProperties {
    #[serde(rename = "Content-Length", default)]
    content_length: u64,
    #[serde(rename = "Last-Modified")]
    last_modified: Option<String>,
    #[serde(rename = "Etag")]
    etag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContainerEnumeration {
    #[serde(rename = "Containers", default)]
    containers: ContainerItems,
}

#[derive(Debug, Deserialize, Default)]
struct ContainerItems {
    #[serde(rename = "Container", default)]
    container: Vec<ContainerEntry>,
}

#[derive(Debug, Deserialize)]
struct ContainerEntry {
    #[serde(rename = "Name")]
    name: String,
}

#[async_trait]
impl CloudStorageProvider for AzureProvider {
    fn name(&self) -> &'static str {
        "azure"
    }

    async fn upload(
        &self,
        container: &str,
        key: &str,
        content: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<()> {
        let url = self.blob_url(container, key);
        let date_str = Self::date_header();
        let content_type = metadata
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");

        let mut x_ms_headers = vec![
            ("x-ms-blob-type".to_string(), "BlockBlob".to_string()),
            ("x-ms-date".to_string(), date_str.clone()),
            ("x-ms-version".to_string(), API_VERSION.to_string()),
        ];
        for (k, v) in &metadata.attributes {
            x_ms_headers.push((format!("x-ms-meta-{}", k), v.clone()));
        }

        let auth = self.shared_key_auth(
            "PUT",
            &format!("/{}/{}", container, key),
            &[],
            &x_ms_headers,
            content.len(),
            Some(content_type),
        )?;

        let mut request = self
            .client
            .put(&url)
            .header("Authorization", auth)
            .header("Content-Type", content_type)
            .header("Content-Length", content.len());
        for (name, value) in &x_ms_headers {
            request = request.header(name, value);
        }

        let response = request
            .body(content.to_vec())
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, container, key, "upload").await);
        }

        tracing::debug!(container = %container, key = %key, "Azure put blob successful");
        Ok(())
    }

    async fn download(&self, container: &str, key: &str) -> Result<Bytes> {
        let sas_url = self.blob_sas_url(container, key, "r", Duration::from_secs(300))?;

        let response = self
            .client
            .get(&sas_url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, container, key, "download").await);
        }

        response
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read response: {}", e)))
    }

    async fn download_stream(&self, container: &str, key: &str) -> Result<ByteStream> {
        let sas_url = self.blob_sas_url(container, key, "r", Duration::from_secs(300))?;

        let response = self
            .client
            .get(&sas_url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, container, key, "download").await);
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)))
            .boxed())
    }

    async fn exists(&self, container: &str, key: &str) -> Result<bool> {
        let sas_url = self.blob_sas_url(container, key, "r", Duration::from_secs(60))?;

        let response = self
            .client
            .head(&sas_url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure HEAD request failed: {}", e)))?;

        Ok(response.status().is_success())
    }

    async fn delete(&self, container: &str, key: &str) -> Result<()> {
        let url = self.blob_url(container, key);
        let date_str = Self::date_header();
        let x_ms_headers = vec![
            ("x-ms-date".to_string(), date_str.clone()),
            ("x-ms-version".to_string(), API_VERSION.to_string()),
        ];

        let auth = self.shared_key_auth(
            "DELETE",
            &format!("/{}/{}", container, key),
            &[],
            &x_ms_headers,
            0,
            None,
        )?;

        let mut request = self.client.delete(&url).header("Authorization", auth);
        for (name, value) in &x_ms_headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure delete failed: {}", e)))?;

        // Deleting an absent blob is not an error
        if response.status().is_success() || response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(container = %container, key = %key, "Azure delete blob successful");
            Ok(())
        } else {
            Err(Self::error_from_response(response, container, key, "delete").await)
        }
    }

    async fn copy(
        &self,
        src_container: &str,
        src_key: &str,
        dst_container: &str,
        dst_key: &str,
    ) -> Result<()> {
        let url = self.blob_url(dst_container, dst_key);
        let date_str = Self::date_header();
        // Grant the copy engine read access to the source via SAS
        let copy_source = self.blob_sas_url(src_container, src_key, "r", Duration::from_secs(300))?;

        let x_ms_headers = vec![
            ("x-ms-copy-source".to_string(), copy_source),
            ("x-ms-date".to_string(), date_str.clone()),
            ("x-ms-version".to_string(), API_VERSION.to_string()),
        ];

        let auth = self.shared_key_auth(
            "PUT",
            &format!("/{}/{}", dst_container, dst_key),
            &[],
            &x_ms_headers,
            0,
            None,
        )?;

        let mut request = self.client.put(&url).header("Authorization", auth);
        for (name, value) in &x_ms_headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure copy failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(
                Self::error_from_response(response, src_container, src_key, "copy").await,
            );
        }

        tracing::debug!(source = %src_key, dest = %dst_key, "Azure copy blob successful");
        Ok(())
    }

    async fn list(
        &self,
        container: &str,
        prefix: Option<&str>,
        token: Option<&str>,
        max_keys: usize,
    ) -> Result<ObjectPage> {
        let date_str = Self::date_header();
        let mut query: Vec<(String, String)> = vec![
            ("restype".into(), "container".into()),
            ("comp".into(), "list".into()),
            ("maxresults".into(), max_keys.clamp(1, 5000).to_string()),
        ];
        if let Some(p) = prefix {
            query.push(("prefix".into(), p.to_string()));
        }
        if let Some(t) = token {
            query.push(("marker".into(), t.to_string()));
        }

        let x_ms_headers = vec![
            ("x-ms-date".to_string(), date_str.clone()),
            ("x-ms-version".to_string(), API_VERSION.to_string()),
        ];
        let auth = self.shared_key_auth(
            "GET",
            &format!("/{}", container),
            &query,
            &x_ms_headers,
            0,
            None,
        )?;

        let query_string = query
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!("{}/{}?{}", self.base_url(), container, query_string);

        let mut request = self.client.get(&url).header("Authorization", auth);
        for (name, value) in &x_ms_headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure list failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, container, "", "list").await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read response: {}", e)))?;
        let result: BlobEnumeration = quick_xml::de::from_str(&body)
            .map_err(|e| AppError::Storage(format!("Failed to parse blob listing: {}", e)))?;

        let objects = result
            .blobs
            .blob
            .into_iter()
            .map(|entry| ObjectInfo {
                size_bytes: entry.properties.content_length,
                last_modified: entry
                    .properties
                    .last_modified
                    .as_deref()
                    .and_then(|t| DateTime::parse_from_rfc2822(t).ok())
                    .map(|t| t.with_timezone(&Utc)),
                etag: entry.properties.etag,
                key: entry.name,
            })
            .collect::<Vec<_>>();

        // Azure signals the last page with an empty NextMarker element
        let next_token = result.next_marker.filter(|m| !m.is_empty());
        let is_truncated = next_token.is_some();

        tracing::debug!(container = %container, prefix = ?prefix, count = objects.len(), "Azure list blobs successful");
        Ok(ObjectPage {
            objects,
            next_token,
            is_truncated,
        })
    }

    async fn presign(
        &self,
        container: &str,
        key: &str,
        method: HttpMethod,
        expires_in: Duration,
    ) -> Result<String> {
        let permissions = match method {
            HttpMethod::Get => "r",
            HttpMethod::Put => "cw",
            HttpMethod::Delete => "d",
        };
        let url = self.blob_sas_url(container, key, permissions, expires_in)?;
        tracing::debug!(
            container = %container,
            key = %key,
            method = %method,
            expires_in_secs = expires_in.as_secs(),
            "Generated Azure SAS URL"
        );
        Ok(url)
    }

    async fn create_bucket(&self, container: &str) -> Result<()> {
        let date_str = Self::date_header();
        let query = vec![("restype".to_string(), "container".to_string())];
        let x_ms_headers = vec![
            ("x-ms-date".to_string(), date_str.clone()),
            ("x-ms-version".to_string(), API_VERSION.to_string()),
        ];
        let auth = self.shared_key_auth(
            "PUT",
            &format!("/{}", container),
            &query,
            &x_ms_headers,
            0,
            None,
        )?;

        let url = format!("{}/{}?restype=container", self.base_url(), container);
        let mut request = self.client.put(&url).header("Authorization", auth);
        for (name, value) in &x_ms_headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure create container failed: {}", e)))?;

        // 409 means the container already exists; treat as success
        if response.status().is_success() || response.status() == reqwest::StatusCode::CONFLICT {
            Ok(())
        } else {
            Err(Self::error_from_response(response, container, "", "create container").await)
        }
    }

    async fn delete_bucket(&self, container: &str) -> Result<()> {
        let date_str = Self::date_header();
        let query = vec![("restype".to_string(), "container".to_string())];
        let x_ms_headers = vec![
            ("x-ms-date".to_string(), date_str.clone()),
            ("x-ms-version".to_string(), API_VERSION.to_string()),
        ];
        let auth = self.shared_key_auth(
            "DELETE",
            &format!("/{}", container),
            &query,
            &x_ms_headers,
            0,
            None,
        )?;

        let url = format!("{}/{}?restype=container", self.base_url(), container);
        let mut request = self.client.delete(&url).header("Authorization", auth);
        for (name, value) in &x_ms_headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure delete container failed: {}", e)))?;

        if response.status().is_success() || response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(Self::error_from_response(response, container, "", "delete container").await)
        }
    }

    async fn bucket_exists(&self, container: &str) -> Result<bool> {
        let date_str = Self::date_header();
        let query = vec![("restype".to_string(), "container".to_string())];
        let x_ms_headers = vec![
            ("x-ms-date".to_string(), date_str.clone()),
            ("x-ms-version".to_string(), API_VERSION.to_string()),
        ];
        let auth = self.shared_key_auth(
            "HEAD",
            &format!("/{}", container),
            &query,
            &x_ms_headers,
            0,
            None,
        )?;

        let url = format!("{}/{}?restype=container", self.base_url(), container);
        let mut request = self.client.head(&url).header("Authorization", auth);
        for (name, value) in &x_ms_headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure HEAD container failed: {}", e)))?;
        Ok(response.status().is_success())
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        let date_str = Self::date_header();
        let query = vec![("comp".to_string(), "list".to_string())];
        let x_ms_headers = vec![
            ("x-ms-date".to_string(), date_str.clone()),
            ("x-ms-version".to_string(), API_VERSION.to_string()),
        ];
        let auth = self.shared_key_auth("GET", "/", &query, &x_ms_headers, 0, None)?;

        let url = format!("{}/?comp=list", self.base_url());
        let mut request = self.client.get(&url).header("Authorization", auth);
        for (name, value) in &x_ms_headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Azure list containers failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "", "", "list containers").await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read response: {}", e)))?;
        let result: ContainerEnumeration = quick_xml::de::from_str(&body)
            .map_err(|e| AppError::Storage(format!("Failed to parse container listing: {}", e)))?;

        Ok(result
            .containers
            .container
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    async fn health_check(&self) -> Result<()> {
        self.list_buckets().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_provider() -> AzureProvider {
        AzureProvider::new(AzureConfig {
            account_name: "testaccount".into(),
            access_key: BASE64.encode(b"super-secret-storage-key"),
            endpoint: None,
        })
        .unwrap()
    }

    #[test]
    fn sas_url_has_expected_shape() {
        let provider = test_provider();
        let url = provider
            .blob_sas_url("docs", "2024/file.pdf", "r", Duration::from_secs(600))
            .unwrap();
        assert!(url.starts_with("https://testaccount.blob.core.windows.net/docs/2024/file.pdf?"));
        assert!(url.contains("sv="));
        assert!(url.contains("sp=r"));
        assert!(url.contains("sig="));
    }

    #[test]
    fn shared_key_auth_is_deterministic_per_input() {
        let provider = test_provider();
        let headers = vec![
            ("x-ms-date".to_string(), "Mon, 01 Jan 2024 00:00:00 GMT".to_string()),
            ("x-ms-version".to_string(), API_VERSION.to_string()),
        ];
        let a = provider
            .shared_key_auth("GET", "/docs", &[], &headers, 0, None)
            .unwrap();
        let b = provider
            .shared_key_auth("GET", "/docs", &[], &headers, 0, None)
            .unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("SharedKey testaccount:"));

        let c = provider
            .shared_key_auth("DELETE", "/docs", &[], &headers, 0, None)
            .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn custom_endpoint_overrides_default_host() {
        let provider = AzureProvider::new(AzureConfig {
            account_name: "devstoreaccount1".into(),
            access_key: BASE64.encode(b"key"),
            endpoint: Some("http://127.0.0.1:10000/devstoreaccount1".into()),
        })
        .unwrap();
        assert_eq!(
            provider.blob_url("docs", "a.txt"),
            "http://127.0.0.1:10000/devstoreaccount1/docs/a.txt"
        );
    }

    #[test]
    fn blob_listing_xml_parses() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://testaccount.blob.core.windows.net/" ContainerName="docs">
  <Blobs>
    <Blob>
      <Name>2024/a.pdf</Name>
      <Properties>
        <Content-Length>42</Content-Length>
        <Last-Modified>Mon, 01 Jan 2024 10:00:00 GMT</Last-Modified>
        <Etag>0x8D</Etag>
      </Properties>
    </Blob>
  </Blobs>
  <NextMarker>marker-1</NextMarker>
</EnumerationResults>"#;
        let result: BlobEnumeration = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(result.blobs.blob.len(), 1);
        assert_eq!(result.blobs.blob[0].name, "2024/a.pdf");
        assert_eq!(result.blobs.blob[0].properties.content_length, 42);
        assert_eq!(result.next_marker.as_deref(), Some("marker-1"));
    }

    #[test]
    fn container_listing_xml_parses() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults>
  <Containers>
    <Container><Name>docs</Name></Container>
    <Container><Name>media</Name></Container>
  </Containers>
</EnumerationResults>"#;
        let result: ContainerEnumeration = quick_xml::de::from_str(xml).unwrap();
        let names: Vec<_> = result.containers.container.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "media"]);
    }
}
