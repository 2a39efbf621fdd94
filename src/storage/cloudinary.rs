//! Cloudinary object store.
//!
//! Documents are uploaded as `raw` resources with signed requests. The
//! public id returned by the upload call is the storage id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::{split_file_name, ObjectRef, ObjectStore};
use crate::config::CloudinaryConfig;
use crate::{AcademiaError, Result};

/// Request timeout for Cloudinary API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Compute a Cloudinary request signature.
///
/// Parameters are sorted by name, joined as `key=value` pairs with `&`, the
/// API secret is appended, and the result is hashed with SHA-256.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!("{:x}", Sha256::digest(format!("{to_sign}{api_secret}")))
}

/// Object store backed by Cloudinary raw uploads.
#[derive(Debug, Clone)]
pub struct CloudinaryStore {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryStore {
    /// Create a new store. Fails if the credentials are incomplete.
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        if !config.is_complete() {
            return Err(AcademiaError::Config(
                "cloudinary backend requires cloud_name, api_key and api_secret".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("academia/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AcademiaError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn api_url(&self, action: &str) -> String {
        format!(
            "{}/{}/raw/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    /// Delivery URL for a public id.
    pub fn delivery_url(&self, public_id: &str) -> String {
        let encoded = public_id
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/{}/raw/upload/{}",
            self.config.delivery_base.trim_end_matches('/'),
            self.config.cloud_name,
            encoded
        )
    }

    /// Public id (without folder) for a new upload.
    pub fn public_id_for(suggested_name: &str, unix_millis: i64) -> String {
        let (stem, ext) = split_file_name(suggested_name);
        format!("{stem}-{unix_millis}.{ext}")
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorResponse>().await {
            Ok(body) => format!("{status}: {}", body.error.message),
            Err(_) => status.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for CloudinaryStore {
    fn name(&self) -> &'static str {
        "cloudinary"
    }

    async fn put(&self, bytes: &[u8], suggested_name: &str) -> Result<ObjectRef> {
        let now = chrono::Utc::now();
        let timestamp = now.timestamp().to_string();
        let public_id = Self::public_id_for(suggested_name, now.timestamp_millis());

        let signature = sign_params(
            &[
                ("folder", self.config.folder.as_str()),
                ("public_id", public_id.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
        );

        let file_part = multipart::Part::bytes(bytes.to_vec())
            .file_name(suggested_name.to_string())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("public_id", public_id)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.api_url("upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            return Err(AcademiaError::Storage(format!("upload rejected: {message}")));
        }

        let body: UploadResponse = response.json().await?;
        debug!(storage_id = %body.public_id, "Uploaded object to Cloudinary");

        Ok(ObjectRef {
            url: body.secure_url,
            storage_id: body.public_id,
        })
    }

    async fn get(&self, storage_id: &str) -> Result<Vec<u8>> {
        let response = self.client.get(self.delivery_url(storage_id)).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(AcademiaError::NotFound(format!("object {storage_id}"))),
            status => Err(AcademiaError::Storage(format!(
                "download of {storage_id} failed: {status}"
            ))),
        }
    }

    async fn delete(&self, storage_id: &str) -> Result<bool> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", storage_id), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        let response = self
            .client
            .post(self.api_url("destroy"))
            .form(&[
                ("public_id", storage_id),
                ("api_key", self.config.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            return Err(AcademiaError::Storage(format!("destroy rejected: {message}")));
        }

        let body: DestroyResponse = response.json().await?;
        match body.result.as_str() {
            "ok" => Ok(true),
            "not found" => Ok(false),
            other => {
                warn!(storage_id = %storage_id, result = %other, "Unexpected destroy result");
                Err(AcademiaError::Storage(format!(
                    "destroy of {storage_id} returned {other}"
                )))
            }
        }
    }

    fn storage_id_from_url(&self, url: &str) -> Option<String> {
        let parsed = url::Url::parse(url).ok()?;
        let segments: Vec<String> = parsed
            .path_segments()?
            .map(|s| urlencoding::decode(s).map(|d| d.into_owned()))
            .collect::<std::result::Result<_, _>>()
            .ok()?;

        let upload_index = segments.iter().position(|s| s == "upload")?;
        let mut rest = &segments[upload_index + 1..];

        // Skip the optional version segment (v1699999999)
        if let Some(first) = rest.first() {
            if first.len() > 1
                && first.starts_with('v')
                && first[1..].chars().all(|c| c.is_ascii_digit())
            {
                rest = &rest[1..];
            }
        }

        if rest.is_empty() || rest.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(rest.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Multipart, State},
        routing::{get, post},
        Form, Json, Router,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn test_config(base: &str) -> CloudinaryConfig {
        CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            folder: "academia-resources".to_string(),
            api_base: base.to_string(),
            delivery_base: base.to_string(),
        }
    }

    #[test]
    fn test_new_requires_credentials() {
        let mut config = test_config("http://localhost");
        config.api_secret.clear();
        assert!(matches!(
            CloudinaryStore::new(config),
            Err(AcademiaError::Config(_))
        ));
    }

    #[test]
    fn test_sign_params_sorted() {
        let a = sign_params(&[("timestamp", "1"), ("folder", "f")], "s");
        let b = sign_params(&[("folder", "f"), ("timestamp", "1")], "s");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(
            a,
            format!("{:x}", Sha256::digest(b"folder=f&timestamp=1s"))
        );
    }

    #[test]
    fn test_sign_params_skips_empty() {
        assert_eq!(
            sign_params(&[("folder", ""), ("timestamp", "1")], "s"),
            sign_params(&[("timestamp", "1")], "s")
        );
    }

    #[test]
    fn test_public_id_for() {
        assert_eq!(
            CloudinaryStore::public_id_for("Midterm 2023.pdf", 1700000000000),
            "Midterm 2023-1700000000000.pdf"
        );
    }

    #[test]
    fn test_delivery_url_encodes_segments() {
        let store = CloudinaryStore::new(test_config("https://res.example.com")).unwrap();
        assert_eq!(
            store.delivery_url("academia-resources/Midterm 2023-1.pdf"),
            "https://res.example.com/demo/raw/upload/academia-resources/Midterm%202023-1.pdf"
        );
    }

    #[test]
    fn test_storage_id_from_url() {
        let store = CloudinaryStore::new(test_config("https://api.example.com")).unwrap();

        assert_eq!(
            store.storage_id_from_url(
                "https://res.cloudinary.com/demo/raw/upload/v1700000000/academia-resources/Midterm%202023-1700000000000.pdf"
            ),
            Some("academia-resources/Midterm 2023-1700000000000.pdf".to_string())
        );
        assert_eq!(
            store.storage_id_from_url(
                "https://res.cloudinary.com/demo/raw/upload/academia-resources/notes.pdf"
            ),
            Some("academia-resources/notes.pdf".to_string())
        );
        assert_eq!(
            store.storage_id_from_url("https://res.cloudinary.com/demo/raw/upload/"),
            None
        );
        assert_eq!(store.storage_id_from_url("not a url"), None);
    }

    #[derive(Default)]
    struct MockState {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        fields: Mutex<HashMap<String, String>>,
    }

    async fn mock_upload(
        State(state): State<Arc<MockState>>,
        mut multipart: Multipart,
    ) -> Json<serde_json::Value> {
        let mut data = Vec::new();
        let mut fields = HashMap::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                data = field.bytes().await.unwrap().to_vec();
            } else {
                fields.insert(name, field.text().await.unwrap());
            }
        }

        let public_id = format!("{}/{}", fields["folder"], fields["public_id"]);
        state
            .objects
            .lock()
            .unwrap()
            .insert(public_id.clone(), data);
        *state.fields.lock().unwrap() = fields;

        Json(serde_json::json!({
            "public_id": public_id,
            "secure_url": format!("https://res.example.com/demo/raw/upload/v1/{public_id}"),
        }))
    }

    async fn mock_destroy(
        State(state): State<Arc<MockState>>,
        Form(form): Form<HashMap<String, String>>,
    ) -> Json<serde_json::Value> {
        let removed = state
            .objects
            .lock()
            .unwrap()
            .remove(&form["public_id"])
            .is_some();
        Json(serde_json::json!({ "result": if removed { "ok" } else { "not found" } }))
    }

    async fn mock_download(
        State(state): State<Arc<MockState>>,
        axum::extract::Path((folder, name)): axum::extract::Path<(String, String)>,
    ) -> std::result::Result<Vec<u8>, axum::http::StatusCode> {
        state
            .objects
            .lock()
            .unwrap()
            .get(&format!("{folder}/{name}"))
            .cloned()
            .ok_or(axum::http::StatusCode::NOT_FOUND)
    }

    async fn spawn_mock() -> (String, Arc<MockState>) {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/demo/raw/upload", post(mock_upload))
            .route("/demo/raw/destroy", post(mock_destroy))
            .route("/demo/raw/upload/:folder/:name", get(mock_download))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), state)
    }

    #[tokio::test]
    async fn test_put_get_delete_against_mock() {
        let (base, state) = spawn_mock().await;
        let store = CloudinaryStore::new(test_config(&base)).unwrap();

        let object = store.put(b"%PDF-1.4 cloud", "exam.pdf").await.unwrap();
        assert!(object.storage_id.starts_with("academia-resources/exam-"));
        assert!(object.storage_id.ends_with(".pdf"));

        {
            let fields = state.fields.lock().unwrap();
            assert_eq!(fields["api_key"], "key");
            assert_eq!(fields["signature_algorithm"], "sha256");
            let expected = sign_params(
                &[
                    ("folder", fields["folder"].as_str()),
                    ("public_id", fields["public_id"].as_str()),
                    ("timestamp", fields["timestamp"].as_str()),
                ],
                "secret",
            );
            assert_eq!(fields["signature"], expected);
        }

        assert_eq!(
            store.storage_id_from_url(&object.url),
            Some(object.storage_id.clone())
        );

        let content = store.get(&object.storage_id).await.unwrap();
        assert_eq!(content, b"%PDF-1.4 cloud");

        assert!(store.delete(&object.storage_id).await.unwrap());
        assert!(!store.delete(&object.storage_id).await.unwrap());
        assert!(matches!(
            store.get(&object.storage_id).await,
            Err(AcademiaError::NotFound(_))
        ));
    }
}
