//! CRM HTTP client (Zoho-style v2 REST API).
//!
//! List and insert calls parse the body even on error statuses: the backend
//! reports failures as a JSON `{code, message}` marker rather than relying on
//! HTTP status alone.

use serde::Deserialize;

/// A record as returned by the backend: a flat-ish JSON field map.
pub type RecordMap = serde_json::Map<String, serde_json::Value>;

/// Client for the CRM REST API.
#[derive(Clone)]
pub struct CrmClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("crm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("crm api error: {0}")]
    Api(String),
    #[error("crm backend error {code}: {message}")]
    Backend { code: String, message: String },
}

/// Module metadata entry from the schema catalog endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawModule {
    #[serde(default)]
    pub api_name: String,
    #[serde(default)]
    pub plural_label: Option<String>,
    #[serde(default)]
    pub singular_label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModulesResponse {
    #[serde(default)]
    modules: Option<Vec<RawModule>>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Option<Vec<RecordMap>>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Write response: either a per-item status nested under `data`, or a
/// top-level `{code, message}` error marker. Anything else is ambiguous and
/// interpreted by the dispatcher.
#[derive(Debug, Deserialize)]
pub struct WriteResponse {
    #[serde(default)]
    pub data: Option<Vec<WriteItem>>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WriteItem {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub details: Option<WriteDetails>,
}

#[derive(Debug, Deserialize)]
pub struct WriteDetails {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

impl WriteItem {
    /// Generated record id as display text, if the item carries one.
    pub fn record_id(&self) -> Option<String> {
        let id = self.details.as_ref()?.id.as_ref()?;
        Some(match id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

impl CrmClient {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    fn token(&self) -> Result<&str, CrmError> {
        self.token
            .as_deref()
            .ok_or_else(|| CrmError::Api("crm access token not configured".to_string()))
    }

    /// GET settings/modules — the schema catalog. Called fresh every
    /// invocation; no caching.
    pub async fn list_modules(&self) -> Result<Vec<RawModule>, CrmError> {
        let token = self.token()?;
        let url = format!("{}/settings/modules", self.base_url);
        let res = self
            .client
            .get(&url)
            .header("Authorization", format!("Zoho-oauthtoken {}", token))
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(CrmError::Api(format!("{} {}", status, body)));
        }
        let data: ModulesResponse = res.json().await?;
        Ok(data.modules.unwrap_or_default())
    }

    /// GET {module}?per_page={n} — list records for a module.
    pub async fn fetch_records(
        &self,
        module_api_name: &str,
        per_page: usize,
    ) -> Result<Vec<RecordMap>, CrmError> {
        let token = self.token()?;
        let url = format!("{}/{}?per_page={}", self.base_url, module_api_name, per_page);
        let res = self
            .client
            .get(&url)
            .header("Authorization", format!("Zoho-oauthtoken {}", token))
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        let parsed: ListResponse = serde_json::from_str(&body)
            .map_err(|_| CrmError::Api(format!("{} {}", status, body)))?;
        if let Some(code) = parsed.code {
            return Err(CrmError::Backend {
                message: parsed.message.unwrap_or_else(|| code.clone()),
                code,
            });
        }
        // An empty module returns 204 with no data array.
        Ok(parsed.data.unwrap_or_default())
    }

    /// POST {module} with `{"data":[record]}` — single-record insert. The
    /// response is returned raw for interpretation; only transport and
    /// unparseable-body failures error here.
    pub async fn insert_record(
        &self,
        module_api_name: &str,
        record: &RecordMap,
    ) -> Result<WriteResponse, CrmError> {
        let token = self.token()?;
        let url = format!("{}/{}", self.base_url, module_api_name);
        let body = serde_json::json!({ "data": [record] });
        let res = self
            .client
            .post(&url)
            .header("Authorization", format!("Zoho-oauthtoken {}", token))
            .json(&body)
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        serde_json::from_str(&body).map_err(|_| CrmError::Api(format!("{} {}", status, body)))
    }
}
