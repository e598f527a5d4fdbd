use reqwest::StatusCode;
use serde_json::{Map, Value};
use tracing::info;

use crate::config::Config;
use crate::error::FundError;

/// CouchDB-style document store client. Documents are keyed by their `_id`
/// field, carried in the body of a POST to the database.
pub struct FundStore {
    client: reqwest::Client,
    db_url: String,
    db_name: String,
}

impl FundStore {
    pub fn new(config: &Config) -> Self {
        FundStore {
            client: reqwest::Client::new(),
            db_url: config.db_url.clone(),
            db_name: config.db_name.clone(),
        }
    }

    fn db_path(&self) -> String {
        format!("{}/{}", self.db_url, self.db_name)
    }

    /// Create the database if it does not exist yet.
    pub async fn ensure_database(&self) -> Result<(), FundError> {
        let response = self
            .client
            .put(self.db_path())
            .send()
            .await
            .map_err(|e| FundError::Persistence {
                id: self.db_name.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        // 412 means the database already exists, which is fine.
        if status.is_success() || status == StatusCode::PRECONDITION_FAILED {
            Ok(())
        } else {
            Err(FundError::Persistence {
                id: self.db_name.clone(),
                reason: format!("create database failed with status {}", status),
            })
        }
    }

    /// Insert one fund document. Conflicts and validation failures surface
    /// as persistence errors carrying the offending id.
    pub async fn insert(&self, document: &Map<String, Value>) -> Result<String, FundError> {
        let id = document
            .get("_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let response = self
            .client
            .post(self.db_path())
            .json(document)
            .send()
            .await
            .map_err(|e| FundError::Persistence {
                id: id.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FundError::Persistence {
                id,
                reason: format!("status {}: {}", status, body.trim()),
            });
        }

        info!("inserted fund {}", id);
        Ok(id)
    }
}
