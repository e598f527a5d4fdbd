use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::FundError;

const SYMBOL_LOOKUP_URL: &str =
    "https://www.morningstar.com.au/Ausearch/SecurityCodeAutoLookup";
const REPORT_BASE_URL: &str = "http://www.morningstar.com.au/Fund/FundReportPrint/";

/// Pause between transport-level retry attempts. Fixed, not adaptive.
const RETRY_PAUSE_MS: u64 = 500;

#[derive(Deserialize)]
struct LookupBody {
    response: LookupResponse,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(rename = "numFound")]
    num_found: u64,
    #[serde(default)]
    docs: Vec<LookupDoc>,
}

#[derive(Deserialize)]
struct LookupDoc {
    #[serde(rename = "Symbol")]
    symbol: String,
}

/// HTTP collaborator: resolves fund codes to report symbols and fetches
/// report pages. Retries transport failures up to the configured attempt
/// count; HTTP-level errors are never retried.
pub struct Fetcher {
    client: reqwest::Client,
    attempts: u32,
}

impl Fetcher {
    pub fn new(attempts: u32) -> Self {
        Fetcher {
            client: reqwest::Client::new(),
            attempts: attempts.max(1),
        }
    }

    pub fn report_url(symbol: &str) -> String {
        format!("{}{}", REPORT_BASE_URL, symbol)
    }

    /// Resolve a fund code to its report symbol via the search endpoint.
    pub async fn lookup_symbol(&self, code: &str) -> Result<String, FundError> {
        let query = format!("*{}", code);
        let response = self
            .send_with_retry(|| {
                self.client
                    .get(SYMBOL_LOOKUP_URL)
                    .query(&[
                        ("q", query.as_str()),
                        ("rows", "1"),
                        ("fq", "SecurityTypeId:(1 OR 2 OR 3 OR 4 OR 5)"),
                        ("sort", "UniverseSort asc"),
                    ])
                    .header(
                        reqwest::header::ACCEPT,
                        "application/json, text/javascript, */*",
                    )
            })
            .await?;

        if !response.status().is_success() {
            return Err(FundError::Http {
                status: response.status().as_u16(),
            });
        }

        let body: LookupBody = response
            .json()
            .await
            .map_err(|e| FundError::Parse(format!("symbol lookup response: {}", e)))?;

        if body.response.num_found >= 1 {
            if let Some(doc) = body.response.docs.into_iter().next() {
                debug!(code, symbol = %doc.symbol, "resolved symbol");
                return Ok(doc.symbol);
            }
        }

        Err(FundError::NotFound {
            code: code.to_string(),
        })
    }

    /// Fetch the raw report page for a symbol.
    pub async fn fetch_report(&self, symbol: &str) -> Result<String, FundError> {
        let url = Self::report_url(symbol);
        let response = self.send_with_retry(|| self.client.get(&url)).await?;

        if !response.status().is_success() {
            return Err(FundError::Http {
                status: response.status().as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    async fn send_with_retry(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, FundError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match build().send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.attempts => {
                    warn!(
                        "request failed (attempt {}/{}): {}",
                        attempt, self.attempts, e
                    );
                    tokio::time::sleep(Duration::from_millis(RETRY_PAUSE_MS)).await;
                }
                Err(e) => return Err(FundError::Transport(e)),
            }
        }
    }
}
