use anyhow::{Context, Result};
use futures::future::join_all;
use serde_json::{Value, json};
use std::time::{Duration, Instant};

use crate::api::models::SearchResponse;
use crate::search::{DEFAULT_RESPONSE_TYPE, SearchMethod, SearchParams};

#[derive(Debug)]
pub struct SelfTestReport {
    pub elapsed: Duration,
    /// One entry per request, in submission order.
    pub results: Vec<Result<SearchResponse, String>>,
}

impl SelfTestReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }
}

/// Request body the self-test sends to `/search`.
pub fn self_test_payload(params: &SearchParams) -> Value {
    json!({
        "point": "app",
        "params": {
            "inputs": {
                "root_dir": params.root_dir,
                "method": SearchMethod::Local.as_str(),
                "community_level": params.community_level,
                "response_type": DEFAULT_RESPONSE_TYPE,
            },
            "query": params.query,
        }
    })
}

/// Fires `num_tests` concurrent requests at `{base_url}/search` and waits for
/// all of them. Non-200 replies are recorded per item, not returned as errors.
pub async fn run_self_test(
    client: &reqwest::Client,
    base_url: &str,
    num_tests: usize,
    params: &SearchParams,
) -> Result<SelfTestReport> {
    let url = format!("{}/search", base_url.trim_end_matches('/'));
    let payload = self_test_payload(params);

    let start = Instant::now();
    let requests = (0..num_tests).map(|_| check_search(client, &url, &payload));
    let results = join_all(requests)
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;
    let elapsed = start.elapsed();

    Ok(SelfTestReport { elapsed, results })
}

async fn check_search(
    client: &reqwest::Client,
    url: &str,
    payload: &Value,
) -> Result<Result<SearchResponse, String>> {
    let res = client
        .post(url)
        .json(payload)
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?;

    let status = res.status();
    if status != reqwest::StatusCode::OK {
        let body = res.text().await.unwrap_or_default();
        return Ok(Err(format!("Error: {}, {}", status.as_u16(), body)));
    }

    let response = res
        .json::<SearchResponse>()
        .await
        .context("Failed to decode self-test response")?;
    Ok(Ok(response))
}
