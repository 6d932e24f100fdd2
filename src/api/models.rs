use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ServiceError, ServiceResult};
use crate::search::{DEFAULT_COMMUNITY_LEVEL, SearchParams};

/// Identifier reported in every response.
pub const MODEL_NAME: &str = "GraphRAGService";

pub const PING: &str = "ping";

/// Outer request shape. `params` stays raw so a ping never depends on it.
#[derive(Debug, Deserialize)]
pub struct SearchEnvelope {
    pub point: String,
    #[serde(default)]
    pub params: Value,
}

impl SearchEnvelope {
    pub fn is_ping(&self) -> bool {
        self.point == PING
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SearchInputs {
    pub root_dir: Option<String>,
    pub method: Option<String>,
    #[serde(default = "default_community_level")]
    pub community_level: u32,
    pub response_type: Option<String>,
}

fn default_community_level() -> u32 {
    DEFAULT_COMMUNITY_LEVEL
}

/// The `params` object of a non-ping request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub inputs: SearchInputs,
    pub query: String,
}

impl SearchQuery {
    /// Reads `params.query` and `params.inputs`. A `query` key repeated inside
    /// `inputs` is dropped; the top-level one always wins.
    pub fn from_params(params: Value) -> ServiceResult<Self> {
        let Value::Object(mut params) = params else {
            return Err(malformed("`params` must be an object"));
        };

        let query = match params.remove("query") {
            Some(Value::String(query)) => query,
            Some(_) => return Err(malformed("`params.query` must be a string")),
            None => return Err(malformed("missing `params.query`")),
        };

        let mut inputs: Map<String, Value> = match params.remove("inputs") {
            Some(Value::Object(inputs)) => inputs,
            Some(_) => return Err(malformed("`params.inputs` must be an object")),
            None => return Err(malformed("missing `params.inputs`")),
        };
        if inputs.remove("query").is_some() {
            log::debug!("Dropped duplicate query from params.inputs");
        }

        let inputs: SearchInputs = serde_json::from_value(Value::Object(inputs))?;
        Ok(Self { inputs, query })
    }

    pub fn search_params(&self) -> SearchParams {
        let mut params = SearchParams::new(self.query.clone())
            .with_community_level(self.inputs.community_level);
        if let Some(root_dir) = &self.inputs.root_dir {
            params = params.with_root_dir(root_dir.clone());
        }
        if let Some(response_type) = &self.inputs.response_type {
            params = params.with_response_type(response_type.clone());
        }
        params
    }
}

fn malformed(msg: &str) -> ServiceError {
    ServiceError::MalformedRequest(msg.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub model: String,
    pub result: String,
}

impl SearchResponse {
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            model: MODEL_NAME.to_string(),
            result: result.into(),
        }
    }

    pub fn pong() -> Self {
        Self::new("pong")
    }
}
