// src/proxy/origin_client.rs
use serde_json::Value;

use crate::error::{Error, Result};
use crate::wire::{self, OriginResponse, Status};

/// Outcome of an origin fetch. NOT_FOUND is an answer, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Ok(Value),
    NotFound,
}

/// Thin client for the origin's line protocol; a fresh connection per fetch.
#[derive(Debug, Clone)]
pub struct OriginClient {
    addr: String,
}

impl OriginClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub async fn fetch(&self, cache_key: &str) -> Result<Fetched> {
        let reply = wire::send_line(&self.addr, &format!("GET {cache_key}")).await?;
        let response: OriginResponse =
            serde_json::from_str(&reply).map_err(|e| Error::MalformedResponse(e.to_string()))?;

        match response.status {
            Status::Ok => Ok(Fetched::Ok(response.data.unwrap_or(Value::Null))),
            Status::NotFound => Ok(Fetched::NotFound),
            other => Err(Error::MalformedResponse(format!(
                "unexpected origin status {other:?}"
            ))),
        }
    }
}
