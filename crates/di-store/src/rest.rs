//! REST-backed store for managed Redis services (Upstash-compatible).
//!
//! Available only when the `rest` cargo feature is enabled. Each operation
//! is one HTTPS `POST` of a JSON command array to the service URL, with a
//! bearer token. Replies are `{"result": ...}` or `{"error": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::{bounded, EphemeralStore, StoreError, StoreResult};

pub struct RestStore {
    client: reqwest::Client,
    url: String,
    token: String,
    op_timeout: Duration,
}

#[derive(Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl RestStore {
    pub fn new(url: impl Into<String>, token: impl Into<String>, op_timeout: Duration) -> StoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(op_timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            op_timeout,
        })
    }

    async fn command(&self, args: Vec<String>) -> StoreResult<Value> {
        bounded(self.op_timeout, async {
            let resp = self
                .client
                .post(&self.url)
                .bearer_auth(&self.token)
                .json(&args)
                .send()
                .await
                .map_err(|e| self.map_transport_err(e))?;

            let status = resp.status();
            if status.is_server_error() || status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(StoreError::Unavailable(format!(
                    "store returned {status} for {}",
                    args.first().map(String::as_str).unwrap_or("?")
                )));
            }
            let reply: RestReply = resp
                .json()
                .await
                .map_err(|e| StoreError::Protocol(format!("undecodable reply: {e}")))?;
            decode_reply(reply)
        })
        .await
    }

    fn map_transport_err(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(self.op_timeout)
        } else {
            StoreError::Unavailable(e.to_string())
        }
    }
}

fn decode_reply(reply: RestReply) -> StoreResult<Value> {
    if let Some(error) = reply.error {
        return Err(StoreError::Protocol(error));
    }
    Ok(reply.result.unwrap_or(Value::Null))
}

fn value_to_string(value: Value) -> StoreResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(StoreError::Protocol(format!("expected string reply, got {other}"))),
    }
}

fn value_to_i64(value: &Value) -> StoreResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| StoreError::Protocol(format!("expected integer reply, got {value}")))
}

#[async_trait]
impl EphemeralStore for RestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        if ttl.is_zero() {
            return self.delete(key).await;
        }
        let ttl_ms = ttl.as_millis().max(1);
        self.command(vec![
            "SET".into(),
            key.into(),
            value.into(),
            "PX".into(),
            ttl_ms.to_string(),
        ])
        .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self.command(vec!["GET".into(), key.into()]).await?;
        value_to_string(value)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let value = self.command(vec!["EXISTS".into(), key.into()]).await?;
        Ok(value_to_i64(&value)? > 0)
    }

    async fn remaining_ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let value = self.command(vec!["PTTL".into(), key.into()]).await?;
        let ttl_ms = value_to_i64(&value)?;
        Ok(u64::try_from(ttl_ms).ok().map(Duration::from_millis))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.command(vec!["DEL".into(), key.into()]).await?;
        Ok(())
    }
}
