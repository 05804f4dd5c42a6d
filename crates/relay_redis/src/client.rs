// --- File: crates/relay_redis/src/client.rs ---
//! Redis cache client.
//!
//! Values are stored as strings: objects and arrays are JSON-serialized on
//! write and opportunistically JSON-parsed on read, so a stored `"42"`
//! comes back as a number and a stored plain string comes back as-is. A
//! missing key reads as `None`, which the handlers surface as
//! `{"success":true,"value":null}` rather than an error.

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde_json::{Map, Value};
use thiserror::Error;

use relay_common::RelayError;

#[derive(Error, Debug)]
pub enum CacheError {
    /// Error from the Redis server or the connection to it
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A value could not be serialized for storage
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Convert CacheError to RelayError at the envelope boundary. Redis
/// failures are wrapper-originated, so they surface as 200 envelopes.
impl From<CacheError> for RelayError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Redis(e) => RelayError::Transport(e.to_string()),
            CacheError::Serialize(e) => RelayError::Parse(e.to_string()),
        }
    }
}

/// Connection parameters for one request. Resolved from request body,
/// `x-redis-*` headers, `REDIS_*` env vars and the config section, in that
/// order, with localhost defaults.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
}

impl ConnectionParams {
    /// `redis://[:password@]host:port/db`
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

impl Default for ConnectionParams {
    fn default() -> Self {
        ConnectionParams {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            password: None,
        }
    }
}

/// One cache client per incoming request, like every other integration.
/// The multiplexed connection is dropped when the request ends.
pub struct CacheClient {
    conn: MultiplexedConnection,
}

impl CacheClient {
    pub async fn connect(params: &ConnectionParams) -> Result<Self, CacheError> {
        let client = redis::Client::open(params.url())?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(CacheClient { conn })
    }

    pub async fn set(
        &mut self,
        key: &str,
        value: &Value,
        expiry_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        let stored = encode_value(value)?;
        match expiry_seconds {
            Some(seconds) => self.conn.set_ex::<_, _, ()>(key, stored, seconds).await?,
            None => self.conn.set::<_, _, ()>(key, stored).await?,
        }
        Ok(())
    }

    pub async fn get(&mut self, key: &str) -> Result<Option<Value>, CacheError> {
        let raw: Option<String> = self.conn.get(key).await?;
        Ok(raw.map(decode_value))
    }

    pub async fn delete(&mut self, key: &str) -> Result<(), CacheError> {
        self.conn.del::<_, ()>(key).await?;
        Ok(())
    }

    pub async fn exists(&mut self, key: &str) -> Result<bool, CacheError> {
        Ok(self.conn.exists(key).await?)
    }

    pub async fn expire(&mut self, key: &str, seconds: i64) -> Result<(), CacheError> {
        self.conn.expire::<_, ()>(key, seconds).await?;
        Ok(())
    }

    pub async fn ttl(&mut self, key: &str) -> Result<i64, CacheError> {
        Ok(self.conn.ttl(key).await?)
    }

    pub async fn increment(&mut self, key: &str, amount: i64) -> Result<i64, CacheError> {
        Ok(self.conn.incr(key, amount).await?)
    }

    pub async fn decrement(&mut self, key: &str, amount: i64) -> Result<i64, CacheError> {
        Ok(self.conn.decr(key, amount).await?)
    }

    pub async fn list_push(&mut self, key: &str, values: &[Value]) -> Result<(), CacheError> {
        let stored = values
            .iter()
            .map(encode_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.conn.lpush::<_, _, ()>(key, stored).await?;
        Ok(())
    }

    pub async fn list_pop(&mut self, key: &str) -> Result<Option<Value>, CacheError> {
        let raw: Option<String> = self.conn.lpop(key, None).await?;
        Ok(raw.map(decode_value))
    }

    pub async fn list_range(
        &mut self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<Value>, CacheError> {
        let raw: Vec<String> = self.conn.lrange(key, start, stop).await?;
        Ok(raw.into_iter().map(decode_value).collect())
    }

    pub async fn set_add(&mut self, key: &str, members: &[Value]) -> Result<(), CacheError> {
        let stored = members
            .iter()
            .map(encode_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.conn.sadd::<_, _, ()>(key, stored).await?;
        Ok(())
    }

    pub async fn set_members(&mut self, key: &str) -> Result<Vec<Value>, CacheError> {
        let raw: Vec<String> = self.conn.smembers(key).await?;
        Ok(raw.into_iter().map(decode_value).collect())
    }

    pub async fn hash_set(
        &mut self,
        key: &str,
        field: &str,
        value: &Value,
    ) -> Result<(), CacheError> {
        let stored = encode_value(value)?;
        self.conn.hset::<_, _, _, ()>(key, field, stored).await?;
        Ok(())
    }

    pub async fn hash_get(&mut self, key: &str, field: &str) -> Result<Option<Value>, CacheError> {
        let raw: Option<String> = self.conn.hget(key, field).await?;
        Ok(raw.map(decode_value))
    }

    pub async fn hash_get_all(&mut self, key: &str) -> Result<Map<String, Value>, CacheError> {
        let raw: std::collections::HashMap<String, String> = self.conn.hgetall(key).await?;
        Ok(raw
            .into_iter()
            .map(|(field, value)| (field, decode_value(value)))
            .collect())
    }

    pub async fn keys(&mut self, pattern: &str) -> Result<Vec<String>, CacheError> {
        Ok(self.conn.keys(pattern).await?)
    }

    pub async fn flush_all(&mut self) -> Result<(), CacheError> {
        redis::cmd("FLUSHALL")
            .query_async::<()>(&mut self.conn)
            .await?;
        Ok(())
    }
}

/// Strings are stored raw; everything else is JSON-serialized.
fn encode_value(value: &Value) -> Result<String, CacheError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string(other)?),
    }
}

/// JSON-parse stored strings when possible, else return the raw string.
fn decode_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_includes_password_and_db_when_present() {
        let params = ConnectionParams {
            host: "cache.internal".to_string(),
            port: 6380,
            db: 3,
            password: Some("hunter2".to_string()),
        };
        assert_eq!(params.url(), "redis://:hunter2@cache.internal:6380/3");

        let params = ConnectionParams::default();
        assert_eq!(params.url(), "redis://localhost:6379/0");
    }

    #[test]
    fn objects_round_trip_through_string_storage() {
        let stored = encode_value(&json!({"a": 1})).unwrap();
        assert_eq!(decode_value(stored), json!({"a": 1}));
    }

    #[test]
    fn plain_strings_are_stored_raw_and_returned_raw() {
        let stored = encode_value(&json!("plain text")).unwrap();
        assert_eq!(stored, "plain text");
        assert_eq!(decode_value(stored), json!("plain text"));
    }

    #[test]
    fn numeric_looking_strings_come_back_as_numbers() {
        // Same behavior as parsing stored JSON: "42" decodes to a number.
        assert_eq!(decode_value("42".to_string()), json!(42));
    }
}
