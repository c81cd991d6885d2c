use std::env;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// 永続化バックエンドの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    DynamoDb,
}

/// ログの出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub dynamodb_table: String,
    /// DynamoDB Local などのエンドポイント上書き
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: String,
    pub environment: String,
    pub host: IpAddr,
    pub port: u16,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            dynamodb_table: "todo-dev".to_string(),
            dynamodb_endpoint: None,
            aws_region: "ap-northeast-1".to_string(),
            environment: "dev".to_string(),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を組み立てます（テスト用に分離）
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let store_backend = match lookup("TODO_STORE").as_deref() {
            None | Some("memory") => StoreBackend::Memory,
            Some("dynamodb") => StoreBackend::DynamoDb,
            Some(other) => return Err(invalid("TODO_STORE", other, "expected memory or dynamodb")),
        };

        let host = match lookup("HOST") {
            Some(raw) => raw
                .parse()
                .map_err(|e: std::net::AddrParseError| invalid("HOST", &raw, &e.to_string()))?,
            None => defaults.host,
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid("PORT", &raw, &e.to_string()))?,
            None => defaults.port,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(invalid("LOG_FORMAT", other, "expected json or text")),
        };

        Ok(Config {
            store_backend,
            dynamodb_table: lookup("DYNAMODB_TABLE").unwrap_or(defaults.dynamodb_table),
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT").filter(|s| !s.is_empty()),
            aws_region: lookup("AWS_REGION").unwrap_or(defaults.aws_region),
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            host,
            port,
            log_format,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.dynamodb_table, "todo-dev");
        assert_eq!(config.dynamodb_endpoint, None);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn reads_every_variable() {
        let config = Config::from_lookup(lookup_from(&[
            ("TODO_STORE", "dynamodb"),
            ("DYNAMODB_TABLE", "todos"),
            ("DYNAMODB_ENDPOINT", "http://localhost:8000"),
            ("AWS_REGION", "us-east-1"),
            ("ENVIRONMENT", "prod"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(config.store_backend, StoreBackend::DynamoDb);
        assert_eq!(config.dynamodb_table, "todos");
        assert_eq!(config.dynamodb_endpoint.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.aws_region, "us-east-1");
        assert_eq!(config.environment, "prod");
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));

        let err = Config::from_lookup(lookup_from(&[("TODO_STORE", "postgres")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "TODO_STORE", .. }));

        let err = Config::from_lookup(lookup_from(&[("HOST", "localhost:1")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "HOST", .. }));
    }
}
