//! HTTP price source: one GET, then per-field extraction from the body

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::SourceCfg;
use crate::domain::price::PriceSource;
use crate::shared::errors::{AppError, PriceError};
use crate::shared::types::PriceReading;
use crate::shared::utils::parse_price_text;

/// How a single field is located in the response body
#[derive(Debug, Clone)]
pub enum FieldExtractor {
    /// RFC 6901 pointer into a JSON body; value may be a number or a price string
    JsonPointer(String),
    /// Regex over the raw body; group 1 (or the whole match) is the price text
    Pattern(Regex),
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: String,
    pub extractor: FieldExtractor,
}

impl FieldRule {
    pub fn json_pointer(name: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extractor: FieldExtractor::JsonPointer(pointer.into()),
        }
    }

    pub fn pattern(name: impl Into<String>, pattern: &str) -> Result<Self, AppError> {
        let regex = Regex::new(pattern)
            .map_err(|e| AppError::ConfigError(format!("invalid pattern {:?}: {}", pattern, e)))?;
        Ok(Self {
            name: name.into(),
            extractor: FieldExtractor::Pattern(regex),
        })
    }
}

/// Fetches the tracked price over HTTP(S)
pub struct HttpPriceSource {
    http_client: Client,
    url: String,
    rules: Vec<FieldRule>,
}

impl HttpPriceSource {
    pub fn new(
        url: impl Into<String>,
        rules: Vec<FieldRule>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, AppError> {
        if rules.is_empty() {
            return Err(AppError::ConfigError("price source needs at least one field".to_string()));
        }
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            url: url.into(),
            rules,
        })
    }

    pub fn from_config(cfg: &SourceCfg) -> Result<Self, AppError> {
        let rules = cfg
            .fields
            .iter()
            .map(|field| match (&field.json_pointer, &field.pattern) {
                (Some(pointer), None) => Ok(FieldRule::json_pointer(&field.name, pointer)),
                (None, Some(pattern)) => FieldRule::pattern(&field.name, pattern),
                _ => Err(AppError::ConfigError(format!(
                    "field {}: set exactly one of json_pointer or pattern",
                    field.name
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(
            cfg.url.clone(),
            rules,
            Duration::from_secs(cfg.timeout_secs),
            &cfg.user_agent,
        )
    }

    /// Build a reading out of a response body
    pub fn extract(&self, body: &str) -> Result<PriceReading, PriceError> {
        let needs_json = self
            .rules
            .iter()
            .any(|r| matches!(r.extractor, FieldExtractor::JsonPointer(_)));
        let json = if needs_json {
            Some(
                serde_json::from_str::<Value>(body)
                    .map_err(|e| PriceError::fetch_failed(format!("malformed JSON body: {}", e)))?,
            )
        } else {
            None
        };

        let mut fields = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let value = match &rule.extractor {
                FieldExtractor::JsonPointer(pointer) => {
                    let node = json
                        .as_ref()
                        .and_then(|v| v.pointer(pointer))
                        .ok_or_else(|| {
                            PriceError::fetch_failed(format!(
                                "field {} missing at {}",
                                rule.name, pointer
                            ))
                        })?;
                    json_to_decimal(&rule.name, node)?
                }
                FieldExtractor::Pattern(regex) => {
                    let captures = regex.captures(body).ok_or_else(|| {
                        PriceError::fetch_failed(format!(
                            "field {} not found by pattern {}",
                            rule.name,
                            regex.as_str()
                        ))
                    })?;
                    let text = captures
                        .get(1)
                        .or_else(|| captures.get(0))
                        .map(|m| m.as_str())
                        .unwrap_or_default();
                    parse_price_text(text)?
                }
            };
            fields.push((rule.name.clone(), value));
        }

        PriceReading::new(fields).map_err(|e| PriceError::fetch_failed(e.to_string()))
    }
}

fn json_to_decimal(field: &str, node: &Value) -> Result<Decimal, PriceError> {
    match node {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map_err(|e| PriceError::fetch_failed(format!("field {}: {}", field, e))),
        Value::String(s) => parse_price_text(s),
        other => Err(PriceError::fetch_failed(format!(
            "field {} is not a number: {}",
            field, other
        ))),
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<PriceReading, PriceError> {
        debug!("🔍 Fetching gold price from: {}", self.url);

        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PriceError::fetch_failed(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PriceError::fetch_failed(format!(
                "upstream responded with status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PriceError::fetch_failed(format!("failed to read body: {}", e)))?;

        let reading = self.extract(&body)?;
        info!("💰 Gold price fetched: {}", reading);
        Ok(reading)
    }
}
