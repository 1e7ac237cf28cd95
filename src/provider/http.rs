//! HTTP 批量翻译客户端
//!
//! 线协议：POST 端点，请求体 `{"texts": [...], "source_lang": ..,
//! "target_lang": ..}`，响应体 `{"translations": [{"original": ..,
//! "translated": ..}]}`。请求超时 30 秒，连接超时 10 秒，均可配置。

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SyncConfig;
use crate::error::{helpers, SyncResult};
use crate::provider::TranslateProvider;

/// 批量翻译请求体
#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    texts: &'a [String],
    source_lang: &'a str,
    target_lang: &'a str,
}

/// 批量翻译响应体
#[derive(Debug, Deserialize)]
struct BatchResponse {
    translations: Vec<TranslationPair>,
}

#[derive(Debug, Deserialize)]
struct TranslationPair {
    original: String,
    translated: String,
}

/// 走上述线协议的 HTTP 提供方
pub struct HttpTranslateProvider {
    client: reqwest::Client,
    endpoint: String,
    source_lang: String,
    target_lang: String,
}

impl HttpTranslateProvider {
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.api_url.clone(),
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
        })
    }
}

#[async_trait]
impl TranslateProvider for HttpTranslateProvider {
    async fn translate_batch(&self, texts: &[String]) -> SyncResult<HashMap<String, String>> {
        let request = BatchRequest {
            texts,
            source_lang: &self.source_lang,
            target_lang: &self.target_lang,
        };

        tracing::debug!(count = texts.len(), endpoint = %self.endpoint, "发送批量翻译请求");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(helpers::provider_error(format!(
                "翻译接口返回 {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: BatchResponse = response.json().await?;

        let mut result = HashMap::with_capacity(parsed.translations.len());
        for pair in parsed.translations {
            // 空译文条目不可用，直接丢弃
            if pair.translated.trim().is_empty() {
                continue;
            }
            result.insert(pair.original, pair.translated);
        }

        tracing::debug!(
            requested = texts.len(),
            received = result.len(),
            "批量翻译响应解析完成"
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        "http"
    }
}
