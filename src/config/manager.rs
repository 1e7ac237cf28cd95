//! 配置结构与加载逻辑

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::error::{helpers, SyncResult};

/// 翻译同步引擎配置
///
/// 所有字段都有合理默认值，TOML 文件可以只覆盖其中一部分。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    // ------------------------------------------------------------------
    // 稳定性检测
    // ------------------------------------------------------------------
    /// 首次稳定性检查延迟（毫秒）
    pub initial_check_delay_ms: u64,
    /// 未达稳定时的复查间隔（毫秒）
    pub recheck_interval_ms: u64,
    /// 认定静止所需的无变更时长（毫秒）
    pub stability_threshold_ms: u64,

    // ------------------------------------------------------------------
    // 变更去重
    // ------------------------------------------------------------------
    /// 指纹缓存容量
    pub fingerprint_capacity: usize,
    /// 指纹计算的文本采样上限
    pub fingerprint_sample_limit: usize,

    // ------------------------------------------------------------------
    // 文本提取
    // ------------------------------------------------------------------
    /// 最短文本长度
    pub min_text_length: usize,
    /// 整棵子树跳过的元素名
    pub skip_elements: Vec<String>,
    /// 参与翻译的属性名
    pub translatable_attrs: Vec<String>,

    // ------------------------------------------------------------------
    // 翻译服务
    // ------------------------------------------------------------------
    /// 服务地址
    pub api_url: String,
    /// 源语言
    pub source_lang: String,
    /// 目标语言
    pub target_lang: String,
    /// 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 连接超时（秒）
    pub connect_timeout_secs: u64,
    /// 是否使用内置模拟翻译（无后端时的调试开关）
    pub use_mock: bool,
}

impl SyncConfig {
    /// 创建全默认配置
    pub fn new() -> Self {
        Self {
            initial_check_delay_ms: constants::DEFAULT_INITIAL_CHECK_DELAY_MS,
            recheck_interval_ms: constants::DEFAULT_RECHECK_INTERVAL_MS,
            stability_threshold_ms: constants::DEFAULT_STABILITY_THRESHOLD_MS,
            fingerprint_capacity: constants::DEFAULT_FINGERPRINT_CAPACITY,
            fingerprint_sample_limit: constants::DEFAULT_FINGERPRINT_SAMPLE_LIMIT,
            min_text_length: constants::DEFAULT_MIN_TEXT_LENGTH,
            skip_elements: constants::SKIP_ELEMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            translatable_attrs: constants::TRANSLATABLE_ATTRS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            api_url: constants::DEFAULT_API_URL.to_string(),
            source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: constants::DEFAULT_TARGET_LANG.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: constants::DEFAULT_CONNECT_TIMEOUT_SECS,
            use_mock: false,
        }
    }

    /// 从 TOML 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> SyncResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: SyncConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 按搜索路径加载配置，找不到文件时使用默认值，最后套用环境变量
    pub fn load() -> SyncResult<Self> {
        let mut config = None;
        for path in constants::CONFIG_PATHS.iter() {
            if Path::new(path).exists() {
                tracing::info!("加载配置文件: {}", path);
                config = Some(Self::from_file(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 套用环境变量覆盖
    ///
    /// 支持的变量：`LIVE_TRANSLATOR_API_URL`、`LIVE_TRANSLATOR_SOURCE_LANG`、
    /// `LIVE_TRANSLATOR_TARGET_LANG`、`LIVE_TRANSLATOR_USE_MOCK`。
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(format!("{}API_URL", constants::ENV_PREFIX)) {
            tracing::debug!("环境变量覆盖 api_url: {}", value);
            self.api_url = value;
        }
        if let Ok(value) = std::env::var(format!("{}SOURCE_LANG", constants::ENV_PREFIX)) {
            self.source_lang = value;
        }
        if let Ok(value) = std::env::var(format!("{}TARGET_LANG", constants::ENV_PREFIX)) {
            self.target_lang = value;
        }
        if let Ok(value) = std::env::var(format!("{}USE_MOCK", constants::ENV_PREFIX)) {
            self.use_mock = matches!(value.as_str(), "1" | "true" | "yes");
        }
    }

    /// 校验配置合法性
    pub fn validate(&self) -> SyncResult<()> {
        if self.initial_check_delay_ms == 0 {
            return Err(helpers::config_error("initial_check_delay_ms 不能为 0"));
        }
        if self.recheck_interval_ms == 0 {
            return Err(helpers::config_error("recheck_interval_ms 不能为 0"));
        }
        if self.stability_threshold_ms == 0 {
            return Err(helpers::config_error("stability_threshold_ms 不能为 0"));
        }
        if self.stability_threshold_ms < self.recheck_interval_ms {
            return Err(helpers::config_error(
                "stability_threshold_ms 不能小于 recheck_interval_ms",
            ));
        }
        if self.fingerprint_capacity == 0 {
            return Err(helpers::config_error("fingerprint_capacity 不能为 0"));
        }
        if self.fingerprint_sample_limit == 0 {
            return Err(helpers::config_error("fingerprint_sample_limit 不能为 0"));
        }
        if self.min_text_length == 0 {
            return Err(helpers::config_error("min_text_length 不能为 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(helpers::config_error("request_timeout_secs 不能为 0"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(helpers::config_error("connect_timeout_secs 不能为 0"));
        }
        if !self.use_mock && self.api_url.trim().is_empty() {
            return Err(helpers::config_error("api_url 不能为空"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Duration 访问器
    // ------------------------------------------------------------------

    pub fn initial_check_delay(&self) -> Duration {
        Duration::from_millis(self.initial_check_delay_ms)
    }

    pub fn recheck_interval(&self) -> Duration {
        Duration::from_millis(self.recheck_interval_ms)
    }

    pub fn stability_threshold(&self) -> Duration {
        Duration::from_millis(self.stability_threshold_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
