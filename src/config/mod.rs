//! 引擎配置模块
//!
//! 集中管理翻译同步引擎的所有可调参数：
//!
//! - 稳定性检测的时间窗口（初检延迟、复查间隔、稳定阈值）
//! - 变更指纹缓存的容量和采样上限
//! - 文本过滤和可翻译属性的规则
//! - 翻译服务的地址、语言和超时设置
//!
//! 配置来源的优先级：代码内默认值 < TOML 配置文件 < 环境变量。

pub mod manager;

pub use manager::SyncConfig;

/// 固定默认值集合
pub mod constants {
    /// 首次稳定性检查的延迟（毫秒）
    pub const DEFAULT_INITIAL_CHECK_DELAY_MS: u64 = 500;

    /// 未达稳定时的复查间隔（毫秒）
    pub const DEFAULT_RECHECK_INTERVAL_MS: u64 = 200;

    /// 认定变更已静止所需的无变更时长（毫秒）
    pub const DEFAULT_STABILITY_THRESHOLD_MS: u64 = 800;

    /// 变更指纹缓存的最大条目数
    pub const DEFAULT_FINGERPRINT_CAPACITY: usize = 100;

    /// 参与指纹计算的文本采样上限
    ///
    /// 超出上限的文本不参与哈希，属于刻意的近似：
    /// 仅在采样之外有差异的变更集会被视为重复。
    pub const DEFAULT_FINGERPRINT_SAMPLE_LIMIT: usize = 200;

    /// 参与翻译的最短文本长度（按去除首尾空白后的字符数）
    pub const DEFAULT_MIN_TEXT_LENGTH: usize = 1;

    /// 参与翻译的元素属性
    pub const TRANSLATABLE_ATTRS: [&str; 3] = ["placeholder", "title", "alt"];

    /// 整棵子树跳过翻译的元素
    pub const SKIP_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

    /// 默认翻译服务地址
    pub const DEFAULT_API_URL: &str = "https://api.example.com/translate";

    /// 默认源语言（auto 表示由服务端检测）
    pub const DEFAULT_SOURCE_LANG: &str = "auto";

    /// 默认目标语言
    pub const DEFAULT_TARGET_LANG: &str = "zh";

    /// 翻译请求的整体超时（秒）
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    /// 建立连接的超时（秒）
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    /// 配置文件搜索路径，按顺序取第一个存在的
    pub const CONFIG_PATHS: [&str; 2] = ["live-translator.toml", "config/live-translator.toml"];

    /// 环境变量前缀
    pub const ENV_PREFIX: &str = "LIVE_TRANSLATOR_";
}
