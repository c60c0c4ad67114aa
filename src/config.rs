use serde::Serialize;

pub const DEFAULT_PORT: u16 = 3080;
pub const DEFAULT_BIND: &str = "localhost";
pub const DEFAULT_ENV: &str = "test";
pub const DEFAULT_TIMEOUT_MS: u64 = 305 * 1000;

/// 全ソースをマージした後の設定。`Option` 以外のフィールドは必ず値を持つ
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub port: u16,
    pub bind: String,
    pub env: String,
    pub debug_namespace: Vec<String>,
    pub key_path: Option<String>,
    pub crt_path: Option<String>,
    pub log_file: Option<String>,
    #[serde(rename = "disableSSL")]
    pub disable_ssl: bool,
    pub disable_proxy: bool,
    pub disable_env_check: bool,
    pub timeout_ms: u64,
    pub custom_root_uri: Option<String>,
    pub custom_network: Option<String>,
}

/// 単一ソース (引数・環境変数・既定値) から得られた設定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialConfig {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub env: Option<String>,
    pub debug_namespace: Option<Vec<String>>,
    pub key_path: Option<String>,
    pub crt_path: Option<String>,
    pub log_file: Option<String>,
    pub disable_ssl: Option<bool>,
    pub disable_proxy: Option<bool>,
    pub disable_env_check: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub custom_root_uri: Option<String>,
    pub custom_network: Option<String>,
}

impl PartialConfig {
    pub fn defaults() -> Self {
        PartialConfig {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND.to_string()),
            env: Some(DEFAULT_ENV.to_string()),
            debug_namespace: Some(Vec::new()),
            log_file: Some(String::new()),
            disable_ssl: Some(false),
            disable_proxy: Some(false),
            disable_env_check: Some(false),
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            ..Default::default()
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 未設定・空文字・パース不能な値は `None` として扱う
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        // 空でなければ "false" や "0" も真とみなす
        let flag = |key: &str| var(key).map(|_| true);

        PartialConfig {
            port: var("RECOVERY_PORT").and_then(|v| v.parse().ok()),
            bind: var("RECOVERY_BIND"),
            env: var("RECOVERY_ENV"),
            debug_namespace: var("RECOVERY_DEBUG_NAMESPACE").map(|v| split_namespaces(&v)),
            key_path: var("RECOVERY_KEYPATH"),
            crt_path: var("RECOVERY_CRTPATH"),
            log_file: var("RECOVERY_LOGFILE"),
            disable_ssl: flag("DISABLE_SSL"),
            disable_proxy: flag("DISABLE_PROXY"),
            disable_env_check: flag("DISABLE_ENV_CHECK"),
            timeout_ms: var("RECOVERY_TIMEOUT").and_then(|v| v.parse().ok()),
            custom_root_uri: var("RECOVERY_CUSTOM_ROOT_URI"),
            custom_network: var("RECOVERY_CUSTOM_BITCOIN_NETWORK"),
        }
    }
}

pub fn split_namespaces(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn first<T: Clone>(
    sources: &[PartialConfig],
    field: impl Fn(&PartialConfig) -> Option<&T>,
) -> Option<T> {
    sources.iter().find_map(field).cloned()
}

/// フィールドごとに、優先度の高いソースから最初に見つかった値を採用する
pub fn merge(sources: &[PartialConfig]) -> PartialConfig {
    PartialConfig {
        port: first(sources, |c| c.port.as_ref()),
        bind: first(sources, |c| c.bind.as_ref()),
        env: first(sources, |c| c.env.as_ref()),
        debug_namespace: first(sources, |c| c.debug_namespace.as_ref()),
        key_path: first(sources, |c| c.key_path.as_ref()),
        crt_path: first(sources, |c| c.crt_path.as_ref()),
        log_file: first(sources, |c| c.log_file.as_ref()),
        disable_ssl: first(sources, |c| c.disable_ssl.as_ref()),
        disable_proxy: first(sources, |c| c.disable_proxy.as_ref()),
        disable_env_check: first(sources, |c| c.disable_env_check.as_ref()),
        timeout_ms: first(sources, |c| c.timeout_ms.as_ref()),
        custom_root_uri: first(sources, |c| c.custom_root_uri.as_ref()),
        custom_network: first(sources, |c| c.custom_network.as_ref()),
    }
}

/// `sources` は優先度の高い順。既定値は常に最後のソースとして補われる
pub fn resolve(sources: &[PartialConfig]) -> Config {
    let mut all = sources.to_vec();
    all.push(PartialConfig::defaults());
    let merged = merge(&all);

    Config {
        port: merged.port.unwrap_or(DEFAULT_PORT),
        bind: merged.bind.unwrap_or_else(|| DEFAULT_BIND.to_string()),
        env: merged.env.unwrap_or_else(|| DEFAULT_ENV.to_string()),
        debug_namespace: merged.debug_namespace.unwrap_or_default(),
        key_path: merged.key_path,
        crt_path: merged.crt_path,
        log_file: merged.log_file,
        disable_ssl: merged.disable_ssl.unwrap_or(false),
        disable_proxy: merged.disable_proxy.unwrap_or(false),
        disable_env_check: merged.disable_env_check.unwrap_or(false),
        timeout_ms: merged.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        custom_root_uri: merged.custom_root_uri,
        custom_network: merged.custom_network,
    }
}
