//! 程序配置
//!
//! 优先从环境变量加载（`MUSIC_U` 与 `CSRF` 同时存在时），否则回退到本地配置文件。

use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config/setting.json";

/// 单次随机等待的上限（秒）
pub const MAX_WAIT_SECS: f64 = 3600.0;

/// 程序配置
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 登录 Cookie `MUSIC_U`
    #[serde(rename = "Cookie_MUSIC_U")]
    pub music_u: String,
    /// 登录 Cookie `__csrf`，同时作为 csrf_token
    #[serde(rename = "Cookie___csrf")]
    pub csrf: String,
    /// 随机等待下限（秒）
    pub wait_time_min: f64,
    /// 随机等待上限（秒）
    pub wait_time_max: f64,
    /// 识别频率限制的正则（匹配服务端返回的消息）
    pub rate_limit_pattern: String,
    /// 频率限制最大重试次数
    pub max_rate_limit_retries: u32,
    /// 单次 HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    pub music_base_url: String,
    pub interface_base_url: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            music_u: String::new(),
            csrf: String::new(),
            wait_time_min: 15.0,
            wait_time_max: 20.0,
            rate_limit_pattern: "频繁".to_string(),
            max_rate_limit_retries: 5,
            request_timeout_secs: 30,
            music_base_url: "https://music.163.com".to_string(),
            interface_base_url: "https://interface.music.163.com".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 按优先级加载配置：环境变量 > 配置文件
    pub fn load() -> Result<Self, ConfigError> {
        if has_required_env(&|name: &str| std::env::var(name).ok()) {
            return Self::from_env();
        }

        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(Path::new(&path))
    }

    /// 从环境变量读取
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源读取（环境变量或测试用的映射）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let config = Self {
            music_u: lookup("MUSIC_U").unwrap_or_default(),
            csrf: lookup("CSRF").unwrap_or_default(),
            wait_time_min: parse_var(&lookup, "WAIT_TIME_MIN", "f64")?.unwrap_or(default.wait_time_min),
            wait_time_max: parse_var(&lookup, "WAIT_TIME_MAX", "f64")?.unwrap_or(default.wait_time_max),
            rate_limit_pattern: lookup("RATE_LIMIT_PATTERN").unwrap_or(default.rate_limit_pattern),
            max_rate_limit_retries: parse_var(&lookup, "MAX_RATE_LIMIT_RETRIES", "u32")?
                .unwrap_or(default.max_rate_limit_retries),
            request_timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(default.request_timeout_secs),
            music_base_url: lookup("MUSIC_BASE_URL").unwrap_or(default.music_base_url),
            interface_base_url: lookup("INTERFACE_BASE_URL").unwrap_or(default.interface_base_url),
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING", "bool")?.unwrap_or(default.verbose_logging),
        };
        config.validate()?;
        Ok(config)
    }

    /// 从配置文件读取，`.toml` 后缀按 TOML 解析，其余按 JSON 解析
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(display));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: display,
            source,
        })?;

        let is_toml = path.extension().and_then(|s| s.to_str()) == Some("toml");
        let config: Config = if is_toml {
            toml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.music_u.trim().is_empty() {
            return Err(ConfigError::MissingField("Cookie_MUSIC_U"));
        }
        if self.csrf.trim().is_empty() {
            return Err(ConfigError::MissingField("Cookie___csrf"));
        }
        if !(self.wait_time_min >= 0.0 && self.wait_time_min <= MAX_WAIT_SECS) {
            return Err(ConfigError::Invalid {
                field: "wait_time_min",
                reason: format!("必须在 0~{} 秒之间，实际为 {}", MAX_WAIT_SECS, self.wait_time_min),
            });
        }
        if !(self.wait_time_max <= MAX_WAIT_SECS) {
            return Err(ConfigError::Invalid {
                field: "wait_time_max",
                reason: format!("不能超过 {} 秒，实际为 {}", MAX_WAIT_SECS, self.wait_time_max),
            });
        }
        if !(self.wait_time_max >= self.wait_time_min) {
            return Err(ConfigError::Invalid {
                field: "wait_time_max",
                reason: format!(
                    "不能小于 wait_time_min ({} < {})",
                    self.wait_time_max, self.wait_time_min
                ),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: "必须大于 0".to_string(),
            });
        }
        Regex::new(&self.rate_limit_pattern)?;
        Ok(())
    }
}

fn has_required_env<F>(lookup: &F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    ["MUSIC_U", "CSRF"]
        .iter()
        .all(|name| lookup(name).is_some_and(|v| !v.is_empty()))
}

fn parse_var<F, T>(lookup: &F, var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
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
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_defaults() {
        let config = Config::from_lookup(lookup_from(&[("MUSIC_U", "abc"), ("CSRF", "tok")])).unwrap();
        assert_eq!(config.music_u, "abc");
        assert_eq!(config.csrf, "tok");
        assert_eq!(config.wait_time_min, 15.0);
        assert_eq!(config.wait_time_max, 20.0);
        assert_eq!(config.rate_limit_pattern, "频繁");
        assert_eq!(config.max_rate_limit_retries, 5);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("MUSIC_U", "abc"),
            ("CSRF", "tok"),
            ("WAIT_TIME_MIN", "1.5"),
            ("WAIT_TIME_MAX", "2"),
            ("MAX_RATE_LIMIT_RETRIES", "9"),
            ("VERBOSE_LOGGING", "true"),
        ]))
        .unwrap();
        assert_eq!(config.wait_time_min, 1.5);
        assert_eq!(config.wait_time_max, 2.0);
        assert_eq!(config.max_rate_limit_retries, 9);
        assert!(config.verbose_logging);
    }

    #[test]
    fn test_env_unparsable_value_is_error() {
        let err = Config::from_lookup(lookup_from(&[
            ("MUSIC_U", "abc"),
            ("CSRF", "tok"),
            ("WAIT_TIME_MIN", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParseFailed { ref var_name, .. } if var_name == "WAIT_TIME_MIN"));
    }

    #[test]
    fn test_missing_cookie() {
        let err = Config::from_lookup(lookup_from(&[("MUSIC_U", "abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("Cookie___csrf")));
    }

    #[test]
    fn test_inverted_wait_interval() {
        let err = Config::from_lookup(lookup_from(&[
            ("MUSIC_U", "abc"),
            ("CSRF", "tok"),
            ("WAIT_TIME_MIN", "30"),
            ("WAIT_TIME_MAX", "20"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "wait_time_max", .. }));
    }

    #[test]
    fn test_unbounded_wait_time_rejected() {
        for (min, max) in [("0", "inf"), ("1e20", "1e20"), ("NaN", "20"), ("0", "3601")] {
            let err = Config::from_lookup(lookup_from(&[
                ("MUSIC_U", "abc"),
                ("CSRF", "tok"),
                ("WAIT_TIME_MIN", min),
                ("WAIT_TIME_MAX", max),
            ]))
            .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { field: "wait_time_min" | "wait_time_max", .. }),
                "{}~{} 应被拒绝",
                min,
                max
            );
        }

        let config = Config::from_lookup(lookup_from(&[
            ("MUSIC_U", "abc"),
            ("CSRF", "tok"),
            ("WAIT_TIME_MIN", "0"),
            ("WAIT_TIME_MAX", "3600"),
        ]))
        .unwrap();
        assert_eq!(config.wait_time_max, MAX_WAIT_SECS);
    }

    #[test]
    fn test_bad_pattern() {
        let err = Config::from_lookup(lookup_from(&[
            ("MUSIC_U", "abc"),
            ("CSRF", "tok"),
            ("RATE_LIMIT_PATTERN", "(频繁"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern(_)));
    }

    #[test]
    fn test_required_env_detection() {
        assert!(has_required_env(&lookup_from(&[("MUSIC_U", "a"), ("CSRF", "b")])));
        assert!(!has_required_env(&lookup_from(&[("MUSIC_U", "a"), ("CSRF", "")])));
        assert!(!has_required_env(&lookup_from(&[("MUSIC_U", "a")])));
    }

    #[test]
    fn test_json_file() {
        let path = std::env::temp_dir().join(format!("music_partner_bot_cfg_{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"Cookie_MUSIC_U": "u", "Cookie___csrf": "c", "wait_time_min": 1, "wait_time_max": 3}"#,
        )
        .unwrap();
        let config = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.music_u, "u");
        assert_eq!(config.csrf, "c");
        assert_eq!(config.wait_time_min, 1.0);
        assert_eq!(config.wait_time_max, 3.0);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_toml_file() {
        let path = std::env::temp_dir().join(format!("music_partner_bot_cfg_{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "Cookie_MUSIC_U = \"u\"\nCookie___csrf = \"c\"\nrate_limit_pattern = \"频繁|too frequent\"\n",
        )
        .unwrap();
        let config = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.rate_limit_pattern, "频繁|too frequent");
        assert_eq!(config.wait_time_max, 20.0);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(Path::new("definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
