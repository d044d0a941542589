//! HTTP 会话 - 基础设施层
//!
//! 持有唯一的 reqwest Client（含 Cookie 罐），只暴露"发请求、解 JSON"的能力

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::REFERER;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, ConfigError};
use crate::utils::logging::truncate_text;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// HTTP 会话
///
/// 职责：
/// - 持有 Cookie（`MUSIC_U`、`__csrf`），注入后只读
/// - 每个请求都有超时
/// - 不认识任何业务接口
pub struct HttpSession {
    client: reqwest::Client,
}

impl HttpSession {
    /// 按配置创建会话，并为两个服务域名写入登录 Cookie
    pub fn new(config: &Config) -> AppResult<Self> {
        let jar = Jar::default();
        for (field, base) in [
            ("music_base_url", &config.music_base_url),
            ("interface_base_url", &config.interface_base_url),
        ] {
            let url = base.parse::<Url>().map_err(|e| {
                AppError::Config(ConfigError::Invalid {
                    field,
                    reason: format!("{} ({})", base, e),
                })
            })?;
            jar.add_cookie_str(&format!("MUSIC_U={}; Path=/", config.music_u), &url);
            jar.add_cookie_str(&format!("__csrf={}; Path=/", config.csrf), &url);
        }

        let client = reqwest::Client::builder()
            .cookie_provider(Arc::new(jar))
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::api_request_failed("http-client", e))?;

        Ok(Self { client })
    }

    /// GET 并解析 JSON
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, referer: Option<&str>) -> Result<T, ApiError> {
        let request = with_referer(self.client.get(url), referer);
        self.send_json(url, request).await
    }

    /// 以 urlencoded 表单 POST 并解析 JSON
    pub async fn post_form<T, F>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        form: &F,
        referer: Option<&str>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized,
    {
        let request = with_referer(self.client.post(url).query(query).form(form), referer);
        self.send_json(url, request).await
    }

    async fn send_json<T: DeserializeOwned>(&self, url: &str, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ApiError::request_failed(url, e))?;

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::request_failed(url, e))?;

        debug!("响应 {}: {}", url, truncate_text(&body, 300));

        serde_json::from_str(&body).map_err(|e| ApiError::json_parse_failed(url, e))
    }
}

fn with_referer(request: RequestBuilder, referer: Option<&str>) -> RequestBuilder {
    match referer {
        Some(referer) => request.header(REFERER, referer),
        None => request,
    }
}
