//! Cookie 校验
//!
//! 正式运行前用只读接口探测登录态和合伙人权限，避免带着失效 Cookie 去提交

use std::fmt;

use tracing::{info, warn};

use crate::clients::PartnerApi;
use crate::config::Config;
use crate::models::CODE_OK;

/// 未登录时每日任务接口返回的业务码
const CODE_NOT_LOGGED_IN: i64 = 301;

/// 校验结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieStatus {
    Valid,
    /// `MUSIC_U` 或 `__csrf` 为空
    Missing,
    /// 登录态失效
    Expired,
    /// 已登录但没有音乐合伙人权限
    NoPartnerAccess,
    /// 探测请求本身失败
    ProbeFailed(String),
}

impl CookieStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, CookieStatus::Valid)
    }

    pub fn description(&self) -> String {
        match self {
            CookieStatus::Valid => "Cookie有效".to_string(),
            CookieStatus::Missing => "Cookie未正确设置".to_string(),
            CookieStatus::Expired => "Cookie已失效或账号信息不完整".to_string(),
            CookieStatus::NoPartnerAccess => "当前账号可能没有音乐合伙人权限".to_string(),
            CookieStatus::ProbeFailed(reason) => format!("Cookie验证失败: {}", reason),
        }
    }
}

impl fmt::Display for CookieStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

pub struct CookieValidator<'a> {
    api: &'a dyn PartnerApi,
    music_u: &'a str,
    csrf: &'a str,
}

impl<'a> CookieValidator<'a> {
    pub fn new(api: &'a dyn PartnerApi, config: &'a Config) -> Self {
        Self {
            api,
            music_u: &config.music_u,
            csrf: &config.csrf,
        }
    }

    /// 依次检查：Cookie 存在 → 用户信息 → 每日任务访问权限
    pub async fn validate(&self) -> CookieStatus {
        let status = self.probe().await;
        if status.is_valid() {
            info!("✅ {}", status);
        } else {
            warn!("❌ {}", status);
        }
        status
    }

    async fn probe(&self) -> CookieStatus {
        if self.music_u.trim().is_empty() || self.csrf.trim().is_empty() {
            return CookieStatus::Missing;
        }

        let profile = match self.api.fetch_profile().await {
            Ok(profile) => profile,
            Err(e) => return CookieStatus::ProbeFailed(e.to_string()),
        };
        if !profile.is_valid() {
            return CookieStatus::Expired;
        }

        let daily = match self.api.fetch_daily_task().await {
            Ok(daily) => daily,
            Err(e) => return CookieStatus::ProbeFailed(e.to_string()),
        };
        match daily.code {
            CODE_OK => CookieStatus::Valid,
            CODE_NOT_LOGGED_IN => CookieStatus::Expired,
            _ => CookieStatus::NoPartnerAccess,
        }
    }
}
