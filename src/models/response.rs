//! 服务端响应结构

use serde::Deserialize;

use super::work::{DailyBatch, RatingTask};

/// 业务成功码
pub const CODE_OK: i64 = 200;

/// 用户信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl UserProfile {
    /// 至少带昵称或用户 id
    pub fn is_present(&self) -> bool {
        !self.nickname.is_empty() || self.user_id.is_some()
    }
}

/// `GET /api/nuser/account/get`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl ProfileResponse {
    /// `code == 200` 且 profile 非空（`{}` 不算）
    pub fn is_valid(&self) -> bool {
        self.code == CODE_OK && self.profile.as_ref().is_some_and(UserProfile::is_present)
    }
}

/// `GET /api/music/partner/daily/task/get`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyTaskResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub data: Option<DailyBatch>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /api/music/partner/extra/wait/evaluate/work/list`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtraListResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub data: Option<Vec<RatingTask>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// 写操作（上报、评分）的通用响应
///
/// 评分接口用 `msg`，上报接口用 `message`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiReply {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiReply {
    pub fn ok() -> Self {
        Self {
            code: CODE_OK,
            ..Default::default()
        }
    }

    pub fn error(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: Some(msg.into()),
            message: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == CODE_OK
    }

    /// 服务端返回的错误文本，两个字段都缺失时为"未知错误"
    pub fn message(&self) -> &str {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("未知错误")
    }
}
