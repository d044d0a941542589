/// 音乐合伙人 API 客户端
///
/// 封装所有接口地址与响应结构，核心组件只依赖 `PartnerApi` trait
use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, AppResult};
use crate::infrastructure::{EncryptedEnvelope, HttpSession};
use crate::models::{ApiReply, DailyTaskResponse, ExtraListResponse, ProfileResponse};

const USER_INFO_PATH: &str = "/api/nuser/account/get";
const DAILY_TASK_PATH: &str = "/api/music/partner/daily/task/get";
const EXTRA_LIST_PATH: &str = "/api/music/partner/extra/wait/evaluate/work/list";
const REPORT_LISTEN_PATH: &str = "/weapi/partner/resource/interact/report";
const EVALUATE_PATH: &str = "/weapi/music/partner/work/evaluate";

/// 额外任务相关接口要求的来源页
const PARTNER_REFERER: &str = "https://mp.music.163.com/";

/// 远程服务能力
///
/// 所有写操作的 `csrf_token` 需同时出现在加密载荷和查询参数中，
/// 载荷部分由调用方的 `SigningContext` 负责，查询参数由实现方负责
#[async_trait]
pub trait PartnerApi: Send + Sync {
    /// 当前会话的 csrf_token（即 `__csrf` Cookie）
    fn csrf_token(&self) -> &str;

    async fn fetch_profile(&self) -> Result<ProfileResponse, ApiError>;

    async fn fetch_daily_task(&self) -> Result<DailyTaskResponse, ApiError>;

    async fn fetch_extra_list(&self) -> Result<ExtraListResponse, ApiError>;

    /// 上报听歌记录（PLAY_END）
    async fn report_listen(&self, envelope: &EncryptedEnvelope) -> Result<ApiReply, ApiError>;

    /// 提交评分
    async fn evaluate_work(&self, envelope: &EncryptedEnvelope) -> Result<ApiReply, ApiError>;
}

/// 基于 `HttpSession` 的实现
pub struct PartnerClient {
    session: HttpSession,
    csrf_token: String,
    music_base_url: String,
    interface_base_url: String,
}

impl PartnerClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            session: HttpSession::new(config)?,
            csrf_token: config.csrf.clone(),
            music_base_url: trim_base(&config.music_base_url),
            interface_base_url: trim_base(&config.interface_base_url),
        })
    }

    fn music_url(&self, path: &str) -> String {
        format!("{}{}", self.music_base_url, path)
    }

    fn interface_url(&self, path: &str) -> String {
        format!("{}{}", self.interface_base_url, path)
    }

    async fn post_envelope(
        &self,
        path: &str,
        envelope: &EncryptedEnvelope,
        referer: Option<&str>,
    ) -> Result<ApiReply, ApiError> {
        let url = self.interface_url(path);
        debug!("POST {} (params 长度: {})", url, envelope.params.len());
        self.session
            .post_form(&url, &[("csrf_token", self.csrf_token.as_str())], envelope, referer)
            .await
    }
}

#[async_trait]
impl PartnerApi for PartnerClient {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    async fn fetch_profile(&self) -> Result<ProfileResponse, ApiError> {
        self.session.get_json(&self.music_url(USER_INFO_PATH), None).await
    }

    async fn fetch_daily_task(&self) -> Result<DailyTaskResponse, ApiError> {
        self.session.get_json(&self.interface_url(DAILY_TASK_PATH), None).await
    }

    async fn fetch_extra_list(&self) -> Result<ExtraListResponse, ApiError> {
        self.session
            .get_json(&self.interface_url(EXTRA_LIST_PATH), Some(PARTNER_REFERER))
            .await
    }

    async fn report_listen(&self, envelope: &EncryptedEnvelope) -> Result<ApiReply, ApiError> {
        self.post_envelope(REPORT_LISTEN_PATH, envelope, Some(PARTNER_REFERER))
            .await
    }

    async fn evaluate_work(&self, envelope: &EncryptedEnvelope) -> Result<ApiReply, ApiError> {
        self.post_envelope(EVALUATE_PATH, envelope, None).await
    }
}

fn trim_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}
