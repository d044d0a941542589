//! 运行控制器 - 编排层顶层
//!
//! ## 职责
//!
//! 1. 验证登录用户（失败即终止，不重试）
//! 2. 今日任务未完成时处理每日批次
//! 3. 用每日批次 id 处理额外评定队列
//! 4. 在顶层统一捕获错误，记录一次并转换为 `false`
//!
//! 一次运行只创建一个 `SigningContext`，每日评分、额外评分和听歌上报共用。

use tracing::{error, info};

use crate::clients::PartnerApi;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::SigningContext;
use crate::orchestrator::daily_processor::{DailySummary, DailyTaskProcessor};
use crate::orchestrator::extra_processor::{ExtraSummary, ExtraTaskProcessor};
use crate::services::{PacingController, RateLimitRule, RatingSubmitter};
use crate::utils::logging::log_section;

/// 一次运行的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// 登录用户昵称
    pub nickname: String,
    /// 运行开始时今日任务是否已完成
    pub daily_complete: bool,
    /// 今日任务已完成时为 `None`
    pub daily: Option<DailySummary>,
    pub extra: ExtraSummary,
}

pub struct BotController<'a> {
    api: &'a dyn PartnerApi,
    pacing: PacingController,
    rate_limit: RateLimitRule,
    signing: Option<SigningContext>,
}

impl<'a> BotController<'a> {
    pub fn new(api: &'a dyn PartnerApi, config: &Config) -> AppResult<Self> {
        Ok(Self {
            api,
            pacing: PacingController::from_config(config),
            rate_limit: RateLimitRule::from_config(config)?,
            signing: None,
        })
    }

    /// 指定签名上下文，不指定时每次运行随机生成
    pub fn with_signing_context(mut self, signing: SigningContext) -> Self {
        self.signing = Some(signing);
        self
    }

    /// 执行一次完整流程，全部成功返回 `true`
    pub async fn run(&self) -> bool {
        match self.run_with_report().await {
            Ok(report) => {
                info!(
                    "用户 {} 本次运行结束：每日新评 {} 首，额外新评 {} 首",
                    report.nickname,
                    report.daily.map(|d| d.submitted).unwrap_or(0),
                    report.extra.succeeded
                );
                true
            }
            Err(e) => {
                error!("执行失败: {}", e);
                false
            }
        }
    }

    /// 执行一次完整流程并返回统计，错误原样返回
    pub async fn run_with_report(&self) -> AppResult<RunReport> {
        let nickname = self.verify_user().await?;

        let signing = match &self.signing {
            Some(signing) => signing.clone(),
            None => SigningContext::generate(self.api.csrf_token())?,
        };
        let submitter = RatingSubmitter::new(self.api, signing, self.pacing, self.rate_limit.clone());

        log_section("📋 每日评定任务");
        let daily_processor = DailyTaskProcessor::new(self.api, &submitter);
        let (daily_complete, batch) = daily_processor.fetch().await?;
        let daily = if daily_complete {
            None
        } else {
            Some(daily_processor.process(&batch).await?)
        };

        log_section("🎁 额外评定任务");
        let extra = ExtraTaskProcessor::new(self.api, &submitter)
            .process(&batch.id)
            .await?;

        Ok(RunReport {
            nickname,
            daily_complete,
            daily,
            extra,
        })
    }

    /// 验证用户信息，返回昵称
    async fn verify_user(&self) -> AppResult<String> {
        info!("开始验证用户信息...");
        let response = self
            .api
            .fetch_profile()
            .await
            .map_err(|e| AppError::Verification(format!("获取用户信息失败: {}", e)))?;

        if !response.is_valid() {
            let reason = response.msg.unwrap_or_else(|| format!("code={}", response.code));
            return Err(AppError::Verification(format!("用户信息无效: {}", reason)));
        }

        let profile = response.profile.unwrap_or_default();
        match profile.user_id {
            Some(user_id) => info!("用户名: {} (id: {})", profile.nickname, user_id),
            None => info!("用户名: {}", profile.nickname),
        }
        Ok(profile.nickname)
    }
}
