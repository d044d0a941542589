//! 评分提交 - 业务能力层
//!
//! 只负责"给一首作品打分"这一个动作：等待 → 组装载荷 → 加密 → 提交，
//! 遇到频率限制时在上限内重试

use regex::Regex;
use tracing::{error, info, warn};

use crate::clients::PartnerApi;
use crate::config::Config;
use crate::error::{AppResult, ConfigError, SubmissionError};
use crate::infrastructure::{Payload, SigningContext};
use crate::models::WorkItem;
use crate::services::pacing::PacingController;
use crate::services::scoring::{Rating, ScoringPolicy};

/// 提交类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    /// 每日必做任务
    Daily,
    /// 额外评定任务，载荷需带 `extraResource`
    Extra,
}

impl SubmissionKind {
    fn apply(self, payload: &mut Payload) {
        match self {
            SubmissionKind::Daily => {}
            SubmissionKind::Extra => {
                payload.insert("extraResource", "true".to_string());
            }
        }
    }

    fn label(self) -> &'static str {
        match self {
            SubmissionKind::Daily => "每日",
            SubmissionKind::Extra => "额外",
        }
    }
}

/// 频率限制识别与重试上限
#[derive(Debug, Clone)]
pub struct RateLimitRule {
    pattern: Regex,
    max_retries: u32,
}

impl RateLimitRule {
    pub fn new(pattern: &str, max_retries: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            max_retries,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.rate_limit_pattern, config.max_rate_limit_retries)
    }

    /// 服务端消息是否表示"操作过于频繁"
    pub fn matches(&self, message: &str) -> bool {
        self.pattern.is_match(message)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// 评分提交器
///
/// 独占本次运行的 `SigningContext`，所有评分与上报都用同一个随机密钥签名
pub struct RatingSubmitter<'a> {
    api: &'a dyn PartnerApi,
    signing: SigningContext,
    pacing: PacingController,
    policy: ScoringPolicy,
    rate_limit: RateLimitRule,
}

impl<'a> RatingSubmitter<'a> {
    pub fn new(
        api: &'a dyn PartnerApi,
        signing: SigningContext,
        pacing: PacingController,
        rate_limit: RateLimitRule,
    ) -> Self {
        Self {
            api,
            signing,
            pacing,
            policy: ScoringPolicy::new(),
            rate_limit,
        }
    }

    pub fn signing(&self) -> &SigningContext {
        &self.signing
    }

    pub fn pacing(&self) -> &PacingController {
        &self.pacing
    }

    /// 组装评分载荷（不含 csrf_token，由 `SigningContext::seal` 写入）
    pub fn build_payload(&self, work: &WorkItem, batch_id: &str, kind: SubmissionKind, rating: &Rating) -> Payload {
        let mut payload = Payload::new();
        payload.insert("taskId", batch_id.to_string());
        payload.insert("workId", work.id.clone());
        payload.insert("score", rating.score.to_string());
        payload.insert("tags", rating.tag.clone());
        payload.insert("customTags", "%5B%5D".to_string());
        payload.insert("comment", String::new());
        payload.insert("syncYunCircle", "true".to_string());
        kind.apply(&mut payload);
        payload
    }

    /// 为一首作品评分
    ///
    /// 每次提交前都会等待一次随机时长（包括第一次）；频率限制时用同一请求体重试，
    /// 超过 `max_retries` 次后返回 `RateLimitExceeded`
    pub async fn submit(&self, work: &WorkItem, batch_id: &str, kind: SubmissionKind) -> AppResult<Rating> {
        let rating = self.policy.score_for(work);
        let envelope = self
            .signing
            .seal(self.build_payload(work, batch_id, kind, &rating))?;

        let mut retries = 0u32;
        loop {
            self.pacing.pause().await;

            let reply = self
                .api
                .evaluate_work(&envelope)
                .await
                .map_err(|source| SubmissionError::Transport {
                    work: work.to_string(),
                    source,
                })?;

            if reply.is_success() {
                info!("{} {}评分完成：{}分", work, kind.label(), rating.score);
                return Ok(rating);
            }

            let message = reply.message();
            if !self.rate_limit.matches(message) {
                error!("歌曲 {} 评分失败：{}", work, message);
                return Err(SubmissionError::Rejected {
                    work: work.to_string(),
                    message: message.to_string(),
                }
                .into());
            }

            if retries >= self.rate_limit.max_retries {
                error!("歌曲 {} 持续触发频率限制，已重试 {} 次", work, retries);
                return Err(SubmissionError::RateLimitExceeded {
                    work: work.to_string(),
                    attempts: retries + 1,
                }
                .into());
            }

            retries += 1;
            warn!(
                "遇到频率限制（{}），重试 {}/{}",
                message,
                retries,
                self.rate_limit.max_retries
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, AppError};
    use crate::models::ApiReply;
    use crate::testing::{FakePartnerApi, RecordedCall, TEST_CSRF, TEST_SEED};

    const RATE_LIMITED: &str = "操作过于频繁,请稍后再试";

    fn work(id: &str, name: &str) -> WorkItem {
        WorkItem {
            id: id.to_string(),
            resource_id: format!("r{}", id),
            name: name.to_string(),
            author_name: "作者".to_string(),
        }
    }

    fn submitter(api: &FakePartnerApi, max_retries: u32) -> RatingSubmitter<'_> {
        RatingSubmitter::new(
            api,
            SigningContext::with_seed(TEST_SEED, TEST_CSRF).unwrap(),
            PacingController::immediate(),
            RateLimitRule::new("频繁", max_retries).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_daily_payload() {
        let api = FakePartnerApi::new();
        let rating = submitter(&api, 3)
            .submit(&work("101", "Song"), "task-9", SubmissionKind::Daily)
            .await
            .unwrap();
        assert_eq!(rating.tag, "4-A-1");

        let calls = api.evaluations();
        assert_eq!(calls.len(), 1);
        let p = &calls[0];
        assert_eq!(p["taskId"], "task-9");
        assert_eq!(p["workId"], "101");
        assert_eq!(p["score"], "4");
        assert_eq!(p["tags"], "4-A-1");
        assert_eq!(p["customTags"], "%5B%5D");
        assert_eq!(p["comment"], "");
        assert_eq!(p["syncYunCircle"], "true");
        assert_eq!(p["csrf_token"], TEST_CSRF);
        assert!(p.get("extraResource").is_none());
    }

    #[tokio::test]
    async fn test_extra_payload_has_marker() {
        let api = FakePartnerApi::new();
        submitter(&api, 3)
            .submit(&work("7", "晴天"), "task-9", SubmissionKind::Extra)
            .await
            .unwrap();

        let calls = api.evaluations();
        assert_eq!(calls[0]["extraResource"], "true");
        assert_eq!(calls[0]["score"], "3");
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let api = FakePartnerApi::new();
        api.script_evaluation("5", vec![ApiReply::error(405, RATE_LIMITED), ApiReply::ok()]);

        submitter(&api, 3)
            .submit(&work("5", "x"), "t", SubmissionKind::Daily)
            .await
            .unwrap();

        let calls = api.evaluations();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
    }

    #[tokio::test]
    async fn test_rate_limit_bounded() {
        let api = FakePartnerApi::new();
        api.script_evaluation("5", vec![ApiReply::error(405, RATE_LIMITED); 10]);

        let err = submitter(&api, 2)
            .submit(&work("5", "x"), "t", SubmissionKind::Daily)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Submission(SubmissionError::RateLimitExceeded { attempts: 3, .. })
        ));
        assert_eq!(api.evaluations().len(), 3);
    }

    #[tokio::test]
    async fn test_other_error_is_rejected_without_retry() {
        let api = FakePartnerApi::new();
        api.script_evaluation("5", vec![ApiReply::error(500, "作品不存在"), ApiReply::ok()]);

        let err = submitter(&api, 3)
            .submit(&work("5", "x"), "t", SubmissionKind::Daily)
            .await
            .unwrap_err();

        match err {
            AppError::Submission(SubmissionError::Rejected { message, .. }) => {
                assert_eq!(message, "作品不存在")
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(api.evaluations().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let api = FakePartnerApi::new();
        api.fail_evaluation_transport("5");

        let err = submitter(&api, 3)
            .submit(&work("5", "x"), "t", SubmissionKind::Daily)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Submission(SubmissionError::Transport {
                source: ApiError::RequestFailed { .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_same_seed_signs_every_call() {
        let api = FakePartnerApi::new();
        let submitter = submitter(&api, 0);
        submitter.submit(&work("1", "a"), "t", SubmissionKind::Daily).await.unwrap();
        submitter.submit(&work("2", "b"), "t", SubmissionKind::Daily).await.unwrap();

        let keys = api.enc_sec_keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], keys[1]);
        assert!(matches!(api.calls()[0], RecordedCall::Evaluate(_)));
    }
}
