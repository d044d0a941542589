//! 额外任务处理器 - 编排层
//!
//! ## 职责
//!
//! 1. 拉取额外评定队列，计算今日剩余配额（每日上限 7 个）
//! 2. 对每首作品先上报听歌记录，再提交带 `extraResource` 标记的评分
//! 3. 单首失败只记警告并跳过，不计入成功数，也不中止队列
//! 4. 成功数达到剩余配额即停止

use tracing::{error, info, warn};

use crate::clients::PartnerApi;
use crate::error::{ApiError, AppError, AppResult};
use crate::infrastructure::Payload;
use crate::models::{ExtraQueue, WorkItem, CODE_OK};
use crate::services::{Rating, RatingSubmitter, SubmissionKind};

/// 平台对额外评定的每日上限
pub const EXTRA_DAILY_QUOTA: usize = 7;

const LIST_ENDPOINT: &str = "extra/wait/evaluate/work/list";
const REPORT_ENDPOINT: &str = "resource/interact/report";

/// 额外任务统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtraSummary {
    /// 运行前已完成数
    pub completed_before: usize,
    /// 本次可完成的配额 `max(0, 7 - completed_before)`
    pub remaining: usize,
    /// 实际尝试处理的作品数
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl ExtraSummary {
    pub fn total_completed(&self) -> usize {
        self.completed_before + self.succeeded
    }
}

pub struct ExtraTaskProcessor<'a> {
    api: &'a dyn PartnerApi,
    submitter: &'a RatingSubmitter<'a>,
}

impl<'a> ExtraTaskProcessor<'a> {
    pub fn new(api: &'a dyn PartnerApi, submitter: &'a RatingSubmitter<'a>) -> Self {
        Self { api, submitter }
    }

    /// 拉取额外评定队列
    pub async fn fetch_queue(&self) -> AppResult<ExtraQueue> {
        let response = self.api.fetch_extra_list().await.map_err(|e| {
            error!("获取额外任务列表失败: {}", e);
            e
        })?;

        if response.code != CODE_OK {
            return Err(AppError::api_bad_response(
                LIST_ENDPOINT,
                response.code,
                response.message.unwrap_or_else(|| "未知错误".to_string()),
            ));
        }

        let tasks = response.data.ok_or_else(|| ApiError::MissingData {
            endpoint: LIST_ENDPOINT.to_string(),
        })?;
        Ok(ExtraQueue::from_tasks(tasks))
    }

    /// 处理额外评定任务
    ///
    /// # 参数
    /// - `batch_id`: 当日每日任务批次 id，评分载荷的 `taskId`
    pub async fn process(&self, batch_id: &str) -> AppResult<ExtraSummary> {
        let queue = self.fetch_queue().await?;

        let mut summary = ExtraSummary {
            completed_before: queue.completed_count,
            remaining: EXTRA_DAILY_QUOTA.saturating_sub(queue.completed_count),
            ..Default::default()
        };

        if queue.completed_count >= EXTRA_DAILY_QUOTA {
            info!(
                "今日已完成 {} 个额外评分任务，已达到每日上限",
                queue.completed_count
            );
            return Ok(summary);
        }

        if queue.pending.is_empty() {
            info!("额外评定完成数: {}", queue.completed_count);
            return Ok(summary);
        }

        info!("发现 {} 个待额外评定任务", queue.pending.len());

        let remaining = summary.remaining;
        let total = queue.pending.len();
        for (index, work) in queue.pending.iter().enumerate() {
            if summary.succeeded >= remaining {
                info!(
                    "已完成 {} 个额外评分任务，总计完成 {} 个",
                    summary.succeeded,
                    summary.total_completed()
                );
                break;
            }

            summary.attempted += 1;
            match self.process_one(work, batch_id).await {
                Ok(_) => {
                    summary.succeeded += 1;
                    info!(
                        "成功完成第 {}/{} 个额外评分任务",
                        summary.succeeded, remaining
                    );

                    // 最后一首之后不再等待
                    if summary.succeeded < remaining && index + 1 < total {
                        self.submitter.pacing().pause().await;
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!("处理歌曲 {} 失败，尝试下一个: {}", work.name, e);
                }
            }
        }

        info!(
            "额外评分任务处理完成，成功评分 {} 首，今日累计完成 {} 个",
            summary.succeeded,
            summary.total_completed()
        );

        if summary.succeeded < remaining {
            warn!(
                "未能完成所有额外评分任务，仅完成 {}/{} 个",
                summary.succeeded, remaining
            );
        }

        Ok(summary)
    }

    /// 单首作品：上报听歌 → 评分
    async fn process_one(&self, work: &WorkItem, batch_id: &str) -> AppResult<Rating> {
        self.report_listen(work).await?;
        self.submitter
            .submit(work, batch_id, SubmissionKind::Extra)
            .await
    }

    /// 上报听歌记录，与评分共用同一个签名上下文
    pub async fn report_listen(&self, work: &WorkItem) -> AppResult<()> {
        let mut payload = Payload::new();
        payload.insert("workId", work.id.clone());
        payload.insert("resourceId", work.resource_id.clone());
        payload.insert("bizResourceId", String::new());
        payload.insert("interactType", "PLAY_END".to_string());

        let envelope = self.submitter.signing().seal(payload)?;
        let reply = self.api.report_listen(&envelope).await?;

        if !reply.is_success() {
            error!("上报听歌记录失败: {}", reply.message());
            return Err(AppError::api_bad_response(
                REPORT_ENDPOINT,
                reply.code,
                reply.message(),
            ));
        }

        info!("歌曲 {} 听歌记录上报成功", work.name);
        Ok(())
    }
}
