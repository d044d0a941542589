//! 每日任务处理器 - 编排层
//!
//! 拉取当日任务批次，按服务端顺序为未评分的作品逐个提交评分。
//! 任何一首失败都会中止整个批次（不做隔离）。

use tracing::info;

use crate::clients::PartnerApi;
use crate::error::{ApiError, AppError, AppResult};
use crate::models::{DailyBatch, CODE_OK};
use crate::services::{RatingSubmitter, SubmissionKind};

const ENDPOINT: &str = "daily/task/get";

/// 每日任务统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DailySummary {
    /// 本次提交的评分数
    pub submitted: usize,
    /// 此前已有评分、被跳过的数量
    pub already_rated: usize,
}

pub struct DailyTaskProcessor<'a> {
    api: &'a dyn PartnerApi,
    submitter: &'a RatingSubmitter<'a>,
}

impl<'a> DailyTaskProcessor<'a> {
    pub fn new(api: &'a dyn PartnerApi, submitter: &'a RatingSubmitter<'a>) -> Self {
        Self { api, submitter }
    }

    /// 拉取今日任务，返回 (是否全部完成, 批次)
    ///
    /// 本次运行只拉取一次，以此为准
    pub async fn fetch(&self) -> AppResult<(bool, DailyBatch)> {
        let response = self.api.fetch_daily_task().await?;

        let batch = match response.data {
            Some(batch) => batch,
            None if response.code != CODE_OK => {
                return Err(AppError::api_bad_response(
                    ENDPOINT,
                    response.code,
                    response.message.unwrap_or_else(|| "未知错误".to_string()),
                ));
            }
            None => {
                return Err(ApiError::MissingData {
                    endpoint: ENDPOINT.to_string(),
                }
                .into());
            }
        };

        let complete = batch.is_complete();
        info!(
            "今日任务：{}[{}/{}]",
            if complete { "已完成" } else { "未完成" },
            batch.completed_count,
            batch.count
        );
        Ok((complete, batch))
    }

    /// 按顺序处理批次，第一处失败即返回错误
    pub async fn process(&self, batch: &DailyBatch) -> AppResult<DailySummary> {
        info!("开始评分，待评 {} 首...", batch.pending().count());
        let mut summary = DailySummary::default();

        for task in &batch.works {
            if task.completed {
                match task.score {
                    Some(score) => info!("{} 已有评分：{}分", task.work, score),
                    None => info!("{} 已评分", task.work),
                }
                summary.already_rated += 1;
                continue;
            }

            self.submitter
                .submit(&task.work, &batch.id, SubmissionKind::Daily)
                .await?;
            summary.submitted += 1;
        }

        info!(
            "每日评分完成：新评 {} 首，已有评分 {} 首",
            summary.submitted, summary.already_rated
        );
        Ok(summary)
    }
}
