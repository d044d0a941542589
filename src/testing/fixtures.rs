//! 测试数据构造

use crate::models::{
    DailyBatch, DailyTaskResponse, ExtraListResponse, ProfileResponse, RatingTask, UserProfile, WorkItem, CODE_OK,
};

pub fn work(id: &str, name: &str, author_name: &str) -> WorkItem {
    WorkItem {
        id: id.to_string(),
        resource_id: format!("res-{}", id),
        name: name.to_string(),
        author_name: author_name.to_string(),
    }
}

pub fn pending(work: WorkItem) -> RatingTask {
    RatingTask {
        completed: false,
        score: None,
        work,
    }
}

pub fn completed(work: WorkItem, score: i64) -> RatingTask {
    RatingTask {
        completed: true,
        score: Some(score),
        work,
    }
}

pub fn profile(nickname: &str) -> ProfileResponse {
    ProfileResponse {
        code: CODE_OK,
        profile: Some(UserProfile {
            nickname: nickname.to_string(),
            user_id: Some(1),
        }),
        msg: None,
    }
}

pub fn daily_response(id: &str, count: u32, completed_count: u32, works: Vec<RatingTask>) -> DailyTaskResponse {
    DailyTaskResponse {
        code: CODE_OK,
        data: Some(DailyBatch {
            id: id.to_string(),
            count,
            completed_count,
            works,
        }),
        message: None,
    }
}

pub fn extra_response(tasks: Vec<RatingTask>) -> ExtraListResponse {
    ExtraListResponse {
        code: CODE_OK,
        data: Some(tasks),
        message: None,
    }
}

/// `completed_count` 个已完成的额外任务 + 给定的未完成作品
pub fn extra_queue_response(completed_count: usize, pending_works: Vec<WorkItem>) -> ExtraListResponse {
    let done = (0..completed_count).map(|i| completed(work(&format!("done-{}", i), "done", "done"), 4));
    let open = pending_works.into_iter().map(pending);
    extra_response(done.chain(open).collect())
}
