pub mod response;
pub mod work;

pub use response::{ApiReply, DailyTaskResponse, ExtraListResponse, ProfileResponse, UserProfile, CODE_OK};
pub use work::{DailyBatch, ExtraQueue, RatingTask, WorkItem};
