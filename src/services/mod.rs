//! 业务能力层：只描述"对一首作品能做什么"

pub mod pacing;
pub mod rating_submitter;
pub mod scoring;

pub use pacing::PacingController;
pub use rating_submitter::{RateLimitRule, RatingSubmitter, SubmissionKind};
pub use scoring::{Rating, Score, ScoringPolicy};
