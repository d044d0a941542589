//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批次遍历和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `bot` - 运行控制器
//! - 验证用户
//! - 创建本次运行唯一的签名上下文和评分提交器
//! - 依次调度每日任务与额外任务，在顶层统一处理错误
//!
//! ### `daily_processor` - 每日任务处理器
//! - 拉取每日批次并判断是否完成
//! - 按顺序评分，失败即中止
//!
//! ### `extra_processor` - 额外任务处理器
//! - 计算每日配额（7 个）剩余量
//! - 上报听歌 + 评分，单首失败隔离
//!
//! ## 层次关系
//!
//! ```text
//! bot (一次运行)
//!     ↓
//! daily_processor / extra_processor (处理 Vec<WorkItem>)
//!     ↓
//! services::RatingSubmitter (处理单个 WorkItem)
//!     ↓
//! clients::PartnerApi (接口调用)
//!     ↓
//! infrastructure (HttpSession / SigningContext)
//! ```

pub mod bot;
pub mod daily_processor;
pub mod extra_processor;

pub use bot::{BotController, RunReport};
pub use daily_processor::{DailySummary, DailyTaskProcessor};
pub use extra_processor::{ExtraSummary, ExtraTaskProcessor, EXTRA_DAILY_QUOTA};
