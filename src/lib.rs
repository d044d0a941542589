//! # Music Partner Bot
//!
//! 网易云音乐"音乐合伙人"自动评定程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `HttpSession` - 唯一的 Cookie 会话，提供 GET / 表单 POST 能力
//! - `SigningContext` - 一次运行内共用的请求加密上下文
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - 接口地址与响应结构
//! - `PartnerApi` - 远程服务能力抽象，`PartnerClient` 为真实实现
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 只处理单首作品
//! - `ScoringPolicy` - 评分规则
//! - `PacingController` - 随机等待
//! - `RatingSubmitter` - 评分提交与频率限制重试
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/bot` - 一次完整运行
//! - `orchestrator/daily_processor` - 每日任务批次
//! - `orchestrator/extra_processor` - 额外评定队列（每日 7 个）
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod utils;
pub mod validators;

// 重新导出常用类型
pub use clients::{PartnerApi, PartnerClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{RequestCipher, SigningContext};
pub use models::WorkItem;
pub use orchestrator::{BotController, RunReport};
pub use validators::{CookieStatus, CookieValidator};
