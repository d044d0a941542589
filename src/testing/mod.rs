//! 测试支持：假服务端与测试数据
//!
//! ```rust,ignore
//! use music_partner_bot::testing::{fixtures, FakePartnerApi};
//!
//! let api = FakePartnerApi::new();
//! api.set_extra_list(fixtures::extra_queue_response(5, vec![fixtures::work("1", "Song", "A")]));
//! // ... 运行处理器 ...
//! assert_eq!(api.evaluated_work_ids(), vec!["1"]);
//! ```

pub mod fake_partner_api;
pub mod fixtures;

pub use fake_partner_api::{open_envelope, FakePartnerApi, RecordedCall, TEST_CSRF, TEST_SEED};
