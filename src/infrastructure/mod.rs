//! 基础设施层：持有稀缺资源（HTTP 会话、签名密钥），只暴露能力

pub mod cipher;
pub mod http_session;

pub use cipher::{EncryptedEnvelope, Payload, RequestCipher, SigningContext};
pub use http_session::HttpSession;
