pub mod partner_client;

pub use partner_client::{PartnerApi, PartnerClient};
