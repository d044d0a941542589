//! 内存版 `PartnerApi`，按服务端的方式解密请求体以便断言载荷

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use aes::Aes128;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use serde_json::Value;

use crate::clients::PartnerApi;
use crate::error::{ApiError, CipherError};
use crate::infrastructure::cipher::{IV, PRESET_KEY};
use crate::infrastructure::EncryptedEnvelope;
use crate::models::{ApiReply, DailyTaskResponse, ExtraListResponse, ProfileResponse};

use super::fixtures;

/// 测试用随机密钥
pub const TEST_SEED: &str = "0123456789abcdef";
/// 测试用 csrf_token
pub const TEST_CSRF: &str = "test-csrf-token";

type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// 记录下来的一次调用
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Profile,
    DailyTask,
    ExtraList,
    /// 解密后的上报载荷
    ReportListen(Value),
    /// 解密后的评分载荷
    Evaluate(Value),
}

struct State {
    profile: Result<ProfileResponse, String>,
    daily_task: DailyTaskResponse,
    extra_list: ExtraListResponse,
    evaluation_scripts: HashMap<String, VecDeque<ApiReply>>,
    evaluation_transport_failures: HashSet<String>,
    report_failures: HashSet<String>,
    calls: Vec<RecordedCall>,
    enc_sec_keys: Vec<String>,
}

/// 可编排的假服务端
///
/// - 默认：用户有效、每日任务已完成、额外队列为空、所有写操作返回 200
/// - 评分响应可按作品 id 逐次编排，未编排时返回 200
pub struct FakePartnerApi {
    seed: String,
    state: Mutex<State>,
}

impl FakePartnerApi {
    /// 使用 `TEST_SEED` 解密
    pub fn new() -> Self {
        Self::with_seed(TEST_SEED)
    }

    pub fn with_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            state: Mutex::new(State {
                profile: Ok(fixtures::profile("tester")),
                daily_task: fixtures::daily_response("0", 0, 0, Vec::new()),
                extra_list: fixtures::extra_response(Vec::new()),
                evaluation_scripts: HashMap::new(),
                evaluation_transport_failures: HashSet::new(),
                report_failures: HashSet::new(),
                calls: Vec::new(),
                enc_sec_keys: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_profile(&self, profile: ProfileResponse) {
        self.state().profile = Ok(profile);
    }

    /// 用户信息接口网络失败
    pub fn fail_profile(&self, reason: impl Into<String>) {
        self.state().profile = Err(reason.into());
    }

    pub fn set_daily_task(&self, response: DailyTaskResponse) {
        self.state().daily_task = response;
    }

    pub fn set_extra_list(&self, response: ExtraListResponse) {
        self.state().extra_list = response;
    }

    /// 为某作品依次返回的评分响应
    pub fn script_evaluation(&self, work_id: &str, replies: Vec<ApiReply>) {
        self.state()
            .evaluation_scripts
            .insert(work_id.to_string(), replies.into());
    }

    /// 某作品的评分请求网络失败
    pub fn fail_evaluation_transport(&self, work_id: &str) {
        self.state()
            .evaluation_transport_failures
            .insert(work_id.to_string());
    }

    /// 某作品的听歌上报返回错误
    pub fn fail_report(&self, work_id: &str) {
        self.state().report_failures.insert(work_id.to_string());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    /// 所有评分载荷，按调用顺序
    pub fn evaluations(&self) -> Vec<Value> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                RecordedCall::Evaluate(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    /// 所有上报载荷，按调用顺序
    pub fn reports(&self) -> Vec<Value> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                RecordedCall::ReportListen(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    /// 被提交评分的作品 id，按调用顺序（含重试）
    pub fn evaluated_work_ids(&self) -> Vec<String> {
        self.evaluations().iter().map(work_id_of).collect()
    }

    pub fn reported_work_ids(&self) -> Vec<String> {
        self.reports().iter().map(work_id_of).collect()
    }

    pub fn enc_sec_keys(&self) -> Vec<String> {
        self.state().enc_sec_keys.clone()
    }

    fn open(&self, endpoint: &str, envelope: &EncryptedEnvelope) -> Result<Value, ApiError> {
        self.state().enc_sec_keys.push(envelope.enc_sec_key.clone());
        open_envelope(&self.seed, envelope).map_err(|e| ApiError::request_failed(endpoint, e))
    }
}

impl Default for FakePartnerApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PartnerApi for FakePartnerApi {
    fn csrf_token(&self) -> &str {
        TEST_CSRF
    }

    async fn fetch_profile(&self) -> Result<ProfileResponse, ApiError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::Profile);
        state.profile.clone().map_err(|reason| {
            ApiError::request_failed(
                "profile",
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, reason),
            )
        })
    }

    async fn fetch_daily_task(&self) -> Result<DailyTaskResponse, ApiError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::DailyTask);
        Ok(state.daily_task.clone())
    }

    async fn fetch_extra_list(&self) -> Result<ExtraListResponse, ApiError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::ExtraList);
        Ok(state.extra_list.clone())
    }

    async fn report_listen(&self, envelope: &EncryptedEnvelope) -> Result<ApiReply, ApiError> {
        let payload = self.open("report", envelope)?;
        let work_id = work_id_of(&payload);

        let mut state = self.state();
        state.calls.push(RecordedCall::ReportListen(payload));
        if state.report_failures.contains(&work_id) {
            return Ok(ApiReply {
                code: 500,
                msg: None,
                message: Some("上报失败".to_string()),
            });
        }
        Ok(ApiReply::ok())
    }

    async fn evaluate_work(&self, envelope: &EncryptedEnvelope) -> Result<ApiReply, ApiError> {
        let payload = self.open("evaluate", envelope)?;
        let work_id = work_id_of(&payload);

        let mut state = self.state();
        state.calls.push(RecordedCall::Evaluate(payload));
        if state.evaluation_transport_failures.contains(&work_id) {
            return Err(ApiError::request_failed(
                "evaluate",
                std::io::Error::new(std::io::ErrorKind::TimedOut, "connection timed out"),
            ));
        }
        let reply = state
            .evaluation_scripts
            .get_mut(&work_id)
            .and_then(|script| script.pop_front())
            .unwrap_or_else(ApiReply::ok);
        Ok(reply)
    }
}

/// 服务端视角的解密：先用随机密钥、再用固定密钥解两层
pub fn open_envelope(seed: &str, envelope: &EncryptedEnvelope) -> Result<Value, CipherError> {
    let outer = decrypt_layer(&envelope.params, seed.as_bytes())?;
    let outer = String::from_utf8(outer).map_err(|e| CipherError::Decrypt(e.to_string()))?;
    let inner = decrypt_layer(&outer, PRESET_KEY)?;
    Ok(serde_json::from_slice(&inner)?)
}

fn decrypt_layer(b64: &str, key: &[u8]) -> Result<Vec<u8>, CipherError> {
    let data = STANDARD
        .decode(b64)
        .map_err(|e| CipherError::Decrypt(e.to_string()))?;
    Aes128CbcDec::new_from_slices(key, IV)
        .map_err(|_| CipherError::InvalidKeyLength)?
        .decrypt_padded_vec_mut::<Pkcs7>(&data)
        .map_err(|_| CipherError::Decrypt("填充校验失败".to_string()))
}

fn work_id_of(payload: &Value) -> String {
    payload
        .get("workId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
