//! weapi 请求加密 - 基础设施层
//!
//! 两段式加密：
//! 1. 载荷 JSON 先用固定密钥、再用本次运行的随机密钥各做一次 AES-128-CBC（PKCS#7 填充），
//!    每次输出 base64，第二次的结果即 `params`
//! 2. 随机密钥反转后按大整数做 RSA（无填充）加密，输出 256 位十六进制即 `encSecKey`
//!
//! 随机密钥在一次运行内固定，相同载荷得到相同密文。

use std::collections::BTreeMap;

use aes::Aes128;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use num_bigint::BigUint;
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;

use crate::error::CipherError;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;

/// 固定 IV
pub const IV: &[u8; 16] = b"0102030405060708";
/// 第一段加密使用的公开密钥
pub const PRESET_KEY: &[u8; 16] = b"0CoJUm6Qyw8W8jud";
/// RSA 公钥指数
const PUBLIC_EXPONENT: u32 = 0x010001;
/// RSA 公钥模数（1024 位）
const MODULUS_HEX: &str = "00e0b509f6259df8642dbc35662901477df22677ec152b5ff68ace615bb7b725152b3ab17a876aea8a5aa76d2e417629ec4ee341f56135fccf695280104e0312ecbda92557c93870114af6c9d05c4f7f0c3685b7a46bee255932575cce10b424d813cfe4875d3e82047b97ddef52741d546b8e289dc6935b3ece0462db0a22b8e7";

/// 随机密钥长度
pub const SEED_LEN: usize = 16;
/// `encSecKey` 的固定长度
pub const ENC_SEC_KEY_LEN: usize = 256;

/// 明文载荷，键有序以保证序列化结果唯一
pub type Payload = BTreeMap<&'static str, String>;

/// 一次加密请求的请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncryptedEnvelope {
    pub params: String,
    #[serde(rename = "encSecKey")]
    pub enc_sec_key: String,
}

/// 请求加密器
///
/// 持有本次运行的随机密钥，`encSecKey` 只取决于密钥，构造时计算一次
#[derive(Clone)]
pub struct RequestCipher {
    seed: String,
    enc_sec_key: String,
}

impl RequestCipher {
    /// 生成新的 16 位字母数字随机密钥
    pub fn generate() -> Result<Self, CipherError> {
        let seed: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SEED_LEN)
            .map(char::from)
            .collect();
        Self::with_seed(seed)
    }

    /// 使用指定密钥（测试或复现用）
    pub fn with_seed(seed: impl Into<String>) -> Result<Self, CipherError> {
        let seed = seed.into();
        if seed.len() != SEED_LEN || !seed.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(CipherError::InvalidSeed(seed));
        }
        let enc_sec_key = rsa_encrypt_seed(&seed)?;
        Ok(Self { seed, enc_sec_key })
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn enc_sec_key(&self) -> &str {
        &self.enc_sec_key
    }

    /// 加密载荷
    pub fn encrypt<T: Serialize + ?Sized>(&self, payload: &T) -> Result<EncryptedEnvelope, CipherError> {
        let text = serde_json::to_string(payload)?;
        let first = aes_cbc_base64(text.as_bytes(), PRESET_KEY)?;
        let params = aes_cbc_base64(first.as_bytes(), self.seed.as_bytes())?;
        Ok(EncryptedEnvelope {
            params,
            enc_sec_key: self.enc_sec_key.clone(),
        })
    }
}

impl std::fmt::Debug for RequestCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCipher").field("seed", &"<redacted>").finish()
    }
}

/// 签名上下文：随机密钥 + csrf_token
///
/// 由发起加密请求的组件独占持有，整个运行期间不重新生成
#[derive(Debug, Clone)]
pub struct SigningContext {
    cipher: RequestCipher,
    csrf_token: String,
}

impl SigningContext {
    /// 以新的随机密钥创建
    pub fn generate(csrf_token: impl Into<String>) -> Result<Self, CipherError> {
        Ok(Self {
            cipher: RequestCipher::generate()?,
            csrf_token: csrf_token.into(),
        })
    }

    /// 以指定密钥创建
    pub fn with_seed(seed: impl Into<String>, csrf_token: impl Into<String>) -> Result<Self, CipherError> {
        Ok(Self {
            cipher: RequestCipher::with_seed(seed)?,
            csrf_token: csrf_token.into(),
        })
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    /// 写入 csrf_token 后加密
    pub fn seal(&self, mut payload: Payload) -> Result<EncryptedEnvelope, CipherError> {
        payload.insert("csrf_token", self.csrf_token.clone());
        self.cipher.encrypt(&payload)
    }
}

fn aes_cbc_base64(plaintext: &[u8], key: &[u8]) -> Result<String, CipherError> {
    let encryptor = Aes128CbcEnc::new_from_slices(key, IV).map_err(|_| CipherError::InvalidKeyLength)?;
    let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    Ok(STANDARD.encode(ciphertext))
}

fn rsa_encrypt_seed(seed: &str) -> Result<String, CipherError> {
    let reversed: String = seed.chars().rev().collect();
    let base = BigUint::from_bytes_be(reversed.as_bytes());
    let modulus = BigUint::parse_bytes(MODULUS_HEX.as_bytes(), 16).ok_or(CipherError::InvalidModulus)?;
    let exponent = BigUint::from(PUBLIC_EXPONENT);

    let encrypted = base.modpow(&exponent, &modulus);
    Ok(format!("{:0>width$}", encrypted.to_str_radix(16), width = ENC_SEC_KEY_LEN))
}
