use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 评分提交错误
    #[error("评分错误: {0}")]
    Submission(#[from] SubmissionError),
    /// 请求加密错误
    #[error("加密错误: {0}")]
    Cipher(#[from] CipherError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 用户验证失败（致命，不重试）
    #[error("用户验证失败: {0}")]
    Verification(String),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败（连接、超时、非 2xx 状态）
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: BoxError,
    },
    /// API 返回错误响应
    #[error("API返回错误响应 ({endpoint}): code={code}, message={message}")]
    BadResponse {
        endpoint: String,
        code: i64,
        message: String,
    },
    /// 响应中缺少必要的数据
    #[error("API返回数据缺失: {endpoint}")]
    MissingData { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: BoxError,
    },
}

/// 单个作品评分失败
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// 服务端拒绝（非频率限制）
    #[error("作品「{work}」评分被拒绝: {message}")]
    Rejected { work: String, message: String },
    /// 频率限制重试次数耗尽
    #[error("作品「{work}」连续 {attempts} 次触发频率限制，放弃重试")]
    RateLimitExceeded { work: String, attempts: u32 },
    /// 网络层失败
    #[error("作品「{work}」评分请求失败: {source}")]
    Transport {
        work: String,
        #[source]
        source: ApiError,
    },
}

/// 请求加密错误
#[derive(Debug, Error)]
pub enum CipherError {
    /// 随机密钥长度或字符不合法
    #[error("随机密钥必须是 16 位 ASCII 字母数字，实际: {0:?}")]
    InvalidSeed(String),
    /// 载荷序列化失败
    #[error("载荷序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
    /// 密钥或 IV 长度错误
    #[error("AES 密钥或 IV 长度错误")]
    InvalidKeyLength,
    /// RSA 公钥模数无法解析
    #[error("RSA 公钥模数解析失败")]
    InvalidModulus,
    /// 解密或去填充失败
    #[error("解密失败: {0}")]
    Decrypt(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 必要配置项缺失
    #[error("缺少必要的配置项: {0}")]
    MissingField(&'static str),
    /// 配置文件不存在
    #[error("配置文件 {0} 不存在")]
    FileNotFound(String),
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 配置解析失败
    #[error("JSON配置解析失败: {0}")]
    JsonParse(#[from] serde_json::Error),
    /// TOML 配置解析失败
    #[error("TOML配置解析失败: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: &'static str, reason: String },
    /// 频率限制匹配规则无法编译
    #[error("频率限制匹配规则不合法: {0}")]
    InvalidPattern(#[from] regex::Error),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::request_failed(endpoint, source))
    }

    /// 创建API错误响应
    pub fn api_bad_response(endpoint: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        AppError::Api(ApiError::BadResponse {
            endpoint: endpoint.into(),
            code,
            message: message.into(),
        })
    }
}

impl ApiError {
    /// 创建网络请求失败错误
    pub fn request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// 创建 JSON 解析失败错误
    pub fn json_parse_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ApiError::JsonParseFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
