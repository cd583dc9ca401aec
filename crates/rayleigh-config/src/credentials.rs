use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

/// 凭据解码错误
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid credentials JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// API 凭据
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub access_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("access_token", &"***")
            .finish()
    }
}

/// 解码访问令牌生成器返回的 base64 字符串
///
/// 令牌可以通过
/// <https://www.rayleighconnect.net/oauth2/authorize?client_id=uob&redirect_uri=urn:ietf:wg:oauth:2.0:oob&response_type=token>
/// 获取，解码后是一个包含 `client_id` 和 `access_token` 的 JSON 对象。
///
/// # 错误
/// * `Base64` - 输入不是合法的 base64
/// * `Json` - 解码内容不是 JSON，或缺少字段
pub fn decode_credentials(auth_string: &str) -> Result<Credentials, CredentialsError> {
    let raw = STANDARD.decode(auth_string.trim())?;
    Ok(serde_json::from_slice(&raw)?)
}
