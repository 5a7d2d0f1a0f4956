//! 后端客户端 - 基础设施层
//!
//! 持有唯一的 HTTP 连接池，只暴露"转发一个请求到后端并统一错误结构"的能力

use reqwest::header::{HeaderMap, HeaderName, ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::{RelayError, RelayResult};
use crate::utils::excerpt;

pub const MIME_JSON: &str = "application/json";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// 请求体编码
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    /// application/x-www-form-urlencoded
    Form(Vec<(String, String)>),
    /// multipart/form-data
    Multipart(Vec<MultipartField>),
}

/// multipart 字段
#[derive(Debug, Clone)]
pub enum MultipartField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        bytes: Vec<u8>,
        content_type: Option<String>,
    },
}

/// 一次后端调用的描述
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub method: Method,
    /// 相对 `API_BASE_URL` 的路径片段（未编码）
    pub segments: Vec<String>,
    pub body: RequestBody,
    pub accept: &'static str,
    /// 后端未给出可读错误时使用的消息
    pub fallback_error: String,
    /// JSON 错误体既没有 `error` 也没有 `detail` 时使用的消息（默认同 `fallback_error`）
    pub empty_json_error: Option<String>,
}

impl BackendRequest {
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            body: RequestBody::Empty,
            accept: MIME_JSON,
            fallback_error: "External API request failed".to_string(),
            empty_json_error: None,
        }
    }

    /// 追加路径片段，片段内的 `/` 等字符会被编码
    pub fn append_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments.extend(segments.into_iter().map(Into::into));
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    pub fn multipart(mut self, fields: Vec<MultipartField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    pub fn accept(mut self, mime: &'static str) -> Self {
        self.accept = mime;
        self
    }

    pub fn fallback_error(mut self, message: impl Into<String>) -> Self {
        self.fallback_error = message.into();
        self
    }

    pub fn empty_json_error(mut self, message: impl Into<String>) -> Self {
        self.empty_json_error = Some(message.into());
        self
    }
}

/// 后端成功响应
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl BackendResponse {
    /// 按 JSON 反序列化响应体
    pub fn json<T: DeserializeOwned>(&self) -> RelayResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            warn!("后端响应不是合法 JSON: {}", e);
            RelayError::from(e)
        })
    }
}

/// 后端客户端
///
/// 职责：
/// - 附加 Basic Auth 与 Accept 头
/// - 按请求体类型编码（无 / 表单 / multipart）
/// - 把非 2xx 响应统一转换为 `RelayError::Remote`
/// - 不认识合同 / 会话等业务概念
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: Config,
}

impl BackendClient {
    /// 创建新的后端客户端
    pub fn new(config: &Config) -> RelayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// 转发请求到后端
    ///
    /// 凭据在每次调用时检查，缺失即返回配置错误且不发起网络请求。
    pub async fn send(&self, request: BackendRequest) -> RelayResult<BackendResponse> {
        let credentials = self.config.backend_credentials()?;
        let url = build_url(&credentials.base_url, &request.segments)?;

        debug!("➡️ {} {}", request.method, url);

        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .basic_auth(&credentials.username, Some(&credentials.password))
            .header(ACCEPT, request.accept);

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart(fields) => builder.multipart(build_multipart(fields)?),
        };

        let response = builder.send().await.map_err(|e| {
            error!("后端请求失败 ({} {}): {}", request.method, url, e);
            RelayError::Transport(e.to_string())
        })?;

        let status = response.status();
        let content_type = header_string(response.headers(), CONTENT_TYPE);
        let content_disposition = header_string(response.headers(), CONTENT_DISPOSITION);
        let body = response.bytes().await?.to_vec();

        debug!("⬅️ {} {} -> {} ({} 字节)", request.method, url, status, body.len());

        if !status.is_success() {
            let err = normalize_error(
                status,
                content_type.as_deref(),
                &body,
                &request.fallback_error,
                request.empty_json_error.as_deref(),
            );
            warn!("后端返回错误 ({}): {}", status, err);
            return Err(err);
        }

        Ok(BackendResponse {
            status: status.as_u16(),
            content_type,
            content_disposition,
            body,
        })
    }
}

/// 在后端地址后拼接路径片段，每个片段单独做百分号编码
fn build_url(base_url: &str, segments: &[String]) -> RelayResult<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| RelayError::Config(format!("invalid API_BASE_URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| RelayError::Config(format!("API_BASE_URL cannot be a base: {}", base_url)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn build_multipart(fields: Vec<MultipartField>) -> RelayResult<Form> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            MultipartField::Text { name, value } => form.text(name, value),
            MultipartField::File {
                name,
                filename,
                bytes,
                content_type,
            } => {
                let mut part = Part::bytes(bytes).file_name(filename);
                if let Some(mime) = content_type {
                    part = part.mime_str(&mime)?;
                }
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// 把后端的非 2xx 响应转换为统一的错误结构
///
/// JSON 响应体取 `error`，其次 `detail`；非 JSON 响应体用状态行拼出消息。
pub fn normalize_error(
    status: StatusCode,
    content_type: Option<&str>,
    body: &[u8],
    fallback: &str,
    empty_json_fallback: Option<&str>,
) -> RelayError {
    let is_json = content_type
        .map(|ct| ct.contains(MIME_JSON))
        .unwrap_or(false);

    if is_json {
        return match serde_json::from_slice::<JsonValue>(body) {
            Ok(details) => {
                let message = message_field(&details, "error")
                    .or_else(|| message_field(&details, "detail"))
                    .unwrap_or_else(|| empty_json_fallback.unwrap_or(fallback).to_string());
                RelayError::Remote {
                    status: status.as_u16(),
                    message,
                    details,
                }
            }
            Err(e) => {
                warn!("无法解析后端错误响应: {}", e);
                RelayError::Remote {
                    status: status.as_u16(),
                    message: "Invalid error response from external API".to_string(),
                    details: json!({}),
                }
            }
        };
    }

    let text = String::from_utf8_lossy(body);
    let details = if text.trim().is_empty() {
        json!({})
    } else {
        json!({ "text": excerpt(text.trim(), 500) })
    };
    RelayError::Remote {
        status: status.as_u16(),
        message: format!(
            "{} (Status: {} {})",
            fallback,
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string(),
        details,
    }
}

fn message_field(details: &JsonValue, key: &str) -> Option<String> {
    match details.get(key)? {
        JsonValue::Null => None,
        JsonValue::String(s) if s.is_empty() => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
