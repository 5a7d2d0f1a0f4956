//! 合同相关模型
//!
//! 上传、生成、评估、比较四类请求 / 响应的结构定义

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt::Display;

use super::null_as_empty;
use super::session::SessionId;
use crate::error::{RelayError, RelayResult};

/// 上传文档的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentRole {
    /// 参考文档（原始版本）
    Reference,
    /// 待审文档（新版本）
    Review,
}

impl DocumentRole {
    /// 后端上传路径
    pub fn remote_path(self) -> &'static str {
        match self {
            DocumentRole::Reference => "/api/contracts/upload-reference",
            DocumentRole::Review => "/api/contracts/upload-for-review",
        }
    }

    /// 后端未给出可读错误时的消息
    pub fn fallback_error(self) -> &'static str {
        match self {
            DocumentRole::Reference => "Failed to upload reference document to external endpoint",
            DocumentRole::Review => "Failed to upload review document to external endpoint",
        }
    }

    /// 上传成功后返回给调用方的消息
    pub fn success_message(self) -> &'static str {
        match self {
            DocumentRole::Reference => "Reference document uploaded successfully",
            DocumentRole::Review => "File uploaded successfully",
        }
    }
}

impl Display for DocumentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentRole::Reference => write!(f, "reference"),
            DocumentRole::Review => write!(f, "review"),
        }
    }
}

/// 待上传的本地文件
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            content_type: None,
        }
    }
}

/// 上传请求
///
/// 字段都允许缺失，缺失由 `validate` 统一报告。
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub role: DocumentRole,
    pub file: Option<UploadFile>,
    pub session_id: Option<String>,
    pub template_type: Option<String>,
}

impl UploadRequest {
    /// 校验必填字段
    ///
    /// 顺序：文件 → 模板类型（仅待审文档）→ 会话 ID
    pub fn validate(&self) -> RelayResult<()> {
        let has_file = self
            .file
            .as_ref()
            .map(|f| !f.bytes.is_empty() && !f.filename.trim().is_empty())
            .unwrap_or(false);
        if !has_file {
            return Err(RelayError::validation("File is required"));
        }
        if self.role == DocumentRole::Review && is_blank(&self.template_type) {
            return Err(RelayError::validation("Template type is required"));
        }
        if is_blank(&self.session_id) {
            return Err(RelayError::validation("Session ID is required"));
        }
        Ok(())
    }
}

/// 校验通过的上传请求
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub role: DocumentRole,
    pub file: UploadFile,
    pub session_id: SessionId,
    pub template_type: Option<String>,
}

impl UploadRequest {
    /// 校验并取出各字段
    pub fn into_validated(self) -> RelayResult<ValidatedUpload> {
        self.validate()?;
        let file = self
            .file
            .ok_or_else(|| RelayError::validation("File is required"))?;
        let session_id = self
            .session_id
            .and_then(SessionId::parse)
            .ok_or_else(|| RelayError::validation("Session ID is required"))?;
        let template_type = self
            .template_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Ok(ValidatedUpload {
            role: self.role,
            file,
            session_id,
            template_type,
        })
    }
}

/// 上传成功回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub message: String,
    pub session_id: String,
    pub filename: String,
}

/// 合同生成请求（7 个表单字段）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub enterprise_name: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub effective_date: String,
    /// 有效期（年）
    #[serde(default)]
    pub valid_duration: String,
    /// 通知期（月）
    #[serde(default)]
    pub notice_period: String,
    #[serde(default)]
    pub template_type: String,
    #[serde(default)]
    pub session_id: String,
}

impl GenerateRequest {
    /// 从表单字段构建，未知字段忽略
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let get = |key: &str| fields.get(key).cloned().unwrap_or_default();
        Self {
            enterprise_name: get("enterprise_name"),
            client_name: get("client_name"),
            effective_date: get("effective_date"),
            valid_duration: get("valid_duration"),
            notice_period: get("notice_period"),
            template_type: get("template_type"),
            session_id: get("session_id"),
        }
    }

    /// 校验：全部必填，有效期和通知期必须为正数
    pub fn validate(&self) -> RelayResult<()> {
        let missing = self
            .to_form()
            .iter()
            .any(|(_, value)| value.trim().is_empty());
        if missing {
            return Err(RelayError::validation("Missing required fields"));
        }
        if !is_positive_number(&self.valid_duration) {
            return Err(RelayError::validation(
                "Valid Duration must be a positive number (in years)",
            ));
        }
        if !is_positive_number(&self.notice_period) {
            return Err(RelayError::validation(
                "Notice Period must be a positive number (in months)",
            ));
        }
        Ok(())
    }

    /// 转换为后端需要的表单字段
    pub fn to_form(&self) -> Vec<(String, String)> {
        vec![
            ("enterprise_name".to_string(), self.enterprise_name.clone()),
            ("client_name".to_string(), self.client_name.clone()),
            ("effective_date".to_string(), self.effective_date.clone()),
            ("valid_duration".to_string(), self.valid_duration.clone()),
            ("notice_period".to_string(), self.notice_period.clone()),
            ("template_type".to_string(), self.template_type.clone()),
            ("session_id".to_string(), self.session_id.clone()),
        ]
    }
}

/// 后端生成的合同文件
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// 合同评估结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub answers: Vec<String>,
}

/// 合同比较结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareResult {
    #[serde(default)]
    pub differences: Vec<Difference>,
}

/// 单条差异
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    pub index: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reference_text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub review_text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ai_opinion: String,
}

/// 合同模板选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateOption {
    pub value: String,
    pub label: String,
}

/// 后端模板列表不可用时的内置选项
const FALLBACK_TEMPLATES: &[(&str, &str)] = &[
    ("msa", "Master Service Agreement (MSA)"),
    ("nda", "Non-Disclosure Agreement (NDA)"),
    ("sla", "Service Level Agreement (SLA)"),
    ("employment", "Employment Contract"),
    ("vendor", "Vendor Agreement"),
];

impl TemplateOption {
    pub fn fallback() -> Vec<TemplateOption> {
        FALLBACK_TEMPLATES
            .iter()
            .map(|(value, label)| TemplateOption {
                value: value.to_string(),
                label: label.to_string(),
            })
            .collect()
    }

    /// 规范化后端模板列表
    ///
    /// 接受裸数组、`{templates: [...]}` 或 `{data: [...]}`；
    /// 结构不符合或列表为空时返回内置选项。
    pub fn normalize(payload: &JsonValue) -> Vec<TemplateOption> {
        let items = payload
            .as_array()
            .or_else(|| payload.get("templates").and_then(JsonValue::as_array))
            .or_else(|| payload.get("data").and_then(JsonValue::as_array));

        let Some(items) = items else {
            return Self::fallback();
        };

        let options: Vec<TemplateOption> = items
            .iter()
            .map(|item| {
                let value = first_text(item, &["name", "id", "type"])
                    .unwrap_or_default()
                    .to_lowercase();
                let label = first_text(item, &["description", "name", "type"])
                    .unwrap_or_else(|| "Unknown Template".to_string());
                TemplateOption { value, label }
            })
            .collect();

        if options.is_empty() {
            Self::fallback()
        } else {
            options
        }
    }
}

fn first_text(item: &JsonValue, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match item.get(*key)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

fn is_positive_number(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .map(|n| n.is_finite() && n > 0.0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_generate() -> GenerateRequest {
        GenerateRequest {
            enterprise_name: "Acme Corp".into(),
            client_name: "Globex".into(),
            effective_date: "2026-01-01".into(),
            valid_duration: "2".into(),
            notice_period: "3".into(),
            template_type: "msa".into(),
            session_id: "s-1".into(),
        }
    }

    #[test]
    fn test_generate_validation() {
        assert!(valid_generate().validate().is_ok());

        let missing = GenerateRequest {
            client_name: "".into(),
            ..valid_generate()
        };
        assert_eq!(
            missing.validate().unwrap_err().to_string(),
            "Missing required fields"
        );

        let zero_duration = GenerateRequest {
            valid_duration: "0".into(),
            ..valid_generate()
        };
        assert_eq!(
            zero_duration.validate().unwrap_err().to_string(),
            "Valid Duration must be a positive number (in years)"
        );

        let bad_notice = GenerateRequest {
            notice_period: "three".into(),
            ..valid_generate()
        };
        assert_eq!(
            bad_notice.validate().unwrap_err().to_string(),
            "Notice Period must be a positive number (in months)"
        );
    }

    #[test]
    fn test_upload_validation_order() {
        let request = UploadRequest {
            role: DocumentRole::Review,
            file: None,
            session_id: None,
            template_type: None,
        };
        assert_eq!(request.validate().unwrap_err().to_string(), "File is required");

        let request = UploadRequest {
            file: Some(UploadFile::new("B.docx", b"doc".to_vec())),
            ..request
        };
        assert_eq!(
            request.validate().unwrap_err().to_string(),
            "Template type is required"
        );

        let request = UploadRequest {
            template_type: Some("msa".into()),
            ..request
        };
        assert_eq!(
            request.validate().unwrap_err().to_string(),
            "Session ID is required"
        );

        // 参考文档不需要模板类型
        let reference = UploadRequest {
            role: DocumentRole::Reference,
            file: Some(UploadFile::new("A.docx", b"doc".to_vec())),
            session_id: Some("s-1".into()),
            template_type: None,
        };
        assert!(reference.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_missing() {
        let request = UploadRequest {
            role: DocumentRole::Reference,
            file: Some(UploadFile::new("A.docx", Vec::new())),
            session_id: Some("s-1".into()),
            template_type: None,
        };
        assert_eq!(request.validate().unwrap_err().to_string(), "File is required");
    }

    #[test]
    fn test_difference_null_texts() {
        let diff: Difference = serde_json::from_value(json!({
            "index": 3,
            "reference_text": null,
            "review_text": "New clause",
            "ai_opinion": "- Summary: added"
        }))
        .unwrap();
        assert_eq!(diff.reference_text, "");
        assert_eq!(diff.review_text, "New clause");
    }

    #[test]
    fn test_normalize_templates_shapes() {
        let wrapped = json!({ "templates": [{ "id": "t1", "name": "MSA" }] });
        assert_eq!(
            TemplateOption::normalize(&wrapped),
            vec![TemplateOption {
                value: "msa".into(),
                label: "MSA".into()
            }]
        );

        let bare = json!([{ "type": "NDA", "description": "Mutual NDA" }]);
        let options = TemplateOption::normalize(&bare);
        assert_eq!(options[0].value, "nda");
        assert_eq!(options[0].label, "Mutual NDA");

        let data = json!({ "data": [{}] });
        assert_eq!(TemplateOption::normalize(&data)[0].label, "Unknown Template");
    }

    #[test]
    fn test_normalize_templates_fallback() {
        let fallback = TemplateOption::normalize(&json!({ "unexpected": true }));
        assert_eq!(fallback.len(), 5);
        assert_eq!(fallback[0].value, "msa");

        let empty = TemplateOption::normalize(&json!({ "templates": [] }));
        assert_eq!(empty, TemplateOption::fallback());
    }
}
