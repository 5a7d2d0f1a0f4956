//! 会话相关模型

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt::Display;

/// 后端签发的不透明会话 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// 空白 ID 视为不存在
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `/api/session/create` 的响应
#[derive(Debug, Clone, Deserialize)]
pub struct SessionCreated {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// `/api/session/{id}/status` 的响应
///
/// 只解析比较前置检查需要的两个标志，其余字段原样保留。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    #[serde(default)]
    pub has_reference_doc: bool,
    #[serde(default)]
    pub has_review_doc: bool,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl SessionStatus {
    /// 参考文档和待审文档是否都已上传
    pub fn ready_for_comparison(&self) -> bool {
        self.has_reference_doc && self.has_review_doc
    }
}

/// 本地记录的上传文件名（仅用于展示）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocumentRecord {
    #[serde(rename = "referenceFile", skip_serializing_if = "Option::is_none")]
    pub reference_file: Option<String>,
    #[serde(rename = "reviewFile", skip_serializing_if = "Option::is_none")]
    pub review_file: Option<String>,
}

impl UploadedDocumentRecord {
    /// 合并一次更新，只覆盖更新中给出的字段
    pub fn merge(&mut self, update: UploadedDocumentRecord) {
        if update.reference_file.is_some() {
            self.reference_file = update.reference_file;
        }
        if update.review_file.is_some() {
            self.review_file = update.review_file;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_parse() {
        assert!(SessionId::parse("   ").is_none());
        assert_eq!(SessionId::parse(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_status_keeps_unknown_fields() {
        let status: SessionStatus = serde_json::from_str(
            r#"{"has_reference_doc":true,"has_review_doc":false,"template_type":"msa"}"#,
        )
        .unwrap();
        assert!(!status.ready_for_comparison());
        assert_eq!(status.extra["template_type"], "msa");
    }

    #[test]
    fn test_record_merge() {
        let mut record = UploadedDocumentRecord {
            reference_file: Some("A.docx".into()),
            review_file: None,
        };
        record.merge(UploadedDocumentRecord {
            reference_file: None,
            review_file: Some("B.docx".into()),
        });
        assert_eq!(record.reference_file.as_deref(), Some("A.docx"));
        assert_eq!(record.review_file.as_deref(), Some("B.docx"));
    }
}
