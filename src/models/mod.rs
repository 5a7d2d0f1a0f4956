pub mod contract;
pub mod review;
pub mod session;

pub use contract::{
    CompareResult, Difference, DocumentRole, EvaluationResult, GenerateRequest,
    GeneratedDocument, TemplateOption, UploadFile, UploadReceipt, UploadRequest,
};
pub use review::{
    ChangeRecord, ChangeType, EvaluationRecord, EvaluationStatus, ReviewStatus,
};
pub use session::{SessionId, SessionStatus, UploadedDocumentRecord};

use serde::{Deserialize, Deserializer};

/// 把 JSON 中的 `null` 视为空字符串
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
