//! 合同生成流程
//!
//! 获取会话 → 生成 → 按模板、客户和日期命名

use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::info;

use crate::error::RelayResult;
use crate::models::{GenerateRequest, GeneratedDocument, SessionId};
use crate::services::ActionRelay;
use crate::workflow::SessionManager;

/// 生成完成的合同
#[derive(Debug, Clone)]
pub struct GeneratedContract {
    pub session_id: SessionId,
    /// 保存到本地时使用的文件名
    pub document_name: String,
    pub document: GeneratedDocument,
}

pub struct GenerateFlow {
    sessions: Arc<SessionManager>,
    actions: Arc<ActionRelay>,
}

impl GenerateFlow {
    pub fn new(sessions: Arc<SessionManager>, actions: Arc<ActionRelay>) -> Self {
        Self { sessions, actions }
    }

    /// 生成合同
    ///
    /// 表单中的 `session_id` 会被当前会话覆盖。
    pub async fn run(&self, mut form: GenerateRequest) -> RelayResult<GeneratedContract> {
        let session_id = self.sessions.acquire().await?;
        form.session_id = session_id.to_string();

        let document = self.actions.generate(&form).await?;
        let document_name =
            document_name(&form.template_type, &form.client_name, Local::now().date_naive());

        info!("✅ 合同生成完成: {}", document_name);

        Ok(GeneratedContract {
            session_id,
            document_name,
            document,
        })
    }
}

/// `{模板}_{客户}_{日期}.docx`
pub fn document_name(template_type: &str, client_name: &str, date: NaiveDate) -> String {
    format!(
        "{}_{}_{}.docx",
        template_type,
        client_name,
        date.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_name() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();
        assert_eq!(document_name("nda", "Globex", date), "nda_Globex_2024-11-05.docx");
    }
}
