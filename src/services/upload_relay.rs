//! 上传中继 - 业务能力层
//!
//! 只负责"把一个本地文件转发给后端并记录文件名"，不做自动重试

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::RelayResult;
use crate::infrastructure::{BackendClient, BackendRequest, MultipartField};
use crate::models::contract::ValidatedUpload;
use crate::models::{DocumentRole, SessionId, UploadReceipt, UploadRequest, UploadedDocumentRecord};
use crate::store::SessionStore;

/// 上传中继
///
/// 职责：
/// - 在发起网络请求前校验必填字段
/// - 以 multipart 转发文件到对应角色的后端路径
/// - 成功后更新注入的上传记录存储
pub struct UploadRelay {
    backend: BackendClient,
    store: Arc<dyn SessionStore>,
}

impl UploadRelay {
    pub fn new(backend: BackendClient, store: Arc<dyn SessionStore>) -> Self {
        Self { backend, store }
    }

    /// 上传一个文档
    pub async fn upload(&self, request: UploadRequest) -> RelayResult<UploadReceipt> {
        let ValidatedUpload {
            role,
            file,
            session_id,
            template_type,
        } = request.into_validated()?;
        let filename = file.filename.clone();

        info!(
            "📤 上传{}文档: {} ({} 字节), 会话 {}",
            role_label(role),
            filename,
            file.bytes.len(),
            session_id
        );

        let mut fields = vec![MultipartField::File {
            name: "file".to_string(),
            filename: file.filename,
            bytes: file.bytes,
            content_type: file.content_type,
        }];
        if let (DocumentRole::Review, Some(template)) = (role, template_type) {
            fields.push(MultipartField::Text {
                name: "template_type".to_string(),
                value: template,
            });
        }
        fields.push(MultipartField::Text {
            name: "session_id".to_string(),
            value: session_id.to_string(),
        });

        let response = self
            .backend
            .send(
                BackendRequest::post(role.remote_path())
                    .multipart(fields)
                    .fallback_error(role.fallback_error()),
            )
            .await?;
        debug!(
            "后端上传响应: {}",
            String::from_utf8_lossy(&response.body)
        );

        let update = match role {
            DocumentRole::Reference => UploadedDocumentRecord {
                reference_file: Some(filename.clone()),
                review_file: None,
            },
            DocumentRole::Review => UploadedDocumentRecord {
                reference_file: None,
                review_file: Some(filename.clone()),
            },
        };
        self.store.set(&session_id, update).await;

        info!("✓ {}文档上传成功: {}", role_label(role), filename);

        Ok(UploadReceipt {
            message: role.success_message().to_string(),
            session_id: session_id.to_string(),
            filename,
        })
    }

    /// 读取某个会话的上传记录
    pub async fn record(&self, session_id: &SessionId) -> Option<UploadedDocumentRecord> {
        self.store.get(session_id).await
    }

    /// 清除某个会话的上传记录
    pub async fn clear(&self, session_id: &SessionId) -> bool {
        self.store.delete(session_id).await
    }
}

fn role_label(role: DocumentRole) -> &'static str {
    match role {
        DocumentRole::Reference => "参考",
        DocumentRole::Review => "待审",
    }
}
