//! 本地中继服务
//!
//! 对外暴露与后端同名的路径，调用方只和本服务通信，凭据不离开本进程

pub mod response;
pub mod routes;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::error::RelayResult;
use crate::services::RelayServices;
use crate::store::SessionStore;

/// 单个上传文件的大小上限
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<RelayServices>,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn SessionStore>) -> RelayResult<Self> {
        Ok(Self {
            services: Arc::new(RelayServices::new(config, store)?),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/api/session/create", post(routes::create_session))
        .route("/api/session/:session_id/status", get(routes::session_status))
        .route(
            "/api/session/:session_id/documents",
            get(routes::session_documents).delete(routes::clear_session_documents),
        )
        .route("/api/templates", get(routes::templates))
        .route("/api/contracts/upload-reference", post(routes::upload_reference))
        .route("/api/contracts/upload-for-review", post(routes::upload_for_review))
        .route("/api/contracts/generate", post(routes::generate))
        .route("/api/contracts/evaluate", post(routes::evaluate))
        .route("/api/contracts/compare", post(routes::compare))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// 在给定的监听器上运行本地中继，直到进程退出
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr().context("无法读取监听地址")?;
    info!("🌐 本地中继已启动: http://{}", addr);
    axum::serve(listener, build_router(state))
        .await
        .context("本地中继异常退出")
}
