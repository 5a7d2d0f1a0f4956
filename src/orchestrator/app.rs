use anyhow::{bail, Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::RelayResult;
use crate::models::{GenerateRequest, TemplateOption, UploadFile};
use crate::orchestrator::cli::{parse_referral, Command, SessionAction};
use crate::server::{self, AppState};
use crate::store::{DurableStore, FileDurableStore, InMemorySessionStore, SessionStore};
use crate::utils::logging::log_startup;
use crate::utils::excerpt;
use crate::workflow::{
    default_report_filename, render_comparison_report, CompareFlow, GenerateFlow, ReviewFlow,
    SessionManager,
};

/// 应用主结构
pub struct App {
    config: Config,
    state: AppState,
    sessions: Arc<SessionManager>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let durable: Arc<dyn DurableStore> =
            Arc::new(FileDurableStore::new(&config.session_state_file));
        Self::with_stores(config, store, durable).context("无法初始化后端客户端")
    }

    /// 使用指定的存储初始化（测试使用内存存储）
    pub fn with_stores(
        config: Config,
        store: Arc<dyn SessionStore>,
        durable: Arc<dyn DurableStore>,
    ) -> RelayResult<Self> {
        let state = AppState::new(&config, store)?;
        let sessions = Arc::new(SessionManager::new(
            state.services.sessions.clone(),
            durable,
        ));
        Ok(Self {
            config,
            state,
            sessions,
        })
    }

    pub fn session_manager(&self) -> Arc<SessionManager> {
        self.sessions.clone()
    }

    pub fn generate_flow(&self) -> GenerateFlow {
        GenerateFlow::new(self.sessions.clone(), self.state.services.actions.clone())
    }

    pub fn review_flow(&self) -> ReviewFlow {
        ReviewFlow::new(
            self.sessions.clone(),
            self.state.services.uploads.clone(),
            self.state.services.actions.clone(),
        )
    }

    pub fn compare_flow(&self) -> CompareFlow {
        CompareFlow::new(
            self.sessions.clone(),
            self.state.services.uploads.clone(),
            self.state.services.actions.clone(),
        )
    }

    /// 运行一个子命令
    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Serve { listen } => self.serve(listen).await,
            Command::Templates => self.list_templates().await,
            Command::Generate {
                enterprise,
                client,
                effective_date,
                valid_duration,
                notice_period,
                template,
                out_dir,
            } => {
                let form = GenerateRequest {
                    enterprise_name: enterprise,
                    client_name: client,
                    effective_date,
                    valid_duration,
                    notice_period,
                    template_type: template,
                    session_id: String::new(),
                };
                self.generate(form, &out_dir).await
            }
            Command::Review { file, template } => self.review(&file, &template).await,
            Command::Compare {
                reference,
                review,
                template,
                approve,
                refer,
                report,
            } => {
                self.compare(&reference, &review, &template, &approve, &refer, report)
                    .await
            }
            Command::Session { action } => self.session(action).await,
        }
    }

    async fn serve(&self, listen: Option<String>) -> Result<()> {
        let addr = listen.unwrap_or_else(|| self.config.listen_addr.clone());
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("无法监听地址: {}", addr))?;
        server::serve(listener, self.state.clone()).await
    }

    async fn list_templates(&self) -> Result<()> {
        let templates = match self.state.services.sessions.templates().await {
            Ok(payload) => TemplateOption::normalize(&payload),
            Err(e) => {
                warn!("⚠️ 模板列表获取失败，使用内置模板: {}", e);
                TemplateOption::fallback()
            }
        };
        info!("📋 可用模板 ({} 个):", templates.len());
        for template in &templates {
            info!("  {:<12} {}", template.value, template.label);
        }
        Ok(())
    }

    async fn generate(&self, form: GenerateRequest, out_dir: &Path) -> Result<()> {
        let contract = self.generate_flow().run(form).await?;
        let path = out_dir.join(&contract.document_name);
        tokio::fs::write(&path, &contract.document.bytes)
            .await
            .with_context(|| format!("无法写入合同文件: {}", path.display()))?;
        info!("💾 合同已保存至: {}", path.display());
        Ok(())
    }

    async fn review(&self, file: &Path, template: &str) -> Result<()> {
        let upload = read_upload_file(file).await?;
        let outcome = self.review_flow().run(upload, template).await?;

        info!("\n{}", "=".repeat(60));
        info!("📊 评估结果: {} (会话 {})", outcome.filename, outcome.session_id);
        info!("{}", "=".repeat(60));
        for record in &outcome.records {
            info!("[{:?}] Q{}: {}", record.status, record.id, record.question);
            info!("    {}", excerpt(&record.answer, 300));
        }
        Ok(())
    }

    async fn compare(
        &self,
        reference: &Path,
        review: &Path,
        template: &str,
        approve: &[String],
        refer: &[String],
        report: Option<PathBuf>,
    ) -> Result<()> {
        let reference = read_upload_file(reference).await?;
        let review = read_upload_file(review).await?;
        let mut outcome = self.compare_flow().run(reference, review, template).await?;

        if outcome.session_replaced {
            info!("🔁 已换用新会话: {}", outcome.session_id);
        }

        for change in outcome.changes.changes() {
            info!(
                "#{} [{:?}] {}",
                change.index,
                change.change_type,
                excerpt(&change.summary, 200)
            );
        }

        for id in approve {
            outcome.changes.approve(id)?;
        }
        for raw in refer {
            let (id, remarks) = parse_referral(raw);
            outcome.changes.refer(&id, remarks)?;
        }

        if approve.is_empty() && refer.is_empty() {
            return Ok(());
        }

        let path = report
            .unwrap_or_else(|| PathBuf::from(default_report_filename(Local::now().date_naive())));
        tokio::fs::write(&path, render_comparison_report(&outcome.changes))
            .await
            .with_context(|| format!("无法写入比较报告: {}", path.display()))?;
        info!("💾 比较报告已保存至: {}", path.display());
        Ok(())
    }

    async fn session(&self, action: SessionAction) -> Result<()> {
        match action {
            SessionAction::New => {
                let session_id = self.sessions.reset().await?;
                info!("✓ 新会话: {}", session_id);
            }
            SessionAction::Show => match self.sessions.stored() {
                Some(session_id) => info!("当前会话: {}", session_id),
                None => info!("尚未保存任何会话"),
            },
            SessionAction::ConfirmReload => {
                self.sessions.confirm_reload()?;
                info!("✓ 下一次操作将使用新会话");
            }
        }
        Ok(())
    }
}

async fn read_upload_file(path: &Path) -> Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("无法读取文件: {}", path.display()))?;
    let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
        bail!("无效的文件名: {}", path.display());
    };
    Ok(UploadFile::new(filename, bytes))
}
