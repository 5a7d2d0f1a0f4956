//! 比较结果的审阅与报告
//!
//! 审阅状态只在本地修改，后端不感知

use chrono::NaiveDate;
use std::fmt::Write;

use crate::error::{RelayError, RelayResult};
use crate::models::{ChangeRecord, ReviewStatus};

/// 一次比较得到的全部差异记录
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    changes: Vec<ChangeRecord>,
}

impl ChangeSet {
    pub fn new(changes: Vec<ChangeRecord>) -> Self {
        Self { changes }
    }

    pub fn changes(&self) -> &[ChangeRecord] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// 批准一条差异
    pub fn approve(&mut self, id: &str) -> RelayResult<&ChangeRecord> {
        let change = self.find_mut(id)?;
        change.status = ReviewStatus::Approved;
        Ok(change)
    }

    /// 转交一条差异，附带备注
    pub fn refer(&mut self, id: &str, remarks: impl Into<String>) -> RelayResult<&ChangeRecord> {
        let change = self.find_mut(id)?;
        change.status = ReviewStatus::Referred;
        change.remarks = Some(remarks.into());
        Ok(change)
    }

    pub fn with_status(&self, status: ReviewStatus) -> impl Iterator<Item = &ChangeRecord> {
        self.changes.iter().filter(move |c| c.status == status)
    }

    fn find_mut(&mut self, id: &str) -> RelayResult<&mut ChangeRecord> {
        self.changes
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| RelayError::validation(format!("Unknown change: {}", id)))
    }
}

/// 渲染已批准 / 已转交差异的文本报告
pub fn render_comparison_report(changes: &ChangeSet) -> String {
    let approved: Vec<_> = changes.with_status(ReviewStatus::Approved).collect();
    let referred: Vec<_> = changes.with_status(ReviewStatus::Referred).collect();

    let mut out = String::new();
    let _ = writeln!(out, "DOCUMENT COMPARISON RESULTS");
    let _ = writeln!(out, "==========================");
    let _ = writeln!(out);
    let _ = writeln!(out, "APPROVED CHANGES ({}):", approved.len());
    for change in &approved {
        let _ = writeln!(out, "- Change #{}: {}", change.index, change.summary);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "REFERRED CHANGES ({}):", referred.len());
    for change in &referred {
        let _ = writeln!(out, "- Change #{}: {}", change.index, change.summary);
        let _ = writeln!(
            out,
            "  Remarks: {}",
            change.remarks.as_deref().unwrap_or("None")
        );
    }
    out
}

/// 报告默认文件名
pub fn default_report_filename(date: NaiveDate) -> String {
    format!("contract_comparison_{}.txt", date.format("%Y-%m-%d"))
}
