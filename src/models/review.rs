//! 审阅记录模型
//!
//! 把后端返回的差异 / 问答整理成本地可审阅的记录，审阅状态只在本地修改

use serde::{Deserialize, Serialize};

use super::contract::{Difference, EvaluationResult};

/// 后端意见中摘要与法律意见之间的分隔符
pub const LEGAL_OPINION_SEPARATOR: &str = "\n- Legal Opinion:";
const SUMMARY_PREFIX: &str = "- Summary:";
const NO_LEGAL_OPINION: &str = "No legal opinion provided";
const NO_ANSWER: &str = "No answer provided.";

/// 差异类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Addition,
    Deletion,
    Modification,
}

impl ChangeType {
    /// 参考文本为空是新增，待审文本为空是删除，否则是修改
    pub fn classify(reference_text: &str, review_text: &str) -> Self {
        if reference_text.is_empty() {
            ChangeType::Addition
        } else if review_text.is_empty() {
            ChangeType::Deletion
        } else {
            ChangeType::Modification
        }
    }
}

/// 审阅状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Referred,
}

/// 单条差异的审阅记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub id: String,
    pub index: u64,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_text: Option<String>,
    pub summary: String,
    pub legal_opinion: String,
    pub status: ReviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl From<&Difference> for ChangeRecord {
    fn from(diff: &Difference) -> Self {
        let (summary, legal_opinion) = split_opinion(&diff.ai_opinion);
        Self {
            id: diff.index.to_string(),
            index: diff.index,
            change_type: ChangeType::classify(&diff.reference_text, &diff.review_text),
            old_text: non_empty(&diff.reference_text),
            new_text: non_empty(&diff.review_text),
            summary,
            legal_opinion,
            status: ReviewStatus::Pending,
            remarks: None,
        }
    }
}

/// 拆分后端的合并意见
///
/// 返回 (摘要, 法律意见)；没有分隔符时整段作为摘要。
pub fn split_opinion(ai_opinion: &str) -> (String, String) {
    let mut parts = ai_opinion.splitn(2, LEGAL_OPINION_SEPARATOR);
    let head = parts.next().unwrap_or_default();
    let summary = head.replacen(SUMMARY_PREFIX, "", 1).trim().to_string();
    let legal_opinion = parts
        .next()
        .map(|rest| rest.trim().to_string())
        .unwrap_or_else(|| NO_LEGAL_OPINION.to_string());
    (summary, legal_opinion)
}

/// 评估问答的风险等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStatus {
    Good,
    Warning,
    Critical,
}

impl EvaluationStatus {
    /// 按关键词粗略判断回答的风险等级
    pub fn classify(answer: &str) -> Self {
        if answer.contains("NA - Not Applicable") || answer.starts_with("No") {
            EvaluationStatus::Good
        } else if answer.contains("partially") || answer.contains("could be") {
            EvaluationStatus::Warning
        } else if answer.contains("issue") || answer.contains("excessive") {
            EvaluationStatus::Critical
        } else {
            EvaluationStatus::Good
        }
    }
}

/// 单个评估问答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub status: EvaluationStatus,
}

impl EvaluationRecord {
    /// 按问题顺序配对回答，缺失的回答补默认文本
    pub fn from_result(result: &EvaluationResult) -> Vec<EvaluationRecord> {
        result
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let answer = result
                    .answers
                    .get(index)
                    .filter(|a| !a.is_empty())
                    .cloned()
                    .unwrap_or_else(|| NO_ANSWER.to_string());
                EvaluationRecord {
                    id: index.to_string(),
                    question: question.clone(),
                    status: EvaluationStatus::classify(&answer),
                    answer,
                }
            })
            .collect()
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(reference: &str, review: &str, opinion: &str) -> Difference {
        Difference {
            index: 0,
            reference_text: reference.to_string(),
            review_text: review.to_string(),
            ai_opinion: opinion.to_string(),
        }
    }

    #[test]
    fn test_classify_change_type() {
        assert_eq!(ChangeType::classify("", "New clause"), ChangeType::Addition);
        assert_eq!(ChangeType::classify("Old clause", ""), ChangeType::Deletion);
        assert_eq!(
            ChangeType::classify("Old clause", "New clause"),
            ChangeType::Modification
        );
    }

    #[test]
    fn test_modification_scenario() {
        let record = ChangeRecord::from(&diff(
            "Old clause",
            "New clause",
            "- Summary: text\n- Legal Opinion: text",
        ));
        assert_eq!(record.change_type, ChangeType::Modification);
        assert_eq!(record.summary, "text");
        assert_eq!(record.legal_opinion, "text");
        assert_eq!(record.status, ReviewStatus::Pending);
        assert_eq!(record.id, "0");
    }

    #[test]
    fn test_opinion_without_separator() {
        let (summary, legal) = split_opinion("- Summary: payment terms extended");
        assert_eq!(summary, "payment terms extended");
        assert_eq!(legal, "No legal opinion provided");
    }

    #[test]
    fn test_addition_has_no_old_text() {
        let record = ChangeRecord::from(&diff("", "New clause", "plain opinion"));
        assert_eq!(record.change_type, ChangeType::Addition);
        assert!(record.old_text.is_none());
        assert_eq!(record.new_text.as_deref(), Some("New clause"));
        assert_eq!(record.summary, "plain opinion");
    }

    #[test]
    fn test_change_record_serializes_like_frontend() {
        let record = ChangeRecord::from(&diff("a", "b", "x"));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "modification");
        assert_eq!(value["legalOpinion"], "No legal opinion provided");
        assert_eq!(value["status"], "pending");
    }

    #[test]
    fn test_evaluation_status() {
        assert_eq!(
            EvaluationStatus::classify("NA - Not Applicable"),
            EvaluationStatus::Good
        );
        assert_eq!(
            EvaluationStatus::classify("No termination clause found"),
            EvaluationStatus::Good
        );
        assert_eq!(
            EvaluationStatus::classify("The cap could be higher"),
            EvaluationStatus::Warning
        );
        assert_eq!(
            EvaluationStatus::classify("Liability is excessive"),
            EvaluationStatus::Critical
        );
        assert_eq!(
            EvaluationStatus::classify("Yes, compliant"),
            EvaluationStatus::Good
        );
    }

    #[test]
    fn test_evaluation_records_pad_missing_answers() {
        let result = EvaluationResult {
            questions: vec!["Q1".into(), "Q2".into()],
            answers: vec!["Yes".into()],
        };
        let records = EvaluationRecord::from_result(&result);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].answer, "No answer provided.");
        assert_eq!(records[1].status, EvaluationStatus::Good);
    }
}
