//! 命令行参数

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "contract_relay")]
#[command(about = "Contract workflow relay: generate, review and compare contracts", long_about = None)]
pub struct Cli {
    /// TOML 配置文件（环境变量优先）
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 输出 debug 日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the local relay server
    Serve {
        /// Listen address, overrides LISTEN_ADDR
        #[arg(long)]
        listen: Option<String>,
    },
    /// List contract templates
    Templates,
    /// Generate a contract from a template
    Generate {
        #[arg(long)]
        enterprise: String,
        #[arg(long)]
        client: String,
        #[arg(long)]
        effective_date: String,
        /// Years
        #[arg(long)]
        valid_duration: String,
        /// Months
        #[arg(long)]
        notice_period: String,
        #[arg(long)]
        template: String,
        /// Output directory for the .docx file
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Upload a contract and evaluate it
    Review {
        file: PathBuf,
        #[arg(long)]
        template: String,
    },
    /// Compare a reference contract with a revised one
    Compare {
        reference: PathBuf,
        review: PathBuf,
        #[arg(long)]
        template: String,
        /// Change ids to approve
        #[arg(long)]
        approve: Vec<String>,
        /// Changes to refer, as `id:remarks`
        #[arg(long)]
        refer: Vec<String>,
        /// Report path (defaults to contract_comparison_<date>.txt)
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Manage the stored session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Mint a new session now
    New,
    /// Show the stored session
    Show,
    /// Start a new session on the next command
    ConfirmReload,
}

/// 解析 `id:remarks`，没有备注时备注为空
pub fn parse_referral(raw: &str) -> (String, String) {
    match raw.split_once(':') {
        Some((id, remarks)) => (id.trim().to_string(), remarks.trim().to_string()),
        None => (raw.trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compare_command() {
        let cli = Cli::parse_from([
            "contract_relay",
            "compare",
            "v1.docx",
            "v2.docx",
            "--template",
            "msa",
            "--approve",
            "0",
            "--refer",
            "1:check liability cap",
        ]);
        match cli.command {
            Command::Compare {
                reference,
                approve,
                refer,
                report,
                ..
            } => {
                assert_eq!(reference, PathBuf::from("v1.docx"));
                assert_eq!(approve, vec!["0".to_string()]);
                assert_eq!(refer.len(), 1);
                assert!(report.is_none());
            }
            other => panic!("意外的子命令: {:?}", other),
        }
    }

    #[test]
    fn test_parse_session_subcommand() {
        let cli = Cli::parse_from(["contract_relay", "-v", "session", "confirm-reload"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Session {
                action: SessionAction::ConfirmReload
            }
        ));
    }

    #[test]
    fn test_parse_referral() {
        assert_eq!(
            parse_referral("3: needs sign-off"),
            ("3".to_string(), "needs sign-off".to_string())
        );
        assert_eq!(parse_referral("4"), ("4".to_string(), String::new()));
    }
}
