//! 报告归档服务 - 业务能力层
//!
//! 只负责"把完成的补救报告追加到文件"，不关心流程

use std::fs::OpenOptions;
use std::io::Write;

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{ProficiencyLevel, RubricDimension};

/// 报告归档服务
pub struct ReportArchive {
    report_file_path: String,
}

impl ReportArchive {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            report_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.report_file_path
    }

    /// 追加一份最终报告
    pub fn append(
        &self,
        competency: RubricDimension,
        final_level: ProficiencyLevel,
        report: &str,
    ) -> AppResult<()> {
        debug!(
            "归档报告: {} | 等级 {} | 长度: {}",
            competency,
            final_level,
            report.len()
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.report_file_path)
            .map_err(|e| AppError::file_write_failed(&self.report_file_path, e))?;

        let entry = format!(
            "{}\n{} | {} | Nível final: {}\n{}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            competency,
            final_level,
            "-".repeat(60),
            report.trim()
        );

        file.write_all(entry.as_bytes())
            .map_err(|e| AppError::file_write_failed(&self.report_file_path, e))?;

        Ok(())
    }
}

impl Default for ReportArchive {
    fn default() -> Self {
        Self::with_path("trilha_relatorios.txt")
    }
}
