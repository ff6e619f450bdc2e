/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

use crate::config::Config;
use crate::models::EssayAnalysis;
use crate::parser::ParseCoverage;

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 已加载的配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - ENEM 作文评分与补救练习");
    info!("🤖 模型: {} @ {}", config.llm_model_name, config.llm_api_base_url);
    info!(
        "🔁 重试策略: 最多 {} 次, {} 退避, 初始间隔 {}s",
        config.max_attempts, config.backoff, config.retry_delay_secs
    );
    if let Some(path) = &config.knowledge_file {
        info!("📚 知识库: {}", path);
    }
    info!("{}", "=".repeat(60));
}

/// 记录作文分析摘要
///
/// # 参数
/// - `analysis`: 分析结果
/// - `coverage`: 解析覆盖率
pub fn log_analysis_summary(analysis: &EssayAnalysis, coverage: &ParseCoverage) {
    info!("\n{}", "─".repeat(60));
    info!("📊 作文评分完成: 总分 {}/1000", analysis.total);
    for score in analysis.scores.values() {
        info!("  {}: {}/200", score.dimension, score.score);
    }
    if !coverage.is_complete() {
        info!(
            "⚠️ 部分维度未解析: {:?}",
            analysis.missing_dimensions()
        );
    }
    info!("📈 解析覆盖率: {:.0}%", coverage.ratio() * 100.0);
    info!("{}", "─".repeat(60));
}

/// 打印一个能力维度补救完成的信息
///
/// # 参数
/// - `completed`: 已完成的能力数
/// - `total`: 计划中的能力总数
/// - `report_file_path`: 报告归档文件
pub fn log_competency_complete(completed: usize, total: usize, report_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("✅ 能力补救完成: {}/{}", completed, total);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("报告已归档至: {}", report_file_path);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
