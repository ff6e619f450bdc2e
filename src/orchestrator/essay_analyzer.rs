//! 作文分析器 - 编排层
//!
//! 作文原文 → 评分提示词 → 弹性调用 → 模板解析 → `EssayAnalysis`

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::models::EssayAnalysis;
use crate::parser::{ParseCoverage, RubricParser, TemplateV1Parser};
use crate::services::{prompts, InvokeError, KnowledgeBase, NoKnowledge, ResilientInvoker};

/// 作文分析失败
///
/// 只有"一次回复都没拿到"和"输入为空"属于失败；
/// 部分维度缺失是正常结果
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisFailure {
    #[error("não foi possível concluir a análise: {0}")]
    Exhausted(#[from] InvokeError),
    #[error("campo obrigatório vazio: {field}")]
    EmptyInput { field: &'static str },
}

/// 作文分析器
pub struct EssayAnalyzer {
    invoker: ResilientInvoker,
    parser: Arc<dyn RubricParser>,
    knowledge: Arc<dyn KnowledgeBase>,
}

impl EssayAnalyzer {
    /// 使用模板 v1 解析器创建
    pub fn new(invoker: ResilientInvoker) -> Self {
        Self {
            invoker,
            parser: Arc::new(TemplateV1Parser::new()),
            knowledge: Arc::new(NoKnowledge),
        }
    }

    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeBase>) -> Self {
        self.knowledge = knowledge;
        self
    }

    /// 分析一篇作文
    ///
    /// # 参数
    /// - `essay_text`: 作文原文
    /// - `theme`: 作文题目
    ///
    /// # 返回
    /// 尽力解析出的 `EssayAnalysis`；调用重试耗尽时返回 `AnalysisFailure::Exhausted`
    pub async fn analyze(
        &self,
        essay_text: &str,
        theme: &str,
    ) -> Result<EssayAnalysis, AnalysisFailure> {
        self.analyze_with_coverage(essay_text, theme)
            .await
            .map(|(analysis, _)| analysis)
    }

    /// 同 `analyze`，额外返回解析覆盖率
    pub async fn analyze_with_coverage(
        &self,
        essay_text: &str,
        theme: &str,
    ) -> Result<(EssayAnalysis, ParseCoverage), AnalysisFailure> {
        if essay_text.trim().is_empty() {
            return Err(AnalysisFailure::EmptyInput { field: "redação" });
        }
        if theme.trim().is_empty() {
            return Err(AnalysisFailure::EmptyInput { field: "tema" });
        }

        info!("📝 开始分析作文 (主题: {})", theme);

        let snippets = self.knowledge.context_for(theme).await;
        let prompt = prompts::ground(prompts::analysis_prompt(theme, essay_text), &snippets);

        let reply = self.invoker.invoke(&prompt).await?;

        let parsed = self.parser.parse(&reply, essay_text);
        if parsed.coverage.is_complete() {
            info!(
                "✓ 解析完成 (模板 {}): 总分 {}",
                self.parser.version(),
                parsed.analysis.total
            );
        } else {
            warn!(
                "⚠️ 解析不完整 (模板 {}): 找到 {}/5 个维度，覆盖率 {:.0}%",
                self.parser.version(),
                parsed.coverage.dimensions_found,
                parsed.coverage.ratio() * 100.0
            );
        }

        Ok((parsed.analysis, parsed.coverage))
    }
}
