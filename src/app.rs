//! 终端展示层
//!
//! 从环境变量读取作文，打印评分报告，然后在标准输入上驱动补救流程：
//! - `próximo` - 下一步
//! - `resposta <texto>` - 提交练习答案
//! - `sair` - 结束（设置了 `SESSION_FILE` 时先保存会话）

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::clients::LlmClient;
use crate::config::Config;
use crate::models::{load_knowledge, EssayAnalysis, Evaluation, Verdict};
use crate::orchestrator::{Response, TutorSession, UserEvent};
use crate::services::{KnowledgeBase, NoKnowledge, SnippetKnowledge};
use crate::utils::logging::log_startup;
use crate::workflow::StepReport;

/// 应用主结构
pub struct App {
    session: TutorSession,
    session_file: Option<String>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        log_startup(&config);

        let knowledge: Arc<dyn KnowledgeBase> = match &config.knowledge_file {
            Some(path) => {
                let knowledge = SnippetKnowledge::new(load_knowledge(path).await?)
                    .with_top_k(config.knowledge_top_k);
                if knowledge.is_empty() {
                    warn!("⚠️ 知识文件中没有任何片段: {}", path);
                } else {
                    info!("✓ 已加载 {} 条知识片段", knowledge.len());
                }
                Arc::new(knowledge)
            }
            None => Arc::new(NoKnowledge),
        };

        let generator = Arc::new(LlmClient::new(&config));
        let mut session = TutorSession::from_config(&config, generator, knowledge);

        let session_file = std::env::var("SESSION_FILE").ok();
        if let Some(path) = &session_file {
            if Path::new(path).exists() {
                let snapshot = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("无法读取会话文件: {}", path))?;
                session.restore(&snapshot)?;
            }
        }

        Ok(Self {
            session,
            session_file,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<()> {
        if self.session.analysis().is_none() {
            let essay_file = std::env::var("ESSAY_FILE").context("缺少环境变量 ESSAY_FILE")?;
            let theme = std::env::var("ESSAY_THEME").context("缺少环境变量 ESSAY_THEME")?;
            let essay = tokio::fs::read_to_string(&essay_file)
                .await
                .with_context(|| format!("无法读取作文文件: {}", essay_file))?;

            let response = self
                .session
                .handle(UserEvent::SubmitEssay { essay, theme })
                .await;
            let analysed = matches!(response, Response::AnalysisReport(_));
            render(&response);
            if !analysed {
                return Ok(());
            }
        }

        println!("\nComandos: próximo | resposta <texto> | sair");

        self.drive(BufReader::new(tokio::io::stdin())).await
    }

    /// 逐行读取命令直到 `sair` 或输入结束，两种情况都会保存会话
    async fn drive<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<()> {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let Some(event) = parse_command(&line) else {
                println!("Comando não reconhecido: {}", line.trim());
                continue;
            };

            if event == UserEvent::Abandon {
                break;
            }

            let response = self.session.handle(event).await;
            render(&response);
        }

        self.save_session().await
    }

    async fn save_session(&self) -> Result<()> {
        let Some(path) = &self.session_file else {
            return Ok(());
        };
        let snapshot = self.session.snapshot()?;
        tokio::fs::write(path, snapshot)
            .await
            .with_context(|| format!("无法写入会话文件: {}", path))?;
        info!("💾 会话已保存至: {}", path);
        Ok(())
    }
}

/// 把一行输入转换成用户事件
fn parse_command(line: &str) -> Option<UserEvent> {
    let line = line.trim();
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    match command.to_lowercase().as_str() {
        "próximo" | "proximo" | "p" => Some(UserEvent::NextStep),
        "sair" | "q" => Some(UserEvent::Abandon),
        "resposta" | "r" => {
            let answer = rest.trim();
            if answer.is_empty() {
                warn!("⚠️ 答案为空");
                None
            } else {
                Some(UserEvent::SubmitAnswer(answer.to_string()))
            }
        }
        _ => None,
    }
}

fn render(response: &Response) {
    match response {
        Response::AnalysisReport(analysis) => render_analysis(analysis),
        Response::Remediation(step) => render_step(step),
        Response::Evaluation(evaluation) => render_evaluation(evaluation),
        Response::Notice { message, .. } => println!("\nℹ️ {}", message),
    }
}

fn render_analysis(analysis: &EssayAnalysis) {
    println!("\n{}", "=".repeat(60));
    println!("Resultado da Análise");
    println!("{}", "=".repeat(60));
    for score in analysis.scores.values() {
        println!("\n{} - {}/200", score.dimension, score.score);
        println!("{}", score.feedback);
    }
    println!("\nNota Total: {}/1000", analysis.total);
    if let (Some(best), Some(worst)) = (analysis.strongest(), analysis.weakest()) {
        println!("Ponto forte: {} | Ponto fraco: {}", best, worst);
    }
    if !analysis.general_comment.is_empty() {
        println!("\nComentário Geral:\n{}", analysis.general_comment);
    }
    if !analysis.follow_up_prompt.is_empty() {
        println!("\n{}", analysis.follow_up_prompt);
    }
}

fn render_step(step: &StepReport) {
    match step {
        StepReport::Overview { competency, text } => {
            println!("\n📖 {}\n\n{}", competency, text);
        }
        StepReport::ErrorsIdentified { categories } => {
            println!("\nCategorias de erro identificadas:");
            for category in categories {
                println!("- {}: {}", category.label, category.description);
            }
        }
        StepReport::NoErrors => println!("\nNenhum erro encontrado nesta competência."),
        StepReport::Exercise {
            category,
            level,
            theory,
            exercise,
            ..
        } => {
            println!("\n📚 {} (nível {})\n\n{}", category.label, level, theory);
            println!("\n✏️ Exercício:\n{}", exercise);
        }
        StepReport::CategorySkipped { category } => {
            println!("\n⚠️ Não foi possível gerar um exercício para '{}'. Seguindo em frente.", category);
        }
        StepReport::Final {
            competency,
            level,
            report,
        } => {
            println!("\n📊 Análise final - {} (nível final: {})\n\n{}", competency, level, report);
        }
    }
}

fn render_evaluation(evaluation: &Evaluation) {
    let verdict = match evaluation.verdict {
        Verdict::Correct => "✅ Correto!",
        Verdict::Incorrect => "❌ Ainda não. Tente novamente.",
        Verdict::CouldNotEvaluate => "🤔 Não foi possível avaliar a resposta. Tente novamente.",
    };
    println!("\n{}\n{}", verdict, evaluation.feedback);
}
