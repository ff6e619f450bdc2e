//! 补救流程回复解析
//!
//! 分隔符缺失时把整段文本当作主字段，次字段标记为不可用

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::rubric::extract_error_pairs;
use crate::models::{ErrorCategory, Evaluation, Verdict};

static EXERCISE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)exerc[íi]cio\s*:").expect("exercise regex is valid"));

static ANSWER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)resposta\s+correta\s*:").expect("answer regex is valid")
});

/// 行首的 `Correto: Sim/Não`；回复中复述的 `Resposta correta: ...` 不算结论
static VERDICT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*\**[ \t]*correto[ \t]*\**[ \t]*:[ \t]*\**[ \t]*(sim|não|nao|yes|no)\b")
        .expect("verdict regex is valid")
});

static FEEDBACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)feedback\s*\**\s*:").expect("feedback regex is valid"));

/// 解析出的练习
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExercise {
    /// 练习题干（主字段）
    pub exercise: String,
    /// 标准答案；缺少 `Resposta correta:` 时为 None
    pub answer: Option<String>,
}

impl ParsedExercise {
    /// 题干和答案都存在且非空
    pub fn is_usable(&self) -> bool {
        !self.exercise.is_empty() && self.answer.as_deref().is_some_and(|a| !a.is_empty())
    }
}

fn trim_field(text: &str) -> String {
    text.trim_matches(|c: char| c.is_whitespace() || c == '*')
        .to_string()
}

/// 解析 `Exercício: ... Resposta correta: ...`
pub fn parse_exercise(reply: &str) -> ParsedExercise {
    let Some(answer) = ANSWER_RE.find(reply) else {
        let exercise = match EXERCISE_RE.find(reply) {
            Some(marker) => &reply[marker.end()..],
            None => reply,
        };
        return ParsedExercise {
            exercise: trim_field(exercise),
            answer: None,
        };
    };

    let head = &reply[..answer.start()];
    let exercise = match EXERCISE_RE.find(head) {
        Some(marker) => &head[marker.end()..],
        None => head,
    };

    ParsedExercise {
        exercise: trim_field(exercise),
        answer: Some(trim_field(&reply[answer.end()..])),
    }
}

/// 解析 `Correto: Sim/Não` 和 `Feedback: ...`
///
/// 没有识别到结论时返回 `Verdict::CouldNotEvaluate`；
/// 没有 `Feedback:` 时用去掉结论后的全文作为反馈
pub fn parse_evaluation(reply: &str) -> Evaluation {
    let verdict = match VERDICT_RE.captures(reply) {
        Some(caps) => match caps[1].to_lowercase().as_str() {
            "sim" | "yes" => Verdict::Correct,
            _ => Verdict::Incorrect,
        },
        None => Verdict::CouldNotEvaluate,
    };

    let feedback = match FEEDBACK_RE.find(reply) {
        Some(marker) => trim_field(&reply[marker.end()..]),
        None => trim_field(&VERDICT_RE.replace(reply, "")),
    };

    Evaluation { verdict, feedback }
}

/// 从分组回复中提取错误类别（已去重）
pub fn extract_categories(reply: &str) -> Vec<ErrorCategory> {
    let categories = extract_error_pairs(reply)
        .into_iter()
        // 没有内容的标签是分组标题，例如 "Erros encontrados:"
        .filter(|category| !category.description.is_empty())
        .collect();
    dedup_categories(categories)
}

/// 按标签去重：忽略大小写和首尾空白，保留第一次出现的顺序和描述
pub fn dedup_categories(categories: Vec<ErrorCategory>) -> Vec<ErrorCategory> {
    let mut seen = HashSet::new();
    categories
        .into_iter()
        .filter(|category| !category.label.trim().is_empty())
        .filter(|category| seen.insert(category.dedup_key()))
        .collect()
}
