//! 评分回复解析（模板 v1）
//!
//! 模板结构见 `services::prompts::analysis_prompt`：
//! 每个维度一个带编号的标题，标题后是 `N/200` 和反馈；
//! 然后是 `Nota Total: N/1000`、总评、薄弱维度和学习邀请

use std::cmp::Ordering;
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::{ParseCoverage, ParsedAnalysis, RubricParser};
use crate::models::rubric::{DIMENSION_MAX_SCORE, SCORE_STEP, TOTAL_MAX_SCORE};
use crate::models::{DimensionScore, ErrorCategory, EssayAnalysis, RubricDimension};

pub const BEGIN_MARKER: &str = "[INÍCIO DA ANÁLISE]";
pub const END_MARKER: &str = "[FIM DA ANÁLISE]";
pub const GENERAL_COMMENT_MARKER: &str = "Comentário Geral:";
pub const WEAK_DIMENSIONS_MARKER: &str = "Competências que precisam de mais atenção:";
pub const FOLLOW_UP_MARKER: &str = "Convite para Trilha de Aprendizado:";

fn marker_regex(marker: &str) -> Regex {
    Regex::new(&format!("(?i){}", regex::escape(marker))).expect("marker regex is valid")
}

static END_RE: Lazy<Regex> = Lazy::new(|| marker_regex(END_MARKER));
static GENERAL_COMMENT_RE: Lazy<Regex> = Lazy::new(|| marker_regex(GENERAL_COMMENT_MARKER));
static WEAK_DIMENSIONS_RE: Lazy<Regex> = Lazy::new(|| marker_regex(WEAK_DIMENSIONS_MARKER));
static FOLLOW_UP_RE: Lazy<Regex> = Lazy::new(|| marker_regex(FOLLOW_UP_MARKER));

/// 每个维度的编号标题，例如 `1. Domínio da Norma Culta (0-200 pontos):`
///
/// 只匹配到维度名称为止，标题行的剩余部分可能带分数
static HEADER_RES: Lazy<Vec<(RubricDimension, Regex)>> = Lazy::new(|| {
    RubricDimension::ALL
        .into_iter()
        .map(|dimension| {
            let pattern = format!(
                r"(?i){}\.\s*\**\s*{}",
                dimension.number(),
                regex::escape(dimension.name())
            );
            (dimension, Regex::new(&pattern).expect("header regex is valid"))
        })
        .collect()
});

/// 维度名称（用于识别薄弱维度）
static NAME_RES: Lazy<Vec<(RubricDimension, Regex)>> = Lazy::new(|| {
    RubricDimension::ALL
        .into_iter()
        .map(|dimension| (dimension, marker_regex(dimension.name())))
        .collect()
});

/// 标题之后的分数，例如 `170/200`、`**Nota: 160 / 200**`
static SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*\**\s*(?:nota\s*:?\s*)?\**\s*(\d+)\s*\**\s*/\s*200\**")
        .expect("score regex is valid")
});

/// 标题行内的分数，例如 `1. Domínio da Norma Culta - 160/200`
static INLINE_SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:nota\s*:?\s*)?\**\s*(\d+)\s*\**\s*/\s*200\**")
        .expect("inline score regex is valid")
});

/// 行首的 `Nota Total`，作为最后一个维度的结束位置
static TOTAL_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*\**[ \t]*nota\s+total\b").expect("total line regex is valid")
});

static TOTAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)total\s*:?\s*\**\s*(\d+)\s*\**\s*/\s*1000").expect("total regex is valid")
});

static COMPETENCY_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)compet[êe]ncia\s*(?:n[º°o.]?\s*)?([1-5])\b")
        .expect("competency number regex is valid")
});

/// `标签: 描述` 中的标签：位于行首或句末标点（可跟引号、右括号）之后，可带列表符号或加粗
static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)(?:^|([.;!?]["'”’)]*))[ \t]*(?:[-*•][ \t]*|\d+[.)][ \t]*)?\**(\p{L}[\p{L}\p{N}_ \t]{0,60}?)\**[ \t]*:"#,
    )
    .expect("label regex is valid")
});

/// 分数归一化：除以 40 取最近整数后乘 40，并限制在 [0, 200]
///
/// 恰好位于两档中间时取偶数档（20 → 0, 60 → 80, 100 → 80）
pub fn normalize_score(raw: u64) -> u32 {
    let step = u64::from(SCORE_STEP);
    let capped = raw.min(u64::from(DIMENSION_MAX_SCORE) + step);
    let (quotient, remainder) = (capped / step, capped % step);
    let rounded = match (remainder * 2).cmp(&step) {
        Ordering::Greater => quotient + 1,
        Ordering::Equal if quotient % 2 == 1 => quotient + 1,
        _ => quotient,
    };
    (rounded * step).min(u64::from(DIMENSION_MAX_SCORE)) as u32
}

/// 提取反馈文本中的 `标签: 描述` 对
///
/// 描述一直延续到下一个标签或文本结尾；空标签被丢弃
pub fn extract_error_pairs(text: &str) -> Vec<ErrorCategory> {
    // (标签, 标签所在匹配的结束位置, 前一段描述应截止的位置)
    let labels: Vec<(&str, usize, usize)> = LABEL_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let label = caps.get(2)?;
            // 以标点开头的匹配，标点和其后的引号属于前一段描述
            let cut = caps.get(1).map_or(whole.start(), |punct| punct.end());
            Some((label.as_str(), whole.end(), cut))
        })
        .collect();

    labels
        .iter()
        .enumerate()
        .filter_map(|(i, (label, end, _))| {
            let label = label.trim();
            if label.is_empty() {
                return None;
            }
            let description_end = labels.get(i + 1).map_or(text.len(), |next| next.2);
            let description = clean_description(&text[*end..description_end]);
            Some(ErrorCategory::new(label, description))
        })
        .collect()
}

fn clean_description(text: &str) -> String {
    text.trim_matches(|c: char| c.is_whitespace() || c == '*')
        .to_string()
}

/// 两个标记之间的文本，任一标记缺失时返回 None
fn section_between(text: &str, start: &Regex, ends: &[&Regex]) -> Option<String> {
    let start = start.find(text)?;
    let rest = &text[start.end()..];
    let end = ends
        .iter()
        .filter_map(|re| re.find(rest).map(|m| m.start()))
        .min()?;
    Some(rest[..end].trim().to_string())
}

fn section_after(text: &str, start: &Regex) -> Option<String> {
    let start = start.find(text)?;
    Some(text[start.end()..].trim().to_string())
}

/// 按出现顺序识别文本中提到的维度（名称或"Competência N"）
pub fn resolve_dimensions(text: &str) -> Vec<RubricDimension> {
    let mut found: Vec<(usize, RubricDimension)> = NAME_RES
        .iter()
        .filter_map(|(dimension, re)| re.find(text).map(|m| (m.start(), *dimension)))
        .collect();

    for caps in COMPETENCY_NUMBER_RE.captures_iter(text) {
        let position = caps.get(0).map_or(0, |m| m.start());
        if let Some(dimension) = caps[1]
            .parse::<u8>()
            .ok()
            .and_then(RubricDimension::from_number)
        {
            found.push((position, dimension));
        }
    }

    found.sort_by_key(|(position, _)| *position);

    let mut dimensions = Vec::new();
    for (_, dimension) in found {
        if !dimensions.contains(&dimension) {
            dimensions.push(dimension);
        }
    }
    dimensions
}

/// 标题之后的分数：先找标题行内，再找紧随其后的一行
///
/// 返回 (原始分数, 分数在 `body` 中的结束位置)
fn find_score(body: &str) -> Option<(u64, usize)> {
    let line_end = body.find('\n').unwrap_or(body.len());
    let (caps, offset) = match INLINE_SCORE_RE.captures(&body[..line_end]) {
        Some(caps) => (caps, 0),
        None => (SCORE_RE.captures(&body[line_end..])?, line_end),
    };
    let raw = caps[1].parse::<u64>().unwrap_or(u64::MAX);
    Some((raw, offset + caps.get(0)?.end()))
}

/// 评分回复解析器（模板 v1）
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateV1Parser;

impl TemplateV1Parser {
    pub fn new() -> Self {
        Self
    }

    fn parse_dimensions(&self, reply: &str) -> BTreeMap<RubricDimension, DimensionScore> {
        let headers: Vec<(RubricDimension, usize, usize)> = HEADER_RES
            .iter()
            .filter_map(|(dimension, re)| re.find(reply).map(|m| (*dimension, m.start(), m.end())))
            .collect();

        // 维度正文在下一个标题或结束标记处截止
        let mut boundaries: Vec<usize> = headers.iter().map(|(_, start, _)| *start).collect();
        for re in [&*TOTAL_LINE_RE, &*END_RE, &*GENERAL_COMMENT_RE] {
            boundaries.extend(re.find_iter(reply).map(|m| m.start()));
        }

        let mut scores = BTreeMap::new();
        for (dimension, _, header_end) in headers {
            let body_end = boundaries
                .iter()
                .copied()
                .filter(|boundary| *boundary >= header_end)
                .min()
                .unwrap_or(reply.len());
            let body = &reply[header_end..body_end];

            let Some((raw, score_end)) = find_score(body) else {
                warn!("⚠️ 找到维度 {} 的标题，但没有识别到分数", dimension);
                continue;
            };

            let score = normalize_score(raw);
            let feedback = body[score_end..].trim().to_string();
            let errors = extract_error_pairs(&feedback);

            debug!(
                "维度 {}: 原始分 {} → {} ({} 个错误类别)",
                dimension,
                raw,
                score,
                errors.len()
            );

            scores.insert(
                dimension,
                DimensionScore {
                    dimension,
                    score,
                    feedback,
                    errors,
                },
            );
        }

        scores
    }
}

impl RubricParser for TemplateV1Parser {
    fn version(&self) -> &'static str {
        "v1"
    }

    fn parse(&self, reply: &str, essay_text: &str) -> ParsedAnalysis {
        let scores = self.parse_dimensions(reply);

        let explicit_total = TOTAL_RE
            .captures(reply)
            .and_then(|caps| caps[1].parse::<u64>().ok())
            .map(|total| total.min(u64::from(TOTAL_MAX_SCORE)) as u32);

        let total = if scores.len() == RubricDimension::ALL.len() {
            scores.values().map(|score| score.score).sum()
        } else {
            explicit_total.unwrap_or(0)
        };

        let general_comment =
            section_between(reply, &GENERAL_COMMENT_RE, &[&*WEAK_DIMENSIONS_RE]);
        let weak_text = section_between(reply, &WEAK_DIMENSIONS_RE, &[&*END_RE, &*FOLLOW_UP_RE]);
        let follow_up = section_after(reply, &FOLLOW_UP_RE);

        let weak_dimensions = weak_text
            .as_deref()
            .map(resolve_dimensions)
            .unwrap_or_default();

        let coverage = ParseCoverage {
            dimensions_found: scores.len(),
            total_found: explicit_total.is_some(),
            general_comment_found: general_comment.is_some(),
            weak_dimensions_found: weak_text.is_some(),
            follow_up_found: follow_up.is_some(),
        };

        if !coverage.is_complete() {
            warn!(
                "⚠️ 评分回复只识别到 {}/{} 个维度",
                coverage.dimensions_found,
                RubricDimension::ALL.len()
            );
        }

        ParsedAnalysis {
            analysis: EssayAnalysis {
                scores,
                total,
                general_comment: general_comment.unwrap_or_default(),
                weak_dimensions,
                follow_up_prompt: follow_up.unwrap_or_default(),
                essay_text: essay_text.to_string(),
            },
            coverage,
        }
    }
}
