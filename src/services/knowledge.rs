//! 知识检索 - 业务能力层
//!
//! 为提示词补充语法和写作规则。核心只依赖 `KnowledgeBase`，
//! 不关心索引和相似度的实现方式

use async_trait::async_trait;
use tracing::debug;

use crate::models::KnowledgeSnippet;

/// 知识检索能力
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// 返回与查询相关的上下文片段，没有时返回空列表
    async fn context_for(&self, query: &str) -> Vec<String>;
}

/// 不提供任何上下文
#[derive(Debug, Default, Clone, Copy)]
pub struct NoKnowledge;

#[async_trait]
impl KnowledgeBase for NoKnowledge {
    async fn context_for(&self, _query: &str) -> Vec<String> {
        Vec::new()
    }
}

/// 基于关键词命中数的片段检索
///
/// 主题或关键词（忽略大小写）出现在查询中即算命中，
/// 按命中数降序取前 `top_k` 条，同分保持加载顺序
#[derive(Debug, Clone)]
pub struct SnippetKnowledge {
    snippets: Vec<KnowledgeSnippet>,
    top_k: usize,
}

impl SnippetKnowledge {
    pub fn new(snippets: Vec<KnowledgeSnippet>) -> Self {
        Self { snippets, top_k: 3 }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    fn hits(snippet: &KnowledgeSnippet, query: &str) -> usize {
        std::iter::once(&snippet.topic)
            .chain(snippet.keywords.iter())
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty() && query.contains(term.as_str()))
            .count()
    }
}

#[async_trait]
impl KnowledgeBase for SnippetKnowledge {
    async fn context_for(&self, query: &str) -> Vec<String> {
        let query = query.to_lowercase();

        let mut ranked: Vec<(usize, &KnowledgeSnippet)> = self
            .snippets
            .iter()
            .map(|snippet| (Self::hits(snippet, &query), snippet))
            .filter(|(hits, _)| *hits > 0)
            .collect();
        // sort_by 是稳定排序，同分保持原顺序
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        debug!("知识库命中 {} 条片段", ranked.len());

        ranked
            .into_iter()
            .take(self.top_k)
            .map(|(_, snippet)| format!("{}: {}", snippet.topic, snippet.text.trim()))
            .collect()
    }
}
