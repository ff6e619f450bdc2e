use serde::{Deserialize, Serialize};

/// 知识库片段
///
/// 用于在提示词中补充语法和写作规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub topic: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub text: String,
}

/// TOML 知识库文件的结构
///
/// ```toml
/// [[snippet]]
/// topic = "Crase"
/// keywords = ["crase", "acento grave"]
/// text = "Ocorre crase na fusão da preposição a com o artigo a."
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeFile {
    #[serde(default, rename = "snippet")]
    pub snippets: Vec<KnowledgeSnippet>,
}
