use crate::models::knowledge::{KnowledgeFile, KnowledgeSnippet};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从单个 TOML 文件加载知识库片段
pub async fn load_knowledge_file(toml_file_path: &Path) -> Result<Vec<KnowledgeSnippet>> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取知识库文件: {}", toml_file_path.display()))?;

    let file: KnowledgeFile = toml::from_str(&content)
        .with_context(|| format!("无法解析知识库文件: {}", toml_file_path.display()))?;

    Ok(file.snippets)
}

/// 加载知识库
///
/// `path` 可以是单个 TOML 文件，也可以是包含多个 TOML 文件的文件夹；
/// 文件夹中解析失败的文件只记录警告并跳过
pub async fn load_knowledge(path: &str) -> Result<Vec<KnowledgeSnippet>> {
    let path = PathBuf::from(path);

    if !path.exists() {
        anyhow::bail!("知识库路径不存在: {}", path.display());
    }

    if path.is_file() {
        let snippets = load_knowledge_file(&path).await?;
        tracing::info!("成功加载 {} 条知识片段", snippets.len());
        return Ok(snippets);
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&path)
        .await
        .with_context(|| format!("无法读取文件夹: {}", path.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let entry_path = entry.path();
        if entry_path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(entry_path);
        }
    }
    // 保证加载顺序稳定
    toml_files.sort();

    let mut snippets = Vec::new();
    for file in toml_files {
        tracing::info!(
            "正在加载: {}",
            file.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_knowledge_file(&file).await {
            Ok(mut loaded) => {
                tracing::info!("成功加载 {} 条知识片段", loaded.len());
                snippets.append(&mut loaded);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", file.display(), e);
            }
        }
    }

    Ok(snippets)
}
