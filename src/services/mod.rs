pub mod invoker;
pub mod knowledge;
pub mod prompts;
pub mod report_archive;

pub use invoker::{Backoff, InvokeError, ResilientInvoker, RetryPolicy};
pub use knowledge::{KnowledgeBase, NoKnowledge, SnippetKnowledge};
pub use report_archive::ReportArchive;
