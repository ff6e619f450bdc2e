pub mod analysis;
pub mod knowledge;
pub mod loaders;
pub mod remediation;
pub mod rubric;

pub use analysis::{DimensionScore, ErrorCategory, EssayAnalysis};
pub use knowledge::{KnowledgeFile, KnowledgeSnippet};
pub use loaders::{load_knowledge, load_knowledge_file};
pub use remediation::{
    AttemptRecord, Evaluation, Exercise, ProficiencyLevel, RemediationState, Stage, Verdict,
};
pub use rubric::RubricDimension;
