pub mod toml_loader;

pub use toml_loader::{load_knowledge, load_knowledge_file};
