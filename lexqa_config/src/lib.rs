mod schema;

pub use schema::{
    Bm25Config, Config, DatabaseConfig, ExtractorConfig, RetrievalConfig, config_dir,
};
