//! Static strategy pattern for CLI commands.
//!
//! Each subcommand is a separate strategy type with its own input, so every
//! call is dispatched statically.

use lexqa_config::Config;
use lexqa_core::CorpusKind;
use lexqa_engine::{Bm25Params, ExtractorSettings, IndexSpec, LexicalIndex, Store};
use tracing::info;

mod ask;
mod detect;
mod faq;
mod import;
mod index;
mod info;
mod init;
mod label;
mod version;

pub use ask::{AskInput, AskStrategy};
pub use detect::DetectStrategy;
pub use faq::{FaqInput, FaqStrategy};
pub use import::{ImportInput, ImportStrategy};
pub use index::IndexStrategy;
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use label::{LabelInput, LabelStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Open the configured database and make sure every table exists.
async fn open_store(config: &Config) -> anyhow::Result<Store> {
    let store = Store::connect(&config.database.url)
        .await?
        .with_excluded_doc_types(config.retrieval.excluded_doc_types.clone());
    store.init_schema().await?;
    Ok(store)
}

const fn bm25_params(config: &Config) -> Bm25Params {
    Bm25Params {
        k1: config.bm25.k1,
        b: config.bm25.b,
        epsilon: config.bm25.epsilon,
    }
}

fn extractor_settings(config: &Config) -> ExtractorSettings {
    ExtractorSettings {
        params: config.extractor.params(),
        extended_answer_size: config.extractor.extended_answer_size,
        timeout: config.extractor.timeout(),
        concurrency: config.extractor.concurrency,
    }
}

fn new_index(config: &Config, kind: CorpusKind) -> LexicalIndex {
    LexicalIndex::with_params(IndexSpec::for_kind(kind), bm25_params(config))
}

/// Load the persisted index of `kind`, building it when nothing is stored yet.
async fn ready_index(config: &Config, store: &Store, kind: CorpusKind) -> anyhow::Result<LexicalIndex> {
    let mut index = new_index(config, kind);
    match index.load_index(store).await {
        Ok(()) => Ok(index),
        Err(e) => {
            info!("Rebuilding {} index: {}", kind, e);
            index.create_index(store).await?;
            Ok(index)
        }
    }
}
