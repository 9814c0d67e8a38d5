use lexqa_config::Config;
use lexqa_core::CorpusKind;

/// Strategy for rebuilding the persisted indexes of the given corpora.
#[derive(Debug, Clone, Copy)]
pub struct IndexStrategy;

impl super::CommandStrategy for IndexStrategy {
    type Input = Vec<CorpusKind>;

    async fn execute(&self, corpora: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let store = super::open_store(&config).await?;

        for kind in corpora {
            let mut index = super::new_index(&config, kind);
            index.create_index(&store).await?;
            println!("Indexed {} {} rows", index.len(), kind);
        }
        Ok(())
    }
}
