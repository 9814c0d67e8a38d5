use lexqa_config::Config;

/// Strategy for initializing the configuration.
///
/// Creates the default configuration file at `~/lexqa/config.json`.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let path = Config::create_config()?;

        println!("Created config file at: {}", path.display());
        println!();
        println!("Next steps:");
        println!("   1. Point extractor.base_url at a running extraction service");
        println!("   2. Run 'lexqa import docs <file.json>' to load documentation");
        println!("   3. Run 'lexqa index all' and then 'lexqa ask \"<question>\"'");
        Ok(())
    }
}
