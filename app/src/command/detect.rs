use lexqa_config::Config;
use lexqa_core::Origin;
use lexqa_engine::mine_origin;

/// Strategy for mining questions out of one origin table.
#[derive(Debug, Clone, Copy)]
pub struct DetectStrategy;

impl super::CommandStrategy for DetectStrategy {
    type Input = Origin;

    async fn execute(&self, origin: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let store = super::open_store(&config).await?;

        let report = mine_origin(&store, origin).await?;

        println!("Scanned {} {} rows", report.rows_scanned, origin);
        println!(
            "Detected {} questions in {} rows",
            report.questions_detected, report.rows_with_questions
        );
        println!("Stored {} questions with context", report.questions_stored);
        Ok(())
    }
}
