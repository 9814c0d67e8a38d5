use lexqa_config::Config;
use lexqa_core::Faq;

#[derive(Debug, Clone)]
pub struct FaqInput {
    pub question: String,
    pub answer: String,
    pub author: String,
    pub keywords: String,
}

/// Strategy for authoring a curated FAQ entry.
#[derive(Debug, Clone, Copy)]
pub struct FaqStrategy;

impl super::CommandStrategy for FaqStrategy {
    type Input = FaqInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        if input.question.trim().is_empty() || input.answer.trim().is_empty() {
            anyhow::bail!("FAQ question and answer must not be empty");
        }
        let config = Config::load()?;
        let store = super::open_store(&config).await?;

        let entry = Faq::new(input.question, input.answer, input.author, input.keywords);
        store.insert_faq(&entry).await?;

        println!("Stored FAQ entry {}", entry.faq_id);
        println!("Run 'lexqa index faq' to make it searchable.");
        Ok(())
    }
}
