use lexqa_config::Config;
use lexqa_core::{Answer, AnswerOrigin, AnswerRepo, CorpusKind};
use lexqa_engine::{AnswerExtractor, AnswerOrchestrator, AskOptions};
use lexqa_providers::HttpSpanExtractor;
use tracing::info;

#[derive(Debug, Clone)]
pub struct AskInput {
    pub question: String,
    /// Overrides of the configured retrieval sizes.
    pub top_k: Option<usize>,
    pub num_faq: Option<usize>,
    pub num_questions: Option<usize>,
    pub num_docs: Option<usize>,
    /// Persist the answers to the audit table.
    pub store: bool,
}

impl AskInput {
    fn options(&self, config: &Config) -> AskOptions {
        let retrieval = &config.retrieval;
        AskOptions {
            top_k: self.top_k.unwrap_or(retrieval.top_k),
            num_faq: self.num_faq.unwrap_or(retrieval.num_faq),
            num_questions: self.num_questions.unwrap_or(retrieval.num_questions),
            num_docs: self.num_docs.unwrap_or(retrieval.num_docs),
        }
    }
}

/// Strategy for answering one question.
///
/// Loads the three indexes, verifies the extraction model once, then runs
/// the full retrieval and extraction pipeline.
#[derive(Debug, Clone, Copy)]
pub struct AskStrategy;

impl super::CommandStrategy for AskStrategy {
    type Input = AskInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let store = super::open_store(&config).await?;

        let extractor =
            HttpSpanExtractor::new(&config.extractor.base_url, config.extractor.model.clone());
        extractor.verify().await?;

        let faq = super::ready_index(&config, &store, CorpusKind::Faq).await?;
        let questions = super::ready_index(&config, &store, CorpusKind::Questions).await?;
        let docs = super::ready_index(&config, &store, CorpusKind::Documentation).await?;

        let orchestrator = AnswerOrchestrator::new(
            AnswerExtractor::new(extractor, super::extractor_settings(&config)),
            faq,
            questions,
            docs,
        )?;

        let answers = orchestrator
            .get_answers(&input.question, input.options(&config))
            .await?;

        if answers.is_empty() {
            println!("No answers found.");
        }
        for (rank, answer) in answers.iter().enumerate() {
            print_answer(rank + 1, answer);
        }

        if input.store {
            for answer in &answers {
                store.insert_answer(answer).await?;
            }
            info!("Stored {} answers", answers.len());
        }
        Ok(())
    }
}

fn print_answer(rank: usize, answer: &Answer) {
    println!("{rank}. {answer}");
    println!("   id: {}  origin: {}", answer.id, answer.origin);
    if let Some(url) = answer.metadata.get("url").and_then(|v| v.as_str()) {
        println!("   source: {url}");
    }
    if answer.origin != AnswerOrigin::Documentation {
        if let Some(question) = answer.metadata.get("question").and_then(|v| v.as_str()) {
            println!("   similar question: {question}");
        }
    }
    println!();
}
