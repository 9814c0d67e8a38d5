use lexqa_config::Config;
use tracing::info;

/// Strategy for displaying configuration information.
///
/// Prints the loaded configuration, then the row count of every table.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== lexqa Configuration ===\n");

        println!("Database:");
        println!("  URL: {}", mask_database_url(&config.database.url));
        println!();

        let extractor = &config.extractor;
        println!("Extractor:");
        println!("  Service: {}", extractor.base_url);
        println!("  Model: {}", extractor.model);
        println!("  Timeout: {}s", extractor.timeout_secs);
        println!("  Concurrency: {}", extractor.concurrency);
        println!("  Answers Per Passage: {}", extractor.num_answers_to_predict);
        println!("  Extended Answer Size: {}", extractor.extended_answer_size);
        println!(
            "  Max Answer/Question/Sequence Length: {}/{}/{}",
            extractor.max_answer_len, extractor.max_question_len, extractor.max_seq_len
        );
        println!("  Doc Stride: {}", extractor.doc_stride);
        println!(
            "  Impossible Answers: {}",
            extractor.handle_impossible_answer
        );
        println!();

        let retrieval = &config.retrieval;
        println!("Retrieval:");
        println!("  Top K: {}", retrieval.top_k);
        println!(
            "  FAQ/Questions/Docs: {}/{}/{}",
            retrieval.num_faq, retrieval.num_questions, retrieval.num_docs
        );
        if retrieval.excluded_doc_types.is_empty() {
            println!("  Excluded Doc Types: (none)");
        } else {
            println!(
                "  Excluded Doc Types: {}",
                retrieval.excluded_doc_types.join(", ")
            );
        }
        println!(
            "  BM25: k1={} b={} epsilon={}",
            config.bm25.k1, config.bm25.b, config.bm25.epsilon
        );
        println!();

        info!("Testing database connection");
        println!("Tables:");
        match super::open_store(&config).await {
            Ok(store) => {
                for (table, count) in store.table_counts().await? {
                    println!("  {table}: {count}");
                }
            }
            Err(e) => {
                println!("  Status: Connection failed");
                println!("  Error: {e}");
            }
        }

        Ok(())
    }
}

fn mask_database_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };

    let Some((credentials, after_at)) = rest.split_once('@') else {
        return url.to_string();
    };

    let Some((username, _password)) = credentials.split_once(':') else {
        return url.to_string();
    };

    format!("{scheme}://{username}:***@{after_at}")
}
