#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use command::{
    AskInput, AskStrategy, CommandStrategy, DetectStrategy, FaqInput, FaqStrategy, ImportInput,
    ImportStrategy, IndexStrategy, InfoStrategy, InitStrategy, LabelInput, LabelStrategy,
    VersionStrategy,
};
use lexqa_core::{CorpusKind, Label, Origin};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lexqa")]
#[command(about = "Question mining and lexical question answering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Init,
    /// Show configuration and table sizes
    Info,
    /// Import a JSON array of rows into an origin table
    Import {
        kind: ImportKind,
        file: PathBuf,
    },
    /// Manage FAQ entries
    Faq {
        #[command(subcommand)]
        action: FaqAction,
    },
    /// Mine questions from an origin table
    Detect { origin: OriginArg },
    /// Rebuild lexical indexes
    Index { corpus: IndexTarget },
    /// Answer a question
    Ask {
        question: String,

        #[arg(long)]
        top_k: Option<usize>,

        #[arg(long)]
        num_faq: Option<usize>,

        #[arg(long)]
        num_questions: Option<usize>,

        #[arg(long)]
        num_docs: Option<usize>,

        /// Write the answers to the answers table
        #[arg(long)]
        store: bool,
    },
    /// Set or clear the label of a stored answer
    Label {
        answer_id: String,
        label: LabelArg,
    },
    /// Show version
    Version,
}

#[derive(Subcommand)]
enum FaqAction {
    /// Store a new FAQ entry
    Add {
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
        #[arg(long)]
        author: String,
        #[arg(long, default_value = "")]
        keywords: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ImportKind {
    Docs,
    Emails,
    Issues,
    Comments,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OriginArg {
    Email,
    Issue,
    Comment,
}

impl From<OriginArg> for Origin {
    fn from(arg: OriginArg) -> Self {
        match arg {
            OriginArg::Email => Self::Email,
            OriginArg::Issue => Self::Issue,
            OriginArg::Comment => Self::Comment,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum IndexTarget {
    Docs,
    Questions,
    Faq,
    All,
}

impl IndexTarget {
    fn corpora(self) -> Vec<CorpusKind> {
        match self {
            Self::Docs => vec![CorpusKind::Documentation],
            Self::Questions => vec![CorpusKind::Questions],
            Self::Faq => vec![CorpusKind::Faq],
            Self::All => CorpusKind::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LabelArg {
    Correct,
    Wrong,
    Unset,
}

impl From<LabelArg> for Option<Label> {
    fn from(arg: LabelArg) -> Self {
        match arg {
            LabelArg::Correct => Some(Label::Correct),
            LabelArg::Wrong => Some(Label::Wrong),
            LabelArg::Unset => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Import { kind, file } => ImportStrategy.execute(ImportInput { kind, file }).await,
        Commands::Faq {
            action:
                FaqAction::Add {
                    question,
                    answer,
                    author,
                    keywords,
                },
        } => {
            FaqStrategy
                .execute(FaqInput {
                    question,
                    answer,
                    author,
                    keywords,
                })
                .await
        }
        Commands::Detect { origin } => DetectStrategy.execute(origin.into()).await,
        Commands::Index { corpus } => IndexStrategy.execute(corpus.corpora()).await,
        Commands::Ask {
            question,
            top_k,
            num_faq,
            num_questions,
            num_docs,
            store,
        } => {
            AskStrategy
                .execute(AskInput {
                    question,
                    top_k,
                    num_faq,
                    num_questions,
                    num_docs,
                    store,
                })
                .await
        }
        Commands::Label { answer_id, label } => {
            LabelStrategy
                .execute(LabelInput {
                    answer_id,
                    label: label.into(),
                })
                .await
        }
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
