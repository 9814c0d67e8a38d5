use lexqa_config::Config;
use lexqa_core::{AnswerRepo, Label};
use tracing::info;

#[derive(Debug, Clone)]
pub struct LabelInput {
    pub answer_id: String,
    /// `None` clears the label.
    pub label: Option<Label>,
}

/// Strategy for recording feedback on a stored answer.
#[derive(Debug, Clone, Copy)]
pub struct LabelStrategy;

impl super::CommandStrategy for LabelStrategy {
    type Input = LabelInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let store = super::open_store(&config).await?;

        if !store.update_label(&input.answer_id, input.label).await? {
            return Err(lexqa_core::Error::UnknownAnswer(input.answer_id).into());
        }

        info!("Answer {} labeled", input.answer_id);
        match input.label {
            Some(label) => println!("Answer {} marked {:?}", input.answer_id, label),
            None => println!("Label of answer {} cleared", input.answer_id),
        }
        Ok(())
    }
}
