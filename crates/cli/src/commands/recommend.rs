use std::path::PathBuf;

use smartcart_core::config::ConfigOverrides;
use smartcart_core::domain::{Basket, UserHistory};
use smartcart_core::errors::ApplicationError;

use crate::commands::{open_session, split_ids, CommandResult};

#[derive(Debug, Clone, Default)]
pub struct RecommendArgs {
    pub history: Option<String>,
    pub basket: Option<String>,
    pub dataset: Option<PathBuf>,
    pub habit_threshold: Option<u32>,
    pub strict: bool,
}

pub fn run(args: RecommendArgs) -> CommandResult {
    match execute(args) {
        Ok(result) => result,
        Err(error) => CommandResult::from_error("recommend", &error),
    }
}

fn execute(args: RecommendArgs) -> Result<CommandResult, ApplicationError> {
    let overrides =
        ConfigOverrides { habit_threshold: args.habit_threshold, ..ConfigOverrides::default() };
    let session = open_session(args.dataset, overrides)?;

    let history = UserHistory::new(split_ids(args.history.as_deref()));
    let basket = Basket::new(split_ids(args.basket.as_deref()));

    if args.strict {
        session.engine.validate_basket(&basket)?;
    }

    let result = session.engine.recommend(&history, &basket)?;
    let message = format!(
        "{} suggestions from snapshot epoch {}",
        result.all_items().len(),
        result.epoch
    );
    Ok(CommandResult::success_with("recommend", message, &result))
}
