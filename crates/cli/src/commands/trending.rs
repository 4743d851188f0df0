use std::path::PathBuf;

use smartcart_core::config::ConfigOverrides;

use crate::commands::{open_session, CommandResult};

pub fn run(dataset: Option<PathBuf>, top_n: Option<usize>) -> CommandResult {
    let overrides = ConfigOverrides { top_n_trending: top_n, ..ConfigOverrides::default() };
    match open_session(dataset, overrides) {
        Ok(session) => {
            let ranking = session.snapshot.trending();
            CommandResult::success_with(
                "trending",
                format!("top {} items by baseline demand", ranking.len()),
                ranking,
            )
        }
        Err(error) => CommandResult::from_error("trending", &error),
    }
}
