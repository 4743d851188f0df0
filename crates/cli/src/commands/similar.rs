use std::path::PathBuf;

use smartcart_core::config::ConfigOverrides;
use smartcart_core::domain::Basket;
use smartcart_core::signals::{recommend_scored, SimilarityAxis};

use crate::commands::{open_session, split_ids, CommandResult};

pub fn run(
    items: Option<String>,
    dataset: Option<PathBuf>,
    top_n: Option<usize>,
    axis: Option<SimilarityAxis>,
) -> CommandResult {
    let overrides = ConfigOverrides {
        top_n_similarity: top_n,
        similarity_axis: axis,
        ..ConfigOverrides::default()
    };
    let session = match open_session(dataset, overrides) {
        Ok(session) => session,
        Err(error) => return CommandResult::from_error("similar", &error),
    };

    let basket = Basket::new(split_ids(items.as_deref()));
    let scored = recommend_scored(
        session.snapshot.similarity(),
        &basket,
        session.config.engine.top_n_similarity,
    );

    let message = format!(
        "{} items ranked against {} basket items ({:?} axis)",
        scored.len(),
        basket.len(),
        session.config.engine.similarity_axis
    );
    CommandResult::success_with("similar", message, &scored)
}
