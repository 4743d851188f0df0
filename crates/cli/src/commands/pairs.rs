use std::path::PathBuf;

use serde::Serialize;
use smartcart_core::config::ConfigOverrides;

use crate::commands::{open_session, CommandResult};

#[derive(Debug, Serialize)]
struct PairRow<'a> {
    items: [&'a str; 2],
    support: u32,
}

pub fn run(dataset: Option<PathBuf>, min_support: Option<u32>) -> CommandResult {
    let overrides = ConfigOverrides { min_support, ..ConfigOverrides::default() };
    let session = match open_session(dataset, overrides) {
        Ok(session) => session,
        Err(error) => return CommandResult::from_error("pairs", &error),
    };

    let pairs = session.snapshot.pairs();
    let mut rows: Vec<PairRow<'_>> = pairs
        .iter()
        .map(|(key, support)| PairRow { items: [key.low().as_str(), key.high().as_str()], support })
        .collect();
    rows.sort_by(|a, b| b.support.cmp(&a.support).then_with(|| a.items.cmp(&b.items)));

    let message = format!("{} pairs at min_support {}", rows.len(), pairs.min_support());
    CommandResult::success_with("pairs", message, &rows)
}
