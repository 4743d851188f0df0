use thiserror::Error;

use crate::domain::ItemId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("refresh needs at least one transaction record")]
    InsufficientData,
    #[error("refresh exceeded its deadline of {deadline_ms}ms; previous snapshot kept")]
    RefreshTimeout { deadline_ms: u128 },
    #[error("item `{item_id}` is not in the catalog")]
    UnknownItem { item_id: ItemId },
    #[error("no snapshot has been published yet")]
    SnapshotUnavailable,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("refresh task failed: {0}")]
    RefreshTask(String),
}

impl EngineError {
    /// Whether the engine keeps serving its previous snapshot after this error.
    /// Every refresh rejection does, including invalid refresh parameters.
    pub fn keeps_previous_snapshot(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData
                | Self::RefreshTimeout { .. }
                | Self::RefreshTask(_)
                | Self::InvalidParameter(_)
        )
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("dataset failure: {0}")]
    Dataset(String),
}

impl ApplicationError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Engine(EngineError::InsufficientData) => "insufficient_data",
            Self::Engine(EngineError::RefreshTimeout { .. }) => "refresh_timeout",
            Self::Engine(EngineError::UnknownItem { .. }) => "unknown_item",
            Self::Engine(EngineError::SnapshotUnavailable) => "snapshot_unavailable",
            Self::Engine(EngineError::InvalidParameter(_)) => "invalid_parameter",
            Self::Engine(EngineError::RefreshTask(_)) => "refresh_task",
            Self::Configuration(_) => "config_validation",
            Self::Dataset(_) => "dataset",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Dataset(_) => 3,
            Self::Engine(EngineError::InvalidParameter(_))
            | Self::Engine(EngineError::UnknownItem { .. }) => 4,
            Self::Engine(_) => 5,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "Configuration is invalid. Check smartcart.toml and SMARTCART_* variables.",
            Self::Dataset(_) => "The transaction dataset could not be loaded.",
            Self::Engine(error) if error.keeps_previous_snapshot() => {
                "Indices were not refreshed; recommendations may be stale."
            }
            Self::Engine(_) => "The recommendation request could not be processed.",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::ItemId;
    use crate::errors::{ApplicationError, EngineError};

    #[test]
    fn refresh_failures_keep_previous_snapshot() {
        assert!(EngineError::InsufficientData.keeps_previous_snapshot());
        assert!(EngineError::RefreshTimeout { deadline_ms: 10 }.keeps_previous_snapshot());
        assert!(EngineError::InvalidParameter("min_support".to_owned()).keeps_previous_snapshot());
        assert!(!EngineError::UnknownItem { item_id: ItemId::from("X") }.keeps_previous_snapshot());
        assert!(!EngineError::SnapshotUnavailable.keeps_previous_snapshot());
    }

    #[test]
    fn engine_error_maps_to_stable_error_class() {
        let error = ApplicationError::from(EngineError::InsufficientData);

        assert_eq!(error.error_class(), "insufficient_data");
        assert_eq!(error.exit_code(), 5);
        assert_eq!(
            error.user_message(),
            "Indices were not refreshed; recommendations may be stale."
        );
    }

    #[test]
    fn configuration_error_maps_to_config_validation() {
        let error = ApplicationError::Configuration("engine.min_support".to_owned());

        assert_eq!(error.error_class(), "config_validation");
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn unknown_item_message_names_the_item() {
        let error = EngineError::UnknownItem { item_id: ItemId::from("SKU9999") };

        assert_eq!(error.to_string(), "item `SKU9999` is not in the catalog");
    }
}
