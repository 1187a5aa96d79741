use async_trait::async_trait;
use serde::Serialize;

use crate::error::ImportError;
use crate::types::FixtureId;

/// What the result-import collaborator needs to pull the rubbers of one
/// completed fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultImportRequest {
    pub fixture_id: FixtureId,
    pub result_id: String,
    pub home_label: String,
    pub away_label: String,
}

#[async_trait]
pub trait ResultImporter: Send + Sync {
    /// Imports the match results and returns the number of rubbers stored.
    async fn import(&self, request: &ResultImportRequest) -> Result<u32, ImportError>;
}
