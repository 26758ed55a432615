pub mod cloudflare;

use serde::Deserialize;

use crate::plan::RecordSpec;

/// Operations the reconciler needs from a hosting/DNS provider.
///
/// Absence is part of the return type (`None` or an empty list). Every other
/// failure is reported through `Self::Error` and is never swallowed.
#[cfg_attr(test, mockall::automock(type Error = tests::TestError;))]
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn find_zone(&self, name: &str) -> Result<Option<Zone>, Self::Error>;

    async fn list_records(&self, zone_id: &str, name: &str) -> Result<Vec<Record>, Self::Error>;
    async fn list_zone_records(&self, zone_id: &str) -> Result<Vec<Record>, Self::Error>;
    async fn create_record(&self, zone_id: &str, spec: &RecordSpec) -> Result<Record, Self::Error>;
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        spec: &RecordSpec,
    ) -> Result<Record, Self::Error>;
    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), Self::Error>;

    async fn get_project(&self, name: &str) -> Result<Option<Project>, Self::Error>;
    async fn create_project(&self, name: &str, production_branch: &str) -> Result<Project, Self::Error>;
    async fn delete_project(&self, name: &str) -> Result<(), Self::Error>;

    async fn list_domains(&self, project: &str) -> Result<Vec<Domain>, Self::Error>;
    async fn create_domain(&self, project: &str, name: &str) -> Result<Domain, Self::Error>;
    async fn delete_domain(&self, project: &str, name: &str) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    #[serde(default)]
    pub proxied: bool,
}

/// A Pages project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub subdomain: String,
    #[serde(default)]
    pub production_branch: String,
}

/// A custom domain bound to a Pages project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Domain {
    pub name: String,
    #[serde(default)]
    pub status: String,
}
