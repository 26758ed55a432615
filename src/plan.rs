use serde::Deserialize;

use crate::provider::Record;

pub const DEFAULT_PROJECT_NAME: &str = "agent-in-a-browser";
pub const DEFAULT_BASE_DOMAIN: &str = "atxconsulting.com";
pub const DEFAULT_SUBDOMAIN: &str = "agent";
pub const DEFAULT_PRODUCTION_BRANCH: &str = "main";
pub const DEFAULT_CLEANUP_BASE_DOMAIN: &str = "agentinabrowser.com";

const PAGES_SUFFIX: &str = "pages.dev";

/// Desired DNS record, compared against what the zone holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSpec {
    pub name: String,
    pub record_type: String,
    pub content: String,
    pub proxied: bool,
}

impl RecordSpec {
    pub fn cname(name: impl Into<String>, target: impl Into<String>, proxied: bool) -> Self {
        Self {
            name: name.into(),
            record_type: "CNAME".to_owned(),
            content: target.into(),
            proxied,
        }
    }

    /// Whether `record` is the one this describes (same type and name).
    pub fn identifies(&self, record: &Record) -> bool {
        record.record_type.eq_ignore_ascii_case(&self.record_type)
            && record.name.eq_ignore_ascii_case(&self.name)
    }

    /// Whether `record` already carries the desired value.
    pub fn is_satisfied_by(&self, record: &Record) -> bool {
        record.content == self.content && record.proxied == self.proxied
    }
}

/// Pages project, CNAME and custom domain to provision.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SetupPlan {
    pub project_name: String,
    pub production_branch: String,
    pub base_domain: String,
    pub subdomain: String,
    pub proxied: bool,
}

impl Default for SetupPlan {
    fn default() -> Self {
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_owned(),
            production_branch: DEFAULT_PRODUCTION_BRANCH.to_owned(),
            base_domain: DEFAULT_BASE_DOMAIN.to_owned(),
            subdomain: DEFAULT_SUBDOMAIN.to_owned(),
            proxied: true,
        }
    }
}

impl SetupPlan {
    pub fn custom_domain(&self) -> String {
        format!("{}.{}", self.subdomain, self.base_domain)
    }

    pub fn pages_target(&self) -> String {
        pages_target(&self.project_name)
    }

    pub fn record(&self) -> RecordSpec {
        RecordSpec::cname(self.custom_domain(), self.pages_target(), self.proxied)
    }
}

/// Old configuration to tear down.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleanupPlan {
    pub project_name: String,
    pub base_domain: String,
    /// Records whose content contains this substring are deleted.
    /// Defaults to the project's `pages.dev` hostname.
    pub stale_pattern: Option<String>,
}

impl Default for CleanupPlan {
    fn default() -> Self {
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_owned(),
            base_domain: DEFAULT_CLEANUP_BASE_DOMAIN.to_owned(),
            stale_pattern: None,
        }
    }
}

impl CleanupPlan {
    pub fn stale_pattern(&self) -> String {
        self.stale_pattern
            .clone()
            .unwrap_or_else(|| pages_target(&self.project_name))
    }
}

fn pages_target(project: &str) -> String {
    format!("{project}.{PAGES_SUFFIX}")
}
