use thiserror::Error;
use tracing::{error, info};

use crate::{
    plan::{CleanupPlan, RecordSpec, SetupPlan},
    provider::{Project, Provider, Zone},
};

/// What a single reconciliation step did to the remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Unchanged,
    Created,
    Updated,
    Deleted,
}

impl Change {
    pub fn is_mutation(&self) -> bool {
        *self != Change::Unchanged
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub zone_id: String,
    pub project: Change,
    pub record: Change,
    pub domain: Change,
}

impl SetupReport {
    pub fn is_noop(&self) -> bool {
        !(self.project.is_mutation() || self.record.is_mutation() || self.domain.is_mutation())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub zone_id: String,
    pub records_deleted: usize,
    pub domains_deleted: usize,
    pub project: Change,
}

impl CleanupReport {
    pub fn is_noop(&self) -> bool {
        self.records_deleted == 0 && self.domains_deleted == 0 && !self.project.is_mutation()
    }
}

/// Outcome of tearing down a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectRemoval {
    pub domains_deleted: usize,
    pub project: Change,
}

/// Converges remote resources toward a desired configuration, one step at a time.
///
/// Every step reads before it writes, so an interrupted run can simply be
/// repeated. Only absence reported by the provider is handled; any other error
/// ends the run unchanged.
#[derive(Debug)]
pub struct Reconciler<P: Provider> {
    provider: P,
}

impl<P: Provider> Reconciler<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[tracing::instrument(skip(self))]
    pub async fn resolve_zone(&self, base_domain: &str) -> Result<Zone, ReconcileError<P::Error>> {
        info!("looking up zone for '{}'", base_domain);

        match self.provider.find_zone(base_domain).await? {
            Some(zone) => {
                info!(zone_id = %zone.id, "found zone");
                Ok(zone)
            }
            None => {
                error!("zone not found for {}, is this domain on Cloudflare?", base_domain);
                Err(ReconcileError::ZoneNotFound(base_domain.to_owned()))
            }
        }
    }

    #[tracing::instrument(skip(self, zone), fields(zone_id = %zone.id))]
    pub async fn reconcile_record(
        &self,
        zone: &Zone,
        desired: &RecordSpec,
    ) -> Result<Change, ReconcileError<P::Error>> {
        info!("checking DNS records");

        let existing = self.provider.list_records(&zone.id, &desired.name)
            .await?
            .into_iter()
            .find(|r| desired.identifies(r));

        match existing {
            Some(record) if desired.is_satisfied_by(&record) => {
                info!("DNS {} already correct: {} -> {}", desired.record_type, desired.name, desired.content);
                Ok(Change::Unchanged)
            }
            Some(record) => {
                info!(
                    "updating {}: {} -> {}",
                    desired.record_type, record.content, desired.content
                );
                self.provider.update_record(&zone.id, &record.id, desired).await?;
                info!("updated DNS {}: {} -> {}", desired.record_type, desired.name, desired.content);
                Ok(Change::Updated)
            }
            None => {
                info!("creating {}: {} -> {}", desired.record_type, desired.name, desired.content);
                self.provider.create_record(&zone.id, desired).await?;
                info!("created DNS {}: {} -> {}", desired.record_type, desired.name, desired.content);
                Ok(Change::Created)
            }
        }
    }

    /// Deletes every record in `zone` whose content contains `pattern`.
    #[tracing::instrument(skip(self, zone), fields(zone_id = %zone.id))]
    pub async fn remove_stale_records(
        &self,
        zone: &Zone,
        pattern: &str,
    ) -> Result<usize, ReconcileError<P::Error>> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(ReconcileError::InvalidPlan(
                "stale record pattern must not be empty".to_owned(),
            ));
        }

        info!("looking for records pointing at '{}'", pattern);
        let stale: Vec<_> = self.provider.list_zone_records(&zone.id)
            .await?
            .into_iter()
            .filter(|r| r.content.contains(pattern))
            .collect();

        if stale.is_empty() {
            info!("no stale records");
        }

        for record in &stale {
            info!("deleting {} {} -> {}", record.record_type, record.name, record.content);
            self.provider.delete_record(&zone.id, &record.id).await?;
        }

        Ok(stale.len())
    }

    #[tracing::instrument(skip(self))]
    pub async fn ensure_project(
        &self,
        name: &str,
        production_branch: &str,
    ) -> Result<(Project, Change), ReconcileError<P::Error>> {
        info!("checking if project '{}' exists", name);

        if let Some(project) = self.provider.get_project(name).await? {
            info!("project exists: {}", project.subdomain);
            return Ok((project, Change::Unchanged));
        }

        info!("creating project '{}'", name);
        let project = self.provider.create_project(name, production_branch).await?;
        info!("created project: {}", project.subdomain);

        Ok((project, Change::Created))
    }

    /// Deletes the project and, before it, every custom domain bound to it.
    #[tracing::instrument(skip(self))]
    pub async fn remove_project(&self, name: &str) -> Result<ProjectRemoval, ReconcileError<P::Error>> {
        info!("checking if project '{}' exists", name);

        if self.provider.get_project(name).await?.is_none() {
            info!("project '{}' does not exist", name);
            return Ok(ProjectRemoval {
                domains_deleted: 0,
                project: Change::Unchanged,
            });
        }

        let domains = self.provider.list_domains(name).await?;
        for domain in &domains {
            info!("removing custom domain '{}'", domain.name);
            self.provider.delete_domain(name, &domain.name).await?;
        }

        info!("deleting project '{}'", name);
        self.provider.delete_project(name).await?;
        info!("deleted project '{}'", name);

        Ok(ProjectRemoval {
            domains_deleted: domains.len(),
            project: Change::Deleted,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn ensure_domain(&self, project: &str, domain: &str) -> Result<Change, ReconcileError<P::Error>> {
        info!("checking Pages custom domains");

        let existing: Vec<_> = self.provider.list_domains(project)
            .await?
            .into_iter()
            .map(|d| d.name)
            .collect();
        info!(domains = ?existing, "existing domains");

        if existing.iter().any(|d| d.eq_ignore_ascii_case(domain)) {
            info!("domain '{}' already configured", domain);
            return Ok(Change::Unchanged);
        }

        info!("adding custom domain '{}'", domain);
        let added = self.provider.create_domain(project, domain).await?;
        info!("added domain: {} (status: {})", added.name, added.status);

        Ok(Change::Created)
    }

    /// Provisions the Pages project, its CNAME and its custom domain.
    pub async fn setup(&self, plan: &SetupPlan) -> Result<SetupReport, ReconcileError<P::Error>> {
        let zone = self.resolve_zone(&plan.base_domain).await?;
        let (_, project) = self.ensure_project(&plan.project_name, &plan.production_branch).await?;
        let record = self.reconcile_record(&zone, &plan.record()).await?;
        let domain = self.ensure_domain(&plan.project_name, &plan.custom_domain()).await?;

        info!("setup complete");
        info!("project url: https://{}", plan.pages_target());
        info!("custom domain: https://{}", plan.custom_domain());
        info!("next steps:");
        info!("  1. add CLOUDFLARE_API_TOKEN and CLOUDFLARE_ACCOUNT_ID to the CI secrets");
        info!("  2. push to {} to trigger a deployment", plan.production_branch);

        Ok(SetupReport {
            zone_id: zone.id,
            project,
            record,
            domain,
        })
    }

    /// Tears down the Pages project and any records still pointing at it.
    pub async fn cleanup(&self, plan: &CleanupPlan) -> Result<CleanupReport, ReconcileError<P::Error>> {
        let zone = self.resolve_zone(&plan.base_domain).await?;
        let records_deleted = self.remove_stale_records(&zone, &plan.stale_pattern()).await?;
        let removal = self.remove_project(&plan.project_name).await?;

        info!(
            records_deleted,
            domains_deleted = removal.domains_deleted,
            "cleanup complete, DNS for {} is left to the replacement deployment",
            plan.base_domain
        );

        Ok(CleanupReport {
            zone_id: zone.id,
            records_deleted,
            domains_deleted: removal.domains_deleted,
            project: removal.project,
        })
    }
}

/// Ends a run the way the entry points report it.
///
/// A missing zone aborts the run early but is not a failure of the process:
/// the reconciler has already logged it and nothing was mutated. Every other
/// error is handed back unchanged.
pub fn finish_run<T, E>(result: Result<T, ReconcileError<E>>) -> Result<Option<T>, ReconcileError<E>>
where
    E: std::error::Error + 'static,
{
    match result {
        Ok(report) => Ok(Some(report)),
        Err(ReconcileError::ZoneNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError<E: std::error::Error + 'static> {
    #[error("zone not found for {0}")]
    ZoneNotFound(String),
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    #[error(transparent)]
    Provider(#[from] E),
}
