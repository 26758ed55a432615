mod endpoints;

use cloudflare::framework::async_api::{ApiClient, Client};
use cloudflare::framework::auth::Credentials;
use cloudflare::framework::response::ApiFailure;
use cloudflare::framework::{Environment, HttpApiClientConfig};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use self::endpoints::{
    AddDomain, AddDomainParams, CreateDnsRecord, CreateProject, CreateProjectParams,
    DeleteDnsRecord, DeleteDomain, DeleteProject, DnsRecordParams, ListDnsRecords,
    ListDnsRecordsParams, ListDomains, ListZones, ListZonesParams, ProjectDetails,
    UpdateDnsRecord,
};
use super::{Domain, Project, Record, Zone};
use crate::plan::RecordSpec;

/// Cloudflare's "automatic" TTL, which proxied records always use.
const DEFAULT_TTL: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 5000;

pub struct CloudflareProvider {
    account_id: String,

    client: Client,

    ttl: u32,
    page_size: u32,
}

impl CloudflareProvider {
    pub fn new(
        creds: Credentials,
        account_id: String,
        environment: Environment,
    ) -> Result<Self, CloudflareError> {
        let client = Client::new(creds, HttpApiClientConfig::default(), environment)
            .map_err(|e| match e.downcast::<reqwest::Error>() {
                Ok(e) => CloudflareError::NewClientError(e),
                Err(e) => CloudflareError::ClientSetup(e.to_string()),
            })?;

        Ok(Self {
            account_id,
            client,
            ttl: DEFAULT_TTL,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn ttl_mut(&mut self) -> &mut u32 { &mut self.ttl }
    pub fn page_size_mut(&mut self) -> &mut u32 { &mut self.page_size }

    /// Walks every page; a short page is the last one.
    async fn records(&self, zone_id: &str, mut params: ListDnsRecordsParams) -> Result<Vec<Record>, CloudflareError> {
        let mut records = Vec::new();

        loop {
            let request = ListDnsRecords {
                zone_identifier: zone_id,
                params: params.clone(),
            };
            let page = self.client.request(&request).await?.result.0;
            let full = !page.is_empty() && page.len() >= params.per_page as usize;
            debug!("got {} records on page {}", page.len(), params.page);
            records.extend(page);

            if !full {
                return Ok(records);
            }
            params.page += 1;
        }
    }
}

#[async_trait::async_trait]
impl super::Provider for CloudflareProvider {
    type Error = CloudflareError;

    #[tracing::instrument(skip(self))]
    async fn find_zone(&self, name: &str) -> Result<Option<Zone>, Self::Error> {
        let request = ListZones {
            params: ListZonesParams { name: name.to_owned() },
        };
        let zones = self.client.request(&request).await?.result.0;
        debug!("got {} zones named {}", zones.len(), name);

        Ok(zones.into_iter().next())
    }

    #[tracing::instrument(skip(self))]
    async fn list_records(&self, zone_id: &str, name: &str) -> Result<Vec<Record>, Self::Error> {
        self.records(zone_id, ListDnsRecordsParams::named(name, self.page_size)).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_zone_records(&self, zone_id: &str) -> Result<Vec<Record>, Self::Error> {
        self.records(zone_id, ListDnsRecordsParams::all(self.page_size)).await
    }

    #[tracing::instrument(skip(self))]
    async fn create_record(&self, zone_id: &str, spec: &RecordSpec) -> Result<Record, Self::Error> {
        let request = CreateDnsRecord {
            zone_identifier: zone_id,
            params: DnsRecordParams::new(spec, self.ttl),
        };
        Ok(self.client.request(&request).await?.result)
    }

    #[tracing::instrument(skip(self))]
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        spec: &RecordSpec,
    ) -> Result<Record, Self::Error> {
        let request = UpdateDnsRecord {
            zone_identifier: zone_id,
            identifier: record_id,
            params: DnsRecordParams::new(spec, self.ttl),
        };
        Ok(self.client.request(&request).await?.result)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), Self::Error> {
        let request = DeleteDnsRecord {
            zone_identifier: zone_id,
            identifier: record_id,
        };
        self.client.request(&request).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_project(&self, name: &str) -> Result<Option<Project>, Self::Error> {
        let request = ProjectDetails {
            account_identifier: &self.account_id,
            project_name: name,
        };
        match self.client.request(&request).await {
            Ok(response) => Ok(Some(response.result)),
            Err(ApiFailure::Error(StatusCode::NOT_FOUND, errors)) => {
                debug!(?errors, "project {} not found", name);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn create_project(&self, name: &str, production_branch: &str) -> Result<Project, Self::Error> {
        let request = CreateProject {
            account_identifier: &self.account_id,
            params: CreateProjectParams {
                name: name.to_owned(),
                production_branch: production_branch.to_owned(),
            },
        };
        Ok(self.client.request(&request).await?.result)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_project(&self, name: &str) -> Result<(), Self::Error> {
        let request = DeleteProject {
            account_identifier: &self.account_id,
            project_name: name,
        };
        self.client.request(&request).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_domains(&self, project: &str) -> Result<Vec<Domain>, Self::Error> {
        let request = ListDomains {
            account_identifier: &self.account_id,
            project_name: project,
        };
        Ok(self.client.request(&request).await?.result.0)
    }

    #[tracing::instrument(skip(self))]
    async fn create_domain(&self, project: &str, name: &str) -> Result<Domain, Self::Error> {
        let request = AddDomain {
            account_identifier: &self.account_id,
            project_name: project,
            params: AddDomainParams { name: name.to_owned() },
        };
        Ok(self.client.request(&request).await?.result)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_domain(&self, project: &str, name: &str) -> Result<(), Self::Error> {
        let request = DeleteDomain {
            account_identifier: &self.account_id,
            project_name: project,
            domain_name: name,
        };
        self.client.request(&request).await?;

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CloudflareError {
    #[error(transparent)]
    NewClientError(#[from] reqwest::Error),
    #[error("failed to build api client: {0}")]
    ClientSetup(String),
    #[error(transparent)]
    ApiError(#[from] ApiFailure),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use httptest::matchers::*;
    use httptest::responders::*;
    use httptest::{Expectation, Server};
    use serde_json::json;
    use url::Url;

    const ACCOUNT: &str = "acc-1";

    fn provider(server: &Server) -> CloudflareProvider {
        let base = Url::parse(&server.url_str("/client/v4/")).unwrap();
        CloudflareProvider::new(
            Credentials::UserAuthToken { token: "secret".to_owned() },
            ACCOUNT.to_owned(),
            Environment::Custom(base),
        )
        .unwrap()
    }

    fn success(result: serde_json::Value) -> impl Responder {
        json_encoded(json!({
            "success": true,
            "errors": [],
            "messages": [],
            "result": result,
        }))
    }

    fn failure(status: u16, code: u32, message: &str) -> impl Responder {
        let body = json!({
            "success": false,
            "errors": [{ "code": code, "message": message }],
            "messages": [],
            "result": null,
        });
        status_code(status)
            .insert_header("Content-Type", "application/json")
            .body(body.to_string())
    }

    #[tokio::test]
    async fn find_zone_returns_first_match() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/client/v4/zones"),
                request::query(url_decoded(contains(("name", "example.com")))),
            ])
            .respond_with(success(json!([{ "id": "zone-1", "name": "example.com", "status": "active" }]))),
        );

        let zone = provider(&server).find_zone("example.com").await.unwrap();
        assert_eq!(
            zone,
            Some(Zone { id: "zone-1".to_owned(), name: "example.com".to_owned() })
        );
    }

    #[tokio::test]
    async fn find_zone_with_no_results_is_none() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/client/v4/zones"))
                .respond_with(success(json!([]))),
        );

        let zone = provider(&server).find_zone("missing.com").await.unwrap();
        assert!(zone.is_none());
    }

    #[tokio::test]
    async fn list_records_filters_by_name() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/client/v4/zones/zone-1/dns_records"),
                request::query(url_decoded(contains(("name", "agent.example.com")))),
            ])
            .respond_with(success(json!([{
                "id": "rec-1",
                "zone_id": "zone-1",
                "name": "agent.example.com",
                "type": "CNAME",
                "content": "app.pages.dev",
                "proxied": true,
                "ttl": 1,
            }]))),
        );

        let records = provider(&server)
            .list_records("zone-1", "agent.example.com")
            .await
            .unwrap();
        assert_eq!(
            records,
            vec![Record {
                id: "rec-1".to_owned(),
                name: "agent.example.com".to_owned(),
                record_type: "CNAME".to_owned(),
                content: "app.pages.dev".to_owned(),
                proxied: true,
            }]
        );
    }

    #[tokio::test]
    async fn zone_records_include_types_without_proxy_flag() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/client/v4/zones/zone-1/dns_records"))
                .respond_with(success(json!([
                    { "id": "a", "name": "example.com", "type": "CAA", "content": "0 issue \"letsencrypt.org\"" },
                    { "id": "b", "name": "www.example.com", "type": "CNAME", "content": "app.pages.dev", "proxied": false },
                ]))),
        );

        let records = provider(&server).list_zone_records("zone-1").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record_type, "CAA");
        assert!(!records[0].proxied);
    }

    #[tokio::test]
    async fn zone_records_are_read_across_pages() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/client/v4/zones/zone-1/dns_records"),
                request::query(url_decoded(contains(("page", "1")))),
                request::query(url_decoded(contains(("per_page", "2")))),
            ])
            .respond_with(success(json!([
                { "id": "a", "name": "a.example.com", "type": "CNAME", "content": "app.pages.dev" },
                { "id": "b", "name": "b.example.com", "type": "A", "content": "192.0.2.1" },
            ]))),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/client/v4/zones/zone-1/dns_records"),
                request::query(url_decoded(contains(("page", "2")))),
            ])
            .respond_with(success(json!([
                { "id": "c", "name": "c.example.com", "type": "CNAME", "content": "app.pages.dev" },
            ]))),
        );

        let mut provider = provider(&server);
        *provider.page_size_mut() = 2;
        let ids: Vec<_> = provider.list_zone_records("zone-1")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn create_record_sends_desired_tuple() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/client/v4/zones/zone-1/dns_records"),
                request::body(json_decoded(eq(json!({
                    "type": "CNAME",
                    "name": "agent.example.com",
                    "content": "app.pages.dev",
                    "proxied": true,
                    "ttl": 1,
                })))),
            ])
            .respond_with(success(json!({
                "id": "rec-9",
                "name": "agent.example.com",
                "type": "CNAME",
                "content": "app.pages.dev",
                "proxied": true,
            }))),
        );

        let spec = RecordSpec::cname("agent.example.com", "app.pages.dev", true);
        let record = provider(&server).create_record("zone-1", &spec).await.unwrap();
        assert_eq!(record.id, "rec-9");
    }

    #[tokio::test]
    async fn update_record_puts_to_record_id() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PUT", "/client/v4/zones/zone-1/dns_records/rec-1"),
                request::body(json_decoded(eq(json!({
                    "type": "CNAME",
                    "name": "agent.example.com",
                    "content": "app.pages.dev",
                    "proxied": true,
                    "ttl": 1,
                })))),
            ])
            .respond_with(success(json!({
                "id": "rec-1",
                "name": "agent.example.com",
                "type": "CNAME",
                "content": "app.pages.dev",
                "proxied": true,
            }))),
        );

        let spec = RecordSpec::cname("agent.example.com", "app.pages.dev", true);
        provider(&server).update_record("zone-1", "rec-1", &spec).await.unwrap();
    }

    #[tokio::test]
    async fn delete_record_ignores_payload() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("DELETE", "/client/v4/zones/zone-1/dns_records/rec-1"))
                .respond_with(success(json!({ "id": "rec-1" }))),
        );

        provider(&server).delete_record("zone-1", "rec-1").await.unwrap();
    }

    #[tokio::test]
    async fn missing_project_is_none() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/client/v4/accounts/acc-1/pages/projects/app",
            ))
            .respond_with(failure(404, 8000007, "Project not found.")),
        );

        let project = provider(&server).get_project("app").await.unwrap();
        assert!(project.is_none());
    }

    #[tokio::test]
    async fn forbidden_project_lookup_is_an_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/client/v4/accounts/acc-1/pages/projects/app",
            ))
            .respond_with(failure(403, 10000, "Authentication error")),
        );

        let err = provider(&server).get_project("app").await.unwrap_err();
        assert!(matches!(
            err,
            CloudflareError::ApiError(ApiFailure::Error(StatusCode::FORBIDDEN, _))
        ));
    }

    #[tokio::test]
    async fn create_project_uses_production_branch() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/client/v4/accounts/acc-1/pages/projects"),
                request::body(json_decoded(eq(json!({
                    "name": "app",
                    "production_branch": "main",
                })))),
            ])
            .respond_with(success(json!({
                "id": "p-1",
                "name": "app",
                "subdomain": "app.pages.dev",
                "production_branch": "main",
            }))),
        );

        let project = provider(&server).create_project("app", "main").await.unwrap();
        assert_eq!(project.subdomain, "app.pages.dev");
    }

    #[tokio::test]
    async fn delete_project_accepts_null_result() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "DELETE",
                "/client/v4/accounts/acc-1/pages/projects/app",
            ))
            .respond_with(success(json!(null))),
        );

        provider(&server).delete_project("app").await.unwrap();
    }

    #[tokio::test]
    async fn domains_are_listed_added_and_deleted() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/client/v4/accounts/acc-1/pages/projects/app/domains",
            ))
            .respond_with(success(json!([{ "id": "d-1", "name": "agent.example.com", "status": "active" }]))),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/client/v4/accounts/acc-1/pages/projects/app/domains"),
                request::body(json_decoded(eq(json!({ "name": "www.example.com" })))),
            ])
            .respond_with(success(json!({ "id": "d-2", "name": "www.example.com", "status": "pending" }))),
        );
        server.expect(
            Expectation::matching(request::method_path(
                "DELETE",
                "/client/v4/accounts/acc-1/pages/projects/app/domains/agent.example.com",
            ))
            .respond_with(success(json!(null))),
        );

        let provider = provider(&server);
        let domains = provider.list_domains("app").await.unwrap();
        assert_eq!(
            domains,
            vec![Domain { name: "agent.example.com".to_owned(), status: "active".to_owned() }]
        );

        let added = provider.create_domain("app", "www.example.com").await.unwrap();
        assert_eq!(added.status, "pending");

        provider.delete_domain("app", "agent.example.com").await.unwrap();
    }
}
