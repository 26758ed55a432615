//! REST endpoints used by [`CloudflareProvider`](super::CloudflareProvider).
//!
//! The `cloudflare` crate only ships typed endpoints for a subset of the API and
//! its `DnsRecord` cannot represent every record type, so the calls we need are
//! declared here against its `Endpoint` framework.

use cloudflare::framework::endpoint::{Endpoint, Method};
use cloudflare::framework::response::ApiResult;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::plan::RecordSpec;
use crate::provider::{Domain, Project, Record, Zone};

#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct Zones(pub Vec<Zone>);

#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct Records(pub Vec<Record>);

#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct Domains(pub Vec<Domain>);

impl ApiResult for Zones {}
impl ApiResult for Records {}
impl ApiResult for Domains {}
impl ApiResult for Record {}
impl ApiResult for Project {}
impl ApiResult for Domain {}

/// Result of calls whose payload we do not read (deletions).
#[derive(Debug, Deserialize)]
pub struct Ignored(#[allow(dead_code)] IgnoredAny);

impl ApiResult for Ignored {}

#[derive(Debug, Clone, Serialize)]
pub struct ListZonesParams {
    pub name: String,
}

/// `GET zones?name=`
pub struct ListZones {
    pub params: ListZonesParams,
}

impl Endpoint<Zones, ListZonesParams> for ListZones {
    fn method(&self) -> Method {
        Method::Get
    }
    fn path(&self) -> String {
        "zones".to_owned()
    }
    fn query(&self) -> Option<ListZonesParams> {
        Some(self.params.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListDnsRecordsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

impl ListDnsRecordsParams {
    pub fn named(name: &str, per_page: u32) -> Self {
        Self {
            name: Some(name.to_owned()),
            page: 1,
            per_page,
        }
    }

    pub fn all(per_page: u32) -> Self {
        Self {
            name: None,
            page: 1,
            per_page,
        }
    }
}

/// `GET zones/{zone}/dns_records`
pub struct ListDnsRecords<'a> {
    pub zone_identifier: &'a str,
    pub params: ListDnsRecordsParams,
}

impl<'a> Endpoint<Records, ListDnsRecordsParams> for ListDnsRecords<'a> {
    fn method(&self) -> Method {
        Method::Get
    }
    fn path(&self) -> String {
        format!("zones/{}/dns_records", self.zone_identifier)
    }
    fn query(&self) -> Option<ListDnsRecordsParams> {
        Some(self.params.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DnsRecordParams {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub proxied: bool,
    pub ttl: u32,
}

impl DnsRecordParams {
    pub fn new(spec: &RecordSpec, ttl: u32) -> Self {
        Self {
            record_type: spec.record_type.clone(),
            name: spec.name.clone(),
            content: spec.content.clone(),
            proxied: spec.proxied,
            ttl,
        }
    }
}

/// `POST zones/{zone}/dns_records`
pub struct CreateDnsRecord<'a> {
    pub zone_identifier: &'a str,
    pub params: DnsRecordParams,
}

impl<'a> Endpoint<Record, (), DnsRecordParams> for CreateDnsRecord<'a> {
    fn method(&self) -> Method {
        Method::Post
    }
    fn path(&self) -> String {
        format!("zones/{}/dns_records", self.zone_identifier)
    }
    fn body(&self) -> Option<DnsRecordParams> {
        Some(self.params.clone())
    }
}

/// `PUT zones/{zone}/dns_records/{id}`
pub struct UpdateDnsRecord<'a> {
    pub zone_identifier: &'a str,
    pub identifier: &'a str,
    pub params: DnsRecordParams,
}

impl<'a> Endpoint<Record, (), DnsRecordParams> for UpdateDnsRecord<'a> {
    fn method(&self) -> Method {
        Method::Put
    }
    fn path(&self) -> String {
        format!("zones/{}/dns_records/{}", self.zone_identifier, self.identifier)
    }
    fn body(&self) -> Option<DnsRecordParams> {
        Some(self.params.clone())
    }
}

/// `DELETE zones/{zone}/dns_records/{id}`
pub struct DeleteDnsRecord<'a> {
    pub zone_identifier: &'a str,
    pub identifier: &'a str,
}

impl<'a> Endpoint<Ignored> for DeleteDnsRecord<'a> {
    fn method(&self) -> Method {
        Method::Delete
    }
    fn path(&self) -> String {
        format!("zones/{}/dns_records/{}", self.zone_identifier, self.identifier)
    }
}

/// `GET accounts/{account}/pages/projects/{name}`
pub struct ProjectDetails<'a> {
    pub account_identifier: &'a str,
    pub project_name: &'a str,
}

impl<'a> Endpoint<Project> for ProjectDetails<'a> {
    fn method(&self) -> Method {
        Method::Get
    }
    fn path(&self) -> String {
        format!(
            "accounts/{}/pages/projects/{}",
            self.account_identifier, self.project_name
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateProjectParams {
    pub name: String,
    pub production_branch: String,
}

/// `POST accounts/{account}/pages/projects`
pub struct CreateProject<'a> {
    pub account_identifier: &'a str,
    pub params: CreateProjectParams,
}

impl<'a> Endpoint<Project, (), CreateProjectParams> for CreateProject<'a> {
    fn method(&self) -> Method {
        Method::Post
    }
    fn path(&self) -> String {
        format!("accounts/{}/pages/projects", self.account_identifier)
    }
    fn body(&self) -> Option<CreateProjectParams> {
        Some(self.params.clone())
    }
}

/// `DELETE accounts/{account}/pages/projects/{name}`
pub struct DeleteProject<'a> {
    pub account_identifier: &'a str,
    pub project_name: &'a str,
}

impl<'a> Endpoint<Ignored> for DeleteProject<'a> {
    fn method(&self) -> Method {
        Method::Delete
    }
    fn path(&self) -> String {
        format!(
            "accounts/{}/pages/projects/{}",
            self.account_identifier, self.project_name
        )
    }
}

/// `GET accounts/{account}/pages/projects/{name}/domains`
pub struct ListDomains<'a> {
    pub account_identifier: &'a str,
    pub project_name: &'a str,
}

impl<'a> Endpoint<Domains> for ListDomains<'a> {
    fn method(&self) -> Method {
        Method::Get
    }
    fn path(&self) -> String {
        format!(
            "accounts/{}/pages/projects/{}/domains",
            self.account_identifier, self.project_name
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddDomainParams {
    pub name: String,
}

/// `POST accounts/{account}/pages/projects/{name}/domains`
pub struct AddDomain<'a> {
    pub account_identifier: &'a str,
    pub project_name: &'a str,
    pub params: AddDomainParams,
}

impl<'a> Endpoint<Domain, (), AddDomainParams> for AddDomain<'a> {
    fn method(&self) -> Method {
        Method::Post
    }
    fn path(&self) -> String {
        format!(
            "accounts/{}/pages/projects/{}/domains",
            self.account_identifier, self.project_name
        )
    }
    fn body(&self) -> Option<AddDomainParams> {
        Some(self.params.clone())
    }
}

/// `DELETE accounts/{account}/pages/projects/{name}/domains/{domain}`
pub struct DeleteDomain<'a> {
    pub account_identifier: &'a str,
    pub project_name: &'a str,
    pub domain_name: &'a str,
}

impl<'a> Endpoint<Ignored> for DeleteDomain<'a> {
    fn method(&self) -> Method {
        Method::Delete
    }
    fn path(&self) -> String {
        format!(
            "accounts/{}/pages/projects/{}/domains/{}",
            self.account_identifier, self.project_name, self.domain_name
        )
    }
}
