//! Service catalog built from a token payload.
//!
//! V2 catalogs list one object per endpoint with a `<interface>URL` key per
//! interface; V3 catalogs list one object per interface. Both are normalised
//! to the V3 shape before filtering.

use serde_json::{Map, Value};
use tracing::debug;

use crate::access::RawToken;
use crate::error::{AccessError, Result};

pub mod endpoint;

pub use endpoint::{EndpointData, EndpointFilter, DEFAULT_INTERFACE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    V2,
    V3,
}

/// Service entry in normalised form
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogService {
    pub service_type: String,
    pub name: Option<String>,
    pub id: Option<String>,
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEndpoint {
    pub interface: Option<String>,
    pub url: Option<String>,
    pub region_name: Option<String>,
    pub id: Option<String>,
    pub raw_endpoint: Value,
}

/// Endpoints grouped by service type, in catalog order.
pub type EndpointGroups<T> = Vec<(String, Vec<T>)>;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCatalog {
    format: CatalogFormat,
    catalog: Vec<Value>,
}

impl ServiceCatalog {
    pub fn new(format: CatalogFormat, catalog: Vec<Value>) -> Self {
        Self { format, catalog }
    }

    /// Catalog from the `serviceCatalog` field of a V2 payload.
    pub fn from_v2(raw: &RawToken) -> Self {
        Self::new(CatalogFormat::V2, catalog_entries(raw.get("serviceCatalog")))
    }

    /// Catalog from the `catalog` field of a V3 payload.
    pub fn from_v3(raw: &RawToken) -> Self {
        Self::new(CatalogFormat::V3, catalog_entries(raw.get("catalog")))
    }

    pub fn format(&self) -> CatalogFormat {
        self.format
    }

    /// Raw catalog content, mostly useful for debugging.
    pub fn catalog(&self) -> &[Value] {
        &self.catalog
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Translate an interface name into this catalog's spelling, so V2 and V3
    /// callers can use either `public` or `publicURL`.
    pub fn normalize_interface(&self, interface: &str) -> String {
        match self.format {
            CatalogFormat::V2 if !interface.is_empty() && !interface.contains("URL") => {
                format!("{interface}URL")
            }
            CatalogFormat::V2 => interface.to_owned(),
            CatalogFormat::V3 => interface
                .trim_end_matches(|c| matches!(c, 'U' | 'R' | 'L'))
                .to_owned(),
        }
    }

    /// Catalog in V3 shape. Services without a `type` are dropped.
    pub fn normalize_catalog(&self) -> Vec<CatalogService> {
        let mut services = Vec::with_capacity(self.catalog.len());
        for service in &self.catalog {
            let Some(service_type) = service.get("type").and_then(Value::as_str) else {
                debug!("skipping catalog entry without a type");
                continue;
            };
            let endpoints = service
                .get("endpoints")
                .and_then(Value::as_array)
                .map(|endpoints| self.normalize_endpoints(endpoints))
                .unwrap_or_default();

            services.push(CatalogService {
                service_type: service_type.to_owned(),
                name: string_field(service, "name"),
                id: string_field(service, "id"),
                endpoints,
            });
        }
        services
    }

    fn normalize_endpoints(&self, endpoints: &[Value]) -> Vec<CatalogEndpoint> {
        let mut normalized = Vec::with_capacity(endpoints.len());
        for raw_endpoint in endpoints {
            let Some(fields) = raw_endpoint.as_object() else {
                continue;
            };
            match self.format {
                CatalogFormat::V2 => {
                    for (key, url) in fields.iter().filter(|(key, _)| key.ends_with("URL")) {
                        normalized.push(CatalogEndpoint {
                            interface: Some(self.normalize_interface(key)),
                            url: url.as_str().map(str::to_owned),
                            region_name: region_of(fields),
                            id: string_field(raw_endpoint, "id"),
                            raw_endpoint: raw_endpoint.clone(),
                        });
                    }
                }
                CatalogFormat::V3 => normalized.push(CatalogEndpoint {
                    interface: string_field(raw_endpoint, "interface"),
                    url: string_field(raw_endpoint, "url"),
                    region_name: region_of(fields),
                    id: string_field(raw_endpoint, "id"),
                    raw_endpoint: raw_endpoint.clone(),
                }),
            }
        }
        normalized
    }

    /// Matching endpoints grouped by service type.
    ///
    /// Service name and id filters only apply to catalog entries that carry a
    /// name or id; older catalogs lack them.
    pub fn endpoints_data(&self, filter: &EndpointFilter) -> EndpointGroups<EndpointData> {
        let interfaces: Vec<String> = filter
            .interfaces
            .iter()
            .map(|interface| self.normalize_interface(interface))
            .collect();

        let mut groups: EndpointGroups<EndpointData> = Vec::new();
        for service in self.normalize_catalog() {
            if filter.service_type.as_ref().is_some_and(|t| *t != service.service_type) {
                continue;
            }
            if mismatch(filter.service_name.as_deref(), service.name.as_deref()) {
                continue;
            }
            if mismatch(filter.service_id.as_deref(), service.id.as_deref()) {
                continue;
            }

            let index = match groups.iter().position(|(t, _)| *t == service.service_type) {
                Some(index) => index,
                None => {
                    groups.push((service.service_type.clone(), Vec::new()));
                    groups.len() - 1
                }
            };

            for endpoint in &service.endpoints {
                if !interfaces.is_empty()
                    && !endpoint
                        .interface
                        .as_ref()
                        .is_some_and(|interface| interfaces.contains(interface))
                {
                    continue;
                }
                if filter.region_name.is_some() && filter.region_name != endpoint.region_name {
                    continue;
                }
                if filter.endpoint_id.is_some() && filter.endpoint_id != endpoint.id {
                    continue;
                }
                let Some(url) = endpoint.url.as_ref().filter(|url| !url.is_empty()) else {
                    continue;
                };

                if let Some((_, matches)) = groups.get_mut(index) {
                    matches.push(EndpointData {
                        url: url.clone(),
                        service_type: service.service_type.clone(),
                        service_name: service.name.clone(),
                        service_id: service.id.clone(),
                        interface: endpoint.interface.clone(),
                        region_name: endpoint.region_name.clone(),
                        endpoint_id: endpoint.id.clone(),
                        raw_endpoint: endpoint.raw_endpoint.clone(),
                    });
                }
            }
        }

        if interfaces.is_empty() {
            return groups;
        }

        groups
            .into_iter()
            .map(|(service_type, matches)| {
                let best = interfaces.iter().find(|interface| {
                    matches
                        .iter()
                        .any(|m| m.interface.as_ref() == Some(*interface))
                });
                let kept = match best {
                    Some(best) => matches
                        .into_iter()
                        .filter(|m| m.interface.as_ref() == Some(best))
                        .collect(),
                    None => Vec::new(),
                };
                (service_type, kept)
            })
            .collect()
    }

    /// Matching endpoints as they appeared in the catalog, grouped by type.
    pub fn endpoints(&self, filter: &EndpointFilter) -> EndpointGroups<Value> {
        self.endpoints_data(filter)
            .into_iter()
            .map(|(service_type, matches)| {
                let mut raw: Vec<Value> = Vec::with_capacity(matches.len());
                for endpoint in matches {
                    // a v2 endpoint appears once per interface it lists
                    if self.format == CatalogFormat::V2 && raw.contains(&endpoint.raw_endpoint) {
                        continue;
                    }
                    raw.push(endpoint.raw_endpoint);
                }
                (service_type, raw)
            })
            .collect()
    }

    pub fn endpoint_data_list(&self, filter: &EndpointFilter) -> Vec<EndpointData> {
        self.endpoints_data(filter)
            .into_iter()
            .flat_map(|(_, matches)| matches)
            .collect()
    }

    pub fn urls(&self, filter: &EndpointFilter) -> Vec<String> {
        self.endpoint_data_list(filter)
            .into_iter()
            .map(|endpoint| endpoint.url)
            .collect()
    }

    /// First matching endpoint.
    ///
    /// Fails with [`AccessError::EmptyCatalog`] when the catalog has no
    /// entries and [`AccessError::EndpointNotFound`] when nothing matches.
    pub fn endpoint_data_for(&self, filter: &EndpointFilter) -> Result<EndpointData> {
        if self.is_empty() {
            return Err(AccessError::EmptyCatalog);
        }
        self.endpoint_data_list(filter)
            .into_iter()
            .next()
            .ok_or_else(|| AccessError::EndpointNotFound(filter.not_found_message()))
    }

    pub fn url_for(&self, filter: &EndpointFilter) -> Result<String> {
        self.endpoint_data_for(filter).map(|endpoint| endpoint.url)
    }
}

fn catalog_entries(value: Option<&Value>) -> Vec<Value> {
    value
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn region_of(fields: &Map<String, Value>) -> Option<String> {
    ["region_id", "region"]
        .iter()
        .filter_map(|key| fields.get(*key).and_then(Value::as_str))
        .find(|region| !region.is_empty())
        .map(str::to_owned)
}

/// Filter value set and differing from a value the catalog actually carries.
fn mismatch(wanted: Option<&str>, actual: Option<&str>) -> bool {
    matches!((wanted, actual), (Some(wanted), Some(actual)) if wanted != actual)
}
