use serde::Serialize;
use serde_json::Value;

/// Interface requested by the lookup helpers unless told otherwise.
pub const DEFAULT_INTERFACE: &str = "public";

/// One catalog endpoint after normalisation, with the service it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointData {
    pub url: String,
    pub service_type: String,
    pub service_name: Option<String>,
    pub service_id: Option<String>,
    pub interface: Option<String>,
    pub region_name: Option<String>,
    pub endpoint_id: Option<String>,
    /// Endpoint exactly as it appeared in the catalog
    pub raw_endpoint: Value,
}

/// Criteria for picking endpoints out of a [`super::ServiceCatalog`].
///
/// `interfaces` is an ordered preference list; per service type only the
/// first listed interface that has matches is kept. An empty list accepts
/// any interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointFilter {
    pub service_type: Option<String>,
    pub interfaces: Vec<String>,
    pub region_name: Option<String>,
    pub service_name: Option<String>,
    pub service_id: Option<String>,
    pub endpoint_id: Option<String>,
}

impl EndpointFilter {
    /// Any service, `public` interface.
    pub fn new() -> Self {
        Self {
            service_type: None,
            interfaces: vec![DEFAULT_INTERFACE.to_owned()],
            region_name: None,
            service_name: None,
            service_id: None,
            endpoint_id: None,
        }
    }

    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    pub fn interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces = vec![interface.into()];
        self
    }

    pub fn interfaces<I, S>(mut self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interfaces = interfaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn any_interface(mut self) -> Self {
        self.interfaces.clear();
        self
    }

    pub fn region_name(mut self, region_name: impl Into<String>) -> Self {
        self.region_name = Some(region_name.into());
        self
    }

    pub fn service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    pub fn service_id(mut self, service_id: impl Into<String>) -> Self {
        self.service_id = Some(service_id.into());
        self
    }

    pub fn endpoint_id(mut self, endpoint_id: impl Into<String>) -> Self {
        self.endpoint_id = Some(endpoint_id.into());
        self
    }

    /// Message used when nothing matches.
    pub(crate) fn not_found_message(&self) -> String {
        let interface = if self.interfaces.is_empty() {
            "any".to_owned()
        } else {
            self.interfaces.join("/")
        };
        let service_type = self.service_type.as_deref().unwrap_or("any");

        match (&self.service_name, &self.region_name) {
            (Some(name), Some(region)) => format!(
                "{interface} endpoint for {service_type} service named {name} in {region} region not found"
            ),
            (Some(name), None) => {
                format!("{interface} endpoint for {service_type} service named {name} not found")
            }
            (None, Some(region)) => {
                format!("{interface} endpoint for {service_type} service in {region} region not found")
            }
            (None, None) => format!("{interface} endpoint for {service_type} service not found"),
        }
    }
}

impl Default for EndpointFilter {
    fn default() -> Self {
        Self::new()
    }
}
