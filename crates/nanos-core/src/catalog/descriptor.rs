use serde::{Deserialize, Serialize};

/// A persisted record naming a service and whether it starts at boot.
///
/// The name doubles as the binding key. `service` selects the producer used to
/// construct it and defaults to the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    #[serde(default = "lazy_by_default")]
    pub lazy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn lazy_by_default() -> bool {
    true
}

impl ServiceDescriptor {
    /// A lazy descriptor, resolved on first lookup.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lazy: true,
            service: None,
            description: None,
        }
    }

    /// A descriptor started during boot.
    pub fn eager(name: impl Into<String>) -> Self {
        Self { lazy: false, ..Self::new(name) }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Id of the producer that builds this service.
    pub fn producer_id(&self) -> &str {
        self.service.as_deref().unwrap_or(&self.name)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("descriptor name is empty".to_string());
        }
        if self.service.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(format!("descriptor '{}' names an empty service", self.name));
        }
        Ok(())
    }
}
