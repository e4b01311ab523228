//! # Nanos Identity
//!
//! The principals the kernel knows about: the [`User`] and [`Session`] bound
//! at boot, [`Group`]s carrying permissions, and the [`Subject`] a caller
//! presents to guarded services such as the exported service catalog.
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Id of the built-in system user.
pub const SYSTEM_USER_ID: u64 = 1;
/// Group the system user belongs to.
pub const SYSTEM_GROUP: &str = "system";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub first_name: String,
    pub group: String,
}

impl User {
    /// The user every boot-time binding runs as.
    pub fn system() -> Self {
        Self {
            id: SYSTEM_USER_ID,
            first_name: "system".to_string(),
            group: SYSTEM_GROUP.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: u64,
    pub created_at: SystemTime,
}

impl Session {
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            created_at: SystemTime::now(),
        }
    }
}

/// A group of users sharing a set of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Parent group to inherit permissions from.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Group {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            parent: None,
            permissions: Vec::new(),
            enabled: true,
        }
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// The system group holds every permission.
    pub fn system() -> Self {
        Self::new(SYSTEM_GROUP).with_permission("*")
    }

    /// Whether any of this group's own permissions implies `permission`.
    pub fn implies(&self, permission: &str) -> bool {
        self.permissions.iter().any(|granted| permission_implies(granted, permission))
    }
}

/// Dotted permission matching.
///
/// `*` implies everything; `a.*` and the bare `a` imply `a` and every
/// `a.<rest>`; otherwise only an exact match counts.
pub fn permission_implies(granted: &str, requested: &str) -> bool {
    if granted == "*" || granted == requested {
        return true;
    }
    let prefix = granted.strip_suffix(".*").unwrap_or(granted);
    requested == prefix
        || requested
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// The identity a caller presents to a guarded service.
#[derive(Debug, Clone, Default)]
pub struct Subject {
    user: Option<User>,
    groups: Vec<Group>,
}

impl Subject {
    /// A caller with no user and no permissions.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// `groups` is the user's group followed by its ancestors.
    pub fn new(user: User, groups: Vec<Group>) -> Self {
        Self { user: Some(user), groups }
    }

    /// The system user in the all-powerful system group.
    pub fn system() -> Self {
        Self::new(User::system(), vec![Group::system()])
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.user.is_none()
    }

    /// Whether an enabled group in the chain implies `permission`.
    pub fn check(&self, permission: &str) -> bool {
        self.user.is_some()
            && self
                .groups
                .iter()
                .filter(|group| group.enabled)
                .any(|group| group.implies(permission))
    }
}
