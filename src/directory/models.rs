use serde::{Deserialize, Serialize};

/// The only two roles the dispatch app knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    // Older rows and clients use the Spanish name
    #[serde(alias = "tecnico")]
    Technician,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Technician => "technician",
        }
    }

    /// Every value a stored row may carry for this role.
    pub fn stored_values(&self) -> &'static [&'static str] {
        match self {
            Role::Admin => &["admin"],
            Role::Technician => &["technician", "tecnico"],
        }
    }

    /// Parse a stored or wire value. Anything outside the closed set
    /// of roles is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "admin" => Some(Role::Admin),
            "technician" | "tecnico" => Some(Role::Technician),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user as seen by the directory. `role` is `None` when the stored
/// value is not one of the known roles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub id: String,
    pub role: Option<Role>,
}

/// Who a notification is addressed to. Exactly one of a user or a role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationTarget {
    User(String),
    Role(Role),
}
