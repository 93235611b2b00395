use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of the user operating the board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

/// Capabilities derived from a role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub can_edit: bool,
    pub can_move: bool,
    pub can_update_priority: bool,
    pub can_mark_resolved: bool,
}

impl Permissions {
    /// Only admins may change issues
    pub fn for_role(role: Role) -> Self {
        let can_edit = role == Role::Admin;
        Self {
            can_edit,
            can_move: can_edit,
            can_update_priority: can_edit,
            can_mark_resolved: can_edit,
        }
    }
}
