//! Who is calling the engine

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    /// Anonymous public caller.
    Customer,
    Staff,
    Admin,
}

/// Authenticated (or anonymous) caller, as established by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn customer() -> Self {
        Self {
            name: "customer".to_string(),
            role: ActorRole::Customer,
        }
    }

    pub fn staff(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: ActorRole::Staff,
        }
    }

    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: ActorRole::Admin,
        }
    }

    /// Staff and admins may manage inventory and reservation status.
    pub fn is_staff(&self) -> bool {
        matches!(self.role, ActorRole::Staff | ActorRole::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.name, self.role)
    }
}
