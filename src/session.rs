//! Explicit session context handed to operations that need the auth token.
use serde::{Deserialize, Serialize};

use crate::api::ApiError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Guest,
    Editor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }

    pub fn parse_role(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Some(Role::Guest),
            "editor" => Some(Role::Editor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    token: Option<String>,
    role: Role,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("role", &self.role)
            .finish()
    }
}

impl SessionContext {
    pub fn new(token: Option<String>, role: Role) -> Self {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self { token, role }
    }

    pub fn guest() -> Self {
        Self::default()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Bearer token, if one is held.
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Gate for admin-only routes: a token and the admin role are both required.
    pub fn require_admin(&self) -> Result<&str, ApiError> {
        let token = self
            .bearer()
            .ok_or(ApiError::Unauthorized("no session token"))?;
        if self.role != Role::Admin {
            return Err(ApiError::Unauthorized("admin role required"));
        }
        Ok(token)
    }
}
