use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_INSPECTOR, ROLE_SUPERVISOR};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub account_id: String,
    pub sub: String,
    /// Session UID (only present for interactive OIDC flows)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_uid: Option<String>,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check if user is super admin
    pub fn is_super_admin(&self) -> bool {
        self.has_role("super_admin")
    }

    /// Check if user is a field inspector (can submit checklist photos)
    #[allow(dead_code)]
    pub fn is_inspector(&self) -> bool {
        self.has_role(ROLE_INSPECTOR)
    }

    /// Check if user has supervisor-level access (approvals, fraud reports)
    pub fn has_supervisor_access(&self) -> bool {
        self.is_super_admin() || self.has_role(ROLE_SUPERVISOR)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomClaims {
    #[serde(rename = "type")]
    pub token_type: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            account_id: "acc".to_string(),
            sub: "sub".to_string(),
            session_uid: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_supervisor_access() {
        assert!(user_with(&["supervisor"]).has_supervisor_access());
        assert!(user_with(&["super_admin"]).has_supervisor_access());
        assert!(!user_with(&["inspector"]).has_supervisor_access());
    }
}
