//! Role-based access gate.
//!
//! A route declares the roles that may use it; the gate grants access when
//! no role is required or when the principal holds at least one of them.

use std::collections::HashSet;

use thiserror::Error;
use uuid::Uuid;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_TECHNICIAN: &str = "technician";
pub const ROLE_CUSTOMER: &str = "customer";

/// Roles seeded into an empty installation.
pub const DEFAULT_ROLES: [(&str, &str); 4] = [
    (ROLE_USER, "Regular user with basic access"),
    (ROLE_ADMIN, "Administrator with full access"),
    (ROLE_TECHNICIAN, "Repair technician"),
    (ROLE_CUSTOMER, "Customer who books repairs and orders parts"),
];

/// The authenticated caller: identity plus the set of role names it holds.
#[derive(Clone, Debug)]
pub struct Principal {
    pub id: Uuid,
    pub roles: HashSet<String>,
}

impl Principal {
    pub fn new(id: Uuid, roles: impl IntoIterator<Item = String>) -> Self {
        Self { id, roles: roles.into_iter().collect() }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Access denied: You do not have the required role to perform this action")]
pub struct AccessDenied;

pub fn authorize(principal: &Principal, required: &[&str]) -> Result<(), AccessDenied> {
    if required.is_empty() || required.iter().any(|r| principal.has_role(r)) {
        Ok(())
    } else {
        Err(AccessDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(roles: &[&str]) -> Principal {
        Principal::new(Uuid::new_v4(), roles.iter().map(|r| r.to_string()))
    }

    #[test]
    fn empty_requirement_allows_any_principal() {
        assert!(authorize(&principal(&[]), &[]).is_ok());
        assert!(authorize(&principal(&[ROLE_USER]), &[]).is_ok());
    }

    #[test]
    fn principal_without_the_role_is_denied() {
        let err = authorize(&principal(&[ROLE_USER]), &[ROLE_ADMIN]).unwrap_err();
        assert_eq!(err, AccessDenied);
    }

    #[test]
    fn any_one_required_role_is_enough() {
        let p = principal(&[ROLE_USER]);
        assert!(authorize(&p, &[ROLE_ADMIN, ROLE_USER]).is_ok());
    }

    #[test]
    fn principal_with_no_roles_is_denied_when_roles_are_required() {
        assert!(authorize(&principal(&[]), &[ROLE_USER]).is_err());
    }
}
