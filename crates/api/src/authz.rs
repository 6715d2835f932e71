//! API-side authorization guard.
//!
//! Authorization is enforced at the route boundary (before the service call),
//! keeping the domain and infra crates auth-agnostic.

use epitrack_auth::{AuthzError, Permission, Principal, TenantMembership, authorize};

use crate::context::{PrincipalContext, TenantContext};

/// Check one permission in the current request context.
pub fn require(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    permission: &Permission,
) -> Result<(), AuthzError> {
    let membership = TenantMembership {
        tenant_id: tenant.tenant_id(),
        roles: principal.roles().to_vec(),
        permissions: permissions_from_roles(principal),
    };

    let principal = Principal {
        principal_id: principal.principal_id(),
        active_tenant_id: tenant.tenant_id(),
        membership,
    };

    authorize(&principal, permission)
}

/// Minimal role→permission mapping.
///
/// Convention: "admin" grants all permissions. Other roles carry none beyond
/// access to their own tenant's routes.
fn permissions_from_roles(principal: &PrincipalContext) -> Vec<Permission> {
    if principal.is_admin() {
        return vec![Permission::new("*")];
    }

    Vec::new()
}
