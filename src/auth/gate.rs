//! Route-level access control.
//!
//! Rules are checked top to bottom and the first match decides. A request
//! that matches no rule is denied.

use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};
use lazy_static::lazy_static;
use tracing::warn;

use super::{identity::Identity, permissions::Permission};
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
    Authority(Permission),
    DenyAll,
}

#[derive(Debug, Clone)]
pub struct AccessRule {
    method: Option<Method>,
    pattern: &'static str,
    requirement: Requirement,
}

impl AccessRule {
    pub fn new(method: Method, pattern: &'static str, requirement: Requirement) -> Self {
        Self {
            method: Some(method),
            pattern,
            requirement,
        }
    }

    /// Rule that applies regardless of method.
    pub fn any(pattern: &'static str, requirement: Requirement) -> Self {
        Self {
            method: None,
            pattern,
            requirement,
        }
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().map_or(true, |m| m == method) && path_matches(self.pattern, path)
    }
}

lazy_static! {
    static ref ACCESS_RULES: Vec<AccessRule> = vec![
        AccessRule::new(Method::POST, "/register", Requirement::Public),
        AccessRule::new(Method::POST, "/login", Requirement::Public),
        AccessRule::any("/health", Requirement::Public),
        AccessRule::new(
            Method::GET,
            "/users",
            Requirement::Authority(Permission::ReadAllData)
        ),
        AccessRule::new(
            Method::GET,
            "/user/{id}",
            Requirement::Authority(Permission::ReadPersonalData)
        ),
        AccessRule::new(Method::PUT, "/user/{id}", Requirement::Authenticated),
        AccessRule::new(Method::PUT, "/password/{id}", Requirement::Authenticated),
        AccessRule::new(Method::DELETE, "/user/{id}", Requirement::Authenticated),
    ];
}

/// `{name}` segments match any single non-empty segment.
fn path_matches(pattern: &str, path: &str) -> bool {
    let mut expected = pattern.trim_matches('/').split('/');
    let mut actual = path.trim_matches('/').split('/');
    loop {
        match (expected.next(), actual.next()) {
            (None, None) => return true,
            (Some(e), Some(a)) => {
                let wildcard = e.starts_with('{') && e.ends_with('}');
                if (wildcard && a.is_empty()) || (!wildcard && e != a) {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

pub fn requirement_for(rules: &[AccessRule], method: &Method, path: &str) -> Requirement {
    rules
        .iter()
        .find(|r| r.matches(method, path))
        .map_or(Requirement::DenyAll, |r| r.requirement)
}

pub fn check(requirement: Requirement, identity: &Identity) -> Result<(), AppError> {
    match requirement {
        Requirement::Public => Ok(()),
        Requirement::DenyAll => Err(AppError::Forbidden),
        Requirement::Authenticated if identity.is_authenticated() => Ok(()),
        Requirement::Authority(p) if identity.has_authority(p.as_str()) => Ok(()),
        Requirement::Authenticated | Requirement::Authority(_) if !identity.is_authenticated() => {
            Err(AppError::Unauthenticated)
        }
        Requirement::Authenticated | Requirement::Authority(_) => Err(AppError::Forbidden),
    }
}

pub async fn enforce_access(req: Request, next: Next) -> Result<Response, AppError> {
    let requirement = requirement_for(&ACCESS_RULES, req.method(), req.uri().path());
    let identity = req
        .extensions()
        .get::<Identity>()
        .cloned()
        .unwrap_or(Identity::Anonymous);

    if let Err(e) = check(requirement, &identity) {
        warn!(
            method = %req.method(),
            path = %req.uri().path(),
            principal = identity.principal().unwrap_or("anonymous"),
            ?requirement,
            "access denied"
        );
        return Err(e);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permissions::{authorities_for, Role};

    fn signed_in(role: Role) -> Identity {
        Identity::Authenticated {
            principal: "felipe@gmail.com".into(),
            authorities: authorities_for(role),
        }
    }

    #[test]
    fn path_patterns() {
        assert!(path_matches("/user/{id}", "/user/123"));
        assert!(path_matches("/users", "/users"));
        assert!(!path_matches("/user/{id}", "/user"));
        assert!(!path_matches("/user/{id}", "/user/1/extra"));
        assert!(!path_matches("/users", "/user"));
    }

    #[test]
    fn table_routes_to_expected_requirements() {
        let r = |m: Method, p: &str| requirement_for(&ACCESS_RULES, &m, p);
        assert_eq!(r(Method::POST, "/register"), Requirement::Public);
        assert_eq!(r(Method::POST, "/login"), Requirement::Public);
        assert_eq!(
            r(Method::GET, "/users"),
            Requirement::Authority(Permission::ReadAllData)
        );
        assert_eq!(
            r(Method::GET, "/user/abc"),
            Requirement::Authority(Permission::ReadPersonalData)
        );
        assert_eq!(r(Method::DELETE, "/user/abc"), Requirement::Authenticated);
        assert_eq!(r(Method::GET, "/register"), Requirement::DenyAll);
        assert_eq!(r(Method::GET, "/admin"), Requirement::DenyAll);
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![
            AccessRule::any("/user/{id}", Requirement::DenyAll),
            AccessRule::new(Method::GET, "/user/{id}", Requirement::Public),
        ];
        assert_eq!(
            requirement_for(&rules, &Method::GET, "/user/1"),
            Requirement::DenyAll
        );
    }

    #[test]
    fn anonymous_needs_to_sign_in() {
        let anon = Identity::Anonymous;
        assert!(check(Requirement::Public, &anon).is_ok());
        assert!(matches!(
            check(Requirement::Authenticated, &anon),
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            check(Requirement::Authority(Permission::ReadPersonalData), &anon),
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            check(Requirement::DenyAll, &anon),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn authorities_decide_for_signed_in_users() {
        let user = signed_in(Role::User);
        let admin = signed_in(Role::Admin);
        let read_all = Requirement::Authority(Permission::ReadAllData);
        let read_personal = Requirement::Authority(Permission::ReadPersonalData);

        assert!(matches!(check(read_all, &user), Err(AppError::Forbidden)));
        assert!(check(read_all, &admin).is_ok());
        assert!(check(read_personal, &user).is_ok());
        assert!(check(read_personal, &admin).is_ok());
        assert!(check(Requirement::Authenticated, &user).is_ok());
        assert!(matches!(
            check(Requirement::DenyAll, &admin),
            Err(AppError::Forbidden)
        ));
    }
}
