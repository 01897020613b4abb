use axum::http::HeaderMap;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::state::AppState;

/// Caller identity for one request, derived from a verified bearer token.
/// Never persisted.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub is_admin: bool,
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

pub fn is_admin(config: &AppConfig, uid: &str, email: &str) -> bool {
    config.admin_uids.iter().any(|u| u == uid)
        || (!email.is_empty()
            && config
                .admin_emails
                .iter()
                .any(|e| *e == email.to_lowercase()))
}

pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Principal, AppError> {
    let token = bearer_token(headers).ok_or(AppError::Unauthenticated)?;

    let verified = state.identity.verify(token).await.map_err(|e| {
        tracing::warn!(error = %e, "token verification failed");
        AppError::Unauthenticated
    })?;

    let admin = is_admin(&state.config, &verified.uid, &verified.email);
    Ok(Principal {
        id: verified.uid,
        email: verified.email,
        is_admin: admin,
    })
}

/// Owner-or-admin gate applied to every operation on a `user_id`-scoped
/// resource.
pub fn ensure_owner(principal: &Principal, owner_id: &str) -> Result<(), AppError> {
    if principal.id == owner_id || principal.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub fn ensure_admin(principal: &Principal) -> Result<(), AppError> {
    if principal.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_admins() -> AppConfig {
        let mut config = AppConfig::from_env();
        config.admin_uids = vec!["admin-uid".to_string()];
        config.admin_emails = vec!["boss@example.com".to_string()];
        config
    }

    #[test]
    fn admin_by_uid() {
        let config = config_with_admins();
        assert!(is_admin(&config, "admin-uid", ""));
        assert!(!is_admin(&config, "other-uid", ""));
    }

    #[test]
    fn admin_by_email_is_case_insensitive() {
        let config = config_with_admins();
        assert!(is_admin(&config, "u1", "Boss@Example.COM"));
        assert!(!is_admin(&config, "u1", "someone@example.com"));
    }

    #[test]
    fn owner_gate() {
        let user = Principal {
            id: "u1".to_string(),
            email: String::new(),
            is_admin: false,
        };
        let admin = Principal {
            id: "a1".to_string(),
            email: String::new(),
            is_admin: true,
        };

        assert!(ensure_owner(&user, "u1").is_ok());
        assert!(matches!(ensure_owner(&user, "u2"), Err(AppError::Forbidden)));
        assert!(ensure_owner(&admin, "u2").is_ok());
        assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden)));
        assert!(ensure_admin(&admin).is_ok());
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert("authorization", "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert("authorization", "Basic abc123".parse().unwrap());
        assert!(bearer_token(&headers).is_none());
    }
}
