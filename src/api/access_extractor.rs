use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
};

use crate::model::{HubAccess, UserRole};

/// Axum extractor for HubAccess from request headers
///
/// - X-User-Id: user identifier; without it the request runs as the anonymous dev user
/// - X-Account-Ids: comma separated accounts the caller belongs to
/// - X-User-Roles: comma separated roles (admin, artist, engineer, user)
///
/// Internal access can never be claimed through headers.
#[async_trait]
impl<S> FromRequestParts<S> for HubAccess
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        let Some(user_id) = extract_header_value(headers, "x-user-id") else {
            return Ok(HubAccess::default_user());
        };

        let account_ids = split_list(extract_header_value(headers, "x-account-ids"));
        let roles = split_list(extract_header_value(headers, "x-user-roles"))
            .iter()
            .map(|role| parse_role(role))
            .collect::<Option<Vec<_>>>()
            .ok_or(StatusCode::BAD_REQUEST)?;

        Ok(HubAccess::new(user_id, account_ids, roles))
    }
}

fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_role(role: &str) -> Option<UserRole> {
    match role.to_ascii_lowercase().as_str() {
        "admin" => Some(UserRole::Admin),
        "artist" => Some(UserRole::Artist),
        "engineer" => Some(UserRole::Engineer),
        "user" => Some(UserRole::User),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<HubAccess, StatusCode> {
        let (mut parts, _) = request.into_parts();
        HubAccess::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_access_from_headers() {
        let request = Request::builder()
            .header("x-user-id", "u1")
            .header("x-account-ids", "acct1, acct2")
            .header("x-user-roles", "Artist,user")
            .body(())
            .unwrap();

        let access = extract(request).await.unwrap();
        assert_eq!(access.user_id, "u1");
        assert_eq!(access.account_ids, vec!["acct1", "acct2"]);
        assert_eq!(access.roles, vec![UserRole::Artist, UserRole::User]);
        assert!(!access.internal);
    }

    #[tokio::test]
    async fn test_missing_user_is_default_user() {
        let access = extract(Request::builder().body(()).unwrap()).await.unwrap();
        assert_eq!(access, HubAccess::default_user());
    }

    #[tokio::test]
    async fn test_unknown_role_is_rejected() {
        let request = Request::builder()
            .header("x-user-id", "u1")
            .header("x-user-roles", "wizard")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap_err(), StatusCode::BAD_REQUEST);
    }
}
