use axum::http::HeaderMap;

/// Caller identity as forwarded by the hosting application. We never verify
/// the token ourselves; it is passed through to the profile API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserContext {
    pub user_id: Option<String>,
    pub access_token: Option<String>,
}

impl UserContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_id = headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let access_token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Self {
            user_id,
            access_token,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}
