use anyhow::Context;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use crate::models::{Memory, ProfileData, UserContext};

/// Read-only access to the external profile/insights API.
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    /// `Ok(None)` when the user is anonymous or has no profile yet.
    async fn fetch_profile(&self, user: &UserContext) -> anyhow::Result<Option<ProfileData>>;

    async fn fetch_memories(&self, user: &UserContext) -> anyhow::Result<Vec<Memory>>;
}

pub struct HttpProfileProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpProfileProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// `{base}/api/profile/{user_id}/{tail..}` with every segment escaped, so a
    /// user id cannot step out of its own profile path.
    fn endpoint(&self, user_id: &str, tail: &[&str]) -> anyhow::Result<Url> {
        if matches!(user_id, "" | "." | "..") {
            anyhow::bail!("invalid user id {user_id:?}");
        }
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid profile API url {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("profile API url cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(["api", "profile", user_id])
            .extend(tail);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        user: &UserContext,
    ) -> anyhow::Result<Option<T>> {
        let path = url.path().to_string();
        let mut request = self.client.get(url);
        if let Some(token) = &user.access_token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("failed to call profile API {path}"))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let data = resp
            .error_for_status()
            .with_context(|| format!("profile API {path} returned error"))?
            .json()
            .await
            .with_context(|| format!("failed to parse profile API response from {path}"))?;
        Ok(Some(data))
    }
}

#[async_trait]
impl ProfileProvider for HttpProfileProvider {
    async fn fetch_profile(&self, user: &UserContext) -> anyhow::Result<Option<ProfileData>> {
        let Some(user_id) = &user.user_id else {
            return Ok(None);
        };
        let url = self.endpoint(user_id, &[])?;
        self.get_json(url, user).await
    }

    async fn fetch_memories(&self, user: &UserContext) -> anyhow::Result<Vec<Memory>> {
        let Some(user_id) = &user.user_id else {
            return Ok(Vec::new());
        };
        let url = self.endpoint(user_id, &["memories"])?;
        Ok(self.get_json(url, user).await?.unwrap_or_default())
    }
}
