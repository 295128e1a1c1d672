use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::{AuthSession, EmailCredentials, RefreshGrant, SignUpResponse};
use crate::config::SupabaseConfig;
use crate::error::{parse_api_error, SupabaseError};
use crate::headers::{
    build_headers, HEADER_PREFER, PREFER_RETURN_MINIMAL, PREFER_RETURN_REPRESENTATION,
};
use crate::query::{Filter, Select};
use crate::url::{auth_url, normalize_base_url, rest_url};

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
    base_url: String,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, SupabaseError> {
        let base_url = normalize_base_url(&config.url)?;
        if config.api_key.trim().is_empty() {
            return Err(SupabaseError::MissingApiKey);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(SupabaseError::from)?;
        Ok(Self {
            http,
            config,
            base_url,
        })
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replaces the bearer token used by subsequent requests.
    pub fn set_access_token(&mut self, access_token: Option<String>) {
        self.config.access_token = access_token.filter(|token| !token.trim().is_empty());
    }

    pub fn build_headers(&self) -> Result<HeaderMap, SupabaseError> {
        let headers = build_headers(&self.config, None)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| SupabaseError::InvalidHeader(format!("invalid header key: {key}")))?,
                HeaderValue::from_str(&value).map_err(|_| {
                    SupabaseError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    fn request(&self, method: Method, url: String) -> Result<RequestBuilder, SupabaseError> {
        Ok(self.http.request(method, url).headers(self.build_headers()?))
    }

    pub fn build_select(&self, select: &Select) -> Result<RequestBuilder, SupabaseError> {
        Ok(self
            .request(Method::GET, rest_url(&self.base_url, select.table()))?
            .query(&select.query_pairs()))
    }

    pub fn build_insert<B>(&self, table: &str, body: &B) -> Result<RequestBuilder, SupabaseError>
    where
        B: Serialize + ?Sized,
    {
        Ok(self
            .request(Method::POST, rest_url(&self.base_url, table))?
            .header(HEADER_PREFER, PREFER_RETURN_REPRESENTATION)
            .json(body))
    }

    pub fn build_update<B>(
        &self,
        table: &str,
        filters: &[Filter],
        body: &B,
    ) -> Result<RequestBuilder, SupabaseError>
    where
        B: Serialize + ?Sized,
    {
        let pairs: Vec<(String, String)> = filters.iter().map(Filter::query_pair).collect();
        Ok(self
            .request(Method::PATCH, rest_url(&self.base_url, table))?
            .query(&pairs)
            .header(HEADER_PREFER, PREFER_RETURN_MINIMAL)
            .json(body))
    }

    pub fn build_auth<B>(
        &self,
        route: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<RequestBuilder, SupabaseError>
    where
        B: Serialize + ?Sized,
    {
        Ok(self
            .request(Method::POST, auth_url(&self.base_url, route))?
            .query(query)
            .json(body))
    }

    pub async fn select<T: DeserializeOwned>(&self, select: &Select) -> Result<Vec<T>, SupabaseError> {
        let body = self.execute(self.build_select(select)?).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Inserts one row (or an array of rows) and returns the stored rows.
    pub async fn insert<T, B>(&self, table: &str, body: &B) -> Result<Vec<T>, SupabaseError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.execute(self.build_insert(table, body)?).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn update<B>(&self, table: &str, filters: &[Filter], body: &B) -> Result<(), SupabaseError>
    where
        B: Serialize + ?Sized,
    {
        self.execute(self.build_update(table, filters, body)?).await?;
        Ok(())
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, SupabaseError> {
        let credentials = EmailCredentials {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        let body = self
            .execute(self.build_auth("signup", &[], &credentials)?)
            .await?;
        SignUpResponse::from_value(serde_json::from_str(&body)?)
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, SupabaseError> {
        let credentials = EmailCredentials {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        let body = self
            .execute(self.build_auth("token", &[("grant_type", "password")], &credentials)?)
            .await?;
        parse_session(&body)
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, SupabaseError> {
        if refresh_token.trim().is_empty() {
            return Err(SupabaseError::Auth("refresh token is required".to_owned()));
        }
        let grant = RefreshGrant {
            refresh_token: refresh_token.to_owned(),
        };
        let body = self
            .execute(self.build_auth("token", &[("grant_type", "refresh_token")], &grant)?)
            .await?;
        parse_session(&body)
    }

    /// Revokes the configured access token's session.
    pub async fn sign_out(&self) -> Result<(), SupabaseError> {
        if self.config.access_token.is_none() {
            return Err(SupabaseError::MissingAccessToken);
        }
        self.execute(self.build_auth("logout", &[], &serde_json::json!({}))?)
            .await?;
        Ok(())
    }

    async fn execute(&self, request: RequestBuilder) -> Result<String, SupabaseError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_success() {
            return Ok(body);
        }
        Err(SupabaseError::Status(status, parse_api_error(status, &body)))
    }
}

fn parse_session(body: &str) -> Result<AuthSession, SupabaseError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if value.get("access_token").is_none() {
        return Err(SupabaseError::Auth(
            "auth response did not include a session".to_owned(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}
