use std::time::Duration;

use reqwest::Client;
use reqwest::RequestBuilder;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;

/// Errors from the MailChimp Marketing API.
#[derive(Debug, thiserror::Error)]
pub enum MailChimpError {
    /// The request never got a response (connection refused, timeout, ...)
    #[error("MailChimp request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// MailChimp answered with a non-2xx status. `message` is the provider's
    /// own wording, passed through verbatim.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse MailChimp response: {0}")]
    Parse(String),
}

/// MailChimp's problem-details error body
/// https://mailchimp.com/developer/marketing/docs/errors/
#[derive(Deserialize)]
struct ProblemDetail {
    title: Option<String>,
    detail: Option<String>,
}

/// The parts of a created member that we keep.
#[derive(Debug, Deserialize)]
pub struct CreatedMember {
    pub id: String,
    pub unique_email_id: String,
}

/// The parts of a created list that we keep.
#[derive(Debug, Deserialize)]
pub struct CreatedList {
    pub id: String,
}

/// Thin client over the MailChimp Marketing API (v3). Every method is exactly
/// one HTTP round-trip; nothing is retried.
pub struct MailChimpClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

// establishing a HTTP connection is expensive, so the `Client` is built once
// and shared by all workers via `web::Data`

impl MailChimpClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// `POST /lists/{list_id}/members`
    #[tracing::instrument(name = "Creating member in MailChimp", skip(self, payload))]
    pub async fn create_member(
        &self,
        list_id: &str,
        payload: &Map<String, Value>,
    ) -> Result<CreatedMember, MailChimpError> {
        let url = format!("{}/lists/{list_id}/members", self.base_url);
        self.send(self.http_client.post(url).json(payload)).await
    }

    /// `PATCH /lists/{list_id}/members/{member_id}`
    #[tracing::instrument(name = "Updating member in MailChimp", skip(self, payload))]
    pub async fn update_member(
        &self,
        list_id: &str,
        member_id: &str,
        payload: &Map<String, Value>,
    ) -> Result<(), MailChimpError> {
        let url = format!("{}/lists/{list_id}/members/{member_id}", self.base_url);
        self.send_empty(self.http_client.patch(url).json(payload))
            .await
    }

    /// `DELETE /lists/{list_id}/members/{member_id}`
    #[tracing::instrument(name = "Deleting member from MailChimp", skip(self))]
    pub async fn delete_member(
        &self,
        list_id: &str,
        member_id: &str,
    ) -> Result<(), MailChimpError> {
        let url = format!("{}/lists/{list_id}/members/{member_id}", self.base_url);
        self.send_empty(self.http_client.delete(url)).await
    }

    /// `POST /lists`
    #[tracing::instrument(name = "Creating list in MailChimp", skip(self, payload))]
    pub async fn create_list(
        &self,
        payload: &Map<String, Value>,
    ) -> Result<CreatedList, MailChimpError> {
        let url = format!("{}/lists", self.base_url);
        self.send(self.http_client.post(url).json(payload)).await
    }

    /// `PATCH /lists/{list_id}`
    #[tracing::instrument(name = "Updating list in MailChimp", skip(self, payload))]
    pub async fn update_list(
        &self,
        list_id: &str,
        payload: &Map<String, Value>,
    ) -> Result<(), MailChimpError> {
        let url = format!("{}/lists/{list_id}", self.base_url);
        self.send_empty(self.http_client.patch(url).json(payload))
            .await
    }

    /// `DELETE /lists/{list_id}`
    #[tracing::instrument(name = "Deleting list from MailChimp", skip(self))]
    pub async fn delete_list(
        &self,
        list_id: &str,
    ) -> Result<(), MailChimpError> {
        let url = format!("{}/lists/{list_id}", self.base_url);
        self.send_empty(self.http_client.delete(url)).await
    }

    /// MailChimp accepts any username with the api key as password
    fn authorize(
        &self,
        request: RequestBuilder,
    ) -> RequestBuilder {
        request.basic_auth("apikey", Some(self.api_key.expose_secret()))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, MailChimpError> {
        let response = self.authorize(request).send().await?;
        if !response.status().is_success() {
            return Err(parse_error(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| MailChimpError::Parse(e.to_string()))
    }

    /// For endpoints whose response body we don't need (`DELETE` answers
    /// `204 No Content`)
    async fn send_empty(
        &self,
        request: RequestBuilder,
    ) -> Result<(), MailChimpError> {
        let response = self.authorize(request).send().await?;
        match response.status().is_success() {
            true => Ok(()),
            false => Err(parse_error(response).await),
        }
    }
}

/// Prefer `detail`, then `title`, then whatever the body was.
async fn parse_error(response: reqwest::Response) -> MailChimpError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ProblemDetail>(&body) {
        Ok(ProblemDetail {
            detail: Some(detail),
            ..
        }) => detail,
        Ok(ProblemDetail {
            title: Some(title), ..
        }) => title,
        _ if !body.is_empty() => body,
        _ => format!("MailChimp responded with status {status}"),
    };
    tracing::warn!(status, message = %message, "MailChimp rejected request");
    MailChimpError::Api { status, message }
}
