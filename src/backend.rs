/// Calls to the external tracking backend
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::tracker::ActivityRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    /// JSON body, sent with `Content-Type: application/json`
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request. Connection failures map to `Error::Network`;
/// any status code is a successful send.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Endpoints the popup uses
#[allow(async_fn_in_trait)]
pub trait CredentialsApi {
    /// Email the backend has on record for `user_id`, if any
    async fn fetch_email(&self, user_id: &str) -> Result<Option<String>>;

    async fn save_credentials(&self, identity: &Identity) -> Result<()>;
}

/// Endpoint the background worker uses
#[allow(async_fn_in_trait)]
pub trait ActivityLog {
    async fn log_activity(&self, record: &ActivityRecord) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SaveCredentialsBody<'a> {
    user_id: &'a str,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmailResponse {
    #[serde(default)]
    email: Option<String>,
}

/// Backend reached over HTTP through a `Transport`
#[derive(Debug, Clone)]
pub struct HttpBackend<T> {
    config: BackendConfig,
    transport: T,
}

impl<T: Transport> HttpBackend<T> {
    pub fn new(config: BackendConfig, transport: T) -> Self {
        HttpBackend { config, transport }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn post_json<B: Serialize>(&self, url: Url, body: &B) -> Result<HttpResponse> {
        let body = serde_json::to_string(body).map_err(|e| Error::Decode {
            what: "request body",
            detail: e.to_string(),
        })?;
        let request = HttpRequest {
            method: Method::Post,
            url,
            body: Some(body),
        };
        self.send_checked(request).await
    }

    /// Send and turn non-2xx statuses into `Error::HttpStatus`.
    async fn send_checked(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.to_string();
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(Error::HttpStatus {
                url,
                status: response.status,
            })
        }
    }
}

impl<T: Transport> CredentialsApi for HttpBackend<T> {
    async fn fetch_email(&self, user_id: &str) -> Result<Option<String>> {
        let request = HttpRequest {
            method: Method::Get,
            url: self.config.get_email_url(user_id),
            body: None,
        };
        let response = self.send_checked(request).await?;

        let parsed: EmailResponse = serde_json::from_str(&response.body).map_err(|e| Error::Decode {
            what: "get-email response",
            detail: e.to_string(),
        })?;

        Ok(parsed.email.filter(|email| !email.is_empty()))
    }

    async fn save_credentials(&self, identity: &Identity) -> Result<()> {
        let body = SaveCredentialsBody {
            user_id: &identity.user_id,
            email: &identity.email,
        };
        self.post_json(self.config.save_credentials_url(), &body).await?;
        Ok(())
    }
}

impl<T: Transport> ActivityLog for HttpBackend<T> {
    async fn log_activity(&self, record: &ActivityRecord) -> Result<()> {
        // Response body is not used
        self.post_json(self.config.log_activity_url(), record).await?;
        Ok(())
    }
}
