use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use ureq::{Agent, RequestBuilder};

use super::models::{
    payments_from_value, projects_from_value, Credentials, LoginResponse, PaymentInput, Project,
    ProjectInput, ProjectUpdate, RawPayment, Registration,
};
use crate::config::{ApiSettings, Session};
use crate::error::{FreelanceError, Result};

/// Blocking client for the freelancer backend.
///
/// Every request carries the session token when one is present.
pub struct ApiClient {
    agent: Agent,
    base_url: String,
    authorization: Option<String>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, session: Option<&Session>) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .build()
            .into();

        Self {
            agent,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            authorization: session.map(Session::bearer),
        }
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.url("/api/auth/login");
        let response: LoginResponse =
            self.send_json(self.agent.post(&url), &url, &Credentials { email, password })?;

        match response.token {
            Some(token) if !token.is_empty() => Ok(Session::new(token, email)),
            _ => Err(FreelanceError::InvalidResponse {
                url,
                reason: "missing token".to_string(),
            }),
        }
    }

    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<()> {
        let url = self.url("/api/auth/register");
        let _: Value = self.send_json(
            self.agent.post(&url),
            &url,
            &Registration {
                name,
                email,
                password,
            },
        )?;
        Ok(())
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let url = self.url("/api/projects");
        let body: Value = self.get_json(&url)?;
        Ok(projects_from_value(body))
    }

    pub fn get_project(&self, id: &str) -> Result<Project> {
        let url = self.url(&format!("/api/projects/{id}"));
        self.get_json(&url)
    }

    pub fn create_project(&self, input: &ProjectInput) -> Result<()> {
        let url = self.url("/api/projects");
        let _: Value = self.send_json(self.agent.post(&url), &url, input)?;
        Ok(())
    }

    pub fn update_project(&self, id: &str, input: &ProjectUpdate) -> Result<()> {
        let url = self.url(&format!("/api/projects/{id}"));
        let _: Value = self.send_json(self.agent.put(&url), &url, input)?;
        Ok(())
    }

    pub fn delete_project(&self, id: &str) -> Result<()> {
        let url = self.url(&format!("/api/projects/{id}"));
        debug!(%url, "DELETE");
        self.authorize(self.agent.delete(&url))
            .call()
            .map_err(|e| map_error(&url, e))?;
        Ok(())
    }

    pub fn list_payments(&self) -> Result<Vec<RawPayment>> {
        let url = self.url("/api/payments/pay");
        let body: Value = self.get_json(&url)?;
        Ok(payments_from_value(body))
    }

    pub fn add_payment(&self, input: &PaymentInput) -> Result<()> {
        let url = self.url("/api/payments/add");
        let _: Value = self.send_json(self.agent.post(&url), &url, input)?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        match &self.authorization {
            Some(value) => request.header("Authorization", value.as_str()),
            None => request,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(%url, "GET");
        let body = self
            .authorize(self.agent.get(url))
            .header("Accept", "application/json")
            .call()
            .map_err(|e| map_error(url, e))?
            .body_mut()
            .read_to_string()
            .map_err(|e| map_error(url, e))?;
        decode(url, &body)
    }

    fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        request: RequestBuilder<ureq::typestate::WithBody>,
        url: &str,
        payload: &B,
    ) -> Result<T> {
        debug!(%url, "sending JSON body");
        let payload = serde_json::to_string(payload)?;
        let body = self
            .authorize(request)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(payload)
            .map_err(|e| map_error(url, e))?
            .body_mut()
            .read_to_string()
            .map_err(|e| map_error(url, e))?;
        decode(url, &body)
    }
}

/// Empty bodies decode as JSON null so callers that ignore the body still work
fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| FreelanceError::InvalidResponse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn map_error(url: &str, err: ureq::Error) -> FreelanceError {
    match err {
        ureq::Error::StatusCode(status @ (401 | 403)) => FreelanceError::Unauthorized(status),
        ureq::Error::StatusCode(status) => FreelanceError::Http {
            url: url.to_string(),
            status,
        },
        other => FreelanceError::Transport {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}
