//! HTTP implementation of [`ReviewGateway`].

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rubricdash_core::{
    ArtifactType, AuthSession, CurrentUser, GatewayError, GatewayResult, ProjectId, ReviewData,
    ReviewGateway, ReviewSubmission, RubricEvaluation, RubricEvaluationSubmission,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::project::{Project, ProjectEnvelope, ProjectList};

/// Review backend reached over HTTP with a bearer token.
pub struct HttpGateway {
    config: ClientConfig,
    http_client: reqwest::Client,
}

/// Body of `POST /api/reviews/general-comment`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeneralCommentBody<'a> {
    project_id: &'a ProjectId,
    artifact_type: &'a str,
    comment: &'a str,
}

/// Body of `POST /api/rubric-evaluations/general-comment`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RubricCommentBody<'a> {
    project_id: &'a ProjectId,
    rubric_type: ArtifactType,
    comment: &'a str,
}

/// `GET /api/rubric-evaluations/...` answers `{ "evaluation": {...} }`,
/// `{ "evaluation": null }` or the evaluation itself.
#[derive(Deserialize)]
#[serde(untagged)]
enum EvaluationEnvelope {
    Wrapped { evaluation: RubricEvaluation },
    Bare(RubricEvaluation),
}

/// `GET /api/auth/me` answers either `{ "user": {...} }` or the user itself.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserEnvelope {
    Wrapped { user: CurrentUser },
    Bare(CurrentUser),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl HttpGateway {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("rubricdash/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()?;

        Ok(HttpGateway {
            config,
            http_client,
        })
    }

    /// Create a gateway from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Confirm the token with the backend and build the auth session.
    pub async fn authenticate(&self) -> Result<AuthSession> {
        let token = self.config.token.clone().ok_or(ClientError::MissingToken)?;
        let user = self.current_user().await?;
        Ok(AuthSession::new(token, user))
    }

    pub async fn current_user(&self) -> GatewayResult<CurrentUser> {
        let envelope: UserEnvelope = self
            .send_json(self.request(Method::GET, "/api/auth/me"))
            .await?;
        Ok(match envelope {
            UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user) => user,
        })
    }

    pub async fn list_projects(&self) -> GatewayResult<Vec<Project>> {
        let list: ProjectList = self
            .send_json(self.request(Method::GET, "/api/projects"))
            .await?;
        Ok(list.into())
    }

    pub async fn get_project(&self, project_id: &ProjectId) -> GatewayResult<Project> {
        let envelope: ProjectEnvelope = self
            .send_json(self.request(Method::GET, &format!("/api/projects/{project_id}")))
            .await?;
        Ok(envelope.into())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.url(path);
        debug!(%method, %url, "backend request");
        let builder = self.http_client.request(method, url);
        match &self.config.token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> GatewayResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            warn!("backend rejected the session token");
            return Err(GatewayError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        let message = rejection_message(status, &body);
        warn!(status = status.as_u16(), %message, "backend rejected request");
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> GatewayResult<T> {
        let response = self.send(builder).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Message for a non-2xx reply: the body's `message` (or `error`), else the
/// raw body, else the status reason.
fn rejection_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return message;
        }
    }
    let body = body.trim();
    if !body.is_empty() && body.len() <= 200 {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("unexpected status")
        .to_string()
}

#[async_trait]
impl ReviewGateway for HttpGateway {
    async fn fetch_review_data(
        &self,
        artifact_type: ArtifactType,
        project_id: &ProjectId,
    ) -> GatewayResult<ReviewData> {
        let path = format!(
            "/api/{}/project/{project_id}/review-data",
            artifact_type.route_segment()
        );
        self.send_json(self.request(Method::GET, &path)).await
    }

    async fn submit_review(&self, submission: &ReviewSubmission) -> GatewayResult<()> {
        self.send(self.request(Method::POST, "/api/reviews").json(submission))
            .await?;
        Ok(())
    }

    async fn save_general_comment(
        &self,
        project_id: &ProjectId,
        artifact_type: ArtifactType,
        comment: &str,
    ) -> GatewayResult<()> {
        let body = GeneralCommentBody {
            project_id,
            artifact_type: artifact_type.as_str(),
            comment,
        };
        self.send(
            self.request(Method::POST, "/api/reviews/general-comment")
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn fetch_rubric_evaluation(
        &self,
        project_id: &ProjectId,
        artifact_type: ArtifactType,
    ) -> GatewayResult<Option<RubricEvaluation>> {
        let path = format!("/api/rubric-evaluations/{project_id}/{artifact_type}");
        let envelope = match self
            .send_json::<Option<EvaluationEnvelope>>(self.request(Method::GET, &path))
            .await
        {
            Err(GatewayError::Rejected { status: 404, .. }) => {
                debug!(%project_id, %artifact_type, "no rubric evaluation stored");
                return Ok(None);
            }
            other => other?,
        };
        Ok(envelope.map(|envelope| match envelope {
            EvaluationEnvelope::Wrapped { evaluation } | EvaluationEnvelope::Bare(evaluation) => {
                evaluation
            }
        }))
    }

    async fn save_rubric_evaluation(
        &self,
        submission: &RubricEvaluationSubmission,
    ) -> GatewayResult<()> {
        self.send(
            self.request(Method::POST, "/api/rubric-evaluations")
                .json(submission),
        )
        .await?;
        Ok(())
    }

    async fn save_rubric_general_comment(
        &self,
        project_id: &ProjectId,
        artifact_type: ArtifactType,
        comment: &str,
    ) -> GatewayResult<()> {
        let body = RubricCommentBody {
            project_id,
            rubric_type: artifact_type,
            comment,
        };
        self.send(
            self.request(Method::POST, "/api/rubric-evaluations/general-comment")
                .json(&body),
        )
        .await?;
        Ok(())
    }
}
