use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use url::Url;

use crate::types::{AuthSession, Message, PublicUser, RoomSummary};

/// Errors surfaced by [ApiClient] requests.
///
/// Authentication failures get their own variants so the caller can show
/// an inline message instead of a raw status code. Everything else is
/// reported as-is; no retry policy is applied here.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("username is already taken")]
    UsernameTaken,

    #[error("server responded with {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid api url: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    username: &'a str,
    display_color: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoomRequest<'a> {
    name: &'a str,
    member_ids: &'a [String],
    share_history_with_new_members: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddMembersRequest<'a> {
    user_ids: &'a [String],
    share_history_with_new_members: bool,
}

/// Request/response client for the chat API.
///
/// All requests except the auth endpoints carry the bearer token set via
/// [ApiClient::set_access_token].
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            access_token: None,
        })
    }

    pub fn set_access_token(&mut self, access_token: Option<String>) {
        self.access_token = access_token;
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Attaches the bearer token if present, sends the request and decodes
    /// a JSON body on success. Non-success statuses are returned with the
    /// response body as the message.
    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = self.dispatch(request).await?;

        Ok(response.json::<T>().await?)
    }

    /// Same as [Self::send] for endpoints which respond without a body
    async fn send_no_content(&self, request: reqwest::RequestBuilder) -> Result<()> {
        self.dispatch(request).await?;

        Ok(())
    }

    async fn dispatch(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let request = match self.access_token.as_ref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::debug!(%status, "api request failed");

            return Err(ApiError::Status { status, message });
        }

        Ok(response)
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<AuthSession> {
        let request = self
            .http
            .post(self.endpoint("/auth/register")?)
            .json(&Credentials { username, password });

        match self.send(request).await {
            Err(ApiError::Status { status, .. }) if status == StatusCode::CONFLICT => {
                Err(ApiError::UsernameTaken)
            }
            result => result,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession> {
        let request = self
            .http
            .post(self.endpoint("/auth/login")?)
            .json(&Credentials { username, password });

        match self.send(request).await {
            Err(ApiError::Status { status, .. })
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST =>
            {
                Err(ApiError::InvalidCredentials)
            }
            result => result,
        }
    }

    pub async fn rooms(&self) -> Result<Vec<RoomSummary>> {
        self.send(self.http.get(self.endpoint("/rooms")?)).await
    }

    pub async fn users(&self) -> Result<Vec<PublicUser>> {
        self.send(self.http.get(self.endpoint("/users")?)).await
    }

    pub async fn room_messages(&self, room_id: &str) -> Result<Vec<Message>> {
        self.send(
            self.http
                .get(self.endpoint(&format!("/rooms/{}/messages", room_id))?),
        )
        .await
    }

    pub async fn update_profile(&self, username: &str, display_color: &str) -> Result<PublicUser> {
        self.send(
            self.http
                .patch(self.endpoint("/users/me")?)
                .json(&UpdateProfileRequest {
                    username,
                    display_color,
                }),
        )
        .await
    }

    pub async fn create_room(
        &self,
        name: &str,
        member_ids: &[String],
        share_history_with_new_members: bool,
    ) -> Result<RoomSummary> {
        self.send(
            self.http
                .post(self.endpoint("/rooms")?)
                .json(&CreateRoomRequest {
                    name,
                    member_ids,
                    share_history_with_new_members,
                }),
        )
        .await
    }

    pub async fn add_members(
        &self,
        room_id: &str,
        user_ids: &[String],
        share_history_with_new_members: bool,
    ) -> Result<()> {
        self.send_no_content(
            self.http
                .post(self.endpoint(&format!("/rooms/{}/members", room_id))?)
                .json(&AddMembersRequest {
                    user_ids,
                    share_history_with_new_members,
                }),
        )
        .await
    }
}
