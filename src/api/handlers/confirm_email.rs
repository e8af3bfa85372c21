use crate::{
    api::handlers::error_response,
    auth::{service::RESEND_CONFIRMATION_MESSAGE, CredentialService},
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct ConfirmEmail {
    pub token: String,
}

impl fmt::Debug for ConfirmEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmEmail")
            .field("token", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResendConfirmation {
    pub email: String,
}

#[utoipa::path(
    post,
    path= "/user/confirm-email",
    request_body = ConfirmEmail,
    responses (
        (status = 200, description = "Email confirmed"),
        (status = 400, description = "Invalid or expired token"),
    ),
    tag= "user"
)]
#[instrument(skip_all)]
pub async fn confirm(
    service: Extension<Arc<CredentialService>>,
    payload: Option<Json<ConfirmEmail>>,
) -> impl IntoResponse {
    let Some(Json(confirm)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string());
    };

    match service.confirm_email(&confirm.token).await {
        Ok(()) => (StatusCode::OK, "Email confirmed".to_string()),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path= "/user/confirm-email/resend",
    request_body = ResendConfirmation,
    responses (
        (status = 200, description = "Confirmation email sent if the address is registered"),
    ),
    tag= "user"
)]
#[instrument(skip_all)]
pub async fn resend(
    service: Extension<Arc<CredentialService>>,
    payload: Option<Json<ResendConfirmation>>,
) -> impl IntoResponse {
    let Some(Json(resend)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string());
    };

    // The response is the same for unknown and registered addresses.
    match service.resend_confirmation(&resend.email).await {
        Ok(()) => (StatusCode::OK, RESEND_CONFIRMATION_MESSAGE.to_string()),
        Err(err) => error_response(&err),
    }
}
