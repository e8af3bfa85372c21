use crate::{
    api::handlers::error_response,
    auth::{service::RESET_REQUEST_MESSAGE, CredentialService},
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPassword {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize)]
pub struct ResetPassword {
    pub token: String,
    pub new_password: String,
}

impl fmt::Debug for ResetPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPassword")
            .field("token", &"***")
            .field("new_password", &"***")
            .finish()
    }
}

#[utoipa::path(
    post,
    path= "/user/password/forgot",
    request_body = ForgotPassword,
    responses (
        (status = 200, description = "Reset email sent if the address is registered"),
    ),
    tag= "user"
)]
#[instrument(skip_all)]
pub async fn forgot(
    service: Extension<Arc<CredentialService>>,
    payload: Option<Json<ForgotPassword>>,
) -> impl IntoResponse {
    let Some(Json(forgot)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string());
    };

    // The response is the same for unknown and registered addresses.
    match service.request_password_reset(&forgot.email).await {
        Ok(()) => (StatusCode::OK, RESET_REQUEST_MESSAGE.to_string()),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path= "/user/password/reset",
    request_body = ResetPassword,
    responses (
        (status = 200, description = "Password updated"),
        (status = 400, description = "Invalid or expired token, or password too short"),
    ),
    tag= "user"
)]
#[instrument(skip_all)]
pub async fn reset(
    service: Extension<Arc<CredentialService>>,
    payload: Option<Json<ResetPassword>>,
) -> impl IntoResponse {
    let Some(Json(reset)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string());
    };

    match service
        .complete_password_reset(&reset.token, &reset.new_password)
        .await
    {
        Ok(()) => (StatusCode::OK, "Password updated".to_string()),
        Err(err) => error_response(&err),
    }
}
