use crate::{
    api::handlers::error_response,
    auth::{CredentialError, CredentialService},
    store::Account,
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct UserRegister {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

// Keep the password out of any debug output.
impl fmt::Debug for UserRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRegister")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"***")
            .field("password_confirm", &"***")
            .finish()
    }
}

// Response-only type; accounts never deserialize back in.
#[derive(ToSchema, Serialize, Debug)]
pub struct RegisterResponse {
    pub message: String,
    pub account: Account,
}

#[utoipa::path(
    post,
    path= "/user/register",
    request_body = UserRegister,
    responses (
        (status = 201, description = "Account created", body = [RegisterResponse]),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered"),
    ),
    tag= "user"
)]
#[instrument(skip_all)]
pub async fn register(
    service: Extension<Arc<CredentialService>>,
    payload: Option<Json<UserRegister>>,
) -> impl IntoResponse {
    let Some(Json(user)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    if user.password != user.password_confirm {
        return error_response(&CredentialError::PasswordMismatch).into_response();
    }

    match service
        .register(&user.name, &user.email, &user.password)
        .await
    {
        Ok(registration) => {
            let message = if registration.email_delivered {
                "Account created".to_string()
            } else {
                "Account created, confirmation email could not be sent".to_string()
            };
            (
                StatusCode::CREATED,
                Json(RegisterResponse {
                    message,
                    account: registration.account,
                }),
            )
                .into_response()
        }
        Err(err) => error_response(&err).into_response(),
    }
}
