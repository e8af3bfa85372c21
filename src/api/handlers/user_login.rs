use crate::{api::handlers::error_response, auth::CredentialService, store::Account};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct UserLogin {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for UserLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserLogin")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[utoipa::path(
    post,
    path= "/user/login",
    request_body = UserLogin,
    responses (
        (status = 200, description = "Login successful", body = [Account]),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Account disabled"),
    ),
    tag= "user"
)]
#[instrument(skip_all)]
pub async fn login(
    service: Extension<Arc<CredentialService>>,
    payload: Option<Json<UserLogin>>,
) -> impl IntoResponse {
    let Some(Json(user)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service.login(&user.email, &user.password).await {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
