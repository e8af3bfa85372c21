use crate::{
    api::handlers::{confirm_email, health, password_reset, user_login, user_register},
    store::Account,
};
use axum::response::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        user_register::register,
        confirm_email::confirm,
        confirm_email::resend,
        user_login::login,
        password_reset::forgot,
        password_reset::reset,
    ),
    components(schemas(
        Account,
        health::Health,
        user_register::UserRegister,
        user_register::RegisterResponse,
        confirm_email::ConfirmEmail,
        confirm_email::ResendConfirmation,
        user_login::UserLogin,
        password_reset::ForgotPassword,
        password_reset::ResetPassword,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "user", description = "Account and credential API")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_all_routes() {
        let doc = openapi();
        for path in [
            "/health",
            "/user/register",
            "/user/confirm-email",
            "/user/confirm-email/resend",
            "/user/login",
            "/user/password/forgot",
            "/user/password/reset",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
