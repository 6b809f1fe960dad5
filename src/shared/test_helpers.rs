#[cfg(test)]
use crate::features::auth::model::AuthenticatedUser;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};

#[cfg(test)]
pub fn create_supervisor_user() -> AuthenticatedUser {
    AuthenticatedUser {
        account_id: "test-account-id".to_string(),
        sub: "test-sub".to_string(),
        session_uid: Some("test-session-uid".to_string()),
        roles: vec!["supervisor".to_string()],
    }
}

#[cfg(test)]
async fn inject_supervisor_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_supervisor_user());
    next.run(request).await
}

#[cfg(test)]
#[allow(dead_code)]
pub fn with_supervisor_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_supervisor_middleware))
}
