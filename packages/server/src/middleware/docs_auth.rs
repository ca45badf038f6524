use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Basic;
use tracing::warn;

use crate::error::AppError;

/// Basic credentials required to read the API documentation.
#[derive(Clone)]
pub struct DocsCredentials {
    username: Arc<str>,
    password: Arc<str>,
}

impl DocsCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn matches(&self, auth: &Authorization<Basic>) -> bool {
        auth.username() == &*self.username && auth.password() == &*self.password
    }
}

/// Reject documentation requests without the configured Basic credentials.
pub async fn require_docs_auth(
    State(credentials): State<DocsCredentials>,
    auth: Option<TypedHeader<Authorization<Basic>>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match auth {
        Some(TypedHeader(auth)) if credentials.matches(&auth) => Ok(next.run(request).await),
        Some(_) => {
            warn!(path = %request.uri().path(), "Rejected documentation credentials");
            Err(AppError::Unauthorized)
        }
        None => Err(AppError::Unauthorized),
    }
}
