//! Viewer extraction from bearer tokens.

use std::pin::Pin;

use actix_web::{FromRequest, HttpRequest, dev::Payload};

use blog_core::domain::Viewer;

/// The viewer behind a request, or `None` for anonymous requests.
///
/// A missing, malformed or expired token is an anonymous viewer, and the service
/// decides whether that viewer may proceed. Only a failing user store rejects.
#[derive(Debug, Clone, Default)]
pub struct CurrentViewer(pub Option<Viewer>);

impl CurrentViewer {
    pub fn get(&self) -> Option<&Viewer> {
        self.0.as_ref()
    }
}

#[cfg(feature = "auth")]
fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

impl FromRequest for CurrentViewer {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    #[cfg(feature = "auth")]
    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        use actix_web::web;

        use super::error::AppError;
        use crate::state::AppState;

        let token = bearer_token(req).map(str::to_owned);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let Some(token) = token else {
                return Ok(CurrentViewer(None));
            };
            let Some(state) = state else {
                tracing::error!("AppState not found in app data");
                return Ok(CurrentViewer(None));
            };

            let viewer = state
                .accounts
                .viewer_from_token(&token)
                .await
                .map_err(AppError::from)?;
            Ok(CurrentViewer(viewer))
        })
    }

    #[cfg(not(feature = "auth"))]
    fn from_request(_req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        Box::pin(async { Ok(CurrentViewer(None)) })
    }
}
