pub mod handlers;
pub mod routes;

use async_trait::async_trait;
use axum::{
    extract::{rejection::FormRejection, FromRequest, Multipart, Request},
    http::header,
    Form,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub voice: String,
}

#[derive(Debug, Deserialize)]
struct TextField {
    text: String,
}

/// The `text` form field, accepted either url-encoded or as multipart.
#[derive(Debug)]
pub struct TextForm {
    pub text: String,
}

#[async_trait]
impl<S> FromRequest<S> for TextForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Form(field) = Form::<TextField>::from_request(req, state)
                .await
                .map_err(|rejection| match rejection {
                    FormRejection::FailedToDeserializeForm(_)
                    | FormRejection::FailedToDeserializeFormBody(_) => {
                        AppError::MissingField("text".into())
                    }
                    other => AppError::Rejected(other.status(), other.body_text()),
                })?;
            return Ok(Self { text: field.text });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Rejected(rejection.status(), rejection.body_text()))?;

        while let Some(field) = multipart.next_field().await? {
            if field.name() == Some("text") {
                let text = field.text().await?;
                return Ok(Self { text });
            }
        }

        Err(AppError::MissingField("text".into()))
    }
}
