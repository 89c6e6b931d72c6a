use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};

use crate::database::models::ItemInput;
use crate::error::ApiError;
use crate::media::Upload;

/// Form field carrying the photo
pub const IMAGE_FIELD: &str = "image";

/// Item fields plus an optional photo, read from a multipart, JSON or
/// urlencoded body. Any other body is treated as carrying no fields.
#[derive(Debug, Default)]
pub struct ItemForm {
    pub input: ItemInput,
    pub upload: Option<Upload>,
}

#[async_trait]
impl<S> FromRequest<S> for ItemForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::body_rejection(e.status(), e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        if content_type.starts_with("application/json") {
            let Json(input) = Json::<ItemInput>::from_request(req, state)
                .await
                .map_err(|e| ApiError::body_rejection(e.status(), e.body_text()))?;
            return Ok(Self { input, upload: None });
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(input) = Form::<ItemInput>::from_request(req, state)
                .await
                .map_err(|e| ApiError::body_rejection(e.status(), e.body_text()))?;
            return Ok(Self { input, upload: None });
        }

        Ok(Self::default())
    }
}

impl ItemForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = ItemForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::body_rejection(e.status(), e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == IMAGE_FIELD {
                if form.upload.is_some() {
                    return Err(ApiError::validation("Only one image may be attached"));
                }
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::body_rejection(e.status(), e.body_text()))?;
                form.upload = Some(Upload {
                    file_name,
                    content_type,
                    bytes,
                });
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| ApiError::body_rejection(e.status(), e.body_text()))?;
            if !form.input.set_field(&name, value) {
                tracing::debug!("Ignoring form field '{}'", name);
            }
        }

        Ok(form)
    }
}
