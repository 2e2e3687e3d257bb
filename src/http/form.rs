//! Form body extractor accepting both urlencoded and multipart submissions.

use std::collections::HashMap;

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;

use crate::error::AppError;
use crate::images::StoredImage;

/// A file part of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Encode for storage; `None` for files outside the image allow-list.
    pub fn to_image(&self) -> Option<StoredImage> {
        StoredImage::from_upload(&self.file_name, &self.bytes)
    }
}

/// Submitted form fields. Text fields repeat last-wins; files keep every part.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

impl FormData {
    /// Text field value, empty when absent.
    pub fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn trimmed(&self, name: &str) -> &str {
        self.text(name).trim()
    }

    /// Files submitted under `name`, in submission order.
    pub fn files<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a UploadedFile> + 'a {
        self.files.iter().filter(move |f| f.field == name)
    }

    /// First acceptable image submitted under `name`.
    pub fn image(&self, name: &str) -> Option<StoredImage> {
        self.files(name).find_map(UploadedFile::to_image)
    }

    /// Every acceptable image submitted under `name`; others are skipped.
    pub fn images(&self, name: &str) -> Vec<StoredImage> {
        self.files(name).filter_map(UploadedFile::to_image).collect()
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    form.files.push(UploadedFile { field: name, file_name, bytes });
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state).await?;
            Ok(FormData { fields, files: Vec::new() })
        } else {
            // Handlers treat missing fields as invalid input and redirect
            tracing::debug!(%content_type, "Form body without a form content type");
            Ok(FormData::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    const BOUNDARY: &str = "XcatBoundaryX";

    fn multipart_request(body: String) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn file_part(name: &str, file_name: &str, content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
Content-Type: application/octet-stream\r\n\r\n{content}\r\n"
        )
    }

    #[tokio::test]
    async fn test_urlencoded_form() {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=+Whiskers+&location=Back%20yard"))
            .unwrap();

        let form = FormData::from_request(req, &()).await.unwrap();
        assert_eq!(form.trimmed("name"), "Whiskers");
        assert_eq!(form.text("location"), "Back yard");
        assert_eq!(form.text("notes"), "");
        assert!(form.image("image").is_none());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_an_empty_form() {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("name=Whiskers"))
            .unwrap();
        let form = FormData::from_request(req, &()).await.unwrap();
        assert_eq!(form.text("name"), "");

        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("name=Whiskers"))
            .unwrap();
        let form = FormData::from_request(req, &()).await.unwrap();
        assert_eq!(form.files("image").count(), 0);
        assert_eq!(form.trimmed("name"), "");
    }

    #[tokio::test]
    async fn test_multipart_fields_and_files() {
        let body = [
            text_part("cat_id", "3"),
            text_part("notes", "on the fence"),
            file_part("photos", "a.png", "one"),
            file_part("photos", "b.txt", "two"),
            file_part("photos", "c.webp", "three"),
            file_part("image", "", ""),
            format!("--{BOUNDARY}--\r\n"),
        ]
        .concat();

        let form = FormData::from_request(multipart_request(body), &()).await.unwrap();
        assert_eq!(form.text("cat_id"), "3");
        assert_eq!(form.text("notes"), "on the fence");
        assert_eq!(form.files("photos").count(), 3);

        let images = form.images("photos");
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].mime_type, "image/png");
        assert_eq!(images[1].mime_type, "image/webp");

        // An empty file input is not an image
        assert!(form.image("image").is_none());
    }
}
