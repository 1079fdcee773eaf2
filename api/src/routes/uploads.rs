use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::services::uploads::{self, UploadError, UploadedImage};
use axum::{
    Json, Router,
    extract::Multipart,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

pub fn upload_routes() -> Router<util::state::AppState> {
    Router::new().route("/", post(upload_file))
}

/// POST /uploads
///
/// Accepts one multipart `file` field, pushes it to the image host and
/// returns the public URL. Available to both end users and staff; the
/// attachment row itself is created when the message referencing the URL is
/// sent.
///
/// ### Responses
/// - `201 Created` → `{ "url", "filename", "mime_type", "size" }`
/// - `400 Bad Request` → missing file, non-image type, or > 10MB payload
/// - `502 Bad Gateway` → the image host rejected the upload
async fn upload_file(mut multipart: Multipart) -> impl IntoResponse {
    let mut file: Option<(Vec<u8>, String, String)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field.content_type().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        file = Some((bytes.to_vec(), filename, mime_type));
                        break;
                    }
                    Err(_) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(ApiResponse::<Empty>::error("Could not read uploaded file")),
                        )
                            .into_response();
                    }
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<Empty>::error("Malformed multipart payload")),
                )
                    .into_response();
            }
        }
    }

    let Some((bytes, filename, mime_type)) = file else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error("No file provided")),
        )
            .into_response();
    };

    match uploads::upload_image(&bytes, &filename, &mime_type).await {
        Ok(uploaded) => (
            StatusCode::CREATED,
            Json(ApiResponse::<UploadedImage>::success(
                uploaded,
                "File uploaded successfully",
            )),
        )
            .into_response(),
        Err(e @ (UploadError::UnsupportedType | UploadError::TooLarge)) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(e.to_string())),
        )
            .into_response(),
        Err(e @ UploadError::Failed(_)) => {
            tracing::warn!(error = %e, "Image upload failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::<Empty>::error("Image upload failed")),
            )
                .into_response()
        }
    }
}
