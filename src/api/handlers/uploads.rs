use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::InspirationImage,
    error::{AppError, Result},
    uploads,
};

/// Accepts a multipart form with one `file` field.
pub async fn upload_inspiration(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<InspirationImage>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let image = uploads::save_inspiration_image(&state.settings.uploads.dir, &file_name, &data).await?;
        tracing::info!("{} uploaded inspiration image {}", current.user.email, image.path);

        return Ok((StatusCode::CREATED, Json(image)));
    }

    Err(AppError::BadRequest("No file in upload".to_string()))
}
