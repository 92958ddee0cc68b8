//! Car listing API handlers
//!
//! Create and update take multipart forms so listing metadata and image
//! files arrive in one request. Ingestion runs first; the lifecycle service
//! is only invoked once every uploaded file has landed.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use cm_attachments::UploadedFile;
use cm_core::Id;
use cm_models::{Listing, ListingPatch, NewListing};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AppState, AuthenticatedUser};

/// Image file parts accepted per request
const MAX_IMAGES_PER_REQUEST: usize = 10;

/// GET /api/v1/cars
pub async fn list_listings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    let listings = state.listings.list_all(user.id()).await?;
    Ok(Json(to_responses(listings)))
}

/// GET /api/v1/cars/search?keyword=
pub async fn search_listings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<SearchParams>,
) -> ApiResult<impl IntoResponse> {
    let keyword = params.keyword.unwrap_or_default();
    let listings = state.listings.search(user.id(), &keyword).await?;
    Ok(Json(to_responses(listings)))
}

/// GET /api/v1/cars/:id
pub async fn get_listing(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let listing = state.listings.get(id).await?;
    Ok(Json(ListingResponse::from(listing)))
}

/// POST /api/v1/cars
pub async fn create_listing(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let (form, files) = read_listing_form(multipart).await?;

    let image_refs = state.ingestor.ingest(user.id(), files).await?;

    let params = NewListing {
        title: form.title.unwrap_or_default(),
        description: form.description.unwrap_or_default(),
        tags: form.tags,
    };
    let listing = state.listings.create(user.id(), params, image_refs).await?;

    Ok((StatusCode::CREATED, Json(ListingResponse::from(listing))))
}

/// PUT /api/v1/cars/:id
pub async fn update_listing(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let (form, files) = read_listing_form(multipart).await?;

    let image_refs = state.ingestor.ingest(user.id(), files).await?;

    let patch = ListingPatch {
        title: form.title,
        description: form.description,
        tags: if form.tags.is_empty() {
            None
        } else {
            Some(form.tags)
        },
    };
    let listing = state
        .listings
        .update(user.id(), id, patch, image_refs)
        .await?;

    Ok(Json(ListingResponse::from(listing)))
}

/// DELETE /api/v1/cars/:id
pub async fn delete_listing(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    state.listings.delete(user.id(), id).await?;
    Ok(Json(Confirmation {
        message: "Listing removed".to_string(),
    }))
}

/// Text fields collected from a multipart listing form
#[derive(Debug, Default)]
struct ListingForm {
    title: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
}

/// Buffer the multipart form: text fields into [`ListingForm`], image parts
/// into [`UploadedFile`]s. Unknown fields are drained and dropped.
async fn read_listing_form(
    mut multipart: Multipart,
) -> Result<(ListingForm, Vec<UploadedFile>), ApiError> {
    let mut form = ListingForm::default();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(read_text(field).await?),
            "description" => form.description = Some(read_text(field).await?),
            "tags" => {
                let raw = read_text(field).await?;
                form.tags.extend(
                    raw.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(String::from),
                );
            }
            "images" => {
                if files.len() >= MAX_IMAGES_PER_REQUEST {
                    return Err(ApiError::bad_request(format!(
                        "At most {} images per request",
                        MAX_IMAGES_PER_REQUEST
                    )));
                }
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(String::from);
                let data = read_bytes(field).await?;

                let mut file = UploadedFile::new(filename, data);
                if let Some(content_type) = content_type {
                    file = file.with_content_type(content_type);
                }
                files.push(file);
            }
            _ => {
                // drain and ignore
                let _ = read_bytes(field).await?;
            }
        }
    }

    Ok((form, files))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart field: {}", e)))
}

async fn read_bytes(field: axum::extract::multipart::Field<'_>) -> Result<Bytes, ApiError> {
    field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart field: {}", e)))
}

// DTOs

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub owner_id: Id,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            id: listing.id.unwrap_or_default(),
            title: listing.title,
            description: listing.description,
            tags: listing.tags,
            images: listing.images,
            owner_id: listing.owner_id,
            created_at: listing.created_at.to_rfc3339(),
            updated_at: listing.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Confirmation {
    message: String,
}

fn to_responses(listings: Vec<Listing>) -> Vec<ListingResponse> {
    listings.into_iter().map(ListingResponse::from).collect()
}
