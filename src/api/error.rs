use crate::auth::AuthenticationError;
use crate::error::ErrorKind;
use crate::model::enums::{MimeType, Privacy, ResourceType};
use crate::storage::StorageError;
use crate::string::SmallString;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every failure a request can produce. Variants holding foreign errors keep
/// their sources so the log line has the full chain; the client only ever
/// sees the rendered `ErrorResponse`.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub enum ApiError {
    #[error("Banner crop must be 3:1, got {0}x{1}")]
    BadBannerAspect(u32, u32),
    #[error("Crop does not fit within the source image")]
    CropOutOfBounds,
    #[error("File of type {0} did not match the extension of '{1}'")]
    ContentTypeMismatch(MimeType, SmallString),
    DecodePostId(#[from] crate::model::post_id::DecodePostIdError),
    #[error("Description exceeds {0} characters")]
    DescriptionTooLong(usize),
    #[error("No params provided")]
    EmptyUpdate,
    FailedAuthentication(#[from] AuthenticationError),
    FailedConnection(#[from] diesel::r2d2::PoolError),
    FailedQuery(#[from] diesel::result::Error),
    #[error("{0} belongs to another user")]
    Forbidden(ResourceType),
    HeaderDeserialization(#[from] axum::http::header::ToStrError),
    #[error("Posts cannot move back to draft once published")]
    IllegalDraftTransition,
    Image(#[from] image::ImageError),
    #[error("Could not decode upload as an image: {0}")]
    InvalidImage(image::ImageError),
    #[error("The given vote is invalid (vote value must be integer. 1 = up, -1 = down, 0 or null to remove vote)")]
    InvalidVote,
    JoinTask(#[from] tokio::task::JoinError),
    JsonRejection(#[from] axum::extract::rejection::JsonRejection),
    JsonSerialization(#[from] serde_json::Error),
    #[error("Icon crop must be square, got {0}x{1}")]
    NonSquareCrop(u32, u32),
    NotAnInteger(#[from] std::num::ParseIntError),
    #[error("{0} not found")]
    NotFound(ResourceType),
    #[error("This action requires you to be logged in")]
    NotLoggedIn,
    Multipart(#[from] axum::extract::multipart::MultipartError),
    MultipartRejection(#[from] axum::extract::multipart::MultipartRejection),
    #[error("Post already has privacy {0}")]
    SamePrivacy(Privacy),
    Cache(#[from] redis::RedisError),
    Request(#[from] reqwest::Error),
    StdIo(#[from] std::io::Error),
    Storage(#[from] StorageError),
    #[error("Title exceeds {0} characters")]
    TitleTooLong(usize),
    #[error("Posts cannot be made unpublished")]
    UnpublishablePrivacy,
    UnsupportedExtension(#[from] crate::model::enums::ParseExtensionError),
    #[error("{0} responded with status {1}")]
    UpstreamStatus(&'static str, u16),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        type QueryError = diesel::result::Error;

        match self {
            Self::JsonRejection(err) => err.status(),
            Self::Multipart(err) => err.status(),
            Self::MultipartRejection(err) => err.status(),
            Self::BadBannerAspect(..)
            | Self::CropOutOfBounds
            | Self::ContentTypeMismatch(..)
            | Self::DecodePostId(_)
            | Self::DescriptionTooLong(_)
            | Self::EmptyUpdate
            | Self::HeaderDeserialization(_)
            | Self::IllegalDraftTransition
            | Self::InvalidImage(_)
            | Self::InvalidVote
            | Self::NotAnInteger(_)
            | Self::NonSquareCrop(..)
            | Self::SamePrivacy(_)
            | Self::TitleTooLong(_)
            | Self::UnpublishablePrivacy => StatusCode::BAD_REQUEST,
            Self::FailedAuthentication(_) | Self::NotLoggedIn => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnsupportedExtension(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Request(_) | Self::UpstreamStatus(..) => StatusCode::BAD_GATEWAY,
            Self::FailedConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::FailedQuery(err) => match err {
                QueryError::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Cache(_)
            | Self::Image(_)
            | Self::JoinTask(_)
            | Self::JsonSerialization(_)
            | Self::StdIo(_)
            | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn category(&self) -> &'static str {
        match self {
            Self::BadBannerAspect(..) => "Bad Banner Aspect",
            Self::CropOutOfBounds => "Crop Out Of Bounds",
            Self::ContentTypeMismatch(..) => "Content Type Mismatch",
            Self::DecodePostId(_) => "Bad Post Id",
            Self::DescriptionTooLong(_) => "Description Too Long",
            Self::EmptyUpdate => "Empty Update",
            Self::FailedAuthentication(_) => "Failed Authentication",
            Self::FailedConnection(_) => "Failed Connection",
            Self::FailedQuery(_) => "Failed Query",
            Self::Forbidden(_) => "Forbidden",
            Self::HeaderDeserialization(_) => "Header Deserialization",
            Self::IllegalDraftTransition => "Illegal Draft Transition",
            Self::Image(_) => "Image Error",
            Self::InvalidImage(_) => "Invalid Image",
            Self::InvalidVote => "Invalid Vote",
            Self::JoinTask(_) => "Task Failure",
            Self::JsonRejection(_) => "JSON Rejection",
            Self::JsonSerialization(_) => "JSON Serialization Error",
            Self::NonSquareCrop(..) => "Non-Square Crop",
            Self::NotAnInteger(_) => "Parse Int Error",
            Self::NotFound(_) => "Resource Not Found",
            Self::NotLoggedIn => "Not Logged In",
            Self::Multipart(_) => "Multipart/Form-Data Error",
            Self::MultipartRejection(_) => "Multipart Rejection",
            Self::SamePrivacy(_) => "Same Privacy",
            Self::Cache(_) => "Cache Error",
            Self::Request(_) => "Request Error",
            Self::StdIo(_) => "IO Error",
            Self::Storage(_) => "Object Store Error",
            Self::TitleTooLong(_) => "Title Too Long",
            Self::UnpublishablePrivacy => "Unpublishable Privacy",
            Self::UnsupportedExtension(_) => "Unsupported Extension",
            Self::UpstreamStatus(..) => "Bad Gateway",
        }
    }
}

/// Body of every error response.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub title: &'static str,
    pub name: &'static str,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refid: Option<Uuid>,
}

pub fn map_foreign_key_violation<T>(
    result: diesel::QueryResult<T>,
    resource: crate::model::enums::ResourceType,
) -> ApiResult<T> {
    use diesel::result::DatabaseErrorKind;
    use diesel::result::Error as DieselError;

    match result {
        Ok(value) => Ok(value),
        Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => Err(ApiError::NotFound(resource)),
        Err(err) => Err(err.into()),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let response = if status.is_server_error() {
            // Unexpected condition: log details, surface only a reference id
            let refid = Uuid::new_v4();
            error!(%refid, "{}: {self}", self.kind());
            ErrorResponse {
                title: self.category(),
                name: self.kind(),
                description: format!("An internal error occurred. Reference: {refid}"),
                refid: Some(refid),
            }
        } else {
            ErrorResponse {
                title: self.category(),
                name: self.kind(),
                description: self.to_string(),
                refid: None,
            }
        };
        (status, Json(response)).into_response()
    }
}
