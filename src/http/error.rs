use std::borrow::Cow;

use axum::response::IntoResponse;
use axum::Json;
use hyper::StatusCode;

use crate::error::FeedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ApiErrorCode(pub u16);

impl ApiErrorCode {
	/// The requested route does not exist.
	pub const ROUTE_NOT_FOUND: Self = Self(404);
	/// The requested department id is not in the catalog.
	pub const UNKNOWN_DEPARTMENT: Self = Self(1000);
	/// A department feed could not be fetched or parsed.
	pub const UPSTREAM_ERROR: Self = Self(2000);
	/// Fetching the department feeds took too long.
	pub const UPSTREAM_TIMEOUT: Self = Self(2001);
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ApiError {
	#[serde(skip)]
	pub status_code: StatusCode,
	pub status: Cow<'static, str>,
	pub error_code: ApiErrorCode,
	pub error: Cow<'static, str>,
}

impl ApiError {
	pub fn new(status_code: StatusCode, error_code: ApiErrorCode, error: impl Into<Cow<'static, str>>) -> Self {
		Self {
			status_code,
			status: status_code.canonical_reason().unwrap_or("unknown").into(),
			error_code,
			error: error.into(),
		}
	}

	pub fn bad_request(error_code: ApiErrorCode, error: impl Into<Cow<'static, str>>) -> Self {
		Self::new(StatusCode::BAD_REQUEST, error_code, error)
	}

	pub fn not_found(error_code: ApiErrorCode, error: impl Into<Cow<'static, str>>) -> Self {
		Self::new(StatusCode::NOT_FOUND, error_code, error)
	}

	pub fn bad_gateway(error_code: ApiErrorCode, error: impl Into<Cow<'static, str>>) -> Self {
		Self::new(StatusCode::BAD_GATEWAY, error_code, error)
	}

	pub fn gateway_timeout(error_code: ApiErrorCode, error: impl Into<Cow<'static, str>>) -> Self {
		Self::new(StatusCode::GATEWAY_TIMEOUT, error_code, error)
	}
}

impl From<FeedError> for ApiError {
	fn from(err: FeedError) -> Self {
		match err {
			FeedError::UnknownDepartment(_) => {
				Self::bad_request(ApiErrorCode::UNKNOWN_DEPARTMENT, "unrecognised department id")
			}
			err if err.is_timeout() => {
				Self::gateway_timeout(ApiErrorCode::UPSTREAM_TIMEOUT, err.to_string())
			}
			err => Self::bad_gateway(ApiErrorCode::UPSTREAM_ERROR, err.to_string()),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> axum::http::Response<axum::body::Body> {
		(self.status_code, Json(self)).into_response()
	}
}
