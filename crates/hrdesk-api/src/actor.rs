//! Caller identity from the `x-employee-id` header.
//!
//! Session handling lives in front of this API; by the time a request lands
//! here the header names an authenticated employee.

use axum::{extract::FromRequestParts, http::request::Parts};
use hrdesk_core::{Error as CoreError, employee::Employee, service, store::DocumentStore};

use crate::{ApiState, error::ApiError};

pub const ACTOR_HEADER: &str = "x-employee-id";

/// The active employee making the request.
pub struct Actor(pub Employee);

impl<S> FromRequestParts<ApiState<S>> for Actor
where
  S: DocumentStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let id = parts
      .headers
      .get(ACTOR_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|id| !id.is_empty())
      .ok_or_else(|| ApiError::Unauthorized(format!("missing {ACTOR_HEADER} header")))?;

    match service::authenticate(state.store.as_ref(), id).await {
      Ok(employee) => Ok(Actor(employee)),
      Err(CoreError::EmployeeNotFound(_)) => {
        Err(ApiError::Unauthorized("unknown employee".to_owned()))
      }
      Err(e) => Err(e.into()),
    }
  }
}
