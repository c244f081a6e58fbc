//! Service greeting at `/`.

use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Greeting {
    pub user: String,
}

/// GET / - Greeting, doubles as the simplest liveness probe
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = Greeting),
    ),
))]
pub async fn greeting() -> Json<Greeting> {
    Json(Greeting {
        user: "giddy up".to_string(),
    })
}
