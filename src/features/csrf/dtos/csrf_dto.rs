use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Token to echo in the `x-csrf-token` header of mutating requests
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenDto {
    pub csrf_token: String,
}
