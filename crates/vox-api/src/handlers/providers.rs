//! Provider listing handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use vox_models::ProviderKind;

use crate::auth::AuthUser;
use crate::state::AppState;

/// Provider listing response.
#[derive(Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderInfo>,
}

#[derive(Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub configured: bool,
}

/// GET /api/providers
///
/// Which generation vendors this deployment can submit to.
pub async fn list_providers(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Json<ProvidersResponse> {
    let providers = ProviderKind::all()
        .into_iter()
        .map(|kind| ProviderInfo {
            name: kind.to_string(),
            configured: state.providers.is_configured(kind),
        })
        .collect();

    Json(ProvidersResponse { providers })
}
