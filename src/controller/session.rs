//! Role resolution and one-time registration.

use actix_web::{get, post, web, Responder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    configuration::{AppState, State},
    error::Error,
    helpers::{normalize_address, parse_address},
    session::resolve_role,
    types::UserRole,
};

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub address: String,
    pub role: UserRole,
    pub registered: bool,
}

#[get("/role/{address}")]
pub async fn role(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<impl Responder, Error> {
    let address = parse_address(&path.into_inner())?;
    let wallet = normalize_address(&address);

    let role = resolve_role(&state.roles, &wallet, || {
        state.chain.get_user_role(address)
    })
    .await;

    Ok(web::Json(RoleResponse {
        address: wallet,
        role,
        registered: role.is_known(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub tx_hash: String,
    pub role: UserRole,
}

/// Registration is a one-time, irreversible on-chain action; an address
/// with an existing concrete role is refused upstream in the chain
/// client.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState<State>>,
    body: web::Json<RegisterRequest>,
) -> Result<impl Responder, Error> {
    let requested_role = body.into_inner().role;
    let tx_hash = state.chain.register(requested_role).await?;

    let wallet = state.chain.signer_address();
    if let Err(e) = state.roles.put(&wallet, requested_role) {
        warn!(wallet = %wallet, "could not persist registered role: {}", e);
    }

    Ok(web::Json(RegisterResponse {
        tx_hash,
        role: requested_role,
    }))
}
