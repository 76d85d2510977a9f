use crate::{
    middleware::auth::AuthenticatedSigner,
    server::SharedService,
    types::{ChannelId, Coin, PaychanError, PaymentChannel, Tx},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use ethers::types::Address;
use serde::Serialize;
use std::str::FromStr;
use tracing::instrument;

#[derive(Debug, Serialize)]
pub struct TxResponse {
    /// Hex of the raw transaction output.
    pub data: String,
    pub log: String,
}

#[derive(Debug, Serialize)]
pub struct NonceResponse {
    pub nonce: u64,
}

fn parse_address(raw: &str) -> Result<Address, PaychanError> {
    Address::from_str(raw).map_err(|_| PaychanError::InvalidAddress(raw.to_string()))
}

pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

#[instrument(level = "debug", skip_all, fields(signer = ?signer, route = tx.msg.route()))]
pub async fn submit_tx(
    State(service): State<SharedService>,
    Extension(AuthenticatedSigner(signer)): Extension<AuthenticatedSigner>,
    Json(tx): Json<Tx>,
) -> Result<Json<TxResponse>, PaychanError> {
    let result = service.deliver_tx(signer, tx).await?;
    Ok(Json(TxResponse {
        data: hex::encode(result.data),
        log: result.log,
    }))
}

#[instrument(level = "debug", skip_all, fields(signer = ?signer, route = tx.msg.route()))]
pub async fn check_tx(
    State(service): State<SharedService>,
    Extension(AuthenticatedSigner(signer)): Extension<AuthenticatedSigner>,
    Json(tx): Json<Tx>,
) -> Result<StatusCode, PaychanError> {
    service.check_tx(signer, tx).await?;
    Ok(StatusCode::OK)
}

#[instrument(level = "debug", skip(service))]
pub async fn get_channel(
    State(service): State<SharedService>,
    Path(id): Path<String>,
) -> Result<Json<PaymentChannel>, PaychanError> {
    let id = ChannelId::from_str(&id)?;
    service
        .channel(id)
        .await?
        .map(Json)
        .ok_or(PaychanError::NotFound(id))
}

#[instrument(level = "debug", skip(service))]
pub async fn get_balance(
    State(service): State<SharedService>,
    Path(address): Path<String>,
) -> Result<Json<Vec<Coin>>, PaychanError> {
    let address = parse_address(&address)?;
    Ok(Json(service.balance(address).await?))
}

#[instrument(level = "debug", skip(service))]
pub async fn get_nonce(
    State(service): State<SharedService>,
    Path(address): Path<String>,
) -> Result<Json<NonceResponse>, PaychanError> {
    let address = parse_address(&address)?;
    let nonce = service.nonce(address).await?;
    Ok(Json(NonceResponse { nonce }))
}
