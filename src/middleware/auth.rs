use crate::{
    server::SharedService,
    types::{AuthError, UnixTime},
    utils::crypto::{create_message, recover_signer},
};
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use ethers::types::{Address, Signature};
use tracing::warn;

/// Upper bound on transaction body size.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Address recovered from the request signature, inserted as a request
/// extension for the transaction handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatedSigner(pub Address);

fn header<'a>(request: &'a Request<Body>, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}

fn check_timestamp(timestamp: u64, max_drift: u64) -> Result<(), AuthError> {
    let now = UnixTime::now().0.max(0) as u64;
    if now.abs_diff(timestamp) > max_drift {
        return Err(AuthError::Expired);
    }
    Ok(())
}

pub async fn auth_middleware(
    State(service): State<SharedService>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    // Check timestamp first
    let timestamp = header(&request, "X-Timestamp")
        .and_then(|t| t.parse::<u64>().ok())
        .ok_or(AuthError::MalformedRequest)?;
    check_timestamp(timestamp, service.max_timestamp_drift_secs())?;

    let signature = header(&request, "X-Signature").ok_or(AuthError::MissingCredentials)?;
    let signature = hex::decode(signature.trim_start_matches("0x"))
        .ok()
        .and_then(|bytes| Signature::try_from(bytes.as_slice()).ok())
        .ok_or(AuthError::MalformedRequest)?;

    let (mut parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| AuthError::MalformedRequest)?;

    // The signature covers chain, timestamp and the exact body bytes.
    let message = create_message(service.chain_id(), timestamp, &body_bytes);
    let signer = recover_signer(&message, &signature).map_err(|_| {
        warn!("transaction signature recovery failed");
        AuthError::InvalidSignature
    })?;

    service.check_rate_limit(signer).await.map_err(|e| {
        warn!(signer = ?signer, "rate limit exceeded");
        e
    })?;

    parts.extensions.insert(AuthenticatedSigner(signer));
    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}
