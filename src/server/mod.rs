use crate::{
    handlers::TxResult,
    middleware::auth::auth_middleware,
    types::{AuthError, ChannelId, Coin, PaychanError, PaymentChannel, Tx},
};
use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ethers::types::Address;
use serde::Serialize;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod api;

pub const HEALTH_PATH: &str = "/health";
pub const SUBMIT_TX_PATH: &str = "/tx";
pub const CHECK_TX_PATH: &str = "/tx/check";
// axum 0.7 path parameter syntax.
pub const CHANNEL_PATH: &str = "/channels/:id";
pub const BALANCE_PATH: &str = "/balances/:address";
pub const NONCE_PATH: &str = "/nonces/:address";

/// What the HTTP layer needs from a node.
#[async_trait]
pub trait TxService: Send + Sync + 'static {
    fn chain_id(&self) -> &str;
    fn max_timestamp_drift_secs(&self) -> u64;
    async fn check_rate_limit(&self, signer: Address) -> Result<(), AuthError>;
    async fn deliver_tx(&self, signer: Address, tx: Tx) -> Result<TxResult, PaychanError>;
    async fn check_tx(&self, signer: Address, tx: Tx) -> Result<(), PaychanError>;
    async fn channel(&self, id: ChannelId) -> Result<Option<PaymentChannel>, PaychanError>;
    async fn balance(&self, address: Address) -> Result<Vec<Coin>, PaychanError>;
    async fn nonce(&self, address: Address) -> Result<u64, PaychanError>;
}

pub type SharedService = Arc<dyn TxService>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub log: String,
}

impl IntoResponse for PaychanError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        let body = ErrorBody {
            code: self.code(),
            log: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn make_router(service: SharedService) -> Router {
    let tx_routes = Router::new()
        .route(SUBMIT_TX_PATH, post(api::submit_tx))
        .route(CHECK_TX_PATH, post(api::check_tx))
        .route_layer(axum::middleware::from_fn_with_state(
            service.clone(),
            auth_middleware,
        ));

    Router::new()
        .route(HEALTH_PATH, get(api::health_check))
        .route(CHANNEL_PATH, get(api::get_channel))
        .route(BALANCE_PATH, get(api::get_balance))
        .route(NONCE_PATH, get(api::get_nonce))
        .merge(tx_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

pub async fn run_server(socket_address: SocketAddr, service: SharedService) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(socket_address).await?;
    info!("Serving channel node on {}", listener.local_addr()?);
    axum::serve(listener, make_router(service).into_make_service()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{NodeConfig, RateLimitConfig},
        state::{channel::ChannelState, node::Node},
        types::{CloseMsg, CreateMsg, Msg, Payment, TransferMsg, UnixTime},
        utils::crypto::{create_message, sign_message, sign_payment, wallet_pubkey},
    };
    use axum::{
        body::Body,
        http::{self, HeaderMap, HeaderValue, Request},
    };
    use ethers::signers::{LocalWallet, Signer};
    use std::str::FromStr;
    use tower::util::ServiceExt;

    const CHAIN_ID: &str = "http-chain";

    // Helper function to create a test wallet with a known private key
    fn create_test_wallet() -> LocalWallet {
        LocalWallet::from_str("1234567890123456789012345678901234567890123456789012345678901234")
            .unwrap()
    }

    fn doge(amount: &str) -> Coin {
        format!("{} DOGE", amount).parse().unwrap()
    }

    fn create_test_app(max_requests: u64) -> Router {
        let mut config = NodeConfig::for_testing(CHAIN_ID);
        config.rate_limit = RateLimitConfig {
            max_requests,
            window_secs: 60,
        };
        let mut node = Node::in_memory(CHAIN_ID);
        node.credit(&create_test_wallet().address(), &doge("100"))
            .unwrap();
        make_router(Arc::new(ChannelState::new(node, &config)))
    }

    fn create_tx(wallet: &LocalWallet, nonce: u64, destination: Address) -> Tx {
        Tx {
            nonce,
            msg: Msg::Create(CreateMsg {
                source: wallet.address(),
                source_pubkey: wallet_pubkey(wallet),
                destination,
                total: Some(doge("10")),
                timeout: UnixTime::now().add_secs(3_600),
                memo: "http".to_string(),
            }),
        }
    }

    fn now_secs() -> u64 {
        UnixTime::now().0 as u64
    }

    fn create_signed_headers(wallet: &LocalWallet, body: &[u8], timestamp: u64) -> HeaderMap {
        let message = create_message(CHAIN_ID, timestamp, body);
        let signature = sign_message(wallet, &message).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Signature",
            HeaderValue::from_str(&hex::encode(signature.to_vec())).unwrap(),
        );
        headers.insert(
            "X-Timestamp",
            HeaderValue::from_str(&timestamp.to_string()).unwrap(),
        );
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    async fn send_tx(app: Router, path: &str, headers: HeaderMap, body: Vec<u8>) -> Response {
        let request = Request::builder()
            .method(http::Method::POST)
            .uri(path)
            .body(Body::from(body))
            .unwrap();

        let request = {
            let (mut parts, body) = request.into_parts();
            parts.headers = headers;
            Request::from_parts(parts, body)
        };

        app.oneshot(request).await.unwrap()
    }

    async fn submit(app: &Router, wallet: &LocalWallet, tx: &Tx) -> Response {
        let body = serde_json::to_vec(tx).unwrap();
        let headers = create_signed_headers(wallet, &body, now_secs());
        send_tx(app.clone(), SUBMIT_TX_PATH, headers, body).await
    }

    async fn get(app: &Router, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_submit_create_and_query() {
        let app = create_test_app(100);
        let wallet = create_test_wallet();
        let destination = Address::random();

        let response = submit(&app, &wallet, &create_tx(&wallet, 0, destination)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"], "0000000000000001");

        let response = get(&app, "/channels/0000000000000001").await;
        assert_eq!(response.status(), StatusCode::OK);
        let channel: PaymentChannel = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(channel.destination, destination);
        assert_eq!(channel.total, doge("10"));

        let response = get(&app, &format!("/balances/{:?}", wallet.address())).await;
        let balance: Vec<Coin> = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(balance, vec![doge("90")]);

        let response = get(&app, &format!("/nonces/{:?}", wallet.address())).await;
        assert_eq!(json_body(response).await["nonce"], 1);
    }

    #[tokio::test]
    async fn test_full_channel_over_http() {
        let app = create_test_app(100);
        let source = create_test_wallet();
        let destination = LocalWallet::new(&mut rand::thread_rng());

        let response = submit(&app, &source, &create_tx(&source, 0, destination.address())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let id = ChannelId::from(1);

        // Anyone holding the signed claim may submit it; here the destination does.
        let payment = Payment {
            chain_id: CHAIN_ID.to_string(),
            channel_id: id,
            amount: doge("4"),
            memo: "api calls".to_string(),
        };
        let transfer = Tx {
            nonce: 0,
            msg: Msg::Transfer(TransferMsg {
                signature: sign_payment(&source, &payment).unwrap(),
                payment,
            }),
        };
        let response = submit(&app, &destination, &transfer).await;
        assert_eq!(response.status(), StatusCode::OK);

        let close = Tx {
            nonce: 1,
            msg: Msg::Close(CloseMsg {
                channel_id: id,
                memo: String::new(),
            }),
        };
        let response = submit(&app, &destination, &close).await;
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(get(&app, "/channels/0000000000000001").await.status(), StatusCode::NOT_FOUND);
        let response = get(&app, &format!("/balances/{:?}", source.address())).await;
        let balance: Vec<Coin> = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(balance, vec![doge("96")]);
    }

    #[tokio::test]
    async fn test_rejections_carry_code() {
        let app = create_test_app(100);
        let wallet = create_test_wallet();
        let stranger = LocalWallet::new(&mut rand::thread_rng());

        // Signed by someone other than the channel source.
        let response = submit(&app, &stranger, &create_tx(&wallet, 0, Address::random())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "unauthorized");

        let close = Tx {
            nonce: 0,
            msg: Msg::Close(CloseMsg {
                channel_id: ChannelId::from(9),
                memo: String::new(),
            }),
        };
        let response = submit(&app, &wallet, &close).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], "not_found");
    }

    #[tokio::test]
    async fn test_check_tx_does_not_commit() {
        let app = create_test_app(100);
        let wallet = create_test_wallet();
        let body = serde_json::to_vec(&create_tx(&wallet, 0, Address::random())).unwrap();

        let headers = create_signed_headers(&wallet, &body, now_secs());
        let response = send_tx(app.clone(), CHECK_TX_PATH, headers, body).await;
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(get(&app, "/channels/0000000000000001").await.status(), StatusCode::NOT_FOUND);
        let response = get(&app, &format!("/nonces/{:?}", wallet.address())).await;
        assert_eq!(json_body(response).await["nonce"], 0);
    }

    #[tokio::test]
    async fn test_invalid_signature() {
        let app = create_test_app(100);
        let wallet = create_test_wallet();
        let body = serde_json::to_vec(&create_tx(&wallet, 0, Address::random())).unwrap();

        let mut headers = create_signed_headers(&wallet, &body, now_secs());
        // Create an obviously invalid signature
        let invalid_sig = hex::encode([1u8; 65]);
        headers.insert("X-Signature", HeaderValue::from_str(&invalid_sig).unwrap());

        let response = send_tx(app, SUBMIT_TX_PATH, headers, body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_and_malformed_headers() {
        let app = create_test_app(100);
        let wallet = create_test_wallet();
        let body = serde_json::to_vec(&create_tx(&wallet, 0, Address::random())).unwrap();

        let mut headers = create_signed_headers(&wallet, &body, now_secs());
        headers.remove("X-Signature");
        let response = send_tx(app.clone(), SUBMIT_TX_PATH, headers, body.clone()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut headers = create_signed_headers(&wallet, &body, now_secs());
        headers.remove("X-Timestamp");
        let response = send_tx(app.clone(), SUBMIT_TX_PATH, headers, body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut headers = create_signed_headers(&wallet, &body, now_secs());
        headers.insert("X-Signature", HeaderValue::from_static("invalid-signature"));
        let response = send_tx(app.clone(), SUBMIT_TX_PATH, headers, body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stale_timestamp() {
        let app = create_test_app(100);
        let wallet = create_test_wallet();
        let body = serde_json::to_vec(&create_tx(&wallet, 0, Address::random())).unwrap();

        for timestamp in [now_secs() - 301, now_secs() + 301] {
            let headers = create_signed_headers(&wallet, &body, timestamp);
            let response = send_tx(app.clone(), SUBMIT_TX_PATH, headers, body.clone()).await;
            assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        }
    }

    #[tokio::test]
    async fn test_rate_limiting() {
        let app = create_test_app(3);
        let wallet = create_test_wallet();

        for i in 0..5u64 {
            let response = submit(&app, &wallet, &create_tx(&wallet, i, Address::random())).await;
            if i < 3 {
                assert_eq!(response.status(), StatusCode::OK, "Request {} should succeed", i);
            } else {
                assert_eq!(
                    response.status(),
                    StatusCode::TOO_MANY_REQUESTS,
                    "Request {} should be rate limited",
                    i
                );
            }
        }
    }

    #[tokio::test]
    async fn test_bad_query_params() {
        let app = create_test_app(100);
        assert_eq!(get(&app, "/channels/zz").await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(get(&app, "/balances/nope").await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(get(&app, HEALTH_PATH).await.status(), StatusCode::OK);
    }
}
