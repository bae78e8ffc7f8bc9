use axum::{
    Json, Router,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::sync::Arc;

use crate::{ServerError, entry, user};
use api_types::Health;
use engine::{Engine, Identity, IdentityError, IdentityVerifier, TokenIssuer};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub issuer: Arc<dyn TokenIssuer>,
}

impl ServerState {
    /// Build the state from an identity provider that both verifies and
    /// issues bearer tokens.
    pub fn new<I>(engine: Engine, identity: Arc<I>) -> Self
    where
        I: IdentityVerifier + TokenIssuer + 'static,
    {
        Self {
            engine: Arc::new(engine),
            verifier: identity.clone(),
            issuer: identity,
        }
    }
}

/// The authenticated caller of an entry endpoint.
///
/// Requests must carry `Authorization: Bearer <token>`. A missing or
/// malformed header and a token that does not verify are both rejected
/// before the handler runs.
#[derive(Debug)]
pub struct Caller(pub Identity);

impl FromRequestParts<ServerState> for Caller {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(TypedHeader(Authorization(bearer))) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
        else {
            return Err(IdentityError::MissingToken.into());
        };

        let identity = state.verifier.verify(bearer.token())?;
        Ok(Caller(identity))
    }
}

async fn health() -> Json<Health> {
    Json(Health { ok: true })
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/register", post(user::register))
        .route("/api/login", post(user::login))
        .route("/api/user/{id}", get(user::get).patch(user::patch))
        .route("/api/viaticos", get(entry::list).post(entry::entry_new))
        .route(
            "/api/viaticos/{id}",
            get(entry::get).put(entry::update).delete(entry::delete),
        )
        .with_state(state)
}

pub async fn run_with_listener<I>(
    engine: Engine,
    identity: Arc<I>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error>
where
    I: IdentityVerifier + TokenIssuer + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState::new(engine, identity);

    axum::serve(listener, router(state)).await
}
