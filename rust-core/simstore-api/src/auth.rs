// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Bearer-token authentication for mutating simulation requests.
//!
//! Reads (`GET`, `HEAD`, `OPTIONS`) always pass, including schema discovery.
//! `PUT`, `POST` and `DELETE` require `Authorization: Bearer <token>` when a
//! token is configured; with no token configured everything passes.

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::ErrorResponse;

/// Shared authentication state.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    /// SHA-256 of the configured token; `None` disables authentication.
    token_hash: Option<[u8; 32]>,
}

impl AuthState {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token_hash: token.map(hash_token),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.token_hash.is_some()
    }

    fn accepts(&self, presented: &str) -> bool {
        self.token_hash
            .map(|expected| expected == hash_token(presented))
            .unwrap_or(true)
    }
}

fn hash_token(token: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(token.as_bytes()));
    out
}

fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Axum middleware guarding mutating requests.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    if !auth.is_enabled() || is_read_only(request.method()) {
        return next.run(request).await;
    }

    let verdict = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| auth.accepts(token));

    match verdict {
        Some(true) => next.run(request).await,
        Some(false) => {
            warn!(method = %request.method(), path = %request.uri().path(), "rejected token");
            unauthorized("Invalid token")
        }
        None => unauthorized("Missing bearer token"),
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
            code: StatusCode::UNAUTHORIZED.as_u16(),
        }),
    )
        .into_response()
}
