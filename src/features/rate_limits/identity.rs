use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, Extensions, HeaderMap},
};

use crate::shared::constants::{UNKNOWN_IDENTITY, USER_ID_HEADER};

/// Key a caller's rate-limit window is stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

impl ClientIdentity {
    /// `x-user-id` header when present and non-empty, else the peer IP, else
    /// `"unknown"`
    pub fn resolve(headers: &HeaderMap, extensions: &Extensions) -> Self {
        let from_header = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let identity = from_header
            .or_else(|| {
                extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| UNKNOWN_IDENTITY.to_string());

        Self(identity)
    }
}

impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::resolve(&parts.headers, &parts.extensions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_wins_over_peer_address() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("user-42"));
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo::<SocketAddr>(([10, 0, 0, 1], 4000).into()));

        assert_eq!(
            ClientIdentity::resolve(&headers, &extensions),
            ClientIdentity("user-42".to_string())
        );
    }

    #[test]
    fn test_falls_back_to_peer_ip_then_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo::<SocketAddr>(([10, 0, 0, 1], 4000).into()));

        assert_eq!(
            ClientIdentity::resolve(&headers, &extensions).0,
            "10.0.0.1"
        );
        assert_eq!(
            ClientIdentity::resolve(&HeaderMap::new(), &Extensions::new()).0,
            UNKNOWN_IDENTITY
        );
    }
}
