/// Scheme family of a registered subnet endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Http,
    Ws,
}

/// Registries may store bare `host:port` endpoints. Local hosts get the plain scheme, any other
/// host the TLS one. Endpoints that already carry a scheme are returned unchanged.
pub fn sanitize_url_protocol(endpoint: &str, kind: EndpointKind) -> String {
    if endpoint.contains("://") {
        return endpoint.to_string();
    }

    let local = endpoint.starts_with("localhost") || endpoint.starts_with("127.0.0.1");
    let scheme = match (kind, local) {
        (EndpointKind::Http, true) => "http",
        (EndpointKind::Http, false) => "https",
        (EndpointKind::Ws, true) => "ws",
        (EndpointKind::Ws, false) => "wss",
    };
    format!("{scheme}://{endpoint}")
}
