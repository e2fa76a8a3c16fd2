use axum::http::{header::USER_AGENT, HeaderMap};

use crate::auth::ClientInfo;

/// Caller identity as seen through the proxy: first `x-forwarded-for` hop,
/// else `client-ip`
pub fn client_info(headers: &HeaderMap) -> ClientInfo {
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    let ip_address = forwarded
        .or_else(|| header_str(headers, "client-ip").map(str::trim))
        .filter(|ip| !ip.is_empty())
        .map(str::to_string);

    ClientInfo {
        ip_address,
        user_agent: header_str(headers, USER_AGENT.as_str()).map(str::to_string),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn first_forwarded_hop_is_the_client() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.4, 10.0.0.1"));
        headers.insert("client-ip", HeaderValue::from_static("10.0.0.9"));
        headers.insert("user-agent", HeaderValue::from_static("curl/8.0"));

        let info = client_info(&headers);
        assert_eq!(info.ip_address.as_deref(), Some("198.51.100.4"));
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn falls_back_to_client_ip_then_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("client-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_info(&headers).rate_limit_key(), "10.0.0.9");
        assert_eq!(client_info(&HeaderMap::new()).rate_limit_key(), "unknown");
    }
}
