use bluebird_core::utils::{
    config::{GatewayConfig, WeatherConfig},
    connection::{
        gateway::{format_query_time, Gateway, WeatherClient},
        http::{encode_request, parse_response, parse_url, HttpRequest, Method, TransportError, Url},
    },
    sources::{SourceError, ValueSource},
};
use embassy_futures::block_on;

mod support;
use support::*;

// 2024-03-05 11:04:09 UTC
const EPOCH: i64 = 1_709_636_649;

fn gateway_config() -> GatewayConfig {
    GatewayConfig {
        login_url: "http://api.example.org/auth/login".into(),
        data_endpoint: "http://api.example.org/rooms/".into(),
        room_id: "L3.36".into(),
        username: "bluebird".into(),
        password: "s3cret".into(),
        ..GatewayConfig::default()
    }
}

#[test]
fn query_time_is_local_time() {
    assert_eq!(format_query_time(EPOCH, 3_600).as_deref(), Some("2024-03-05 12:04:09"));
    assert_eq!(format_query_time(EPOCH, 0).as_deref(), Some("2024-03-05 11:04:09"));
}

#[test]
fn login_stores_token_and_fetch_uses_it() {
    let transport = ScriptedTransport::new()
        .respond(200, r#"{"accessToken":"abc123","expiresIn":3600}"#)
        .respond(200, r#"[{"type":"co2","value":642}]"#);
    let mut gw = Gateway::new(transport, FixedClock(Some(EPOCH)), gateway_config());

    block_on(gw.login()).unwrap();
    assert!(gw.is_authenticated());
    assert_eq!(gw.state().access_token.as_deref(), Some("abc123"));

    let reading = block_on(gw.sample());
    assert_eq!(reading, Ok(642.0));

    let requests = &gw.transport().requests;
    assert_eq!(requests.len(), 2);

    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].url, "http://api.example.org/auth/login");
    assert_eq!(
        requests[0].body.as_deref(),
        Some(r#"{"username":"bluebird","password":"s3cret"}"#)
    );
    assert_eq!(requests[0].bearer, None);

    assert_eq!(requests[1].method, Method::Get);
    assert_eq!(
        requests[1].url,
        "http://api.example.org/rooms/L3.36/data?startTime=2024-03-05%2012:04:09&endTime=2024-03-05%2012:04:09"
    );
    assert_eq!(requests[1].bearer.as_deref(), Some("abc123"));
}

#[test]
fn login_failure_keeps_gateway_unauthenticated() {
    let transport = ScriptedTransport::new()
        .respond(401, r#"{"error":"bad credentials"}"#)
        .respond(200, r#"{"expiresIn":3600}"#);
    let mut gw = Gateway::new(transport, FixedClock(Some(EPOCH)), gateway_config());

    assert_eq!(block_on(gw.login()), Err(SourceError::Http(401)));
    assert_eq!(block_on(gw.login()), Err(SourceError::MissingToken));
    assert!(!gw.is_authenticated());

    // Without a token the fetch is skipped before any request goes out.
    assert_eq!(block_on(gw.fetch_reading()), Err(SourceError::NotAuthenticated));
    assert_eq!(gw.transport().requests.len(), 2);
}

#[test]
fn offline_gateway_sends_nothing() {
    let transport = ScriptedTransport::new().offline();
    let mut gw = Gateway::new(transport, FixedClock(Some(EPOCH)), gateway_config());

    assert_eq!(block_on(gw.login()), Err(SourceError::NotConnected));
    assert_eq!(block_on(gw.fetch_reading()), Err(SourceError::NotConnected));
    assert!(gw.transport().requests.is_empty());
}

#[test]
fn fetch_reports_http_and_transport_errors() {
    let transport = ScriptedTransport::new()
        .respond(200, r#"{"token":"t"}"#)
        .respond(503, "")
        .fail(TransportError::Connect)
        .respond(200, "not json");
    let mut gw = Gateway::new(transport, FixedClock(Some(EPOCH)), gateway_config());
    block_on(gw.login()).unwrap();

    assert_eq!(block_on(gw.fetch_reading()), Err(SourceError::Http(503)));
    assert_eq!(
        block_on(gw.fetch_reading()),
        Err(SourceError::Transport(TransportError::Connect))
    );
    assert_eq!(block_on(gw.fetch_reading()), Err(SourceError::InvalidJson));
}

#[test]
fn fetch_needs_the_clock() {
    let transport = ScriptedTransport::new().respond(200, r#"{"access_token":"t"}"#);
    let mut gw = Gateway::new(transport, FixedClock(None), gateway_config());
    block_on(gw.login()).unwrap();

    assert_eq!(block_on(gw.fetch_reading()), Err(SourceError::ClockNotSet));
    assert_eq!(gw.transport().requests.len(), 1);
}

#[test]
fn weather_client_reads_configured_field() {
    let transport = ScriptedTransport::new()
        .respond(200, r#"{"current":{"temperature_2m":9.5}}"#);
    let mut weather = WeatherClient::new(transport, WeatherConfig::default());

    assert_eq!(block_on(weather.sample()), Ok(9.5));
}

#[test]
fn url_parsing() {
    assert_eq!(
        parse_url("http://api.example.org:8080/rooms/1?x=y"),
        Ok(Url {
            host: "api.example.org",
            port: 8080,
            path: "/rooms/1?x=y",
        })
    );
    assert_eq!(
        parse_url("http://10.0.0.2"),
        Ok(Url {
            host: "10.0.0.2",
            port: 80,
            path: "/",
        })
    );
    assert_eq!(parse_url("http://example.org?q=1"), Err(TransportError::InvalidUrl));
    assert_eq!(parse_url("https://example.org/"), Err(TransportError::UnsupportedScheme));
    assert_eq!(parse_url("ftp://example.org/"), Err(TransportError::InvalidUrl));
    assert_eq!(parse_url("http://:80/"), Err(TransportError::InvalidUrl));
    assert_eq!(parse_url("http://host:http/"), Err(TransportError::InvalidUrl));
}

#[test]
fn request_encoding() {
    let url = parse_url("http://api.example.org/auth/login").unwrap();
    let req = HttpRequest::post_json("http://api.example.org/auth/login", r#"{"a":1}"#);
    assert_eq!(
        encode_request(&req, &url),
        "POST /auth/login HTTP/1.0\r\n\
         Host: api.example.org\r\n\
         Accept: application/json\r\n\
         Content-Type: application/json\r\n\
         Connection: close\r\n\
         Content-Length: 7\r\n\
         \r\n\
         {\"a\":1}"
    );

    let url = parse_url("http://api.example.org/rooms/1").unwrap();
    let req = HttpRequest::get("http://api.example.org/rooms/1").with_bearer("tok");
    let encoded = encode_request(&req, &url);
    assert!(encoded.starts_with("GET /rooms/1 HTTP/1.0\r\n"));
    assert!(encoded.contains("Authorization: Bearer tok\r\n"));
    assert!(!encoded.contains("Content-Length"));
    assert!(encoded.ends_with("\r\n\r\n"));
}

#[test]
fn response_parsing() {
    let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"value\":1}";
    let resp = parse_response(raw).unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "{\"value\":1}");
    assert!(resp.is_success());

    let resp = parse_response(b"HTTP/1.0 404 Not Found\r\n\r\n").unwrap();
    assert_eq!(resp.status, 404);
    assert!(resp.body.is_empty());
    assert!(!resp.is_success());

    assert_eq!(
        parse_response(b"HTTP/1.1 200 OK\r\n"),
        Err(TransportError::MalformedResponse)
    );
    assert_eq!(
        parse_response(b"SSH-2.0-OpenSSH\r\n\r\n"),
        Err(TransportError::MalformedResponse)
    );
}
