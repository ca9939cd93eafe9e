use super::*;

fn test_options() -> ClientOptions {
    ClientOptions {
        api_id: 12345,
        api_hash: "hash".to_string(),
        session_name: "collector".to_string(),
        request_timeout_secs: 30,
        max_concurrent_requests: 4,
    }
}

fn test_client(base_url: &str) -> RemoteClient {
    RemoteClient::with_base_url(test_options(), base_url)
        .expect("client construction should not fail")
}

#[test]
fn build_url_appends_path_to_base() {
    let client = test_client("http://gateway.local:8081");
    let url = client
        .build_url("channels/-1001234/messages", &[("limit", "50")])
        .expect("valid url");
    assert_eq!(
        url.as_str(),
        "http://gateway.local:8081/channels/-1001234/messages?limit=50"
    );
}

#[test]
fn build_url_keeps_base_path_prefix() {
    let client = test_client("http://gateway.local/api/v1/");
    let url = client.build_url("sessions", &[]).expect("valid url");
    assert_eq!(url.as_str(), "http://gateway.local/api/v1/sessions");
}

#[test]
fn build_url_encodes_reference() {
    let client = test_client("http://gateway.local");
    let url = client
        .build_url("channels/resolve", &[("ref", "https://t.me/+AbC/x")])
        .expect("valid url");
    assert_eq!(
        url.as_str(),
        "http://gateway.local/channels/resolve?ref=https%3A%2F%2Ft.me%2F%2BAbC%2Fx"
    );
}

#[test]
fn invalid_base_url_is_rejected() {
    let result = RemoteClient::with_base_url(test_options(), "not a url");
    assert!(matches!(result, Err(BuildError::InvalidBaseUrl { .. })));
}

#[test]
fn classify_429_defaults_retry_after() {
    let err = classify_failure(Operation::FetchMessages, "-100", 429, String::new(), None);
    assert_eq!(
        err,
        RemoteError::RateLimited {
            retry_after_secs: DEFAULT_RETRY_AFTER_SECS
        }
    );
}

#[test]
fn classify_not_found_depends_on_operation() {
    let on_resolve = classify_failure(Operation::Resolve, "@gone", 404, "not found".into(), None);
    let on_fetch = classify_failure(Operation::FetchMessages, "-100", 404, "not found".into(), None);
    let on_session = classify_failure(Operation::CreateSession, "s", 404, "not found".into(), None);

    assert!(matches!(on_resolve, RemoteError::InvalidReference { .. }));
    assert!(matches!(on_fetch, RemoteError::AccessDenied { .. }));
    assert!(matches!(on_session, RemoteError::Transient(_)));
}

#[test]
fn classify_forbidden_is_access_denied() {
    let err = classify_failure(Operation::Resolve, "@private", 403, "CHANNEL_PRIVATE".into(), None);
    assert_eq!(
        err,
        RemoteError::AccessDenied {
            reference: "@private".to_string(),
            reason: "CHANNEL_PRIVATE".to_string(),
        }
    );
}

#[test]
fn classify_server_error_is_transient() {
    let err = classify_failure(Operation::FetchMessages, "-100", 503, "down".into(), None);
    assert!(matches!(err, RemoteError::Transient(ref msg) if msg.contains("503")));
}
