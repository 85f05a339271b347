// ═══════════════════════════════════════════════════════════════════
// Provider Tests — mfapi.in decoding and HTTP behaviour
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use std::collections::HashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use holdings_reconciler_core::errors::CoreError;
use holdings_reconciler_core::providers::mfapi::{
    decode_fund_history, decode_fund_list, MfApiProvider,
};
use holdings_reconciler_core::providers::traits::FundRegistry;

// ═══════════════════════════════════════════════════════════════════
// Test Helpers — canned HTTP server
// ═══════════════════════════════════════════════════════════════════

const FUND_LIST: &str = r#"[
    {"schemeCode": 100027, "schemeName": "Grindlays Super Saver Income Fund-GSSIF-Half Yearly Dividend", "isinGrowth": null, "isinDivReinvestment": null},
    {"schemeCode": "120465", "schemeName": "Axis Bluechip Fund - Direct Plan - Growth", "isinGrowth": "INF846K01EW2", "isinDivReinvestment": null}
]"#;

const HISTORY: &str = r#"{
    "meta": {
        "fund_house": "Axis Mutual Fund",
        "scheme_type": "Open Ended Schemes",
        "scheme_category": "Equity Scheme - Large Cap Fund",
        "scheme_code": 120465,
        "scheme_name": "Axis Bluechip Fund - Direct Plan - Growth"
    },
    "data": [
        {"date": "28-03-2025", "nav": "60.12340"},
        {"date": "27-03-2025", "nav": "59.87650"},
        {"date": "not a date", "nav": "59.00000"},
        {"date": "25-03-2025", "nav": "N.A."}
    ],
    "status": "SUCCESS"
}"#;

/// Serve fixed responses by request path on a local port, forever.
/// Unknown paths get a 404. Returns the base URL.
async fn serve(routes: HashMap<&'static str, (u16, &'static str)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&request);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                let (status, body) = routes.get(path.as_str()).copied().unwrap_or((404, "{}"));
                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

// ═══════════════════════════════════════════════════════════════════
// Decoding
// ═══════════════════════════════════════════════════════════════════

mod decoding {
    use super::*;

    #[test]
    fn fund_list_with_mixed_code_types() {
        let funds = decode_fund_list(FUND_LIST).unwrap();
        assert_eq!(funds.len(), 2);
        assert_eq!(funds[0].scheme_code, "100027");
        assert_eq!(funds[1].scheme_code, "120465");
        assert_eq!(funds[1].isin_growth.as_deref(), Some("INF846K01EW2"));
    }

    #[test]
    fn empty_fund_list() {
        assert!(decode_fund_list("[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_fund_list_is_a_decoding_error() {
        assert!(matches!(
            decode_fund_list("<html>busy</html>"),
            Err(CoreError::Decoding(_))
        ));
        assert!(matches!(
            decode_fund_list(r#"[{"schemeCode": 1.25, "schemeName": "X"}]"#),
            Err(CoreError::Decoding(_))
        ));
    }

    #[test]
    fn history_drops_unreadable_rows() {
        let h = decode_fund_history(HISTORY).unwrap();
        assert_eq!(h.meta.scheme_code, "120465");
        assert_eq!(h.meta.fund_house, "Axis Mutual Fund");
        assert_eq!(h.data.len(), 2);
        assert_eq!(h.data[0].date, NaiveDate::from_ymd_opt(2025, 3, 28).unwrap());
        assert_eq!(h.data[0].nav, 60.1234);
        assert_eq!(h.data[1].nav, 59.8765);
    }

    #[test]
    fn history_without_data_is_empty() {
        let h = decode_fund_history(r#"{"meta": {"scheme_code": "42"}}"#).unwrap();
        assert_eq!(h.meta.scheme_code, "42");
        assert_eq!(h.meta.scheme_name, "");
        assert!(h.data.is_empty());
    }

    #[test]
    fn history_without_meta_is_a_decoding_error() {
        assert!(matches!(
            decode_fund_history(r#"{"data": []}"#),
            Err(CoreError::Decoding(_))
        ));
    }
}

// ═══════════════════════════════════════════════════════════════════
// MfApiProvider over HTTP
// ═══════════════════════════════════════════════════════════════════

mod mfapi_http {
    use super::*;

    fn routes() -> HashMap<&'static str, (u16, &'static str)> {
        let mut routes = HashMap::new();
        routes.insert("/mf", (200, FUND_LIST));
        routes.insert("/mf/120465", (200, HISTORY));
        routes.insert("/mf/500", (500, "oops"));
        routes.insert("/mf/999", (200, "not json"));
        routes
    }

    #[test]
    fn provider_name() {
        assert_eq!(MfApiProvider::new().name(), "MFAPI");
    }

    #[tokio::test]
    async fn lists_all_funds() {
        let base = serve(routes()).await;
        let provider = MfApiProvider::with_base_url(&base, 5);
        let funds = provider.list_all_funds().await.unwrap();
        assert_eq!(funds.len(), 2);
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url() {
        let base = serve(routes()).await;
        let provider = MfApiProvider::with_base_url(&format!("{base}/"), 5);
        assert_eq!(provider.list_all_funds().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn fetches_history() {
        let base = serve(routes()).await;
        let provider = MfApiProvider::with_base_url(&base, 5);
        let h = provider.get_fund_history(" 120465 ").await.unwrap();
        assert_eq!(h.data.len(), 2);
    }

    #[tokio::test]
    async fn http_error_status_is_an_api_error() {
        let base = serve(routes()).await;
        let provider = MfApiProvider::with_base_url(&base, 5);

        match provider.get_fund_history("500").await {
            Err(CoreError::Api { provider, message }) => {
                assert_eq!(provider, "MFAPI");
                assert!(message.contains("500"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
        assert!(matches!(
            provider.get_fund_history("404").await,
            Err(CoreError::Api { .. })
        ));
    }

    #[tokio::test]
    async fn bad_body_is_a_decoding_error() {
        let base = serve(routes()).await;
        let provider = MfApiProvider::with_base_url(&base, 5);
        assert!(matches!(
            provider.get_fund_history("999").await,
            Err(CoreError::Decoding(_))
        ));
    }

    #[tokio::test]
    async fn empty_scheme_code_is_rejected_without_a_request() {
        let provider = MfApiProvider::with_base_url("http://127.0.0.1:1", 1);
        assert!(matches!(
            provider.get_fund_history("  ").await,
            Err(CoreError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let provider = MfApiProvider::with_base_url(&format!("http://127.0.0.1:{port}"), 2);
        let err = provider.list_all_funds().await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));
        assert!(err.is_retryable());
    }
}
