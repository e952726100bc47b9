use baostock_api::types::StatementCategory;
use baostock_api::{Client, Error};
use chrono::NaiveDate;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_bars_json() -> serde_json::Value {
    serde_json::json!([
        {
            "date": "2024-01-02",
            "code": "sh.600000",
            "open": 7.12,
            "high": 7.25,
            "low": 7.08,
            "close": 7.21,
            "volume": 48_231_900_i64
        },
        {
            "date": "2024-01-03",
            "code": "sh.600000",
            "open": 7.21,
            "high": 7.30,
            "low": 7.15,
            "close": 7.18,
            "volume": 39_882_100_i64
        }
    ])
}

#[tokio::test]
async fn daily_bars_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/daily/sh.600000"))
        .and(query_param("start", "2024-01-01"))
        .and(query_param("end", "2024-01-05"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_bars_json()))
        .mount(&server)
        .await;

    let client = Client::with_base_url(&server.uri());
    let bars = client
        .get_daily_bars(
            "sh.600000",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    assert_eq!(bars[0].code, "sh.600000");
    assert_eq!(bars[1].close, 7.18);
    assert_eq!(bars[1].volume, 39_882_100);
}

#[tokio::test]
async fn daily_bars_empty_range_is_ok() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/daily/sh.600000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = Client::with_base_url(&server.uri());
    let bars = client
        .get_daily_bars(
            "sh.600000",
            NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        )
        .await
        .unwrap();

    assert!(bars.is_empty());
}

#[tokio::test]
async fn daily_bars_http_error_carries_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/daily/sh.600000"))
        .respond_with(ResponseTemplate::new(503).set_body_string("gateway unavailable"))
        .mount(&server)
        .await;

    let client = Client::with_base_url(&server.uri());
    let err = client
        .get_daily_bars(
            "sh.600000",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        )
        .await
        .unwrap_err();

    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 503);
            assert!(body.contains("unavailable"));
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn daily_bars_malformed_body_is_request_failed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/daily/sh.600000"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = Client::with_base_url(&server.uri());
    let err = client
        .get_daily_bars(
            "sh.600000",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RequestFailed));
}

#[tokio::test]
async fn constituents_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/index/csi500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"code": "sh.600004", "codeName": "白云机场", "updateDate": "2024-06-03"},
            {"code": "sz.000009", "codeName": "中国宝安", "updateDate": "2024-06-03"}
        ])))
        .mount(&server)
        .await;

    let client = Client::with_base_url(&server.uri());
    let constituents = client.get_csi500_constituents().await.unwrap();

    assert_eq!(constituents.len(), 2);
    assert_eq!(constituents[0].code, "sh.600004");
    assert_eq!(constituents[0].code_name, "白云机场");
    assert_eq!(
        constituents[1].update_date,
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    );
}

#[tokio::test]
async fn securities_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/securities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"code": "sh.600000", "codeName": "浦发银行", "tradeStatus": "1"}
        ])))
        .mount(&server)
        .await;

    let client = Client::with_base_url(&server.uri());
    let securities = client.get_all_securities().await.unwrap();

    assert_eq!(securities.len(), 1);
    assert_eq!(securities[0].code_name, "浦发银行");
    assert_eq!(securities[0].trade_status, "1");
}

#[tokio::test]
async fn statement_table_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/financials/profit/sh.600000"))
        .and(query_param("year", "2023"))
        .and(query_param("quarter", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fields": ["code", "pubDate", "statDate", "roeAvg", "npMargin"],
            "rows": [["sh.600000", "2023-08-31", "2023-06-30", "0.0512", "0.2871"]]
        })))
        .mount(&server)
        .await;

    let client = Client::with_base_url(&server.uri());
    let table = client
        .get_statement(StatementCategory::Profit, "sh.600000", 2023, 2)
        .await
        .unwrap();

    assert!(!table.is_empty());
    assert_eq!(table.column("statDate"), Some(2));
    assert_eq!(table.rows[0][3], "0.0512");
}

#[tokio::test]
async fn statement_empty_category_is_ok() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/financials/dupont/sz.000009"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fields": [],
            "rows": []
        })))
        .mount(&server)
        .await;

    let client = Client::with_base_url(&server.uri());
    let table = client
        .get_statement(StatementCategory::Dupont, "sz.000009", 2023, 2)
        .await
        .unwrap();

    assert!(table.is_empty());
    assert_eq!(table.column("statDate"), None);
}

#[test]
fn category_path_segments() {
    assert_eq!(StatementCategory::Profit.as_str(), "profit");
    assert_eq!(StatementCategory::CashFlow.as_str(), "cash_flow");
    assert_eq!(StatementCategory::ALL.len(), 6);
}
