//! Mock exchange adapter over wiremock

use serde_json::Value;
use services_common::CandleInterval;
use std::net::SocketAddr;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::fixtures::ExchangeFixture;

/// HTTP server speaking the adapter contract from an [`ExchangeFixture`].
///
/// Routes answer for any `market`; tests that need per-market behaviour
/// mount overrides with [`MockExchange::mount_status_for_market`], which
/// take precedence.
#[derive(Debug)]
pub struct MockExchange {
    server: MockServer,
    prefix: String,
}

impl MockExchange {
    /// Empty server; nothing mounted
    pub async fn start() -> Self {
        Self::start_under("").await
    }

    /// Empty server whose routes all live below `prefix`, e.g. `/api/v1`
    pub async fn start_under(prefix: &str) -> Self {
        Self {
            server: MockServer::start().await,
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Server serving every endpoint of `fixture`
    pub async fn serve(fixture: &ExchangeFixture) -> Self {
        let exchange = Self::start().await;
        exchange.mount_fixture(fixture).await;
        exchange
    }

    /// Server serving every endpoint of `fixture` below `prefix`
    pub async fn serve_under(fixture: &ExchangeFixture, prefix: &str) -> Self {
        let exchange = Self::start_under(prefix).await;
        exchange.mount_fixture(fixture).await;
        exchange
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Socket address the server listens on
    pub fn address(&self) -> SocketAddr {
        *self.server.address()
    }

    fn route(&self, route: &str) -> String {
        format!("{}{route}", self.prefix)
    }

    /// Requests received so far, as `path?query`
    pub async fn requested(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| match r.url.query() {
                Some(q) => format!("{}?{q}", r.url.path()),
                None => r.url.path().to_string(),
            })
            .collect()
    }

    pub async fn mount_fixture(&self, fixture: &ExchangeFixture) {
        self.mount_json("/info", fixture.info.clone()).await;
        self.mount_json("/markets", fixture.markets.clone()).await;

        self.mount_paged(
            "/trades",
            &fixture.trades,
            cursor(&fixture.trades, "id"),
            &fixture.trades_after,
        )
        .await;
        self.mount_paged(
            "/trades-by-timestamp",
            &fixture.trades_by_timestamp,
            cursor(&fixture.trades_by_timestamp, "timestamp"),
            &fixture.trades_by_timestamp_after,
        )
        .await;

        self.mount_json("/orders/snapshot", fixture.order_book.clone()).await;
        for interval in CandleInterval::ALL {
            Mock::given(method("GET"))
                .and(path(self.route("/candles")))
                .and(query_param("interval", interval.code()))
                .respond_with(json_response(fixture.candles(interval).clone()))
                .mount(&self.server)
                .await;
        }
        self.mount_json("/ticker", fixture.ticker.clone()).await;
    }

    /// Serve `body` at `route` for any query
    pub async fn mount_json(&self, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(self.route(route)))
            .respond_with(json_response(body))
            .mount(&self.server)
            .await;
    }

    /// Serve `first` without `since` and `after` for `since=<cursor>`
    pub async fn mount_paged(&self, route: &str, first: &Value, cursor: String, after: &Value) {
        Mock::given(method("GET"))
            .and(path(self.route(route)))
            .and(query_param_is_missing("since"))
            .respond_with(json_response(first.clone()))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(self.route(route)))
            .and(query_param("since", cursor))
            .respond_with(json_response(after.clone()))
            .mount(&self.server)
            .await;
    }

    /// Answer `route` with a bare `status` for one market, ahead of any
    /// fixture route
    pub async fn mount_status_for_market(&self, route: &str, market: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(self.route(route)))
            .and(query_param("market", market))
            .respond_with(ResponseTemplate::new(status))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Serve `body` at `route` for one market, ahead of any fixture route
    pub async fn mount_json_for_market(&self, route: &str, market: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(self.route(route)))
            .and(query_param("market", market))
            .and(query_param_is_missing("since"))
            .respond_with(json_response(body))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Serve a non-JSON body at `route`
    pub async fn mount_html(&self, route: &str) {
        Mock::given(method("GET"))
            .and(path(self.route(route)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html>maintenance</html>", "text/html"),
            )
            .with_priority(1)
            .mount(&self.server)
            .await;
    }
}

fn json_response(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Cursor the auditor derives from a first page: the first record's `key`
fn cursor(page: &Value, key: &str) -> String {
    page.get(0)
        .and_then(|t| t.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
