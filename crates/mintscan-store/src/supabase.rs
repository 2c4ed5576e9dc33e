//! PostgREST (Supabase) client for the token table.
//!
//! Endpoints, relative to `{url}/rest/v1/{table}`:
//! - ready:  `GET ?select=token_address&limit=1`
//! - exists: `GET ?select=token_address&token_address=eq.{address}&limit=1`
//! - insert: `POST` with `Prefer: return=minimal`
//!
//! Every request carries the access key as both `apikey` and bearer token.

use crate::error::{StoreError, StoreResult};
use crate::remote::{BoxFuture, RemoteStore};
use mintscan_core::TokenRecord;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default table name.
pub const DEFAULT_TABLE: &str = "tokens";

/// PostgREST error code for an undefined table.
const PG_UNDEFINED_TABLE: &str = "42P01";
/// PostgREST error code for a table missing from the schema cache.
const PGRST_TABLE_NOT_FOUND: &str = "PGRST205";

/// Connection settings for the remote store.
#[derive(Clone)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Access key.
    pub api_key: String,
    /// Table holding token rows.
    pub table: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            table: DEFAULT_TABLE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &"[hidden]")
            .field("table", &self.table)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Row shape of the token table (server-assigned columns omitted).
#[derive(Debug, Clone, Serialize)]
struct TokenRow<'a> {
    token_address: &'a str,
    token_name: &'a str,
    token_symbol: &'a str,
}

/// Client for the hosted token table.
pub struct SupabaseStore {
    client: Client,
    endpoint: String,
    api_key: String,
    table: String,
}

impl SupabaseStore {
    /// Create a new store client.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        if config.url.trim().is_empty() {
            return Err(StoreError::InvalidConfig("store URL is empty".to_string()));
        }
        if config.api_key.trim().is_empty() {
            return Err(StoreError::InvalidConfig("store key is empty".to_string()));
        }
        if config.table.trim().is_empty() {
            return Err(StoreError::InvalidConfig("table name is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: table_endpoint(&config.url, &config.table),
            api_key: config.api_key,
            table: config.table,
        })
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check_table(&self) -> StoreResult<()> {
        info!(endpoint = %self.endpoint, "Checking remote token table");

        let response = self
            .request(Method::GET)
            .query(&[("select", "token_address"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| StoreError::Http(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_readiness_failure(&self.table, status, &body));
        }

        info!(table = %self.table, "Remote token table ready");
        Ok(())
    }

    async fn lookup(&self, address: &str) -> StoreResult<bool> {
        let filter = format!("eq.{address}");
        let response = self
            .request(Method::GET)
            .query(&[
                ("select", "token_address"),
                ("token_address", filter.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Http(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("Failed to parse lookup response: {e}")))?;

        debug!(address = %address, found = !rows.is_empty(), "Remote lookup");
        Ok(!rows.is_empty())
    }

    async fn create(&self, record: &TokenRecord) -> StoreResult<()> {
        let row = TokenRow {
            token_address: &record.address,
            token_name: &record.name,
            token_symbol: &record.symbol,
        };

        let response = self
            .request(Method::POST)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| StoreError::Http(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_insert_failure(status, body))
    }
}

impl RemoteStore for SupabaseStore {
    fn ensure_ready(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(self.check_table())
    }

    fn exists<'a>(&'a self, address: &'a str) -> BoxFuture<'a, StoreResult<bool>> {
        Box::pin(self.lookup(address))
    }

    fn insert<'a>(&'a self, record: &'a TokenRecord) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(self.create(record))
    }
}

/// SQL the operator runs to create the token table.
pub fn schema_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n    \
         id bigint generated by default as identity primary key,\n    \
         created_at timestamp with time zone default timezone('utc'::text, now()),\n    \
         token_address text unique,\n    \
         token_name text,\n    \
         token_symbol text\n\
         );"
    )
}

fn table_endpoint(url: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", url.trim().trim_end_matches('/'), table)
}

fn classify_readiness_failure(table: &str, status: StatusCode, body: &str) -> StoreError {
    let missing = status == StatusCode::NOT_FOUND
        || body.contains(PG_UNDEFINED_TABLE)
        || body.contains(PGRST_TABLE_NOT_FOUND)
        || body.contains("does not exist");

    if missing {
        StoreError::MissingTable {
            table: table.to_string(),
            schema_sql: schema_sql(table),
        }
    } else {
        StoreError::Status {
            status: status.as_u16(),
            body: body.to_string(),
        }
    }
}

fn classify_insert_failure(status: StatusCode, body: String) -> StoreError {
    if status == StatusCode::CONFLICT {
        StoreError::Conflict(body)
    } else {
        StoreError::Status {
            status: status.as_u16(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_endpoint_trims_slash() {
        assert_eq!(
            table_endpoint("https://abc.supabase.co/", "tokens"),
            "https://abc.supabase.co/rest/v1/tokens"
        );
        assert_eq!(
            table_endpoint("https://abc.supabase.co", "tokens"),
            "https://abc.supabase.co/rest/v1/tokens"
        );
    }

    #[test]
    fn test_new_rejects_empty_credentials() {
        let result = SupabaseStore::new(StoreConfig::new("", "key"));
        assert!(matches!(result, Err(StoreError::InvalidConfig(_))));

        let result = SupabaseStore::new(StoreConfig::new("https://abc.supabase.co", " "));
        assert!(matches!(result, Err(StoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_debug_hides_key() {
        let config = StoreConfig::new("https://abc.supabase.co", "super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[hidden]"));
    }

    #[test]
    fn test_readiness_failure_missing_relation() {
        let body = r#"{"code":"42P01","message":"relation \"public.tokens\" does not exist"}"#;
        let err = classify_readiness_failure("tokens", StatusCode::BAD_REQUEST, body);
        match err {
            StoreError::MissingTable { table, schema_sql } => {
                assert_eq!(table, "tokens");
                assert!(schema_sql.contains("CREATE TABLE IF NOT EXISTS tokens"));
                assert!(schema_sql.contains("token_address text unique"));
            }
            other => panic!("expected MissingTable, got {other:?}"),
        }
    }

    #[test]
    fn test_readiness_failure_schema_cache_miss() {
        let body = r#"{"code":"PGRST205","message":"Could not find the table 'public.tokens' in the schema cache"}"#;
        let err = classify_readiness_failure("tokens", StatusCode::NOT_FOUND, body);
        assert!(matches!(err, StoreError::MissingTable { .. }));
    }

    #[test]
    fn test_readiness_failure_auth_is_not_missing_table() {
        let err = classify_readiness_failure(
            "tokens",
            StatusCode::UNAUTHORIZED,
            r#"{"message":"Invalid API key"}"#,
        );
        assert!(matches!(err, StoreError::Status { status: 401, .. }));
    }

    #[test]
    fn test_missing_table_message_is_actionable() {
        let err = classify_readiness_failure("tokens", StatusCode::NOT_FOUND, "");
        let message = err.to_string();
        assert!(message.contains("CREATE TABLE IF NOT EXISTS tokens"));
        assert!(message.contains("restart"));
    }

    #[test]
    fn test_insert_conflict_classified() {
        let err = classify_insert_failure(
            StatusCode::CONFLICT,
            r#"{"code":"23505","message":"duplicate key value"}"#.to_string(),
        );
        assert!(err.is_conflict());

        let err = classify_insert_failure(StatusCode::INTERNAL_SERVER_ERROR, String::new());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_row_serialization() {
        let row = TokenRow {
            token_address: "TokenABC",
            token_name: "Foo",
            token_symbol: "FOO",
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"token_address":"TokenABC","token_name":"Foo","token_symbol":"FOO"}"#
        );
    }

    mod rest_stub {
        use super::*;
        use axum::extract::{Query, State};
        use axum::http::HeaderMap;
        use axum::response::{IntoResponse, Response};
        use axum::routing::get;
        use axum::{Json, Router};
        use chrono::{TimeZone, Utc};
        use parking_lot::Mutex;
        use serde_json::{json, Value};
        use std::collections::HashMap;
        use std::sync::Arc;

        /// One request as seen by the stub.
        #[derive(Debug, Clone)]
        struct SeenRequest {
            method: &'static str,
            apikey: Option<String>,
            authorization: Option<String>,
            prefer: Option<String>,
            query: HashMap<String, String>,
        }

        /// In-process PostgREST stand-in for the `tokens` table.
        #[derive(Clone, Default)]
        struct RestStub {
            missing_table: bool,
            rows: Arc<Mutex<Vec<Value>>>,
            seen: Arc<Mutex<Vec<SeenRequest>>>,
        }

        impl RestStub {
            fn note(&self, method: &'static str, headers: &HeaderMap, query: HashMap<String, String>) {
                let header = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                self.seen.lock().push(SeenRequest {
                    method,
                    apikey: header("apikey"),
                    authorization: header("authorization"),
                    prefer: header("prefer"),
                    query,
                });
            }
        }

        async fn select_rows(
            State(stub): State<RestStub>,
            headers: HeaderMap,
            Query(query): Query<HashMap<String, String>>,
        ) -> Response {
            stub.note("GET", &headers, query.clone());
            if stub.missing_table {
                let body = r#"{"code":"PGRST205","message":"Could not find the table 'public.tokens' in the schema cache"}"#;
                return (StatusCode::NOT_FOUND, body).into_response();
            }

            let rows = stub.rows.lock();
            let matched: Vec<Value> = match query.get("token_address") {
                Some(filter) => {
                    let address = filter.strip_prefix("eq.").unwrap_or_default();
                    rows.iter()
                        .filter(|row| row["token_address"] == address)
                        .map(|row| json!({"token_address": row["token_address"]}))
                        .collect()
                }
                None => rows.iter().take(1).cloned().collect(),
            };
            Json(matched).into_response()
        }

        async fn insert_row(
            State(stub): State<RestStub>,
            headers: HeaderMap,
            Json(row): Json<Value>,
        ) -> Response {
            stub.note("POST", &headers, HashMap::new());
            let mut rows = stub.rows.lock();
            if rows
                .iter()
                .any(|existing| existing["token_address"] == row["token_address"])
            {
                let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#;
                return (StatusCode::CONFLICT, body).into_response();
            }
            rows.push(row);
            StatusCode::CREATED.into_response()
        }

        async fn serve(stub: RestStub) -> String {
            let app = Router::new()
                .route("/rest/v1/tokens", get(select_rows).post(insert_row))
                .with_state(stub);
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            // Trailing slash exercises endpoint normalisation
            format!("http://{addr}/")
        }

        fn record(address: &str) -> TokenRecord {
            let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
            TokenRecord::new(address, "Foo", "FOO", at).unwrap()
        }

        #[tokio::test]
        async fn test_readiness_lookup_insert_over_http() {
            let stub = RestStub::default();
            let url = serve(stub.clone()).await;
            let store = SupabaseStore::new(StoreConfig::new(url, "test-key")).unwrap();

            store.ensure_ready().await.unwrap();
            assert!(!store.exists("TokenABC").await.unwrap());
            store.insert(&record("TokenABC")).await.unwrap();
            assert!(store.exists("TokenABC").await.unwrap());
            assert!(!store.exists("TokenXYZ").await.unwrap());

            let rows = stub.rows.lock().clone();
            assert_eq!(
                rows,
                vec![json!({"token_address": "TokenABC", "token_name": "Foo", "token_symbol": "FOO"})]
            );

            let seen = stub.seen.lock().clone();
            assert_eq!(seen.len(), 5);
            for request in &seen {
                assert_eq!(request.apikey.as_deref(), Some("test-key"));
                assert_eq!(request.authorization.as_deref(), Some("Bearer test-key"));
            }

            let readiness = &seen[0];
            assert_eq!(readiness.query.get("select").map(String::as_str), Some("token_address"));
            assert_eq!(readiness.query.get("limit").map(String::as_str), Some("1"));
            assert!(!readiness.query.contains_key("token_address"));

            let lookup = &seen[1];
            assert_eq!(
                lookup.query.get("token_address").map(String::as_str),
                Some("eq.TokenABC")
            );

            let insert = &seen[2];
            assert_eq!(insert.method, "POST");
            assert_eq!(insert.prefer.as_deref(), Some("return=minimal"));
        }

        #[tokio::test]
        async fn test_duplicate_insert_over_http_is_conflict() {
            let stub = RestStub::default();
            let url = serve(stub.clone()).await;
            let store = SupabaseStore::new(StoreConfig::new(url, "test-key")).unwrap();

            store.insert(&record("TokenABC")).await.unwrap();
            let err = store.insert(&record("TokenABC")).await.unwrap_err();
            assert!(err.is_conflict(), "got {err:?}");
            assert_eq!(stub.rows.lock().len(), 1);
        }

        #[tokio::test]
        async fn test_readiness_over_http_reports_missing_table() {
            let stub = RestStub {
                missing_table: true,
                ..RestStub::default()
            };
            let url = serve(stub).await;
            let store = SupabaseStore::new(StoreConfig::new(url, "test-key")).unwrap();

            let err = store.ensure_ready().await.unwrap_err();
            match err {
                StoreError::MissingTable { table, schema_sql } => {
                    assert_eq!(table, "tokens");
                    assert!(schema_sql.contains("CREATE TABLE IF NOT EXISTS tokens"));
                }
                other => panic!("expected MissingTable, got {other:?}"),
            }
        }
    }
}
