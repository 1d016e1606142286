use crate::model::{Filter, LogRecord, QueryWindow, SortOrder};
use serde::{Deserialize, Serialize};

/// JSON body of `POST /v1.0/logs/query`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LogQueryBody<'a> {
    limit: u32,
    start: i64,
    end: i64,
    sort: SortOrder,
    filter: &'a Filter,
}

impl<'a> LogQueryBody<'a> {
    pub fn from_window(window: &QueryWindow, filter: &'a Filter) -> LogQueryBody<'a> {
        LogQueryBody {
            limit: window.limit,
            start: window.start,
            end: window.end,
            sort: window.sort,
            filter,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LogQueryResponse {
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
    #[serde(default)]
    pub logs: Option<Vec<LogRecord>>,
}

impl LogQueryResponse {
    pub fn into_records(self) -> Vec<LogRecord> {
        self.logs.unwrap_or_default()
    }
}

/// Response of the client-credentials token exchange.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub grant_id: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FilterMatch;

    #[test]
    fn test_map_window_to_body() {
        let filter = Filter {
            matches: vec![
                FilterMatch::equals("traceID", "abc"),
                FilterMatch::equals("service", "billing"),
            ],
            ..Filter::default()
        };
        let window = QueryWindow {
            start: 1_000,
            end: 2_000,
            limit: 500,
            sort: SortOrder::Asc,
        };

        let body = LogQueryBody::from_window(&window, &filter);

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "limit": 500,
                "start": 1000,
                "end": 2000,
                "sort": "asc",
                "filter": {
                    "op": "AND",
                    "match": [
                        {"key": "traceID", "op": "eq", "value": "abc"},
                        {"key": "service", "op": "eq", "value": "billing"}
                    ]
                }
            })
        );
    }

    #[test]
    fn test_decode_query_response() {
        let resp: LogQueryResponse = serde_json::from_str(
            r#"{
                "count": 2, "start": 1, "end": 9,
                "logs": [
                    {"timestamp": 3, "traceID": "a", "spanID": "b", "message": "m1",
                     "severity": "info", "attributes": {"k": "v"}},
                    {"timestamp": 7, "traceID": "a", "spanID": "c", "message": "m2",
                     "severity": "warn", "attributes": {}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(resp.count, Some(2));
        let records = resp.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].attributes.get("k").map(String::as_str), Some("v"));
        assert_eq!(records[1].span_id, "c");
    }

    #[test]
    fn test_null_logs_decode_as_empty() {
        let resp: LogQueryResponse =
            serde_json::from_str(r#"{"count": 0, "start": 1, "end": 2, "logs": null}"#).unwrap();
        assert!(resp.into_records().is_empty());
    }

    #[test]
    fn test_decode_token_response() {
        let resp: TokenResponse = serde_json::from_str(
            r#"{"access_token": "tok", "grant_id": "g", "token_type": "Bearer", "expires_in": 7200}"#,
        )
        .unwrap();
        assert_eq!(resp.access_token.as_deref(), Some("tok"));
        assert_eq!(resp.expires_in, Some(7200));
    }
}
