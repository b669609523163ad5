//! Integration tests: build searches, run them against a scripted store,
//! verify the requests sent and the merged output.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::{Call, ScriptedStore, page, users_schema, users_table};
use ferridyn_search::catalog::{AttributeDef, LocalIndex, TableSchema};
use ferridyn_search::decode::RawDecoder;
use ferridyn_search::error::{DecodeError, Error, SchemaError, UsageError};
use ferridyn_search::search::{Condition, PageResult, SearchDefaults, Select, Table, Termination};
use ferridyn_search::types::{AttrType, AttributeValue, json_to_item};

#[tokio::test]
async fn test_single_page_query() {
    let store = ScriptedStore::pages(vec![page("u", 1, true)]);
    let users = users_table(store.clone());

    let out = users.search().filter("userId", "u0").execute().await.unwrap();
    assert_eq!(out.items, vec![json!({"userId": "u0", "status": "active"})]);
    // Single page stops even though more results exist.
    assert!(!out.is_complete());

    let calls = store.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, Call::Query);
    assert_eq!(calls[0].1.key_condition_expression.as_deref(), Some("#n0 = :v0"));
    assert_eq!(calls[0].1.filter_expression, None);
}

#[tokio::test]
async fn test_gsi_query_names_index() {
    let store = ScriptedStore::pages(vec![page("u", 2, false)]);
    let users = users_table(store.clone());

    users.search().filter("email", "a@b.com").all().await.unwrap();

    let calls = store.calls();
    assert_eq!(calls[0].0, Call::Query);
    assert_eq!(calls[0].1.index_name.as_deref(), Some("byEmail"));
}

#[tokio::test]
async fn test_minimum_fetches_until_threshold() {
    let store = ScriptedStore::pages(vec![
        page("a", 10, true),
        page("b", 10, true),
        page("c", 10, false),
    ]);
    let users = users_table(store.clone());

    let out = users.search().filter("status", "active").minimum(25).await.unwrap();
    assert_eq!(out.items.len(), 30);
    assert_eq!(out.count, 30);
    assert!(out.last_evaluated_key.is_none());

    let calls = store.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|(call, _)| *call == Call::Scan));
    // Each request resumes from the previous page's token.
    assert_eq!(calls[0].1.exclusive_start_key, None);
    assert_eq!(
        calls[1].1.exclusive_start_key,
        Some(json_to_item(&json!({"userId": "a-end"})))
    );
    assert_eq!(
        calls[2].1.exclusive_start_key,
        Some(json_to_item(&json!({"userId": "b-end"})))
    );
}

#[tokio::test]
async fn test_minimum_stops_early_with_token() {
    let store = ScriptedStore::pages(vec![page("a", 10, true), page("b", 10, true), page("c", 10, false)]);
    let users = users_table(store.clone());

    let out = users.search().minimum(15).await.unwrap();
    assert_eq!(out.items.len(), 20);
    assert_eq!(store.calls().len(), 2);
    assert_eq!(out.last_evaluated_key, Some(json_to_item(&json!({"userId": "b-end"}))));
    assert!(!out.is_complete());
}

#[tokio::test]
async fn test_minimum_stops_when_exhausted() {
    let store = ScriptedStore::pages(vec![page("a", 3, true), page("b", 2, false)]);
    let users = users_table(store.clone());

    let out = users.search().minimum(100).await.unwrap();
    assert_eq!(out.items.len(), 5);
    assert!(out.is_complete());
}

#[tokio::test]
async fn test_all_concatenates_every_page() {
    let store = ScriptedStore::pages(vec![
        page("a", 2, true),
        page("b", 1, true),
        page("c", 0, true),
        page("d", 2, false),
    ]);
    let users = users_table(store.clone());

    let out = users.search().filter("status", "active").all().await.unwrap();
    let ids: Vec<&str> = out
        .items
        .iter()
        .map(|i| i["userId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a0", "a1", "b0", "d0", "d1"]);
    assert_eq!(out.scanned_count, 10);
    assert!(out.is_complete());
    assert_eq!(store.calls().len(), 4);
}

#[tokio::test]
async fn test_scan_with_order_is_rejected_before_any_fetch() {
    let store = ScriptedStore::pages(vec![page("a", 1, false)]);
    let users = users_table(store.clone());

    let err = users
        .search()
        .filter("status", "active")
        .descending()
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Usage(UsageError::ScanOrdering)));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_descending_query() {
    let store = ScriptedStore::pages(vec![page("a", 1, false)]);
    let users = users_table(store.clone());

    users.search().filter("userId", "a0").descending().execute().await.unwrap();
    assert_eq!(store.calls()[0].1.scan_index_forward, Some(false));
}

#[tokio::test]
async fn test_downstream_failure_aborts_and_discards_pages() {
    let store = ScriptedStore::new(vec![
        Ok(page("a", 5, true)),
        Err("throughput exceeded".to_string()),
        Ok(page("c", 5, false)),
    ]);
    let users = users_table(store.clone());

    let err = users.search().filter("status", "active").all().await.unwrap_err();
    match err {
        Error::Downstream(e) => {
            assert_eq!(e.table, "users");
            assert_eq!(e.operation, "scan");
            assert_eq!(e.source.to_string(), "throughput exceeded");
            assert!(e.request.contains("\"ExclusiveStartKey\""));
            assert!(e.request.contains("\"FilterExpression\""));
        }
        other => panic!("unexpected error: {other}"),
    }
    // No retry: the third response was never requested.
    assert_eq!(store.calls().len(), 2);
}

#[tokio::test]
async fn test_unknown_index_is_configuration_error() {
    let store = ScriptedStore::pages(vec![]);
    let users = users_table(store.clone());

    let err = users.search().using_index("byPhone").execute().await.unwrap_err();
    assert!(matches!(err, Error::Schema(SchemaError::IndexNotFound(n)) if n == "byPhone"));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_get_input_matches_sent_request() {
    let store = ScriptedStore::pages(vec![page("a", 1, false)]);
    let users = users_table(store.clone());

    let search = users
        .search()
        .filter("a", 1)
        .or()
        .filter("b", Condition::gt(2))
        .limit(5);
    let input = search.get_input().unwrap();
    assert_eq!(input.filter_expression.as_deref(), Some("(#n0 = :v0) OR (#n1 > :v1)"));
    search.execute().await.unwrap();
    assert_eq!(store.calls()[0].1, input);
}

#[tokio::test]
async fn test_count_only() {
    let store = ScriptedStore::pages(vec![
        PageResult {
            count: 7,
            scanned_count: 9,
            last_evaluated_key: Some(json_to_item(&json!({"userId": "x"}))),
            ..Default::default()
        },
        PageResult {
            count: 3,
            scanned_count: 3,
            ..Default::default()
        },
    ]);
    let users = users_table(store.clone());

    let out = users.search().select(&["name"]).count().all().await.unwrap();
    assert!(out.items.is_empty());
    assert_eq!(out.count, 10);
    assert_eq!(out.scanned_count, 12);
    let sent = &store.calls()[0].1;
    assert_eq!(sent.select, Some(Select::Count));
    assert_eq!(sent.projection_expression, None);
}

fn strict_schema() -> TableSchema {
    TableSchema::builder("users")
        .hash_key("pk")
        .attribute(AttributeDef::new("userId", AttrType::String).stored_as("pk").required())
        .attribute(AttributeDef::new("name", AttrType::String).required())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_projection_decodes_tolerantly() {
    let partial = PageResult {
        items: vec![json_to_item(&json!({"pk": "u1"}))],
        count: 1,
        scanned_count: 1,
        last_evaluated_key: None,
    };

    // Without a projection a missing required attribute fails decoding.
    let store = ScriptedStore::pages(vec![partial.clone()]);
    let table = Table::new(strict_schema(), store);
    let err = table.search().filter("userId", "u1").execute().await.unwrap_err();
    assert!(matches!(err, Error::Decode(DecodeError::MissingAttribute(a)) if a == "name"));

    // With one, absence is expected.
    let store = ScriptedStore::pages(vec![partial]);
    let table = Table::new(strict_schema(), store.clone());
    let out = table
        .search()
        .filter("userId", "u1")
        .select(&["userId"])
        .execute()
        .await
        .unwrap();
    assert_eq!(out.items, vec![json!({"userId": "u1"})]);
    let sent = &store.calls()[0].1;
    assert_eq!(sent.expression_attribute_names["#n0"], "pk");
    assert_eq!(sent.projection_expression.as_deref(), Some("#n1"));
    assert_eq!(sent.expression_attribute_names["#n1"], "pk");
}

#[tokio::test]
async fn test_raw_output_skips_schema() {
    let store = ScriptedStore::pages(vec![PageResult {
        items: vec![json_to_item(&json!({"pk": "u1"}))],
        count: 1,
        scanned_count: 1,
        last_evaluated_key: None,
    }]);
    let table = Table::new(strict_schema(), store);
    let out = table.search().raw().execute().await.unwrap();
    assert_eq!(out.items, vec![json!({"pk": "u1"})]);
}

#[tokio::test]
async fn test_custom_decoder_and_defaults() {
    let store = ScriptedStore::pages(vec![page("a", 1, false)]);
    let users = Table::new(users_schema(), store.clone())
        .with_decoder(Arc::new(RawDecoder))
        .with_defaults(SearchDefaults {
            consistent_read: true,
            page_limit: Some(100),
        });

    users.search().execute().await.unwrap();
    let sent = &store.calls()[0].1;
    assert_eq!(sent.consistent_read, Some(true));
    assert_eq!(sent.limit, Some(100));

    // Per-search calls override the table defaults.
    let input = users.search().limit(5).consistent_read(false).get_input().unwrap();
    assert_eq!(input.limit, Some(5));
    assert_eq!(input.consistent_read, None);
}

#[tokio::test]
async fn test_start_key_seeds_first_request() {
    let store = ScriptedStore::pages(vec![page("b", 1, false)]);
    let users = users_table(store.clone());
    let start = json_to_item(&json!({"userId": "a9"}));

    users.search().start_key(start.clone()).execute().await.unwrap();
    assert_eq!(store.calls()[0].1.exclusive_start_key, Some(start));
}

#[tokio::test]
async fn test_lsi_query_through_run() {
    let schema = TableSchema::builder("orders")
        .hash_key("customerId")
        .range_key("orderId")
        .local_index(LocalIndex::new("byTotal", "total"))
        .build()
        .unwrap();
    let store = ScriptedStore::pages(vec![PageResult::default()]);
    let orders = Table::new(schema, store.clone());

    orders
        .search()
        .filter("customerId", "c1")
        .filter("total", Condition::ge(100))
        .ascending()
        .run(Termination::SinglePage)
        .await
        .unwrap();

    let (call, sent) = &store.calls()[0];
    assert_eq!(*call, Call::Query);
    assert_eq!(sent.index_name.as_deref(), Some("byTotal"));
    assert_eq!(sent.key_condition_expression.as_deref(), Some("#n0 = :v0 AND #n1 >= :v1"));
    assert_eq!(sent.expression_attribute_values[":v1"], AttributeValue::N("100".to_string()));
    assert_eq!(sent.scan_index_forward, Some(true));
}

#[tokio::test]
async fn test_concurrent_searches_share_table() {
    let store = ScriptedStore::pages(vec![page("a", 1, false), page("b", 1, false)]);
    let users = users_table(store.clone());

    let (left, right) = tokio::join!(
        users.search().filter("userId", "a0").execute(),
        users.search().filter("status", "active").execute(),
    );
    assert_eq!(left.unwrap().items.len(), 1);
    assert_eq!(right.unwrap().items.len(), 1);

    let mut calls: Vec<Call> = store.calls().into_iter().map(|(c, _)| c).collect();
    calls.sort_by_key(|c| *c == Call::Scan);
    assert_eq!(calls, vec![Call::Query, Call::Scan]);
}
