//! `list_tables` tests: pagination, filters and comments.

use super::common::*;
use clickgate_policy::AccessPolicy;
use serde_json::{Value, json};
use std::collections::HashSet;

const DB: &str = "e2e_tables";

fn names(page: &Value) -> Vec<String> {
    page["tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect()
}

pub async fn test_comments(ctx: &TestContext) {
    println!("  🧪 test_comments");

    ctx.fresh_database(DB).await;
    ctx.admin(&format!(
        "CREATE TABLE {}.test_table (
            id UInt32 COMMENT 'Primary identifier',
            name String COMMENT 'User name field'
        ) ENGINE = MergeTree() ORDER BY id
        COMMENT 'Test table for unit testing'",
        DB
    ))
    .await;

    let server = ctx.server(AccessPolicy::read_only());
    let page = expect_success(
        &call_tool(&server, "list_tables", json!({ "database": DB })).await,
        "list_tables should succeed",
    );

    let table = &page["tables"][0];
    assert_eq!(table["name"], "test_table");
    assert_eq!(table["comment"], "Test table for unit testing");
    assert_eq!(table["engine"], "MergeTree");
    assert_eq!(table["columns"][0]["name"], "id");
    assert_eq!(table["columns"][0]["comment"], "Primary identifier");
    assert_eq!(table["columns"][1]["name"], "name");
    assert_eq!(table["columns"][1]["comment"], "User name field");
    assert_eq!(page["total_tables"], 1);
    assert_eq!(page["next_page_token"], Value::Null);

    println!("     ✓ Table and column comments returned verbatim");
}

pub async fn test_pagination(ctx: &TestContext) {
    println!("  🧪 test_pagination");

    ctx.fresh_database(DB).await;
    for i in 0..7 {
        ctx.admin(&format!(
            "CREATE TABLE {}.t_{:02} (id UInt32) ENGINE = Memory",
            DB, i
        ))
        .await;
    }

    let server = ctx.server(AccessPolicy::read_only());
    let mut seen = Vec::new();
    let mut token = Value::Null;
    loop {
        let page = expect_success(
            &call_tool(
                &server,
                "list_tables",
                json!({ "database": DB, "page_size": 3, "page_token": token }),
            )
            .await,
            "paged list_tables should succeed",
        );
        assert_eq!(page["total_tables"], 7, "total must not depend on the page");
        seen.extend(names(&page));

        token = page["next_page_token"].clone();
        if token.is_null() {
            break;
        }
    }

    let unique: HashSet<_> = seen.iter().collect();
    assert_eq!(seen.len(), 7);
    assert_eq!(unique.len(), 7);

    println!("     ✓ Pages cover every table exactly once");
}

pub async fn test_filters(ctx: &TestContext) {
    println!("  🧪 test_filters");

    ctx.fresh_database(DB).await;
    for table in ["events", "events_tmp", "users"] {
        ctx.admin(&format!(
            "CREATE TABLE {}.{} (id UInt32) ENGINE = Memory",
            DB, table
        ))
        .await;
    }

    let server = ctx.server(AccessPolicy::read_only());
    let page = expect_success(
        &call_tool(
            &server,
            "list_tables",
            json!({ "database": DB, "like": "events%", "not_like": "%tmp" }),
        )
        .await,
        "filtered list_tables should succeed",
    );
    assert_eq!(names(&page), vec!["events"]);

    let page = expect_success(
        &call_tool(&server, "list_tables", json!({ "database": DB, "not_like": "%" })).await,
        "not_like everything should succeed",
    );
    assert_eq!(page["tables"], json!([]));
    assert_eq!(page["total_tables"], 0);
    assert_eq!(page["next_page_token"], Value::Null);

    println!("     ✓ like/not_like filters applied");
}

pub async fn test_empty_database(ctx: &TestContext) {
    println!("  🧪 test_empty_database");

    ctx.fresh_database("e2e_empty").await;
    let server = ctx.server(AccessPolicy::read_only());
    let page = expect_success(
        &call_tool(&server, "list_tables", json!({ "database": "e2e_empty" })).await,
        "empty database should succeed",
    );
    assert_eq!(page["tables"], json!([]));
    assert_eq!(page["total_tables"], 0);
    assert_eq!(page["next_page_token"], Value::Null);

    println!("     ✓ Empty database gives an empty page");
}

pub async fn test_bad_token(ctx: &TestContext) {
    println!("  🧪 test_bad_token");

    let server = ctx.server(AccessPolicy::read_only());
    let result = call_tool(
        &server,
        "list_tables",
        json!({ "database": DB, "page_token": "definitely-not-a-token" }),
    )
    .await;
    expect_error(&result, "invalid_argument", "garbage token");

    println!("     ✓ Garbage page token rejected");
}

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\n📂 list_tables");
    test_comments(ctx).await;
    test_pagination(ctx).await;
    test_filters(ctx).await;
    test_empty_database(ctx).await;
    test_bad_token(ctx).await;
}
