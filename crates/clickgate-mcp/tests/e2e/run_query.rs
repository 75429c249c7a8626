//! `run_query` tests: access policy and result fidelity.

use super::common::*;
use clickgate_policy::AccessPolicy;
use clickgate_runtime::{EngineClient, GatewayError, QueryParams, QuerySettings};
use serde_json::{Value, json};

const DB: &str = "e2e_queries";

async fn create_table(ctx: &TestContext) {
    ctx.fresh_database(DB).await;
    ctx.admin(&format!(
        "CREATE TABLE {}.people (id UInt32, name String) ENGINE = MergeTree() ORDER BY id",
        DB
    ))
    .await;
}

pub async fn test_select(ctx: &TestContext) {
    println!("  🧪 test_select");

    let server = ctx.server(AccessPolicy::read_only());
    let result = call_tool(
        &server,
        "run_query",
        json!({ "query": "SELECT 1 AS n, 'a' AS s, toUInt64(18446744073709551615) AS big" }),
    )
    .await;
    let data = expect_success(&result, "SELECT should succeed");

    assert_eq!(data["columns"], json!(["n", "s", "big"]));
    assert_eq!(data["rows"][0][0], 1);
    assert_eq!(data["rows"][0][1], "a");
    assert_eq!(data["rows"][0][2].as_u64(), Some(u64::MAX));

    println!("     ✓ Native value types preserved");
}

pub async fn test_insert_denied_when_write_disabled(ctx: &TestContext) {
    println!("  🧪 test_insert_denied_when_write_disabled");

    create_table(ctx).await;
    let server = ctx.server(AccessPolicy::read_only());
    let result = call_tool(
        &server,
        "run_query",
        json!({ "query": format!("INSERT INTO {}.people VALUES (1, 'x')", DB) }),
    )
    .await;
    let message = expect_error(&result, "policy_denied", "INSERT with write disabled");
    assert!(message.contains("CLICKHOUSE_ALLOW_WRITE_ACCESS=true"));

    let count = expect_success(
        &call_tool(
            &server,
            "run_query",
            json!({ "query": format!("SELECT count() FROM {}.people", DB) }),
        )
        .await,
        "count should succeed",
    );
    assert_eq!(count["rows"][0][0], 0);

    println!("     ✓ INSERT rejected locally, table untouched");
}

pub async fn test_insert_then_select(ctx: &TestContext) {
    println!("  🧪 test_insert_then_select");

    create_table(ctx).await;
    let server = ctx.server(AccessPolicy::read_write());
    expect_success(
        &call_tool(
            &server,
            "run_query",
            json!({ "query": format!("INSERT INTO {}.people VALUES (1, 'Alice'), (2, 'Bob')", DB) }),
        )
        .await,
        "INSERT with write enabled",
    );

    let data = expect_success(
        &call_tool(
            &server,
            "run_query",
            json!({ "query": format!("SELECT id, name FROM {}.people ORDER BY id", DB) }),
        )
        .await,
        "SELECT after INSERT",
    );
    assert_eq!(data["rows"], json!([[1, "Alice"], [2, "Bob"]]));

    println!("     ✓ Inserted values read back with the same types");
}

pub async fn test_drop_requires_drop_flag(ctx: &TestContext) {
    println!("  🧪 test_drop_requires_drop_flag");

    create_table(ctx).await;
    let drop = json!({ "query": format!("DROP TABLE {}.people", DB) });

    let server = ctx.server(AccessPolicy::read_write());
    let message = expect_error(
        &call_tool(&server, "run_query", drop.clone()).await,
        "policy_denied",
        "DROP without drop flag",
    );
    assert!(message.contains("DROP operations are not allowed"));
    assert!(message.contains("CLICKHOUSE_ALLOW_DROP=true"));

    let server = ctx.server(AccessPolicy::unrestricted());
    expect_success(
        &call_tool(&server, "run_query", drop).await,
        "DROP with both flags",
    );

    let page = expect_success(
        &call_tool(&server, "list_tables", json!({ "database": DB })).await,
        "list after drop",
    );
    assert_eq!(page["tables"], json!([]));

    println!("     ✓ DROP gated on the drop flag, table gone afterwards");
}

pub async fn test_engine_error_is_wrapped(ctx: &TestContext) {
    println!("  🧪 test_engine_error_is_wrapped");

    let server = ctx.server(AccessPolicy::read_only());
    let message = expect_error(
        &call_tool(
            &server,
            "run_query",
            json!({ "query": "SELECT * FROM e2e_queries.does_not_exist" }),
        )
        .await,
        "query_execution_failed",
        "missing table",
    );
    assert!(message.starts_with("Query execution failed"));
    assert!(message.contains("UNKNOWN_TABLE") || message.contains("does not exist"));

    println!("     ✓ Engine error wrapped with its raw message");
}

pub async fn test_engine_side_readonly(ctx: &TestContext) {
    println!("  🧪 test_engine_side_readonly");

    // Classified as Read, but the engine still runs it read-only.
    let server = ctx.server(AccessPolicy::read_only());
    let result = call_tool(
        &server,
        "run_query",
        json!({ "query": "WITH 1 AS x SELECT x" }),
    )
    .await;
    let data = expect_success(&result, "WITH query");
    assert_eq!(data["rows"][0][0], Value::from(1));

    println!("     ✓ Read-only session still answers reads");
}

pub async fn test_engine_rejects_writes_in_readonly_session(ctx: &TestContext) {
    println!("  🧪 test_engine_rejects_writes_in_readonly_session");

    create_table(ctx).await;

    // Bypass the classifier: the engine itself must refuse the write.
    let failure = ctx
        .client
        .execute(
            &format!("INSERT INTO {}.people VALUES (1, 'x')", DB),
            &QueryParams::new(),
            &QuerySettings::read_only(),
        )
        .await
        .expect_err("INSERT under readonly=2 should be refused by the engine");
    assert!(
        failure.message.to_uppercase().contains("READONLY"),
        "unexpected engine message: {}",
        failure.message
    );

    let message = GatewayError::query_failed(failure).to_string();
    assert!(message.starts_with("Query execution failed: "), "{}", message);
    assert!(message.to_lowercase().contains("readonly"), "{}", message);

    let count = ctx
        .client
        .execute(
            &format!("SELECT count() FROM {}.people", DB),
            &QueryParams::new(),
            &QuerySettings::read_only(),
        )
        .await
        .expect("count after refused insert");
    assert_eq!(count.rows[0][0], Value::from(0));

    println!("     ✓ Engine refuses writes in a read-only session");
}

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\n📂 run_query");
    test_select(ctx).await;
    test_insert_denied_when_write_disabled(ctx).await;
    test_insert_then_select(ctx).await;
    test_drop_requires_drop_flag(ctx).await;
    test_engine_error_is_wrapped(ctx).await;
    test_engine_side_readonly(ctx).await;
    test_engine_rejects_writes_in_readonly_session(ctx).await;
}
