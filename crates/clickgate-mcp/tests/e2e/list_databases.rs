//! `list_databases` tests.

use super::common::*;
use clickgate_policy::AccessPolicy;
use serde_json::json;

pub async fn test_lists_created_database(ctx: &TestContext) {
    println!("  🧪 test_lists_created_database");

    ctx.fresh_database("e2e_listing").await;
    let server = ctx.server(AccessPolicy::read_only());

    let result = call_tool(&server, "list_databases", json!({})).await;
    let databases = expect_success(&result, "list_databases should succeed");

    let names: Vec<&str> = databases
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(names.contains(&"e2e_listing"));
    assert!(names.contains(&"system"));

    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted, "databases should be in name order");

    println!("     ✓ Created database is listed, in order");
}

pub async fn test_listing_is_stable(ctx: &TestContext) {
    println!("  🧪 test_listing_is_stable");

    let server = ctx.server(AccessPolicy::read_only());
    let first = expect_success(&call_tool(&server, "list_databases", json!({})).await, "first");
    let second = expect_success(&call_tool(&server, "list_databases", json!({})).await, "second");
    assert_eq!(first, second);

    println!("     ✓ Two listings return the same set");
}

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\n📂 list_databases");
    test_lists_created_database(ctx).await;
    test_listing_is_stable(ctx).await;
}
