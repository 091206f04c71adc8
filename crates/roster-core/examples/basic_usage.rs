//! Basic usage example: seed a search from the stored user, then apply and
//! clear a filter against an in-process search service.
//!
//! Run with: `cargo run --example basic_usage`

use std::sync::Arc;

use async_trait::async_trait;
use roster_core::error::Result;
use roster_core::prelude::*;

struct StaticSearch;

#[async_trait]
impl SearchService for StaticSearch {
    async fn search(&self, query: &SearchQuery) -> Result<serde_json::Value> {
        Ok(serde_json::json!([
            { "id": 1, "name": "Sam", "age": 29, "sex": "M" },
            { "id": 2, "name": format!("match for {}", query.to_query_string()) }
        ]))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let holder = IdentityHolder::load(Arc::new(MemoryStore::new()));
    holder.set(Some(Identity::new(7, "Akash", "p7")))?;

    let (synchronizer, handle) = SearchSynchronizer::new(
        Arc::new(holder),
        Arc::new(StaticSearch),
        Arc::new(History::new()),
        ParamStore::new(QueryParams::parse("?foo=bar")),
    );
    let session = tokio::spawn(synchronizer.run());

    // The first snapshot has no current_id; it is seeded from the stored user.
    let seeded = handle.wait_for_results(2).await;
    println!("params:  {}", handle.snapshot().params());
    println!("results: {:?}", seeded.map(|r| r.rows.len()));

    let filtered = handle.apply_filter("25");
    let results = handle.wait_for_results(filtered.revision()).await;
    println!("params:  {}", filtered.params());
    println!("results: {:?}", results.map(|r| r.rows));

    let cleared = handle.clear_filter();
    handle.wait_for_results(cleared.revision()).await;
    println!("params:  {}", cleared.params());

    drop(handle);
    if let Ok(end) = session.await {
        println!("session ended: {end:?}");
    }
    Ok(())
}
