//! Counter app: commits, getters and subscriptions

use coffer::{ModuleDef, Store, StoreResult};
use serde_json::{json, Value};

#[tokio::main]
async fn main() -> StoreResult<()> {
    println!("=== Counter Example ===\n");

    let store = Store::new(
        ModuleDef::new(json!({ "count": 0 }))
            .getter("doubled", |state, _getters, _root| {
                json!(state["count"].as_i64().unwrap_or(0) * 2)
            })
            .mutation("increment", |state, payload| {
                let step = payload.as_i64().unwrap_or(1);
                state["count"] = json!(state["count"].as_i64().unwrap_or(0) + step);
            })
            .action("increment_async", |ctx, payload| async move {
                tokio::task::yield_now().await;
                ctx.commit("increment", payload)?;
                Ok(Value::Null)
            }),
    )?;

    // Subscribe to committed mutations
    let _guard = store.subscribe(|record, state| {
        println!("committed {} -> count = {}", record.ty, state["count"]);
    });

    println!("Committing synchronously...");
    store.commit("increment", json!(1))?;

    println!("\nDispatching an async action...");
    store.dispatch("increment_async", json!(2)).await?;

    println!("\ncount = {}", store.state()["count"]);
    println!("doubled = {}", store.getter("doubled")?);
    Ok(())
}
