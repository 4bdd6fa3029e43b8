//! Shopping cart: namespaced modules and composed actions

use coffer::{ModuleDef, Store, StoreResult};
use serde_json::{json, Value};

fn cart_module() -> ModuleDef {
    ModuleDef::new(json!({ "items": [] }))
        .getter("item_count", |state, _getters, _root| {
            json!(state["items"].as_array().map(Vec::len).unwrap_or(0))
        })
        .mutation("add_item", |state, item| {
            if let Some(items) = state["items"].as_array_mut() {
                items.push(item);
            }
        })
        .action("checkout", |ctx, _payload| async move {
            // Pretend to talk to a payment gateway.
            tokio::task::yield_now().await;
            let count = ctx.getter("item_count")?;
            ctx.commit("record_order", count.clone())?;
            Ok(count)
        })
}

fn history_module() -> ModuleDef {
    ModuleDef::new(json!({ "orders": [] })).mutation("record_order", |state, count| {
        if let Some(orders) = state["orders"].as_array_mut() {
            orders.push(count);
        }
    })
}

#[tokio::main]
async fn main() -> StoreResult<()> {
    println!("=== Shopping Cart Example ===\n");

    let store = Store::new(
        ModuleDef::default()
            .module("cart", cart_module())
            .module("history", history_module()),
    )?;

    store.commit("add_item", json!({ "sku": "tin-can", "qty": 2 }))?;
    store.commit("add_item", json!({ "sku": "string", "qty": 1 }))?;
    println!("items in cart: {}", store.getter("item_count")?);

    let ordered: Value = store.dispatch("checkout", Value::Null).await?;
    println!("checked out {ordered} items");
    println!("order history: {}", store.state()["history"]["orders"]);
    Ok(())
}
