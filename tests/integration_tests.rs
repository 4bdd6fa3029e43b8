//! Integration tests for Coffer

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use serde_json::{json, Value};

use coffer::{
    CommitOptions, DevtoolHook, DiagnosticKind, MemoryDiagnostics, ModuleDef, Store, StoreError,
};

const TEST: &str = "TEST";

fn counter_module() -> ModuleDef {
    ModuleDef::new(json!({ "a": 1 })).mutation(TEST, |state, n| {
        state["a"] = json!(state["a"].as_i64().unwrap_or(0) + n.as_i64().unwrap_or(0));
    })
}

#[derive(Default)]
struct RecordingHook {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingHook {
    fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().unwrap().clone()
    }
}

impl DevtoolHook for RecordingHook {
    fn emit(&self, event: &str, payload: &Value) {
        self.events
            .lock()
            .unwrap()
            .push((event.to_string(), payload.clone()));
    }
}

#[test]
fn committing_mutations() {
    let store = Store::new(counter_module()).unwrap();
    store.commit(TEST, json!(2)).unwrap();
    assert_eq!(store.state()["a"], json!(3));
}

#[test]
fn committing_with_object_style() {
    let store = Store::new(ModuleDef::new(json!({ "a": 1 })).mutation(TEST, |state, payload| {
        state["a"] =
            json!(state["a"].as_i64().unwrap_or(0) + payload["amount"].as_i64().unwrap_or(0));
    }))
    .unwrap();
    store
        .commit_payload(json!({ "type": TEST, "amount": 2 }))
        .unwrap();
    assert_eq!(store.state()["a"], json!(3));
}

#[test]
fn asserts_committed_type() {
    let store = Store::new(counter_module()).unwrap();

    let err = store.commit_payload(json!({ "amount": 2 })).unwrap_err();
    assert_eq!(
        err.to_string(),
        "expects string as the type, but found undefined"
    );
    assert_eq!(store.state()["a"], json!(1));
}

#[tokio::test]
async fn dispatching_actions() {
    let store = Store::new(counter_module().action(TEST, |ctx, n| async move {
        ctx.commit(TEST, n)?;
        Ok(Value::Null)
    }))
    .unwrap();

    store.dispatch(TEST, json!(2)).await.unwrap();
    assert_eq!(store.state()["a"], json!(3));
}

#[tokio::test]
async fn dispatching_with_object_style() {
    let store = Store::new(counter_module().action(TEST, |ctx, payload| async move {
        ctx.commit(TEST, payload["amount"].clone())?;
        Ok(Value::Null)
    }))
    .unwrap();

    store
        .dispatch_payload(json!({ "type": TEST, "amount": 2 }))
        .await
        .unwrap();
    assert_eq!(store.state()["a"], json!(3));
}

#[tokio::test]
async fn dispatching_actions_with_deferred_work() {
    let store = Store::new(counter_module().action(TEST, |ctx, n| async move {
        tokio::task::yield_now().await;
        ctx.commit(TEST, n)?;
        Ok(Value::Null)
    }))
    .unwrap();

    // The returned future is lazy: nothing has run yet.
    let pending = store.dispatch(TEST, json!(2));
    assert_eq!(store.state()["a"], json!(1));

    pending.await.unwrap();
    assert_eq!(store.state()["a"], json!(3));
}

#[tokio::test]
async fn composing_actions() {
    let store = Store::new(
        counter_module()
            .action(TEST, |ctx, n| async move {
                tokio::task::yield_now().await;
                ctx.commit(TEST, n)?;
                Ok(Value::Null)
            })
            .action("two", |ctx, n| async move {
                ctx.dispatch(TEST, json!(1)).await?;
                // The nested commit is observably complete before we resume.
                assert_eq!(ctx.root_state()["a"], json!(2));
                ctx.commit(TEST, n)?;
                Ok(Value::Null)
            }),
    )
    .unwrap();

    assert_eq!(store.state()["a"], json!(1));
    store.dispatch("two", json!(3)).await.unwrap();
    assert_eq!(store.state()["a"], json!(5));
}

#[tokio::test]
async fn detecting_action_rejections() {
    let store = Store::new(
        ModuleDef::default().action(TEST, |_ctx, _n| async { Err(StoreError::reject("no")) }),
    )
    .unwrap();
    let hook = Arc::new(RecordingHook::default());
    store.attach_devtool(hook.clone());

    let err = store.dispatch(TEST, Value::Null).await.unwrap_err();
    assert!(matches!(err, StoreError::Rejected(ref value) if value == &json!("no")));
    assert_eq!(hook.events(), vec![("vuex:error".to_string(), json!("no"))]);
}

#[tokio::test]
async fn asserts_dispatched_type() {
    let store = Store::new(counter_module().action(TEST, |ctx, n| async move {
        ctx.commit(TEST, n)?;
        Ok(Value::Null)
    }))
    .unwrap();

    let err = store
        .dispatch_payload(json!({ "amount": 2 }))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "expects string as the type, but found undefined"
    );
    assert_eq!(store.state()["a"], json!(1));
}

#[tokio::test]
async fn getters() {
    let store = Store::new(
        ModuleDef::new(json!({ "a": 0 }))
            .getter("state", |state, _getters, _root| {
                if state["a"].as_i64().unwrap_or(0) > 0 {
                    json!("hasAny")
                } else {
                    json!("none")
                }
            })
            .mutation(TEST, |state, n| {
                state["a"] = json!(state["a"].as_i64().unwrap_or(0) + n.as_i64().unwrap_or(0));
            })
            .action("check", |ctx, expected| async move {
                // Getters are exposed to actions through the context.
                assert_eq!(ctx.getter("state")?, expected);
                Ok(Value::Null)
            }),
    )
    .unwrap();

    assert_eq!(store.getter("state").unwrap(), json!("none"));
    store.dispatch("check", json!("none")).await.unwrap();

    store.commit(TEST, json!(1)).unwrap();

    assert_eq!(store.getter("state").unwrap(), json!("hasAny"));
    store.dispatch("check", json!("hasAny")).await.unwrap();
}

#[test]
fn scoped_getters() {
    let store = Store::new(ModuleDef::new(json!({ "greeting": "hello" })).module(
        "user",
        ModuleDef::new(json!({ "name": "ada" })).scoped_getter("banner", |scope| {
            json!(format!(
                "{} {}",
                scope.root_state["greeting"].as_str().unwrap_or(""),
                scope.state["name"].as_str().unwrap_or("")
            ))
        }),
    ))
    .unwrap();

    assert_eq!(store.getter("banner").unwrap(), json!("hello ada"));
}

#[test]
fn getters_can_read_other_getters() {
    let store = Store::new(
        ModuleDef::new(json!({ "a": 2 }))
            .getter("doubled", |state, _getters, _root| {
                json!(state["a"].as_i64().unwrap_or(0) * 2)
            })
            .getter("quadrupled", |_state, getters, _root| {
                json!(getters.get("doubled").unwrap().as_i64().unwrap_or(0) * 2)
            }),
    )
    .unwrap();

    assert_eq!(store.getter("quadrupled").unwrap(), json!(8));
}

#[test]
fn subscribe_handles_subscriptions_and_unsubscriptions() {
    let store =
        Store::new(ModuleDef::new(json!({})).mutation(TEST, |_state, _payload| {})).unwrap();

    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));
    let payload = json!(2);

    let first = store.subscribe({
        let calls = Arc::clone(&first_calls);
        let expected = payload.clone();
        move |record, _state| {
            assert_eq!(record.ty, TEST);
            assert_eq!(record.payload, expected);
            calls.fetch_add(1, Ordering::SeqCst);
        }
    });
    let _second = store.subscribe({
        let calls = Arc::clone(&second_calls);
        move |_record, _state| {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    });

    store.commit(TEST, payload.clone()).unwrap();
    first.unsubscribe();
    store.commit(TEST, payload).unwrap();

    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn watch_fires_on_changes_and_survives_module_registration() {
    let store = Store::new(
        ModuleDef::new(json!({ "count": 0 })).mutation(TEST, |state, _payload| {
            state["count"] = json!(state["count"].as_i64().unwrap_or(0) + 1);
        }),
    )
    .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let _guard = store.watch(|state, _getters| state["count"].clone(), {
        let seen = Arc::clone(&seen);
        move |new, old| {
            seen.lock().unwrap().push((new.clone(), old.clone()));
        }
    });

    store.register_module("test", ModuleDef::default()).unwrap();

    store.commit(TEST, Value::Null).unwrap();
    assert_eq!(store.state()["count"], json!(1));
    assert_eq!(seen.lock().unwrap().as_slice(), &[(json!(1), json!(0))]);
}

#[test]
fn watch_getter_has_access_to_store_getters() {
    let store = Store::new(
        ModuleDef::new(json!({ "count": 0 }))
            .getter("getCount", |state, _getters, _root| state["count"].clone())
            .mutation(TEST, |state, _payload| {
                state["count"] = json!(state["count"].as_i64().unwrap_or(0) + 1);
            }),
    )
    .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let _guard = store.watch(|_state, getters| getters.get("getCount").unwrap(), {
        let seen = Arc::clone(&seen);
        move |new, _old| {
            seen.lock().unwrap().push(new.clone());
        }
    });

    store.commit(TEST, Value::Null).unwrap();
    assert_eq!(seen.lock().unwrap().as_slice(), &[json!(1)]);
}

#[test]
fn duplicate_types_warn_and_overwrite() {
    let sink = Arc::new(MemoryDiagnostics::new());
    let store = Store::builder(
        ModuleDef::new(json!({ "a": 1 })).getter("total", |_state, _getters, _root| json!("root")),
    )
    .diagnostics(sink.clone())
    .build()
    .unwrap();

    store
        .register_module(
            "cart",
            ModuleDef::new(json!({})).getter("total", |_state, _getters, _root| json!("cart")),
        )
        .unwrap();

    assert!(sink.has(DiagnosticKind::DuplicateGetter));
    // Best-effort registration: the newer definition wins.
    assert_eq!(store.getter("total").unwrap(), json!("cart"));
}

#[test]
fn warns_silent_option_deprecation() {
    let sink = Arc::new(MemoryDiagnostics::new());
    let store = Store::builder(ModuleDef::new(json!({})).mutation(TEST, |_state, _payload| {}))
        .diagnostics(sink.clone())
        .build()
        .unwrap();

    store
        .commit_with_options(TEST, json!({}), CommitOptions { silent: true })
        .unwrap();

    assert!(sink.has(DiagnosticKind::DeprecatedOption));
}

#[tokio::test]
async fn placeholder_entries_pass_through_but_cannot_run() {
    let store = Store::new(
        ModuleDef::new(json!({}))
            .mutation_placeholder("marker", json!("todo"))
            .action_placeholder("later", json!(null)),
    )
    .unwrap();

    let err = store.commit("marker", Value::Null).unwrap_err();
    assert!(matches!(err, StoreError::NotCallable(ref ty) if ty == "marker"));

    let err = store.dispatch("later", Value::Null).await.unwrap_err();
    assert!(matches!(err, StoreError::NotCallable(ref ty) if ty == "later"));
}

#[test]
fn nested_modules_attach_under_their_parents() {
    let store = Store::new(ModuleDef::new(json!({})).module(
        "cart",
        ModuleDef::new(json!({ "items": [] })).module(
            "pricing",
            ModuleDef::new(json!({ "total": 0 })).mutation("setTotal", |state, n| {
                state["total"] = n;
            }),
        ),
    ))
    .unwrap();

    store.commit("setTotal", json!(99)).unwrap();
    assert_eq!(store.state()["cart"]["pricing"]["total"], json!(99));
}

#[test]
fn getter_cache_stays_coherent_under_concurrent_commits() {
    // A commit racing a getter read must never cache the pre-commit value
    // under the post-commit version.
    for _ in 0..200 {
        let store = Store::new(
            ModuleDef::new(json!({ "val": 0 }))
                .getter("val", |state, _getters, _root| state["val"].clone())
                .mutation("set", |state, n| {
                    state["val"] = n;
                }),
        )
        .unwrap();

        let barrier = Arc::new(std::sync::Barrier::new(2));
        let writer = std::thread::spawn({
            let store = store.clone();
            let barrier = Arc::clone(&barrier);
            move || {
                barrier.wait();
                store.commit("set", json!(1)).unwrap();
            }
        });
        let reader = std::thread::spawn({
            let store = store.clone();
            let barrier = Arc::clone(&barrier);
            move || {
                barrier.wait();
                let _ = store.getter("val");
            }
        });
        writer.join().unwrap();
        reader.join().unwrap();

        // Quiescent now: the cached getter must agree with the state.
        assert_eq!(store.state()["val"], json!(1));
        assert_eq!(store.getter("val").unwrap(), json!(1));
    }
}

#[test]
fn replacing_state_recomputes_getters() {
    let store = Store::builder(
        ModuleDef::new(json!({ "a": 1 })).getter("doubled", |state, _getters, _root| {
            json!(state["a"].as_i64().unwrap_or(0) * 2)
        }),
    )
    .strict(true)
    .build()
    .unwrap();

    assert_eq!(store.getter("doubled").unwrap(), json!(2));

    // Allowed even in strict mode, e.g. for hot-reload.
    store.replace_state(json!({ "a": 5 }));
    assert_eq!(store.state()["a"], json!(5));
    assert_eq!(store.getter("doubled").unwrap(), json!(10));
}

#[test]
fn devtool_receives_commit_events() {
    let hook = Arc::new(RecordingHook::default());
    let store = Store::builder(counter_module())
        .devtool(hook.clone())
        .build()
        .unwrap();

    store.commit(TEST, json!(2)).unwrap();
    assert_eq!(
        hook.events(),
        vec![("commit".to_string(), json!({ "type": TEST, "payload": 2 }))]
    );
}
