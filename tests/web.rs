// Browser tests; run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use shootz_eggs::store::{KvBackend, LocalStorageBackend, Store};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn local_storage_round_trips_a_value() {
    let mut backend = LocalStorageBackend::open();
    backend.set("shootz_test_key", "{\"a\":1}").unwrap();
    assert_eq!(
        backend.get("shootz_test_key").unwrap().as_deref(),
        Some("{\"a\":1}")
    );
    backend.remove("shootz_test_key").unwrap();
    assert_eq!(backend.get("shootz_test_key").unwrap(), None);
}

#[wasm_bindgen_test]
fn store_falls_back_on_garbage() {
    let mut store = Store::new(LocalStorageBackend::open());
    let mut backend = LocalStorageBackend::open();
    backend.set("shootz_test_garbage", "{oops").unwrap();
    let loaded: Vec<u32> = store.load("shootz_test_garbage");
    assert!(loaded.is_empty());
    store.clear("shootz_test_garbage");
}
