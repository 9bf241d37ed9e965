//! Browser-side smoke tests; run with `wasm-pack test --headless`.

#![cfg(target_arch = "wasm32")]

use micro4_wasm::{gates_for_opcode, WasmSession};
use serde::Serialize;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::wasm_bindgen_test;

fn command(value: &serde_json::Value) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .expect("command")
}

#[wasm_bindgen_test]
fn boot_then_step_over_the_js_boundary() {
    let mut session = WasmSession::new();
    let ready = session.boot().expect("boot");
    let events = js_sys::Reflect::get(&ready, &JsValue::from_str("events")).expect("events");
    assert!(js_sys::Array::is_array(&events));

    let load = command(&serde_json::json!({
        "type": "LOAD_PROGRAM",
        "words": [7, 5, 0, 0],
    }));
    session.send(load).expect("load");

    let reply = session
        .send(command(&serde_json::json!({ "type": "STEP" })))
        .expect("reply");
    let error = js_sys::Reflect::get(&reply, &JsValue::from_str("circuitError")).expect("field");
    assert!(error.is_undefined());
    let events = js_sys::Reflect::get(&reply, &JsValue::from_str("events")).expect("events");
    let first = js_sys::Reflect::get(&events, &JsValue::from_f64(0.0)).expect("first");
    let kind = js_sys::Reflect::get(&first, &JsValue::from_str("type")).expect("type");
    assert_eq!(kind.as_string().as_deref(), Some("STATE_UPDATE"));
}

#[wasm_bindgen_test]
fn malformed_hdl_is_thrown() {
    let mut session = WasmSession::new();
    assert!(session.load_circuit("wire a\nnonsense").is_err());
    assert!(session.load_reference_circuit().is_ok());
    assert!(!gates_for_opcode(3).is_empty());
}

#[wasm_bindgen_test]
fn oscillating_circuit_is_thrown_and_reported() {
    let mut session = WasmSession::new();
    session.boot().expect("boot");
    assert!(session
        .load_circuit("wire acc[3:0]; wire a\nnot n (input: a; output: a)")
        .is_err());
    session
        .send(command(&serde_json::json!({
            "type": "LOAD_PROGRAM",
            "words": [7, 1, 0, 0],
        })))
        .expect("load");
    let reply = session
        .send(command(&serde_json::json!({ "type": "STEP" })))
        .expect("reply");
    let error = js_sys::Reflect::get(&reply, &JsValue::from_str("circuitError")).expect("field");
    assert!(error.as_string().is_some_and(|message| message.contains("settle")));
    assert!(session.reset_circuit().is_err());
}
