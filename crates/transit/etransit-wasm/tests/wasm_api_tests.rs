#![cfg(target_arch = "wasm32")]
use etransit_wasm::{abi_version, ETransit};
use js_sys::{Array, Reflect, JSON};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::*;
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

fn json(text: &str) -> JsValue {
    JSON::parse(text).unwrap()
}

/// Append `<div id=...>` to the body and return it.
fn mk_div(id: &str) -> HtmlElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let body = document.body().unwrap();
    body.insert_adjacent_html("beforeend", &format!("<div id=\"{id}\"></div>"))
        .unwrap();
    document
        .get_element_by_id(id)
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap()
}

fn timer_engine() -> ETransit {
    ETransit::new(json(r#"{"useTransitionEnd": false}"#)).unwrap()
}

#[wasm_bindgen_test]
fn abi_is_1() {
    assert_eq!(abi_version(), 1);
}

#[wasm_bindgen_test]
fn construct_with_defaults_and_config() {
    assert!(ETransit::new(JsValue::UNDEFINED).is_ok());
    let et = ETransit::new(json(r#"{"speeds": {"_default": 250}}"#)).unwrap();
    let cfg = et.config().unwrap();
    let speeds = Reflect::get(&cfg, &JsValue::from_str("speeds")).unwrap();
    let default = Reflect::get(&speeds, &JsValue::from_str("_default")).unwrap();
    assert_eq!(default.as_f64(), Some(250.0));
    let enabled = Reflect::get(&cfg, &JsValue::from_str("enabled")).unwrap();
    assert_eq!(enabled.as_bool(), Some(true));
}

#[wasm_bindgen_test]
fn zero_duration_applies_immediately() {
    let div = mk_div("zero");
    let mut et = timer_engine();
    et.transit(
        JsValue::from_str("zero"),
        json(r#"{"opacity": 0.5}"#),
        JsValue::from_f64(0.0),
        JsValue::UNDEFINED,
        None,
    )
    .unwrap();
    assert_eq!(div.style().get_property_value("opacity").unwrap(), "0.5");
}

#[wasm_bindgen_test]
fn elements_and_ids_share_a_handle() {
    let div = mk_div("shared");
    let mut et = timer_engine();
    let by_id = et.element(JsValue::from_str("shared")).unwrap();
    let by_el = et.element(div.into()).unwrap();
    assert_eq!(by_id, by_el);
    assert_eq!(et.element(JsValue::from_f64(by_id as f64)).unwrap(), by_id);
}

#[wasm_bindgen_test]
fn missing_target_is_an_error() {
    let mut et = timer_engine();
    let res = et.transit(
        JsValue::from_str("no-such-element"),
        json(r#"{"opacity": 0}"#),
        JsValue::UNDEFINED,
        JsValue::UNDEFINED,
        None,
    );
    assert!(res.is_err());
}

#[wasm_bindgen_test]
fn timer_steps_progress_and_complete() {
    let div = mk_div("timed");
    let mut et = timer_engine();
    et.transit(
        div.clone().into(),
        json(r#"{"x": 100}"#),
        JsValue::from_str("1s"),
        JsValue::from_str("linear"),
        None,
    )
    .unwrap();
    let transition = div.style().get_property_value("transition").unwrap();
    assert!(transition.contains("transform"), "got {transition}");

    let out = et.update(250.0).unwrap();
    let events = Array::from(&Reflect::get(&out, &JsValue::from_str("events")).unwrap());
    assert!(events.length() >= 1);
    assert_eq!(et.progress(div.clone().into()).unwrap(), 0.25);

    et.update(750.0).unwrap();
    assert_eq!(et.progress(div.clone().into()).unwrap(), 1.0);
    assert_eq!(div.style().get_property_value("transition").unwrap(), "");
}

#[wasm_bindgen_test]
fn disabled_config_skips_transitions() {
    let div = mk_div("disabled");
    let mut et = ETransit::new(json(r#"{"enabled": false}"#)).unwrap();
    et.transit(
        div.clone().into(),
        json(r#"{"width": 40}"#),
        JsValue::from_f64(500.0),
        JsValue::UNDEFINED,
        None,
    )
    .unwrap();
    assert_eq!(div.style().get_property_value("width").unwrap(), "40px");
    assert_eq!(div.style().get_property_value("transition").unwrap(), "");
}

#[wasm_bindgen_test]
fn pause_and_resume_toggle_state() {
    let div = mk_div("paused");
    let mut et = timer_engine();
    et.transit(
        div.clone().into(),
        json(r#"{"opacity": 0}"#),
        JsValue::from_f64(1000.0),
        JsValue::UNDEFINED,
        None,
    )
    .unwrap();
    et.update(500.0).unwrap();
    et.pause(div.clone().into()).unwrap();
    assert!(et.is_paused(div.clone().into()).unwrap());
    assert_eq!(et.progress(div.clone().into()).unwrap(), 0.5);

    et.resume(div.clone().into()).unwrap();
    assert!(!et.is_paused(div.clone().into()).unwrap());
    let transition = div.style().get_property_value("transition").unwrap();
    assert!(transition.contains("cubic-bezier"), "got {transition}");
}

#[wasm_bindgen_test]
fn forget_releases_the_element() {
    let div = mk_div("forgotten");
    let mut et = timer_engine();
    let before = et.tracked_elements();
    let handle = et.element(div.clone().into()).unwrap();
    assert_eq!(et.tracked_elements(), before + 1);

    et.forget(div.clone().into()).unwrap();
    assert_eq!(et.tracked_elements(), before);

    // Seen again, the element gets a fresh handle.
    let again = et.element(div.into()).unwrap();
    assert_ne!(again, handle);
    assert_eq!(et.tracked_elements(), before + 1);
}
