use js_sys::{Function, Reflect};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use etransit_core::{
    on_complete, Callback, Config, Easing, ElementId, Properties, StepCount, Target, Timing,
    Transit, TransitError, TransitEvent,
};

mod dom;

pub use dom::DomHost;

#[wasm_bindgen]
pub struct ETransit {
    core: Transit<DomHost>,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn js_error(err: TransitError) -> JsError {
    JsError::new(&format!("{} error: {err}", err.category()))
}

/// Run `f` with `this` bound to the element once the current engine call has
/// returned, so the callback may drive the engine again.
fn defer(f: Function, this: JsValue) {
    let run = Closure::once_into_js(move || {
        if let Err(err) = f.call0(&this) {
            web_sys::console::error_1(&err);
        }
    });
    let queued = Reflect::get(&js_sys::global(), &JsValue::from_str("queueMicrotask"))
        .ok()
        .and_then(|q| q.dyn_into::<Function>().ok())
        .map(|queue| queue.call1(&JsValue::UNDEFINED, &run));
    if !matches!(queued, Some(Ok(_))) {
        web_sys::console::error_1(&JsValue::from_str("etransit: cannot queue callback"));
    }
}

fn parse_timing(duration: &JsValue) -> Result<Timing, JsError> {
    if jsvalue_is_undefined_or_null(duration) {
        return Ok(Timing::default());
    }
    if let Some(ms) = duration.as_f64() {
        return Ok(Timing::new(ms));
    }
    if let Some(text) = duration.as_string() {
        return text.parse().map_err(js_error);
    }
    swb::from_value(duration.clone()).map_err(|e| JsError::new(&format!("duration error: {e}")))
}

fn parse_easing(easing: &JsValue) -> Easing {
    if let Some(text) = easing.as_string() {
        return Easing::parse_or_default(&text);
    }
    if jsvalue_is_undefined_or_null(easing) {
        return Easing::default();
    }
    swb::from_value(easing.clone()).unwrap_or_default()
}

fn parse_count(step: &JsValue) -> StepCount {
    step.as_f64()
        .map_or(StepCount::All, |n| StepCount::from(n as i32))
}

/// Loop counts: anything below one means the whole history.
fn parse_loop_count(step: &JsValue) -> StepCount {
    match step.as_f64() {
        Some(n) if n >= 1.0 => StepCount::Last(n as usize),
        _ => StepCount::All,
    }
}

#[wasm_bindgen]
impl ETransit {
    /// Create an orchestrator over the current document. Pass a config object
    /// (`{ enabled, useTransitionEnd, speeds: { _default } }`) or
    /// undefined/null for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ETransit, JsError> {
        console_error_panic_hook::set_once();

        let cfg: Config = if jsvalue_is_undefined_or_null(&config) {
            Config::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };
        Ok(ETransit {
            core: Transit::with_config(DomHost::new()?, cfg),
        })
    }

    /// Replace the config at runtime.
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsError> {
        let cfg: Config =
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?;
        self.core.set_config(cfg);
        Ok(())
    }

    #[wasm_bindgen(js_name = getConfig)]
    pub fn config(&self) -> Result<JsValue, JsError> {
        swb::to_value(self.core.config()).map_err(|e| JsError::new(&format!("config error: {e}")))
    }

    /// Feature table detected for this document.
    pub fn support(&self) -> Result<JsValue, JsError> {
        swb::to_value(self.core.support()).map_err(|e| JsError::new(&format!("support error: {e}")))
    }

    /// Handle for an element, an element id string, or an existing handle.
    pub fn element(&mut self, target: JsValue) -> Result<u32, JsError> {
        self.resolve(&target).map(|elem| elem.0)
    }

    /// Queue a transition. `duration` is ms, a time string (`"0.3s"`) or
    /// `{ duration, delay }`; `easing` is a keyword, `cubic-bezier(...)` text or
    /// four control points.
    pub fn transit(
        &mut self,
        target: JsValue,
        props: JsValue,
        duration: JsValue,
        easing: JsValue,
        callback: Option<Function>,
    ) -> Result<u32, JsError> {
        let elem = self.resolve(&target)?;
        let properties: Properties =
            swb::from_value(props).map_err(|e| JsError::new(&format!("properties error: {e}")))?;
        let timing = parse_timing(&duration)?;
        let callback = self.callback(callback);
        self.core
            .transit(elem, properties, timing, parse_easing(&easing), callback);
        Ok(elem.0)
    }

    /// Undo the newest `step` recorded steps (one when omitted, all for -1).
    pub fn reverse(
        &mut self,
        target: JsValue,
        step: JsValue,
        callback: Option<Function>,
    ) -> Result<(), JsError> {
        let elem = self.resolve(&target)?;
        let count = if jsvalue_is_undefined_or_null(&step) {
            StepCount::default()
        } else {
            parse_count(&step)
        };
        let callback = self.callback(callback);
        self.core.reverse(elem, count, callback);
        Ok(())
    }

    pub fn restore(&mut self, target: JsValue, callback: Option<Function>) -> Result<(), JsError> {
        let elem = self.resolve(&target)?;
        let callback = self.callback(callback);
        self.core.restore(elem, callback);
        Ok(())
    }

    #[wasm_bindgen(js_name = restoreNow)]
    pub fn restore_now(&mut self, target: JsValue, callback: Option<Function>) -> Result<(), JsError> {
        let elem = self.resolve(&target)?;
        let callback = self.callback(callback);
        self.core.restore_now(elem, callback);
        Ok(())
    }

    #[wasm_bindgen(js_name = restoreAllStyle)]
    pub fn restore_all_style(
        &mut self,
        target: JsValue,
        callback: Option<Function>,
    ) -> Result<(), JsError> {
        let elem = self.resolve(&target)?;
        let callback = self.callback(callback);
        self.core.restore_all_style(elem, callback);
        Ok(())
    }

    /// Replay the newest `step` steps `times` times (2 and all by default).
    #[wasm_bindgen(js_name = "loop")]
    pub fn repeat(&mut self, target: JsValue, times: Option<u32>, step: JsValue) -> Result<(), JsError> {
        let elem = self.resolve(&target)?;
        self.core
            .repeat(elem, times.unwrap_or(0), parse_loop_count(&step));
        Ok(())
    }

    pub fn pause(&mut self, target: JsValue) -> Result<(), JsError> {
        let elem = self.resolve(&target)?;
        self.core.pause(elem);
        Ok(())
    }

    pub fn resume(&mut self, target: JsValue) -> Result<(), JsError> {
        let elem = self.resolve(&target)?;
        self.core.resume(elem);
        Ok(())
    }

    #[wasm_bindgen(js_name = getProgress)]
    pub fn progress(&mut self, target: JsValue) -> Result<f64, JsError> {
        let elem = self.resolve(&target)?;
        Ok(self.core.progress(elem))
    }

    #[wasm_bindgen(js_name = isPaused)]
    pub fn is_paused(&mut self, target: JsValue) -> Result<bool, JsError> {
        let elem = self.resolve(&target)?;
        Ok(self.core.is_paused(elem))
    }

    /// Drop all state kept for an element. Its pending callbacks never run.
    pub fn forget(&mut self, target: JsValue) -> Result<(), JsError> {
        let elem = self.resolve(&target)?;
        self.core.forget(elem);
        self.core.host_mut().release(elem);
        Ok(())
    }

    /// Advance the clock by `dt_ms`, deliver `transitionend` events and fire due
    /// timers. Returns the events produced since the previous call.
    pub fn update(&mut self, dt_ms: f64) -> Result<JsValue, JsError> {
        let out = self.core.update(dt_ms);
        for event in &out.events {
            if let TransitEvent::Diagnostic { message } = event {
                web_sys::console::warn_1(&JsValue::from_str(message));
            }
        }
        swb::to_value(out).map_err(|e| JsError::new(&format!("outputs error: {e}")))
    }

    /// Number of elements the document adapter still holds.
    #[wasm_bindgen(js_name = trackedElements)]
    pub fn tracked_elements(&self) -> usize {
        self.core.host().registry().borrow().len()
    }

    /// Clock time in milliseconds.
    pub fn now(&self) -> f64 {
        self.core.now()
    }
}

impl ETransit {
    fn resolve(&mut self, target: &JsValue) -> Result<ElementId, JsError> {
        if let Some(el) = target.dyn_ref::<HtmlElement>() {
            return Ok(self.core.host().register(el));
        }
        let target = if let Some(id) = target.as_string() {
            Target::Id(id)
        } else if let Some(n) = target.as_f64() {
            Target::Element(ElementId(n as u32))
        } else {
            return Err(JsError::new(
                "target must be an element, an element id or a handle",
            ));
        };
        self.core.resolve(&target).map_err(js_error)
    }

    fn callback(&self, callback: Option<Function>) -> Option<Callback> {
        let f = callback?;
        let registry = self.core.host().registry();
        on_complete(move |elem| {
            let this = registry
                .borrow()
                .element(elem)
                .map_or(JsValue::UNDEFINED, |el| el.clone().into());
            defer(f, this);
        })
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
