//! Browser geometry and the Web Animations primitive the widget is built on.

use crate::models::{Rect, Vec2};
use crate::reorder::LayoutProbe;
use leptos_dom::helpers::set_timeout;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub fn rect_of(el: &web_sys::Element) -> Rect {
    let r = el.get_bounding_client_rect();
    Rect::new(r.x(), r.y(), r.width(), r.height())
}

pub fn scroll_y() -> f64 {
    web_sys::window()
        .and_then(|w| w.scroll_y().ok())
        .unwrap_or(0.0)
}

/// Viewport width without the vertical scrollbar.
pub fn viewport_width() -> f64 {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.document_element())
        .map(|el| f64::from(el.client_width()))
        .unwrap_or(0.0)
}

pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

pub fn translate(v: Vec2) -> String {
    format!("translate({}px, {}px)", v.x, v.y)
}

pub fn translate_y(dy: f64) -> String {
    format!("translateY({dy}px)")
}

pub fn px(v: f64) -> String {
    format!("{v}px")
}

/// Rects of the list's rendered rows, decoy included.
pub struct DomLayoutProbe {
    container: web_sys::Element,
}

impl DomLayoutProbe {
    pub fn new(container: web_sys::Element) -> Self {
        Self { container }
    }

    pub fn row(&self, index: usize) -> Option<web_sys::Element> {
        u32::try_from(index)
            .ok()
            .and_then(|i| self.container.children().item(i))
    }
}

impl LayoutProbe for DomLayoutProbe {
    fn slot_rects(&self) -> Vec<Rect> {
        let children = self.container.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .map(|el| rect_of(&el))
            .collect()
    }

    fn scroll_y(&self) -> f64 {
        scroll_y()
    }

    fn viewport_width(&self) -> f64 {
        viewport_width()
    }
}

/// Keyframe list for `Element.animate`.
pub struct Keyframes(js_sys::Array);

impl Keyframes {
    pub fn new() -> Self {
        Self(js_sys::Array::new())
    }

    pub fn frame(self, props: &[(&str, &str)]) -> Self {
        let frame = js_sys::Object::new();
        for (name, value) in props {
            let _ = js_sys::Reflect::set(&frame, &JsValue::from_str(name), &JsValue::from_str(value));
        }
        self.0.push(&frame);
        self
    }

    /// Two-frame animation of a single property.
    pub fn between(property: &str, from: &str, to: &str) -> Self {
        Self::new().frame(&[(property, from)]).frame(&[(property, to)])
    }
}

impl Default for Keyframes {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AnimateOptions {
    pub duration_ms: u32,
    pub easing: &'static str,
    /// Hold the last frame after finishing.
    pub hold: bool,
}

impl AnimateOptions {
    pub fn ease(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            easing: "ease",
            hold: false,
        }
    }

    pub fn held(self) -> Self {
        Self { hold: true, ..self }
    }
}

/// Run a Web Animation on `el` and call `on_finish` once it completes.
///
/// `on_finish` always runs exactly once: when the browser cannot animate, it
/// runs on the next tick instead.
pub fn animate(
    el: &web_sys::Element,
    keyframes: Keyframes,
    options: AnimateOptions,
    on_finish: impl FnOnce() + 'static,
) {
    let opts = js_sys::Object::new();
    let _ = js_sys::Reflect::set(
        &opts,
        &"duration".into(),
        &JsValue::from_f64(f64::from(options.duration_ms)),
    );
    let _ = js_sys::Reflect::set(&opts, &"easing".into(), &options.easing.into());
    let fill = if options.hold { "forwards" } else { "none" };
    let _ = js_sys::Reflect::set(&opts, &"fill".into(), &fill.into());

    let animation = js_sys::Reflect::get(el, &"animate".into())
        .ok()
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
        .and_then(|f| f.call2(el, &keyframes.0, &opts).ok())
        .and_then(|a| a.dyn_into::<web_sys::Animation>().ok());

    match animation {
        Some(animation) => {
            let cb = Closure::once_into_js(on_finish);
            animation.set_onfinish(Some(cb.unchecked_ref()));
        }
        None => {
            log::debug!("event=animate module=widget status=unsupported");
            set_timeout(on_finish, Duration::ZERO);
        }
    }
}
