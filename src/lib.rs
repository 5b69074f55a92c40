mod components;
pub mod config;
pub mod controller;
pub mod logging;
pub mod markdown;
pub mod models;
pub mod persist;
pub mod reorder;
pub mod storage;
pub mod widget;

use crate::config::WidgetConfig;
use crate::logging::init_logging;
use crate::widget::NotesWidget;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

// Needed for the `#[wasm_bindgen]` exports below.
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::wasm_bindgen;

/// Elements carrying this attribute get a widget on startup; its value is the
/// widget id.
pub const HOST_ATTRIBUTE: &str = "data-notes-id";

fn mount_with(element: web_sys::HtmlElement, widget_id: String, config: WidgetConfig) {
    log::info!("event=widget_mount module=lib status=ok widget_id={widget_id}");
    leptos::mount::mount_to(element, move || {
        view! { <NotesWidget widget_id=widget_id config=config /> }
    })
    .forget();
}

/// Mount a notes widget into `element`, persisting under `notes-{widget_id}`.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen(js_name = mountNotes))]
pub fn mount_notes(element: web_sys::HtmlElement, widget_id: String) {
    let config = WidgetConfig::from_window();
    init_logging(&config.log_level);
    mount_with(element, widget_id, config);
}

fn widget_hosts() -> Vec<(web_sys::HtmlElement, String)> {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return Vec::new();
    };
    let Ok(nodes) = document.query_selector_all(&format!("[{HOST_ATTRIBUTE}]")) else {
        log::warn!("event=widget_scan module=lib status=error");
        return Vec::new();
    };

    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .filter_map(|el| {
            let id = el.get_attribute(HOST_ATTRIBUTE)?;
            Some((el, id))
        })
        .collect()
}

#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();

    let config = WidgetConfig::from_window();
    init_logging(&config.log_level);

    let hosts = widget_hosts();
    log::debug!("event=widget_scan module=lib status=ok count={}", hosts.len());
    for (element, widget_id) in hosts {
        mount_with(element, widget_id, config.clone());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_hosts_are_found_by_attribute() {
        let document = web_sys::window().unwrap().document().unwrap();
        let host = document.create_element("div").unwrap();
        host.set_attribute(HOST_ATTRIBUTE, "wasm-test").unwrap();
        document.body().unwrap().append_child(&host).unwrap();

        let hosts = widget_hosts();
        assert!(hosts.iter().any(|(_, id)| id == "wasm-test"));

        host.remove();
    }
}
