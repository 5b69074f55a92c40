use leptos::context::Provider;
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;
use tw_merge::*;
use wasm_bindgen::JsCast;

/// Viewport position a context menu opens at (`clientX`/`clientY`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MenuAnchor {
    pub x: f64,
    pub y: f64,
}

impl MenuAnchor {
    pub fn from_event(ev: &web_sys::MouseEvent) -> Self {
        Self {
            x: f64::from(ev.client_x()),
            y: f64::from(ev.client_y()),
        }
    }
}

#[derive(Clone, Copy)]
struct ContextMenuContext {
    open: RwSignal<Option<MenuAnchor>>,
}

/* ========================================================== */
/*                     ✨ FUNCTIONS ✨                        */
/* ========================================================== */

/// A floating menu shown while `open` holds an anchor.
///
/// Closes on a mouse press outside the menu, on Escape, and after an item is
/// chosen.
#[component]
pub fn ContextMenu(
    open: RwSignal<Option<MenuAnchor>>,
    children: ChildrenFn,
    #[prop(optional, into)] class: String,
) -> impl IntoView {
    let menu_ref: NodeRef<html::Ul> = NodeRef::new();

    let press_handle = window_event_listener(ev::mousedown, move |ev: web_sys::MouseEvent| {
        if open.get_untracked().is_none() {
            return;
        }
        let target = ev.target().and_then(|t| t.dyn_into::<web_sys::Node>().ok());
        let inside = match (menu_ref.get_untracked(), target) {
            (Some(menu), Some(node)) => menu.contains(Some(&node)),
            _ => false,
        };
        if !inside {
            open.set(None);
        }
    });
    let key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        if ev.key() == "Escape" && open.get_untracked().is_some() {
            open.set(None);
        }
    });
    on_cleanup(move || {
        press_handle.remove();
        key_handle.remove();
    });

    let merged_class = tw_merge!(
        "fixed z-[100] min-w-[160px] rounded-md border bg-popover p-1 text-popover-foreground shadow-md",
        class
    );
    let position = move || {
        open.get()
            .map(|a| format!("left: {}px; top: {}px;", a.x, a.y))
            .unwrap_or_default()
    };

    view! {
        <Provider value=ContextMenuContext { open }>
            <Show when=move || open.get().is_some()>
                <ul
                    data-name="ContextMenu"
                    role="menu"
                    class=merged_class.clone()
                    style=position
                    node_ref=menu_ref
                    on:contextmenu=|ev: web_sys::MouseEvent| ev.prevent_default()
                >
                    {children()}
                </ul>
            </Show>
        </Provider>
    }
}

#[component]
pub fn ContextMenuItem(
    children: Children,
    #[prop(into)] on_select: Callback<()>,
    #[prop(optional, into)] class: String,
) -> impl IntoView {
    let ctx = expect_context::<ContextMenuContext>();

    let merged_class = tw_merge!(
        "inline-flex gap-2 items-center w-full rounded-sm px-2 py-1.5 text-sm cursor-pointer transition-colors duration-200 hover:bg-accent hover:text-accent-foreground [&_svg:not([class*='size-'])]:size-4",
        class
    );

    view! {
        <li
            data-name="ContextMenuItem"
            role="menuitem"
            class=merged_class
            on:click=move |_| {
                ctx.open.set(None);
                on_select.run(());
            }
        >
            {children()}
        </li>
    }
}
