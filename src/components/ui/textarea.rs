use leptos::html;
use leptos::prelude::*;
use tw_merge::tw_merge;
use wasm_bindgen::JsCast;

/// A textarea that grows with its content.
///
/// A hidden mimic element in the same grid cell carries a copy of the value, so
/// the cell (and the textarea) always fits the text. Set the value through
/// `bind_value`; `node_ref` gives access to the focusable element.
#[component]
pub fn AutoGrowTextarea(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] placeholder: String,
    #[prop(optional)] spellcheck: bool,

    // NOTE: Manual wiring instead of `bind:value`, same as the other inputs.
    #[prop(into)] bind_value: RwSignal<String>,

    #[prop(optional)] node_ref: NodeRef<html::Textarea>,

    #[prop(optional, into)] on_input: Option<Callback<String>>,
    #[prop(optional, into)] on_keydown: Option<Callback<web_sys::KeyboardEvent>>,
    #[prop(optional, into)] on_blur: Option<Callback<web_sys::FocusEvent>>,
) -> impl IntoView {
    let mimic_class = tw_merge!(
        "auto-scaling-textarea-mimic text-sm leading-relaxed",
        class.clone()
    );
    let merged_class = tw_merge!(
        "auto-scaling-textarea w-full min-w-0 bg-transparent text-sm leading-relaxed outline-none placeholder:text-muted-foreground",
        class
    );

    let handle_input = move |ev: web_sys::Event| {
        let Some(textarea) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
        else {
            return;
        };
        let value = textarea.value();
        bind_value.set(value.clone());
        if let Some(cb) = on_input {
            cb.run(value);
        }
    };

    let handle_keydown = move |ev: web_sys::KeyboardEvent| {
        if let Some(cb) = on_keydown {
            cb.run(ev);
        }
    };

    let handle_blur = move |ev: web_sys::FocusEvent| {
        if let Some(cb) = on_blur {
            cb.run(ev);
        }
    };

    view! {
        <div data-name="AutoGrowTextarea" class="auto-scaling-textarea-container">
            <textarea
                rows="1"
                class=merged_class
                placeholder=placeholder
                spellcheck=spellcheck.to_string()
                prop:value=move || bind_value.get()
                on:input=handle_input
                on:keydown=handle_keydown
                on:blur=handle_blur
                node_ref=node_ref
            ></textarea>
            // Trailing space keeps a final empty line measured.
            <div class=mimic_class aria-hidden="true">
                {move || format!("{} ", bind_value.get())}
            </div>
        </div>
    }
}
