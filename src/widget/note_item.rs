use super::dom::{animate, px, rect_of, AnimateOptions, Keyframes};
use super::Shell;
use crate::components::ui::{
    AutoGrowTextarea, Button, ButtonSize, ButtonVariant, ContextMenu, ContextMenuItem, MenuAnchor,
};
use crate::markdown;
use crate::models::NoteId;
use icons::{GripVertical, Pencil, Trash2};
use leptos::html;
use leptos::prelude::*;
use leptos_dom::helpers::{request_animation_frame, set_timeout};
use std::time::Duration;

const EMPTY_PREVIEW: &str = r#"<p class="note-empty-placeholder">Empty note</p>"#;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    View,
    Edit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
enum NoteMenuAction {
    #[strum(to_string = "Edit note")]
    Edit,
    #[strum(to_string = "Delete note")]
    Delete,
}

fn preview_html(content: &str) -> String {
    let html = markdown::render(content);
    if html.is_empty() {
        EMPTY_PREVIEW.to_string()
    } else {
        html
    }
}

/// One note row: markdown preview, click to edit, handle to drag.
///
/// `floating` marks the copy shown in the drag overlay.
#[component]
pub fn NoteItem(id: NoteId, #[prop(optional)] floating: bool) -> impl IntoView {
    let shell = expect_context::<Shell>();

    let content = RwSignal::new(shell.content_of(id));
    let mode = RwSignal::new(Mode::View);
    let menu: RwSignal<Option<MenuAnchor>> = RwSignal::new(None);
    let root_ref: NodeRef<html::Div> = NodeRef::new();
    let textarea_ref: NodeRef<html::Textarea> = NodeRef::new();

    let enter_edit = move || {
        mode.set(Mode::Edit);
        // Focus on next tick so the edit area is displayed.
        set_timeout(
            move || {
                if let Some(el) = textarea_ref.get_untracked() {
                    let _ = el.focus();
                }
            },
            Duration::ZERO,
        );
    };

    Effect::new(move |_| {
        if !floating && shell.focus_request.get() == Some(id) {
            shell.focus_request.set(None);
            enter_edit();
        }
    });

    if !floating && shell.entering.get_untracked() == Some(id) {
        shell.entering.set(None);
        let item_ms = shell.timing.item_ms;
        request_animation_frame(move || {
            let Some(el) = root_ref.get_untracked() else {
                return;
            };
            let height = px(rect_of(&el).height);
            animate(
                &el,
                Keyframes::new()
                    .frame(&[("height", "0px"), ("opacity", "0")])
                    .frame(&[("height", &height), ("opacity", "1")]),
                AnimateOptions::ease(item_ms),
                || {},
            );
        });
    }

    let on_keydown = Callback::new(move |ev: web_sys::KeyboardEvent| {
        if ev.key() == "Escape" {
            ev.prevent_default();
            mode.set(Mode::View);
            shell.focus_input();
        }
    });
    let on_input = Callback::new(move |value: String| shell.edit(id, value));
    let blur_exit_ms = shell.timing.blur_exit_ms;
    let on_blur = Callback::new(move |_: web_sys::FocusEvent| {
        set_timeout(
            move || {
                // The row may be gone by now (deleted or lifted into the overlay).
                let _ = mode.try_set(Mode::View);
            },
            Duration::from_millis(u64::from(blur_exit_ms)),
        );
    });

    let on_grab = move |ev: web_sys::MouseEvent| {
        if let Some(el) = root_ref.get_untracked() {
            shell.grab(id, &ev, &el);
        }
    };

    let on_contextmenu = move |ev: web_sys::MouseEvent| {
        ev.prevent_default();
        if !floating {
            menu.set(Some(MenuAnchor::from_event(&ev)));
        }
    };

    let root_class = move || {
        let mode_class = match mode.get() {
            Mode::View => "note-item-mode-view",
            Mode::Edit => "note-item-mode-edit",
        };
        let dragged = if floating { " is-being-dragged" } else { "" };
        format!("note-item group rounded-md {mode_class}{dragged}")
    };

    view! {
        <div class=root_class node_ref=root_ref on:contextmenu=on_contextmenu>
            <div class="flex items-start gap-1">
                <Button
                    variant=ButtonVariant::Handle
                    size=ButtonSize::Handle
                    class="note-item-drag-handle"
                    attr:aria-label="Drag to reorder"
                    on:mousedown=on_grab
                >
                    <GripVertical />
                </Button>
                <div class="note-item-body min-w-0 flex-1 py-1">
                    <div class="note-item-edit">
                        <AutoGrowTextarea
                            class="note-item-content"
                            placeholder="Write your note in markdown..."
                            spellcheck=true
                            bind_value=content
                            node_ref=textarea_ref
                            on_input=on_input
                            on_keydown=on_keydown
                            on_blur=on_blur
                        />
                    </div>
                    <div
                        class="note-item-preview text-sm leading-relaxed cursor-text"
                        on:click=move |_| enter_edit()
                        inner_html=move || preview_html(&content.get())
                    ></div>
                </div>
            </div>

            <ContextMenu open=menu>
                <ContextMenuItem on_select=Callback::new(move |_: ()| enter_edit())>
                    <Pencil />
                    {NoteMenuAction::Edit.to_string()}
                </ContextMenuItem>
                <ContextMenuItem
                    class="text-destructive"
                    on_select=Callback::new(move |_: ()| {
                        if let Some(el) = root_ref.get_untracked() {
                            shell.delete(id, el.into());
                        }
                    })
                >
                    <Trash2 />
                    {NoteMenuAction::Delete.to_string()}
                </ContextMenuItem>
            </ContextMenu>
        </div>
    }
}
