//! The Leptos shell around the controller and the reorder engine.
//!
//! All widget state lives in one `Runtime` behind a local `StoredValue`. Handlers
//! borrow it, collect whatever the controller or engine report, and only touch
//! signals and the DOM after the borrow ends. Animation completions come back in
//! as fresh calls (`swap_settled`, `release_settled`, `finish_delete`).

mod dom;
mod note_item;

pub use note_item::NoteItem;

use crate::components::ui::AutoGrowTextarea;
use crate::config::{AnimationTiming, WidgetConfig};
use crate::controller::{InputAction, Key, KeyPress, NotesController};
use crate::models::{NoteId, Rect, Vec2};
use crate::reorder::{Grab, ReorderEffect, ReorderEngine};
use crate::storage::{open_default_store, KeyValueStore};
use dom::{
    animate, now_ms, px, rect_of, scroll_y, translate, translate_y, AnimateOptions,
    DomLayoutProbe, Keyframes,
};
use icons::Plus;
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos_dom::helpers::{
    request_animation_frame, set_timeout, window_event_listener, WindowListenerHandle,
};
use leptos_ui::clx;
use std::time::Duration;

const INPUT_MARGIN: &str = "1.5rem";

mod components {
    use super::*;
    clx! {NotesPlusIcon, span, "notes-plus-icon mt-1 shrink-0 text-muted-foreground [&_svg]:size-4"}
    clx! {NotesRoot, div, "notes flex flex-col"}
}

use components::*;

pub(crate) struct Runtime {
    controller: NotesController<Box<dyn KeyValueStore>>,
    engine: ReorderEngine<NoteId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Row {
    Note(NoteId),
    Decoy,
}

/// The note currently lifted into the overlay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Floating {
    id: NoteId,
    width: f64,
}

fn pointer_of(ev: &web_sys::MouseEvent) -> Vec2 {
    Vec2::new(f64::from(ev.client_x()), f64::from(ev.client_y()))
}

/// Handles shared by the widget and its note items.
#[derive(Clone, Copy)]
pub(crate) struct Shell {
    runtime: StoredValue<Runtime, LocalStorage>,
    listeners: StoredValue<Vec<WindowListenerHandle>, LocalStorage>,
    rows: RwSignal<Vec<Row>>,
    floating: RwSignal<Option<Floating>>,
    float_offset: RwSignal<Vec2>,
    decoy_height: RwSignal<f64>,
    input_value: RwSignal<String>,
    input_margin: RwSignal<bool>,
    pub(crate) entering: RwSignal<Option<NoteId>>,
    pub(crate) focus_request: RwSignal<Option<NoteId>>,
    input_ref: NodeRef<html::Textarea>,
    input_row_ref: NodeRef<html::Div>,
    items_ref: NodeRef<html::Div>,
    overlay_ref: NodeRef<html::Div>,
    floating_ref: NodeRef<html::Div>,
    decoy_ref: NodeRef<html::Div>,
    pub(crate) timing: AnimationTiming,
}

impl Shell {
    fn new(widget_id: &str, config: &WidgetConfig) -> Self {
        let controller = NotesController::load(open_default_store(), widget_id, config.saves);
        let rows: Vec<Row> = controller.order().into_iter().map(Row::Note).collect();
        let has_notes = !rows.is_empty();

        Self {
            runtime: StoredValue::new_local(Runtime {
                controller,
                engine: ReorderEngine::new(config.reorder),
            }),
            listeners: StoredValue::new_local(Vec::new()),
            rows: RwSignal::new(rows),
            floating: RwSignal::new(None),
            float_offset: RwSignal::new(Vec2::default()),
            decoy_height: RwSignal::new(0.0),
            input_value: RwSignal::new(String::new()),
            input_margin: RwSignal::new(has_notes),
            entering: RwSignal::new(None),
            focus_request: RwSignal::new(None),
            input_ref: NodeRef::new(),
            input_row_ref: NodeRef::new(),
            items_ref: NodeRef::new(),
            overlay_ref: NodeRef::new(),
            floating_ref: NodeRef::new(),
            decoy_ref: NodeRef::new(),
            timing: config.animation,
        }
    }

    fn probe(&self) -> Option<DomLayoutProbe> {
        self.items_ref
            .get_untracked()
            .map(|el| DomLayoutProbe::new(el.into()))
    }

    pub(crate) fn content_of(&self, id: NoteId) -> String {
        self.runtime
            .try_with_value(|rt| rt.controller.note(id).map(|n| n.content.clone()))
            .flatten()
            .unwrap_or_default()
    }

    pub(crate) fn focus_input(&self) {
        if let Some(el) = self.input_ref.get_untracked() {
            let _ = el.focus();
        }
    }

    fn sync_rows(&self) {
        let order = self
            .runtime
            .try_with_value(|rt| rt.controller.order())
            .unwrap_or_default();
        self.rows.set(order.into_iter().map(Row::Note).collect());
    }

    fn set_input_margin(self, open: bool) {
        if self.input_margin.get_untracked() == open {
            return;
        }
        self.input_margin.set(open);

        let Some(row) = self.input_row_ref.get_untracked() else {
            return;
        };
        let (from, to) = if open {
            ("0rem", INPUT_MARGIN)
        } else {
            (INPUT_MARGIN, "0rem")
        };
        animate(
            &row,
            Keyframes::between("marginBottom", from, to),
            AnimateOptions::ease(self.timing.item_ms),
            || {},
        );
    }

    /* ========================================================== */
    /*                       INPUT & EDITS                        */
    /* ========================================================== */

    fn input_key(self, ev: web_sys::KeyboardEvent) {
        let press = KeyPress {
            key: Key::from_name(&ev.key()),
            ctrl: ev.ctrl_key(),
            meta: ev.meta_key(),
            shift: ev.shift_key(),
        };
        let action = self
            .runtime
            .try_with_value(|rt| rt.controller.input_key(press))
            .unwrap_or(InputAction::Ignore);

        match action {
            InputAction::InsertNewline => {
                ev.prevent_default();
                self.insert_newline();
            }
            InputAction::Submit => {
                ev.prevent_default();
                self.submit();
            }
            InputAction::Blur => {
                if let Some(el) = self.input_ref.get_untracked() {
                    let _ = el.blur();
                }
            }
            InputAction::FocusNote(id) => {
                ev.prevent_default();
                self.focus_request.set(Some(id));
            }
            InputAction::Ignore => {}
        }
    }

    fn insert_newline(self) {
        let Some(el) = self.input_ref.get_untracked() else {
            return;
        };
        let end_of_text = el.value().encode_utf16().count() as u32;
        let start = el.selection_start().ok().flatten().unwrap_or(end_of_text);
        let end = el.selection_end().ok().flatten().unwrap_or(start);

        if el
            .set_range_text_with_start_and_end_and_mode("\n", start, end, "end")
            .is_ok()
        {
            self.input_value.set(el.value());
        }
    }

    fn submit(self) {
        let raw = self.input_value.get_untracked();
        let added = self
            .runtime
            .try_update_value(|rt| {
                if rt.engine.is_active() {
                    return None;
                }
                rt.controller.submit(&raw)
            })
            .flatten();
        let Some(added) = added else {
            return;
        };

        self.input_value.set(String::new());
        self.entering.set(Some(added.id));
        self.rows.update(|rows| rows.push(Row::Note(added.id)));
        if added.was_empty {
            self.set_input_margin(true);
        }
    }

    pub(crate) fn edit(self, id: NoteId, content: String) {
        let timer = self
            .runtime
            .try_update_value(|rt| rt.controller.edit(id, &content, now_ms()))
            .flatten();
        if let Some(timer) = timer {
            self.arm_trailing(timer.generation, timer.delay_ms);
        }
    }

    fn arm_trailing(self, generation: u64, delay_ms: u32) {
        set_timeout(
            move || {
                let _ = self
                    .runtime
                    .try_update_value(|rt| rt.controller.trailing_elapsed(generation, now_ms()));
            },
            Duration::from_millis(u64::from(delay_ms)),
        );
    }

    /* ========================================================== */
    /*                           DELETE                           */
    /* ========================================================== */

    pub(crate) fn delete(self, id: NoteId, el: web_sys::Element) {
        let removal = self
            .runtime
            .try_update_value(|rt| {
                if rt.engine.is_active() {
                    return None;
                }
                rt.controller.begin_delete(id)
            })
            .flatten();
        let Some(removal) = removal else {
            return;
        };

        let _ = el.set_attribute("data-removing", "true");
        let height = px(rect_of(&el).height);
        animate(
            &el,
            Keyframes::new()
                .frame(&[("height", &height), ("opacity", "1")])
                .frame(&[("height", "0px"), ("opacity", "0")]),
            AnimateOptions::ease(self.timing.item_ms).held(),
            move || self.finish_delete(id),
        );

        if removal.collapse_input_margin {
            self.set_input_margin(false);
        }
    }

    fn finish_delete(self, id: NoteId) {
        let _ = self
            .runtime
            .try_update_value(|rt| rt.controller.finish_delete(id));
        self.rows.update(|rows| rows.retain(|row| *row != Row::Note(id)));
    }

    /* ========================================================== */
    /*                         DRAG & DROP                        */
    /* ========================================================== */

    pub(crate) fn grab(self, id: NoteId, ev: &web_sys::MouseEvent, item: &web_sys::Element) {
        if ev.button() != 0 {
            return;
        }
        let Some(overlay) = self.overlay_ref.get_untracked() else {
            return;
        };
        ev.prevent_default();

        let item_rect = rect_of(item);
        let overlay_at = rect_of(&overlay);
        let pointer = pointer_of(ev);
        let scroll = scroll_y();

        let effects = self
            .runtime
            .try_update_value(|rt| {
                // Rows still leaving would shift indices under the session.
                if rt.controller.pending_removals() > 0 {
                    return Vec::new();
                }
                let effects = rt.engine.grab(Grab {
                    key: id,
                    order: rt.controller.order(),
                    pointer,
                    item_rect,
                    overlay_rect: Rect::new(
                        overlay_at.x,
                        overlay_at.y,
                        item_rect.width,
                        item_rect.height,
                    ),
                    scroll_y: scroll,
                });
                if !effects.is_empty() {
                    rt.controller.begin_drag();
                }
                effects
            })
            .unwrap_or_default();

        if effects.is_empty() {
            return;
        }
        self.listen();
        self.apply(effects);
    }

    fn listen(self) {
        let handles = vec![
            window_event_listener(ev::mousemove, move |ev: web_sys::MouseEvent| {
                self.pointer_moved(&ev)
            }),
            window_event_listener(ev::scroll, move |_| self.scrolled()),
            window_event_listener(ev::mouseup, move |ev: web_sys::MouseEvent| self.release(&ev)),
            window_event_listener(ev::mousedown, move |ev: web_sys::MouseEvent| {
                ev.prevent_default()
            }),
            window_event_listener(ev::contextmenu, move |ev: web_sys::MouseEvent| {
                ev.prevent_default()
            }),
        ];
        self.listeners.set_value(handles);
    }

    fn unlisten(self) {
        let handles = self
            .listeners
            .try_update_value(std::mem::take)
            .unwrap_or_default();
        for handle in handles {
            handle.remove();
        }
    }

    fn pointer_moved(self, ev: &web_sys::MouseEvent) {
        let Some(probe) = self.probe() else {
            return;
        };
        let pointer = pointer_of(ev);
        let effects = self
            .runtime
            .try_update_value(|rt| rt.engine.pointer_moved(pointer, &probe))
            .unwrap_or_default();
        self.apply(effects);
    }

    fn scrolled(self) {
        let Some(probe) = self.probe() else {
            return;
        };
        let effects = self
            .runtime
            .try_update_value(|rt| rt.engine.scrolled(&probe))
            .unwrap_or_default();
        self.apply(effects);
    }

    fn swap_settled(self, key: NoteId) {
        let Some(probe) = self.probe() else {
            return;
        };
        let effects = self
            .runtime
            .try_update_value(|rt| rt.engine.swap_settled(key, &probe))
            .unwrap_or_default();
        self.apply(effects);
    }

    fn release(self, ev: &web_sys::MouseEvent) {
        let buttons = ev.buttons();
        let effects = self
            .runtime
            .try_update_value(|rt| rt.engine.release(buttons))
            .unwrap_or_default();
        self.apply(effects);
    }

    fn release_settled(self) {
        let settled = self
            .runtime
            .try_update_value(|rt| {
                if !rt.engine.is_active() || rt.engine.is_dragging() {
                    return false;
                }
                let commit = rt.engine.release_settled();
                rt.controller.finish_drag(commit);
                true
            })
            .unwrap_or(false);

        if settled {
            self.floating.set(None);
            self.sync_rows();
        }
    }

    fn apply(self, effects: Vec<ReorderEffect<NoteId>>) {
        for effect in effects {
            match effect {
                ReorderEffect::Lift {
                    key,
                    index,
                    width,
                    height,
                    translate,
                } => self.lift(key, index, width, height, translate),
                ReorderEffect::Translate(offset) => self.float_offset.set(offset),
                ReorderEffect::Swap { sibling, from, to } => self.slide(sibling, from, to),
                ReorderEffect::Settle { index, .. } => self.settle(index),
            }
        }
    }

    fn lift(self, key: NoteId, index: usize, width: f64, height: f64, offset: Vec2) {
        self.rows.update(|rows| {
            if let Some(row) = rows.get_mut(index) {
                *row = Row::Decoy;
            }
        });
        self.decoy_height.set(height);
        self.float_offset.set(offset);
        self.floating.set(Some(Floating { id: key, width }));

        let decoy_ref = self.decoy_ref;
        let lift_ms = self.timing.lift_ms;
        request_animation_frame(move || {
            if let Some(decoy) = decoy_ref.get_untracked() {
                animate(
                    &decoy,
                    Keyframes::between("opacity", "0", "1"),
                    AnimateOptions::ease(lift_ms),
                    || {},
                );
            }
        });
    }

    /// FLIP the swapped sibling and the decoy into their new slots.
    fn slide(self, sibling: NoteId, from: usize, to: usize) {
        let elements = self
            .probe()
            .and_then(|probe| Some((probe.row(to)?, probe.row(from)?)));

        self.rows.update(|rows| {
            if from < rows.len() && to < rows.len() {
                rows.swap(from, to);
            }
        });

        let Some((sibling_el, decoy_el)) = elements else {
            set_timeout(move || self.swap_settled(sibling), Duration::ZERO);
            return;
        };
        let sibling_before = rect_of(&sibling_el).y;
        let decoy_before = rect_of(&decoy_el).y;
        let swap_ms = self.timing.swap_ms;

        request_animation_frame(move || {
            let dy = sibling_before - rect_of(&sibling_el).y;
            animate(
                &sibling_el,
                Keyframes::between("transform", &translate_y(dy), "translateY(0px)"),
                AnimateOptions::ease(swap_ms),
                move || self.swap_settled(sibling),
            );

            let dy = decoy_before - rect_of(&decoy_el).y;
            animate(
                &decoy_el,
                Keyframes::between("transform", &translate_y(dy), "translateY(0px)"),
                AnimateOptions::ease(swap_ms),
                || {},
            );
        });
    }

    /// Drop the floating note into the decoy's slot.
    fn settle(self, index: usize) {
        self.unlisten();

        let target = self.probe().and_then(|p| p.row(index)).map(|el| rect_of(&el));
        let overlay = self.overlay_ref.get_untracked().map(|el| rect_of(&el));
        let floating = self.floating_ref.get_untracked();

        let (Some(target), Some(overlay), Some(floating)) = (target, overlay, floating) else {
            set_timeout(move || self.release_settled(), Duration::ZERO);
            return;
        };

        let from = self.float_offset.get_untracked();
        let to = target.origin() - overlay.origin();
        self.float_offset.set(to);
        animate(
            &floating,
            Keyframes::between("transform", &translate(from), &translate(to)),
            AnimateOptions::ease(self.timing.swap_ms),
            move || self.release_settled(),
        );
    }
}

/* ========================================================== */
/*                     ✨ FUNCTIONS ✨                        */
/* ========================================================== */

#[component]
pub fn NotesWidget(#[prop(into)] widget_id: String, config: WidgetConfig) -> impl IntoView {
    let shell = Shell::new(&widget_id, &config);
    provide_context(shell);

    let Shell {
        rows,
        floating,
        float_offset,
        decoy_height,
        input_value,
        input_margin,
        input_ref,
        input_row_ref,
        items_ref,
        overlay_ref,
        floating_ref,
        decoy_ref,
        ..
    } = shell;

    let floating_style = move || {
        let width = floating.get().map(|f| f.width).unwrap_or_default();
        format!(
            "width: {}; transform: {};",
            px(width),
            translate(float_offset.get())
        )
    };

    view! {
        <NotesRoot attr:data-notes-widget=widget_id.clone()>
            <div
                class="notes-input flex items-start gap-2 pr-10"
                style:margin-bottom=move || if input_margin.get() { INPUT_MARGIN } else { "0rem" }
                node_ref=input_row_ref
            >
                <NotesPlusIcon>
                    <Plus />
                </NotesPlusIcon>
                <AutoGrowTextarea
                    class="notes-input-area"
                    placeholder="Add a note"
                    bind_value=input_value
                    node_ref=input_ref
                    on_keydown=Callback::new(move |ev: web_sys::KeyboardEvent| shell.input_key(ev))
                />
            </div>

            <div class="drag-and-drop-container" node_ref=overlay_ref>
                <Show when=move || floating.get().is_some()>
                    <div
                        class="drag-and-drop-draggable"
                        style=floating_style
                        node_ref=floating_ref
                    >
                        {move || {
                            floating
                                .get()
                                .map(|f| view! { <NoteItem id=f.id floating=true /> })
                        }}
                    </div>
                </Show>
            </div>

            <div class="notes-items" node_ref=items_ref>
                <For
                    each=move || rows.get()
                    key=|row| *row
                    children=move |row| match row {
                        Row::Note(id) => view! { <NoteItem id=id /> }.into_any(),
                        Row::Decoy => {
                            view! {
                                <div
                                    class="drag-and-drop-decoy"
                                    style:height=move || px(decoy_height.get())
                                    node_ref=decoy_ref
                                ></div>
                            }
                                .into_any()
                        }
                    }
                />
            </div>
        </NotesRoot>
    }
}
