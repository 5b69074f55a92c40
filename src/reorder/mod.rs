//! Drag-to-reorder for a single vertical list.
//!
//! `ReorderEngine` is the drag-session state machine. It never touches the DOM:
//! callers feed it pointer, scroll and animation-completion events together with a
//! `LayoutProbe` for live geometry, and apply the `ReorderEffect`s it returns.
//!
//! Phases: `Idle -> Dragging -> Releasing -> Idle`. Only one session exists at a
//! time; a grab is rejected in any phase other than `Idle`.

mod hit_test;

use crate::config::ReorderTuning;
use crate::models::{Rect, Vec2};
use hit_test::{hit_test, step_toward};
use std::fmt::Debug;

/// Live geometry of the list being reordered.
pub trait LayoutProbe {
    /// Screen rects of every slot in current list order, decoy included.
    fn slot_rects(&self) -> Vec<Rect>;
    fn scroll_y(&self) -> f64;
    /// Viewport width without the vertical scrollbar.
    fn viewport_width(&self) -> f64;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Motion {
    Idle,
    Animating,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Slot<K> {
    Item { key: K, motion: Motion },
    Decoy,
}

/// Everything captured at grab time.
#[derive(Clone, Debug)]
pub struct Grab<K> {
    pub key: K,
    /// Keys in current list order.
    pub order: Vec<K>,
    pub pointer: Vec2,
    /// The grabbed item's rect.
    pub item_rect: Rect,
    /// The overlay layer's rect, sized to the grabbed item.
    pub overlay_rect: Rect,
    pub scroll_y: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReorderEffect<K> {
    /// Put a `width` x `height` decoy at `index`, float `key` in the overlay
    /// translated by `translate`.
    Lift {
        key: K,
        index: usize,
        width: f64,
        height: f64,
        translate: Vec2,
    },
    /// Move the overlay.
    Translate(Vec2),
    /// Decoy moved `from` -> `to`; `sibling` took `from`. Both slide into place,
    /// and the sibling's completion must be reported via `swap_settled`.
    Swap { sibling: K, from: usize, to: usize },
    /// Drop the floating item into the decoy slot at `index`, then report
    /// `release_settled`.
    Settle { key: K, index: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Commit<K> {
    pub key: K,
    pub initial_index: usize,
    pub final_index: usize,
}

#[derive(Clone, Debug)]
struct DragSession<K> {
    dragged: K,
    initial_index: usize,
    /// Pointer position relative to the grabbed item's top-left corner.
    pointer_offset: Vec2,
    last_pointer: Vec2,
    initial_scroll_y: f64,
    overlay: Rect,
    slots: Vec<Slot<K>>,
    decoy_index: usize,
}

impl<K: Copy + Eq + Debug> DragSession<K> {
    fn translation(&self, probe: &impl LayoutProbe) -> Vec2 {
        let pointer = self.last_pointer;
        let overlay = self.overlay;
        let offset = self.pointer_offset;
        let scroll_delta = probe.scroll_y() - self.initial_scroll_y;

        let y = pointer.y - overlay.y - offset.y + scroll_delta;
        let x = pointer.x - overlay.x - offset.x;

        // Keep the floating item inside the viewport horizontally.
        let min_x = -overlay.x;
        let max_x = probe.viewport_width() - overlay.x - overlay.width;
        Vec2::new(x.min(max_x).max(min_x), y)
    }

    fn try_swap(&mut self, probe: &impl LayoutProbe, tuning: &ReorderTuning) -> Option<ReorderEffect<K>> {
        let rects = probe.slot_rects();
        if rects.len() != self.slots.len() {
            log::debug!(
                "event=reorder_hit_test module=reorder status=skipped rects={} slots={}",
                rects.len(),
                self.slots.len()
            );
            return None;
        }

        let top = self.last_pointer.y - self.pointer_offset.y;
        let bottom = top + self.overlay.height;

        let target = hit_test(&rects, self.decoy_index, top, bottom, tuning)?;
        let target = step_toward(self.decoy_index, target);
        if target == self.decoy_index {
            return None;
        }

        let sibling = match self.slots.get_mut(target)? {
            Slot::Item { key, motion } => {
                if *motion == Motion::Animating {
                    // Resumed by `swap_settled`.
                    return None;
                }
                *motion = Motion::Animating;
                *key
            }
            Slot::Decoy => return None,
        };

        let from = self.decoy_index;
        self.slots.swap(from, target);
        self.decoy_index = target;

        Some(ReorderEffect::Swap {
            sibling,
            from,
            to: target,
        })
    }

    fn order(&self) -> Vec<K> {
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Item { key, .. } => *key,
                Slot::Decoy => self.dragged,
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
enum Phase<K> {
    Idle,
    Dragging(DragSession<K>),
    Releasing(DragSession<K>),
}

#[derive(Clone, Debug)]
pub struct ReorderEngine<K> {
    tuning: ReorderTuning,
    phase: Phase<K>,
}

impl<K: Copy + Eq + Debug> ReorderEngine<K> {
    pub fn new(tuning: ReorderTuning) -> Self {
        Self {
            tuning,
            phase: Phase::Idle,
        }
    }

    /// A session exists (dragging or settling).
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging(_))
    }

    fn session(&self) -> Option<&DragSession<K>> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Dragging(s) | Phase::Releasing(s) => Some(s),
        }
    }

    pub fn dragged(&self) -> Option<K> {
        self.session().map(|s| s.dragged)
    }

    pub fn decoy_index(&self) -> Option<usize> {
        self.session().map(|s| s.decoy_index)
    }

    pub fn slots(&self) -> Option<&[Slot<K>]> {
        self.session().map(|s| s.slots.as_slice())
    }

    /// Current order with the dragged key in the decoy's slot.
    pub fn order(&self) -> Option<Vec<K>> {
        self.session().map(DragSession::order)
    }

    pub fn grab(&mut self, grab: Grab<K>) -> Vec<ReorderEffect<K>> {
        if self.is_active() {
            log::debug!("event=reorder_grab module=reorder status=rejected reason=active_session");
            return Vec::new();
        }
        let Some(initial_index) = grab.order.iter().position(|k| *k == grab.key) else {
            log::debug!("event=reorder_grab module=reorder status=rejected reason=unknown_key");
            return Vec::new();
        };

        let slots = grab
            .order
            .iter()
            .map(|key| {
                if *key == grab.key {
                    Slot::Decoy
                } else {
                    Slot::Item {
                        key: *key,
                        motion: Motion::Idle,
                    }
                }
            })
            .collect();

        let session = DragSession {
            dragged: grab.key,
            initial_index,
            pointer_offset: grab.pointer - grab.item_rect.origin(),
            last_pointer: grab.pointer,
            initial_scroll_y: grab.scroll_y,
            overlay: grab.overlay_rect,
            slots,
            decoy_index: initial_index,
        };
        self.phase = Phase::Dragging(session);

        log::debug!("event=reorder_grab module=reorder status=ok index={initial_index}");

        vec![ReorderEffect::Lift {
            key: grab.key,
            index: initial_index,
            width: grab.item_rect.width,
            height: grab.item_rect.height,
            translate: grab.item_rect.origin() - grab.overlay_rect.origin(),
        }]
    }

    pub fn pointer_moved(&mut self, pointer: Vec2, probe: &impl LayoutProbe) -> Vec<ReorderEffect<K>> {
        if let Phase::Dragging(session) = &mut self.phase {
            session.last_pointer = pointer;
        }
        self.reposition(probe)
    }

    pub fn scrolled(&mut self, probe: &impl LayoutProbe) -> Vec<ReorderEffect<K>> {
        self.reposition(probe)
    }

    /// A swap animation on `key` finished. Re-runs the hit test with the last
    /// pointer so a still pointer keeps cascading past several items.
    pub fn swap_settled(&mut self, key: K, probe: &impl LayoutProbe) -> Vec<ReorderEffect<K>> {
        let slots = match &mut self.phase {
            Phase::Idle => return Vec::new(),
            Phase::Dragging(s) | Phase::Releasing(s) => &mut s.slots,
        };
        for slot in slots.iter_mut() {
            if let Slot::Item { key: k, motion } = slot {
                if *k == key {
                    *motion = Motion::Idle;
                }
            }
        }
        self.reposition(probe)
    }

    fn reposition(&mut self, probe: &impl LayoutProbe) -> Vec<ReorderEffect<K>> {
        let Phase::Dragging(session) = &mut self.phase else {
            return Vec::new();
        };

        let mut effects = vec![ReorderEffect::Translate(session.translation(probe))];
        if let Some(swap) = session.try_swap(probe, &self.tuning) {
            effects.push(swap);
        }
        effects
    }

    /// Pointer released. Ignored while other buttons are still held.
    pub fn release(&mut self, buttons: u16) -> Vec<ReorderEffect<K>> {
        if buttons != 0 {
            return Vec::new();
        }

        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Dragging(session) => {
                let effect = ReorderEffect::Settle {
                    key: session.dragged,
                    index: session.decoy_index,
                };
                self.phase = Phase::Releasing(session);
                vec![effect]
            }
            other => {
                log::debug!("event=reorder_release module=reorder status=ignored");
                self.phase = other;
                Vec::new()
            }
        }
    }

    /// The drop animation finished; ends the session.
    ///
    /// Returns the commit only when the item changed position.
    pub fn release_settled(&mut self) -> Option<Commit<K>> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Releasing(session) => {
                log::debug!(
                    "event=reorder_release module=reorder status=ok from={} to={}",
                    session.initial_index,
                    session.decoy_index
                );
                (session.initial_index != session.decoy_index).then_some(Commit {
                    key: session.dragged,
                    initial_index: session.initial_index,
                    final_index: session.decoy_index,
                })
            }
            other => {
                self.phase = other;
                None
            }
        }
    }
}
