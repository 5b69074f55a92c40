//! The note list and everything that mutates it.
//!
//! `NotesController` owns the ordered entries, decides when they are written to
//! storage, and answers the input box's key handling. It holds no DOM state; the
//! widget shell calls into it and animates whatever it reports back.

use crate::config::SaveTiming;
use crate::models::{Note, NoteId};
use crate::persist::{SaveThrottle, TrailingOutcome, TrailingTimer};
use crate::reorder::Commit;
use crate::storage::{KeyValueStore, NoteStore};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteEntry {
    pub id: NoteId,
    pub note: Note,
    /// Exit animation running; still rendered, no longer persisted.
    pub removing: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Prepend,
    Append,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Added {
    pub id: NoteId,
    /// No live notes existed before this one; the input margin should grow.
    pub was_empty: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Removal {
    /// The last live note is going away; the input margin should shrink.
    pub collapse_input_margin: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    ArrowDown,
    Other,
}

impl Key {
    /// Map a `KeyboardEvent.key` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Enter" => Key::Enter,
            "Escape" => Key::Escape,
            "ArrowDown" => Key::ArrowDown,
            _ => Key::Other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    InsertNewline,
    Submit,
    Blur,
    FocusNote(NoteId),
    /// Let the browser handle the key.
    Ignore,
}

pub struct NotesController<S> {
    store: NoteStore<S>,
    entries: Vec<NoteEntry>,
    next_id: u64,
    last_added: Option<NoteId>,
    pending_removals: usize,
    throttle: SaveThrottle,
    dragging: bool,
    save_suppressed: bool,
}

impl<S: KeyValueStore> NotesController<S> {
    pub fn load(store: S, widget_id: &str, timing: SaveTiming) -> Self {
        let store = NoteStore::new(store, widget_id);
        let notes = store.load();
        log::info!(
            "event=notes_load module=controller status=ok key={} count={}",
            store.key(),
            notes.len()
        );

        let mut controller = Self {
            store,
            entries: Vec::with_capacity(notes.len()),
            next_id: 0,
            last_added: None,
            pending_removals: 0,
            throttle: SaveThrottle::new(timing),
            dragging: false,
            save_suppressed: false,
        };
        for note in notes {
            let id = controller.allocate_id();
            controller.entries.push(NoteEntry {
                id,
                note,
                removing: false,
            });
        }
        controller
    }

    fn allocate_id(&mut self) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id += 1;
        id
    }

    /// All rendered entries, removing ones included, in display order.
    pub fn entries(&self) -> &[NoteEntry] {
        &self.entries
    }

    pub fn order(&self) -> Vec<NoteId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.entry(id).map(|e| &e.note)
    }

    pub fn index_of(&self, id: NoteId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn entry(&self, id: NoteId) -> Option<&NoteEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn entry_mut(&mut self, id: NoteId) -> Option<&mut NoteEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.removing).count()
    }

    pub fn pending_removals(&self) -> usize {
        self.pending_removals
    }

    pub fn last_added(&self) -> Option<NoteId> {
        self.last_added
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn add(&mut self, content: impl Into<String>, placement: Placement) -> Added {
        let was_empty = self.live_count() == 0;
        let id = self.allocate_id();
        let entry = NoteEntry {
            id,
            note: Note::new(content),
            removing: false,
        };
        match placement {
            Placement::Prepend => self.entries.insert(0, entry),
            Placement::Append => self.entries.push(entry),
        }
        self.last_added = Some(id);
        self.save();
        Added { id, was_empty }
    }

    /// Add the input box's value as a new last note. Blank input is ignored.
    pub fn submit(&mut self, raw: &str) -> Option<Added> {
        let content = raw.trim();
        if content.is_empty() {
            return None;
        }
        Some(self.add(content, Placement::Append))
    }

    /// Start removing a note. The entry stays until `finish_delete`.
    pub fn begin_delete(&mut self, id: NoteId) -> Option<Removal> {
        let entry = self.entry_mut(id)?;
        if entry.removing {
            return None;
        }
        entry.removing = true;
        self.pending_removals += 1;
        if self.last_added == Some(id) {
            self.last_added = None;
        }

        Some(Removal {
            collapse_input_margin: self.live_count() == 0,
        })
    }

    /// Exit animation done: drop the entry and persist.
    pub fn finish_delete(&mut self, id: NoteId) {
        let Some(index) = self.entries.iter().position(|e| e.id == id && e.removing) else {
            log::debug!("event=notes_delete module=controller status=ignored id={id}");
            return;
        };
        self.entries.remove(index);
        self.pending_removals = self.pending_removals.saturating_sub(1);
        self.save();
    }

    /// Store new content for a note and schedule a save.
    ///
    /// Returns the trailing timer the caller must arm and report back through
    /// `trailing_elapsed`.
    pub fn edit(&mut self, id: NoteId, content: &str, now_ms: f64) -> Option<TrailingTimer> {
        let entry = self.entry_mut(id)?;
        if entry.removing {
            return None;
        }
        entry.note.content = content.trim().to_string();

        let step = self.throttle.on_edit(now_ms);
        if step.save_now {
            self.save();
        }
        Some(step.trailing)
    }

    /// Returns whether the trailing save ran.
    pub fn trailing_elapsed(&mut self, generation: u64, now_ms: f64) -> bool {
        match self.throttle.on_trailing(generation, now_ms) {
            TrailingOutcome::Skip => false,
            TrailingOutcome::Save => {
                self.save();
                true
            }
        }
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    /// The drag session ended. Applies a committed move and writes the settled
    /// list, or flushes a save held back during the drag.
    pub fn finish_drag(&mut self, commit: Option<Commit<NoteId>>) {
        self.dragging = false;
        let suppressed = std::mem::take(&mut self.save_suppressed);

        match commit {
            Some(commit) => {
                self.apply_move(commit);
                self.save();
            }
            None if suppressed => self.save(),
            None => {}
        }
    }

    fn apply_move(&mut self, commit: Commit<NoteId>) {
        let Some(from) = self.index_of(commit.key) else {
            log::warn!(
                "event=notes_reorder module=controller status=ignored reason=unknown_id id={}",
                commit.key
            );
            return;
        };
        if from != commit.initial_index {
            log::debug!(
                "event=notes_reorder module=controller status=drift expected={} actual={from}",
                commit.initial_index
            );
        }
        let entry = self.entries.remove(from);
        let to = commit.final_index.min(self.entries.len());
        self.entries.insert(to, entry);
        log::debug!("event=notes_reorder module=controller status=ok from={from} to={to}");
    }

    pub fn input_key(&self, press: KeyPress) -> InputAction {
        match press.key {
            Key::Enter if press.ctrl || press.meta || press.shift => InputAction::InsertNewline,
            Key::Enter => InputAction::Submit,
            Key::Escape => InputAction::Blur,
            Key::ArrowDown => match self.last_added {
                Some(id) if self.entry(id).is_some_and(|e| !e.removing) => InputAction::FocusNote(id),
                _ => InputAction::Ignore,
            },
            Key::Other => InputAction::Ignore,
        }
    }

    fn save(&mut self) {
        if self.dragging {
            self.save_suppressed = true;
            return;
        }

        let notes: Vec<Note> = self
            .entries
            .iter()
            .filter(|e| !e.removing)
            .map(|e| e.note.clone())
            .collect();

        match self.store.save(&notes) {
            Ok(()) => log::debug!(
                "event=notes_save module=controller status=ok count={}",
                notes.len()
            ),
            Err(e) => log::warn!(
                "event=notes_save module=controller status=error key={} error={e}",
                self.store.key()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReorderTuning;
    use crate::models::Vec2;
    use crate::reorder::test_support::{drain, grab_at, swaps, StackedRows};
    use crate::reorder::{ReorderEffect, ReorderEngine};
    use crate::storage::{notes_key, MemoryStorage, StorageResult};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Memory store that keeps every write.
    #[derive(Clone, Default)]
    struct RecordingStore {
        inner: Rc<MemoryStorage>,
        writes: Rc<RefCell<Vec<String>>>,
    }

    impl RecordingStore {
        fn writes(&self) -> Vec<String> {
            self.writes.borrow().clone()
        }

        fn last(&self) -> Option<String> {
            self.writes.borrow().last().cloned()
        }
    }

    impl KeyValueStore for RecordingStore {
        fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
            self.writes.borrow_mut().push(value.to_string());
            self.inner.set_item(key, value)
        }
    }

    fn controller_with(notes: &[&str]) -> (NotesController<RecordingStore>, RecordingStore) {
        let store = RecordingStore::default();
        let list: Vec<Note> = notes.iter().map(|c| Note::new(*c)).collect();
        let json = serde_json::to_string(&list).unwrap();
        store.inner.set_item(&notes_key("w1"), &json).unwrap();

        let controller = NotesController::load(store.clone(), "w1", SaveTiming::default());
        (controller, store)
    }

    fn contents(c: &NotesController<RecordingStore>) -> Vec<String> {
        c.entries().iter().map(|e| e.note.content.clone()).collect()
    }

    #[test]
    fn test_load_assigns_distinct_ids_in_order() {
        let (c, store) = controller_with(&["a", "b"]);
        assert_eq!(contents(&c), vec!["a", "b"]);
        assert_ne!(c.order()[0], c.order()[1]);
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_add_to_empty_list_saves_and_grows_margin() {
        let (mut c, store) = controller_with(&[]);
        let added = c.add("Hello", Placement::Append);
        assert!(added.was_empty);
        assert_eq!(store.last().as_deref(), Some(r#"[{"content":"Hello"}]"#));

        let second = c.add("Top", Placement::Prepend);
        assert!(!second.was_empty);
        assert_eq!(contents(&c), vec!["Top", "Hello"]);
        assert_eq!(c.last_added(), Some(second.id));
    }

    #[test]
    fn test_submit_trims_and_ignores_blank() {
        let (mut c, store) = controller_with(&["a"]);
        assert_eq!(c.submit("   \n "), None);
        assert!(store.writes().is_empty());

        let added = c.submit("  b \n").unwrap();
        assert_eq!(c.note(added.id).map(|n| n.content.as_str()), Some("b"));
        assert_eq!(c.index_of(added.id), Some(1));
    }

    #[test]
    fn test_delete_only_note_saves_after_exit_animation() {
        let (mut c, store) = controller_with(&["only"]);
        let id = c.order()[0];

        let removal = c.begin_delete(id).unwrap();
        assert!(removal.collapse_input_margin);
        assert_eq!(c.pending_removals(), 1);
        // Still rendered, nothing written yet.
        assert_eq!(c.entries().len(), 1);
        assert!(store.writes().is_empty());

        c.finish_delete(id);
        assert_eq!(c.entries().len(), 0);
        assert_eq!(c.pending_removals(), 0);
        assert_eq!(store.last().as_deref(), Some("[]"));
    }

    #[test]
    fn test_double_delete_is_ignored() {
        let (mut c, store) = controller_with(&["a", "b"]);
        let id = c.order()[0];
        assert_eq!(
            c.begin_delete(id),
            Some(Removal {
                collapse_input_margin: false
            })
        );
        assert_eq!(c.begin_delete(id), None);
        assert_eq!(c.pending_removals(), 1);

        c.finish_delete(id);
        c.finish_delete(id);
        assert_eq!(store.writes().len(), 1);
        assert_eq!(contents(&c), vec!["b"]);
    }

    #[test]
    fn test_removing_notes_are_not_persisted() {
        let (mut c, store) = controller_with(&["a"]);
        let first = c.order()[0];
        c.begin_delete(first);
        c.add("b", Placement::Append);
        assert_eq!(store.last().as_deref(), Some(r#"[{"content":"b"}]"#));
    }

    #[test]
    fn test_edit_saves_first_change_then_trailing() {
        let (mut c, store) = controller_with(&["a"]);
        let id = c.order()[0];

        let timer = c.edit(id, " ab ", 0.0).unwrap();
        assert_eq!(store.last().as_deref(), Some(r#"[{"content":"ab"}]"#));
        assert!(!c.trailing_elapsed(timer.generation, 10.0));

        let timer = c.edit(id, "abc", 100.0).unwrap();
        assert_eq!(store.writes().len(), 1);
        assert!(c.trailing_elapsed(timer.generation, 110.0));
        assert_eq!(store.writes().len(), 2);
        assert_eq!(store.last().as_deref(), Some(r#"[{"content":"abc"}]"#));
    }

    #[test]
    fn test_fifty_rapid_edits_write_final_content() {
        let (mut c, store) = controller_with(&[""]);
        let id = c.order()[0];

        let mut text = String::new();
        let mut timer = None;
        for i in 0..50u32 {
            text.push('x');
            timer = c.edit(id, &text, f64::from(i) * 4.0);
        }
        let timer = timer.unwrap();
        assert!(c.trailing_elapsed(timer.generation, 196.0 + f64::from(timer.delay_ms)));

        let writes = store.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1], format!(r#"[{{"content":"{}"}}]"#, "x".repeat(50)));
    }

    #[test]
    fn test_edit_of_unknown_or_removing_note_is_ignored() {
        let (mut c, _store) = controller_with(&["a"]);
        let id = c.order()[0];
        assert_eq!(c.edit(NoteId(99), "x", 0.0), None);
        c.begin_delete(id);
        assert_eq!(c.edit(id, "x", 0.0), None);
        assert_eq!(c.note(id).map(|n| n.content.as_str()), Some("a"));
    }

    #[test]
    fn test_saves_during_drag_are_held_until_drag_ends() {
        let (mut c, store) = controller_with(&["a", "b"]);
        let id = c.order()[0];

        c.begin_drag();
        c.edit(id, "changed", 0.0);
        assert!(store.writes().is_empty());

        c.finish_drag(None);
        assert_eq!(
            store.last().as_deref(),
            Some(r#"[{"content":"changed"},{"content":"b"}]"#)
        );
    }

    #[test]
    fn test_drag_without_commit_or_pending_save_writes_nothing() {
        let (mut c, store) = controller_with(&["a", "b"]);
        c.begin_drag();
        c.finish_drag(None);
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_drag_first_note_to_end_persists_new_order() {
        let (mut c, store) = controller_with(&["A", "B", "C"]);
        let order = c.order();
        let probe = StackedRows::new(order.len());
        let mut engine = ReorderEngine::new(ReorderTuning::default());

        let lift = engine.grab(grab_at(&order, 0, Vec2::new(10.0, 25.0)));
        assert!(matches!(lift[0], ReorderEffect::Lift { index: 0, .. }));
        c.begin_drag();

        let mut log = swaps(&engine.pointer_moved(Vec2::new(10.0, 200.0), &probe));
        let pending = log.iter().map(|(k, _, _)| *k).collect();
        drain(&mut engine, &probe, pending, &mut log);
        assert_eq!(log.len(), 2);

        engine.release(0);
        let commit = engine.release_settled();
        assert_eq!(
            commit,
            Some(Commit {
                key: order[0],
                initial_index: 0,
                final_index: 2,
            })
        );
        c.finish_drag(commit);

        assert_eq!(contents(&c), vec!["B", "C", "A"]);
        assert_eq!(store.writes().len(), 1);
        assert_eq!(
            store.last().as_deref(),
            Some(r#"[{"content":"B"},{"content":"C"},{"content":"A"}]"#)
        );
    }

    #[test]
    fn test_input_keys() {
        let (mut c, _store) = controller_with(&[]);
        let enter = KeyPress::plain(Key::Enter);
        assert_eq!(c.input_key(enter), InputAction::Submit);
        assert_eq!(
            c.input_key(KeyPress { shift: true, ..enter }),
            InputAction::InsertNewline
        );
        assert_eq!(
            c.input_key(KeyPress { meta: true, ..enter }),
            InputAction::InsertNewline
        );
        assert_eq!(
            c.input_key(KeyPress { ctrl: true, ..enter }),
            InputAction::InsertNewline
        );
        assert_eq!(c.input_key(KeyPress::plain(Key::Escape)), InputAction::Blur);
        assert_eq!(c.input_key(KeyPress::plain(Key::Other)), InputAction::Ignore);
        assert_eq!(c.input_key(KeyPress::plain(Key::ArrowDown)), InputAction::Ignore);

        let added = c.submit("n").unwrap();
        assert_eq!(
            c.input_key(KeyPress::plain(Key::ArrowDown)),
            InputAction::FocusNote(added.id)
        );

        c.begin_delete(added.id);
        assert_eq!(c.input_key(KeyPress::plain(Key::ArrowDown)), InputAction::Ignore);
    }

    #[test]
    fn test_key_names() {
        assert_eq!(Key::from_name("Enter"), Key::Enter);
        assert_eq!(Key::from_name("ArrowDown"), Key::ArrowDown);
        assert_eq!(Key::from_name("a"), Key::Other);
    }
}
