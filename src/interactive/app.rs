//! Application state and key handling for the interactive calculator

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::cascade::Resolution;
use crate::export::{self, LogTable};
use crate::rules::RuleTable;
use crate::session::Session;

use super::form::{CountEdit, FormField, FormState};
use super::messages::{Message, MessageType};

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Selecting and adding
    Normal,
    /// Confirming deletion of marked log rows
    DeleteConfirm,
    /// Help screen
    Help,
}

/// Main application state
pub struct App {
    /// Rule table, selection and activity log
    pub session: Session,
    /// Current application mode
    pub mode: AppMode,
    /// Form focus and count editor
    pub form: FormState,
    /// Log rows marked for deletion
    pub marked: BTreeSet<usize>,
    /// Highlighted log row when the log has focus
    pub log_cursor: usize,
    /// Messages to display
    pub messages: Vec<Message>,
    /// Rule file shown in the header
    pub rules_path: PathBuf,
    /// Destination of PNG/JSON exports
    pub export_dir: PathBuf,
}

/// Step through `options` from `current`, wrapping at both ends
fn cycle(options: &[String], current: Option<&str>, forward: bool) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let len = options.len();
    let next = match current.and_then(|c| options.iter().position(|o| o == c)) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None if forward => 0,
        None => len - 1,
    };
    Some(options[next].clone())
}

impl App {
    pub fn new(table: Arc<RuleTable>, rules_path: PathBuf, export_dir: PathBuf) -> Self {
        let rule_count = table.len();
        let activity_level = table.has_activity_level();
        App {
            session: Session::new(table),
            mode: AppMode::Normal,
            form: FormState::with_activity_level(activity_level),
            marked: BTreeSet::new(),
            log_cursor: 0,
            messages: vec![Message::new(
                MessageType::Info,
                format!("Loaded {} rules. Press ? for help", rule_count),
            )],
            rules_path,
            export_dir,
        }
    }

    fn notify(&mut self, message_type: MessageType, text: impl Into<String>) {
        self.messages.push(Message::new(message_type, text));
        if self.messages.len() > 20 {
            self.messages.remove(0);
        }
    }

    /// Handle a key press. Returns `false` when the application should exit.
    pub fn handle_event(&mut self, event: KeyEvent) -> bool {
        if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
            return false;
        }
        match self.mode {
            AppMode::Normal => self.handle_normal_mode(event),
            AppMode::DeleteConfirm => {
                self.handle_delete_mode(event);
                true
            }
            AppMode::Help => {
                self.mode = AppMode::Normal;
                true
            }
        }
    }

    fn handle_normal_mode(&mut self, event: KeyEvent) -> bool {
        if self.form.editing_count() {
            if let KeyCode::Char(c) = event.code {
                if c.is_ascii_digit() {
                    self.edit_count(event);
                    return true;
                }
            }
            if matches!(event.code, KeyCode::Backspace | KeyCode::Delete) {
                self.edit_count(event);
                return true;
            }
        }

        match event.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return false,
            KeyCode::Char('?') => self.mode = AppMode::Help,
            KeyCode::Tab => {
                self.leave_count_field();
                self.form.toggle_focus();
            }
            KeyCode::BackTab => {
                self.leave_count_field();
                self.form.previous_field();
            }
            KeyCode::Up => {
                if self.form.focus_on_log {
                    self.log_cursor = self.log_cursor.saturating_sub(1);
                } else {
                    self.leave_count_field();
                    self.form.previous_field();
                }
            }
            KeyCode::Down => {
                if self.form.focus_on_log {
                    let last = self.session.log().len().saturating_sub(1);
                    self.log_cursor = (self.log_cursor + 1).min(last);
                } else {
                    self.leave_count_field();
                    self.form.next_field();
                }
            }
            KeyCode::Left => self.change_current_field(false),
            KeyCode::Right => self.change_current_field(true),
            KeyCode::Char('+') => self.step_count(1),
            KeyCode::Char('-') => self.step_count(-1),
            KeyCode::Enter | KeyCode::Char('a') => self.add_current(),
            KeyCode::Char(' ') if self.form.focus_on_log => self.toggle_mark(),
            KeyCode::Char('d') => self.start_delete(),
            KeyCode::Char('x') => self.export_png(),
            KeyCode::Char('j') => self.export_json(),
            KeyCode::Char('c') => self.copy_to_clipboard(),
            KeyCode::Esc => {
                if !self.marked.is_empty() {
                    self.marked.clear();
                    self.notify(MessageType::Info, "Selection cleared");
                }
            }
            _ => {}
        }
        true
    }

    /// Left/Right: cycle the focused dropdown, or step the count
    fn change_current_field(&mut self, forward: bool) {
        if self.form.focus_on_log {
            return;
        }
        let selection = self.session.selection();
        match self.form.current_field {
            FormField::Segment => {
                if let Some(next) = cycle(&self.session.segments(), selection.segment(), forward) {
                    self.session.select_segment(&next);
                }
            }
            FormField::Code => {
                if let Some(next) = cycle(&self.session.codes(), selection.code(), forward) {
                    self.session.select_code(&next);
                }
            }
            FormField::Activity => match self.session.activities() {
                Some(options) => {
                    if let Some(next) = cycle(&options, selection.activity(), forward) {
                        self.session.select_activity(&next);
                    }
                }
                None => self.notify(MessageType::Info, "This code has a single activity"),
            },
            FormField::Refinement => match self.session.refinements() {
                Some(options) => {
                    if let Some(next) = cycle(&options, selection.refinement(), forward) {
                        self.session.select_refinement(&next);
                    }
                }
                None => self.notify(
                    MessageType::Info,
                    "No sub-category needed for this selection",
                ),
            },
            FormField::Count => self.step_count(if forward { 1 } else { -1 }),
        }
    }

    fn step_count(&mut self, delta: i64) {
        self.session.step_count(delta);
        self.form.sync_count(self.session.selection().count());
    }

    fn edit_count(&mut self, event: KeyEvent) {
        match self.form.edit_count(event) {
            CountEdit::Valid(count) => self.session.set_count(count),
            CountEdit::Invalid => {
                let text = self.form.count_input.value().to_string();
                if !text.is_empty() {
                    self.notify(
                        MessageType::Warning,
                        format!(
                            "'{}' is not a valid count; keeping {}",
                            text,
                            self.session.selection().count()
                        ),
                    );
                }
            }
            CountEdit::Unchanged => {}
        }
    }

    /// Snap the count editor back to the accepted count when focus leaves it
    fn leave_count_field(&mut self) {
        if self.form.editing_count() {
            self.form.sync_count(self.session.selection().count());
        }
    }

    fn add_current(&mut self) {
        if self.form.focus_on_log {
            return;
        }
        match self.session.current() {
            Resolution::Resolved(_) => {
                if let Some(entry) = self.session.add_current() {
                    let text = format!(
                        "Added {} {} × {} = {} points",
                        entry.code, entry.activity_label, entry.count, entry.total_points
                    );
                    self.notify(MessageType::Success, text);
                }
            }
            Resolution::NeedsActivity(options) => {
                self.form.current_field = FormField::Activity;
                self.notify(
                    MessageType::Warning,
                    format!("Choose an activity first: {}", options.join(", ")),
                );
            }
            Resolution::NeedsRefinement(options) => {
                self.form.current_field = FormField::Refinement;
                self.notify(
                    MessageType::Warning,
                    format!("Choose a sub-category first: {}", options.join(", ")),
                );
            }
            Resolution::Unselected => {
                self.notify(MessageType::Warning, "Select a segment and code first");
            }
        }
    }

    fn toggle_mark(&mut self) {
        if self.log_cursor >= self.session.log().len() {
            return;
        }
        if !self.marked.remove(&self.log_cursor) {
            self.marked.insert(self.log_cursor);
        }
    }

    /// Rows a delete would remove: the marked set, or the highlighted row
    pub fn pending_deletion(&self) -> BTreeSet<usize> {
        if !self.marked.is_empty() {
            self.marked.clone()
        } else if self.form.focus_on_log && self.log_cursor < self.session.log().len() {
            BTreeSet::from([self.log_cursor])
        } else {
            BTreeSet::new()
        }
    }

    fn start_delete(&mut self) {
        let pending = self.pending_deletion();
        if pending.is_empty() {
            self.notify(
                MessageType::Info,
                "Nothing selected. Tab to the log and mark rows with Space",
            );
            return;
        }
        self.mode = AppMode::DeleteConfirm;
        self.notify(
            MessageType::Warning,
            format!("Delete {} row(s)? [y] Confirm  [n/Esc] Cancel", pending.len()),
        );
    }

    fn handle_delete_mode(&mut self, event: KeyEvent) {
        self.mode = AppMode::Normal;
        match event.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let pending = self.pending_deletion();
                let removed = self.session.delete_selected(&pending);
                self.marked.clear();
                let len = self.session.log().len();
                self.log_cursor = self.log_cursor.min(len.saturating_sub(1));
                if len == 0 {
                    self.form.focus_on_log = false;
                }
                self.notify(MessageType::Success, format!("Deleted {} row(s)", removed));
            }
            _ => self.notify(MessageType::Info, "Delete cancelled"),
        }
    }

    fn export_png(&mut self) {
        let table = LogTable::from_log(self.session.log());
        let path = export::default_export_path(&self.export_dir, "png");
        match export::export_png(&table, &path) {
            Ok(()) => self.notify(
                MessageType::Success,
                format!("Saved image to {}", path.display()),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "PNG export failed");
                self.notify(MessageType::Error, format!("Export failed: {}", e));
            }
        }
    }

    fn export_json(&mut self) {
        let path = export::default_export_path(&self.export_dir, "json");
        match export::export_json(self.session.log(), &path) {
            Ok(()) => self.notify(
                MessageType::Success,
                format!("Saved JSON to {}", path.display()),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "JSON export failed");
                self.notify(MessageType::Error, format!("Export failed: {}", e));
            }
        }
    }

    fn copy_to_clipboard(&mut self) {
        let table = LogTable::from_log(self.session.log());
        match export::copy_to_clipboard(&table) {
            Ok(()) => self.notify(MessageType::Success, "Activity log copied to clipboard"),
            Err(e) => self.notify(MessageType::Error, format!("Copy failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RULES: &str = "Segment,Code,Sub-category,Points\n\
                         Service,S1,,10\n\
                         ,S2,A,5\n\
                         ,,B,8\n\
                         Sales,P1,,20\n";

    fn app_in(dir: &std::path::Path) -> App {
        let table = RuleTable::from_reader(RULES.as_bytes()).unwrap();
        App::new(
            Arc::new(table),
            PathBuf::from("rules.csv"),
            dir.to_path_buf(),
        )
    }

    fn app() -> App {
        app_in(std::path::Path::new("."))
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_event(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_cycle_wraps() {
        let options = vec!["A".to_string(), "B".to_string()];
        assert_eq!(cycle(&options, Some("B"), true).as_deref(), Some("A"));
        assert_eq!(cycle(&options, Some("A"), false).as_deref(), Some("B"));
        assert_eq!(cycle(&options, None, true).as_deref(), Some("A"));
        assert_eq!(cycle(&options, None, false).as_deref(), Some("B"));
        assert_eq!(cycle(&[], None, true), None);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(!app.handle_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn test_full_scenario_through_keys() {
        let mut app = app();

        // Segment -> Code, pick S2
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.session.selection().code(), Some("S2"));

        // Adding now prompts for the sub-category
        press(&mut app, KeyCode::Enter);
        assert!(app.session.log().is_empty());
        assert_eq!(app.form.current_field, FormField::Refinement);

        // A then B
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.session.selection().refinement(), Some("B"));

        // Count: type "3" after clearing the default
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.session.selection().count(), 3);

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.session.log().len(), 1);
        assert_eq!(app.session.log().total(), 24);
    }

    #[test]
    fn test_activity_field_through_keys() {
        let table = RuleTable::from_reader(
            "Segment,Code,Activity,Sub-category,Points\n\
             Service,S1,Visit,,10\n\
             ,,Call,,5\n"
                .as_bytes(),
        )
        .unwrap();
        let mut app = App::new(Arc::new(table), PathBuf::from("rules.csv"), PathBuf::from("."));
        assert_eq!(app.session.selection().activity(), Some("Visit"));

        // Segment -> Code -> Activity, switch to Call
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.form.current_field, FormField::Activity);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.session.selection().activity(), Some("Call"));

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.log().total(), 5);
        assert_eq!(app.session.log().entries()[0].activity_label, "Call");
    }

    #[test]
    fn test_sub_category_table_skips_activity_field() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.form.current_field, FormField::Refinement);
    }

    #[test]
    fn test_invalid_count_keeps_previous() {
        let mut app = app();
        app.form.current_field = FormField::Count;
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('0'));
        assert_eq!(app.session.selection().count(), 1);
        assert!(app
            .messages
            .iter()
            .any(|m| m.message_type == MessageType::Warning));

        // Leaving the field restores the accepted value
        press(&mut app, KeyCode::Up);
        assert_eq!(app.form.count_input.value(), "1");
    }

    #[test]
    fn test_step_count_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('+'));
        press(&mut app, KeyCode::Char('+'));
        assert_eq!(app.session.selection().count(), 3);
        press(&mut app, KeyCode::Char('-'));
        press(&mut app, KeyCode::Char('-'));
        press(&mut app, KeyCode::Char('-'));
        assert_eq!(app.session.selection().count(), 1);
        assert_eq!(app.form.count_input.value(), "1");
    }

    #[test]
    fn test_mark_and_delete() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('+'));
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.log().total(), 10 + 20 + 20);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.marked, BTreeSet::from([0, 1]));

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.mode, AppMode::DeleteConfirm);
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.session.log().len(), 1);
        assert_eq!(app.session.log().total(), 20);
        assert!(app.marked.is_empty());
    }

    #[test]
    fn test_delete_cancel() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.session.log().len(), 1);
    }

    #[test]
    fn test_export_png_from_app() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(dir.path());

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(
            app.messages.last().map(|m| m.message_type),
            Some(MessageType::Error)
        );

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(
            app.messages.last().map(|m| m.message_type),
            Some(MessageType::Success)
        );
        let pngs = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |x| x == "png"))
            .count();
        assert_eq!(pngs, 1);
    }
}
