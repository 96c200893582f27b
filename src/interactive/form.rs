//! Form state for the selection cascade

use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler as InputEventHandler;
use tui_input::Input;

/// Form field types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Segment,
    Code,
    Activity,
    Refinement,
    Count,
}

impl FormField {
    /// Get all fields in order
    pub fn all() -> [FormField; 5] {
        [
            FormField::Segment,
            FormField::Code,
            FormField::Activity,
            FormField::Refinement,
            FormField::Count,
        ]
    }

    /// Fields shown for a table; the activity field only exists when the
    /// table has an activity level of its own
    pub fn visible(activity_level: bool) -> Vec<FormField> {
        Self::all()
            .into_iter()
            .filter(|f| activity_level || *f != FormField::Activity)
            .collect()
    }

    /// Get the next field
    pub fn next(&self) -> FormField {
        match self {
            FormField::Segment => FormField::Code,
            FormField::Code => FormField::Activity,
            FormField::Activity => FormField::Refinement,
            FormField::Refinement => FormField::Count,
            FormField::Count => FormField::Segment,
        }
    }

    /// Get the previous field
    pub fn previous(&self) -> FormField {
        match self {
            FormField::Segment => FormField::Count,
            FormField::Code => FormField::Segment,
            FormField::Activity => FormField::Code,
            FormField::Refinement => FormField::Activity,
            FormField::Count => FormField::Refinement,
        }
    }

    /// Get field label
    pub fn label(&self) -> &'static str {
        match self {
            FormField::Segment => "Segment",
            FormField::Code => "Code",
            FormField::Activity => "Activity",
            FormField::Refinement => "Sub-category",
            FormField::Count => "Count",
        }
    }
}

/// What the count editor made of the last keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountEdit {
    /// Text is a valid count
    Valid(u32),
    /// Text is empty or not a count of at least one
    Invalid,
    /// The key did not touch the text
    Unchanged,
}

/// Focus and edit state of the form
#[derive(Debug, Clone)]
pub struct FormState {
    pub current_field: FormField,
    pub focus_on_log: bool,
    pub count_input: Input,
    /// Whether the activity field takes part in navigation
    pub activity_level: bool,
}

impl FormState {
    pub fn new() -> Self {
        Self {
            current_field: FormField::Segment,
            focus_on_log: false,
            count_input: Input::new("1".to_string()),
            activity_level: false,
        }
    }

    pub fn with_activity_level(activity_level: bool) -> Self {
        Self {
            activity_level,
            ..Self::new()
        }
    }

    fn skips(&self, field: FormField) -> bool {
        field == FormField::Activity && !self.activity_level
    }

    /// Move to next field
    pub fn next_field(&mut self) {
        if !self.focus_on_log {
            self.current_field = self.current_field.next();
            if self.skips(self.current_field) {
                self.current_field = self.current_field.next();
            }
        }
    }

    /// Move to previous field
    pub fn previous_field(&mut self) {
        if !self.focus_on_log {
            self.current_field = self.current_field.previous();
            if self.skips(self.current_field) {
                self.current_field = self.current_field.previous();
            }
        }
    }

    /// Toggle focus between form and log panel
    pub fn toggle_focus(&mut self) {
        self.focus_on_log = !self.focus_on_log;
    }

    pub fn editing_count(&self) -> bool {
        !self.focus_on_log && self.current_field == FormField::Count
    }

    /// Feed a key to the count editor. Only digits and editing keys reach it.
    pub fn edit_count(&mut self, key: KeyEvent) -> CountEdit {
        if self.count_input.handle_event(&Event::Key(key)).is_none() {
            return CountEdit::Unchanged;
        }
        parse_count(self.count_input.value())
    }

    /// Replace the editor text, e.g. after the count was stepped
    pub fn sync_count(&mut self, count: u32) {
        self.count_input = Input::new(count.to_string());
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the count text; zero and non-numbers are rejected
pub fn parse_count(text: &str) -> CountEdit {
    match text.trim().parse::<u32>() {
        Ok(n) if n >= 1 => CountEdit::Valid(n),
        _ => CountEdit::Invalid,
    }
}
