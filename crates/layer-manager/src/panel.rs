//! Checkbox list model mirroring the layer list.

use serde::Serialize;

/// One checkbox: value is the layer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkbox {
    pub value: String,
    pub label: String,
    pub checked: bool,
}

/// Checkboxes in insertion order. Reordering layers never reorders the panel.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CheckboxPanel {
    items: Vec<Checkbox>,
}

impl CheckboxPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: impl Into<String>, label: impl Into<String>, checked: bool) {
        self.items.push(Checkbox {
            value: value.into(),
            label: label.into(),
            checked,
        });
    }

    /// Record a checkbox state change. Returns false for an unknown value.
    pub fn set_checked(&mut self, value: &str, checked: bool) -> bool {
        match self.items.iter_mut().find(|c| c.value == value) {
            Some(item) => {
                item.checked = checked;
                true
            }
            None => false,
        }
    }

    pub fn checkboxes(&self) -> &[Checkbox] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
