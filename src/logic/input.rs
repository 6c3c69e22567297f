use crate::model::{FieldKind, FieldOption, FieldValue, ReconciledField};

/// A user interaction on a form control
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Free text typed into a text, number or textarea input
    Typed(String),
    /// Toggle switched on or off
    Toggled(bool),
    /// Option picked from a dropdown or radio group, by option value
    Chosen(String),
}

/// Control used to edit a field
#[derive(Debug, Clone, PartialEq)]
pub enum InputControl {
    TextInput,
    NumberInput,
    TextArea,
    Toggle,
    Dropdown { options: Vec<FieldOption> },
    RadioGroup { options: Vec<FieldOption> },
    /// Placeholder for kinds this client does not know yet
    Unsupported { kind: String },
}

impl InputControl {
    pub fn for_kind(kind: &FieldKind, options: &[FieldOption]) -> Self {
        match kind {
            FieldKind::Text => InputControl::TextInput,
            FieldKind::Number => InputControl::NumberInput,
            FieldKind::Textarea => InputControl::TextArea,
            FieldKind::Check => InputControl::Toggle,
            FieldKind::Select => InputControl::Dropdown {
                options: options.to_vec(),
            },
            FieldKind::Radio => InputControl::RadioGroup {
                options: options.to_vec(),
            },
            FieldKind::Unsupported(raw) => InputControl::Unsupported { kind: raw.clone() },
        }
    }

    /// Fields without a declared kind are presence flags
    pub fn for_field(field: &ReconciledField) -> Self {
        match &field.kind {
            Some(kind) => Self::for_kind(kind, &field.options),
            None => InputControl::Toggle,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, InputControl::Unsupported { .. })
    }

    /// Text shown instead of an input for unknown kinds
    pub fn placeholder_text(&self) -> Option<String> {
        match self {
            InputControl::Unsupported { kind } => Some(format!("Unsupported field type: {}", kind)),
            _ => None,
        }
    }

    /// Value to store for an event, or None if this control ignores it
    pub fn accept(&self, event: InputEvent) -> Option<FieldValue> {
        match (self, event) {
            (InputControl::TextInput | InputControl::TextArea, InputEvent::Typed(text)) => {
                Some(FieldValue::Text(text))
            }
            (InputControl::NumberInput, InputEvent::Typed(text)) => Some(FieldValue::Number(text)),
            (InputControl::Toggle, InputEvent::Toggled(on)) => Some(FieldValue::Boolean(on)),
            (
                InputControl::Dropdown { options } | InputControl::RadioGroup { options },
                InputEvent::Chosen(choice),
            ) => options
                .iter()
                .any(|option| option.value_text() == choice)
                .then_some(FieldValue::Text(choice)),
            (InputControl::Unsupported { kind }, _) => {
                log::debug!("Ignoring input for unsupported field type '{}'", kind);
                None
            }
            _ => None,
        }
    }
}
