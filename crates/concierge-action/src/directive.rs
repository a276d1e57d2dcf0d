//! Directive construction.

use serde_json::{json, Value};

use concierge_core::types::{Directive, DirectiveType, Intent};

/// Example commands offered when the operator needs guidance.
pub const DEFAULT_SUGGESTIONS: &[&str] = &[
    "rezervare Ion Pop dublă 16-18 apr",
    "camere libere 12 mai",
    "problemă 301 frigider stricat",
    "vinde 2 cafele",
    "stoc cafea",
    "calendar",
];

/// Fluent builder for a [`Directive`].
#[derive(Debug, Clone)]
pub struct DirectiveBuilder {
    directive: Directive,
}

impl DirectiveBuilder {
    pub fn new(intent: Intent, kind: DirectiveType) -> Self {
        Self {
            directive: Directive {
                intent,
                kind,
                message: None,
                action: None,
                payload: None,
            },
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.directive.message = Some(message.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.directive.action = Some(action.into());
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.directive.payload = Some(payload);
        self
    }

    /// Attach the default suggestion list as `payload.suggestions`.
    pub fn suggestions(self) -> Self {
        self.payload(json!({ "suggestions": DEFAULT_SUGGESTIONS }))
    }

    pub fn build(self) -> Directive {
        self.directive
    }
}

pub fn chat(intent: Intent, message: impl Into<String>) -> Directive {
    DirectiveBuilder::new(intent, DirectiveType::Chat)
        .message(message)
        .build()
}

pub fn error(intent: Intent, message: impl Into<String>) -> Directive {
    DirectiveBuilder::new(intent, DirectiveType::Error)
        .message(message)
        .build()
}

pub fn action(intent: Intent, action: &str, payload: Value) -> Directive {
    DirectiveBuilder::new(intent, DirectiveType::Action)
        .action(action)
        .payload(payload)
        .build()
}

pub fn overlay(intent: Intent, action: &str, payload: Value) -> Directive {
    DirectiveBuilder::new(intent, DirectiveType::Overlay)
        .action(action)
        .payload(payload)
        .build()
}

pub fn confirm(intent: Intent, action: &str, message: impl Into<String>, payload: Value) -> Directive {
    DirectiveBuilder::new(intent, DirectiveType::Confirm)
        .action(action)
        .message(message)
        .payload(payload)
        .build()
}
