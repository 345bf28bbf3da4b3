//! Action descriptors and their interpreter.
//!
//! Step files describe actions as flat JSON objects keyed by `actionType`.
//! Deserialization checks every kind's required fields, so a step list that
//! loads is a step list the interpreter can dispatch.
mod interpret;

pub use interpret::{run_action, ActionError, ActionResult};

use crate::environment::EnvironmentTable;
use serde::Deserialize;
use thiserror::Error;

/// One document transform with the fields its kind requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetAttribute {
        selector: String,
        attribute: String,
        value: String,
    },
    RemoveAttribute {
        selector: String,
        attribute: String,
    },
    Replace {
        selector: String,
        regex: String,
        replace: String,
    },
    ReplaceOrInsert {
        selector: String,
        regex: String,
        replace: String,
    },
    Insert {
        selector: String,
        value: String,
    },
    AppendAfter {
        selector: String,
        value: String,
    },
    Move {
        selector: String,
        dest_selector: String,
    },
    MergeContent {
        selector: String,
        dest_selector: String,
    },
    InlineExternalStyles {
        selector: String,
        minify: bool,
    },
    RemoveUnusedStyles {
        selector: String,
        minify: bool,
        output_css: bool,
    },
    CustomFunc {
        selector: String,
    },
    /// A kind outside the supported set; reported and skipped at dispatch.
    Unsupported {
        kind: String,
    },
}

impl Action {
    /// The `actionType` name of this action.
    pub fn kind(&self) -> &str {
        match self {
            Action::SetAttribute { .. } => "setAttribute",
            Action::RemoveAttribute { .. } => "removeAttribute",
            Action::Replace { .. } => "replace",
            Action::ReplaceOrInsert { .. } => "replaceOrInsert",
            Action::Insert { .. } => "insert",
            Action::AppendAfter { .. } => "appendAfter",
            Action::Move { .. } => "move",
            Action::MergeContent { .. } => "mergeContent",
            Action::InlineExternalStyles { .. } => "inlineExternalStyles",
            Action::RemoveUnusedStyles { .. } => "removeUnusedStyles",
            Action::CustomFunc { .. } => "customFunc",
            Action::Unsupported { kind } => kind,
        }
    }

    /// Copy of the action with placeholders substituted in every string field.
    pub fn resolve(&self, env: &EnvironmentTable) -> Action {
        let r = |value: &String| env.resolve(value);
        match self {
            Action::SetAttribute {
                selector,
                attribute,
                value,
            } => Action::SetAttribute {
                selector: r(selector),
                attribute: r(attribute),
                value: r(value),
            },
            Action::RemoveAttribute {
                selector,
                attribute,
            } => Action::RemoveAttribute {
                selector: r(selector),
                attribute: r(attribute),
            },
            Action::Replace {
                selector,
                regex,
                replace,
            } => Action::Replace {
                selector: r(selector),
                regex: r(regex),
                replace: r(replace),
            },
            Action::ReplaceOrInsert {
                selector,
                regex,
                replace,
            } => Action::ReplaceOrInsert {
                selector: r(selector),
                regex: r(regex),
                replace: r(replace),
            },
            Action::Insert { selector, value } => Action::Insert {
                selector: r(selector),
                value: r(value),
            },
            Action::AppendAfter { selector, value } => Action::AppendAfter {
                selector: r(selector),
                value: r(value),
            },
            Action::Move {
                selector,
                dest_selector,
            } => Action::Move {
                selector: r(selector),
                dest_selector: r(dest_selector),
            },
            Action::MergeContent {
                selector,
                dest_selector,
            } => Action::MergeContent {
                selector: r(selector),
                dest_selector: r(dest_selector),
            },
            Action::InlineExternalStyles { selector, minify } => {
                Action::InlineExternalStyles {
                    selector: r(selector),
                    minify: *minify,
                }
            }
            Action::RemoveUnusedStyles {
                selector,
                minify,
                output_css,
            } => Action::RemoveUnusedStyles {
                selector: r(selector),
                minify: *minify,
                output_css: *output_css,
            },
            Action::CustomFunc { selector } => Action::CustomFunc {
                selector: r(selector),
            },
            Action::Unsupported { kind } => Action::Unsupported { kind: kind.clone() },
        }
    }
}

/// An action as written in a step file: the action plus its optional log label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawAction")]
pub struct ActionSpec {
    pub log: Option<String>,
    pub action: Action,
}

impl ActionSpec {
    /// Label used in progress lines: the `log` text, else the kind name.
    pub fn label(&self) -> &str {
        self.log.as_deref().unwrap_or_else(|| self.action.kind())
    }

    pub fn resolve(&self, env: &EnvironmentTable) -> ActionSpec {
        ActionSpec {
            log: env.resolve_opt(self.log.as_deref()),
            action: self.action.resolve(env),
        }
    }
}

/// A step-file action that is missing a field its kind requires.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("action `{kind}` requires field `{field}`")]
pub struct ConstructionError {
    pub kind: String,
    pub field: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    action_type: String,
    #[serde(default)]
    log: Option<String>,
    #[serde(default)]
    selector: Option<String>,
    #[serde(default)]
    attribute: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    regex: Option<String>,
    #[serde(default)]
    replace: Option<String>,
    #[serde(default)]
    dest_selector: Option<String>,
    #[serde(default)]
    minify: Option<bool>,
    #[serde(default, rename = "outputCSS")]
    output_css: Option<bool>,
}

impl TryFrom<RawAction> for ActionSpec {
    type Error = ConstructionError;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        let kind = raw.action_type.clone();
        let need = |field: Option<String>, name: &'static str| {
            field.ok_or_else(|| ConstructionError {
                kind: kind.clone(),
                field: name,
            })
        };
        let action = match raw.action_type.as_str() {
            "setAttribute" => Action::SetAttribute {
                selector: need(raw.selector, "selector")?,
                attribute: need(raw.attribute, "attribute")?,
                value: need(raw.value, "value")?,
            },
            "removeAttribute" => Action::RemoveAttribute {
                selector: need(raw.selector, "selector")?,
                attribute: need(raw.attribute, "attribute")?,
            },
            "replace" => Action::Replace {
                selector: need(raw.selector, "selector")?,
                regex: need(raw.regex, "regex")?,
                replace: need(raw.replace, "replace")?,
            },
            "replaceOrInsert" => Action::ReplaceOrInsert {
                selector: need(raw.selector, "selector")?,
                regex: need(raw.regex, "regex")?,
                replace: need(raw.replace, "replace")?,
            },
            "insert" => Action::Insert {
                selector: need(raw.selector, "selector")?,
                value: need(raw.value, "value")?,
            },
            "appendAfter" => Action::AppendAfter {
                selector: need(raw.selector, "selector")?,
                value: need(raw.value, "value")?,
            },
            "move" => Action::Move {
                selector: need(raw.selector, "selector")?,
                dest_selector: need(raw.dest_selector, "destSelector")?,
            },
            "mergeContent" => Action::MergeContent {
                selector: need(raw.selector, "selector")?,
                dest_selector: need(raw.dest_selector, "destSelector")?,
            },
            "inlineExternalStyles" => Action::InlineExternalStyles {
                selector: need(raw.selector, "selector")?,
                minify: raw.minify.unwrap_or(false),
            },
            "removeUnusedStyles" => Action::RemoveUnusedStyles {
                selector: need(raw.selector, "selector")?,
                minify: raw.minify.unwrap_or(false),
                output_css: raw.output_css.unwrap_or(false),
            },
            "customFunc" => Action::CustomFunc {
                selector: need(raw.selector, "selector")?,
            },
            _ => Action::Unsupported {
                kind: raw.action_type.clone(),
            },
        };
        Ok(ActionSpec {
            log: raw.log,
            action,
        })
    }
}
