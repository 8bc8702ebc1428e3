//! AppleScript payloads for each tool, rendered from templates.
//!
//! Every `{{ value }}` in a script template goes through an output formatter
//! that escapes it for an AppleScript string literal. Templates only place
//! values inside double quotes, so no caller-supplied text can close the
//! literal or start a new statement.

use minijinja::{Environment, ErrorKind, UndefinedBehavior, Value, context};

use crate::error::ScriptError;

const OPEN_APP: &str = "open_app";
const NEW_DOCUMENT: &str = "new_document";
const WRITE_TEXT: &str = "write_text";
const SAVE_DOCUMENT: &str = "save_document";
const CLOSE_APP: &str = "close_app";

const TEMPLATES: [(&str, &str); 5] = [
    (OPEN_APP, include_str!("../scripts/open_app.applescript")),
    (NEW_DOCUMENT, include_str!("../scripts/new_document.applescript")),
    (WRITE_TEXT, include_str!("../scripts/write_text.applescript")),
    (SAVE_DOCUMENT, include_str!("../scripts/save_document.applescript")),
    (CLOSE_APP, include_str!("../scripts/close_app.applescript")),
];

/// Escape a value for use inside an AppleScript `"..."` literal.
pub fn escape_applescript(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Template set bound to one target application.
pub struct ScriptBook {
    env: Environment<'static>,
    app: String,
}

impl ScriptBook {
    pub fn new(app: impl Into<String>) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_formatter(|out, _state, value| {
            let raw = match value.as_str() {
                Some(text) => text.to_string(),
                None => value.to_string(),
            };
            out.write_str(&escape_applescript(&raw)).map_err(|_| {
                minijinja::Error::new(ErrorKind::WriteFailure, "write script output")
            })
        });
        for (name, source) in TEMPLATES {
            env.add_template(name, source)
                .expect("bundled script template should be valid");
        }
        Self {
            env,
            app: app.into(),
        }
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn open_app(&self) -> Result<String, ScriptError> {
        self.render(OPEN_APP, context! { app => self.app.as_str() })
    }

    pub fn new_document(&self) -> Result<String, ScriptError> {
        self.render(NEW_DOCUMENT, context! { app => self.app.as_str() })
    }

    pub fn write_text(&self, text: &str) -> Result<String, ScriptError> {
        self.render(
            WRITE_TEXT,
            context! { app => self.app.as_str(), text => text },
        )
    }

    pub fn save_document(&self, path: &str) -> Result<String, ScriptError> {
        self.render(
            SAVE_DOCUMENT,
            context! { app => self.app.as_str(), path => path },
        )
    }

    pub fn close_app(&self) -> Result<String, ScriptError> {
        self.render(CLOSE_APP, context! { app => self.app.as_str() })
    }

    fn render(&self, template: &'static str, ctx: Value) -> Result<String, ScriptError> {
        self.env
            .get_template(template)
            .and_then(|tmpl| tmpl.render(ctx))
            .map_err(|source| ScriptError { template, source })
    }
}
