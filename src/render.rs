//! # Template Rendering
//!
//! Templates are Handlebars files stored one directory per generator under
//! the templates root. Rendering runs in strict mode: a template that
//! references a variable absent from the context fails instead of emitting a
//! blank. HTML escaping is disabled since the output is device configuration.
//!
//! Rendered text is normalized before it is written: CRLF becomes LF,
//! trailing whitespace is trimmed and exactly one newline is appended. The
//! output is committed and diffed, so the same context must always produce
//! the same bytes.

use std::fs;
use std::path::Path;

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, JsonTruthy, Output, RenderErrorReason,
    Renderable,
};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::variables::VariableEntry;

/// How a generator's variable records appear in the template context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    /// Key under which the record list is exposed.
    pub collection: &'static str,
    /// Field names, in file column order.
    pub fields: &'static [&'static str],
}

impl RecordLayout {
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Everything a template sees for one site.
///
/// Serialized as:
///
/// ```json
/// { "site": "HQ", "acl_ssh_dc": [ { "ip": "10.0.0.1", "wildcard": "0.0.0.7" } ] }
/// ```
#[derive(Debug, Clone)]
pub struct RenderContext {
    site: String,
    layout: RecordLayout,
    entries: Vec<VariableEntry>,
}

impl RenderContext {
    pub fn new(site: impl Into<String>, layout: RecordLayout, entries: Vec<VariableEntry>) -> Self {
        Self {
            site: site.into(),
            layout,
            entries,
        }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn entries(&self) -> &[VariableEntry] {
        &self.entries
    }

    pub fn to_value(&self) -> Value {
        let records: Vec<Value> = self
            .entries
            .iter()
            .map(|entry| {
                let record: Map<String, Value> = self
                    .layout
                    .fields
                    .iter()
                    .zip(entry.fields.iter())
                    .map(|(name, value)| (name.to_string(), Value::String(value.clone())))
                    .collect();
                Value::Object(record)
            })
            .collect();

        let mut root = Map::new();
        root.insert("site".to_string(), Value::String(self.site.clone()));
        root.insert(self.layout.collection.to_string(), Value::Array(records));
        Value::Object(root)
    }
}

/// Strict Handlebars renderer shared by every generator.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        // Strict mode does not reach block helper parameters.
        handlebars.register_helper("if", Box::new(StrictConditional { name: "if", positive: true }));
        handlebars.register_helper(
            "unless",
            Box::new(StrictConditional {
                name: "unless",
                positive: false,
            }),
        );
        Self { handlebars }
    }

    /// Load `template_dir/template_name` and render it against `context`.
    ///
    /// The returned text is already normalized.
    pub fn render(&self, template_dir: &Path, template_name: &str, context: &RenderContext) -> Result<String> {
        let path = template_dir.join(template_name);
        let source = fs::read_to_string(&path).map_err(|e| Error::Template {
            template: path.display().to_string(),
            message: format!("cannot read template: {}", e),
        })?;
        self.render_str(&path.display().to_string(), &source, &context.to_value())
    }

    /// Render template `source` against `data`; `label` names it in errors.
    pub fn render_str(&self, label: &str, source: &str, data: &Value) -> Result<String> {
        let rendered = self
            .handlebars
            .render_template(source, data)
            .map_err(|e| Error::Template {
                template: label.to_string(),
                message: e.to_string(),
            })?;
        Ok(normalize_output(&rendered))
    }
}

/// `if` / `unless` that fail on a parameter absent from the context.
#[derive(Clone, Copy)]
struct StrictConditional {
    name: &'static str,
    positive: bool,
}

impl HelperDef for StrictConditional {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut handlebars::RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let param = h.param(0).ok_or_else(|| {
            RenderErrorReason::Other(format!("{} requires a parameter", self.name))
        })?;
        if param.is_value_missing() {
            let path = param.relative_path().map_or("<unknown>", String::as_str);
            return Err(RenderErrorReason::Other(format!(
                "Variable \"{}\" not found in strict mode ({} block)",
                path, self.name
            ))
            .into());
        }

        let include_zero = h
            .hash_get("includeZero")
            .and_then(|v| v.value().as_bool())
            .unwrap_or(false);
        let branch = if param.value().is_truthy(include_zero) == self.positive {
            h.template()
        } else {
            h.inverse()
        };
        match branch {
            Some(template) => template.render(r, ctx, rc, out),
            None => Ok(()),
        }
    }
}

/// LF line endings, no trailing whitespace, exactly one final newline.
pub fn normalize_output(text: &str) -> String {
    let mut normalized = text.replace("\r\n", "\n").trim_end().to_string();
    normalized.push('\n');
    normalized
}

/// Write rendered `text` to `path`, creating parent directories.
pub fn write_output(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}
