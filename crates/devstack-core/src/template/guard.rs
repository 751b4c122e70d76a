//! Strict checks for block helper parameters.
//!
//! Handlebars strict mode rejects `{{MISSING}}`, but the built-in block
//! helpers (`if`, `unless`, `with`, `each`) read a missing parameter as
//! falsy. This pass walks the template in render order and rejects those
//! too. Sections that will not be rendered are not checked, and checks stop
//! wherever `with` or `each` move the context away from the configuration.

use crate::util::data::is_truthy;
use devstack_types::{DevstackError, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

/// An open block section.
#[derive(Debug)]
struct Frame {
    helper: String,
    /// The context inside this section is not the configuration root.
    scoped: bool,
    /// The enclosing section renders.
    parent_live: bool,
    /// The current branch of this section renders.
    live: bool,
    /// An earlier branch of an `if`/`unless` chain already rendered.
    taken: bool,
}

/// Rejects undefined block parameters before rendering.
pub(crate) struct BlockGuard {
    comment: Regex,
    tag: Regex,
    partials: BTreeMap<String, PathBuf>,
}

impl BlockGuard {
    /// `partials` maps registered template names to their source files.
    pub(crate) fn new(partials: BTreeMap<String, PathBuf>) -> Result<Self> {
        let comment = Regex::new(r"(?s)\{\{!--.*?--\}\}|\{\{![^}]*\}\}")
            .map_err(|e| DevstackError::Bug(format!("Invalid regex: {}", e)))?;
        let tag = Regex::new(r"(?s)\{\{\{?~?\s*(.*?)\s*~?\}?\}\}")
            .map_err(|e| DevstackError::Bug(format!("Invalid regex: {}", e)))?;

        Ok(Self {
            comment,
            tag,
            partials,
        })
    }

    /// Check `source` against `context`.
    pub(crate) fn check(&self, source: &str, origin: &str, context: &Value) -> Result<()> {
        let mut visited = BTreeSet::new();
        self.check_source(source, origin, context, &mut visited)
    }

    fn check_source(
        &self,
        source: &str,
        origin: &str,
        context: &Value,
        visited: &mut BTreeSet<String>,
    ) -> Result<()> {
        let source = self.comment.replace_all(source, "");
        let mut open: Vec<Frame> = Vec::new();

        for cap in self.tag.captures_iter(&source) {
            let body = match cap.get(1) {
                Some(m) => m.as_str(),
                None => continue,
            };
            let live = open.last().map_or(true, |f| f.live);
            let scoped = open.last().map_or(false, |f| f.scoped);

            if let Some(rest) = body.strip_prefix('#') {
                let mut words = rest.split_whitespace();
                let helper = words.next().unwrap_or_default().to_string();
                let param = words.next();
                let mut frame = Frame {
                    helper,
                    scoped,
                    parent_live: live,
                    live,
                    taken: false,
                };

                match frame.helper.as_str() {
                    "if" | "unless" => {
                        if let Some(cond) = self.condition(&frame.helper, param, live && !scoped, origin, context)? {
                            frame.live = live && cond;
                            frame.taken = cond;
                        }
                    }
                    "with" | "each" => {
                        if let Some(cond) = self.condition("if", param, live && !scoped, origin, context)? {
                            frame.live = live && cond;
                        }
                        frame.scoped = true;
                    }
                    _ => {}
                }
                open.push(frame);
            } else if body.starts_with('/') {
                open.pop();
            } else if body == "else" || body == "^" || body.starts_with("else ") {
                let frame = match open.last_mut() {
                    Some(frame) => frame,
                    None => continue,
                };
                let mut words = body.split_whitespace().skip(1);
                let chained = words.next();

                if frame.taken {
                    frame.live = false;
                } else if let Some(helper @ ("if" | "unless")) = chained {
                    let check = frame.parent_live && !frame.scoped;
                    match self.condition(helper, words.next(), check, origin, context)? {
                        Some(cond) => {
                            frame.live = frame.parent_live && cond;
                            frame.taken = cond;
                        }
                        None => frame.live = frame.parent_live,
                    }
                } else {
                    frame.live = frame.parent_live;
                    if frame.helper == "if" || frame.helper == "unless" {
                        frame.taken = true;
                    }
                }
            } else if let Some(rest) = body.strip_prefix('>') {
                let mut words = rest.split_whitespace();
                let name = words.next().unwrap_or_default();
                // A context argument moves the partial off the configuration root.
                if live && !scoped && words.next().is_none() {
                    self.check_partial(name, context, visited)?;
                }
            }
        }

        Ok(())
    }

    /// Evaluate a block condition. `None` when it cannot be evaluated here.
    fn condition(
        &self,
        helper: &str,
        param: Option<&str>,
        check: bool,
        origin: &str,
        context: &Value,
    ) -> Result<Option<bool>> {
        let param = match param {
            Some(param) if check && is_plain_path(param) => param,
            _ => return Ok(None),
        };

        let value = lookup(context, param).ok_or_else(|| {
            DevstackError::UndefinedVariable(format!("'{}' in {}", param, origin))
        })?;

        let truthy = is_truthy(value);
        Ok(Some(if helper == "unless" { !truthy } else { truthy }))
    }

    fn check_partial(
        &self,
        name: &str,
        context: &Value,
        visited: &mut BTreeSet<String>,
    ) -> Result<()> {
        let path = match self.partials.get(name) {
            Some(path) => path,
            None => return Ok(()),
        };
        if !visited.insert(name.to_string()) {
            return Ok(());
        }

        let source = fs::read_to_string(path).map_err(|e| {
            DevstackError::TemplateLoad(format!("Error loading template {}: {}", name, e))
        })?;
        self.check_source(&source, name, context, visited)
    }
}

impl std::fmt::Debug for BlockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockGuard")
            .field("partials", &self.partials.len())
            .finish()
    }
}

/// A dotted or slashed key path into the configuration.
///
/// Literals, `this`, `@data`, `../` parents, and subexpressions are not.
fn is_plain_path(param: &str) -> bool {
    let starts_ok = param
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok {
        return false;
    }
    if matches!(param, "this" | "true" | "false" | "null" | "undefined")
        || param.starts_with("this.")
        || param.starts_with("this/")
    {
        return false;
    }

    param
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'))
}

fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split(|c| c == '.' || c == '/')
        .try_fold(context, |value, seg| match value {
            Value::Object(map) => map.get(seg),
            Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}
