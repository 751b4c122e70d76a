//! Strict template rendering.
//!
//! Templates are handlebars with strict mode on: a reference to a key that
//! is not in the configuration fails the render instead of producing an
//! empty string. Output is not HTML-escaped.
//!
//! Every `*.template` file under the template root is registered under its
//! root-relative path minus the suffix, so `partials/volumes.template` can be
//! included from another template with `{{> partials/volumes}}`. Sources are
//! read from disk on every render, so an edited template or partial is picked
//! up by a renderer that already exists.

mod guard;

use crate::config::DevstackConfig;
use devstack_types::compose::TEMPLATE_SUFFIX;
use devstack_types::{DevstackError, Result};
use guard::BlockGuard;
use handlebars::{Handlebars, RenderError, RenderErrorReason, Template};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// How deep below the template root to look for includable templates.
pub const TEMPLATE_SEARCH_DEPTH: usize = 4;

/// A template engine bound to a root directory and a configuration snapshot.
pub struct TemplateRenderer {
    root: PathBuf,
    config: DevstackConfig,
    context: Value,
    registry: Handlebars<'static>,
    guard: BlockGuard,
}

impl TemplateRenderer {
    /// Create a renderer. The configuration is copied.
    pub fn new(root: impl AsRef<Path>, config: &DevstackConfig) -> Result<Self> {
        let root = canonical_root(root.as_ref())?;
        Self::with_canonical_root(root, config)
    }

    fn with_canonical_root(root: PathBuf, config: &DevstackConfig) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.set_dev_mode(true);
        registry.register_escape_fn(handlebars::no_escape);

        let mut partials = BTreeMap::new();
        for entry in WalkDir::new(&root)
            .max_depth(TEMPLATE_SEARCH_DEPTH)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let name = match path.strip_prefix(&root).map(template_key) {
                Ok(key) => match key.strip_suffix(TEMPLATE_SUFFIX) {
                    Some(name) => name.to_string(),
                    None => continue,
                },
                Err(_) => continue,
            };

            // A broken template is reported when it is rendered, not here.
            if let Err(e) = registry.register_template_file(&name, path) {
                warn!("Template {} does not load: {}", name, e);
                continue;
            }

            debug!("Registered template {}", name);
            partials.insert(name, path.to_path_buf());
        }

        debug!("Registered {} templates under {}", partials.len(), root.display());

        Ok(Self {
            root,
            context: config.to_value(),
            config: config.clone(),
            registry,
            guard: BlockGuard::new(partials)?,
        })
    }

    /// Canonical template root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configuration this renderer substitutes.
    pub fn config(&self) -> &DevstackConfig {
        &self.config
    }

    /// Render inline template text.
    pub fn render_str(&self, text: &str) -> Result<String> {
        compile(text, "inline template")?;
        self.guard.check(text, "inline template", &self.context)?;
        self.registry
            .render_template(text, &self.context)
            .map_err(|e| render_error("inline template", e))
    }

    /// Render a template file given relative to the template root.
    pub fn render_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let resolved = self.resolve(path)?;
        let name = match resolved.strip_prefix(&self.root) {
            Ok(rel) => template_key(rel),
            Err(_) => path.display().to_string(),
        };

        info!("Rendering template {}", name);
        debug!(
            "render_file, config {}",
            serde_json::to_string(&self.context).unwrap_or_default()
        );

        let source = fs::read_to_string(&resolved).map_err(|e| {
            DevstackError::TemplateLoad(format!("Error loading template {}: {}", name, e))
        })?;
        compile(&source, &name)?;
        self.guard.check(&source, &name, &self.context)?;
        self.registry
            .render_template(&source, &self.context)
            .map_err(|e| render_error(&name, e))
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
            return Err(DevstackError::TemplateLoad(format!(
                "Template {} is outside the template root {}",
                path.display(),
                self.root.display()
            )));
        }

        let resolved = self.root.join(path).canonicalize().map_err(|e| {
            DevstackError::TemplateLoad(format!(
                "Error loading template {} from {}: {}",
                path.display(),
                self.root.display(),
                e
            ))
        })?;

        // Symlinks may still point elsewhere.
        if !resolved.starts_with(&self.root) || !resolved.is_file() {
            return Err(DevstackError::TemplateLoad(format!(
                "Template {} does not resolve to a file under {}",
                path.display(),
                self.root.display()
            )));
        }

        Ok(resolved)
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("root", &self.root)
            .field("keys", &self.config.len())
            .finish()
    }
}

/// Holds the renderer for the rest of the process.
///
/// The renderer is rebuilt only when the requested root or configuration
/// differs from the one it was built with.
#[derive(Debug, Default)]
pub struct RendererCache {
    current: Option<TemplateRenderer>,
    builds: usize,
}

impl RendererCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer for `root` and `config`, built on demand.
    pub fn get(&mut self, root: impl AsRef<Path>, config: &DevstackConfig) -> Result<&TemplateRenderer> {
        let root = canonical_root(root.as_ref())?;

        let stale = match &self.current {
            Some(renderer) => renderer.root != root || renderer.config != *config,
            None => true,
        };

        if stale {
            self.current = Some(TemplateRenderer::with_canonical_root(root, config)?);
            self.builds += 1;
        }

        self.current
            .as_ref()
            .ok_or_else(|| DevstackError::Bug("renderer cache empty after build".to_string()))
    }

    /// How many renderers have been built.
    pub fn builds(&self) -> usize {
        self.builds
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    root.canonicalize().map_err(|e| {
        DevstackError::TemplateLoad(format!("Template root {} not found: {}", root.display(), e))
    })
}

fn template_key(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn compile(source: &str, origin: &str) -> Result<()> {
    Template::compile(source)
        .map(|_| ())
        .map_err(|e| DevstackError::TemplateSyntax(format!("{}: {}", origin, e)))
}

fn render_error(origin: &str, err: RenderError) -> DevstackError {
    match err.reason() {
        RenderErrorReason::MissingVariable(var) => DevstackError::UndefinedVariable(format!(
            "'{}' in {}",
            var.clone().unwrap_or_else(|| err.to_string()),
            origin
        )),
        RenderErrorReason::TemplateError(e) => {
            DevstackError::TemplateSyntax(format!("{}: {}", origin, e))
        }
        _ => DevstackError::TemplateRender(format!("Error rendering template {}: {}", origin, err)),
    }
}
