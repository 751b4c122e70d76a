//! Rendering the compose templates into the devstack checkout.

use crate::config::DevstackConfig;
use crate::template::RendererCache;
use crate::util::fs::write_file;
use devstack_types::compose::{template_name, RENDERED_FILES};
use devstack_types::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Render every compose template and write it next to its template.
///
/// `<name>.template` under `template_root` becomes `<output_root>/<name>`.
/// Stops at the first failure; files already written stay written.
pub fn render_templates(
    cache: &mut RendererCache,
    template_root: impl AsRef<Path>,
    output_root: impl AsRef<Path>,
    config: &DevstackConfig,
) -> Result<Vec<PathBuf>> {
    let written = render_each(cache, template_root, output_root, config, |dest, rendered| {
        write_file(dest, rendered)
    })?;

    info!("Templates generated");
    Ok(written)
}

/// Render every compose template without writing anything.
///
/// Template errors surface exactly as in [`render_templates`]. Returns the
/// paths that would have been written.
pub fn preview_templates(
    cache: &mut RendererCache,
    template_root: impl AsRef<Path>,
    output_root: impl AsRef<Path>,
    config: &DevstackConfig,
) -> Result<Vec<PathBuf>> {
    render_each(cache, template_root, output_root, config, |dest, rendered| {
        info!("[dry-run] would write {}", dest.display());
        debug!("{}", rendered);
        Ok(())
    })
}

fn render_each<F>(
    cache: &mut RendererCache,
    template_root: impl AsRef<Path>,
    output_root: impl AsRef<Path>,
    config: &DevstackConfig,
    mut emit: F,
) -> Result<Vec<PathBuf>>
where
    F: FnMut(&Path, &str) -> Result<()>,
{
    let renderer = cache.get(template_root, config)?;
    let output_root = output_root.as_ref();

    let mut paths = Vec::with_capacity(RENDERED_FILES.len());
    for filename in RENDERED_FILES {
        let rendered = renderer.render_file(template_name(filename))?;
        let dest = output_root.join(filename);
        emit(&dest, &rendered)?;
        paths.push(dest);
    }

    Ok(paths)
}
