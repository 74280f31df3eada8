//! Per-site render loop shared by the built-in generators.

use std::path::PathBuf;

use log::{info, warn};

use crate::error::Result;
use crate::render::{write_output, RecordLayout, RenderContext, TemplateRenderer};
use crate::variables::{list_sites, read_entries};

use super::{GenerationPaths, TEMPLATE_FILE};

/// Where one generator finds its input and puts its output.
#[derive(Debug, Clone, Copy)]
pub struct SiteJob {
    /// Subdirectory of the variables root holding one directory per site.
    pub variables_subdir: &'static str,
    /// File read inside each site directory.
    pub variables_file: &'static str,
    pub layout: RecordLayout,
    /// Output is written to `<results>/<prefix>_<site>.txt`.
    pub output_prefix: &'static str,
}

impl SiteJob {
    pub fn output_file_name(&self, site: &str) -> String {
        format!("{}_{}.txt", self.output_prefix, site)
    }
}

/// Render `job` for every site, in sorted order.
///
/// The first failing site aborts the generator; files already written for
/// earlier sites stay on disk and are discarded with the working copy.
/// Returns the paths written.
pub fn render_sites(
    generator: &str,
    job: &SiteJob,
    paths: &GenerationPaths,
    renderer: &TemplateRenderer,
) -> Result<Vec<PathBuf>> {
    let sites_root = paths.variables_root.join(job.variables_subdir);
    let template_dir = paths.template_dir(generator);
    std::fs::create_dir_all(&paths.results_root)?;

    let sites = list_sites(&sites_root)?;
    if sites.is_empty() {
        warn!("{}: no sites found under {}", generator, sites_root.display());
        return Ok(Vec::new());
    }

    let mut written = Vec::with_capacity(sites.len());
    for site in &sites {
        let variables = sites_root.join(site).join(job.variables_file);
        let entries = read_entries(&variables, job.layout.field_count())?;
        let context = RenderContext::new(site.as_str(), job.layout, entries);
        let text = renderer.render(&template_dir, TEMPLATE_FILE, &context)?;

        let output = paths.results_root.join(job.output_file_name(site));
        write_output(&output, &text)?;
        info!("{}: wrote {}", generator, output.display());
        written.push(output);
    }
    Ok(written)
}
