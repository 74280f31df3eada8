//! VTY access lists permitting SSH from the datacenter management ranges.
//!
//! Reads `variables/vty_ACL/<site>/acl_ssh_dc.txt` (`<ip>;<wildcard>` lines)
//! and writes `results/vty_ACL_<site>.txt`.

use std::path::PathBuf;

use crate::error::Result;
use crate::render::{RecordLayout, TemplateRenderer};

use super::site::{render_sites, SiteJob};
use super::{ConfigGenerator, GenerationPaths, GeneratorHandle, GeneratorSpec};

pub const NAME: &str = "vty_acl";

pub const SPEC: GeneratorSpec = GeneratorSpec {
    name: NAME,
    description: "VTY access lists for SSH from datacenter ranges",
    build,
};

const JOB: SiteJob = SiteJob {
    variables_subdir: "vty_ACL",
    variables_file: "acl_ssh_dc.txt",
    layout: RecordLayout {
        collection: "acl_ssh_dc",
        fields: &["ip", "wildcard"],
    },
    output_prefix: "vty_ACL",
};

/// Holds its renderer and paths for the lifetime of the registry.
pub struct VtyAclGenerator {
    paths: GenerationPaths,
    renderer: TemplateRenderer,
}

impl VtyAclGenerator {
    pub fn new(paths: GenerationPaths) -> Self {
        Self {
            paths,
            renderer: TemplateRenderer::new(),
        }
    }

    /// Output path for `site`.
    pub fn output_path(&self, site: &str) -> PathBuf {
        self.paths.results_root.join(JOB.output_file_name(site))
    }
}

impl ConfigGenerator for VtyAclGenerator {
    fn name(&self) -> &str {
        NAME
    }

    fn generate_config(&self) -> Result<()> {
        render_sites(NAME, &JOB, &self.paths, &self.renderer)?;
        Ok(())
    }
}

fn build(paths: &GenerationPaths) -> Result<GeneratorHandle> {
    Ok(Box::new(VtyAclGenerator::new(paths.clone())))
}
