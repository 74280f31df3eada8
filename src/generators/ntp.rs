//! NTP server lists.
//!
//! Stateless: a plain function wrapped in [`FnGenerator`]. Reads
//! `variables/ntp_servers/<site>/ntp_servers.txt` (`<ip>;<priority>` lines)
//! and writes `results/NTP_servers_<site>.txt`.

use crate::error::Result;
use crate::render::{RecordLayout, TemplateRenderer};

use super::site::{render_sites, SiteJob};
use super::{FnGenerator, GenerationPaths, GeneratorHandle, GeneratorSpec};

pub const NAME: &str = "ntp";

pub const SPEC: GeneratorSpec = GeneratorSpec {
    name: NAME,
    description: "NTP server configuration",
    build,
};

const JOB: SiteJob = SiteJob {
    variables_subdir: "ntp_servers",
    variables_file: "ntp_servers.txt",
    layout: RecordLayout {
        collection: "ntp_servers",
        fields: &["ip", "priority"],
    },
    output_prefix: "NTP_servers",
};

pub fn generate_config(paths: &GenerationPaths) -> Result<()> {
    render_sites(NAME, &JOB, paths, &TemplateRenderer::new())?;
    Ok(())
}

fn build(paths: &GenerationPaths) -> Result<GeneratorHandle> {
    let paths = paths.clone();
    Ok(Box::new(FnGenerator::new(NAME, move || generate_config(&paths))))
}
