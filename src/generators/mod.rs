//! # Generators
//!
//! A generator produces one family of device configs (VTY ACLs, NTP servers)
//! for every site found in the variables tree. All generators share one
//! capability, [`ConfigGenerator::generate_config`], which writes output
//! files and returns nothing else.
//!
//! ## Registry
//!
//! The set of generators is a static, ordered list ([`BUILTIN`]). At the
//! start of a run the [`GeneratorRegistry`] walks that list and builds each
//! generator whose template directory is usable. A generator that cannot be
//! built is skipped with a warning; so is a template directory that no
//! registered generator claims. Neither stops the run, and an empty registry
//! simply means there is nothing to generate.
//!
//! Two shapes of generator exist side by side:
//! - stateful ones, built once per registry (see [`vty_acl`])
//! - stateless functions wrapped in [`FnGenerator`] (see [`ntp`])

pub mod ntp;
pub mod site;
pub mod vty_acl;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::Settings;
use crate::error::Result;

/// Name of the template file inside each generator's template directory.
pub const TEMPLATE_FILE: &str = "template.hbs";

/// Capability shared by every generator.
pub trait ConfigGenerator: Send + Sync {
    /// Identifier used in logs and in wrapped errors.
    fn name(&self) -> &str;

    /// Render and write this generator's output for every site.
    fn generate_config(&self) -> Result<()>;
}

/// A generator as held by the registry.
pub type GeneratorHandle = Box<dyn ConfigGenerator>;

/// Filesystem locations a generator reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPaths {
    /// Root of the per-generator variables trees inside the clone.
    pub variables_root: PathBuf,
    /// Directory receiving rendered output inside the clone.
    pub results_root: PathBuf,
    /// Plugin root holding one template directory per generator.
    pub templates_root: PathBuf,
}

impl GenerationPaths {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            variables_root: settings.variables_path(),
            results_root: settings.results_path(),
            templates_root: settings.templates_root.clone(),
        }
    }

    pub fn template_dir(&self, generator: &str) -> PathBuf {
        self.templates_root.join(generator)
    }
}

/// A stateless generator backed by a function.
pub struct FnGenerator {
    name: String,
    run: Box<dyn Fn() -> Result<()> + Send + Sync>,
}

impl FnGenerator {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(run),
        }
    }
}

impl ConfigGenerator for FnGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate_config(&self) -> Result<()> {
        (self.run)()
    }
}

impl fmt::Debug for FnGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnGenerator").field("name", &self.name).finish()
    }
}

/// Static description of a generator known at compile time.
#[derive(Clone, Copy)]
pub struct GeneratorSpec {
    /// Generator name; also the name of its template directory.
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn(&GenerationPaths) -> Result<GeneratorHandle>,
}

impl fmt::Debug for GeneratorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorSpec").field("name", &self.name).finish()
    }
}

/// Every generator this build knows about, in execution order.
pub const BUILTIN: &[GeneratorSpec] = &[vty_acl::SPEC, ntp::SPEC];

/// Why a generator is not usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Ready,
    Unavailable(String),
}

/// Check that the template directory for `spec` holds a template file.
pub fn availability(spec: &GeneratorSpec, paths: &GenerationPaths) -> Availability {
    let dir = paths.template_dir(spec.name);
    if !dir.is_dir() {
        return Availability::Unavailable(format!("template directory {} not found", dir.display()));
    }
    let template = dir.join(TEMPLATE_FILE);
    if !template.is_file() {
        return Availability::Unavailable(format!("{} not found", template.display()));
    }
    Availability::Ready
}

/// The generators usable for one run, in registration order.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: Vec<GeneratorHandle>,
}

impl GeneratorRegistry {
    /// Build every usable generator from [`BUILTIN`].
    pub fn discover(settings: &Settings) -> Self {
        Self::discover_from(BUILTIN, &GenerationPaths::from_settings(settings))
    }

    /// Build every usable generator from `specs`.
    pub fn discover_from(specs: &[GeneratorSpec], paths: &GenerationPaths) -> Self {
        let mut generators = Vec::new();

        for spec in specs {
            if let Availability::Unavailable(reason) = availability(spec, paths) {
                warn!("Skipping generator {}: {}", spec.name, reason);
                continue;
            }
            match (spec.build)(paths) {
                Ok(generator) => {
                    debug!("Registered generator {}", spec.name);
                    generators.push(generator);
                }
                Err(e) => warn!("Skipping generator {}: {}", spec.name, e),
            }
        }

        for orphan in unclaimed_template_dirs(specs, &paths.templates_root) {
            warn!(
                "Template directory {} has no registered generator, ignoring",
                orphan.display()
            );
        }

        if generators.is_empty() {
            warn!(
                "No generators available under {}; nothing will be generated",
                paths.templates_root.display()
            );
        } else {
            info!("Loaded {} generator(s)", generators.len());
        }

        Self { generators }
    }

    pub fn from_generators(generators: Vec<GeneratorHandle>) -> Self {
        Self { generators }
    }

    pub fn generators(&self) -> &[GeneratorHandle] {
        &self.generators
    }

    pub fn names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("generators", &self.names())
            .finish()
    }
}

// Directories under the plugin root that no spec claims. Names starting
// with `_` or `.` are treated as private and skipped silently.
fn unclaimed_template_dirs(specs: &[GeneratorSpec], templates_root: &Path) -> Vec<PathBuf> {
    let Ok(read_dir) = fs::read_dir(templates_root) else {
        return Vec::new();
    };
    let mut orphans: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            !name.starts_with('_')
                && !name.starts_with('.')
                && !specs.iter().any(|spec| spec.name == name)
        })
        .map(|entry| entry.path())
        .collect();
    orphans.sort();
    orphans
}
