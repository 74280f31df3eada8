//! # confgen
//!
//! This library generates per-site network device configuration from
//! variables kept in a git repository, and publishes the result back to the
//! branches it was generated for. It backs the `confgen` command-line tool
//! and its webhook listener.
//!
//! ## Quick Example
//!
//! ```
//! use std::path::Path;
//! use confgen::render::{RecordLayout, RenderContext, TemplateRenderer};
//! use confgen::variables::parse_entries;
//!
//! let entries = parse_entries(
//!     "10.0.0.1;0.0.0.7\n# dc1\n\n10.0.0.2;0.0.0.3\n",
//!     Path::new("acl_ssh_dc.txt"),
//!     2,
//! )
//! .unwrap();
//! assert_eq!(entries.len(), 2);
//!
//! let layout = RecordLayout { collection: "entries", fields: &["ip", "wildcard"] };
//! let context = RenderContext::new("HQ", layout, entries);
//! let output = TemplateRenderer::new()
//!     .render_str("inline", "{{#each entries}}{{ip}} {{wildcard}}\n{{/each}}", &context.to_value())
//!     .unwrap();
//! assert_eq!(output, "10.0.0.1 0.0.0.7\n10.0.0.2 0.0.0.3\n");
//! ```
//!
//! ## Core Concepts
//!
//! - **Settings (`config`)**: the YAML configuration, loaded once at start
//!   and passed by reference everywhere else.
//! - **Variables (`variables`)**: `;`-separated per-site records, validated
//!   strictly; one bad line rejects the file.
//! - **Rendering (`render`)**: strict Handlebars templates with normalized
//!   output.
//! - **Generators (`generators`)**: the static registry of config families,
//!   each exposing `generate_config()`.
//! - **Repository access (`git`, `repository`, `branches`)**: clone/sync,
//!   branch enumeration, checkout, commit and push through the system `git`.
//! - **Runs (`orchestrator`, `lock`, `worker`, `webhook`)**: one run per
//!   trigger, branch failures isolated, working copy always removed.
//!
//! ## Execution Flow
//!
//! 1. **Sync**: clone or update the variables repository.
//! 2. **Enumerate**: list the remote branches matching `candidate*`.
//! 3. **Generate**: for each branch, check it out and run every generator.
//! 4. **Publish**: commit and push the branch if its output changed.
//! 5. **Report**: fold per-branch failures into one aggregate error.
//! 6. **Cleanup**: remove the working copy, whatever happened.

pub mod branches;
pub mod config;
pub mod defaults;
pub mod error;
pub mod generators;
pub mod git;
pub mod lock;
pub mod orchestrator;
pub mod render;
pub mod repository;
pub mod variables;
pub mod webhook;
pub mod worker;

#[cfg(test)]
mod variables_proptest;
