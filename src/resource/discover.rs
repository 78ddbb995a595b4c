//! Filesystem discovery of resource role files.
//!
//! The convention is `resources/<name>/<anything>.<role>.<ext>` with
//! role one of `controller`, `router`/`route`, `schema`, `service`. Files
//! that do not match are ignored. Traversal is sorted, so grouping is
//! deterministic across platforms and runs.

use super::types::{ResourceDescriptor, ResourceModule, Role};
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Extract the role token from a file name of the form
/// `<anything>.<role>.<ext>`. Needs at least two dots; the role is the
/// second-to-last segment.
fn role_of(file_name: &str) -> Option<Role> {
    let mut parts = file_name.rsplitn(3, '.');
    let _ext = parts.next()?;
    let role = parts.next()?;
    // A bare `<role>.<ext>` name has no leading <anything> part.
    parts.next()?;
    Role::parse(role)
}

/// Scan `base_dir` and group role files by resource name.
///
/// Each immediate subdirectory of `base_dir` is one resource. A missing or
/// empty tree yields an empty map. When a resource declares the same role
/// twice, the last file in sort order wins and a warning is logged.
pub fn discover(base_dir: &Path) -> anyhow::Result<BTreeMap<String, ResourceDescriptor>> {
    let mut resources = BTreeMap::new();
    if !base_dir.exists() {
        return Ok(resources);
    }

    let mut dirs: Vec<_> = fs::read_dir(base_dir)
        .with_context(|| format!("reading resource dir {}", base_dir.display()))?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .collect();
    dirs.sort_by_key(|e| e.file_name());

    for dir in dirs {
        let name = dir.file_name().to_string_lossy().to_string();
        let mut descriptor = ResourceDescriptor::new(&name);

        let mut files: Vec<_> = fs::read_dir(dir.path())
            .with_context(|| format!("reading resource {}", name))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .collect();
        files.sort_by_key(|e| e.file_name());

        for file in files {
            let file_name = file.file_name().to_string_lossy().to_string();
            let Some(role) = role_of(&file_name) else {
                continue;
            };
            if let Some(previous) = descriptor.roles.insert(role, file.path()) {
                warn!(
                    resource = %name,
                    role = role.as_str(),
                    kept = %file.path().display(),
                    shadowed = %previous.display(),
                    "Duplicate role file, last in sort order wins"
                );
            }
        }

        resources.insert(name, descriptor);
    }

    Ok(resources)
}

/// Compare the on-disk tree against the explicitly registered modules and
/// warn about drift in either direction. Never fails startup.
pub fn cross_check(
    discovered: &BTreeMap<String, ResourceDescriptor>,
    registered: &[ResourceModule],
) {
    for module in registered {
        match discovered.get(&module.name) {
            None => warn!(
                resource = %module.name,
                "Registered resource has no directory on disk"
            ),
            Some(d) if module.router.is_some() && !d.has_router() => warn!(
                resource = %module.name,
                "Registered router has no router file on disk"
            ),
            Some(_) => {}
        }
    }
    for (name, descriptor) in discovered {
        if descriptor.has_router() && !registered.iter().any(|m| m.name == *name) {
            warn!(
                resource = %name,
                "Router file on disk but resource is not registered"
            );
        }
    }
}
