use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

/// The facade crate re-exporting every `vc_*` crate under its short name.
const FACADE_NAME: &str = "vc_persist";
const CRATE_PREFIX: &str = "vc_";

const DEPENDENCY_TABLES: [&str; 2] = ["dependencies", "dev-dependencies"];

/// The caller's Cargo.toml, used to find how a crate is reachable from the
/// code a proc-macro emits.
///
/// # Resolution rules
///
/// For each of `dependencies` then `dev-dependencies`:
///
/// 1. If the requested crate is listed, return `::crate_name`.
/// 2. If the requested crate name begins with `vc_` and the facade crate
///    `vc_persist` is listed, return `::vc_persist::short_name`
///    (e.g. `vc_graph` -> `::vc_persist::graph`).
///
/// Otherwise fall back to `::crate_name`.
///
/// A crate that expands the macro on its own items should declare
/// `extern crate self as crate_name;` so that the fallback resolves.
///
/// # Example
///
/// ```no_run
/// # use vc_macro_utils::Manifest;
/// let path: syn::Path = Manifest::shared(|m| m.get_crate_path("vc_graph"));
/// ```
#[derive(Debug)]
pub struct Manifest {
    manifest: Document<Box<str>>,
    modified_time: SystemTime,
}

impl Manifest {
    #[inline(never)]
    fn manifest_path() -> PathBuf {
        let dir = env::var_os("CARGO_MANIFEST_DIR")
            .expect("CARGO_MANIFEST_DIR should be auto-defined by cargo.");
        let mut path = PathBuf::from(dir);
        path.push("Cargo.toml");
        path
    }

    #[inline(never)]
    fn modified_time(path: &Path) -> SystemTime {
        std::fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .unwrap_or_else(|_| panic!("Unable to stat cargo manifest: {}", path.display()))
    }

    #[inline(never)]
    fn read(path: &Path) -> Document<Box<str>> {
        let text = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("Unable to read cargo manifest: {}", path.display()))
            .into_boxed_str();
        Document::parse(text)
            .unwrap_or_else(|_| panic!("Failed to parse cargo manifest: {}", path.display()))
    }

    fn absolute(segments: &[&str]) -> syn::Path {
        let text: String = segments.iter().map(|s| format!("::{s}")).collect();
        syn::parse_str(&text).unwrap_or_else(|_| panic!("`{text}` is not a valid path"))
    }

    fn find_in(deps: &Table, name: &str) -> Option<syn::Path> {
        if deps.contains_key(name) {
            return Some(Self::absolute(&[name]));
        }
        let short = name.strip_prefix(CRATE_PREFIX)?;
        deps.contains_key(FACADE_NAME)
            .then(|| Self::absolute(&[FACADE_NAME, short]))
    }

    /// Returns how the crate `name` is reached from the caller.
    /// See the type-level documentation for the rules.
    #[inline(never)]
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        DEPENDENCY_TABLES
            .iter()
            .filter_map(|table| match self.manifest.get(table) {
                Some(Item::Table(deps)) => Self::find_in(deps, name),
                _ => None,
            })
            .next()
            .unwrap_or_else(|| Self::absolute(&[name]))
    }

    /// Runs `func` with the caller's manifest.
    ///
    /// Manifests are parsed once and cached until the file changes. Callers
    /// should still resolve a path once per macro invocation.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let path = Self::manifest_path();
        let modified_time = Self::modified_time(&path);

        let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(manifest) = manifests.get(&path)
            && manifest.modified_time == modified_time
        {
            return func(manifest);
        }
        drop(manifests);

        let manifest = Manifest {
            manifest: Self::read(&path),
            modified_time,
        };
        let result = func(&manifest);

        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, manifest);

        result
    }
}
