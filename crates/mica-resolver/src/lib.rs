//! # Mica Resolver
//!
//! Turns a set of module source files into one linked program. The
//! pipeline has four phases:
//!
//! 1. **Graph building** ([`graph`]): starting from the entry path,
//!    parse every transitively imported file concurrently, resolve
//!    specifiers to canonical module keys, and fetch library export
//!    sets from a [`LibraryRegistry`].
//! 2. **Ordering** ([`sort`]): topologically sort the graph so every
//!    module initializes after its dependencies, reporting a concrete
//!    cycle when none exists.
//! 3. **Validation** ([`validate`]): compute each module's export set,
//!    reject duplicate exports, and in strict mode check every import
//!    against the exporting module's set.
//! 4. **Linking** ([`link`]): synthesize a unit function per module and
//!    emit one program that evaluates them in order.
//!
//! [`link_modules`] runs all four phases.

pub mod error;
pub mod graph;
pub mod hoist;
pub mod link;
pub mod mangle;
pub mod paths;
pub mod registry;
pub mod sort;
pub mod table;
pub mod validate;

pub use error::{LinkError, SourceLoc, SyntaxError};
pub use registry::{LibraryBundle, LibraryRegistry, StaticRegistry};
pub use table::{LibraryModule, LocalModule, ModuleKey, ModuleRecord, ModuleTable};
pub use validate::ResolvedModuleTable;

use mica_ast::{FileId, Program};
use std::collections::HashMap;

/// Resolves, orders, validates and links the module graph rooted at
/// `entry`. Returns the linked program together with the
/// initialization order it encodes. All errors are reported at once
/// where the pipeline can continue collecting them; earlier phases
/// fail fast on the first error.
pub async fn link_modules<P, R>(
    files: &HashMap<String, String>,
    entry: &str,
    parse: P,
    registry: &R,
    strict: bool,
) -> Result<(Program, Vec<ModuleKey>), Vec<LinkError>>
where
    P: Fn(&str, FileId) -> Result<Program, SyntaxError>,
    R: LibraryRegistry,
{
    let table = graph::build(files, entry, parse, registry)
        .await
        .map_err(|e| vec![e])?;
    let order = sort::sort(&table).map_err(|e| vec![e])?;
    let resolved = validate::validate(table, &order, strict)?;
    let program = link::link(resolved, &order);
    Ok((program, order))
}
