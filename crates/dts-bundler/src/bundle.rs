//! Rolling one entry's declaration graph into a single chunk.

use crate::module::{Edit, ExportRecord, ModuleRecord, ReferenceKind, DEFAULT_LOCAL};
use crate::resolve::{normalize_path, probe, Resolution, Resolver};
use crate::{
    BundleError, BundledChunk, EntryTable, ExportsMode, ExternalPredicate, FileNamePolicy,
    ModuleFilter, OutputOptions, PathAliases,
};
use camino::{Utf8Path, Utf8PathBuf};
use dts_syntax::ImportBinding;
use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;
use text_edit::EditBuffer;
use tracing::{debug, info};

/// Settings for one bundling run.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Project root; `node_modules` is looked up here.
    pub root: Utf8PathBuf,
    /// Root of the emitted declaration tree.
    pub decl_root: Utf8PathBuf,
    pub external: ExternalPredicate,
    /// Inline the declarations of installed packages that are not external.
    pub respect_external: bool,
    pub aliases: PathAliases,
    pub filter: ModuleFilter,
    pub file_name: FileNamePolicy,
    pub package_name: Option<String>,
    pub output: OutputOptions,
}

impl BundleOptions {
    pub fn new(root: impl Into<Utf8PathBuf>, decl_root: impl Into<Utf8PathBuf>) -> Self {
        let decl_root = decl_root.into();
        Self {
            root: root.into(),
            filter: ModuleFilter::allow_all(decl_root.clone()),
            decl_root,
            external: ExternalPredicate::default(),
            respect_external: false,
            aliases: PathAliases::default(),
            file_name: FileNamePolicy::default(),
            package_name: None,
            output: OutputOptions::default(),
        }
    }
}

pub struct Bundler {
    options: BundleOptions,
}

impl Bundler {
    pub fn new(options: BundleOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BundleOptions {
        &self.options
    }

    /// Output file name for every entry, rejecting collisions.
    pub fn file_names(&self, entries: &EntryTable) -> Result<IndexMap<String, String>, BundleError> {
        let mut names = IndexMap::new();
        let mut owners: IndexMap<String, Vec<String>> = IndexMap::new();
        for entry in entries.keys() {
            let file_name = self.options.file_name.file_name(
                entry,
                entries.len(),
                self.options.package_name.as_deref(),
            );
            owners.entry(file_name.clone()).or_default().push(entry.clone());
            names.insert(entry.clone(), file_name);
        }
        if let Some((file_name, entries)) = owners.into_iter().find(|(_, e)| e.len() > 1) {
            return Err(BundleError::DuplicateFileName { file_name, entries });
        }
        Ok(names)
    }

    /// Bundles every entry, keyed by output file name in entry order.
    ///
    /// Entries are bundled in parallel; the first failure fails the run.
    pub fn bundle(&self, entries: &EntryTable) -> Result<IndexMap<String, BundledChunk>, BundleError> {
        let file_names = self.file_names(entries)?;
        let jobs: Vec<(&String, &Utf8PathBuf, &String)> = entries
            .iter()
            .zip(file_names.values())
            .map(|((name, path), file_name)| (name, path, file_name))
            .collect();

        let chunks = jobs
            .par_iter()
            .map(|(name, path, file_name)| self.bundle_entry(name, path, file_name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(chunks
            .into_iter()
            .map(|chunk| (chunk.file_name.clone(), chunk))
            .collect())
    }

    pub fn bundle_entry(
        &self,
        name: &str,
        entry: &Utf8Path,
        file_name: &str,
    ) -> Result<BundledChunk, BundleError> {
        let graph = self.load(entry)?;
        info!(
            entry = name,
            modules = graph.order.len(),
            "bundling declarations"
        );
        let mut linker = Linker::new(&graph);
        let output = linker.link()?;

        check_exports_mode(name, self.options.output.exports, &output)?;

        Ok(BundledChunk {
            name: name.to_string(),
            file_name: file_name.to_string(),
            code: output.code,
            is_entry: true,
            facade_module_id: Some(graph.modules[0].path.clone()),
            module_ids: graph
                .order
                .iter()
                .map(|&idx| graph.modules[idx].path.clone())
                .collect(),
            exports: output.exports,
        })
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver {
            decl_root: &self.options.decl_root,
            aliases: &self.options.aliases,
            external: &self.options.external,
            filter: &self.options.filter,
            node_modules: None,
        }
    }

    fn load(&self, entry: &Utf8Path) -> Result<Graph, BundleError> {
        let node_modules = self.options.root.join("node_modules");
        let mut resolver = self.resolver();
        if self.options.respect_external {
            resolver.node_modules = Some(&node_modules);
        }

        let mut graph = Graph::default();
        graph.intern(normalize_path(entry))?;

        let mut next = 0;
        while next < graph.modules.len() {
            let record = &graph.modules[next];
            let importer = record.path.clone();
            let specifiers: Vec<String> = record.specifiers().map(str::to_string).collect();
            let paths: Vec<String> = record
                .references
                .iter()
                .filter(|r| r.kind == ReferenceKind::Path)
                .map(|r| r.value.clone())
                .collect();

            let mut targets = FxHashMap::default();
            for specifier in specifiers {
                if targets.contains_key(&specifier) {
                    continue;
                }
                let target = match resolver.resolve(&specifier, &importer)? {
                    Resolution::Local(path) => Target::Module(graph.intern(path)?),
                    Resolution::External => {
                        debug!(specifier = %specifier, importer = %importer, "keeping external import");
                        Target::External
                    }
                    Resolution::Stub(_) => Target::Stub,
                };
                targets.insert(specifier, target);
            }

            let mut referenced = Vec::new();
            for value in paths {
                let base = importer.parent().unwrap_or(&self.options.decl_root);
                let found = probe(&normalize_path(&base.join(&value))).ok_or_else(|| {
                    BundleError::Unresolved {
                        specifier: value.clone(),
                        importer: importer.clone(),
                    }
                })?;
                if self.options.filter.includes(&found) {
                    referenced.push(graph.intern(found)?);
                } else {
                    debug!(path = %found, "referenced file excluded");
                }
            }

            graph.targets.push(targets);
            graph.referenced.push(referenced);
            next += 1;
        }

        graph.order = graph.post_order();
        Ok(graph)
    }
}

fn check_exports_mode(entry: &str, mode: ExportsMode, output: &LinkOutput) -> Result<(), BundleError> {
    let reason = match mode {
        ExportsMode::Default if output.exports != ["default"] || output.has_star => {
            Some("it must export exactly a default export")
        }
        ExportsMode::None if !output.exports.is_empty() || output.has_star => {
            Some("it has exports")
        }
        _ => None,
    };
    match reason {
        Some(reason) => Err(BundleError::ExportsMode {
            entry: entry.to_string(),
            mode,
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Module(usize),
    External,
    Stub,
}

/// The modules reachable from an entry. Module 0 is the entry.
#[derive(Default)]
struct Graph {
    modules: Vec<ModuleRecord>,
    index: FxHashMap<Utf8PathBuf, usize>,
    targets: Vec<FxHashMap<String, Target>>,
    /// `/// <reference path>` dependencies.
    referenced: Vec<Vec<usize>>,
    /// Dependencies first, entry last.
    order: Vec<usize>,
}

impl Graph {
    fn intern(&mut self, path: Utf8PathBuf) -> Result<usize, BundleError> {
        if let Some(&idx) = self.index.get(&path) {
            return Ok(idx);
        }
        let record = ModuleRecord::read(&path)?;
        let idx = self.modules.len();
        self.modules.push(record);
        self.index.insert(path, idx);
        Ok(idx)
    }

    fn target(&self, module: usize, specifier: &str) -> Target {
        self.targets[module]
            .get(specifier)
            .copied()
            .unwrap_or(Target::External)
    }

    fn dependencies(&self, module: usize) -> Vec<usize> {
        let record = &self.modules[module];
        let mut deps: Vec<usize> = self.referenced[module].clone();
        for specifier in record.specifiers() {
            if let Target::Module(dep) = self.target(module, specifier) {
                if !deps.contains(&dep) {
                    deps.push(dep);
                }
            }
        }
        deps
    }

    fn post_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.modules.len());
        let mut seen = FxHashSet::default();
        // (module, dependencies expanded)
        let mut stack = vec![(0, false)];
        while let Some((module, expanded)) = stack.pop() {
            if expanded {
                order.push(module);
                continue;
            }
            if !seen.insert(module) {
                continue;
            }
            stack.push((module, true));
            for dep in self.dependencies(module).into_iter().rev() {
                if !seen.contains(&dep) {
                    stack.push((dep, false));
                }
            }
        }
        order
    }
}

/// What a name refers to once imports are followed to their source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Binding {
    Local { module: usize, name: String },
    External { specifier: String, imported: String },
    /// The namespace object of an inlined module.
    Namespace(usize),
    /// A name imported into `module` from an excluded module. Declared as
    /// `any` when the chunk still refers to it.
    Stubbed { module: usize, name: String },
}

type Exports = Rc<IndexMap<String, Binding>>;

struct LinkOutput {
    code: String,
    exports: Vec<String>,
    has_star: bool,
}

struct Linker<'g> {
    graph: &'g Graph,
    exports: FxHashMap<usize, Exports>,
    in_progress: FxHashSet<usize>,
    names: IndexMap<Binding, String>,
    used: FxHashSet<String>,
}

impl<'g> Linker<'g> {
    fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            exports: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            names: IndexMap::new(),
            used: FxHashSet::default(),
        }
    }

    fn link(&mut self) -> Result<LinkOutput, BundleError> {
        let graph = self.graph;
        self.allocate()?;

        let mut bodies = Vec::with_capacity(graph.order.len());
        for &module in &graph.order {
            bodies.push(self.rewrite(module)?);
        }

        let entry_exports = self.exports_of(0)?;
        let mut export_specifiers = Vec::with_capacity(entry_exports.len());
        for (exported, binding) in entry_exports.iter() {
            let local = self.name_of(binding);
            export_specifiers.push(specifier(&local, exported));
        }
        let namespaces = self.namespace_objects()?;
        let stubs = self.stub_declarations();

        let mut out = String::new();
        let mut directives = IndexSet::new();
        for &module in &graph.order {
            for reference in &graph.modules[module].references {
                if reference.kind != ReferenceKind::Path {
                    directives.insert(reference.directive());
                }
            }
        }
        for directive in &directives {
            out.push_str(directive);
            out.push('\n');
        }
        for import in self.external_imports() {
            out.push_str(&import);
            out.push('\n');
        }
        for import in self.side_effect_imports() {
            out.push_str(&format!("import \"{import}\";\n"));
        }
        let stars = self.external_stars(0, &mut FxHashSet::default());
        for star in &stars {
            out.push_str(&format!("export * from \"{star}\";\n"));
        }
        for stub in &stubs {
            out.push_str(stub);
        }
        for body in &bodies {
            let body = body.trim();
            if !body.is_empty() {
                out.push_str(body);
                out.push('\n');
            }
        }
        for namespace in &namespaces {
            out.push_str(namespace);
        }
        if export_specifiers.is_empty() {
            out.push_str("export {};\n");
        } else {
            out.push_str(&format!("export {{ {} }};\n", export_specifiers.join(", ")));
        }
        if let Some(global) = &graph.modules[0].global_name {
            out.push_str(&format!("export as namespace {global};\n"));
        }

        Ok(LinkOutput {
            code: out,
            exports: entry_exports.keys().cloned().collect(),
            has_star: !stars.is_empty(),
        })
    }

    /// Reserves chunk-wide names, entry module first.
    fn allocate(&mut self) -> Result<(), BundleError> {
        let graph = self.graph;
        let order = std::iter::once(0).chain(graph.order.iter().copied().filter(|&m| m != 0));
        for module in order.collect::<Vec<_>>() {
            let record = &graph.modules[module];
            for import in &record.imports {
                for binding in &import.bindings {
                    if let Some(resolved) = self.import_target(module, &import.specifier, binding)? {
                        if matches!(resolved, Binding::External { .. } | Binding::Namespace(_)) {
                            self.assign(resolved, binding.local());
                        }
                    }
                }
            }
            for name in &record.declared {
                self.assign(
                    Binding::Local {
                        module,
                        name: name.clone(),
                    },
                    name,
                );
            }
        }
        Ok(())
    }

    fn assign(&mut self, binding: Binding, preferred: &str) -> String {
        if let Some(name) = self.names.get(&binding) {
            return name.clone();
        }
        let mut candidate = preferred.to_string();
        let mut suffix = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{preferred}${suffix}");
            suffix += 1;
        }
        self.used.insert(candidate.clone());
        self.names.insert(binding, candidate.clone());
        candidate
    }

    fn name_of(&mut self, binding: &Binding) -> String {
        if let Some(name) = self.names.get(binding) {
            return name.clone();
        }
        let preferred = match binding {
            Binding::Local { name, .. } => name.clone(),
            Binding::External { imported, specifier } => match imported.as_str() {
                "*" | "default" => identifier_from(specifier),
                _ => imported.clone(),
            },
            Binding::Namespace(module) => identifier_from(self.graph.modules[*module].path.as_str()),
            Binding::Stubbed { name, .. } => name.clone(),
        };
        self.assign(binding.clone(), &preferred)
    }

    /// What `local` means at the top level of `module`.
    fn scope(&mut self, module: usize, local: &str) -> Result<Option<Binding>, BundleError> {
        let graph = self.graph;
        let record = &graph.modules[module];
        if record.declared.iter().any(|name| name == local) {
            return Ok(Some(Binding::Local {
                module,
                name: local.to_string(),
            }));
        }
        for import in &record.imports {
            if let Some(binding) = import.bindings.iter().find(|b| b.local() == local) {
                return self.import_target(module, &import.specifier, binding);
            }
        }
        Ok(None)
    }

    fn import_target(
        &mut self,
        module: usize,
        specifier: &str,
        binding: &ImportBinding,
    ) -> Result<Option<Binding>, BundleError> {
        let imported = match binding {
            ImportBinding::Named { imported, .. } => imported.as_str(),
            ImportBinding::Default { .. } => "default",
            ImportBinding::Namespace { .. } => "*",
        };
        match self.graph.target(module, specifier) {
            Target::Stub => Ok(Some(Binding::Stubbed {
                module,
                name: binding.local().to_string(),
            })),
            Target::External => Ok(Some(Binding::External {
                specifier: specifier.to_string(),
                imported: imported.to_string(),
            })),
            Target::Module(dep) if imported == "*" => Ok(Some(Binding::Namespace(dep))),
            Target::Module(dep) => self.export_of(dep, imported).map(Some),
        }
    }

    fn export_of(&mut self, module: usize, name: &str) -> Result<Binding, BundleError> {
        self.exports_of(module)?
            .get(name)
            .cloned()
            .ok_or_else(|| BundleError::MissingExport {
                name: name.to_string(),
                module: self.graph.modules[module].path.clone(),
            })
    }

    fn exports_of(&mut self, module: usize) -> Result<Exports, BundleError> {
        if let Some(exports) = self.exports.get(&module) {
            return Ok(exports.clone());
        }
        if !self.in_progress.insert(module) {
            return Ok(Exports::default());
        }

        let graph = self.graph;
        let mut map = IndexMap::new();
        let mut stars = Vec::new();
        for export in &graph.modules[module].exports {
            match export {
                ExportRecord::Local { exported, local } => {
                    let binding = self.scope(module, local)?.unwrap_or(Binding::Local {
                        module,
                        name: local.clone(),
                    });
                    map.insert(exported.clone(), binding);
                }
                ExportRecord::From {
                    specifier,
                    imported,
                    exported,
                } => match graph.target(module, specifier) {
                    Target::Stub => {}
                    Target::External => {
                        map.insert(
                            exported.clone(),
                            Binding::External {
                                specifier: specifier.clone(),
                                imported: imported.clone(),
                            },
                        );
                    }
                    Target::Module(dep) => {
                        let binding = self.export_of(dep, imported)?;
                        map.insert(exported.clone(), binding);
                    }
                },
                ExportRecord::StarAs { specifier, exported } => {
                    match graph.target(module, specifier) {
                        Target::Stub => {}
                        Target::External => {
                            map.insert(
                                exported.clone(),
                                Binding::External {
                                    specifier: specifier.clone(),
                                    imported: "*".into(),
                                },
                            );
                        }
                        Target::Module(dep) => {
                            map.insert(exported.clone(), Binding::Namespace(dep));
                        }
                    }
                }
                ExportRecord::Star { specifier } => stars.push(specifier),
            }
        }
        for specifier in stars {
            if let Target::Module(dep) = graph.target(module, specifier) {
                for (name, binding) in self.exports_of(dep)?.iter() {
                    if name != "default" && !map.contains_key(name) {
                        map.insert(name.clone(), binding.clone());
                    }
                }
            }
        }

        self.in_progress.remove(&module);
        let exports = Rc::new(map);
        self.exports.insert(module, exports.clone());
        Ok(exports)
    }

    /// `export * from` targets outside the chunk, followed through inlined
    /// modules.
    fn external_stars(&self, module: usize, seen: &mut FxHashSet<usize>) -> Vec<String> {
        let mut stars = Vec::new();
        if !seen.insert(module) {
            return stars;
        }
        for export in &self.graph.modules[module].exports {
            let ExportRecord::Star { specifier } = export else {
                continue;
            };
            match self.graph.target(module, specifier) {
                Target::External => stars.push(specifier.clone()),
                Target::Module(dep) => stars.extend(self.external_stars(dep, seen)),
                Target::Stub => {}
            }
        }
        stars.dedup();
        stars
    }

    fn rewrite(&mut self, module: usize) -> Result<String, BundleError> {
        let graph = self.graph;
        let record = &graph.modules[module];
        let mut buffer = EditBuffer::new(&record.source);
        for edit in &record.edits {
            match edit {
                Edit::Remove(range) => buffer.remove(range.start, range.end)?,
                Edit::Replace(range, text) => buffer.overwrite(range.start, range.end, text.clone())?,
            }
        }
        if let Some(at) = record.default_name_at {
            let name = self.name_of(&Binding::Local {
                module,
                name: DEFAULT_LOCAL.to_string(),
            });
            buffer.insert(at, format!(" {name}"))?;
        }
        for occurrence in &record.occurrences {
            let Some(binding) = self.scope(module, &occurrence.name)? else {
                continue;
            };
            let name = self.name_of(&binding);
            if name != occurrence.name {
                buffer.overwrite(occurrence.range.start, occurrence.range.end, name)?;
            }
        }
        for import_type in &record.import_types {
            let binding = match (graph.target(module, &import_type.specifier), &import_type.member) {
                (Target::External, _) => continue,
                (Target::Module(dep), Some(member)) => self.export_of(dep, member)?,
                (Target::Module(dep), None) => Binding::Namespace(dep),
                (Target::Stub, member) => Binding::Stubbed {
                    module,
                    name: member
                        .clone()
                        .unwrap_or_else(|| identifier_from(&import_type.specifier)),
                },
            };
            let name = self.name_of(&binding);
            buffer.overwrite(import_type.range.start, import_type.range.end, name)?;
        }
        Ok(buffer.finish())
    }

    /// `declare namespace` blocks for every namespace object in use,
    /// including ones only reachable from other namespace objects.
    fn namespace_objects(&mut self) -> Result<Vec<String>, BundleError> {
        let mut blocks = Vec::new();
        let mut done = FxHashSet::default();
        loop {
            let pending: Vec<(usize, String)> = self
                .names
                .iter()
                .filter_map(|(binding, name)| match binding {
                    Binding::Namespace(module) if !done.contains(module) => {
                        Some((*module, name.clone()))
                    }
                    _ => None,
                })
                .collect();
            if pending.is_empty() {
                break;
            }
            for (module, name) in pending {
                done.insert(module);
                let exports = self.exports_of(module)?;
                let mut members = Vec::with_capacity(exports.len());
                for (exported, binding) in exports.iter() {
                    let local = self.name_of(binding);
                    members.push(specifier(&local, exported));
                }
                blocks.push(format!(
                    "declare namespace {name} {{\n  export {{ {} }};\n}}\n",
                    members.join(", ")
                ));
            }
        }
        Ok(blocks)
    }

    /// `any` placeholders for the stubbed names the chunk refers to.
    fn stub_declarations(&self) -> Vec<String> {
        self.names
            .iter()
            .filter(|(binding, _)| matches!(binding, Binding::Stubbed { .. }))
            .map(|(_, name)| {
                debug!(name = %name, "declaring excluded binding as any");
                format!("type {name} = any;\ndeclare const {name}: any;\n")
            })
            .collect()
    }

    /// External modules imported only for their side effects, in graph
    /// order, unless a binding import already loads them.
    fn side_effect_imports(&self) -> Vec<String> {
        let graph = self.graph;
        let bound: FxHashSet<&str> = self
            .names
            .keys()
            .filter_map(|binding| match binding {
                Binding::External { specifier, .. } => Some(specifier.as_str()),
                _ => None,
            })
            .collect();
        let mut imports = IndexSet::new();
        for &module in &graph.order {
            for import in &graph.modules[module].imports {
                if import.side_effect
                    && graph.target(module, &import.specifier) == Target::External
                    && !bound.contains(import.specifier.as_str())
                {
                    imports.insert(import.specifier.clone());
                }
            }
        }
        imports.into_iter().collect()
    }

    /// One import statement per external module and binding shape.
    fn external_imports(&self) -> Vec<String> {
        #[derive(Default)]
        struct Group {
            default: Option<String>,
            named: Vec<String>,
            namespaces: Vec<String>,
        }
        let mut groups: IndexMap<&str, Group> = IndexMap::new();
        for (binding, name) in &self.names {
            let Binding::External { specifier, imported } = binding else {
                continue;
            };
            let group = groups.entry(specifier.as_str()).or_default();
            match imported.as_str() {
                "*" => group.namespaces.push(name.clone()),
                "default" if group.default.is_none() => group.default = Some(name.clone()),
                _ => group.named.push(specifier_of(imported, name)),
            }
        }

        let mut lines = Vec::new();
        for (specifier, group) in groups {
            let mut clause = Vec::new();
            if let Some(default) = group.default {
                clause.push(default);
            }
            if !group.named.is_empty() {
                clause.push(format!("{{ {} }}", group.named.join(", ")));
            }
            if !clause.is_empty() {
                lines.push(format!("import {} from \"{specifier}\";", clause.join(", ")));
            }
            for namespace in group.namespaces {
                lines.push(format!("import * as {namespace} from \"{specifier}\";"));
            }
        }
        lines
    }
}

/// `local as exported`, or just the name when both agree.
fn specifier(local: &str, exported: &str) -> String {
    if local == exported {
        local.to_string()
    } else {
        format!("{local} as {exported}")
    }
}

/// `imported as local` for an import clause.
fn specifier_of(imported: &str, local: &str) -> String {
    if imported == local {
        local.to_string()
    } else {
        format!("{imported} as {local}")
    }
}

/// A valid identifier derived from a path or package name.
fn identifier_from(path: &str) -> String {
    let stem = path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && *segment != "index.d.ts")
        .unwrap_or(path);
    let stem = stem.split('.').next().unwrap_or(stem);
    let mut ident: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_from() {
        assert_eq!(identifier_from("/decl/src/utils.d.ts"), "utils");
        assert_eq!(identifier_from("/decl/src/dir/index.d.ts"), "dir");
        assert_eq!(identifier_from("@scope/some-pkg"), "some_pkg");
        assert_eq!(identifier_from("3d"), "_3d");
    }

    #[test]
    fn test_specifiers() {
        assert_eq!(specifier("a", "a"), "a");
        assert_eq!(specifier("a$1", "a"), "a$1 as a");
        assert_eq!(specifier_of("ref", "ref$1"), "ref as ref$1");
    }
}
