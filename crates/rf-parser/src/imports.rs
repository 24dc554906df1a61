//! Transitive resolution of `Resource` imports.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::model::RobotFile;
use crate::parser::RobotParser;
use crate::ParseError;

/// Failure to load one resource file.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Resource file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported resource file extension: {0}")]
    UnsupportedExtension(PathBuf),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// A `Resource` import linked to the parsed file it names.
#[derive(Debug, Clone)]
pub struct ResourceImportReference {
    /// The path as written in the settings table.
    pub import_path: String,
    pub path: PathBuf,
    pub file: Rc<RobotFile>,
    /// Imports of the imported file. Empty where a cycle or the depth limit
    /// stopped resolution. Shared by every import of the same file.
    pub nested: Rc<Vec<ResourceImportReference>>,
}

impl ResourceImportReference {
    /// File name without extension, the prefix used in `resource.Keyword`.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// This reference and all nested ones, depth first.
    pub fn flatten(&self) -> Vec<&ResourceImportReference> {
        let mut all = vec![self];
        for nested in self.nested.iter() {
            all.extend(nested.flatten());
        }
        all
    }
}

/// Loads resource files with a cache shared across imports.
pub struct ResourceImporter<'a> {
    parser: &'a RobotParser,
    cache: HashMap<PathBuf, Rc<RobotFile>>,
    resolved: HashMap<PathBuf, Rc<Vec<ResourceImportReference>>>,
    in_progress: Vec<PathBuf>,
}

impl<'a> ResourceImporter<'a> {
    pub fn new(parser: &'a RobotParser) -> Self {
        Self {
            parser,
            cache: HashMap::new(),
            resolved: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// Resolve the resource imports of a file, relative to `base_dir`.
    ///
    /// Imports that cannot be loaded are logged and left out.
    pub fn resolve(&mut self, file: &RobotFile, base_dir: &Path) -> Vec<ResourceImportReference> {
        if !self.parser.config().resolve_resources {
            return Vec::new();
        }
        if let Some(path) = file.path() {
            self.in_progress.push(canonical(path));
        }
        let references = self.resolve_imports(file, base_dir, 1);
        if file.path().is_some() {
            self.in_progress.pop();
        }
        references
    }

    /// Load one resource file, parsing it at most once.
    pub fn load(&mut self, path: &Path) -> Result<Rc<RobotFile>, ImportError> {
        let key = canonical(path);
        if let Some(file) = self.cache.get(&key) {
            return Ok(Rc::clone(file));
        }
        if !path.is_file() {
            return Err(ImportError::NotFound(path.to_path_buf()));
        }
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !self.parser.config().accepts_extension(extension) {
            return Err(ImportError::UnsupportedExtension(path.to_path_buf()));
        }
        let file = self
            .parser
            .parse_file(path)
            .map_err(|source| ImportError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let file = Rc::new(file);
        self.cache.insert(key, Rc::clone(&file));
        Ok(file)
    }

    fn resolve_imports(
        &mut self,
        file: &RobotFile,
        base_dir: &Path,
        depth: usize,
    ) -> Vec<ResourceImportReference> {
        let mut references = Vec::new();
        for import_path in file.resource_paths() {
            let path = resolve_import_path(base_dir, &import_path);
            match self.load(&path) {
                Ok(imported) => {
                    let nested = self.resolve_nested(&imported, &path, depth);
                    references.push(ResourceImportReference {
                        import_path,
                        path,
                        file: imported,
                        nested,
                    });
                }
                Err(e) => log::warn!("{}: {e}", file.display_path()),
            }
        }
        references
    }

    fn resolve_nested(
        &mut self,
        imported: &RobotFile,
        path: &Path,
        depth: usize,
    ) -> Rc<Vec<ResourceImportReference>> {
        let key = canonical(path);
        if self.in_progress.contains(&key) {
            log::warn!("Cyclic resource import of {}", path.display());
            return Rc::default();
        }
        if depth >= self.parser.config().max_import_depth {
            log::warn!(
                "Resource import depth {} reached at {}",
                self.parser.config().max_import_depth,
                path.display()
            );
            return Rc::default();
        }
        if let Some(nested) = self.resolved.get(&key) {
            return Rc::clone(nested);
        }
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.in_progress.push(key.clone());
        let nested = Rc::new(self.resolve_imports(imported, &base_dir, depth + 1));
        self.in_progress.pop();
        self.resolved.insert(key, Rc::clone(&nested));
        nested
    }
}

/// Path of an import relative to the importing file's directory.
pub fn resolve_import_path(base_dir: &Path, import_path: &str) -> PathBuf {
    let expanded = import_path
        .replace("${CURDIR}", &base_dir.to_string_lossy())
        .replace("${/}", std::path::MAIN_SEPARATOR_STR);
    let path = Path::new(&expanded);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
