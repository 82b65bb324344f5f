//! The project being built.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// A small Kotlin + Java project laid out under one root directory.
///
/// ```text
/// <root>/src/        sources (.java, .kt)
/// <root>/libs/       jar dependencies
/// <root>/build/      classes/, classes.dex
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    name: String,
    root: PathBuf,
    active_file: PathBuf,
    active_source: String,
}

impl Project {
    /// Creates a project rooted at `root`.
    ///
    /// The active file defaults to `src/Main.java` with an empty buffer.
    #[must_use]
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            name: name.into(),
            active_file: root.join("src").join("Main.java"),
            root,
            active_source: String::new(),
        }
    }

    /// Sets the file open in the editor and its current buffer text.
    #[must_use]
    pub fn with_active_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.active_file = path.into();
        self.active_source = text.into();
        self
    }

    /// Replaces the buffer text of the active file.
    pub fn set_active_source(&mut self, text: impl Into<String>) {
        self.active_source = text.into();
    }

    /// Returns the project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of the file open in the editor.
    #[must_use]
    pub fn active_file(&self) -> &Path {
        &self.active_file
    }

    /// Returns the editor buffer of the active file.
    #[must_use]
    pub fn active_source(&self) -> &str {
        &self.active_source
    }

    /// Returns the source directory.
    #[must_use]
    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    /// Returns the library directory.
    #[must_use]
    pub fn libs_dir(&self) -> PathBuf {
        self.root.join("libs")
    }

    /// Returns the build output directory.
    #[must_use]
    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    /// Returns the directory compilers write class files to.
    #[must_use]
    pub fn classes_dir(&self) -> PathBuf {
        self.build_dir().join("classes")
    }

    /// Returns the produced dex artifact.
    #[must_use]
    pub fn dex_file(&self) -> PathBuf {
        self.build_dir().join("classes.dex")
    }

    /// Lists source files with the given extension under `src/`, sorted.
    ///
    /// A missing source directory yields an empty list.
    pub fn sources(&self, extension: &str) -> io::Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        collect_files(&self.src_dir(), extension, &mut found)?;
        found.sort();
        Ok(found)
    }

    /// Lists `.jar` files under `libs/`, sorted.
    pub fn libraries(&self) -> io::Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        collect_files(&self.libs_dir(), "jar", &mut found)?;
        found.sort();
        Ok(found)
    }

    /// Lists compiled `.class` files under `build/classes/`, sorted.
    pub fn class_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        collect_files(&self.classes_dir(), "class", &mut found)?;
        found.sort();
        Ok(found)
    }

    /// Builds a classpath string from the compiled classes and libraries.
    pub fn classpath(&self) -> io::Result<String> {
        let mut entries = vec![self.classes_dir()];
        entries.extend(self.libraries()?);
        let joined = std::env::join_paths(entries)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        Ok(joined.to_string_lossy().into_owned())
    }
}

fn collect_files(dir: &Path, extension: &str, found: &mut Vec<PathBuf>) -> io::Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, extension, found)?;
        } else if path.extension().is_some_and(|ext| ext == extension) {
            found.push(path);
        }
    }
    Ok(())
}
