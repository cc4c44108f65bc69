// src/host.rs
//
// Where emitted files go. The framework only ever calls `write_file`; paths
// are opaque strings passed through from `create_source_file`.

use std::io;
use std::path::PathBuf;

use indexmap::IndexMap;

pub trait EmitterHost {
    fn write_file(&mut self, path: &str, contents: &str) -> io::Result<()>;
}

/// Captures output in memory; the test host.
#[derive(Debug, Default)]
pub struct MemoryHost {
    files: IndexMap<String, String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Written files in write order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl EmitterHost for MemoryHost {
    fn write_file(&mut self, path: &str, contents: &str) -> io::Result<()> {
        self.files.insert(path.to_string(), contents.to_string());
        Ok(())
    }
}

/// Writes under a root directory, creating parents as needed.
#[derive(Debug)]
pub struct FsHost {
    root: PathBuf,
}

impl FsHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsHost { root: root.into() }
    }
}

impl EmitterHost for FsHost {
    fn write_file(&mut self, path: &str, contents: &str) -> io::Result<()> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, contents)
    }
}
