//! Engine binary description

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Program spawned for every engine call
///
/// `leading_args` are passed before the command name, which lets the engine
/// be an interpreter plus a script (`python3 -u engine.py <command> ...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineBinary {
    program: PathBuf,
    #[serde(default)]
    leading_args: Vec<String>,
    #[serde(default)]
    working_dir: Option<PathBuf>,
}

impl EngineBinary {
    /// Create new binary description
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            working_dir: None,
        }
    }

    /// Add fixed arguments passed before the command name
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Run the engine from a specific directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Program path or bare name
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Fixed leading arguments
    pub fn leading_args(&self) -> &[String] {
        &self.leading_args
    }

    /// Working directory override
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Check if the program can be found
    ///
    /// A bare name is looked up on `PATH`; anything with a directory
    /// component is checked directly.
    pub fn exists(&self) -> bool {
        if self.program.components().count() > 1 || self.program.is_absolute() {
            return self.program.is_file();
        }

        std::env::var_os("PATH")
            .map(|paths| {
                std::env::split_paths(&paths).any(|dir| dir.join(&self.program).is_file())
            })
            .unwrap_or(false)
    }
}

impl Default for EngineBinary {
    fn default() -> Self {
        Self::new("python3").with_leading_args(["-u", "engine/main.py"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary() {
        let binary = EngineBinary::new("/definitely/not/here/engine");
        assert!(!binary.exists());
    }

    #[test]
    fn test_existing_binary_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let binary = EngineBinary::new(file.path());
        assert!(binary.exists());
    }

    #[test]
    fn test_builder() {
        let binary = EngineBinary::new("node")
            .with_leading_args(["engine.js"])
            .with_working_dir("/opt/engine");
        assert_eq!(binary.leading_args(), ["engine.js".to_string()]);
        assert_eq!(binary.working_dir(), Some(Path::new("/opt/engine")));
    }
}
