// ABOUTME: cap-std-backed sandboxed file reader, the default File Reader capability (§6.4, §A.4)

use crate::capability::FileReader;
use crate::error::EvalError;
use cap_std::fs::Dir;
use std::path::PathBuf;

/// Filesystem sandbox configuration: the roots a `FsSandbox` is allowed to
/// read from, and a size ceiling on any single read.
#[derive(Debug, Clone)]
pub struct FsConfig {
    pub allowed_paths: Vec<PathBuf>,
    pub max_file_size: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        FsConfig {
            allowed_paths: vec![PathBuf::from(".")],
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// Read-only capability-based sandbox: every allowed root is opened as a
/// `cap_std::fs::Dir`, so `..` traversal and absolute paths are rejected by
/// construction, not by string-matching alone (the string checks below are
/// a fast first rejection; `Dir` is the actual enforcement boundary).
pub struct FsSandbox {
    roots: Vec<Dir>,
    max_file_size: usize,
}

impl FsSandbox {
    pub fn new(config: &FsConfig) -> Result<Self, EvalError> {
        let mut roots = Vec::with_capacity(config.allowed_paths.len());
        for path in &config.allowed_paths {
            let dir = Dir::open_ambient_dir(path, cap_std::ambient_authority()).map_err(|e| {
                EvalError::internal(format!("cannot open sandbox root {}: {}", path.display(), e))
            })?;
            roots.push(dir);
        }
        Ok(FsSandbox {
            roots,
            max_file_size: config.max_file_size,
        })
    }

    fn validate_path(path: &str) -> Result<(), EvalError> {
        if path.starts_with('/') || path.starts_with('\\') || path.contains("..") {
            return Err(EvalError::tool_failure(
                "read-file",
                format!("path not allowed: {}", path),
            ));
        }
        Ok(())
    }
}

impl FileReader for FsSandbox {
    fn read(&self, path: &str) -> Result<String, EvalError> {
        Self::validate_path(path)?;

        for root in &self.roots {
            match root.metadata(path) {
                Ok(meta) if meta.len() as usize > self.max_file_size => {
                    return Err(EvalError::tool_failure(
                        "read-file",
                        format!("{} exceeds max file size of {} bytes", path, self.max_file_size),
                    ));
                }
                Ok(_) => {
                    return root
                        .read_to_string(path)
                        .map_err(|e| EvalError::tool_failure("read-file", e.to_string()));
                }
                Err(_) => continue,
            }
        }

        Err(EvalError::tool_failure(
            "read-file",
            format!("file not found in sandbox: {}", path),
        ))
    }
}

/// A File Reader with no accessible roots: every read fails. Useful as a
/// default when no sandbox has been configured.
pub struct NullFileReader;

impl FileReader for NullFileReader {
    fn read(&self, path: &str) -> Result<String, EvalError> {
        Err(EvalError::tool_failure(
            "read-file",
            format!("no file reader configured, cannot read: {}", path),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sexp-orchestrator-test-{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    #[serial]
    fn reads_file_within_sandbox() {
        let root = temp_root("read-ok");
        fs::write(root.join("hello.txt"), "hi there").unwrap();
        let sandbox = FsSandbox::new(&FsConfig {
            allowed_paths: vec![root.clone()],
            max_file_size: 1024,
        })
        .unwrap();
        assert_eq!(sandbox.read("hello.txt").unwrap(), "hi there");
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    #[serial]
    fn rejects_path_traversal() {
        let root = temp_root("traversal");
        let sandbox = FsSandbox::new(&FsConfig {
            allowed_paths: vec![root.clone()],
            max_file_size: 1024,
        })
        .unwrap();
        assert!(sandbox.read("../../etc/passwd").is_err());
        assert!(sandbox.read("/etc/passwd").is_err());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    #[serial]
    fn rejects_oversized_file() {
        let root = temp_root("oversize");
        fs::write(root.join("big.txt"), "0123456789").unwrap();
        let sandbox = FsSandbox::new(&FsConfig {
            allowed_paths: vec![root.clone()],
            max_file_size: 4,
        })
        .unwrap();
        assert!(sandbox.read("big.txt").is_err());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn null_file_reader_always_fails() {
        let reader = NullFileReader;
        assert!(reader.read("anything.txt").is_err());
    }
}
