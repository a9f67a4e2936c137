//! Key-value persistence for per-screen editor state.

use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::config::Config;

/// Minimal string key-value store.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::open(cfg.state_path())
    }

    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create state directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, key: &str) -> PathBuf {
        // Keys are generated by `ScreenStore`, but keep separators out of file names.
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.root.join(safe)
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.file_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let p = self.file_path(key);
        fs::write(&p, value).with_context(|| format!("failed to write {}", p.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let p = self.file_path(key);
        if p.exists() {
            fs::remove_file(&p).with_context(|| format!("failed to remove {}", p.display()))?;
        }
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RefCell<HashMap<String, String>>,
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.borrow_mut().remove(key);
        Ok(())
    }
}

/// Editor state saved for one screen index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenSnapshot {
    pub code: Option<String>,
    pub output: Option<String>,
    pub selected: Vec<String>,
}

/// Typed access to the keys belonging to one screen.
pub struct ScreenStore<S: KvStore> {
    store: S,
    screen: u32,
}

impl<S: KvStore> ScreenStore<S> {
    pub fn new(store: S, screen: u32) -> Self {
        Self { store, screen }
    }

    pub fn screen(&self) -> u32 {
        self.screen
    }

    pub fn code_key(&self) -> String {
        format!("python_code_editor_content_screen_{}", self.screen)
    }

    pub fn output_key(&self) -> String {
        format!("python_code_editor_output_screen_{}", self.screen)
    }

    pub fn selected_key(&self) -> String {
        format!("python_code_editor_selected_variables_screen_{}", self.screen)
    }

    /// Saved source text, or `default_code` when nothing (or an empty string) was saved.
    pub fn load_code(&self, default_code: &str) -> String {
        match self.store.get(&self.code_key()) {
            Some(code) if !code.is_empty() => code,
            _ => default_code.to_string(),
        }
    }

    pub fn save_code(&self, code: &str) -> Result<()> {
        self.store.set(&self.code_key(), code)
    }

    pub fn load_output(&self) -> Option<String> {
        self.store.get(&self.output_key())
    }

    pub fn save_output(&self, output: &str) -> Result<()> {
        self.store.set(&self.output_key(), output)
    }

    pub fn load_selected(&self) -> Vec<String> {
        self.store
            .get(&self.selected_key())
            .and_then(|s| serde_json::from_str::<Vec<String>>(&s).ok())
            .unwrap_or_default()
    }

    pub fn save_selected(&self, names: &[String]) -> Result<()> {
        self.store.set(&self.selected_key(), &serde_json::to_string(names)?)
    }

    pub fn snapshot(&self) -> ScreenSnapshot {
        ScreenSnapshot {
            code: self.store.get(&self.code_key()),
            output: self.load_output(),
            selected: self.load_selected(),
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.code_key())?;
        self.store.remove(&self.output_key())?;
        self.store.remove(&self.selected_key())?;
        Ok(())
    }
}
