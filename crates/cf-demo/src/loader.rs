//! Bank files on disk
//!
//! A bank named `Weapons` is read from `<dir>/Weapons.json`, then
//! `<dir>/Weapons.yaml`, then `<dir>/Weapons.yml`.

use std::fs;
use std::path::{Path, PathBuf};

use cf_core::{CfError, CfResult};
use cf_event::{BankSource, EventBank};

const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Bank source backed by a directory of JSON / YAML files
#[derive(Debug, Clone)]
pub struct FileBankSource {
    dir: PathBuf,
}

impl FileBankSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn locate(&self, bank_name: &str) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", bank_name, ext)))
            .find(|path| path.is_file())
    }
}

impl BankSource for FileBankSource {
    fn load_bank(&mut self, bank_name: &str) -> CfResult<EventBank> {
        let path = self.locate(bank_name).ok_or_else(|| CfError::BankUnavailable {
            bank: bank_name.to_string(),
            reason: format!("no bank file in {}", self.dir.display()),
        })?;

        let text = fs::read_to_string(&path)?;
        let mut bank = parse_bank(&path, &text)?;

        // The file name is authoritative
        if bank.name != bank_name {
            if !bank.name.is_empty() {
                log::warn!(
                    "Bank file {} declares name '{}', using '{}'",
                    path.display(),
                    bank.name,
                    bank_name
                );
            }
            bank.name = bank_name.to_string();
        }

        bank.validate()?;
        log::debug!("Read {} events from {}", bank.len(), path.display());
        Ok(bank)
    }
}

fn parse_bank(path: &Path, text: &str) -> CfResult<EventBank> {
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let parsed = if is_json {
        serde_json::from_str(text).map_err(|e| e.to_string())
    } else {
        serde_yml::from_str(text).map_err(|e| e.to_string())
    };
    parsed.map_err(|e| CfError::Serialization(format!("{}: {}", path.display(), e)))
}
