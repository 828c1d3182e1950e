//! Extraction options and their YAML persistence.

use std::{fmt, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// Which worksheet of a workbook to read.
///
/// Serialized untagged: a YAML number selects by 1-based position, a string
/// selects by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetSelector {
    Index(usize),
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(1)
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Index(index) => write!(f, "#{index}"),
            SheetSelector::Name(name) => write!(f, "'{name}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Treat the first used row as column names.
    pub has_header: bool,
    pub worksheet: SheetSelector,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            worksheet: SheetSelector::default(),
        }
    }
}

impl ExtractOptions {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening options file {path:?}"))?;
        let reader = BufReader::new(file);
        let options: ExtractOptions =
            serde_yaml::from_reader(reader).context("Parsing options YAML")?;
        options.validate()?;
        Ok(options)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating options file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing options YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing options to YAML string")
    }

    fn validate(&self) -> Result<()> {
        if let SheetSelector::Index(index) = self.worksheet {
            ensure!(index >= 1, "Worksheet index is 1-based (got {index})");
        }
        if let SheetSelector::Name(name) = &self.worksheet {
            ensure!(!name.trim().is_empty(), "Worksheet name must not be empty");
        }
        Ok(())
    }
}
