//! Package catalog: which content packages exist and where to fetch them
//!
//! ```toml
//! [[package]]
//! id = "quran"
//! url = "https://cdn.example.com/quran_data.zip"
//! size = 2453000
//! entries = ["ayah", "reciters.json"]
//! ```

use hafiz_errors::{ConfigError, Error};
use hafiz_types::{PackageDescriptor, PackageId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "package")]
    packages: Vec<PackageDescriptor>,
}

impl Catalog {
    /// Build a catalog from descriptors
    ///
    /// # Errors
    ///
    /// Returns an error if two descriptors share an id.
    pub fn new(packages: Vec<PackageDescriptor>) -> Result<Self, Error> {
        let catalog = Self { packages };
        catalog.check_unique()?;
        Ok(catalog)
    }

    /// Parse a catalog from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error on invalid TOML, invalid package ids or duplicates.
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        let catalog: Self = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        catalog.check_unique()?;
        Ok(catalog)
    }

    /// Load the catalog file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;
        let catalog = Self::from_toml(&contents)?;
        tracing::debug!(path = %path.display(), packages = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    /// Look up a package by id
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPackage`] if the id is not listed.
    pub fn get(&self, id: &PackageId) -> Result<&PackageDescriptor, Error> {
        self.packages
            .iter()
            .find(|descriptor| &descriptor.id == id)
            .ok_or_else(|| {
                ConfigError::UnknownPackage {
                    id: id.to_string(),
                }
                .into()
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageDescriptor> {
        self.packages.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn check_unique(&self) -> Result<(), Error> {
        let mut seen = HashSet::new();
        for descriptor in &self.packages {
            if !seen.insert(&descriptor.id) {
                return Err(ConfigError::DuplicatePackage {
                    id: descriptor.id.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}
