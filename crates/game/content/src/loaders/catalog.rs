//! Guild catalog loader.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use gacha_core::{Boss, CommonSkill, Exchange, RewardItem, ValidationError};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Everything an admin can define for one guild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub items: Vec<RewardItem>,
    #[serde(default)]
    pub bosses: Vec<Boss>,
    #[serde(default)]
    pub skills: Vec<CommonSkill>,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
}

impl Catalog {
    /// Applies the admin-edit rules to every record, plus cross-record checks:
    /// names are unique per kind (case-insensitive) and equipped skills exist.
    pub fn validate(&self) -> Result<(), ValidationError> {
        unique_names("item", self.items.iter().map(|i| i.name.as_str()))?;
        unique_names("boss", self.bosses.iter().map(|b| b.name.as_str()))?;
        unique_names("skill", self.skills.iter().map(|s| s.name.as_str()))?;

        for skill in &self.skills {
            skill.validate()?;
        }
        for boss in &self.bosses {
            boss.validate()?;
        }
        for item in &self.items {
            item.validate()?;
            let Some(profile) = &item.combat else {
                continue;
            };
            for equipped in &profile.skills {
                if !self
                    .skills
                    .iter()
                    .any(|skill| skill.name.eq_ignore_ascii_case(equipped))
                {
                    return Err(ValidationError::NotFound {
                        kind: "skill",
                        name: equipped.clone(),
                    });
                }
            }
        }
        for exchange in &self.exchanges {
            gacha_core::validation::name(&exchange.reward_name)?;
        }
        Ok(())
    }
}

fn unique_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.trim().to_lowercase()) {
            return Err(ValidationError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Loader for guild catalogs from RON files.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load and validate a catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<Catalog> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in catalog {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<Catalog> {
        let catalog: Catalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse catalog RON: {}", e))?;
        catalog.validate()?;
        Ok(catalog)
    }
}
