//! Workbook files on disk
//!
//! A workbook is stored as JSON or TOML, chosen by file extension. Field
//! names are camelCase in both formats.

use anyhow::{bail, Context, Result};
use resplan_core::Workbook;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(FileFormat::Json),
            Some("toml") => Ok(FileFormat::Toml),
            _ => bail!(
                "Unsupported workbook file {}: expected a .json or .toml extension",
                path.display()
            ),
        }
    }
}

pub fn load(path: &Path) -> Result<Workbook> {
    let format = FileFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read workbook {}", path.display()))?;
    let workbook: Workbook = match format {
        FileFormat::Json => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON workbook {}", path.display()))?,
        FileFormat::Toml => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML workbook {}", path.display()))?,
    };
    debug!(path = %path.display(), plans = workbook.plans.len(), "loaded workbook");
    Ok(workbook)
}

pub fn save(path: &Path, workbook: &Workbook) -> Result<()> {
    let content = match FileFormat::from_path(path)? {
        FileFormat::Json => {
            let mut json = serde_json::to_string_pretty(workbook)?;
            json.push('\n');
            json
        }
        FileFormat::Toml => toml::to_string_pretty(workbook)
            .with_context(|| format!("Failed to encode workbook as TOML for {}", path.display()))?,
    };
    fs::write(path, content)
        .with_context(|| format!("Failed to write workbook {}", path.display()))?;
    debug!(path = %path.display(), "saved workbook");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use resplan_core::{Currency, ExchangeRate, Project, RateCard, Region, ResourcePlan};
    use tempfile::tempdir;

    fn sample() -> Workbook {
        Workbook {
            project: Project::new("Sample")
                .currency(Currency::Gbp, ExchangeRate::new(0.79).unwrap())
                .margin(30.0),
            rate_cards: vec![RateCard::new("QA Engineer").rate(Region::India, 12.0)],
            weeks: 2,
            plans: vec![ResourcePlan::new("1")
                .role("QA Engineer")
                .rates(12.0, 20.5)
                .with_allocations([(1, 40), (2, 60)])],
            ..Workbook::default()
        }
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.json")).unwrap(), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("a.TOML")).unwrap(), FileFormat::Toml);
        assert!(FileFormat::from_path(Path::new("a.yaml")).is_err());
        assert!(FileFormat::from_path(Path::new("plan")).is_err());
    }

    #[test]
    fn json_and_toml_files_reload_identically() {
        let dir = tempdir().unwrap();
        for name in ["plan.json", "plan.toml"] {
            let path = dir.path().join(name);
            save(&path, &sample()).unwrap();
            assert_eq!(load(&path).unwrap(), sample(), "{name}");
        }
    }

    #[test]
    fn json_uses_camel_case_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.json");
        save(&path, &sample()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"clientCurrency\": \"GBP\""));
        assert!(text.contains("\"daysInFTE\": 20"));
        assert!(text.contains("\"weeklyAllocations\""));
        assert!(text.contains("\"weekNumber\": 1"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load(Path::new("/nonexistent/plan.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/plan.json"));
    }
}
