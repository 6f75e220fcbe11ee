//! Rate cards and the project resource list
//!
//! A rate card is the reference pricing sheet: for each role, the internal
//! hourly cost in every delivery region. The resource list is the
//! project-specific shortlist of roles (and optionally people) that plan rows
//! pick from; entries are usually seeded from a rate card row and a region.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CalcError;

/// Delivery region column of a rate card
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Region {
    Ukraine,
    EasternEurope,
    #[serde(rename = "asiaGE")]
    AsiaGe,
    #[serde(rename = "asiaARMKZ")]
    AsiaArmKz,
    Latam,
    Mexico,
    India,
    NewYork,
    London,
}

impl Region {
    pub const ALL: [Region; 9] = [
        Region::Ukraine,
        Region::EasternEurope,
        Region::AsiaGe,
        Region::AsiaArmKz,
        Region::Latam,
        Region::Mexico,
        Region::India,
        Region::NewYork,
        Region::London,
    ];

    /// Column heading used in rate card sheets
    pub fn display_name(self) -> &'static str {
        match self {
            Region::Ukraine => "Ukraine",
            Region::EasternEurope => "Eastern Europe",
            Region::AsiaGe => "Asia (GE)",
            Region::AsiaArmKz => "Asia (ARM/KZ)",
            Region::Latam => "LATAM",
            Region::Mexico => "Mexico",
            Region::India => "India",
            Region::NewYork => "New York",
            Region::London => "London",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Region {
    type Err = CalcError;

    /// Accepts the column heading (`New York`) or a compact key (`newyork`,
    /// `new-york`), ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = |text: &str| -> String {
            text.chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|c| c.to_ascii_lowercase())
                .collect()
        };
        let wanted = key(s);
        Region::ALL
            .into_iter()
            .find(|r| key(r.display_name()) == wanted)
            .ok_or_else(|| CalcError::UnknownRegion(s.to_string()))
    }
}

/// Internal USD hourly cost per region. Missing or unparseable cells read as 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalRates {
    #[serde(default, deserialize_with = "lenient_rate")]
    pub ukraine: f64,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub eastern_europe: f64,
    #[serde(rename = "asiaGE", default, deserialize_with = "lenient_rate")]
    pub asia_ge: f64,
    #[serde(rename = "asiaARMKZ", default, deserialize_with = "lenient_rate")]
    pub asia_arm_kz: f64,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub latam: f64,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub mexico: f64,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub india: f64,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub new_york: f64,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub london: f64,
}

impl RegionalRates {
    pub fn get(&self, region: Region) -> f64 {
        match region {
            Region::Ukraine => self.ukraine,
            Region::EasternEurope => self.eastern_europe,
            Region::AsiaGe => self.asia_ge,
            Region::AsiaArmKz => self.asia_arm_kz,
            Region::Latam => self.latam,
            Region::Mexico => self.mexico,
            Region::India => self.india,
            Region::NewYork => self.new_york,
            Region::London => self.london,
        }
    }

    pub fn set(&mut self, region: Region, rate: f64) {
        let slot = match region {
            Region::Ukraine => &mut self.ukraine,
            Region::EasternEurope => &mut self.eastern_europe,
            Region::AsiaGe => &mut self.asia_ge,
            Region::AsiaArmKz => &mut self.asia_arm_kz,
            Region::Latam => &mut self.latam,
            Region::Mexico => &mut self.mexico,
            Region::India => &mut self.india,
            Region::NewYork => &mut self.new_york,
            Region::London => &mut self.london,
        };
        *slot = rate;
    }
}

/// Accepts a number, a numeric string, or anything else as 0
fn lenient_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cell {
        Number(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    let rate = match Cell::deserialize(deserializer)? {
        Cell::Number(n) => n,
        Cell::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Cell::Other(_) => 0.0,
    };
    Ok(if rate.is_finite() { rate } else { 0.0 })
}

/// One role line of a rate card
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateCard {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub role: String,
    /// Role title used in project management documents
    #[serde(rename = "namingInPM", default)]
    pub naming_in_pm: String,
    #[serde(default)]
    pub discipline: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub rates: RegionalRates,
}

impl RateCard {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            ..Self::default()
        }
        .normalized()
    }

    pub fn rate(mut self, region: Region, rate: f64) -> Self {
        self.rates.set(region, rate);
        self
    }

    /// Fill blank columns the way imported rows are stored: the PM naming
    /// falls back to the role and the discipline to `General`
    pub fn normalized(mut self) -> Self {
        if self.naming_in_pm.trim().is_empty() {
            self.naming_in_pm = self.role.clone();
        }
        if self.discipline.trim().is_empty() {
            self.discipline = "General".into();
        }
        self
    }

    pub fn rate_for(&self, region: Region) -> f64 {
        self.rates.get(region)
    }
}

/// A role available to the project's plan rows
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceListEntry {
    #[serde(default)]
    pub id: String,
    pub role: String,
    /// Role title shown to the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_role: Option<String>,
    /// Named person, when already staffed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Internal cost, USD per hour
    #[serde(default)]
    pub int_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResourceListEntry {
    pub fn new(role: impl Into<String>, int_rate: f64) -> Self {
        Self {
            role: role.into(),
            int_rate,
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn client_role(mut self, client_role: impl Into<String>) -> Self {
        self.client_role = Some(client_role.into());
        self
    }

    /// Seed an entry from a rate card row priced for one region
    pub fn from_rate_card(card: &RateCard, region: Region) -> Self {
        let client_role = if card.naming_in_pm.trim().is_empty() {
            None
        } else {
            Some(card.naming_in_pm.clone())
        };
        let description = if card.description.trim().is_empty() {
            None
        } else {
            Some(card.description.clone())
        };
        Self {
            id: String::new(),
            role: card.role.clone(),
            client_role,
            name: None,
            int_rate: card.rate_for(region),
            location: Some(region.display_name().to_string()),
            description,
        }
    }

    /// Internal daily cost (8-hour day)
    pub fn daily_rate(&self) -> f64 {
        self.int_rate * crate::HOURS_PER_DAY
    }
}

/// Headline numbers shown above the resource list
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStats {
    pub count: usize,
    pub average_rate: f64,
}

pub fn resource_stats(resources: &[ResourceListEntry]) -> ResourceStats {
    if resources.is_empty() {
        return ResourceStats::default();
    }
    let total: f64 = resources.iter().map(|r| r.int_rate).sum();
    ResourceStats {
        count: resources.len(),
        average_rate: total / resources.len() as f64,
    }
}
