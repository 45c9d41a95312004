use crate::chart::ChartOptions;
use crate::error::ConfigError;
use crate::factors::NumberDomain;
use crate::loader::LoaderConfig;
use crate::section::{SectionConfig, SectionKind};
use crate::timeline::TimelineConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings of the dashboard server
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```
/// use asset_dashboard::config::DashboardConfig;
///
/// let config: DashboardConfig = serde_json::from_str(r#"{ "bind": "0.0.0.0:8080" }"#).unwrap();
/// assert_eq!(config.bind, "0.0.0.0:8080");
/// assert_eq!(config.sections.len(), 2);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Workbook written by the extractor
    pub data_path: PathBuf,

    /// Address the server listens on
    pub bind: String,

    pub loader: LoaderConfig,

    /// Factor sections in page order
    pub sections: Vec<SectionConfig>,

    /// Limits of the editable factor grid
    pub factor_domain: NumberDomain,

    pub timeline: TimelineConfig,

    pub chart: ChartOptions,

    /// Seconds a dashboard session survives without a visit
    pub session_ttl_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("Archive/copied_values.xlsx"),
            bind: "127.0.0.1:3000".to_string(),
            loader: LoaderConfig::default(),
            sections: vec![
                SectionConfig::replacement_investments(),
                SectionConfig::operating_budget(),
            ],
            factor_domain: NumberDomain::default(),
            timeline: TimelineConfig::default(),
            chart: ChartOptions::default(),
            session_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl DashboardConfig {
    /// Read and validate a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn section(&self, kind: SectionKind) -> Option<&SectionConfig> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for section in &self.sections {
            if !seen.insert(section.kind) {
                return Err(ConfigError::Invalid(format!(
                    "section '{}' is configured twice",
                    section.kind.slug()
                )));
            }
            let range = section.factor_range;
            if !(range.low.is_finite() && range.high.is_finite()) || range.low > range.high {
                return Err(ConfigError::Invalid(format!(
                    "factor range of '{}' must be an ordered pair of numbers",
                    section.title
                )));
            }
        }

        let domain = &self.factor_domain;
        if !(domain.step > 0.0) {
            return Err(ConfigError::Invalid("factor step must be positive".into()));
        }
        if domain.min > domain.max {
            return Err(ConfigError::Invalid(format!(
                "factor domain {}..{} is empty",
                domain.min, domain.max
            )));
        }
        for section in self.sections.iter().filter(|s| s.editable) {
            let range = section.factor_range;
            if range.low < domain.min || range.high > domain.max {
                return Err(ConfigError::Invalid(format!(
                    "factor range of '{}' lies outside the editable domain",
                    section.title
                )));
            }
        }

        let years = &self.timeline.years;
        if years.min > years.max {
            return Err(ConfigError::Invalid(format!(
                "year range {}..={} is empty",
                years.min, years.max
            )));
        }
        if self.session_ttl_secs == 0 {
            return Err(ConfigError::Invalid("session lifetime must be positive".into()));
        }
        if self.timeline.tick_step == 0 {
            return Err(ConfigError::Invalid("tick step must be positive".into()));
        }

        Ok(())
    }
}
