use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scale of a requested change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureCategory {
    NewFeature,
    UiImprovement,
    UxImprovement,
}

impl FeatureCategory {
    pub const ALL: [FeatureCategory; 3] = [
        FeatureCategory::NewFeature,
        FeatureCategory::UiImprovement,
        FeatureCategory::UxImprovement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureCategory::NewFeature => "new-feature",
            FeatureCategory::UiImprovement => "ui-improvement",
            FeatureCategory::UxImprovement => "ux-improvement",
        }
    }

    pub fn is_improvement(&self) -> bool {
        matches!(
            self,
            FeatureCategory::UiImprovement | FeatureCategory::UxImprovement
        )
    }
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown feature category '{0}'. Valid options: new-feature, ui-improvement, ux-improvement")]
pub struct ParseCategoryError(pub String);

impl FromStr for FeatureCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c.is_whitespace() { '-' } else { c })
            .collect();

        match normalized.as_str() {
            "new-feature" | "new" | "feature" | "newfeature" => Ok(FeatureCategory::NewFeature),
            "ui-improvement" | "ui" | "uiimprovement" => Ok(FeatureCategory::UiImprovement),
            "ux-improvement" | "ux" | "uximprovement" => Ok(FeatureCategory::UxImprovement),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for FeatureCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
