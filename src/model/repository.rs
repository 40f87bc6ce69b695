use super::catalog::{AppInfo, Feature, SourceInfo};
use super::FeatureCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Separator used in flow paths such as `login -> home -> compose`
pub const FLOW_PATH_SEPARATOR: &str = "->";

/// A UI surface in the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub name: String,
    pub sequence_num: u32,
    pub description: String,
    #[serde(rename = "use")]
    pub use_: String,
}

/// An atomic user action, e.g. "tap send".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub name: String,
    #[serde(rename = "use")]
    pub use_: String,
    pub description: String,
}

/// An ordered traversal of screens that accomplishes one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub flow: String,
    pub screens: Vec<Screen>,
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_cat: Option<FeatureCategory>,
}

impl Flow {
    /// Trimmed, non-empty segments of the flow path
    pub fn path_segments(&self) -> Vec<&str> {
        self.flow
            .split(FLOW_PATH_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Everything that names a step of this flow, in traversal order:
    /// path segments, then screens, then interactions.
    pub fn steps(&self) -> Vec<&str> {
        let mut steps = self.path_segments();
        steps.extend(self.screens.iter().map(|s| s.name.as_str()));
        steps.extend(self.interactions.iter().map(|i| i.name.as_str()));
        steps
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("Flow '{flow}' references unknown screen '{screen}'")]
    UnknownScreen { flow: String, screen: String },

    #[error("Flow '{flow}' references unknown interaction '{interaction}'")]
    UnknownInteraction { flow: String, interaction: String },

    #[error("Feature '{feature}' references unknown flow '{flow}'")]
    UnknownFeatureFlow { feature: String, flow: String },

    #[error("Feature '{feature}' references unknown screen '{screen}'")]
    UnknownFeatureScreen { feature: String, screen: String },
}

/// All screens, flows and interactions extracted for one application, plus
/// the optional feature catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub app_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<AppInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub screens: Vec<Screen>,
    #[serde(default)]
    pub flows: Vec<Flow>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

pub(crate) fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Flow paths match ignoring case and spacing around the separator
pub(crate) fn path_key(path: &str) -> String {
    path.split(FLOW_PATH_SEPARATOR)
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(FLOW_PATH_SEPARATOR)
}

impl Repository {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            source: None,
            app: None,
            features: Vec::new(),
            screens: Vec::new(),
            flows: Vec::new(),
            interactions: Vec::new(),
        }
    }

    pub fn find_screen(&self, name: &str) -> Option<&Screen> {
        let key = name_key(name);
        self.screens.iter().find(|s| name_key(&s.name) == key)
    }

    pub fn find_interaction(&self, name: &str) -> Option<&Interaction> {
        let key = name_key(name);
        self.interactions.iter().find(|i| name_key(&i.name) == key)
    }

    pub fn find_flow(&self, path: &str) -> Option<&Flow> {
        let key = path_key(path);
        self.flows.iter().find(|f| path_key(&f.flow) == key)
    }

    pub fn find_feature(&self, name: &str) -> Option<&Feature> {
        let key = name_key(name);
        self.features.iter().find(|f| name_key(&f.name) == key)
    }

    /// Checks that every flow's screens and interactions, and every
    /// feature's flows and screens, exist in the repository collections.
    /// Names compare case-insensitively.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        let screens: HashSet<String> = self.screens.iter().map(|s| name_key(&s.name)).collect();
        let interactions: HashSet<String> = self
            .interactions
            .iter()
            .map(|i| name_key(&i.name))
            .collect();

        for flow in &self.flows {
            if let Some(screen) = flow
                .screens
                .iter()
                .find(|s| !screens.contains(&name_key(&s.name)))
            {
                return Err(IntegrityError::UnknownScreen {
                    flow: flow.flow.clone(),
                    screen: screen.name.clone(),
                });
            }

            if let Some(interaction) = flow
                .interactions
                .iter()
                .find(|i| !interactions.contains(&name_key(&i.name)))
            {
                return Err(IntegrityError::UnknownInteraction {
                    flow: flow.flow.clone(),
                    interaction: interaction.name.clone(),
                });
            }
        }

        let flows: HashSet<String> = self.flows.iter().map(|f| path_key(&f.flow)).collect();
        for feature in &self.features {
            if let Some(flow) = feature.flows.iter().find(|f| !flows.contains(&path_key(f))) {
                return Err(IntegrityError::UnknownFeatureFlow {
                    feature: feature.name.clone(),
                    flow: flow.clone(),
                });
            }
            if let Some(screen) = feature
                .screens
                .iter()
                .find(|s| !screens.contains(&name_key(s)))
            {
                return Err(IntegrityError::UnknownFeatureScreen {
                    feature: feature.name.clone(),
                    screen: screen.clone(),
                });
            }
        }

        Ok(())
    }

    /// Appends another repository's collections. Screens, interactions and
    /// features already present by name are skipped; flows are always
    /// appended. The first known source and app record win.
    pub fn merge(&mut self, other: Repository) {
        if self.source.is_none() {
            self.source = other.source;
        }
        if self.app.is_none() {
            self.app = other.app;
        }
        for feature in other.features {
            if self.find_feature(&feature.name).is_none() {
                self.features.push(feature);
            }
        }
        for screen in other.screens {
            if self.find_screen(&screen.name).is_none() {
                self.screens.push(screen);
            }
        }
        for interaction in other.interactions {
            if self.find_interaction(&interaction.name).is_none() {
                self.interactions.push(interaction);
            }
        }
        self.flows.extend(other.flows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(name: &str, seq: u32) -> Screen {
        Screen {
            name: name.to_string(),
            sequence_num: seq,
            description: format!("{} screen", name),
            use_: format!("use {}", name),
        }
    }

    fn interaction(name: &str) -> Interaction {
        Interaction {
            name: name.to_string(),
            use_: format!("to {}", name),
            description: String::new(),
        }
    }

    fn sample() -> Repository {
        let login = screen("Login", 1);
        let home = screen("Home", 2);
        let tap = interaction("Tap send");
        Repository {
            screens: vec![login.clone(), home.clone()],
            flows: vec![Flow {
                flow: "login -> home".to_string(),
                screens: vec![login, home],
                interactions: vec![tap.clone()],
                confidence: 0.8,
                user_type: Some("sender".to_string()),
                feature_cat: Some(FeatureCategory::NewFeature),
            }],
            interactions: vec![tap],
            ..Repository::new("mailer")
        }
    }

    fn feature(name: &str, flows: &[&str], screens: &[&str]) -> Feature {
        Feature {
            name: name.to_string(),
            description: String::new(),
            flows: flows.iter().map(|f| f.to_string()).collect(),
            screens: screens.iter().map(|s| s.to_string()).collect(),
            entry_points: Vec::new(),
            success_criteria: Vec::new(),
            failure_criteria: Vec::new(),
        }
    }

    #[test]
    fn test_use_field_renamed() {
        let json = serde_json::to_value(screen("Inbox", 3)).unwrap();
        assert_eq!(json["use"], "use Inbox");
        assert!(json.get("use_").is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let repo = sample();
        let json = serde_json::to_string_pretty(&repo).unwrap();
        let loaded: Repository = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, repo);
    }

    #[test]
    fn test_flow_without_tags_loads() {
        let json = r#"{"flow": "a -> b", "screens": [], "interactions": [], "confidence": 0.5}"#;
        let flow: Flow = serde_json::from_str(json).unwrap();
        assert!(flow.user_type.is_none());
        assert!(flow.feature_cat.is_none());
    }

    #[test]
    fn test_path_segments_and_steps() {
        let repo = sample();
        let flow = &repo.flows[0];
        assert_eq!(flow.path_segments(), vec!["login", "home"]);
        assert_eq!(
            flow.steps(),
            vec!["login", "home", "Login", "Home", "Tap send"]
        );
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_screen() {
        let mut repo = sample();
        repo.screens.retain(|s| s.name != "Home");
        assert_eq!(
            repo.validate(),
            Err(IntegrityError::UnknownScreen {
                flow: "login -> home".to_string(),
                screen: "Home".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_unknown_interaction() {
        let mut repo = sample();
        repo.interactions.clear();
        assert!(matches!(
            repo.validate(),
            Err(IntegrityError::UnknownInteraction { .. })
        ));
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let repo = sample();
        assert!(repo.find_screen("  home ").is_some());
        assert!(repo.find_interaction("TAP SEND").is_some());
        assert!(repo.find_screen("Settings").is_none());
    }

    #[test]
    fn test_catalog_fields_omitted_when_empty() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("source").is_none());
        assert!(json.get("app").is_none());
        assert!(json.get("features").is_none());
    }

    #[test]
    fn test_catalog_round_trip() {
        let mut repo = sample();
        repo.source = Some(SourceInfo::new("mailer"));
        repo.app = Some(AppInfo {
            name: "Mailer".to_string(),
            description: "Email client".to_string(),
        });
        repo.features
            .push(feature("Sign in", &["Login->Home"], &["login"]));

        let json = serde_json::to_string_pretty(&repo).unwrap();
        let loaded: Repository = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, repo);
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_validate_feature_references() {
        let mut repo = sample();
        repo.features.push(feature("Archive", &["login -> archive"], &[]));
        assert_eq!(
            repo.validate(),
            Err(IntegrityError::UnknownFeatureFlow {
                feature: "Archive".to_string(),
                flow: "login -> archive".to_string(),
            })
        );

        repo.features = vec![feature("Sign in", &["login -> home"], &["Settings"])];
        assert!(matches!(
            repo.validate(),
            Err(IntegrityError::UnknownFeatureScreen { ref screen, .. }) if screen == "Settings"
        ));
    }

    #[test]
    fn test_path_key() {
        assert_eq!(path_key("Login -> Home ->Compose"), "login->home->compose");
        assert_eq!(path_key("login->home"), path_key(" LOGIN  ->  home "));
        assert!(sample().find_flow("LOGIN->HOME").is_some());
    }

    #[test]
    fn test_merge_keeps_first_catalog() {
        let mut repo = sample();
        repo.app = Some(AppInfo {
            name: "Mailer".to_string(),
            description: String::new(),
        });
        repo.features.push(feature("Sign in", &["login -> home"], &[]));

        let mut other = sample();
        other.source = Some(SourceInfo::new("mailer"));
        other.app = Some(AppInfo {
            name: "Other".to_string(),
            description: String::new(),
        });
        other.features = vec![
            feature("sign IN", &[], &[]),
            feature("Read mail", &["login -> home"], &["Home"]),
        ];

        repo.merge(other);

        assert_eq!(repo.app.as_ref().map(|a| a.name.as_str()), Some("Mailer"));
        assert!(repo.source.is_some());
        let names: Vec<_> = repo.features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Sign in", "Read mail"]);
        assert!(repo.validate().is_ok());
    }

    #[test]
    fn test_merge_skips_duplicate_names() {
        let mut repo = sample();
        let mut other = sample();
        other.screens.push(screen("Settings", 3));

        repo.merge(other);

        assert_eq!(repo.screens.len(), 3);
        assert_eq!(repo.interactions.len(), 1);
        assert_eq!(repo.flows.len(), 2);
        assert!(repo.validate().is_ok());
    }
}
