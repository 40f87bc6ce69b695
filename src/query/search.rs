use super::similarity::{token_coverage, tokenize};
use crate::model::{Feature, Interaction, Repository, Screen};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenMatch {
    #[serde(flatten)]
    pub screen: Screen,
    pub similarity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionMatch {
    #[serde(flatten)]
    pub interaction: Interaction,
    pub similarity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMatch {
    #[serde(flatten)]
    pub feature: Feature,
    pub similarity_score: f64,
}

fn rank<T: Clone>(
    feature: &str,
    items: &[T],
    text_of: impl Fn(&T) -> String,
    limit: usize,
) -> Vec<(T, f64)> {
    let query = tokenize(feature);
    let mut scored: Vec<(T, f64)> = items
        .iter()
        .map(|item| {
            let candidates = tokenize(&text_of(item));
            (item.clone(), token_coverage(&query, &candidates))
        })
        .filter(|(_, score)| *score > 0.0)
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    scored
}

/// Screens ranked by fuzzy token overlap of name, description and use
pub fn search_screens(feature: &str, repository: &Repository, limit: usize) -> Vec<ScreenMatch> {
    rank(
        feature,
        &repository.screens,
        |s| format!("{} {} {}", s.name, s.description, s.use_),
        limit,
    )
    .into_iter()
    .map(|(screen, similarity_score)| ScreenMatch {
        screen,
        similarity_score,
    })
    .collect()
}

/// Interactions ranked by fuzzy token overlap of name, description and use
pub fn search_interactions(
    feature: &str,
    repository: &Repository,
    limit: usize,
) -> Vec<InteractionMatch> {
    rank(
        feature,
        &repository.interactions,
        |i| format!("{} {} {}", i.name, i.description, i.use_),
        limit,
    )
    .into_iter()
    .map(|(interaction, similarity_score)| InteractionMatch {
        interaction,
        similarity_score,
    })
    .collect()
}

/// Catalogued features ranked by fuzzy token overlap of name, description,
/// entry points and criteria. Empty when the repository has no catalog.
pub fn search_features(
    feature: &str,
    repository: &Repository,
    limit: usize,
) -> Vec<FeatureMatch> {
    rank(feature, &repository.features, Feature::search_text, limit)
        .into_iter()
        .map(|(feature, similarity_score)| FeatureMatch {
            feature,
            similarity_score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository() -> Repository {
        let mut repo = Repository::new("mailer");
        repo.screens = vec![
            Screen {
                name: "Inbox".to_string(),
                sequence_num: 1,
                description: "List of received messages".to_string(),
                use_: "read mail".to_string(),
            },
            Screen {
                name: "Compose".to_string(),
                sequence_num: 2,
                description: "Editor for a new message with attachments".to_string(),
                use_: "write and send mail".to_string(),
            },
            Screen {
                name: "Settings".to_string(),
                sequence_num: 3,
                description: "Account preferences".to_string(),
                use_: String::new(),
            },
        ];
        repo.features = vec![
            Feature {
                name: "Attachments".to_string(),
                description: "Add files to a message".to_string(),
                flows: Vec::new(),
                screens: vec!["Compose".to_string()],
                entry_points: vec!["Paperclip in compose".to_string()],
                success_criteria: vec!["File shows under the body".to_string()],
                failure_criteria: Vec::new(),
            },
            Feature {
                name: "Archive".to_string(),
                description: "Hide read mail".to_string(),
                flows: Vec::new(),
                screens: vec!["Inbox".to_string()],
                entry_points: vec!["Swipe left".to_string()],
                success_criteria: Vec::new(),
                failure_criteria: Vec::new(),
            },
        ];
        repo.interactions = vec![
            Interaction {
                name: "Tap send".to_string(),
                use_: "deliver the message".to_string(),
                description: String::new(),
            },
            Interaction {
                name: "Swipe to archive".to_string(),
                use_: "clear the inbox".to_string(),
                description: String::new(),
            },
        ];
        repo
    }

    #[test]
    fn test_search_screens_ranks_best_first() {
        let results = search_screens("send a message with attachments", &repository(), 5);

        assert_eq!(results[0].screen.name, "Compose");
        assert!(results
            .windows(2)
            .all(|w| w[0].similarity_score >= w[1].similarity_score));
        assert!(results.iter().all(|r| r.screen.name != "Settings"));
    }

    #[test]
    fn test_search_screens_limit() {
        let results = search_screens("message", &repository(), 1);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_search_interactions() {
        let results = search_interactions("sending messages", &repository(), 5);
        assert_eq!(results[0].interaction.name, "Tap send");
    }

    #[test]
    fn test_search_features() {
        let results = search_features("attach files to a message", &repository(), 5);
        assert_eq!(results[0].feature.name, "Attachments");
        assert!(results.iter().all(|r| r.feature.name != "Archive"));

        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(json["entry_points"][0], "Paperclip in compose");
    }

    #[test]
    fn test_search_features_without_catalog() {
        let repo = Repository::new("mailer");
        assert!(search_features("anything", &repo, 5).is_empty());
    }

    #[test]
    fn test_search_no_match() {
        assert!(search_screens("billing", &repository(), 5).is_empty());
    }

    #[test]
    fn test_match_serializes_flat() {
        let results = search_screens("inbox", &repository(), 1);
        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(json["name"], "Inbox");
        assert!(json["similarity_score"].as_f64().unwrap() > 0.0);
    }
}
