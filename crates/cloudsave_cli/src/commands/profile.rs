//! Player profile stored as plain key-value entries.

use super::{CliError, LocalCloud};
use cloudsave_client::{Scalar, StatusReporter};

/// Key holding the player name.
pub const NAME_KEY: &str = "playerName";
/// Key holding the player alias.
pub const ALIAS_KEY: &str = "alias";
/// Shown when no name is stored.
pub const DEFAULT_NAME: &str = "DefaultName";
/// Shown when no alias is stored.
pub const DEFAULT_ALIAS: &str = "DefaultAlias";

/// Name and alias as loaded from the cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Player name.
    pub name: String,
    /// Player alias.
    pub alias: String,
}

/// Saves whichever fields are given, then loads both back.
///
/// Missing entries fall back to the defaults.
pub async fn run(
    cloud: &LocalCloud,
    reporter: &StatusReporter,
    name: Option<String>,
    alias: Option<String>,
) -> Result<Profile, CliError> {
    let kv = cloud.key_values();

    let mut updates = Vec::new();
    if let Some(name) = name {
        updates.push((NAME_KEY, Scalar::Text(name)));
    }
    if let Some(alias) = alias {
        updates.push((ALIAS_KEY, Scalar::Text(alias)));
    }
    if !updates.is_empty() {
        let saved = kv.save(updates).await;
        reporter.report("Save profile", &saved, |_| "Player data saved".to_string());
        saved?;
    }

    let loaded = kv.load([NAME_KEY, ALIAS_KEY]).await;
    reporter.report("Load profile", &loaded, |items| {
        format!("Player data loaded ({} of 2 keys present)", items.len())
    });
    let mut items = loaded?;

    let mut text_or = |key: &str, default: &str| {
        items
            .remove(key)
            .and_then(Scalar::into_text)
            .unwrap_or_else(|| default.to_string())
    };
    let profile = Profile {
        name: text_or(NAME_KEY, DEFAULT_NAME),
        alias: text_or(ALIAS_KEY, DEFAULT_ALIAS),
    };
    reporter.info(format!("Name: {}  Alias: {}", profile.name, profile.alias));
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{ready_cloud, recording};

    #[tokio::test]
    async fn defaults_when_nothing_saved() {
        let cloud = ready_cloud().await;
        let (reporter, _) = recording();

        let profile = run(&cloud, &reporter, None, None).await.unwrap();
        assert_eq!(profile.name, DEFAULT_NAME);
        assert_eq!(profile.alias, DEFAULT_ALIAS);
    }

    #[tokio::test]
    async fn saved_fields_come_back() {
        let cloud = ready_cloud().await;
        let (reporter, lines) = recording();

        let profile = run(&cloud, &reporter, Some("Paul".into()), None)
            .await
            .unwrap();
        assert_eq!(profile.name, "Paul");
        assert_eq!(profile.alias, DEFAULT_ALIAS);

        let profile = run(&cloud, &reporter, None, Some("Muad'Dib".into()))
            .await
            .unwrap();
        assert_eq!(profile.name, "Paul");
        assert_eq!(profile.alias, "Muad'Dib");

        assert!(lines.lock().unwrap().iter().all(|l| !l.is_error()));
    }

    #[tokio::test]
    async fn not_signed_in_fails() {
        let cloud = crate::commands::local_cloud("cli-test");
        let (reporter, lines) = recording();

        let err = run(&cloud, &reporter, Some("Paul".into()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Store(ref e) if e.is_gate()));
        assert!(lines.lock().unwrap()[0].is_error());
    }
}
