//! Phrase catalog and selection.
//!
//! The catalog is the fixed set of phrases the hooks can speak, which is
//! also what the pre-warmer caches. Selection takes an injected RNG.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

pub const NOTIFICATION_MESSAGE: &str = "Your agent needs your input";

pub const COMPLETION_MESSAGES: [&str; 20] = [
    "Work complete!",
    "All done!",
    "Task finished!",
    "Job complete!",
    "Ready for next task!",
    "Mission accomplished!",
    "Task complete!",
    "Finished successfully!",
    "All set!",
    "Done and dusted!",
    "Wrapped up!",
    "Job well done!",
    "That's a wrap!",
    "Successfully completed!",
    "All finished!",
    "Task accomplished!",
    "Good to go!",
    "Completed successfully!",
    "Everything's done!",
    "Ready when you are!",
];

pub fn personalized_notification(name: &str) -> String {
    format!("{name}, your agent needs your input")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Notification,
    Completion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub category: Category,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    entries: Vec<CatalogEntry>,
}

impl MessageCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Every phrase the hooks can produce, notification first.
    pub fn default_catalog(engineer_name: Option<&str>) -> Self {
        let mut entries = vec![CatalogEntry {
            category: Category::Notification,
            text: NOTIFICATION_MESSAGE.to_string(),
        }];
        if let Some(name) = engineer_name {
            entries.push(CatalogEntry {
                category: Category::Notification,
                text: personalized_notification(name),
            });
        }
        entries.extend(COMPLETION_MESSAGES.iter().map(|text| CatalogEntry {
            category: Category::Completion,
            text: (*text).to_string(),
        }));
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Chooses what to say for each hook event.
#[derive(Debug, Clone)]
pub struct PhraseSelector {
    engineer_name: Option<String>,
    personalize_probability: f64,
}

impl PhraseSelector {
    pub fn new(engineer_name: Option<&str>, personalize_probability: f64) -> Self {
        Self {
            engineer_name: engineer_name.map(str::to_string),
            personalize_probability: personalize_probability.clamp(0.0, 1.0),
        }
    }

    /// Returns the phrase and whether it was personalized.
    pub fn notification<R: Rng + ?Sized>(&self, rng: &mut R) -> (String, bool) {
        match &self.engineer_name {
            Some(name) if rng.gen::<f64>() < self.personalize_probability => {
                (personalized_notification(name), true)
            }
            _ => (NOTIFICATION_MESSAGE.to_string(), false),
        }
    }

    pub fn completion<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        COMPLETION_MESSAGES
            .choose(rng)
            .copied()
            .unwrap_or(COMPLETION_MESSAGES[0])
            .to_string()
    }
}
