//! Built-in assistant profiles: naming, prompt and seed corpus per domain.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::Document;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    #[default]
    MentalHealth,
    Books,
}

impl Domain {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MentalHealth => "mental_health",
            Self::Books => "books",
        }
    }

    /// Singular, lowercase name of one document as used in API messages.
    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            Self::MentalHealth => "resource",
            Self::Books => "chat",
        }
    }

    #[must_use]
    pub fn noun_title(self) -> &'static str {
        match self {
            Self::MentalHealth => "Resource",
            Self::Books => "Chat",
        }
    }

    #[must_use]
    pub fn default_route_prefix(self) -> &'static str {
        match self {
            Self::MentalHealth => "resources",
            Self::Books => "chat",
        }
    }

    #[must_use]
    pub fn default_collection(self) -> &'static str {
        match self {
            Self::MentalHealth => "mental_health_resources",
            Self::Books => "book_knowledge",
        }
    }

    #[must_use]
    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::MentalHealth => {
                "You are a mental health assistant providing emotional support and personalized recommendations."
            }
            Self::Books => {
                "You are a knowledgeable literary assistant who answers questions about books and recommends what to read next."
            }
        }
    }

    /// Heading placed above the retrieved context lines.
    #[must_use]
    pub fn context_heading(self) -> &'static str {
        match self {
            Self::MentalHealth => "Relevant resources:",
            Self::Books => "Relevant books:",
        }
    }

    #[must_use]
    pub fn seed_documents(self) -> Vec<Document> {
        match self {
            Self::MentalHealth => vec![
                Document::new(
                    "Mindful Breathing",
                    "A guided breathing exercise to help reduce anxiety and stress.",
                )
                .with_category("Exercise"),
                Document::new(
                    "Calm Music",
                    "A playlist of calming instrumental music to soothe your mind.",
                )
                .with_category("Music"),
                Document::new(
                    "Therapist Directory",
                    "A list of licensed therapists available for online consultations.",
                )
                .with_category("Professional Help"),
            ],
            Self::Books => vec![
                Document::new(
                    "1984",
                    "A dystopian novel about totalitarian surveillance and the manipulation of truth.",
                )
                .with_author("George Orwell", Some(1949)),
                Document::new(
                    "Pride and Prejudice",
                    "A romantic comedy of manners about marriage, class and first impressions in Regency England.",
                )
                .with_author("Jane Austen", Some(1813)),
                Document::new(
                    "To Kill a Mockingbird",
                    "A coming-of-age story about racial injustice in a small Alabama town, told by a young girl.",
                )
                .with_author("Harper Lee", Some(1960)),
            ],
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "mental_health" | "resources" => Ok(Self::MentalHealth),
            "books" | "book" => Ok(Self::Books),
            other => Err(format!(
                "unknown domain '{other}', expected 'mental_health' or 'books'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_are_valid_and_uniquely_named() {
        for domain in [Domain::MentalHealth, Domain::Books] {
            let seed = domain.seed_documents();
            assert_eq!(seed.len(), 3);
            assert!(seed.iter().all(Document::is_valid));
            let mut names: Vec<_> = seed.iter().map(|d| d.name.as_str()).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), 3);
        }
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!("mental-health".parse::<Domain>().unwrap(), Domain::MentalHealth);
        assert_eq!("Books".parse::<Domain>().unwrap(), Domain::Books);
        assert!("poetry".parse::<Domain>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let d: Domain = serde_json::from_str("\"mental_health\"").unwrap();
        assert_eq!(d, Domain::MentalHealth);
        assert_eq!(Domain::Books.to_string(), "books");
    }

    #[test]
    fn naming_per_domain() {
        assert_eq!(Domain::MentalHealth.default_route_prefix(), "resources");
        assert_eq!(Domain::Books.default_route_prefix(), "chat");
        assert_eq!(Domain::Books.noun_title(), "Chat");
    }
}
