use serde::{Deserialize, Serialize};

/// One catalog record.
///
/// `id` is assigned by the remote source. A hero that has not been created yet
/// carries `None`; once assigned the id never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, alias = "realName")]
    pub alternate_identity: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub alignment: Option<String>,
    #[serde(default, alias = "team")]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub first_appearance: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub powers: Vec<String>,
}

impl Hero {
    /// Create a hero candidate with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_powers<I, S>(mut self, powers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.powers = powers.into_iter().map(Into::into).collect();
        self
    }

    /// True if this hero carries the given id.
    pub fn has_id(&self, id: i64) -> bool {
        self.id == Some(id)
    }
}

/// A page of heroes plus the total count of the entire remote collection.
///
/// This is the one canonical page shape. Older server payloads named the fields
/// `data`/`totalHeroes` or `heroes`/`heroesCount`; those names are accepted on
/// read and never written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct HeroesPage {
    #[serde(alias = "data", alias = "heroes")]
    pub items: Vec<Hero>,
    #[serde(alias = "totalHeroes", alias = "heroesCount")]
    pub total_count: u64,
}

impl HeroesPage {
    pub fn new(items: Vec<Hero>, total_count: u64) -> Self {
        Self { items, total_count }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a hero in this page by id
    pub fn find(&self, id: i64) -> Option<&Hero> {
        self.items.iter().find(|h| h.has_id(id))
    }
}
