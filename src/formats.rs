use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeywordType {
    Related,
    #[serde(rename = "LSI")]
    Lsi,
    #[serde(rename = "Long-tail")]
    LongTail,
}

impl fmt::Display for KeywordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Related => "Related",
            Self::Lsi => "LSI",
            Self::LongTail => "Long-tail",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(clap::ValueEnum)]
pub enum SearchIntent {
    Informational,
    Commercial,
    Transactional,
    Navigational,
}

impl fmt::Display for SearchIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Informational => "Informational",
            Self::Commercial => "Commercial",
            Self::Transactional => "Transactional",
            Self::Navigational => "Navigational",
        })
    }
}

/// A keyword candidate as scored by the research provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordSuggestion {
    pub keyword: String,
    #[serde(rename = "type")]
    pub kind: KeywordType,
    pub intent: SearchIntent,
    /// Provider-assigned, 1-100.
    pub relevance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub meta_description: String,
    pub sections: Vec<Section>,
    pub faq: Vec<Faq>,
    pub lsi_keywords: Vec<String>,
}

impl Article {
    /// Concatenated section bodies, the text SEO statistics are computed on.
    pub fn body_text(&self) -> String {
        self.sections
            .iter()
            .map(|section| section.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Generated articles keyed by locale, in request order.
///
/// Serialized as a JSON object; deserialization keeps document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleSet {
    entries: Vec<(String, Article)>,
}

impl ArticleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the article for `locale`, keeping its first position.
    pub fn insert(&mut self, locale: impl Into<String>, article: Article) {
        let locale = locale.into();
        match self.entries.iter_mut().find(|(key, _)| *key == locale) {
            Some(entry) => entry.1 = article,
            None => self.entries.push((locale, article)),
        }
    }

    pub fn get(&self, locale: &str) -> Option<&Article> {
        self.entries
            .iter()
            .find(|(key, _)| key == locale)
            .map(|(_, article)| article)
    }

    pub fn first(&self) -> Option<(&str, &Article)> {
        self.entries
            .first()
            .map(|(locale, article)| (locale.as_str(), article))
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(locale, _)| locale.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Article)> {
        self.entries
            .iter()
            .map(|(locale, article)| (locale.as_str(), article))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Article)> for ArticleSet {
    fn from_iter<I: IntoIterator<Item = (String, Article)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (locale, article) in iter {
            set.insert(locale, article);
        }
        set
    }
}

impl Serialize for ArticleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (locale, article) in &self.entries {
            map.serialize_entry(locale, article)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ArticleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ArticleSetVisitor;

        impl<'de> Visitor<'de> for ArticleSetVisitor {
            type Value = ArticleSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of locale code to article")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ArticleSet, A::Error> {
                let mut set = ArticleSet::new();
                while let Some((locale, article)) = access.next_entry::<String, Article>()? {
                    set.insert(locale, article);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(ArticleSetVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(clap::ValueEnum)]
pub enum ArticleLength {
    #[serde(rename = "very short")]
    VeryShort,
    #[serde(rename = "short")]
    Short,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "long")]
    Long,
    #[serde(rename = "very long")]
    VeryLong,
    #[serde(rename = "epic")]
    Epic,
}

impl ArticleLength {
    pub fn label(self) -> &'static str {
        match self {
            Self::VeryShort => "very short",
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
            Self::VeryLong => "very long",
            Self::Epic => "epic",
        }
    }

    /// Length guidance sent to the generator (approximate words and sections).
    pub fn instruction(self) -> &'static str {
        match self {
            Self::VeryShort => {
                "The article should be a brief summary, around 250 words, with 1-2 main sections."
            }
            Self::Short => {
                "The article should be concise, around 500 words, with 2-3 main sections."
            }
            Self::Medium => {
                "The article should be detailed, around 1000 words, with 4-5 main sections."
            }
            Self::Long => {
                "The article should be comprehensive and in-depth, around 1500 words, with 6-8 main sections."
            }
            Self::VeryLong => {
                "The article should be extremely comprehensive and exhaustive, over 2000 words, with 8-10 main sections."
            }
            Self::Epic => {
                "The article must be an ultimate guide, extremely comprehensive and exhaustive, over 3000 words, with at least 10-12 detailed sections."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub length: ArticleLength,
    pub include_table: bool,
    pub include_in_article_images: bool,
    pub locales: Vec<String>,
}

/// An article set as exchanged between commands, with the settings it was
/// generated with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_settings: Option<GenerationSettings>,
    pub articles: ArticleSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordStat {
    pub keyword: String,
    pub frequency: usize,
    pub density: f64,
    pub is_primary: bool,
    pub is_user_provided: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoAnalysisData {
    pub word_count: usize,
    pub keyword_stats: Vec<KeywordStat>,
}

/// A saved-article record before the store assigns `id` and `savedAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSavedArticle {
    pub primary_keyword: String,
    pub user_lsi_keywords: Vec<String>,
    pub articles: ArticleSet,
    pub markdown_content: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub generation_settings: GenerationSettings,
    #[serde(default)]
    pub search_intent: Option<SearchIntent>,
    pub seo_analysis: SeoAnalysisData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_research_data: Option<Vec<KeywordSuggestion>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedArticle {
    pub id: String,
    pub saved_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: NewSavedArticle,
}
