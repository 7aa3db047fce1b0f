use std::cmp::Ordering;
use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

use crate::cli::ResearchArgs;
use crate::error::{Result, SeoError};
use crate::export::write_output;
use crate::formats::{KeywordSuggestion, SearchIntent};
use crate::gemini::{GeminiModel, GenerativeModel};

pub async fn run(args: ResearchArgs) -> anyhow::Result<()> {
    if let Some(out) = &args.out
        && Path::new(out).exists()
        && !args.force
    {
        anyhow::bail!("research output already exists: {out}");
    }

    let model = GeminiModel::from_env()?;
    let keywords = research(&model, &args.topic).await?;

    if let Some(out) = &args.out {
        let json = serde_json::to_string_pretty(&keywords).context("serialize keywords")?;
        write_output(Path::new(out), &json, args.force)?;
        tracing::info!(out = %out, keywords = keywords.len(), "wrote keyword research");
    }

    let query = KeywordQuery {
        filter: args.filter.unwrap_or_default(),
        sort_key: args.sort,
        direction: if args.asc {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        },
    };
    for keyword in filter_and_sort(&keywords, &query) {
        println!(
            "{:>3}  {:<9}  {:<13}  {}",
            keyword.relevance, keyword.kind, keyword.intent, keyword.keyword
        );
    }
    Ok(())
}

/// Reads a research snapshot written by `research --out`.
pub fn read_research(path: &str) -> anyhow::Result<Vec<KeywordSuggestion>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read research: {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parse research: {path}"))
}

pub fn keyword_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "keywords": {
                "type": "ARRAY",
                "description": "A comprehensive list of 20-30 keyword suggestions.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "keyword": { "type": "STRING" },
                        "type": { "type": "STRING", "enum": ["Related", "LSI", "Long-tail"] },
                        "intent": {
                            "type": "STRING",
                            "enum": ["Informational", "Commercial", "Transactional", "Navigational"]
                        },
                        "relevance": {
                            "type": "INTEGER",
                            "description": "A score from 1 to 100 for relevance."
                        }
                    },
                    "required": ["keyword", "type", "intent", "relevance"]
                }
            }
        },
        "required": ["keywords"]
    })
}

pub fn research_prompt(topic: &str) -> String {
    format!(
        "Act as a senior SEO strategist. For the primary topic \"{topic}\", generate a comprehensive list \
of 20-30 related keywords, LSI keywords, and long-tail variations. For each keyword, determine the likely \
user search intent (Informational, Commercial, Transactional, or Navigational) and a relevance score from \
1-100 indicating how closely it relates to the primary topic. Provide the output as a JSON object that \
strictly adheres to the provided schema."
    )
}

#[derive(Debug, Deserialize)]
struct ResearchResponse {
    keywords: Vec<KeywordSuggestion>,
}

/// Asks the provider for keyword candidates around `topic`.
///
/// Relevance and intent are taken as returned; nothing is rescored here.
pub async fn research(model: &dyn GenerativeModel, topic: &str) -> Result<Vec<KeywordSuggestion>> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(SeoError::Validation("topic must not be empty".to_owned()));
    }

    tracing::info!(topic, "keyword research");
    let raw = model
        .generate_json(&research_prompt(topic), &keyword_schema())
        .await
        .map_err(|err| SeoError::generation("research keywords", format!("{err:#}")))?;

    let response: ResearchResponse = serde_json::from_str(&raw)
        .map_err(|err| SeoError::generation("research keywords", format!("invalid response: {err}")))?;

    tracing::info!(topic, keywords = response.keywords.len(), "keyword research done");
    Ok(response.keywords)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    Keyword,
    Type,
    Intent,
    Relevance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct KeywordQuery {
    pub filter: String,
    pub sort_key: SortKey,
    pub direction: SortDirection,
}

impl Default for KeywordQuery {
    fn default() -> Self {
        Self {
            filter: String::new(),
            sort_key: SortKey::Relevance,
            direction: SortDirection::Desc,
        }
    }
}

/// Filters by case-insensitive substring and sorts (stable) by the query key.
pub fn filter_and_sort(keywords: &[KeywordSuggestion], query: &KeywordQuery) -> Vec<KeywordSuggestion> {
    let needle = query.filter.to_lowercase();
    let mut result = keywords
        .iter()
        .filter(|k| k.keyword.to_lowercase().contains(&needle))
        .cloned()
        .collect::<Vec<_>>();

    result.sort_by(|a, b| {
        let ordering = compare(a, b, query.sort_key);
        match query.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    result
}

fn compare(a: &KeywordSuggestion, b: &KeywordSuggestion, key: SortKey) -> Ordering {
    match key {
        SortKey::Keyword => a.keyword.cmp(&b.keyword),
        SortKey::Type => a.kind.to_string().cmp(&b.kind.to_string()),
        SortKey::Intent => a.intent.to_string().cmp(&b.intent.to_string()),
        SortKey::Relevance => a.relevance.cmp(&b.relevance),
    }
}

/// Intent of `keyword` as reported by research, matched case-insensitively.
pub fn intent_for(research: &[KeywordSuggestion], keyword: &str) -> Option<SearchIntent> {
    let keyword = keyword.trim().to_lowercase();
    research
        .iter()
        .find(|suggestion| suggestion.keyword.to_lowercase() == keyword)
        .map(|suggestion| suggestion.intent)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::formats::KeywordType;

    struct CannedModel {
        reply: anyhow::Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedModel {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_owned()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerativeModel for CannedModel {
        async fn generate_json(
            &self,
            prompt: &str,
            _schema: &serde_json::Value,
        ) -> anyhow::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_owned());
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(err) => Err(anyhow::anyhow!("{err}")),
            }
        }

        async fn generate_image(&self, _prompt: &str) -> anyhow::Result<String> {
            anyhow::bail!("not used")
        }
    }

    fn suggestion(keyword: &str, kind: KeywordType, intent: SearchIntent, relevance: u32) -> KeywordSuggestion {
        KeywordSuggestion {
            keyword: keyword.to_owned(),
            kind,
            intent,
            relevance,
        }
    }

    #[tokio::test]
    async fn research_returns_provider_suggestions() {
        let model = CannedModel::ok(
            r#"{"keywords": [
                {"keyword": "ev charging", "type": "Related", "intent": "Informational", "relevance": 92},
                {"keyword": "best ev 2026", "type": "Long-tail", "intent": "Commercial", "relevance": 71}
            ]}"#,
        );

        let keywords = research(&model, "  electric vehicles ").await.unwrap();
        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[1].kind, KeywordType::LongTail);
        assert_eq!(keywords[1].relevance, 71);

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("\"electric vehicles\""));
        assert!(prompts[0].contains("20-30"));
    }

    #[tokio::test]
    async fn research_rejects_blank_topic_without_calling_provider() {
        let model = CannedModel::ok("{}");
        let err = research(&model, "   ").await.unwrap_err();
        assert!(matches!(err, SeoError::Validation(_)));
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn research_reports_provider_and_schema_failures() {
        let model = CannedModel {
            reply: Err(anyhow::anyhow!("quota exceeded")),
            prompts: Mutex::new(Vec::new()),
        };
        let err = research(&model, "ev").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to research keywords: quota exceeded");

        let model = CannedModel::ok(r#"{"keywords": [{"keyword": "x", "type": "Other"}]}"#);
        let err = research(&model, "ev").await.unwrap_err();
        assert!(err.is_generation_failure());
        assert!(err.to_string().contains("invalid response"));
    }

    #[test]
    fn filter_and_sort_by_relevance_desc_by_default() {
        let keywords = vec![
            suggestion("EV charging", KeywordType::Related, SearchIntent::Informational, 60),
            suggestion("ev battery", KeywordType::Lsi, SearchIntent::Commercial, 90),
            suggestion("solar roof", KeywordType::Related, SearchIntent::Commercial, 95),
        ];

        let query = KeywordQuery {
            filter: "EV".to_owned(),
            ..KeywordQuery::default()
        };
        let result = filter_and_sort(&keywords, &query);
        let names = result.iter().map(|k| k.keyword.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["ev battery", "EV charging"]);

        let query = KeywordQuery {
            filter: String::new(),
            sort_key: SortKey::Intent,
            direction: SortDirection::Asc,
        };
        let result = filter_and_sort(&keywords, &query);
        let names = result.iter().map(|k| k.keyword.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["ev battery", "solar roof", "EV charging"]);
    }

    #[test]
    fn intent_for_matches_case_insensitively() {
        let research = vec![
            suggestion("EV Charging", KeywordType::Related, SearchIntent::Transactional, 80),
            suggestion("ev range", KeywordType::Lsi, SearchIntent::Informational, 50),
        ];
        assert_eq!(intent_for(&research, " ev charging"), Some(SearchIntent::Transactional));
        assert_eq!(intent_for(&research, "solar"), None);
    }
}
