use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use anyhow::Context as _;
use regex::Regex;

use crate::cli::GenerateArgs;
use crate::error::{Result, SeoError};
use crate::export::write_article_bundle;
use crate::formats::{Article, ArticleBundle, ArticleLength, ArticleSet, GenerationSettings};
use crate::gemini::{GeminiModel, GenerativeModel};
use crate::saved::split_keywords;
use crate::settings::{Settings, parse_locales};

pub async fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let locales = if args.locales.is_empty() {
        Settings::from_env()?.article_locales
    } else {
        parse_locales(args.locales.iter().map(String::as_str))?
    };

    let request = GenerationRequest {
        topic: args.topic,
        length: args.length,
        user_lsi_keywords: split_keywords(&args.lsi),
        locales,
        include_table: args.table,
        include_in_article_images: args.images,
    };

    let out = Path::new(&args.out);
    if out.exists() && !args.force {
        anyhow::bail!("generate output already exists: {}", out.display());
    }

    let model: Arc<dyn GenerativeModel> = Arc::new(GeminiModel::from_env()?);
    let articles = generate(model, &request).await?;

    let bundle = ArticleBundle {
        generation_settings: Some(request.settings()),
        articles,
    };
    write_article_bundle(out, &bundle, args.force)?;

    for (locale, article) in bundle.articles.iter() {
        let images = image_placeholders(&article.body_text()).len();
        println!(
            "{locale}\t{title}\t({sections} sections, {images} image placeholders)",
            title = article.title,
            sections = article.sections.len(),
        );
    }
    Ok(())
}

/// Everything needed to generate one article per locale.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub topic: String,
    pub length: ArticleLength,
    pub user_lsi_keywords: Vec<String>,
    pub locales: Vec<String>,
    pub include_table: bool,
    pub include_in_article_images: bool,
}

impl GenerationRequest {
    pub fn settings(&self) -> GenerationSettings {
        GenerationSettings {
            length: self.length,
            include_table: self.include_table,
            include_in_article_images: self.include_in_article_images,
            locales: self.locales.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(SeoError::Validation("topic must not be empty".to_owned()));
        }
        if self.locales.is_empty() {
            return Err(SeoError::Validation(
                "at least one target locale is required".to_owned(),
            ));
        }
        for (idx, locale) in self.locales.iter().enumerate() {
            if locale.trim().is_empty() {
                return Err(SeoError::Validation(format!("locale #{idx} is empty")));
            }
            if self.locales[..idx].contains(locale) {
                return Err(SeoError::Validation(format!("duplicate locale: {locale}")));
            }
        }
        Ok(())
    }
}

pub fn article_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "An engaging, SEO-friendly title for the article. It must contain the primary keyword."
            },
            "metaDescription": {
                "type": "STRING",
                "description": "A concise summary for search engine results pages (SERPs), between 150-160 characters. It must include the primary keyword."
            },
            "sections": {
                "type": "ARRAY",
                "description": "The main content of the article, divided into logical sections.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "heading": {
                            "type": "STRING",
                            "description": "A descriptive heading (H2 or H3) for the section. It should be keyword-rich where natural."
                        },
                        "content": {
                            "type": "STRING",
                            "description": "The paragraph(s) for this section. Informative, easy to read, naturally incorporating the primary keyword and related LSI keywords. At least 2-3 paragraphs per section."
                        }
                    },
                    "required": ["heading", "content"]
                }
            },
            "faq": {
                "type": "ARRAY",
                "description": "A list of 3-5 frequently asked questions related to the topic, formatted for a 'People Also Ask' section.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "question": { "type": "STRING", "description": "A relevant question about the topic." },
                        "answer": { "type": "STRING", "description": "A clear and concise answer to the question." }
                    },
                    "required": ["question", "answer"]
                }
            },
            "lsiKeywords": {
                "type": "ARRAY",
                "description": "The top 5-7 most relevant LSI keywords naturally used throughout the article. This can include user-provided keywords.",
                "items": { "type": "STRING" }
            }
        },
        "required": ["title", "metaDescription", "sections", "faq", "lsiKeywords"]
    })
}

pub fn article_prompt(request: &GenerationRequest, locale: &str) -> String {
    let topic = request.topic.trim();
    let mut prompt = format!(
        "Generate a comprehensive, high-quality, and SEO-optimized article about \"{topic}\". \
The article MUST be written in the language with locale code: \"{locale}\". {length} \
The article must be unique, engaging, and provide genuine value to the reader. \
Ensure the primary keyword \"{topic}\" is used appropriately in the title, meta description, headings, \
and throughout the content. Also include semantically related keywords (LSI keywords) to enhance \
context and relevance.",
        length = request.length.instruction(),
    );

    if !request.user_lsi_keywords.is_empty() {
        prompt.push_str(&format!(
            " In addition to the keywords you identify, you MUST naturally incorporate the following \
user-provided keywords into the article: {}.",
            request.user_lsi_keywords.join(", ")
        ));
    }
    if request.include_table {
        prompt.push_str(
            " If the topic is suitable (e.g., for comparisons, data, specifications), include one relevant, \
well-structured markdown table within the article content.",
        );
    }
    if request.include_in_article_images {
        prompt.push_str(
            " Strategically place 2-3 image placeholders throughout the article where visuals would be most \
impactful. Use the exact format `[IMAGE: A descriptive prompt for a relevant image]`. \
Example: `[IMAGE: A diagram showing the process of photosynthesis]`.",
        );
    }

    prompt.push_str(
        " Identify and list the top 5-7 LSI keywords you used (this list can include some of the \
user-provided ones if you used them). The tone should be authoritative yet accessible. \
Structure the output as a JSON object that strictly follows the provided schema.",
    );
    prompt
}

/// Parses one provider payload into an [`Article`], rejecting shape violations.
pub fn parse_article(raw: &str) -> anyhow::Result<Article> {
    let article: Article = serde_json::from_str(raw.trim()).context("parse article json")?;
    if article.sections.is_empty() {
        anyhow::bail!("article has no sections");
    }
    Ok(article)
}

static IMAGE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[IMAGE:\s*([^\]]+?)\s*\]").expect("image placeholder pattern is valid")
});

/// Descriptions of the `[IMAGE: ...]` placeholders in `text`, in order.
pub fn image_placeholders(text: &str) -> Vec<&str> {
    IMAGE_PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Generates one article per requested locale, concurrently.
///
/// Returns only when every locale succeeded. The first failure is returned
/// immediately; the remaining requests keep running detached and their
/// results are dropped.
pub async fn generate(
    model: Arc<dyn GenerativeModel>,
    request: &GenerationRequest,
) -> Result<ArticleSet> {
    request.validate()?;

    let requested = request.locales.len();
    tracing::info!(
        topic = %request.topic,
        length = ?request.length,
        locales = ?request.locales,
        "generate articles"
    );

    let schema = Arc::new(article_schema());
    let started_at = Instant::now();
    let mut join_set = tokio::task::JoinSet::new();
    for (idx, locale) in request.locales.iter().enumerate() {
        let model = Arc::clone(&model);
        let schema = Arc::clone(&schema);
        let prompt = article_prompt(request, locale);
        let locale = locale.clone();

        join_set.spawn(async move {
            tracing::debug!(locale = %locale, "generate article for locale");
            let outcome = match model.generate_json(&prompt, &schema).await {
                Ok(raw) => parse_article(&raw),
                Err(err) => Err(err),
            };
            (idx, locale, outcome)
        });
    }

    let mut results: Vec<Option<Article>> = vec![None; requested];
    while let Some(joined) = join_set.join_next().await {
        let (idx, locale, outcome) = match joined {
            Ok(joined) => joined,
            Err(err) => {
                join_set.detach_all();
                return Err(SeoError::generation(
                    "generate article",
                    format!("locale task failed: {err}"),
                ));
            }
        };

        match outcome {
            Ok(article) => {
                tracing::debug!(
                    locale = %locale,
                    sections = article.sections.len(),
                    "locale done"
                );
                results[idx] = Some(article);
            }
            Err(err) => {
                tracing::warn!(locale = %locale, error = %format!("{err:#}"), "locale failed");
                join_set.detach_all();
                let message = format!("{err:#}");
                if requested == 1 {
                    return Err(SeoError::Generation {
                        action: "generate article",
                        message,
                    });
                }
                return Err(SeoError::PartialLocaleFailure {
                    locale,
                    requested,
                    message,
                });
            }
        }
    }

    let mut set = ArticleSet::new();
    for (locale, article) in request.locales.iter().zip(results) {
        let article = article.ok_or_else(|| {
            SeoError::generation("generate article", format!("missing result for locale {locale}"))
        })?;
        set.insert(locale.clone(), article);
    }

    tracing::info!(
        locales = set.len(),
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "generate articles done"
    );
    Ok(set)
}
