use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context as _;

use crate::api::{ApiClient, ArticleStore};
use crate::cli::{DeleteArgs, ListArgs, SaveArgs, ShowArgs};
use crate::error::{Result, SeoError};
use crate::export::{read_article_bundle, to_markdown, write_article_bundle, write_output};
use crate::formats::{
    ArticleBundle, ArticleSet, GenerationSettings, KeywordSuggestion, NewSavedArticle,
    SavedArticle, SearchIntent, SeoAnalysisData,
};
use crate::research::{intent_for, read_research};
use crate::seo;
use crate::settings::Settings;

pub async fn run_save(args: SaveArgs) -> anyhow::Result<()> {
    let bundle = read_article_bundle(&args.articles)?;
    let Some(generation_settings) = bundle.generation_settings else {
        anyhow::bail!(
            "{} carries no generation settings; write it with `generate` or `show`",
            args.articles
        );
    };
    let keyword_research = args.research.as_deref().map(read_research).transpose()?;

    let draft = SaveDraft {
        primary_keyword: args.keyword.trim().to_owned(),
        user_lsi_keywords: split_keywords(&args.lsi),
        articles: bundle.articles,
        thumbnail_url: args.thumbnail_url,
        generation_settings,
        search_intent: args.intent,
        keyword_research,
    };
    let record = compose(draft)?;

    let client = ApiClient::new(&Settings::from_env()?.api_url)?;
    let saved = client.create(&record).await?;
    println!("{}", saved.id);
    Ok(())
}

pub async fn run_list(args: ListArgs) -> anyhow::Result<()> {
    let client = ApiClient::new(&Settings::from_env()?.api_url)?;
    let articles = client.list().await?;

    if args.json {
        let json = serde_json::to_string_pretty(&articles).context("serialize saved articles")?;
        println!("{json}");
        return Ok(());
    }

    for article in &articles {
        let locales = article.record.articles.locales().collect::<Vec<_>>().join(",");
        println!(
            "{}  {}  {}  [{locales}]",
            article.id,
            article.saved_at.format("%Y-%m-%d %H:%M:%S"),
            article.record.primary_keyword,
        );
    }
    Ok(())
}

pub async fn run_show(args: ShowArgs) -> anyhow::Result<()> {
    let client = ApiClient::new(&Settings::from_env()?.api_url)?;
    let saved = find_saved(&client, args.id.trim()).await?;
    let record = saved.record;

    if let Some(out) = &args.out {
        let bundle = ArticleBundle {
            generation_settings: Some(record.generation_settings.clone()),
            articles: record.articles.clone(),
        };
        write_article_bundle(Path::new(out), &bundle, args.force)?;
        tracing::info!(id = %saved.id, out = %out, "wrote saved articles");
    }
    if let Some(out) = &args.research_out {
        let research = record.keyword_research_data.as_deref().unwrap_or_default();
        let json = serde_json::to_string_pretty(research).context("serialize keyword research")?;
        write_output(Path::new(out), &json, args.force)?;
    }

    print!("{}", describe(&saved.id, &saved.saved_at.to_rfc3339(), &record));
    Ok(())
}

/// Looks a saved article up by id in the store's listing.
pub async fn find_saved(store: &dyn ArticleStore, id: &str) -> Result<SavedArticle> {
    store
        .list()
        .await?
        .into_iter()
        .find(|article| article.id == id)
        .ok_or_else(|| SeoError::NotFound(id.to_owned()))
}

/// Summary of a saved record: everything needed to replay its generation.
pub fn describe(id: &str, saved_at: &str, record: &NewSavedArticle) -> String {
    let settings = &record.generation_settings;
    let mut out = String::new();
    let _ = writeln!(out, "id: {id}");
    let _ = writeln!(out, "saved at: {saved_at}");
    let _ = writeln!(out, "keyword: {}", record.primary_keyword);
    let _ = writeln!(out, "user keywords: {}", record.user_lsi_keywords.join(", "));
    if let Some(intent) = record.search_intent {
        let _ = writeln!(out, "search intent: {intent}");
    }
    if let Some(url) = &record.thumbnail_url {
        let _ = writeln!(out, "thumbnail: {url}");
    }
    let _ = writeln!(out, "length: {}", settings.length.label());
    let _ = writeln!(out, "table: {}", settings.include_table);
    let _ = writeln!(out, "in-article images: {}", settings.include_in_article_images);
    let _ = writeln!(out, "locales: {}", settings.locales.join(","));
    if let Some(research) = &record.keyword_research_data {
        let _ = writeln!(out, "keyword research: {} keywords", research.len());
    }
    out
}

pub async fn run_delete(args: DeleteArgs) -> anyhow::Result<()> {
    let client = ApiClient::new(&Settings::from_env()?.api_url)?;
    client.delete(args.id.trim()).await?;
    Ok(())
}

/// Caller-supplied inputs of a save, before rendering and analysis.
#[derive(Debug, Clone)]
pub struct SaveDraft {
    pub primary_keyword: String,
    pub user_lsi_keywords: Vec<String>,
    pub articles: ArticleSet,
    pub thumbnail_url: Option<String>,
    pub generation_settings: GenerationSettings,
    pub search_intent: Option<SearchIntent>,
    pub keyword_research: Option<Vec<KeywordSuggestion>>,
}

/// Aggregates a draft plus its rendered Markdown and analysis into a record
/// ready for persistence. Fails with [`SeoError::NoContent`] on an empty set.
pub fn assemble(
    draft: SaveDraft,
    markdown_content: String,
    seo_analysis: SeoAnalysisData,
) -> Result<NewSavedArticle> {
    if draft.articles.is_empty() {
        return Err(SeoError::NoContent);
    }

    Ok(NewSavedArticle {
        primary_keyword: draft.primary_keyword,
        user_lsi_keywords: draft.user_lsi_keywords,
        articles: draft.articles,
        markdown_content,
        thumbnail_url: draft.thumbnail_url,
        generation_settings: draft.generation_settings,
        search_intent: draft.search_intent,
        seo_analysis,
        keyword_research_data: draft.keyword_research,
    })
}

/// Renders and analyzes the first locale of the draft, then assembles it.
///
/// Without an explicit search intent, the intent reported by keyword research
/// for the primary keyword is used.
pub fn compose(mut draft: SaveDraft) -> Result<NewSavedArticle> {
    if draft.primary_keyword.trim().is_empty() {
        return Err(SeoError::Validation("primary keyword must not be empty".to_owned()));
    }
    let Some((locale, article)) = draft.articles.first() else {
        return Err(SeoError::NoContent);
    };

    let markdown = to_markdown(article);
    let analysis = seo::analyze(article, &draft.primary_keyword, &draft.user_lsi_keywords);
    tracing::debug!(
        locale,
        word_count = analysis.word_count,
        "compose saved article"
    );

    if draft.search_intent.is_none()
        && let Some(research) = &draft.keyword_research
    {
        draft.search_intent = intent_for(research, &draft.primary_keyword);
    }

    assemble(draft, markdown, analysis)
}

/// Splits comma-separated keyword input, dropping blanks.
pub fn split_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_owned)
        .collect()
}
