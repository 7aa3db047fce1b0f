use crate::api::{ApiClient, ArticleStore};
use crate::cli::ThumbnailArgs;
use crate::error::{Result, SeoError};
use crate::export::{read_article_set, select_article};
use crate::formats::Article;
use crate::gemini::{GeminiModel, GenerativeModel};
use crate::settings::Settings;

pub async fn run(args: ThumbnailArgs) -> anyhow::Result<()> {
    let articles = read_article_set(&args.articles)?;
    let (_, article) = select_article(&articles, args.locale.as_deref())?;

    let model = GeminiModel::from_env()?;
    let client = ApiClient::new(&Settings::from_env()?.api_url)?;
    let url = generate_thumbnail(&model, &client, article, &args.keyword).await?;
    println!("{url}");
    Ok(())
}

const MAX_THEMES: usize = 5;

/// Prompt for a header image: the title, the primary keyword and the first
/// five themes (primary keyword, then the article's LSI keywords), no text.
pub fn thumbnail_prompt(article: &Article, primary_keyword: &str) -> String {
    let primary = primary_keyword.trim();
    let themes = std::iter::once(primary)
        .chain(article.lsi_keywords.iter().map(String::as_str))
        .take(MAX_THEMES)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Create a visually stunning and professional blog header image for an article titled \"{title}\". \
The central topic is \"{primary}\". The image should be conceptual or abstract, evoking themes like {themes}. \
It needs to be high-quality, modern, and suitable for a professional blog. Absolutely no text in the image.",
        title = article.title,
    )
}

/// Generates a header image for `article` and uploads it, returning its URL.
pub async fn generate_thumbnail(
    model: &dyn GenerativeModel,
    store: &dyn ArticleStore,
    article: &Article,
    primary_keyword: &str,
) -> Result<String> {
    if primary_keyword.trim().is_empty() {
        return Err(SeoError::Validation("primary keyword must not be empty".to_owned()));
    }

    tracing::info!(title = %article.title, "generate thumbnail");
    let data_url = model
        .generate_image(&thumbnail_prompt(article, primary_keyword))
        .await
        .map_err(|err| SeoError::generation("generate image", format!("{err:#}")))?;

    let url = store.upload_image(&data_url).await?;
    tracing::info!(url = %url, "thumbnail uploaded");
    Ok(url)
}
