use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::{ExportArgs, ExportFormat};
use crate::formats::{Article, ArticleBundle, ArticleSet};

pub fn run(args: ExportArgs) -> anyhow::Result<()> {
    let articles = read_article_set(&args.articles)?;
    let (locale, article) = select_article(&articles, args.locale.as_deref())?;

    let contents = match args.format {
        ExportFormat::Txt => to_plain_text(article),
        ExportFormat::Md => to_markdown(article),
    };

    if args.stdout {
        print!("{contents}");
        return Ok(());
    }

    let out = match args.out {
        Some(out) => PathBuf::from(out),
        None => PathBuf::from(default_file_name(article, args.format)),
    };
    tracing::info!(locale, out = %out.display(), format = ?args.format, "export article");
    write_output(&out, &contents, args.force)
}

pub fn read_article_set(path: &str) -> anyhow::Result<ArticleSet> {
    Ok(read_article_bundle(path)?.articles)
}

/// Reads an articles file written by `generate` or `show`.
///
/// A bare locale map is accepted too and yields no generation settings.
pub fn read_article_bundle(path: &str) -> anyhow::Result<ArticleBundle> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read articles: {path}"))?;
    parse_article_bundle(&raw).with_context(|| format!("parse articles: {path}"))
}

pub fn parse_article_bundle(raw: &str) -> anyhow::Result<ArticleBundle> {
    let value: serde_json::Value = serde_json::from_str(raw).context("parse json")?;
    if value.get("articles").is_some() {
        return serde_json::from_value(value).context("parse article bundle");
    }

    let articles: ArticleSet = serde_json::from_value(value).context("parse article set")?;
    Ok(ArticleBundle {
        generation_settings: None,
        articles,
    })
}

pub fn write_article_bundle(path: &Path, bundle: &ArticleBundle, force: bool) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(bundle).context("serialize articles")?;
    write_output(path, &json, force)
}

/// Picks `locale` from the set, or the first locale when none is given.
pub fn select_article<'a>(
    articles: &'a ArticleSet,
    locale: Option<&'a str>,
) -> anyhow::Result<(&'a str, &'a Article)> {
    match locale {
        Some(locale) => articles
            .get(locale)
            .map(|article| (locale, article))
            .ok_or_else(|| anyhow::anyhow!("locale not found in article set: {locale}")),
        None => articles
            .first()
            .ok_or_else(|| anyhow::anyhow!("article set is empty")),
    }
}

pub fn to_plain_text(article: &Article) -> String {
    let mut text = String::new();
    let _ = write!(text, "Title: {}\n\n", article.title);
    let _ = write!(text, "Meta Description: {}\n\n", article.meta_description);
    text.push_str("---\n\n");

    for section in &article.sections {
        let _ = write!(text, "## {}\n\n{}\n\n", section.heading, section.content);
    }
    push_faq(&mut text, article);
    text
}

pub fn to_markdown(article: &Article) -> String {
    let mut md = String::new();
    let _ = write!(md, "# {}\n\n", article.title);
    let _ = write!(md, "> {}\n\n", article.meta_description);
    md.push_str("---\n\n");

    for section in &article.sections {
        let _ = write!(
            md,
            "## {}\n\n{}\n\n",
            section.heading,
            normalize_line_breaks(&section.content)
        );
    }
    push_faq(&mut md, article);
    md
}

fn push_faq(out: &mut String, article: &Article) {
    if article.faq.is_empty() {
        return;
    }
    out.push_str("---\n\n## Frequently Asked Questions\n\n");
    for item in &article.faq {
        let _ = write!(out, "### {}\n\n{}\n\n", item.question, item.answer);
    }
}

/// Collapses every run of line breaks (`\r\n`, `\n`, `\r`) into one blank line.
///
/// Text without breaks is returned unchanged, and the result is a fixed point:
/// normalizing it again yields the same string.
pub fn normalize_line_breaks(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\n' && ch != '\r' {
            out.push(ch);
            continue;
        }
        while chars.next_if(|next| *next == '\n' || *next == '\r').is_some() {}
        out.push_str("\n\n");
    }
    out
}

pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.trim().to_lowercase().chars() {
        if ch.is_whitespace() || ch == '-' {
            if !slug.ends_with('-') {
                slug.push('-');
            }
        } else if ch.is_alphanumeric() || ch == '_' {
            slug.push(ch);
        }
    }
    slug
}

fn default_file_name(article: &Article, format: ExportFormat) -> String {
    let slug = slugify(&article.title);
    let stem = if slug.is_empty() { "article" } else { slug.as_str() };
    let ext = match format {
        ExportFormat::Txt => "txt",
        ExportFormat::Md => "md",
    };
    format!("{stem}.{ext}")
}

pub fn write_output(path: &Path, contents: &str, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("output already exists: {}", path.display());
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("open output: {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("write output: {}", path.display()))?;
    file.flush()
        .with_context(|| format!("flush output: {}", path.display()))?;
    Ok(())
}
