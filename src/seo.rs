//! Keyword statistics and highlighting over generated article text.
//!
//! Matching is whole-word and case-insensitive. Keywords are always matched
//! literally: punctuation such as `-`, `.` or `+` inside a keyword never acts
//! as a pattern operator.

use anyhow::Context as _;
use regex::Regex;

use crate::cli::{AnalyzeArgs, HighlightArgs};
use crate::export::{read_article_set, select_article};
use crate::formats::{Article, KeywordStat, SeoAnalysisData};
use crate::saved::split_keywords;

pub fn run_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let articles = read_article_set(&args.articles)?;
    let (locale, article) = select_article(&articles, args.locale.as_deref())?;
    let analysis = analyze(article, &args.keyword, &split_keywords(&args.lsi));

    if args.json {
        let json = serde_json::to_string_pretty(&analysis).context("serialize analysis")?;
        println!("{json}");
        return Ok(());
    }

    println!("Locale: {locale}");
    println!("Word count: {}", analysis.word_count);
    for stat in &analysis.keyword_stats {
        let tag = match (stat.is_primary, stat.is_user_provided) {
            (true, _) => "primary",
            (false, true) => "user",
            (false, false) => "lsi",
        };
        println!(
            "{:>4}  {:>6.2}%  {:<7}  {}",
            stat.frequency, stat.density, tag, stat.keyword
        );
    }
    Ok(())
}

pub fn run_highlight(args: HighlightArgs) -> anyhow::Result<()> {
    let articles = read_article_set(&args.articles)?;
    let (_, article) = select_article(&articles, args.locale.as_deref())?;

    for section in &article.sections {
        let segments = highlight(
            &section.content,
            &args.keyword,
            &article.lsi_keywords,
            !args.plain,
        );
        println!("<h2>{}</h2>", render_html(&[Segment::Text(&section.heading)]));
        println!("<p>{}</p>", render_html(&segments));
    }
    Ok(())
}

/// Computes word count and per-keyword frequency/density for `article`.
///
/// Only section bodies are analyzed; title, meta description and FAQ are not.
/// The primary keyword comes first, followed by the article's own LSI keywords
/// in generator order (minus any case-insensitive copy of the primary keyword).
pub fn analyze(
    article: &Article,
    primary_keyword: &str,
    user_lsi_keywords: &[String],
) -> SeoAnalysisData {
    let text = article.body_text();
    let word_count = count_words(&text);
    if word_count == 0 {
        return SeoAnalysisData::default();
    }

    let primary_lower = primary_keyword.to_lowercase();
    let user_lower = user_lsi_keywords
        .iter()
        .map(|keyword| keyword.to_lowercase())
        .collect::<Vec<_>>();

    let mut keyword_stats = Vec::with_capacity(article.lsi_keywords.len() + 1);
    keyword_stats.push(keyword_stat(&text, word_count, primary_keyword, true, true));
    for lsi in &article.lsi_keywords {
        let lsi_lower = lsi.to_lowercase();
        if lsi_lower == primary_lower {
            continue;
        }
        let is_user_provided = user_lower.contains(&lsi_lower);
        keyword_stats.push(keyword_stat(&text, word_count, lsi, false, is_user_provided));
    }

    tracing::debug!(
        word_count,
        keywords = keyword_stats.len(),
        "seo analysis"
    );

    SeoAnalysisData {
        word_count,
        keyword_stats,
    }
}

fn keyword_stat(
    text: &str,
    word_count: usize,
    keyword: &str,
    is_primary: bool,
    is_user_provided: bool,
) -> KeywordStat {
    let frequency = count_occurrences(text, keyword);
    KeywordStat {
        keyword: keyword.to_owned(),
        frequency,
        density: 100.0 * frequency as f64 / word_count as f64,
        is_primary,
        is_user_provided,
    }
}

/// Number of whitespace-delimited, non-empty tokens.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Whole-word, case-insensitive occurrences of `keyword` in `text`.
pub fn count_occurrences(text: &str, keyword: &str) -> usize {
    match keyword_regex([keyword]) {
        Some(re) => re.find_iter(text).count(),
        None => 0,
    }
}

/// Builds a case-insensitive whole-word alternation over `keywords`.
///
/// Keywords are escaped, de-duplicated case-insensitively (first spelling
/// wins), and ordered longest-first so that a keyword containing a shorter
/// one is preferred at the same position. Empty keywords are ignored; `None`
/// means nothing is left to match.
pub fn keyword_pattern<'a, I>(keywords: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut distinct: Vec<&str> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for keyword in keywords {
        if keyword.is_empty() {
            continue;
        }
        let lower = keyword.to_lowercase();
        if seen.contains(&lower) {
            continue;
        }
        seen.push(lower);
        distinct.push(keyword);
    }
    if distinct.is_empty() {
        return None;
    }

    distinct.sort_by_key(|keyword| std::cmp::Reverse(keyword.chars().count()));
    let alternation = distinct
        .iter()
        .map(|keyword| regex::escape(keyword))
        .collect::<Vec<_>>()
        .join("|");
    Some(format!(r"(?i)\b(?:{alternation})\b"))
}

pub fn keyword_regex<'a, I>(keywords: I) -> Option<Regex>
where
    I: IntoIterator<Item = &'a str>,
{
    let pattern = keyword_pattern(keywords)?;
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::warn!(error = %err, "keyword pattern rejected; matching disabled");
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    Primary,
    Lsi,
}

impl HighlightKind {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Primary => "bg-indigo-500/30 text-indigo-300 rounded px-1",
            Self::Lsi => "bg-sky-500/30 text-sky-300 rounded px-1",
        }
    }
}

/// A piece of highlighted text, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Mark { text: &'a str, kind: HighlightKind },
}

/// Splits `text` into plain and marked segments.
///
/// When `enabled` is false, or there is nothing to match, the whole text is
/// returned as one plain segment.
pub fn highlight<'a>(
    text: &'a str,
    primary_keyword: &str,
    lsi_keywords: &[String],
    enabled: bool,
) -> Vec<Segment<'a>> {
    if !enabled || text.is_empty() {
        return vec![Segment::Text(text)];
    }

    let primary_lower = primary_keyword.to_lowercase();
    let keywords = std::iter::once(primary_keyword).chain(lsi_keywords.iter().map(String::as_str));
    let Some(re) = keyword_regex(keywords) else {
        return vec![Segment::Text(text)];
    };

    let mut segments = Vec::new();
    let mut cursor = 0usize;
    for found in re.find_iter(text) {
        if found.start() > cursor {
            segments.push(Segment::Text(&text[cursor..found.start()]));
        }
        let kind = if found.as_str().to_lowercase() == primary_lower {
            HighlightKind::Primary
        } else {
            HighlightKind::Lsi
        };
        segments.push(Segment::Mark {
            text: found.as_str(),
            kind,
        });
        cursor = found.end();
    }
    if cursor < text.len() {
        segments.push(Segment::Text(&text[cursor..]));
    }
    segments
}

pub fn render_html(segments: &[Segment<'_>]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => push_escaped(&mut out, text),
            Segment::Mark { text, kind } => {
                out.push_str("<mark class=\"font-semibold ");
                out.push_str(kind.css_class());
                out.push_str("\">");
                push_escaped(&mut out, text);
                out.push_str("</mark>");
            }
        }
    }
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}
