use anyhow::Context as _;

pub const DEFAULT_API_URL: &str = "https://seo-wizard-server.vercel.app";
pub const DEFAULT_ARTICLE_LOCALES: &[&str] = &["en-US"];

/// Locale codes articles can be written in, with display names.
pub const SUPPORTED_LOCALES: &[(&str, &str)] = &[
    ("en-US", "English (US)"),
    ("id-ID", "Indonesian"),
    ("es-ES", "Spanish"),
    ("fr-FR", "French"),
    ("de-DE", "German"),
    ("ja-JP", "Japanese"),
];

pub fn locale_name(code: &str) -> Option<&'static str> {
    SUPPORTED_LOCALES
        .iter()
        .find(|(supported, _)| *supported == code)
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: url::Url,
    pub article_locales: Vec<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let raw_url = non_blank("SEO_WIZARD_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let api_url = url::Url::parse(raw_url.trim())
            .with_context(|| format!("invalid SEO_WIZARD_API_URL={raw_url:?}"))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            anyhow::bail!("SEO_WIZARD_API_URL must be http(s): {api_url}");
        }

        let article_locales = match non_blank("SEO_WIZARD_ARTICLE_LOCALES") {
            Some(raw) => parse_locales(raw.split(','))
                .with_context(|| format!("invalid SEO_WIZARD_ARTICLE_LOCALES={raw:?}"))?,
            None => DEFAULT_ARTICLE_LOCALES.iter().map(|l| (*l).to_owned()).collect(),
        };

        Ok(Self {
            api_url,
            article_locales,
        })
    }
}

/// Validates locale codes against [`SUPPORTED_LOCALES`].
///
/// Blank entries are skipped and duplicates keep their first position.
pub fn parse_locales<'a>(codes: impl IntoIterator<Item = &'a str>) -> anyhow::Result<Vec<String>> {
    let mut locales: Vec<String> = Vec::new();
    for code in codes {
        let code = code.trim();
        if code.is_empty() {
            continue;
        }
        if locale_name(code).is_none() {
            let supported = SUPPORTED_LOCALES
                .iter()
                .map(|(code, _)| *code)
                .collect::<Vec<_>>()
                .join(", ");
            anyhow::bail!("unsupported locale {code:?}. expected one of: {supported}");
        }
        if !locales.iter().any(|existing| existing == code) {
            locales.push(code.to_owned());
        }
    }
    if locales.is_empty() {
        anyhow::bail!("at least one article locale is required");
    }
    Ok(locales)
}
