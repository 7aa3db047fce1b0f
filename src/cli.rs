use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::formats::{ArticleLength, SearchIntent};
use crate::research::SortKey;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Research(ResearchArgs),
    Generate(GenerateArgs),
    Analyze(AnalyzeArgs),
    Highlight(HighlightArgs),
    Export(ExportArgs),
    Save(SaveArgs),
    List(ListArgs),
    Show(ShowArgs),
    Delete(DeleteArgs),
    Thumbnail(ThumbnailArgs),
}

#[derive(Debug, Args)]
pub struct ResearchArgs {
    /// Topic to research keywords for.
    #[arg(long)]
    pub topic: String,

    /// Only keep keywords containing this text (case-insensitive).
    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long, value_enum, default_value_t = SortKey::Relevance)]
    pub sort: SortKey,

    /// Sort ascending instead of descending.
    #[arg(long)]
    pub asc: bool,

    /// Write the raw suggestions as JSON to this path.
    #[arg(long)]
    pub out: Option<String>,

    /// Overwrite `--out` if it exists.
    #[arg(long, requires = "out")]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Topic; also used as the primary keyword.
    #[arg(long)]
    pub topic: String,

    #[arg(long, value_enum, default_value_t = ArticleLength::Medium)]
    pub length: ArticleLength,

    /// Comma-separated keywords the article must incorporate.
    #[arg(long, default_value = "")]
    pub lsi: String,

    /// Target locale (repeatable). Defaults to SEO_WIZARD_ARTICLE_LOCALES.
    #[arg(long = "locale")]
    pub locales: Vec<String>,

    /// Ask for one markdown table where the topic suits it.
    #[arg(long)]
    pub table: bool,

    /// Ask for `[IMAGE: ...]` placeholders inside the article.
    #[arg(long)]
    pub images: bool,

    /// Output path for the generated articles and their settings (JSON).
    #[arg(long)]
    pub out: String,

    /// Overwrite the output if it exists.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Article set JSON (created by `generate`).
    #[arg(long)]
    pub articles: String,

    /// Locale to analyze (default: first in the set).
    #[arg(long)]
    pub locale: Option<String>,

    /// Primary keyword.
    #[arg(long)]
    pub keyword: String,

    /// Comma-separated user-provided keywords.
    #[arg(long, default_value = "")]
    pub lsi: String,

    /// Print the analysis as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct HighlightArgs {
    /// Article set JSON (created by `generate`).
    #[arg(long)]
    pub articles: String,

    #[arg(long)]
    pub locale: Option<String>,

    /// Primary keyword.
    #[arg(long)]
    pub keyword: String,

    /// Emit text without highlight marks.
    #[arg(long)]
    pub plain: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Txt,
    Md,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Article set JSON (created by `generate`).
    #[arg(long)]
    pub articles: String,

    #[arg(long)]
    pub locale: Option<String>,

    #[arg(long, value_enum, default_value_t = ExportFormat::Md)]
    pub format: ExportFormat,

    /// Output path (default: `<slugified title>.<ext>`).
    #[arg(long)]
    pub out: Option<String>,

    /// Print to stdout instead of writing a file.
    #[arg(long, conflicts_with = "out")]
    pub stdout: bool,

    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct SaveArgs {
    /// Articles JSON (created by `generate` or `show`); its generation
    /// settings are saved with it.
    #[arg(long)]
    pub articles: String,

    /// Primary keyword the articles were generated for.
    #[arg(long)]
    pub keyword: String,

    /// Comma-separated user-provided keywords.
    #[arg(long, default_value = "")]
    pub lsi: String,

    /// Search intent of the primary keyword, when known.
    #[arg(long, value_enum)]
    pub intent: Option<SearchIntent>,

    /// Keyword research JSON (written by `research --out`).
    #[arg(long)]
    pub research: Option<String>,

    /// Thumbnail URL (from `thumbnail`).
    #[arg(long)]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Print the saved articles as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(long)]
    pub id: String,

    /// Write the articles and their generation settings to this path.
    #[arg(long)]
    pub out: Option<String>,

    /// Write the saved keyword research to this path.
    #[arg(long)]
    pub research_out: Option<String>,

    /// Overwrite existing output files.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ThumbnailArgs {
    /// Article set JSON (created by `generate`).
    #[arg(long)]
    pub articles: String,

    #[arg(long)]
    pub locale: Option<String>,

    /// Primary keyword.
    #[arg(long)]
    pub keyword: String,
}
