use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use seo_wizard::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    seo_wizard::logging::init("info").context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        Command::Research(args) => {
            seo_wizard::research::run(args).await.context("research")?;
        }
        Command::Generate(args) => {
            seo_wizard::generate::run(args).await.context("generate")?;
        }
        Command::Analyze(args) => {
            seo_wizard::seo::run_analyze(args).context("analyze")?;
        }
        Command::Highlight(args) => {
            seo_wizard::seo::run_highlight(args).context("highlight")?;
        }
        Command::Export(args) => {
            seo_wizard::export::run(args).context("export")?;
        }
        Command::Save(args) => {
            seo_wizard::saved::run_save(args).await.context("save")?;
        }
        Command::List(args) => {
            seo_wizard::saved::run_list(args).await.context("list")?;
        }
        Command::Show(args) => {
            seo_wizard::saved::run_show(args).await.context("show")?;
        }
        Command::Delete(args) => {
            seo_wizard::saved::run_delete(args).await.context("delete")?;
        }
        Command::Thumbnail(args) => {
            seo_wizard::thumbnail::run(args).await.context("thumbnail")?;
        }
    }

    Ok(())
}
