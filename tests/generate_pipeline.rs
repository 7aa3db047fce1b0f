mod gemini_stub;

use std::fs;
use std::sync::Arc;

use predicates::prelude::*;
use seo_wizard::error::SeoError;
use seo_wizard::formats::{ArticleBundle, ArticleLength, GenerationSettings};
use seo_wizard::gemini::{
    DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, GeminiConfig, GeminiModel, GenerativeModel,
};
use seo_wizard::generate::{GenerationRequest, generate, image_placeholders};

use gemini_stub::{GeminiStub, GeminiStubConfig, STUB_API_KEY};

fn model(stub: &GeminiStub) -> Arc<dyn GenerativeModel> {
    Arc::new(
        GeminiModel::new(GeminiConfig {
            api_key: STUB_API_KEY.to_owned(),
            base_url: stub.base_url.clone(),
            text_model: DEFAULT_TEXT_MODEL.to_owned(),
            image_model: DEFAULT_IMAGE_MODEL.to_owned(),
        })
        .expect("build gemini model"),
    )
}

fn request(locales: &[&str]) -> GenerationRequest {
    GenerationRequest {
        topic: "electric vehicles".to_owned(),
        length: ArticleLength::Short,
        user_lsi_keywords: vec!["EV charging".to_owned()],
        locales: locales.iter().map(|l| (*l).to_owned()).collect(),
        include_table: false,
        include_in_article_images: false,
    }
}

#[tokio::test]
async fn electric_vehicles_article_for_one_locale() {
    let stub = GeminiStub::spawn(GeminiStubConfig::default());

    let set = generate(model(&stub), &request(&["en-US"])).await.unwrap();
    assert_eq!(set.locales().collect::<Vec<_>>(), ["en-US"]);

    let article = set.get("en-US").unwrap();
    assert!(!article.sections.is_empty());
    assert!(
        article
            .lsi_keywords
            .iter()
            .any(|k| k.eq_ignore_ascii_case("ev charging"))
    );
}

#[tokio::test]
async fn locales_come_back_in_request_order() {
    let stub = GeminiStub::spawn(GeminiStubConfig::default());
    let mut req = request(&["ja-JP", "en-US", "fr-FR"]);
    req.include_in_article_images = true;

    let set = generate(model(&stub), &req).await.unwrap();
    assert_eq!(set.locales().collect::<Vec<_>>(), ["ja-JP", "en-US", "fr-FR"]);
    assert_eq!(set.get("fr-FR").unwrap().title, "electric vehicles guide (fr-FR)");
    assert_eq!(
        image_placeholders(&set.get("ja-JP").unwrap().body_text()),
        ["A row of cars at charging stations"]
    );
}

#[tokio::test]
async fn one_failing_locale_rejects_the_whole_generation() {
    let stub = GeminiStub::spawn(GeminiStubConfig {
        failing_locales: vec!["de-DE".to_owned()],
    });

    let err = generate(model(&stub), &request(&["en-US", "de-DE", "es-ES"]))
        .await
        .unwrap_err();
    let SeoError::PartialLocaleFailure {
        locale,
        requested,
        message,
    } = &err
    else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(locale, "de-DE");
    assert_eq!(*requested, 3);
    assert!(message.contains("model overloaded for de-DE"), "{message}");
}

#[tokio::test]
async fn wrong_api_key_surfaces_provider_message() {
    let stub = GeminiStub::spawn(GeminiStubConfig::default());
    let model = GeminiModel::new(GeminiConfig {
        api_key: "wrong".to_owned(),
        base_url: stub.base_url.clone(),
        text_model: DEFAULT_TEXT_MODEL.to_owned(),
        image_model: DEFAULT_IMAGE_MODEL.to_owned(),
    })
    .unwrap();

    let err = seo_wizard::research::research(&model, "electric vehicles")
        .await
        .unwrap_err();
    assert!(err.is_generation_failure());
    assert!(err.to_string().contains("API key not valid"), "{err}");
}

#[tokio::test]
async fn research_and_image_generation_through_the_stub() {
    let stub = GeminiStub::spawn(GeminiStubConfig::default());
    let model = model(&stub);

    let keywords = seo_wizard::research::research(model.as_ref(), "electric vehicles")
        .await
        .unwrap();
    assert_eq!(keywords.len(), 4);
    assert_eq!(keywords[1].keyword, "best electric vehicles");

    let image = model.generate_image("a car").await.unwrap();
    assert!(image.starts_with("data:image/jpeg;base64,/9j/"));
}

#[test]
fn cli_generate_records_settings_and_feeds_export() {
    let stub = GeminiStub::spawn(GeminiStubConfig::default());
    let temp = tempfile::TempDir::new().unwrap();
    let out = temp.path().join("articles.json");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("seo-wizard");
    cmd.env("GEMINI_API_KEY", STUB_API_KEY)
        .env("SEO_WIZARD_GEMINI_BASE_URL", &stub.base_url)
        .args([
            "generate",
            "--topic",
            "electric vehicles",
            "--length",
            "short",
            "--lsi",
            "EV charging, battery range",
            "--locale",
            "en-US",
            "--locale",
            "id-ID",
            "--table",
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("en-US\telectric vehicles guide (en-US)"))
        .stdout(predicate::str::contains("id-ID\t"));

    let bundle: ArticleBundle = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(
        bundle.generation_settings,
        Some(GenerationSettings {
            length: ArticleLength::Short,
            include_table: true,
            include_in_article_images: false,
            locales: vec!["en-US".to_owned(), "id-ID".to_owned()],
        })
    );
    let set = bundle.articles;
    assert_eq!(set.locales().collect::<Vec<_>>(), ["en-US", "id-ID"]);
    assert!(
        set.get("id-ID")
            .unwrap()
            .lsi_keywords
            .contains(&"battery range".to_owned())
    );

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("seo-wizard");
    cmd.args([
        "export",
        "--articles",
        out.to_str().unwrap(),
        "--locale",
        "id-ID",
        "--stdout",
    ])
    .assert()
    .success()
    .stdout(predicate::str::starts_with(
        "# electric vehicles guide (id-ID)\n\n> Everything about electric vehicles.\n\n---\n\n",
    ));
}

#[test]
fn cli_generate_fails_without_output_when_a_locale_fails() {
    let stub = GeminiStub::spawn(GeminiStubConfig {
        failing_locales: vec!["fr-FR".to_owned()],
    });
    let temp = tempfile::TempDir::new().unwrap();
    let out = temp.path().join("articles.json");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("seo-wizard");
    cmd.env("GEMINI_API_KEY", STUB_API_KEY)
        .env("SEO_WIZARD_GEMINI_BASE_URL", &stub.base_url)
        .args([
            "generate",
            "--topic",
            "electric vehicles",
            "--locale",
            "en-US",
            "--locale",
            "fr-FR",
            "--locale",
            "de-DE",
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("locale fr-FR failed (3 requested)"));
    assert!(!out.exists());
}

#[test]
fn cli_generate_rejects_unsupported_locale() {
    let temp = tempfile::TempDir::new().unwrap();
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("seo-wizard");
    cmd.env("GEMINI_API_KEY", STUB_API_KEY)
        .args([
            "generate",
            "--topic",
            "electric vehicles",
            "--locale",
            "pt-BR",
            "--out",
            temp.path().join("a.json").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported locale \"pt-BR\""));
}

#[test]
fn cli_research_refuses_to_overwrite_without_force() {
    let stub = GeminiStub::spawn(GeminiStubConfig::default());
    let temp = tempfile::TempDir::new().unwrap();
    let out = temp.path().join("research.json");
    fs::write(&out, "[]").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("seo-wizard");
    cmd.env("GEMINI_API_KEY", STUB_API_KEY)
        .env("SEO_WIZARD_GEMINI_BASE_URL", &stub.base_url)
        .args(["research", "--topic", "electric vehicles", "--out", out.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("research output already exists"));
    assert_eq!(fs::read_to_string(&out).unwrap(), "[]");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("seo-wizard");
    cmd.env("GEMINI_API_KEY", STUB_API_KEY)
        .env("SEO_WIZARD_GEMINI_BASE_URL", &stub.base_url)
        .args([
            "research",
            "--topic",
            "electric vehicles",
            "--out",
            out.to_str().unwrap(),
            "--force",
        ])
        .assert()
        .success();
    let keywords: Vec<seo_wizard::formats::KeywordSuggestion> =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert!(!keywords.is_empty());
}
