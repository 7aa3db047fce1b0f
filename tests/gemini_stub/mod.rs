use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::Value;

pub const STUB_API_KEY: &str = "test-key";

/// A JPEG header (SOI, JFIF, EOI), base64.
pub const STUB_JPEG_BASE64: &str = "/9j/4AAQSkZJRgABAQAAAQABAAD/2Q==";

#[derive(Debug, Clone, Default)]
pub struct GeminiStubConfig {
    /// Locales whose article request fails with a provider error.
    pub failing_locales: Vec<String>,
}

pub struct GeminiStub {
    pub base_url: String,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl GeminiStub {
    pub fn spawn(config: GeminiStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start gemini stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/v1beta");

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let api_key = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("x-goog-api-key"))
                    .map(|h| h.value.as_str().to_owned());
                if api_key.as_deref() != Some(STUB_API_KEY) {
                    let _ = request.respond(error_response(403, "API key not valid"));
                    continue;
                }

                let path = request.url().to_string();
                let mut body = String::new();
                if request.method() != &tiny_http::Method::Post
                    || request.as_reader().read_to_string(&mut body).is_err()
                {
                    let _ = request.respond(error_response(400, "invalid request"));
                    continue;
                }
                let Ok(parsed) = serde_json::from_str::<Value>(&body) else {
                    let _ = request.respond(error_response(400, "invalid json"));
                    continue;
                };

                let response = if path.ends_with(":generateContent") {
                    generate_content(&parsed, &config)
                } else if path.ends_with(":predict") {
                    Ok(serde_json::json!({
                        "predictions": [ { "bytesBase64Encoded": STUB_JPEG_BASE64, "mimeType": "image/jpeg" } ]
                    }))
                } else {
                    Err((404, "not found".to_owned()))
                };

                let response = match response {
                    Ok(value) => json_response(200, &value),
                    Err((status, message)) => error_response(status, &message),
                };
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

impl Drop for GeminiStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn json_response(status: u16, value: &Value) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("build header");
    tiny_http::Response::from_string(value.to_string())
        .with_status_code(status)
        .with_header(header)
}

fn error_response(status: u16, message: &str) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    json_response(
        status,
        &serde_json::json!({ "error": { "code": status, "message": message } }),
    )
}

fn generate_content(parsed: &Value, config: &GeminiStubConfig) -> Result<Value, (u16, String)> {
    let prompt = parsed
        .pointer("/contents/0/parts/0/text")
        .and_then(|v| v.as_str())
        .ok_or_else(|| (400, "missing prompt".to_owned()))?;
    if parsed.pointer("/generationConfig/responseSchema").is_none() {
        return Err((400, "missing responseSchema".to_owned()));
    }

    let output = if prompt.contains("senior SEO strategist") {
        keyword_response(prompt)?
    } else {
        article_response(prompt, config)?
    };

    // Split the payload over two parts like streamed candidates do.
    let text = output.to_string();
    let (head, tail) = text.split_at(text.len() / 2);
    Ok(serde_json::json!({
        "candidates": [
            { "content": { "role": "model", "parts": [ { "text": head }, { "text": tail } ] } }
        ]
    }))
}

fn quoted_after<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    let rest = &text[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn keyword_response(prompt: &str) -> Result<Value, (u16, String)> {
    let topic = quoted_after(prompt, "primary topic \"")
        .ok_or_else(|| (400, "missing topic".to_owned()))?;
    Ok(serde_json::json!({
        "keywords": [
            { "keyword": format!("{topic} charging"), "type": "Related", "intent": "Informational", "relevance": 88 },
            { "keyword": format!("best {topic}"), "type": "Long-tail", "intent": "Commercial", "relevance": 95 },
            { "keyword": topic, "type": "Related", "intent": "Informational", "relevance": 100 },
            { "keyword": "battery range", "type": "LSI", "intent": "Informational", "relevance": 61 }
        ]
    }))
}

fn article_response(prompt: &str, config: &GeminiStubConfig) -> Result<Value, (u16, String)> {
    let topic = quoted_after(prompt, "article about \"")
        .ok_or_else(|| (400, "missing topic".to_owned()))?;
    let locale = quoted_after(prompt, "locale code: \"")
        .ok_or_else(|| (400, "missing locale".to_owned()))?;
    if config.failing_locales.iter().any(|l| l == locale) {
        return Err((500, format!("model overloaded for {locale}")));
    }

    let mut lsi_keywords = vec!["charging stations".to_owned()];
    let marker = "user-provided keywords into the article: ";
    if let Some(start) = prompt.find(marker) {
        let rest = &prompt[start + marker.len()..];
        let end = rest.find('.').unwrap_or(rest.len());
        lsi_keywords.extend(rest[..end].split(", ").map(str::to_owned));
    }

    let mut content = format!("{topic} are changing transport. Charging stations are spreading.");
    if prompt.contains("[IMAGE: A descriptive prompt") {
        content.push_str("\n[IMAGE: A row of cars at charging stations]");
    }

    Ok(serde_json::json!({
        "title": format!("{topic} guide ({locale})"),
        "metaDescription": format!("Everything about {topic}."),
        "sections": [
            { "heading": "Overview", "content": content },
            { "heading": "Costs", "content": format!("Owning {topic} costs less over time.") }
        ],
        "faq": [ { "question": format!("Are {topic} worth it?"), "answer": "Usually." } ],
        "lsiKeywords": lsi_keywords,
    }))
}
