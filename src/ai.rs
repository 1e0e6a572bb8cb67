use serde_json::Value;

use crate::models::{AnalysisResult, Importance, Note, Settings, SuggestedTask};

pub const API_KEY_ENV: &str = "NOTES_AI_API_KEY";
const MIN_ANALYSIS_CHARS: usize = 20;
const MAX_CONTENT_CHARS: usize = 12_000;
const MAX_KEYWORDS: usize = 5;
const MAX_RELATED: usize = 8;
const MAX_SUGGESTED_TASKS: usize = 8;

/// Title plus every page, in page order.
pub fn analysis_input(note: &Note) -> String {
    let mut out = String::new();
    if !note.title.trim().is_empty() {
        out.push_str(note.title.trim());
        out.push_str("\n\n");
    }
    let body = note
        .pages
        .iter()
        .map(|p| p.content.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push_str(&body);
    out
}

fn resolve_api_key(settings: &Settings) -> Option<String> {
    let stored = settings.ai_api_key.trim();
    if !stored.is_empty() {
        return Some(stored.to_string());
    }
    std::env::var(API_KEY_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Checks that run before any request goes out. Returns the credential to use.
pub fn precheck(settings: &Settings, content: &str) -> Result<String, String> {
    if content.trim().chars().count() < MIN_ANALYSIS_CHARS {
        return Err("content too short for analysis".to_string());
    }
    resolve_api_key(settings).ok_or_else(|| "missing ai api key".to_string())
}

pub fn build_prompt(content: &str) -> (String, String) {
    let system = [
        "You analyze personal notes.",
        "Reply with JSON only: no prose, no code fences.",
        "Schema: {\"summary\":\"...\",\"keywords\":[\"3-5 words\"],\"sentiment\":\"positive|neutral|negative\",\"related_concepts\":[\"...\"],\"suggested_tasks\":[{\"text\":\"...\",\"importance\":\"low|medium|high|critical\"}]}",
    ]
    .join("\n");

    let content = content.trim();
    let clipped: String = content.chars().take(MAX_CONTENT_CHARS).collect();
    let user = format!("Analyze this note:\n\n{clipped}");
    (system, user)
}

pub fn parse_analysis_from_text(text: &str) -> Result<AnalysisResult, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("empty ai response".to_string());
    }

    let mut candidate = trimmed;
    if let Some(stripped) = strip_fenced_code_block(candidate) {
        candidate = stripped;
    }

    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        if let Ok(result) = analysis_from_value(&value) {
            return Ok(sanitize_analysis(result));
        }
    }

    if let Some(extracted) = extract_first_json_object(candidate) {
        if let Ok(value) = serde_json::from_str::<Value>(extracted) {
            if let Ok(result) = analysis_from_value(&value) {
                return Ok(sanitize_analysis(result));
            }
        }
    }

    Err("failed to parse ai response as json".to_string())
}

fn analysis_from_value(value: &Value) -> Result<AnalysisResult, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| "ai response json must be an object".to_string())?;

    let text_field = |key: &str| {
        obj.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };
    let string_list = |key: &str| -> Vec<String> {
        match obj.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(|s| s.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    };

    let mut suggested_tasks = Vec::new();
    if let Some(Value::Array(items)) = obj.get("suggested_tasks") {
        for item in items {
            match item {
                Value::String(text) => suggested_tasks.push(SuggestedTask {
                    text: text.clone(),
                    importance: Importance::default(),
                }),
                Value::Object(map) => {
                    if let Some(Value::String(text)) = map.get("text") {
                        let importance = map
                            .get("importance")
                            .and_then(|v| v.as_str())
                            .and_then(Importance::parse)
                            .unwrap_or_default();
                        suggested_tasks.push(SuggestedTask {
                            text: text.clone(),
                            importance,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    Ok(AnalysisResult {
        summary: text_field("summary"),
        keywords: string_list("keywords"),
        sentiment: text_field("sentiment"),
        related_concepts: string_list("related_concepts"),
        suggested_tasks,
    })
}

fn trim_dedupe_cap(items: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::<String>::new();
    let mut out: Vec<String> = items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect();
    out.truncate(cap);
    out
}

fn sanitize_analysis(mut result: AnalysisResult) -> AnalysisResult {
    result.summary = result.summary.trim().to_string();
    result.sentiment = result.sentiment.trim().to_lowercase();
    result.keywords = trim_dedupe_cap(result.keywords, MAX_KEYWORDS);
    result.related_concepts = trim_dedupe_cap(result.related_concepts, MAX_RELATED);

    let mut seen = std::collections::HashSet::<String>::new();
    let mut tasks: Vec<SuggestedTask> = result
        .suggested_tasks
        .into_iter()
        .map(|task| SuggestedTask {
            text: task.text.trim().to_string(),
            importance: task.importance,
        })
        .filter(|task| !task.text.is_empty())
        .collect();
    tasks.retain(|task| seen.insert(task.text.to_lowercase()));
    tasks.truncate(MAX_SUGGESTED_TASKS);
    result.suggested_tasks = tasks;
    result
}

fn strip_fenced_code_block(text: &str) -> Option<&str> {
    let mut s = text.trim();
    if !s.starts_with("```") {
        return None;
    }
    // Drop the opening fence line.
    let pos = s.find('\n')?;
    s = &s[pos + 1..];
    let end = s.rfind("```")?;
    Some(s[..end].trim())
}

fn extract_first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(text[start..=end].trim())
}

/// Never fails: any problem is logged and reported as `None`.
#[cfg(all(feature = "app", not(test)))]
pub async fn analyze(settings: &Settings, content: &str) -> Option<AnalysisResult> {
    match request_analysis(settings, content).await {
        Ok(result) => Some(result),
        Err(err) => {
            log::warn!("note analysis skipped: {err}");
            None
        }
    }
}

#[cfg(all(feature = "app", not(test)))]
async fn request_analysis(settings: &Settings, content: &str) -> Result<AnalysisResult, String> {
    use std::time::Duration;

    let api_key = precheck(settings, content)?;
    let (system, user) = build_prompt(content);

    let payload = serde_json::json!({
        "model": settings.ai_model,
        "temperature": 0.3,
        "max_tokens": 1000,
        "stream": false,
        "messages": [
          { "role": "system", "content": system },
          { "role": "user", "content": user }
        ]
    });

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.ai_timeout_secs))
        .build()
        .map_err(|err| format!("failed to build http client: {err}"))?;

    let url = format!(
        "{}/chat/completions",
        settings.ai_base_url.trim_end_matches('/')
    );
    let resp = client
        .post(url)
        .bearer_auth(api_key)
        .json(&payload)
        .send()
        .await
        .map_err(|err| format!("analysis request failed: {err}"))?;

    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|err| format!("failed to read analysis response: {err}"))?;

    if !status.is_success() {
        return Err(format!("analysis http {status}: {text}"));
    }

    let value: Value =
        serde_json::from_str(&text).map_err(|err| format!("invalid analysis json: {err}"))?;

    let content = value["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("")
        .trim();

    parse_analysis_from_text(content)
}
