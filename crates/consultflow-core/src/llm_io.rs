use reqwest::Url;
use serde_json::Value;

pub fn parse_http_endpoint(raw: &str, label: &str) -> std::result::Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|err| format!("invalid {label}: {err}"))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported {label} scheme: {other}")),
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(format!("{label} must not include credentials"));
    }
    if url.host_str().is_none() {
        return Err(format!("{label} host is missing"));
    }
    Ok(url)
}

pub fn extract_llm_content(value: &Value) -> Option<String> {
    if let Some(content) = value
        .get("choices")
        .and_then(|choices| choices.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
    {
        return Some(content.to_string());
    }
    if let Some(content) = value
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
    {
        return Some(content.to_string());
    }
    if let Some(content) = value.get("response").and_then(|response| response.as_str()) {
        return Some(content.to_string());
    }
    None
}

pub fn extract_result_urls(value: &Value) -> Vec<String> {
    let candidates = [
        (value.get("results"), "url"),
        (value.get("items"), "link"),
        (value.get("web").and_then(|web| web.get("results")), "url"),
        (value.get("organic_results"), "link"),
    ];
    for (list, key) in candidates {
        let Some(entries) = list.and_then(Value::as_array) else {
            continue;
        };
        let urls = entries
            .iter()
            .filter_map(|entry| entry.get(key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        if !urls.is_empty() {
            return urls;
        }
    }
    Vec::new()
}
