use anyhow::{anyhow, bail, Context, Result};
use url::form_urlencoded;

use crate::builder::parse_body_text;
use crate::models::{ApiRequest, HttpMethod, RequestBody};
use crate::pairs::KeyValueList;

/// Parse a cURL command into a request
pub fn parse_curl(input: &str) -> Result<ApiRequest> {
    let mut request = ApiRequest::default();
    let mut explicit_method = false;
    let mut url: Option<String> = None;

    // Remove line continuations and normalize
    let normalized = input.replace("\\\r\n", " ").replace("\\\n", " ");

    let mut tokens = tokenize(&normalized)?.into_iter();
    if tokens.next().as_deref() != Some("curl") {
        bail!("Not a cURL command");
    }

    while let Some(token) = tokens.next() {
        match token.as_str() {
            "-X" | "--request" => {
                let method = tokens.next().ok_or_else(|| anyhow!("Missing value for {}", token))?;
                request.method = method.parse()?;
                explicit_method = true;
            }
            "-H" | "--header" => {
                let header = tokens.next().ok_or_else(|| anyhow!("Missing value for {}", token))?;
                let (key, value) = parse_header(&header)?;
                request.headers.insert(key, value);
            }
            "-d" | "--data" | "--data-raw" | "--data-binary" => {
                let data = tokens.next().ok_or_else(|| anyhow!("Missing value for {}", token))?;
                request.body = parse_body_text(&data);
                // Infer POST if not set
                if !explicit_method {
                    request.method = HttpMethod::POST;
                }
            }
            "-I" | "--head" => {
                request.method = HttpMethod::HEAD;
                explicit_method = true;
            }
            "-m" | "--max-time" => {
                let secs = tokens.next().ok_or_else(|| anyhow!("Missing value for {}", token))?;
                let secs: f64 = secs.parse().with_context(|| format!("Invalid value for {}: {}", token, secs))?;
                if !secs.is_finite() || secs < 0.0 {
                    bail!("Invalid value for {}: {}", token, secs);
                }
                request.timeout_ms = Some((secs * 1000.0).round() as u64);
            }
            "--url" => {
                url = Some(tokens.next().ok_or_else(|| anyhow!("Missing value for {}", token))?);
            }
            "-u" | "--user" | "-o" | "--output" | "-A" | "--user-agent" | "-e" | "--referer" | "-b" | "--cookie"
            | "-c" | "--cookie-jar" | "-x" | "--proxy" | "-w" | "--write-out" | "-F" | "--form" | "-r" | "--range"
            | "--retry" | "--connect-timeout" | "--cacert" | "--cert" | "--key" => {
                // Flags with a value that a request template does not carry
                tokens.next();
            }
            "--compressed" | "-k" | "--insecure" | "-L" | "--location" | "-s" | "--silent" | "-v" | "--verbose" => {
                // Ignored flags
            }
            _ if token.starts_with('-') => {}
            _ => {
                // A URL-shaped token replaces a stray value left by an unknown flag
                let replace = match &url {
                    None => true,
                    Some(current) => !looks_like_url(current) && looks_like_url(&token),
                };
                if replace {
                    url = Some(token.clone());
                }
            }
        }
    }

    let url = url.ok_or_else(|| anyhow!("No URL found in cURL command"))?;
    let (base, params) = split_query(&url);
    request.url = base;
    request.params = params;
    Ok(request)
}

fn parse_header(s: &str) -> Result<(String, String)> {
    match s.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.trim().to_string())),
        _ => Err(anyhow!("Invalid header format: {}", s)),
    }
}

fn looks_like_url(token: &str) -> bool {
    token.contains("://") || token.starts_with("{{")
}

/// Split `?a=1&b=2` off the URL into percent-decoded params
fn split_query(url: &str) -> (String, KeyValueList) {
    let Some((base, query)) = url.split_once('?') else {
        return (url.to_string(), KeyValueList::new());
    };
    let params = form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    (base.to_string(), params)
}

/// Tokenize a curl command, respecting quotes
fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            current.push(c);
            escape_next = false;
            continue;
        }

        match c {
            '\\' if !in_single_quote => {
                escape_next = true;
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
            }
            ' ' | '\t' | '\n' | '\r' if !in_single_quote && !in_double_quote => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => {
                current.push(c);
            }
        }
    }

    if in_single_quote || in_double_quote {
        bail!("Unterminated quote in cURL command");
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Format request as cURL command
pub fn to_curl(request: &ApiRequest) -> String {
    let mut parts = vec!["curl".to_string()];

    if request.method != HttpMethod::GET {
        parts.push(format!("-X {}", request.method.as_str()));
    }

    let mut url = request.url.clone();
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.extend_pairs(request.params.non_empty_keys());
    let query = query.finish();
    if !query.is_empty() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&query);
    }
    parts.push(shell_quote(&url));

    for (key, value) in request.headers.non_empty_keys() {
        parts.push(format!("-H {}", shell_quote(&format!("{}: {}", key, value))));
    }

    match &request.body {
        RequestBody::Absent => {}
        RequestBody::Raw(text) => parts.push(format!("-d {}", shell_quote(text))),
        RequestBody::Structured(value) => parts.push(format!("-d {}", shell_quote(&value.to_string()))),
    }

    parts.join(" \\\n  ")
}
