use di_core::review::CodeReview;
use di_core::Error;

/// Validate raw model output against the review schema.
///
/// A markdown fence around the whole reply is stripped first. Missing required fields, a
/// severity outside `critical|high|medium|low`, or an improvement type
/// outside `refactoring|optimization|best-practice` all fail with
/// `MalformedAnalysisResult`.
pub fn parse_review_response(raw: &str) -> Result<CodeReview, Error> {
    let json_str = extract_json(raw);
    serde_json::from_str(json_str).map_err(|e| Error::MalformedAnalysisResult(e.to_string()))
}

/// The JSON object inside a model reply.
///
/// A fence is stripped only when it wraps the whole reply; fences inside
/// JSON strings (code snippets in suggestions) are left alone. Replies
/// wrapped in prose fall back to the outermost braces.
fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();
    let body = strip_outer_fence(trimmed).unwrap_or(trimmed);
    if body.starts_with('{') && body.ends_with('}') {
        return body;
    }
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if end > start => &body[start..=end],
        _ => body,
    }
}

fn strip_outer_fence(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("```")?.strip_suffix("```")?;
    // Drop the info string ("json") on the opening line, if any.
    let inner = match inner.split_once('\n') {
        Some((first, rest)) if !first.trim_start().starts_with('{') => rest,
        _ => inner.strip_prefix("json").unwrap_or(inner),
    };
    Some(inner.trim())
}
