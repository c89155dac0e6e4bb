/// Build the review prompt: description, full project context, the change
/// blob, and the JSON shape the answer must take.
pub fn build_review_prompt(description: &str, project_context: &str, changes: &str) -> String {
    format!(
        r#"You are a tech lead with ten years of experience. Below is the context of an entire project and a set of changes for a new feature. Using your understanding of the whole project, review the changes.

--- CHANGE DESCRIPTION ---
{description}
--- END DESCRIPTION ---

--- PROJECT CONTEXT ---
{project_context}
--- END PROJECT CONTEXT ---

--- CHANGES ---
{changes}
--- END CHANGES ---

Return ONLY a JSON object (no markdown code block) with this structure:
{{
  "overallQuality": "Overall assessment of the change quality (1-2 sentences)",
  "summary": {{
    "totalIssues": <number of issues found>,
    "criticalIssues": <number of critical issues>,
    "filesReviewed": <number of files reviewed>
  }},
  "potentialBugs": [
    {{"file": "path", "line": <line number or null>, "severity": "critical|high|medium|low", "issue": "...", "suggestion": "..."}}
  ],
  "performanceIssues": [ same shape as potentialBugs ],
  "securityVulnerabilities": [ same shape as potentialBugs ],
  "conventionViolations": [ same shape as potentialBugs ],
  "improvements": [
    {{"file": "path", "line": <line number or null>, "type": "refactoring|optimization|best-practice", "suggestion": "..."}}
  ],
  "positivePoints": ["..."]
}}

Review for:
1. Potential bugs: cases where this change can break.
2. Performance issues: slow queries, wasteful loops.
3. Security vulnerabilities: injection, XSS, unsafe handling of sensitive data.
4. Convention compliance: does the change follow the project's style and patterns?
5. Improvements: ways to make the code cleaner and easier to maintain.

Be specific about files and lines; use "line": null when a line can't be determined. Also call out what the change does well."#
    )
}
