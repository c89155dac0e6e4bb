/// Split a unified diff into `(path, changeText)` records, one per file
/// section, in input order.
///
/// `diff --git` and `+++ ` lines are headers. A `--- ` line is a header only
/// when a `+++ ` line follows it, so removed lines that happen to start with
/// `-- ` stay in the body. The path comes from the `+++ b/` side, or the
/// `--- a/` side for deletions. Sections with no body are dropped.
pub fn split_diff(diff: &str) -> Vec<(String, String)> {
    let lines: Vec<&str> = diff.split('\n').collect();
    let mut records = Vec::new();
    let mut current: Option<String> = None;
    let mut old_path: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    for (i, &line) in lines.iter().enumerate() {
        let header = strip_cr(line);
        let is_old_header = header.starts_with("--- ")
            && lines
                .get(i + 1)
                .is_some_and(|next| next.starts_with("+++ "));

        if header.starts_with("diff --git ") {
            flush(&mut records, &current, &mut body);
            current = None;
            old_path = None;
        } else if is_old_header {
            flush(&mut records, &current, &mut body);
            old_path = header.strip_prefix("--- ").map(|p| side_path(p, "a/"));
        } else if let Some(rest) = header.strip_prefix("+++ ") {
            flush(&mut records, &current, &mut body);
            let new_path = side_path(rest, "b/");
            current = if new_path == "/dev/null" {
                old_path.take().or(Some(new_path))
            } else {
                Some(new_path)
            };
        } else {
            body.push(line);
        }
    }
    flush(&mut records, &current, &mut body);
    records
}

fn flush(records: &mut Vec<(String, String)>, current: &Option<String>, body: &mut Vec<&str>) {
    if let Some(path) = current {
        if !body.is_empty() {
            records.push((path.clone(), body.join("\n")));
        }
    }
    body.clear();
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// `a/src/x.rs\t2024-01-01 ...` -> `src/x.rs`
fn side_path(raw: &str, prefix: &str) -> String {
    let path = raw.split('\t').next().unwrap_or(raw).trim();
    path.strip_prefix(prefix).unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_new_side_header() {
        let records = split_diff("+++ b/a.ts\n+const x=2;");
        assert_eq!(records, vec![("a.ts".to_string(), "+const x=2;".to_string())]);
    }

    #[test]
    fn test_git_diff_multiple_files() {
        let diff = "\
diff --git a/src/a.ts b/src/a.ts
index 83db48f..bf269f4 100644
--- a/src/a.ts
+++ b/src/a.ts
@@ -1 +1 @@
-const x=1;
+const x=2;
diff --git a/src/b.ts b/src/b.ts
--- a/src/b.ts
+++ b/src/b.ts
@@ -1,2 +1,2 @@
 keep
-old
+new";
        let records = split_diff(diff);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, "src/a.ts");
        assert_eq!(records[0].1, "@@ -1 +1 @@\n-const x=1;\n+const x=2;");
        assert_eq!(records[1].0, "src/b.ts");
        assert!(records[1].1.ends_with("+new"));
    }

    #[test]
    fn test_removed_line_starting_with_dashes_stays_in_body() {
        let diff = "--- a/q.sql\n+++ b/q.sql\n@@ -1,2 +1 @@\n--- legacy comment\n SELECT 1;";
        let records = split_diff(diff);
        assert_eq!(records.len(), 1);
        assert!(records[0].1.contains("--- legacy comment"));
    }

    #[test]
    fn test_deleted_file_uses_old_path() {
        let diff = "--- a/gone.ts\n+++ /dev/null\n@@ -1 +0,0 @@\n-bye";
        let records = split_diff(diff);
        assert_eq!(records, vec![("gone.ts".to_string(), "@@ -1 +0,0 @@\n-bye".to_string())]);
    }

    #[test]
    fn test_timestamps_and_crlf_are_stripped_from_headers() {
        let diff = "--- a/x.c\t2024-01-01 00:00:00\r\n+++ b/x.c\t2024-01-02 00:00:00\r\n+int y;";
        let records = split_diff(diff);
        assert_eq!(records[0].0, "x.c");
    }

    #[test]
    fn test_text_without_headers_yields_nothing() {
        assert!(split_diff("just some text\nno headers").is_empty());
        assert!(split_diff("").is_empty());
    }

    #[test]
    fn test_header_only_section_is_dropped() {
        let diff = "diff --git a/bin.png b/bin.png\nBinary files differ";
        assert!(split_diff(diff).is_empty());
    }
}
