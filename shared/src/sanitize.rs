/// Characters that may not appear in a remote folder or file name. Any run
/// of these is replaced with a single hyphen before a path is built.
const UNSAFE: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', '!'];

/// Clean an untrusted folder or file name for use in a remote path.
///
/// Replaces runs of path-unsafe characters with `-`, collapses whitespace
/// runs to a single space and trims the ends. Never fails: a hostile name
/// degrades to a harmless one, and only full emptiness is rejected later by
/// the adapter.
pub fn sanitize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_unsafe = false;
    let mut in_space = false;

    for ch in raw.chars() {
        if UNSAFE.contains(&ch) {
            if !in_unsafe {
                out.push('-');
            }
            in_unsafe = true;
            in_space = false;
        } else if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
            in_unsafe = false;
        } else {
            out.push(ch);
            in_unsafe = false;
            in_space = false;
        }
    }

    out.trim().to_string()
}

/// Join path segments into a remote path, collapsing any run of `/` to one.
/// The result is identical whether or not the base ends with a separator.
pub fn join_remote(segments: &[&str]) -> String {
    let mut out = String::new();
    for segment in segments {
        if segment.is_empty() {
            continue;
        }
        if !out.ends_with('/') && !out.is_empty() {
            out.push('/');
        }
        let mut prev_sep = out.ends_with('/');
        for ch in segment.chars() {
            if ch == '/' {
                if !prev_sep {
                    out.push('/');
                }
                prev_sep = true;
            } else {
                out.push(ch);
                prev_sep = false;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsafe_characters_replaced() {
        assert_eq!(sanitize_name("q4:data.csv"), "q4-data.csv");
        assert_eq!(sanitize_name("My Report!"), "My Report-");
        assert_eq!(sanitize_name("a\\b/c:d*e?f\"g<h>i|j"), "a-b-c-d-e-f-g-h-i-j");
    }

    #[test]
    fn test_runs_collapse_to_one_hyphen() {
        assert_eq!(sanitize_name("a//\\\\::b"), "a-b");
    }

    #[test]
    fn test_whitespace_collapsed_and_trimmed() {
        assert_eq!(sanitize_name("  My   Report \t x "), "My Report x");
    }

    #[test]
    fn test_no_unsafe_characters_survive() {
        let cases = ["..\\..\\etc", "a/b/../c", "*?<>|", "normal name.png"];
        for raw in cases {
            let clean = sanitize_name(raw);
            assert!(
                !clean.contains(|c| UNSAFE.contains(&c)),
                "unsafe char survived in {clean:?}"
            );
        }
    }

    #[test]
    fn test_idempotent() {
        let cases = ["q4:data.csv", "My Report!", "  a  b  ", "x//y", ""];
        for raw in cases {
            let once = sanitize_name(raw);
            assert_eq!(sanitize_name(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_traversal_degrades() {
        assert_eq!(sanitize_name("../../etc/passwd"), "..-..-etc-passwd");
    }

    #[test]
    fn test_join_remote_collapses_separators() {
        assert_eq!(join_remote(&["/uploads", "docs", "a.txt"]), "/uploads/docs/a.txt");
        assert_eq!(join_remote(&["/uploads/", "/docs/", "a.txt"]), "/uploads/docs/a.txt");
        assert_eq!(join_remote(&["/uploads//", "a.txt"]), "/uploads/a.txt");
        assert_eq!(join_remote(&["/uploads", "", "a.txt"]), "/uploads/a.txt");
    }
}
