/// Split `subject` at every character of `delims`, keeping empty fields.
///
/// `None` for either input yields `None`. An empty subject or an empty
/// delimiter set yields an empty list.
pub fn split_string(subject: Option<&str>, delims: Option<&str>) -> Option<Vec<String>> {
    let (subject, delims) = check_inputs(subject, delims)?;
    if subject.is_empty() || delims.is_empty() {
        return Some(Vec::new());
    }

    Some(
        subject
            .split(|c: char| delims.contains(c))
            .map(str::to_string)
            .collect(),
    )
}

/// Split an SLP attribute list such as `(a=1,b=2),(c=3)`.
///
/// A delimiter that does not directly follow the next `)` is skipped and the
/// search resumes after that `)`, so parenthesized groups stay whole. When no
/// `)` remains, the first delimiter is used as is.
pub fn split_attr_string(subject: Option<&str>, delims: Option<&str>) -> Option<Vec<String>> {
    let (subject, delims) = check_inputs(subject, delims)?;
    if subject.is_empty() || delims.is_empty() {
        return Some(Vec::new());
    }

    let find_delim = |from: usize| find_from(subject, from, |c| delims.contains(c));
    let mut fields = Vec::new();
    let mut start = 0;

    loop {
        let mut end = find_delim(start);
        if let (Some(e), Some(paren)) = (end, find_from(subject, start, |c| c == ')')) {
            if e != paren + 1 {
                end = find_delim(paren + 1);
            }
        }

        let Some(end) = end else {
            fields.push(subject[start..].to_string());
            break;
        };

        fields.push(subject[start..end].to_string());

        // Delimiter widths vary for non-ASCII delimiters
        let width = subject[end..].chars().next().map_or(1, char::len_utf8);
        start = end + width;

        if start == subject.len() {
            fields.push(String::new());
            break;
        }
    }

    Some(fields)
}

fn check_inputs<'a>(subject: Option<&'a str>, delims: Option<&'a str>) -> Option<(&'a str, &'a str)> {
    let subject = subject?;
    let Some(delims) = delims else {
        tracing::error!("Cannot split string using 'nil'");
        return None;
    };
    Some((subject, delims))
}

/// Byte offset of the first char at or after `from` matching `pred`
fn find_from(s: &str, from: usize, pred: impl Fn(char) -> bool) -> Option<usize> {
    s.get(from..)?.find(pred).map(|i| i + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(s: &str, d: &str) -> Vec<String> {
        split_string(Some(s), Some(d)).unwrap()
    }

    fn split_attr(s: &str, d: &str) -> Vec<String> {
        split_attr_string(Some(s), Some(d)).unwrap()
    }

    #[test]
    fn test_split_keeps_empty_fields() {
        assert_eq!(split("a,,b,", ","), vec!["a", "", "b", ""]);
        assert_eq!(split(",a", ","), vec!["", "a"]);
        assert_eq!(split(",", ","), vec!["", ""]);
    }

    #[test]
    fn test_split_field_count_matches_delimiters() {
        let cases = [
            ("service:ldap,service:ntp", ",:"),
            ("a b;c d", " ;"),
            ("no delimiters here", ","),
            ("x,y;z,,", ",;"),
        ];
        for (subject, delims) in cases {
            let occurrences = subject.chars().filter(|c| delims.contains(*c)).count();
            assert_eq!(split(subject, delims).len(), occurrences + 1, "{:?}", subject);
        }
    }

    #[test]
    fn test_split_empty_inputs() {
        assert!(split("", ",").is_empty());
        assert!(split("a,b", "").is_empty());
        assert!(split_attr("", ",").is_empty());
        assert!(split_attr("(a=1)", "").is_empty());
    }

    #[test]
    fn test_split_null_inputs() {
        assert_eq!(split_string(None, Some(",")), None);
        assert_eq!(split_string(Some("a,b"), None), None);
        assert_eq!(split_attr_string(None, Some(",")), None);
        assert_eq!(split_attr_string(Some("a,b"), None), None);
    }

    #[test]
    fn test_split_attr_keeps_groups_whole() {
        assert_eq!(split_attr("(a=1,b=2),(c=3)", ","), vec!["(a=1,b=2)", "(c=3)"]);
        assert_eq!(
            split_attr("(machine=x86_64),(description=SLE)", ","),
            vec!["(machine=x86_64)", "(description=SLE)"]
        );
    }

    #[test]
    fn test_split_attr_skips_to_delimiter_after_next_paren() {
        // The comma after "b" does not follow the next ")", so the search
        // jumps past "(c)" and the remainder is one field.
        assert_eq!(split_attr("(a),b,(c)", ","), vec!["(a)", "b,(c)"]);
    }

    #[test]
    fn test_split_attr_trailing_delimiter() {
        assert_eq!(split_attr("(a=1),", ","), vec!["(a=1)", ""]);
    }

    #[test]
    fn test_split_attr_without_parens_splits_plainly() {
        assert_eq!(split_attr("a,b,c", ","), vec!["a", "b", "c"]);
        assert_eq!(split_attr("a,,b", ","), vec!["a", "", "b"]);
    }
}
