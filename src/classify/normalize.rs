/// Canonicalize a keyword for storage, comparison, and matching.
///
/// Trims, unifies unicode en/em dashes to ASCII `-`, collapses whitespace
/// runs to a single space, and uppercases. The same keyword entered with
/// different casing or spacing always normalizes to the same string, so
/// the keyword table's UNIQUE constraint dedups reliably.
///
/// Empty or whitespace-only input normalizes to the empty string; callers
/// must treat that as "no keyword" and skip it.
pub fn normalize_keyword(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.trim().chars() {
        let c = match c {
            '\u{2013}' | '\u{2014}' => '-',
            c => c,
        };
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        for upper in c.to_uppercase() {
            out.push(upper);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_uppercases() {
        assert_eq!(normalize_keyword("  tcs  "), "TCS");
    }

    #[test]
    fn case_and_spacing_variants_normalize_identically() {
        let variants = ["bajaj auto", "Bajaj  Auto", "  BAJAJ\tAUTO  "];
        for v in variants {
            assert_eq!(normalize_keyword(v), "BAJAJ AUTO");
        }
    }

    #[test]
    fn unicode_dashes_become_ascii_hyphen() {
        assert_eq!(normalize_keyword("bajaj\u{2013}auto"), "BAJAJ-AUTO");
        assert_eq!(normalize_keyword("bajaj\u{2014}auto"), "BAJAJ-AUTO");
        assert_eq!(normalize_keyword("BAJAJ-AUTO"), "BAJAJ-AUTO");
    }

    #[test]
    fn whitespace_runs_collapse_to_one_space() {
        assert_eq!(normalize_keyword("tata \n\t consultancy"), "TATA CONSULTANCY");
    }

    #[test]
    fn empty_and_whitespace_only_normalize_to_empty() {
        assert_eq!(normalize_keyword(""), "");
        assert_eq!(normalize_keyword("   \t\n "), "");
    }
}
