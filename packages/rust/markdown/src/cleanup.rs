//! Post-conversion normalization passes for Markdown output.
//!
//! Each pass is a function `&str -> String` applied in sequence. Line-based
//! passes leave fenced code blocks untouched.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Glyphs the help center uses as hand-made bullets.
const BULLET_GLYPHS: &str = "•◦▪▫‣●○■□⁃";

/// Run the normalization passes on raw converter output.
pub(crate) fn run_pipeline(md: &str, canonicalize: bool, base_url: Option<&Url>) -> String {
    let mut result = replace_rule_lines(md);
    result = normalize_bullets(&result);
    result = trim_lines(&result);
    result = collapse_blank_lines(&result);

    if canonicalize {
        result = normalize_headings(&result);
        result = space_headings(&result);
        result = strip_leftover_html(&result);
        result = fix_code_block_languages(&result);
        result = resolve_links(&result, base_url);
        result = collapse_blank_lines(&result);
    }

    strip_page_chrome(&result)
}

/// Apply `f` to every line outside fenced code blocks.
fn map_prose_lines(md: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut in_code_block = false;
    md.lines()
        .map(|line| {
            if line.trim_start().starts_with("```") {
                in_code_block = !in_code_block;
                return line.to_string();
            }
            if in_code_block {
                line.to_string()
            } else {
                f(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 1: Horizontal rules
// ---------------------------------------------------------------------------

/// Replace `---` rule lines, which would read as document separators.
fn replace_rule_lines(md: &str) -> String {
    static RULE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\s*-{3,}\s*$").expect("valid regex"));

    map_prose_lines(md, |line| {
        if RULE_RE.is_match(line) {
            "* * *".to_string()
        } else {
            line.to_string()
        }
    })
}

// ---------------------------------------------------------------------------
// Pass 2: Bullet glyphs
// ---------------------------------------------------------------------------

/// Turn a leading non-ASCII bullet glyph into a Markdown list marker.
fn normalize_bullets(md: &str) -> String {
    static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(&format!(r"^(\s*)[{BULLET_GLYPHS}]\s*")).expect("valid regex")
    });

    map_prose_lines(md, |line| BULLET_RE.replace(line, "$1* ").into_owned())
}

// ---------------------------------------------------------------------------
// Pass 3: Trim lines
// ---------------------------------------------------------------------------

fn trim_lines(md: &str) -> String {
    map_prose_lines(md, |line| line.trim().to_string())
}

// ---------------------------------------------------------------------------
// Pass 4: Blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of blank lines into a single blank line.
fn collapse_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n").into_owned()
}

// ---------------------------------------------------------------------------
// Canonicalizing passes
// ---------------------------------------------------------------------------

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid regex"));

/// Keep the first H1; later H1s become H2.
fn normalize_headings(md: &str) -> String {
    let mut seen_h1 = false;
    map_prose_lines(md, |line| match HEADING_RE.captures(line) {
        Some(caps) if &caps[1] == "#" => {
            if seen_h1 {
                format!("## {}", &caps[2])
            } else {
                seen_h1 = true;
                line.to_string()
            }
        }
        _ => line.to_string(),
    })
}

/// Surround headings with blank lines.
fn space_headings(md: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut in_code_block = false;
    let mut after_heading = false;

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
        }
        let is_heading = !in_code_block && HEADING_RE.is_match(line);

        if after_heading && !line.is_empty() {
            out.push("");
        }
        if is_heading && out.last().is_some_and(|prev| !prev.is_empty()) {
            out.push("");
        }
        out.push(line);
        after_heading = is_heading;
    }

    out.join("\n")
}

/// Remove layout tags that survived conversion, keeping their text.
fn strip_leftover_html(md: &str) -> String {
    static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"</?(?:div|span|section|article|aside|figure|figcaption|details|summary)(?:\s[^>]*)?>")
            .expect("valid regex")
    });

    map_prose_lines(md, |line| HTML_TAG_RE.replace_all(line, "").into_owned())
}

/// `language-js`, `lang-python`, `highlight-rust` fence hints become plain names.
fn fix_code_block_languages(md: &str) -> String {
    static LANG_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^```(?:language-|lang-|highlight-)(\w+)").expect("valid regex")
    });

    LANG_PREFIX_RE.replace_all(md, "```$1").into_owned()
}

/// Resolve relative link targets against the article URL. Images are left alone.
fn resolve_links(md: &str, base_url: Option<&Url>) -> String {
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));

    let Some(base) = base_url else {
        return md.to_string();
    };

    LINK_RE
        .replace_all(md, |caps: &regex::Captures| {
            let start = caps.get(0).map_or(0, |m| m.start());
            let text = &caps[1];
            let href = &caps[2];

            let is_image = start > 0 && md.as_bytes()[start - 1] == b'!';
            let is_absolute = href.starts_with("http://")
                || href.starts_with("https://")
                || href.starts_with("data:")
                || href.starts_with("mailto:")
                || href.starts_with('#');
            if is_image || is_absolute {
                return caps[0].to_string();
            }

            match base.join(href) {
                Ok(resolved) => format!("[{text}]({resolved})"),
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Page chrome
// ---------------------------------------------------------------------------

/// Remove the search-box label at the top and every menu-toggle label.
fn strip_page_chrome(md: &str) -> String {
    let md = md.trim_start_matches('\n');
    let md = md.strip_prefix("Search\n\n").unwrap_or(md);
    md.replace("Menu\n\n", "")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_lines_become_asterisks() {
        let input = "Intro\n\n---\n\n  -----  \n\nText with --- inside";
        assert_eq!(
            replace_rule_lines(input),
            "Intro\n\n* * *\n\n* * *\n\nText with --- inside"
        );
    }

    #[test]
    fn rules_inside_code_are_kept() {
        let input = "```yaml\n---\nkey: value\n```";
        assert_eq!(replace_rule_lines(input), input);
    }

    #[test]
    fn bullet_glyphs_become_list_markers() {
        let input = "• First\n◦Second\n  ▪ Third\nA • in the middle";
        assert_eq!(
            normalize_bullets(input),
            "* First\n* Second\n  * Third\nA • in the middle"
        );
    }

    #[test]
    fn lines_are_trimmed_outside_code() {
        let input = "  padded  \n```\n    indented code\n```\n\ttabbed";
        assert_eq!(
            trim_lines(input),
            "padded\n```\n    indented code\n```\ntabbed"
        );
    }

    #[test]
    fn blank_runs_collapse_to_one() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb\n\nc"), "a\n\nb\n\nc");
    }

    #[test]
    fn leading_search_label_is_removed() {
        assert_eq!(strip_page_chrome("Search\n\nBody text"), "Body text");
        assert_eq!(strip_page_chrome("\nSearch\n\nBody"), "Body");
    }

    #[test]
    fn body_without_search_label_is_untouched() {
        // Only the exact label goes; other openings keep their first characters.
        assert_eq!(strip_page_chrome("Searching the bed"), "Searching the bed");
        assert_eq!(strip_page_chrome("Short"), "Short");
    }

    #[test]
    fn every_menu_label_is_removed() {
        assert_eq!(strip_page_chrome("Menu\n\nA\n\nMenu\n\nB"), "A\n\nB");
    }

    #[test]
    fn canonical_headings() {
        let input = "# Title\nText\n# Again\nMore";
        let result = space_headings(&normalize_headings(input));
        assert_eq!(result, "# Title\n\nText\n\n## Again\n\nMore");
    }

    #[test]
    fn canonical_pass_strips_tags_and_fixes_fences() {
        let input = "<div class=\"note\">Important</div>\n```language-python\nprint('<span>')\n```";
        let result = fix_code_block_languages(&strip_leftover_html(input));
        assert_eq!(result, "Important\n```python\nprint('<span>')\n```");
    }

    #[test]
    fn relative_links_resolve_against_base() {
        let base = Url::parse("https://help.prusa3d.com/article/a_1").unwrap();
        let input = "[Next](/article/b_2) [Abs](https://x.test/) ![img](/i.png) [Top](#top)";
        assert_eq!(
            resolve_links(input, Some(&base)),
            "[Next](https://help.prusa3d.com/article/b_2) [Abs](https://x.test/) ![img](/i.png) [Top](#top)"
        );
        assert_eq!(resolve_links(input, None), input);
    }

    #[test]
    fn pipeline_without_canonical_pass() {
        let input = "Menu\n\n  Body line  \n\n\n\n---\n\n• item\n";
        assert_eq!(run_pipeline(input, false, None), "Body line\n\n* * *\n\n* item");
    }
}
