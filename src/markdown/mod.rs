//! Markdown → HTML for note previews.
//!
//! The renderer is a fixed sequence of text passes. Order is load-bearing: code
//! blocks are lifted out before escaping, longer markers are matched before the
//! shorter markers they contain, and paragraph wrapping runs last.
//!
//! Supported subset:
//! - fenced code blocks (```` ``` ````), inline code
//! - `#`, `##`, `###` headings
//! - `***x***`, `**x**`, `*x*` and the `_` variants
//! - `[label](url)` links (open in a new tab, no opener/referrer)
//! - `- x` and `N. x` list blocks
//!
//! Unbalanced markers stay literal; rendering never fails.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CODE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(.*?)```").expect("valid code block regex"));

static H3_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.*)$").expect("valid h3 regex"));
static H2_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.*)$").expect("valid h2 regex"));
static H1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^# (.*)$").expect("valid h1 regex"));

static STAR_STRONG_EM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*\*(.+?)\*\*\*").expect("valid emphasis regex"));
static STAR_STRONG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid emphasis regex"));
static STAR_EM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").expect("valid emphasis regex"));
static UNDER_STRONG_EM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"___(.+?)___").expect("valid emphasis regex"));
static UNDER_STRONG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__(.+?)__").expect("valid emphasis regex"));
static UNDER_EM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(.+?)_").expect("valid emphasis regex"));

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(.+?)\]\((.+?)\)").expect("valid link regex"));
static INLINE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`(.+?)`").expect("valid inline code regex"));

static BULLET_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^- (.+)$").expect("valid bullet regex"));
static NUMBERED_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\. (.+)$").expect("valid numbered regex"));

static BLOCK_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)(?:h[1-3]|ul|ol|pre)>").expect("valid block tag regex"));
static LIST_OPEN_BR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(<[uo]l>)<br>").expect("valid list regex"));
static LIST_CLOSE_BR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<br>(</[uo]l>)").expect("valid list regex"));

/// Render note text to an HTML fragment.
///
/// Returns an empty string for empty or whitespace-only input; callers show
/// their own placeholder in that case.
pub fn render(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let (text, code_blocks) = extract_code_blocks(text);

    let mut html = escape_html(&text);
    html = headings(&html);
    html = emphasis(&html);
    html = links(&html);
    html = inline_code(&html);
    html = group_lists(&html);
    html = break_lines(&html);
    html = restore_code_blocks(html, &code_blocks);

    finish_paragraphs(&html)
}

pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn placeholder(index: usize) -> String {
    // Private-use delimiters: untouched by escaping and by every marker regex.
    format!("\u{E000}{index}\u{E001}")
}

fn extract_code_blocks(text: &str) -> (String, Vec<String>) {
    let mut blocks = Vec::new();
    let replaced = CODE_BLOCK_RE.replace_all(text, |caps: &Captures| {
        let token = placeholder(blocks.len());
        blocks.push(caps[1].trim().to_string());
        token
    });
    (replaced.into_owned(), blocks)
}

fn headings(html: &str) -> String {
    let html = H3_RE.replace_all(html, "<h3>${1}</h3>");
    let html = H2_RE.replace_all(&html, "<h2>${1}</h2>");
    H1_RE.replace_all(&html, "<h1>${1}</h1>").into_owned()
}

fn emphasis(html: &str) -> String {
    let html = STAR_STRONG_EM_RE.replace_all(html, "<strong><em>${1}</em></strong>");
    let html = STAR_STRONG_RE.replace_all(&html, "<strong>${1}</strong>");
    let html = STAR_EM_RE.replace_all(&html, "<em>${1}</em>");
    let html = UNDER_STRONG_EM_RE.replace_all(&html, "<strong><em>${1}</em></strong>");
    let html = UNDER_STRONG_RE.replace_all(&html, "<strong>${1}</strong>");
    UNDER_EM_RE.replace_all(&html, "<em>${1}</em>").into_owned()
}

fn links(html: &str) -> String {
    LINK_RE
        .replace_all(html, |caps: &Captures| {
            let label = &caps[1];
            let url = &caps[2];
            if is_unsafe_url(url) {
                return caps[0].to_string();
            }
            let href = url.replace('"', "&quot;");
            format!(r#"<a href="{href}" target="_blank" rel="noopener noreferrer">{label}</a>"#)
        })
        .into_owned()
}

const UNSAFE_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

fn is_unsafe_url(url: &str) -> bool {
    let url = url.trim_start().to_ascii_lowercase();
    UNSAFE_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
}

fn inline_code(html: &str) -> String {
    INLINE_CODE_RE
        .replace_all(html, "<code>${1}</code>")
        .into_owned()
}

/// Group consecutive `- x` / `N. x` lines into a single list element.
fn group_lists(html: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_unordered = false;
    let mut in_ordered = false;

    for line in html.split('\n') {
        if let Some(caps) = BULLET_LINE_RE.captures(line) {
            if in_ordered {
                out.push("</ol>".to_string());
                in_ordered = false;
            }
            if !in_unordered {
                out.push("<ul>".to_string());
                in_unordered = true;
            }
            out.push(format!("<li>{}</li>", &caps[1]));
        } else if let Some(caps) = NUMBERED_LINE_RE.captures(line) {
            if in_unordered {
                out.push("</ul>".to_string());
                in_unordered = false;
            }
            if !in_ordered {
                out.push("<ol>".to_string());
                in_ordered = true;
            }
            out.push(format!("<li>{}</li>", &caps[1]));
        } else {
            if in_unordered {
                out.push("</ul>".to_string());
                in_unordered = false;
            }
            if in_ordered {
                out.push("</ol>".to_string());
                in_ordered = false;
            }
            out.push(line.to_string());
        }
    }

    if in_unordered {
        out.push("</ul>".to_string());
    }
    if in_ordered {
        out.push("</ol>".to_string());
    }

    out.join("\n")
}

fn break_lines(html: &str) -> String {
    html.replace("\n\n", "</p><p>").replace('\n', "<br>")
}

fn restore_code_blocks(mut html: String, blocks: &[String]) -> String {
    for (index, code) in blocks.iter().enumerate() {
        let block = format!("<pre><code>{}</code></pre>", escape_html(code));
        html = html.replacen(&placeholder(index), &block, 1);
    }
    html
}

/// Wrap in a paragraph and keep block elements out of it.
///
/// Paragraphs are only split around top-level blocks; a code block inside a
/// heading or list item stays where it is.
fn finish_paragraphs(html: &str) -> String {
    let mut wrapped = String::with_capacity(html.len() + 16);
    wrapped.push_str("<p>");

    let mut depth = 0usize;
    let mut last = 0;
    for caps in BLOCK_TAG_RE.captures_iter(html) {
        let Some(tag) = caps.get(0) else {
            continue;
        };
        if caps[1].is_empty() {
            if depth == 0 {
                let before = &html[last..tag.start()];
                wrapped.push_str(before.strip_suffix("<br>").unwrap_or(before));
                wrapped.push_str("</p>");
                last = tag.start();
            }
            depth += 1;
        } else {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                wrapped.push_str(&html[last..tag.end()]);
                wrapped.push_str("<p>");
                last = tag.end();
                if html[last..].starts_with("<br>") {
                    last += "<br>".len();
                }
            }
        }
    }
    wrapped.push_str(&html[last..]);
    wrapped.push_str("</p>");

    let cleaned = wrapped.replace("<p></p>", "");
    let cleaned = LIST_OPEN_BR_RE.replace_all(&cleaned, "${1}");
    let cleaned = LIST_CLOSE_BR_RE.replace_all(&cleaned, "${1}");
    cleaned.replace("</li><br><li>", "</li><li>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_whitespace_render_nothing() {
        assert_eq!(render(""), "");
        assert_eq!(render("   \n\t "), "");
    }

    #[test]
    fn test_plain_text_is_only_escaped_and_wrapped() {
        assert_eq!(render("hello world"), "<p>hello world</p>");
        assert_eq!(render("a & b < c > d"), "<p>a &amp; b &lt; c &gt; d</p>");
        assert_eq!(render("<script>"), "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn test_line_and_paragraph_breaks() {
        assert_eq!(render("a\nb"), "<p>a<br>b</p>");
        assert_eq!(render("a\n\nb"), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_headings_longest_prefix_first() {
        assert_eq!(render("# One"), "<h1>One</h1>");
        assert_eq!(render("## Two"), "<h2>Two</h2>");
        assert_eq!(render("### Three"), "<h3>Three</h3>");
        assert_eq!(render("#NoSpace"), "<p>#NoSpace</p>");
    }

    #[test]
    fn test_heading_is_not_nested_in_paragraph() {
        assert_eq!(render("# T\nbody"), "<h1>T</h1><p>body</p>");
        assert_eq!(render("intro\n\n## T"), "<p>intro</p><h2>T</h2>");
    }

    #[test]
    fn test_emphasis_precedence() {
        assert_eq!(
            render("***a*** **b** *c*"),
            "<p><strong><em>a</em></strong> <strong>b</strong> <em>c</em></p>"
        );
        assert_eq!(
            render("___a___ __b__ _c_"),
            "<p><strong><em>a</em></strong> <strong>b</strong> <em>c</em></p>"
        );
    }

    #[test]
    fn test_unbalanced_markers_stay_literal() {
        assert_eq!(render("*a"), "<p>*a</p>");
        assert_eq!(render("a ` b"), "<p>a ` b</p>");
        assert_eq!(render("[label](no close"), "<p>[label](no close</p>");
    }

    #[test]
    fn test_links_open_in_new_tab_without_opener() {
        assert_eq!(
            render("see [Glance](https://example.com)"),
            r#"<p>see <a href="https://example.com" target="_blank" rel="noopener noreferrer">Glance</a></p>"#
        );
    }

    #[test]
    fn test_link_href_cannot_break_attribute() {
        let html = render(r#"[x](a" onmouseover="y)"#);
        assert!(html.contains(r#"href="a&quot; onmouseover=&quot;y""#));
        assert_eq!(render("[x](javascript:alert(1))"), "<p>[x](javascript:alert(1))</p>");
        assert_eq!(render("[x]( JavaScript:alert(1))"), "<p>[x]( JavaScript:alert(1))</p>");
        assert_eq!(render("[x](vbscript:msgbox)"), "<p>[x](vbscript:msgbox)</p>");
        assert_eq!(
            render("[x](data:text/html;base64,PHNjcmlwdD4=)"),
            "<p>[x](data:text/html;base64,PHNjcmlwdD4=)</p>"
        );
        assert!(!render("[x](DATA:text/html,hi)").contains("<a "));
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(render("run `ls -la` now"), "<p>run <code>ls -la</code> now</p>");
    }

    #[test]
    fn test_fenced_code_keeps_markdown_literal() {
        let html = render("```\n# not a heading\n- not a list\n*not em* & <b>\n```");
        assert_eq!(
            html,
            "<pre><code># not a heading\n- not a list\n*not em* &amp; &lt;b&gt;</code></pre>"
        );
    }

    #[test]
    fn test_multiple_code_blocks_keep_their_order() {
        let html = render("```one```\n\ntext\n\n```two```");
        assert_eq!(
            html,
            "<pre><code>one</code></pre><p>text</p><pre><code>two</code></pre>"
        );
    }

    #[test]
    fn test_consecutive_bullets_form_one_list() {
        let html = render("- a\n- b\n- c");
        assert_eq!(html, "<ul><li>a</li><li>b</li><li>c</li></ul>");
        assert_eq!(html.matches("<ul>").count(), 1);
        assert_eq!(html.matches("<li>").count(), 3);
    }

    #[test]
    fn test_numbered_lines_form_ordered_list() {
        assert_eq!(render("1. x\n2. y"), "<ol><li>x</li><li>y</li></ol>");
    }

    #[test]
    fn test_switching_list_kind_closes_block() {
        let html = render("- a\n1. b");
        assert_eq!(html, "<ul><li>a</li></ul><ol><li>b</li></ol>");
    }

    #[test]
    fn test_list_closed_by_plain_line() {
        let html = render("- a\n- b\nafter");
        assert_eq!(html, "<ul><li>a</li><li>b</li></ul><p>after</p>");
    }

    #[test]
    fn test_code_block_inside_heading_or_list_item_stays_balanced() {
        assert_eq!(render("# ```x```"), "<h1><pre><code>x</code></pre></h1>");
        assert_eq!(
            render("- ```x```"),
            "<ul><li><pre><code>x</code></pre></li></ul>"
        );
        assert_eq!(
            render("intro\n- ```x```\n- y\nafter"),
            "<p>intro</p><ul><li><pre><code>x</code></pre></li><li>y</li></ul><p>after</p>"
        );
    }

    #[test]
    fn test_inline_formatting_inside_list_items() {
        assert_eq!(
            render("- **bold** item"),
            "<ul><li><strong>bold</strong> item</li></ul>"
        );
    }
}
