use maud::html;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static BARE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("static regex"));

/// Turns bare `http(s)://` URLs into anchors that open in a new tab.
///
/// Text around the URLs is copied through untouched, markup included.
pub fn linkify(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    BARE_URL
        .replace_all(text, |caps: &Captures<'_>| anchor(&caps[0]))
        .into_owned()
}

enum Piece<'a> {
    Text(&'a str),
    Url(&'a str),
}

/// Like [`linkify`], but escapes everything so the result is inert markup.
pub fn linkify_escaped(text: &str) -> String {
    let mut pieces = Vec::new();
    let mut last = 0;
    for m in BARE_URL.find_iter(text) {
        pieces.push(Piece::Text(&text[last..m.start()]));
        pieces.push(Piece::Url(m.as_str()));
        last = m.end();
    }
    pieces.push(Piece::Text(&text[last..]));

    html! {
        @for piece in &pieces {
            @match piece {
                Piece::Text(t) => { (t) }
                Piece::Url(url) => {
                    a href=(url) target="_blank" rel="noopener noreferrer" { (url) }
                }
            }
        }
    }
    .into_string()
}

fn anchor(url: &str) -> String {
    format!(r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{url}</a>"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stays_empty() {
        assert_eq!(linkify(""), "");
        assert_eq!(linkify_escaped(""), "");
    }

    #[test]
    fn wraps_a_single_url() {
        let out = linkify("see http://a.b");
        assert_eq!(
            out,
            r#"see <a href="http://a.b" target="_blank" rel="noopener noreferrer">http://a.b</a>"#
        );
        assert_eq!(out.matches("<a ").count(), 1);
    }

    #[test]
    fn url_ends_at_whitespace() {
        let out = linkify("a https://x.y/p?q=1, b\nhttp://z.w end");
        assert!(out.contains(r#"href="https://x.y/p?q=1,""#));
        assert!(out.contains(r#"href="http://z.w""#));
        assert!(out.ends_with(" end"));
    }

    #[test]
    fn plain_text_is_not_escaped() {
        assert_eq!(linkify("<b>hi</b>"), "<b>hi</b>");
        assert_eq!(linkify("ftp://nope"), "ftp://nope");
    }

    #[test]
    fn escaped_variant_neutralises_markup() {
        let out = linkify_escaped("<i>x</i> https://a.b/<x>");
        assert!(out.starts_with("&lt;i&gt;x&lt;/i&gt; "));
        assert!(out.contains(r#"href="https://a.b/&lt;x&gt;""#));
        assert!(!out.contains("<i>"));
    }

    #[test]
    fn escaped_variant_matches_plain_anchor_shape() {
        assert_eq!(
            linkify_escaped("a & http://a.b"),
            r#"a &amp; <a href="http://a.b" target="_blank" rel="noopener noreferrer">http://a.b</a>"#
        );
    }
}
