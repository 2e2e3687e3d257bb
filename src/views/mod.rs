//! HTML rendering.
//!
//! Handlers gather everything a page needs into a view struct and hand it to
//! one of the `render` functions here, which only format markup. Any text that
//! came from a user passes through [`escape`].

mod cat_detail;
mod cats;
mod history;
mod home;

pub use cat_detail::{render as cat_detail, CatDetailView};
pub use cats::render as cats;
pub use history::{render as history, HistoryView};
pub use home::{render as home, HomeView};

use axum::http::StatusCode;

use crate::dates;
use crate::images::StoredImage;

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;background:#faf7f2;color:#2b2b2b}\
header{background:#3d2c1e;color:#fff;padding:.8rem 1.5rem;display:flex;gap:1.5rem;align-items:center}\
header a{color:#f6d7a7;text-decoration:none}header a.active{color:#fff;font-weight:bold}\
main{max-width:960px;margin:0 auto;padding:1.5rem}\
.card{background:#fff;border-radius:8px;padding:1rem;margin-bottom:1rem;box-shadow:0 1px 3px rgba(0,0,0,.1)}\
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(200px,1fr));gap:1rem}\
img.thumb{width:100%;max-height:200px;object-fit:cover;border-radius:6px}\
img.avatar{width:48px;height:48px;object-fit:cover;border-radius:50%}\
.muted{color:#777;font-size:.9em}form.inline{display:inline}";

/// Escape text for use in HTML content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap page content in the shared layout.
fn layout(title: &str, active: &str, body: &str) -> String {
    let nav = [("/", "Home"), ("/cats", "Cats"), ("/history", "History")]
        .iter()
        .map(|(href, label)| {
            let class = if *href == active { " class=\"active\"" } else { "" };
            format!("<a href=\"{href}\"{class}>{label}</a>")
        })
        .collect::<Vec<_>>()
        .join("");

    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{} - Cat Tracker</title><style>{STYLE}</style></head><body>\
<header><strong>Cat Tracker</strong>{nav}</header><main>{body}</main></body></html>",
        escape(title)
    )
}

fn img(image: Option<&StoredImage>, class: &str, alt: &str) -> String {
    match image {
        Some(image) => format!(
            "<img class=\"{class}\" src=\"{}\" alt=\"{}\">",
            image.data_uri(),
            escape(alt)
        ),
        None => String::new(),
    }
}

/// `<time>` element for a stored timestamp; empty when there is none.
fn time_tag(raw: Option<&str>) -> String {
    match dates::normalize_opt(raw) {
        Some(iso) => format!(
            "<time datetime=\"{}\">{}</time>",
            escape(&iso),
            escape(&dates::display(&iso))
        ),
        None => String::new(),
    }
}

/// A POST form consisting of a single button.
fn button_form(action: &str, label: &str, confirm: Option<&str>) -> String {
    let onsubmit = confirm
        .map(|msg| format!(" onsubmit=\"return confirm('{}')\"", escape(msg)))
        .unwrap_or_default();
    format!(
        "<form class=\"inline\" method=\"post\" action=\"{action}\"{onsubmit}>\
<button type=\"submit\">{}</button></form>",
        escape(label)
    )
}

/// Minimal page for failed requests. Details stay in the logs.
pub fn error_page(status: StatusCode) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    layout(
        reason,
        "",
        &format!(
            "<div class=\"card\"><h1>{} {}</h1><p>Something went wrong handling this request.</p>\
<p><a href=\"/\">Back to the start page</a></p></div>",
            status.as_u16(),
            escape(reason)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("Tom & Jerry"), "Tom &amp; Jerry");
        assert_eq!(escape("<script>\"x\"</script>"), "&lt;script&gt;&quot;x&quot;&lt;/script&gt;");
        assert_eq!(escape("it's"), "it&#39;s");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_time_tag() {
        assert_eq!(
            time_tag(Some("2024-03-05 14:30:00")),
            "<time datetime=\"2024-03-05T14:30:00Z\">2024-03-05 14:30 UTC</time>"
        );
        assert_eq!(time_tag(None), "");
        assert_eq!(time_tag(Some("")), "");
    }

    #[test]
    fn test_error_page_hides_details() {
        let page = error_page(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(page.contains("500 Internal Server Error"));
    }
}
