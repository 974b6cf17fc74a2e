//! HTML pages: the upload form and the book list.

use std::fmt::Write as _;
use std::sync::Arc;

use axum::{extract::State, response::Html};

use crate::catalog::Record;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

const UPLOAD_PAGE: &str = include_str!("../../../static/upload.html");

/// GET / - Upload form.
pub async fn upload_page() -> Html<&'static str> {
    Html(UPLOAD_PAGE)
}

/// GET /books - Book list page.
pub async fn book_list_page(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ApiError> {
    let records = state.catalog.list()?;
    if records.is_empty() {
        tracing::info!("The book list is empty");
    }

    Ok(Html(render_book_list(&records)))
}

/// Render the book list page.
pub fn render_book_list(records: &[Record]) -> String {
    let mut rows = String::new();

    for record in records {
        let id = urlencoding::encode(&record.id);
        let name = escape_html(&record.name);
        let _ = write!(
            rows,
            "      <tr>\n\
             \x20       <td><a href=\"/download/{id}\">{name}</a></td>\n\
             \x20       <td>{content_type}</td>\n\
             \x20       <td class=\"size\">{size}</td>\n\
             \x20       <td><a class=\"delete\" href=\"/delete/{id}\" \
             onclick=\"return confirm('Delete this file?')\">Delete</a></td>\n\
             \x20     </tr>\n",
            content_type = escape_html(&record.content_type),
            size = format_size(record.size),
        );
    }

    let body = if records.is_empty() {
        "    <p class=\"empty\">No books yet.</p>\n".to_string()
    } else {
        format!(
            "    <table>\n\
             \x20     <tr><th>Name</th><th>Type</th><th>Size</th><th></th></tr>\n\
             {rows}\
             \x20   </table>\n"
        )
    };

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         \x20 <meta charset=\"utf-8\">\n\
         \x20 <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         \x20 <title>Bookshelf</title>\n\
         \x20 <style>\n\
         \x20   body {{ font-family: sans-serif; margin: 2rem auto; max-width: 60rem; }}\n\
         \x20   table {{ border-collapse: collapse; width: 100%; }}\n\
         \x20   th, td {{ border-bottom: 1px solid #ddd; padding: 0.4rem; text-align: left; }}\n\
         \x20   td.size {{ text-align: right; white-space: nowrap; }}\n\
         \x20   a.delete {{ color: #c0392b; }}\n\
         \x20 </style>\n\
         </head>\n\
         <body>\n\
         \x20 <h1>Bookshelf</h1>\n\
         \x20 <p><a href=\"/\">Upload more</a> · {count} file(s)</p>\n\
         {body}\
         </body>\n\
         </html>\n",
        count = records.len(),
    )
}

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Format a byte count for display (1024-based).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, size: u64) -> Record {
        Record {
            id: id.to_string(),
            name: name.to_string(),
            content_type: "application/pdf".to_string(),
            size,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("plain.txt"), "plain.txt");
        assert_eq!(
            escape_html("<script>alert(\"x\")</script>"),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("Tom & Jerry's.pdf"), "Tom &amp; Jerry&#39;s.pdf");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_render_empty_list() {
        let html = render_book_list(&[]);

        assert!(html.contains("No books yet."));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn test_render_list_with_records() {
        let html = render_book_list(&[
            record("20240101_000000_aaaaaaaa", "first.pdf", 2048),
            record("20240102_000000_bbbbbbbb", "second.pdf", 10),
        ]);

        assert!(html.contains("href=\"/download/20240101_000000_aaaaaaaa\""));
        assert!(html.contains("href=\"/delete/20240102_000000_bbbbbbbb\""));
        assert!(html.contains(">first.pdf</a>"));
        assert!(html.contains("2.0 KB"));
        assert!(html.contains("10 B"));
        assert!(html.contains("2 file(s)"));
    }

    #[test]
    fn test_render_escapes_names() {
        let html = render_book_list(&[record("id1", "<img src=x onerror=alert(1)>.pdf", 1)]);

        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;.pdf"));
    }

    #[tokio::test]
    async fn test_upload_page() {
        let Html(page) = upload_page().await;

        assert!(page.contains("<form"));
        assert!(page.contains("name=\"file\""));
        assert!(page.contains("/upload"));
    }
}
