//! HTML rendering of directory listings.

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::http::response::escape_html;
use crate::listing::ListingEntry;

/// Characters left unescaped in a single path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; font-size: 14px; }
.container { max-width: 1000px; margin: 0 auto; background: white; padding: 20px; border-radius: 5px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
h1 { color: #333; font-size: 18px; margin-top: 0; padding-bottom: 10px; border-bottom: 1px solid #eee; }
table { width: 100%; border-collapse: collapse; margin-top: 10px; }
th { background-color: #f2f2f2; text-align: left; padding: 12px; font-weight: 500; font-size: 13px; }
td { padding: 10px 12px; border-bottom: 1px solid #eee; font-size: 13px; }
tr:hover { background-color: #f9f9f9; }
a { color: #0066cc; text-decoration: none; }
a:hover { text-decoration: underline; }
.size { text-align: right; font-family: monospace; }
.time { white-space: nowrap; }
.breadcrumb { padding: 5px 15px; margin-bottom: 5px; background-color: #f5f5f5; border-radius: 4px; }
";

/// Render the listing page for `request_path` (raw, percent-encoded).
///
/// Directories are shown before files; within each group the order of
/// `entries` is preserved.
pub fn render_listing(request_path: &str, entries: &[ListingEntry]) -> String {
    let base = request_path.trim_end_matches('/');
    let title = format!("List of {} files", entries.len());

    let mut html = String::with_capacity(2048 + entries.len() * 200);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<title>{title}</title>\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <style>\n{STYLE}</style>\n</head>\n<body>\n<div class=\"container\">\n<h1>{title}</h1>\n"
    );

    html.push_str("<div class=\"breadcrumb\">\n<a href=\"/\">/</a>\n");
    for (href, label) in breadcrumbs(base) {
        let _ = writeln!(
            html,
            " / <a href=\"{}\">{}</a>",
            escape_html(&href),
            escape_html(&label)
        );
    }
    html.push_str("</div>\n");

    html.push_str(
        "<table>\n<thead>\n<tr><th>Name</th><th class=\"size\">Size</th><th class=\"time\">Modified</th></tr>\n</thead>\n<tbody>\n",
    );

    if !base.is_empty() {
        let _ = writeln!(
            html,
            "<tr><td colspan=\"3\"><a href=\"{}\">.. (parent directory)</a></td></tr>",
            escape_html(parent_path(base))
        );
    }

    let dirs = entries.iter().filter(|e| e.is_dir);
    let files = entries.iter().filter(|e| !e.is_dir);
    for entry in dirs.chain(files) {
        let href = format!("{base}/{}", utf8_percent_encode(&entry.name, SEGMENT));
        let (label, size) = if entry.is_dir {
            (format!("{}/", entry.name), "-".to_string())
        } else {
            (entry.name.clone(), format_bytes(entry.size))
        };
        let _ = writeln!(
            html,
            "<tr><td><a href=\"{}\">{}</a></td><td class=\"size\">{}</td><td class=\"time\">{}</td></tr>",
            escape_html(&href),
            escape_html(&label),
            size,
            DateTime::<Local>::from(entry.modified).format("%Y-%m-%d %H:%M")
        );
    }

    html.push_str("</tbody>\n</table>\n</div>\n</body>\n</html>\n");
    html
}

/// Cumulative `(href, label)` pairs for each segment of `base`.
fn breadcrumbs(base: &str) -> Vec<(String, String)> {
    let mut href = String::new();
    base.split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            href.push('/');
            href.push_str(segment);
            (
                href.clone(),
                percent_decode_str(segment).decode_utf8_lossy().into_owned(),
            )
        })
        .collect()
}

fn parent_path(base: &str) -> &str {
    match base.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &base[..i],
    }
}

/// Decimal human-readable size (`999 B`, `1.5 kB`, `2.0 MB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1000;
    const PREFIXES: &[u8] = b"kMGTPE";
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}B", bytes as f64 / div as f64, PREFIXES[exp] as char)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn entry(name: &str, is_dir: bool, size: u64) -> ListingEntry {
        ListingEntry {
            name: name.to_string(),
            is_dir,
            size,
            modified: SystemTime::now(),
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(999), "999 B");
        assert_eq!(format_bytes(1_500), "1.5 kB");
        assert_eq!(format_bytes(2_000_000), "2.0 MB");
        assert_eq!(format_bytes(3_200_000_000), "3.2 GB");
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("/a"), "/");
        assert_eq!(parent_path("/a/b"), "/a");
        assert_eq!(parent_path("/a/b/c"), "/a/b");
    }

    #[test]
    fn test_breadcrumbs() {
        assert_eq!(
            breadcrumbs("/runs/my%20run"),
            vec![
                ("/runs".to_string(), "runs".to_string()),
                ("/runs/my%20run".to_string(), "my run".to_string()),
            ]
        );
        assert!(breadcrumbs("").is_empty());
    }

    #[test]
    fn test_root_listing_has_no_parent_link() {
        let html = render_listing("/", &[entry("a.prof", false, 10)]);
        assert!(html.contains("<title>List of 1 files</title>"));
        assert!(!html.contains("parent directory"));
        assert!(html.contains("href=\"/a.prof\""));
    }

    #[test]
    fn test_nested_listing_links() {
        let html = render_listing(
            "/runs/",
            &[entry("cpu.prof", false, 1_500), entry("old", true, 4096)],
        );
        assert!(html.contains("<a href=\"/\">.. (parent directory)</a>"));
        assert!(html.contains("href=\"/runs/cpu.prof\""));
        assert!(html.contains("1.5 kB"));
        // Directories come first regardless of the incoming order.
        let dir_pos = html.find("old/").unwrap();
        let file_pos = html.find("cpu.prof</a>").unwrap();
        assert!(dir_pos < file_pos);
    }

    #[test]
    fn test_names_are_escaped() {
        let html = render_listing("/", &[entry("<b>&x.prof", false, 1)]);
        assert!(html.contains("&lt;b&gt;&amp;x.prof"));
        assert!(html.contains("href=\"/%3Cb%3E%26x.prof\""));
        assert!(!html.contains("<b>&x"));
    }
}
