// Page templates
//
// The full document is header + wrapper open + diff body + wrapper close +
// footer. The streamed path emits exactly those pieces as separate
// fragments, so a streamed page and a buffered page are byte-identical.

use axum::http::StatusCode;
use html_escape::encode_text;

use crate::differ::{DiffResult, FileInfo};

pub const WRAPPER_OPEN: &str = "<div class=\"diff-content\" id=\"diff-view\">";
pub const WRAPPER_CLOSE: &str = "</div>";

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;padding:1rem;background:#fafafa}\
.file-info{display:flex;gap:2rem;margin-bottom:1rem}\
.file-info section{flex:1;background:#fff;border:1px solid #ddd;padding:.5rem 1rem}\
.diff-table{border-collapse:collapse;width:100%;font-family:monospace}\
.diff-table td{padding:0 .4rem;vertical-align:top}\
.diff-table pre{margin:0;white-space:pre-wrap}\
.line-num{color:#999;text-align:right;user-select:none}\
.diff-insert{background:#e6ffec}.diff-delete{background:#ffebe9}\
.error{max-width:40rem;margin:4rem auto;background:#fff;border:1px solid #d33;padding:1rem 2rem}";

/// Everything before the diff body: document head and the file info panel.
pub fn render_header(file1: &FileInfo, file2: &FileInfo) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>livediff: {} vs {}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <div class=\"file-info\">\n{}{}</div>\n",
        encode_text(&file1.path),
        encode_text(&file2.path),
        render_file_info("Original", file1),
        render_file_info("Modified", file2),
    )
}

fn render_file_info(label: &str, info: &FileInfo) -> String {
    let modified = info
        .modified
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "<section><h2>{label}</h2><p class=\"path\">{}</p>\
         <p>{} bytes, {} lines, modified {modified}</p></section>\n",
        encode_text(&info.path),
        info.size,
        info.line_count,
    )
}

pub fn render_footer() -> String {
    "\n</body>\n</html>\n".to_string()
}

/// The complete buffered document.
pub fn render_index(result: &DiffResult) -> String {
    let header = render_header(&result.file1_info, &result.file2_info);
    let footer = render_footer();
    let mut page = String::with_capacity(
        header.len()
            + WRAPPER_OPEN.len()
            + result.diff_html.len()
            + WRAPPER_CLOSE.len()
            + footer.len(),
    );
    page.push_str(&header);
    page.push_str(WRAPPER_OPEN);
    page.push_str(&result.diff_html);
    page.push_str(WRAPPER_CLOSE);
    page.push_str(&footer);
    page
}

/// The uniform error page. Only the status and the already-sanitized
/// message vary.
pub fn render_error(status: StatusCode, message: &str) -> String {
    let code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or("Error");
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{code} {reason}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <div class=\"error\">\n<h1>{code} {reason}</h1>\n<p class=\"message\">{}</p>\n\
         </div>\n</body>\n</html>\n",
        encode_text(message)
    )
}
