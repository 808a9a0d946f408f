//! HTML view of the refresh table.

use std::fmt::Write;

use shapemedian_core::render::{COLUMNS, WELCOME};
use shapemedian_core::{RefreshResult, RenderState, Renderer, format_area};

/// Seconds between automatic reloads while a cycle is in flight.
const LOADING_RELOAD_SECS: u32 = 1;

/// Builds a full HTML page for each render call.
#[derive(Debug, Default)]
pub struct HtmlRenderer {
    page: String,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently rendered page.
    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn into_page(self) -> String {
        self.page
    }
}

impl Renderer for HtmlRenderer {
    fn render(&mut self, state: &RenderState, data: &[RefreshResult]) {
        self.page = render_page(state, data);
    }
}

/// Whole page: banner for the state, the table when there is data, and the
/// refresh button.
pub fn render_page(state: &RenderState, data: &[RefreshResult]) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    if *state == RenderState::Loading {
        let _ = writeln!(
            html,
            "<meta http-equiv=\"refresh\" content=\"{LOADING_RELOAD_SECS}\">"
        );
    }
    html.push_str("<title>Shape medians</title>\n</head>\n<body>\n<div id=\"app\">\n");

    match state {
        RenderState::Welcome => {
            let _ = writeln!(html, "<p>{}</p>", escape(WELCOME));
        }
        RenderState::Loading => html.push_str("<p>Loading...</p>\n"),
        RenderState::Idle => {}
        RenderState::Failed(msg) => {
            let _ = writeln!(html, "<p class=\"error\">Refresh failed: {}</p>", escape(msg));
        }
    }
    if !data.is_empty() {
        html.push_str(&render_table(data));
    }

    html.push_str("</div>\n");
    html.push_str(
        "<form method=\"post\" action=\"/refresh\">\n<button id=\"click\" type=\"submit\">Refresh</button>\n</form>\n",
    );
    html.push_str("</body>\n</html>\n");
    html
}

/// The `<table>` element alone.
pub fn render_table(data: &[RefreshResult]) -> String {
    let mut html = String::from("<table>\n<thead>\n<tr>");
    for col in COLUMNS {
        let _ = write!(html, "<th>{}</th>", escape(col));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in data {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            row.name(),
            format_area(row.median_area),
            format_area(row.latest_area),
            row.refresh_count
        );
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

/// Minimal HTML text escaping.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapemedian_core::ShapeKind;

    fn rows() -> Vec<RefreshResult> {
        vec![
            RefreshResult {
                shape: ShapeKind::Square,
                distances: vec![3.0],
                latest_area: 9.0,
                median_area: 4.0,
                refresh_count: 2,
            },
            RefreshResult {
                shape: ShapeKind::Ellipse,
                distances: vec![1.0, 2.0],
                latest_area: 2.0 * std::f64::consts::PI,
                median_area: 2.0 * std::f64::consts::PI,
                refresh_count: 2,
            },
        ]
    }

    #[test]
    fn escape_special_chars() {
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn table_rows_in_order() {
        let html = render_table(&rows());
        assert!(html.contains("<th>Median Area</th>"));
        assert!(html.contains("<th># Area Calculations</th>"));
        assert!(html.contains("<tr><td>square</td><td>4.00</td><td>9.00</td><td>2</td></tr>"));
        let square = html.find("square").unwrap();
        let ellipse = html.find("ellipse").unwrap();
        assert!(square < ellipse);
        assert!(html.contains("<td>6.28</td>"));
    }

    #[test]
    fn welcome_page_has_button_and_no_table() {
        let html = render_page(&RenderState::Welcome, &[]);
        assert!(html.contains("Welcome!"));
        assert!(html.contains("<button id=\"click\""));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn loading_page_reloads() {
        let html = render_page(&RenderState::Loading, &rows());
        assert!(html.contains("http-equiv=\"refresh\""));
        assert!(html.contains("Loading..."));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn failed_page_escapes_message() {
        let html = render_page(&RenderState::Failed("<oops>".into()), &[]);
        assert!(html.contains("Refresh failed: &lt;oops&gt;"));
        assert!(!html.contains("http-equiv"));
    }

    #[test]
    fn renderer_keeps_last_page() {
        let mut r = HtmlRenderer::new();
        r.render(&RenderState::Idle, &rows());
        assert!(r.page().contains("<tbody>"));
        r.render(&RenderState::Loading, &[]);
        assert!(!r.page().contains("<tbody>"));
    }
}
