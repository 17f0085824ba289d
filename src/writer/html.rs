//! HTML rendering for the browser frontend
//!
//! Embeds Vega-Lite documents through vega-embed and renders tables and the
//! dashboard page around them.

use crate::transform::Table;
use crate::writer::vegalite::to_json_string;
use crate::Result;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

const VEGA_CDN: &str = "https://cdn.jsdelivr.net/npm/vega@5";
const VEGA_LITE_CDN: &str = "https://cdn.jsdelivr.net/npm/vega-lite@5";
const VEGA_EMBED_CDN: &str = "https://cdn.jsdelivr.net/npm/vega-embed@6";

static NEXT_VIS_ID: AtomicU64 = AtomicU64::new(0);

/// Escape HTML special characters
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Script tags loading the Vega libraries; include once per page
pub fn vega_scripts() -> String {
    format!(
        "<script src=\"{}\"></script>\n<script src=\"{}\"></script>\n<script src=\"{}\"></script>",
        VEGA_CDN, VEGA_LITE_CDN, VEGA_EMBED_CDN
    )
}

/// A self-contained fragment drawing one Vega-Lite document
///
/// Expects [`vega_scripts`] on the hosting page.
pub fn embed_fragment(spec: &Value) -> Result<String> {
    // `</` inside string data would close the script element early
    let spec_json = to_json_string(spec)?.replace("</", "<\\/");
    let vis_id = format!("vis-{}", NEXT_VIS_ID.fetch_add(1, Ordering::Relaxed));

    Ok(format!(
        r#"<div id="{id}" class="plot" style="width: 100%;"></div>
<script type="text/javascript">
  (function() {{
    const spec = {spec};
    vegaEmbed('#{id}', spec, {{"actions": true}}).catch(console.error);
  }})();
</script>"#,
        id = vis_id,
        spec = spec_json
    ))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            Some(f) if n.is_f64() => format!("{:.2}", f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Convert a table to an HTML table element
pub fn table_to_html(table: &Table) -> String {
    let mut html = String::from("<table class=\"data\">\n<thead><tr>");

    for header in &table.headers {
        html.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(&cell_text(cell))));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>");
    html
}

/// One navigation entry of the dashboard page
pub struct NavLink<'a> {
    pub label: &'a str,
    pub href: String,
}

/// Full dashboard page: navigation, title, optional plot, table
pub fn render_page(
    title: &str,
    nav: &[NavLink<'_>],
    table: &Table,
    plot_html: Option<&str>,
) -> String {
    let links: Vec<String> = nav
        .iter()
        .map(|link| {
            format!(
                "<a href=\"{}\">{}</a>",
                escape_html(&link.href),
                escape_html(link.label)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
{scripts}
<style>
  body {{ font-family: sans-serif; margin: 0 2rem; }}
  nav a {{ margin-right: 1rem; }}
  table.data {{ border-collapse: collapse; margin-top: 1rem; }}
  table.data th, table.data td {{ border: 1px solid #CCCCCC; padding: 0.25rem 0.5rem; }}
</style>
</head>
<body>
<nav>{links}</nav>
<h1>{title}</h1>
{plot}
{table}
</body>
</html>
"#,
        title = escape_html(title),
        scripts = vega_scripts(),
        links = links.join(" "),
        plot = plot_html.unwrap_or(""),
        table = table_to_html(table),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            escape_html("<script>alert('xss')</script>"),
            "&lt;script&gt;alert(&#x27;xss&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_embed_fragment() {
        let html = embed_fragment(&json!({ "mark": "bar", "title": "</script>" })).unwrap();
        assert!(html.contains("vegaEmbed"));
        assert!(html.contains("\"mark\":\"bar\""));
        assert!(!html.contains("\"</script>\""));
    }

    #[test]
    fn test_embed_ids_are_unique() {
        let a = embed_fragment(&json!({})).unwrap();
        let b = embed_fragment(&json!({})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_table_to_html() {
        let table = Table {
            headers: vec!["Year".to_string(), "Country".to_string(), "Density".to_string()],
            rows: vec![vec![json!(2023), json!("Bosnia & Herzegovina"), json!(null)]],
        };
        let html = table_to_html(&table);
        assert!(html.contains("<th>Year</th>"));
        assert!(html.contains("<td>2023</td>"));
        assert!(html.contains("Bosnia &amp; Herzegovina"));
        assert!(html.contains("<td></td>"));
    }

    #[test]
    fn test_cell_text_numbers() {
        assert_eq!(cell_text(&json!(8.1e9)), "8100000000");
        assert_eq!(cell_text(&json!(122.456)), "122.46");
        assert_eq!(cell_text(&json!(2023)), "2023");
    }

    #[test]
    fn test_render_page() {
        let nav = [NavLink {
            label: "World",
            href: "/?query=world&view=graph".to_string(),
        }];
        let page = render_page("World", &nav, &Table::empty(), Some("<div>plot</div>"));
        assert!(page.contains("vega-embed@6"));
        assert!(page.contains("query=world&amp;view=graph"));
        assert!(page.contains("<div>plot</div>"));
    }
}
