//! Server-rendered page fragments: layout, sidebar, table listing and selector.
//!
//! Every dynamic value goes through [`escape`]; the rest is fixed markup.

use std::borrow::Cow;
use std::fmt::Write;

use serde_json::Value;

use crate::types::Row;

const NAV: &[(&str, &str)] = &[
    ("/", "Assignment 1"),
    ("/assignment-2", "Assignment 2"),
    ("/assignment-3", "Assignment 3"),
];

pub(super) const EMPTY_TABLE: &str = "<p>No rows in this table.</p>";
pub(super) const NOT_CONFIGURED: &str = "<p class=\"error\">Supabase not configured. \
     Set SUPABASE_URL and SUPABASE_ANON_KEY.</p>";
pub(super) const LOAD_FAILED: &str = "<p class=\"error\">Failed to load. \
     Check your Supabase URL and anon key.</p>";

/// Escapes `& < > " '` for text and attribute positions.
pub(super) fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut escaped = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Full document with the sidebar; `current` marks the active nav entry.
pub(super) fn page(title: &str, current: &str, content: &str) -> String {
    let mut nav = String::new();
    for (href, label) in NAV {
        let active = if *href == current || (*href != "/" && current.starts_with(href)) {
            " sidebar-link-active"
        } else {
            ""
        };
        let _ = write!(nav, "<a class=\"sidebar-link{active}\" href=\"{href}\">{label}</a>");
    }
    format!(
        "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body><aside class=\"sidebar\"><h2 class=\"sidebar-subtitle\">Humor Project</h2>\
         <nav class=\"sidebar-nav\">{nav}</nav></aside>\n\
         <main class=\"content-page\"><h1 class=\"page-title\">{title}</h1>\n{content}\n</main></body></html>",
        title = escape(title),
    )
}

/// Rows as an HTML table. Columns come from the first row; missing or null cells show a dash.
pub(super) fn table(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return EMPTY_TABLE.to_string();
    };
    let columns: Vec<&String> = first.keys().collect();

    let mut out = String::from("<div class=\"table-wrap\"><table>\n<thead><tr>");
    for col in &columns {
        let _ = write!(out, "<th>{}</th>", escape(col));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for col in &columns {
            let _ = write!(out, "<td>{}</td>", cell(row.get(col.as_str())));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody></table></div>");
    out
}

fn cell(value: Option<&Value>) -> Cow<'static, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed("&mdash;"),
        Some(Value::String(s)) => Cow::Owned(escape(s).into_owned()),
        Some(other) => Cow::Owned(escape(&other.to_string()).into_owned()),
    }
}

/// GET form choosing among allow-listed tables.
pub(super) fn table_select(action: &str, tables: &[String], current: &str) -> String {
    let mut options = String::new();
    for name in tables {
        let selected = if name == current { " selected" } else { "" };
        let name = escape(name);
        let _ = write!(options, "<option value=\"{name}\"{selected}>{name}</option>");
    }
    format!(
        "<form class=\"table-select-wrap\" method=\"get\" action=\"{action}\">\
         <label for=\"table-select\" class=\"table-select-label\">Choose a list:</label>\
         <select id=\"table-select\" name=\"table\" class=\"table-select\">{options}</select>\
         <button type=\"submit\">Show</button></form>",
        action = escape(action),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn escape_only_allocates_when_needed() {
        assert!(matches!(escape("humor_flavors"), Cow::Borrowed(_)));
        assert_eq!(
            escape(r#"<b a="1">Tom & 'Jerry'</b>"#),
            "&lt;b a=&quot;1&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn table_escapes_cells_and_dashes_nulls() {
        let html = table(&[
            row(json!({"id": 1, "slug": "<script>x</script>", "note": null})),
            row(json!({"id": 2})),
        ]);
        assert!(html.contains("<th>id</th>"));
        assert!(html.contains("<td>&lt;script&gt;x&lt;/script&gt;</td>"));
        assert!(!html.contains("<script>"));
        assert_eq!(html.matches("<td>&mdash;</td>").count(), 3);
    }

    #[test]
    fn empty_table_message() {
        assert_eq!(table(&[]), EMPTY_TABLE);
    }

    #[test]
    fn select_marks_current_table() {
        let tables = ["humor_flavors", "captions"].map(String::from);
        let html = table_select("/assignment-2", &tables, "captions");
        assert!(html.contains("<option value=\"captions\" selected>captions</option>"));
        assert!(html.contains("<option value=\"humor_flavors\">humor_flavors</option>"));
    }

    #[test]
    fn nav_marks_active_page() {
        let html = page("Assignment 2", "/assignment-2", "");
        assert!(html.contains("sidebar-link sidebar-link-active\" href=\"/assignment-2\""));
        assert!(html.contains("<a class=\"sidebar-link\" href=\"/\">"));
    }
}
