//! HTML for the web part: the page shell and the intro source table.

use std::fmt::Write;

use models::IntroSourceRecord;

const COLUMNS: [&str; 7] = ["Id", "Title", "Intro Source JV", "Dealer", "Intro Source", "Review Date", "Sub Area"];

/// (route, label) of the six action buttons, in display order.
pub const ACTIONS: [(&str, &str); 6] = [
    ("/actions/list-all", "Get Claas Intro Sources"),
    ("/actions/get-one", "Get Claas Intro Source"),
    ("/actions/get-last", "Get Last Claas Intro Source"),
    ("/actions/create", "Create Claas Intro Source"),
    ("/actions/update-last", "Update Claas Intro Source"),
    ("/actions/delete-last", "Delete Claas Intro Source"),
];

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

/// Render records as a table with the fixed 7-column header.
/// Absent or empty input renders the header only.
pub fn render_table(records: Option<&[IntroSourceRecord]>) -> String {
    let mut html = String::from("<table border=\"1\"><thead><tr>");
    for column in COLUMNS {
        let _ = write!(html, "<th>{column}</th>");
    }
    html.push_str("</tr></thead><tbody>");
    for record in records.unwrap_or_default() {
        let f = &record.fields;
        let cells = [
            record.id.to_string(),
            escape_html(&f.title),
            escape_html(&f.intro_source_jv),
            escape_html(f.dealer.as_deref().unwrap_or_default()),
            escape_html(&f.intro_source),
            escape_html(f.review_date.as_deref().unwrap_or_default()),
            escape_html(f.sub_area.as_deref().unwrap_or_default()),
        ];
        html.push_str("<tr>");
        for cell in cells {
            let _ = write!(html, "<td>{cell}</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

/// Full page: buttons, optional error notice, and the output container holding `table`.
pub fn render_page(table: &str, notice: Option<&str>) -> String {
    let mut buttons = String::new();
    for (route, label) in ACTIONS {
        let _ = write!(buttons, "<form method=\"post\" action=\"{route}\"><button type=\"submit\">{label}</button></form>");
    }
    let notice = notice
        .map(|msg| format!("<p class=\"error\" role=\"alert\">{}</p>", escape_html(msg)))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Claas Intro Source List</title></head><body>\
         <div class=\"container\"><span class=\"title\">Claas Intro Source List</span>\
         <p class=\"subTitle\">Demonstrating the SharePoint REST list client.</p>\
         <div class=\"actions\">{buttons}</div>{notice}\
         <div id=\"claasIntroSources\">{table}</div></div></body></html>"
    )
}
