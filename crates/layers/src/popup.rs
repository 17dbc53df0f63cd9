//! Popup HTML for report markers.
//!
//! Each source renders differently: tweets embed as blockquotes the host
//! page upgrades with the Twitter widget script, Detik reports render as a
//! media card, and everything else is linkified plain text.

use model::{Report, ReportSource};

pub fn popup_html(report: &Report) -> String {
    match report.source {
        ReportSource::Twitter => tweet_popup(report),
        ReportSource::Detik => detik_popup(report),
        ReportSource::Web => format!(
            "<div class=\"popup-text\">{}</div>",
            linkify(&escape_html(&report.text))
        ),
    }
}

fn tweet_popup(report: &Report) -> String {
    let url = report.url.as_deref().unwrap_or("");
    format!(
        "<div class=\"popup-tweet\"><blockquote class=\"twitter-tweet\">\
         <a target=\"_blank\" href=\"{}\">{}</a></blockquote></div>",
        escape_html(url),
        escape_html(&report.text)
    )
}

fn detik_popup(report: &Report) -> String {
    let mut html = String::from("<div class=\"popup-detik\">");
    if let Some(title) = &report.title {
        html.push_str(&format!("<p class=\"lead\">{}</p>", escape_html(title)));
    }
    if let Some(image_url) = &report.image_url {
        html.push_str(&format!(
            "<img class=\"img-responsive\" src=\"{}\" width=\"230\"/>",
            escape_html(image_url)
        ));
    }
    html.push_str(&format!("<h5>{}</h5>", escape_html(&report.text)));
    if let Some(created_at) = &report.created_at {
        html.push_str(&format!("<h5>{}</h5>", escape_html(created_at)));
    }
    if let Some(url) = &report.url {
        let url = escape_html(url);
        html.push_str(&format!(
            "<a href=\"{url}\" target=\"_blank\">{url}</a>"
        ));
    }
    html.push_str("</div>");
    html
}

pub fn escape_html(text: &str) -> String {
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

/// Wraps bare http(s) URLs in anchor tags. Input must already be escaped.
pub fn linkify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let start = match (rest.find("http://"), rest.find("https://")) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => break,
        };
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let end = tail
            .find(|c: char| c.is_whitespace())
            .unwrap_or(tail.len());
        let url = &tail[..end];
        out.push_str(&format!("<a target=\"_blank\" href=\"{url}\">{url}</a>"));
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}
