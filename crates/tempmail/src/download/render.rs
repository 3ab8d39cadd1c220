//! Render a downloaded raw message as a standalone HTML document

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use mailparse::{MailHeaderMap, ParsedMail};

use crate::error::{MailboxError, Result};

/// Convert the raw RFC 822 file at `raw_path` into `<same name>.html` next to
/// it. An existing HTML file is returned without re-rendering.
pub fn render_html(raw_path: &Path) -> Result<PathBuf> {
    let html_path = raw_path.with_extension("html");
    if html_path.exists() {
        debug!("Rendered copy already present: {}", html_path.display());
        return Ok(html_path);
    }

    let raw = fs::read(raw_path).map_err(|e| MailboxError::file_system(raw_path, e))?;
    let parsed = mailparse::parse_mail(&raw).map_err(|source| MailboxError::Render {
        path: raw_path.to_path_buf(),
        source,
    })?;

    let body = render_body(&parsed).map_err(|source| MailboxError::Render {
        path: raw_path.to_path_buf(),
        source,
    })?;

    let document = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n<hr>\n{}\n</body>\n</html>\n",
        escape_html(&header(&parsed, "Subject")),
        render_headers(&parsed),
        body,
    );

    fs::write(&html_path, document).map_err(|e| MailboxError::file_system(&html_path, e))?;
    Ok(html_path)
}

fn header(mail: &ParsedMail<'_>, name: &str) -> String {
    mail.headers.get_first_value(name).unwrap_or_default()
}

fn render_headers(mail: &ParsedMail<'_>) -> String {
    let mut rows = String::from("<table class=\"headers\">\n");
    for name in ["From", "To", "Cc", "Subject", "Date"] {
        let value = header(mail, name);
        if value.is_empty() {
            continue;
        }
        rows.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>\n",
            name,
            escape_html(&value)
        ));
    }
    rows.push_str("</table>");
    rows
}

/// Prefer the first `text/html` part; fall back to escaped `text/plain`
fn render_body(mail: &ParsedMail<'_>) -> std::result::Result<String, mailparse::MailParseError> {
    if let Some(html) = find_part(mail, "text/html") {
        return html.get_body();
    }

    let text = match find_part(mail, "text/plain") {
        Some(part) => part.get_body()?,
        None => String::new(),
    };
    Ok(format!("<pre>{}</pre>", escape_html(&text)))
}

fn find_part<'a>(mail: &'a ParsedMail<'a>, mimetype: &str) -> Option<&'a ParsedMail<'a>> {
    if mail.subparts.is_empty() {
        return mail
            .ctype
            .mimetype
            .eq_ignore_ascii_case(mimetype)
            .then_some(mail);
    }

    mail.subparts.iter().find_map(|part| find_part(part, mimetype))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
