use std::fmt::Write;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped in listing links; `/` stays literal so directory
/// entries keep their trailing slash.
const LINK: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'/')
  .remove(b'-')
  .remove(b'_')
  .remove(b'.')
  .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
  pub name: String,
  pub is_dir: bool,
  pub is_symlink: bool,
}

/// Renders an HTML index of `entries` for the directory at `display_path`.
pub fn render(display_path: &str, mut entries: Vec<ListingEntry>) -> String {
  entries.sort_by_key(|entry| entry.name.to_lowercase());

  let title = format!("Directory listing for {}", escape_html(display_path));
  let mut page = String::new();
  page.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
  let _ = writeln!(page, "<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>");

  for entry in &entries {
    let (display_name, link_name) = match (entry.is_dir, entry.is_symlink) {
      (true, false) => (format!("{}/", entry.name), format!("{}/", entry.name)),
      (true, true) => (format!("{}@", entry.name), format!("{}/", entry.name)),
      (false, true) => (format!("{}@", entry.name), entry.name.clone()),
      (false, false) => (entry.name.clone(), entry.name.clone()),
    };
    let _ = writeln!(
      page,
      "<li><a href=\"{}\">{}</a></li>",
      utf8_percent_encode(&link_name, LINK),
      escape_html(&display_name)
    );
  }

  page.push_str("</ul>\n<hr>\n</body>\n</html>\n");
  page
}

fn escape_html(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#x27;"),
      _ => escaped.push(c),
    }
  }
  escaped
}
