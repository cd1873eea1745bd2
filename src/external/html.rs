//! Small extraction helpers for server-rendered HTML and XML pages.
//!
//! These are deliberately forgiving: they work on fragments, ignore
//! attribute order and return `None` instead of failing on odd markup.

use regex::Regex;

use crate::external::scraper::ScraperError;

pub fn pattern(source: &str) -> Result<Regex, ScraperError> {
    Regex::new(source).map_err(ScraperError::from)
}

/// Parses prices written either as `1.234,56` or `1,234.56`.
///
/// When both separators appear the last one is the decimal point. A single
/// separator of one kind is treated as decimal, repeated ones as grouping.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .replace('\u{2212}', "-")
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');
    let normalized = match (last_dot, last_comma) {
        (Some(d), Some(c)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) if cleaned.matches(',').count() > 1 => cleaned.replace(',', ""),
        (None, Some(_)) => cleaned.replace(',', "."),
        (Some(_), None) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Removes tags, decodes the handful of entities these pages use and
/// collapses whitespace.
pub fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    decoded
        .split(|c: char| c.is_whitespace() || c == '\u{202f}')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn slugify(name: &str) -> String {
    let transliterated: String = name
        .chars()
        .map(|c| match c {
            'ı' | 'İ' => 'i',
            'ş' | 'Ş' => 's',
            'ğ' | 'Ğ' => 'g',
            'ü' | 'Ü' => 'u',
            'ö' | 'Ö' => 'o',
            'ç' | 'Ç' => 'c',
            other => other,
        })
        .collect::<String>()
        .to_lowercase();

    transliterated
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect::<String>()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Inner HTML of every `<tag>` block, in document order.
pub fn blocks<'a>(html: &'a str, tag: &str) -> Result<Vec<&'a str>, ScraperError> {
    let re = pattern(&format!(r"(?is)<{tag}\b[^>]*>(.*?)</{tag}>"))?;
    Ok(re
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect())
}

/// Text of table cells in a row.
pub fn cells(row: &str) -> Result<Vec<String>, ScraperError> {
    Ok(blocks(row, "td")?.into_iter().map(strip_tags).collect())
}

/// Text of the first element whose `class` attribute contains `class`.
pub fn class_text(fragment: &str, class: &str) -> Result<Option<String>, ScraperError> {
    Ok(class_texts(fragment, class)?.into_iter().next())
}

/// Text of every element whose `class` attribute contains `class`.
pub fn class_texts(fragment: &str, class: &str) -> Result<Vec<String>, ScraperError> {
    let re = pattern(&format!(
        r#"(?is)<(\w+)[^>]*\bclass="[^"]*{}[^"]*"[^>]*>(.*?)</(?:a|b|span|div|li|td|sup|strong)>"#,
        regex::escape(class)
    ))?;
    Ok(re
        .captures_iter(fragment)
        .filter_map(|c| c.get(2))
        .map(|m| strip_tags(m.as_str()))
        .filter(|s| !s.is_empty())
        .collect())
}

/// `src` of the first `<img>` whose class contains `class`.
pub fn image_src(fragment: &str, class: &str) -> Result<Option<String>, ScraperError> {
    let img = pattern(r#"(?is)<img\b[^>]*>"#)?;
    let src = pattern(r#"(?i)\bsrc="([^"]+)""#)?;
    let class_attr = pattern(r#"(?i)\bclass="([^"]*)""#)?;

    for tag in img.find_iter(fragment) {
        let tag = tag.as_str();
        let matches_class = class_attr
            .captures(tag)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().contains(class))
            .unwrap_or(false);
        if matches_class {
            return Ok(src.captures(tag).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_turkish_and_english_number_formats() {
        assert_eq!(parse_number("1.234,56"), Some(1234.56));
        assert_eq!(parse_number("1,234.56"), Some(1234.56));
        assert_eq!(parse_number("34,5012"), Some(34.5012));
        assert_eq!(parse_number("34.5012"), Some(34.5012));
        assert_eq!(parse_number("1.234.567"), Some(1234567.0));
        assert_eq!(parse_number("67,012.40 USD"), Some(67012.4));
        assert_eq!(parse_number("\u{2212}3.25%"), Some(-3.25));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("—"), None);
    }

    #[test]
    fn strips_tags_and_entities() {
        assert_eq!(
            strip_tags("<a href=\"#\"><b>Gram</b>&nbsp;Altın</a>\n  "),
            "Gram Altın"
        );
    }

    #[test]
    fn slugifies_turkish_names() {
        assert_eq!(slugify("Gram Altın"), "gram-altin");
        assert_eq!(slugify("  Çeyrek  Altın (Eski) "), "ceyrek-altin-eski");
    }

    #[test]
    fn extracts_cells_classes_and_images() {
        let row = r#"<tr><td><img class="logo tickerLogo-x" src="https://img/aapl.svg"><a class="tickerNameBox-x">AAPL</a><sup class="tickerDescription-x">Apple Inc.</sup></td><td>1.2%</td><td>190.50 USD</td></tr>"#;
        let cells = cells(row).unwrap();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[2], "190.50 USD");
        assert_eq!(class_text(row, "tickerNameBox").unwrap().as_deref(), Some("AAPL"));
        assert_eq!(
            class_text(row, "tickerDescription").unwrap().as_deref(),
            Some("Apple Inc.")
        );
        assert_eq!(
            image_src(row, "tickerLogo").unwrap().as_deref(),
            Some("https://img/aapl.svg")
        );
        assert_eq!(image_src(row, "missing").unwrap(), None);
    }
}
