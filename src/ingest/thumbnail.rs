// src/ingest/thumbnail.rs
//! Inline SVG placeholders used when a source has no image of its own.

const WIDTH: u32 = 400;
const HEIGHT: u32 = 200;

/// `data:` URL of a solid card with a centered label.
pub fn placeholder(fill: &str, label: &str, font_size: u32, font_family: Option<&str>) -> String {
    let family = font_family
        .map(|f| format!(r#" font-family="{f}""#))
        .unwrap_or_default();
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}"><rect width="{WIDTH}" height="{HEIGHT}" fill="{fill}"/><text x="50%" y="50%" dominant-baseline="middle" text-anchor="middle" fill="white" font-size="{font_size}"{family}>{}</text></svg>"#,
        html_escape::encode_text(label)
    );
    format!("data:image/svg+xml,{}", urlencoding::encode(&svg))
}
