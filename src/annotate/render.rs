//! Markup emitted for enriched units
//!
//! The inner markup is the original source slice, copied verbatim. Only
//! attribute values are produced here, and they are always escaped.

use super::entity::TextEntity;
use super::markup::{escape_attr, escape_text};
use super::matcher::ResolvedPart;

pub fn entity_span(inner_markup: &str, entity: &TextEntity) -> String {
    format!(
        r#"<span class="{}" data-tooltip="{}">{}</span>"#,
        entity.kind.css_class(),
        escape_attr(entity.tooltip_text()),
        inner_markup
    )
}

/// One clickable span per comma-separated citation part, not one per
/// number: `[3-5]` becomes a single span whose `data-references` lists
/// `3,4,5` and whose tooltip comes from the part's first number.
pub fn citation_span(inner_markup: &str, part: &ResolvedPart) -> String {
    let tooltip = escape_attr(&part.tooltip);
    let numbers = part
        .units
        .iter()
        .map(|u| u.number.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#"<span class="reference-marker reference-clickable" data-tooltip="{tooltip}" data-full-reference-text="{tooltip}" data-references="{numbers}">{inner_markup}</span>"#
    )
}

/// Tooltip body for display: escaped, newlines as `<br>`
pub fn tooltip_html(text: &str) -> String {
    escape_text(text).replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::entity::EntityKind;
    use crate::annotate::matcher::CitationUnit;

    #[test]
    fn test_entity_span() {
        let entity = TextEntity::new("CNN", EntityKind::Keyword, Some(r#"A "conv" net"#)).unwrap();
        assert_eq!(
            entity_span("CNN", &entity),
            r#"<span class="highlight" data-tooltip="A &quot;conv&quot; net">CNN</span>"#
        );
    }

    #[test]
    fn test_email_span_has_empty_tooltip() {
        let entity = TextEntity::new("a@b.c", EntityKind::Email, None).unwrap();
        assert_eq!(
            entity_span("a@b.c", &entity),
            r#"<span class="email-marker" data-tooltip="">a@b.c</span>"#
        );
    }

    #[test]
    fn test_citation_span() {
        let part = ResolvedPart {
            start: 1,
            end: 4,
            label: "3-4".into(),
            tooltip: "Reference 3 not found".into(),
            units: vec![
                CitationUnit { number: 3, tooltip: "Reference 3 not found".into() },
                CitationUnit { number: 4, tooltip: "Reference 3 not found".into() },
            ],
        };
        let html = citation_span("3-4", &part);
        assert!(html.starts_with(r#"<span class="reference-marker reference-clickable""#));
        assert!(html.contains(r#"data-references="3,4""#));
        assert!(html.ends_with(">3-4</span>"));
    }

    #[test]
    fn test_tooltip_html() {
        assert_eq!(tooltip_html("line one\nline <two>"), "line one<br>line &lt;two&gt;");
    }
}
