// src/core/html.rs
//
// Small helpers over `scraper` shared by the page parsers in `specs`.

use scraper::{ElementRef, Selector};

use super::sanitize::normalize_ws;

/// Compile a selector written into the source. A bad literal is a bug, not input.
pub fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

/// Text nodes, each whitespace-normalized, empties dropped, joined by a space.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .map(normalize_ws)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text nodes trimmed and concatenated with no separator.
pub fn text_tight(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect::<String>()
}

/// Visible text of a link: skips `.accesshide` screen-reader spans.
pub fn visible_text(el: ElementRef<'_>) -> String {
    let root = (*el).id();
    let mut parts = Vec::new();
    for node in el.descendants() {
        let Some(t) = node.value().as_text() else { continue };
        let hidden = node
            .ancestors()
            .take_while(|a| a.id() != root)
            .filter_map(ElementRef::wrap)
            .any(|a| has_class(a, "accesshide"));
        if !hidden {
            let t = normalize_ws(t);
            if !t.is_empty() { parts.push(t); }
        }
    }
    parts.join(" ")
}

/// Direct `<th>`/`<td>` children of a row, in document order.
pub fn cells(tr: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| matches!(c.value().name(), "td" | "th"))
        .collect()
}

/// Direct children with the given tag name.
pub fn children_named<'a>(el: ElementRef<'a>, name: &str) -> Vec<ElementRef<'a>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| c.value().name() == name)
        .collect()
}

pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

pub fn attr<'a>(el: ElementRef<'a>, name: &str) -> &'a str {
    el.value().attr(name).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first<'a>(doc: &'a Html, css: &'static str) -> ElementRef<'a> {
        doc.select(&selector(css)).next().unwrap()
    }

    #[test]
    fn text_of_joins_nodes_with_single_space() {
        let doc = Html::parse_fragment("<div>  Due <b>date</b>\n\n soon </div>");
        assert_eq!(text_of(first(&doc, "div")), "Due date soon");
    }

    #[test]
    fn visible_text_skips_accesshide() {
        let doc = Html::parse_fragment(
            r#"<a href="x"><span class="instancename">Practice Quiz 2<span class="accesshide "> Quiz</span></span></a>"#,
        );
        assert_eq!(visible_text(first(&doc, "a")), "Practice Quiz 2");
    }

    #[test]
    fn cells_are_direct_children_only() {
        let doc = Html::parse_document(
            "<table><tr><td>a</td><td><table><tr><td>inner</td></tr></table></td><th>c</th></tr></table>",
        );
        let tr = first(&doc, "tr");
        let cs = cells(tr);
        assert_eq!(cs.len(), 3);
        assert_eq!(text_of(cs[2]), "c");
    }
}
