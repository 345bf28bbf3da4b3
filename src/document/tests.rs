use super::{Document, DocumentError};

const PAGE: &str = "<html><head><title>t</title></head><body><p id=\"a\">one</p><div><p id=\"b\">two</p></div><p id=\"c\">three</p></body></html>";

fn ids(document: &mut Document, selector: &str) -> Vec<String> {
    let matches = document.query(selector).expect("query");
    matches
        .into_iter()
        .map(|id| document.attribute(id, "id").unwrap_or_default().to_string())
        .collect()
}

#[test]
fn minimal_document_gains_head_and_body() {
    let document = Document::parse("<html></html>");
    assert_eq!(
        document.serialize(),
        "<!DOCTYPE html>\n<html><head></head><body></body></html>"
    );
}

#[test]
fn query_returns_matches_in_document_order() {
    let mut document = Document::parse(PAGE);
    assert_eq!(ids(&mut document, "p"), vec!["a", "b", "c"]);
    assert_eq!(ids(&mut document, "div > p"), vec!["b"]);
    assert!(document.query("section").expect("query").is_empty());
}

#[test]
fn html_element_is_queryable() {
    let mut document = Document::parse(PAGE);
    let html = document.query_one("html").expect("query").expect("html");
    assert_eq!(document.tag_name(html), Some("html"));
    assert_eq!(document.document_element(), Some(html));
}

#[test]
fn attribute_edits_are_visible_to_later_queries() {
    let mut document = Document::parse(PAGE);
    let first = document.query_one("p").expect("query").expect("match");
    document.set_attribute(first, "data-x", "1");
    assert_eq!(ids(&mut document, "p[data-x]"), vec!["a"]);
}

#[test]
fn set_then_remove_attribute_round_trips() {
    let mut document = Document::parse(PAGE);
    let before = document.serialize();
    for id in document.query("p").expect("query") {
        document.set_attribute(id, "hidden", "");
    }
    let marked = document.normalize();
    assert_ne!(marked, before);
    assert_eq!(document.query("p[hidden]").expect("query").len(), 3);
    for id in document.query("p").expect("query") {
        document.remove_attribute(id, "hidden");
    }
    assert_eq!(document.normalize(), before);
}

#[test]
fn style_text_is_not_escaped() {
    let mut document =
        Document::parse("<html><head><style>a > b { content: \"&\" }</style></head></html>");
    let style = document.query_one("style").expect("query").expect("style");
    assert_eq!(document.inner_html(style), "a > b { content: \"&\" }");
}

#[test]
fn body_text_and_attributes_are_escaped() {
    let mut document =
        Document::parse("<html><body><p title=\"a &quot;b&quot;\">1 &lt; 2 &amp; 3</p></body></html>");
    let p = document.query_one("p").expect("query").expect("p");
    assert_eq!(
        document.outer_html(p),
        "<p title=\"a &quot;b&quot;\">1 &lt; 2 &amp; 3</p>"
    );
}

#[test]
fn raw_markup_is_parsed_on_normalize() {
    let mut document = Document::parse(PAGE);
    let div = document.query_one("div").expect("query").expect("div");
    document.append_html(div, "<span class=\"new\">x</span>");
    document.insert_html_after(div, "<hr>");
    document.normalize();
    assert_eq!(document.query("div > span.new").expect("query").len(), 1);
    assert_eq!(document.query("div + hr").expect("query").len(), 1);
}

#[test]
fn set_inner_html_replaces_children() {
    let mut document = Document::parse(PAGE);
    let div = document.query_one("div").expect("query").expect("div");
    document.set_inner_html(div, "<em>new</em>");
    assert_eq!(document.inner_html(div), "<em>new</em>");
    assert_eq!(ids(&mut document, "p"), vec!["a", "c"]);
}

#[test]
fn detach_removes_subtree() {
    let mut document = Document::parse(PAGE);
    let div = document.query_one("div").expect("query").expect("div");
    document.detach(div);
    assert_eq!(ids(&mut document, "p"), vec!["a", "c"]);
    assert!(!document.serialize().contains("two"));
}

#[test]
fn append_element_adds_style_block() {
    let mut document = Document::parse(PAGE);
    let head = document.query_one("head").expect("query").expect("head");
    document.append_element(head, "style", "p>a{color:red}");
    let markup = document.normalize();
    assert!(markup.contains("<style>p>a{color:red}</style></head>"));
}

#[test]
fn invalid_selector_is_reported() {
    let mut document = Document::parse(PAGE);
    let err = document.query("p[").expect_err("invalid selector");
    assert!(matches!(err, DocumentError::InvalidSelector { .. }));
}

#[test]
fn prefixed_attributes_survive_normalization() {
    let page = "<html><head></head><body><svg xmlns:xlink=\"http://www.w3.org/1999/xlink\"><use xlink:href=\"#icon\"></use></svg><p xml:lang=\"en\">x</p></body></html>";
    let mut document = Document::parse(page);
    let before = document.serialize();
    assert!(before.contains("<use xlink:href=\"#icon\"></use>"), "{before}");
    assert!(before.contains("xmlns:xlink=\"http://www.w3.org/1999/xlink\""), "{before}");

    let icon = document.query_one("use").expect("query").expect("match");
    assert_eq!(document.attribute(icon, "xlink:href"), Some("#icon"));
    document.set_attribute(icon, "class", "i");
    document.normalize();
    let icon = document.query_one("use").expect("query").expect("match");
    document.remove_attribute(icon, "class");
    assert_eq!(document.normalize(), before);
}

#[test]
fn attribute_order_follows_the_source() {
    let page = "<html><head></head><body><a id=\"x\" href=\"/\" class=\"c\" data-z=\"1\">x</a></body></html>";
    let mut document = Document::parse(page);
    let link = document.query_one("a").expect("query").expect("match");
    assert_eq!(
        document.outer_html(link),
        "<a id=\"x\" href=\"/\" class=\"c\" data-z=\"1\">x</a>"
    );
    assert_eq!(document.normalize(), Document::parse(page).serialize());
}
