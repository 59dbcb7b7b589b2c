//! Static HTML rendering of menu trees.

use std::fmt::Write;

use crate::custom::MenuPosition;
use crate::menu::MenuNode;

/// Render a menu tree as a `<nav>` element.
///
/// Every level is fully expanded. Inactive nodes are rendered as
/// `<span class="inactive">` so they stay visible without being links.
#[must_use]
pub fn render_menu_html(nodes: &[MenuNode], position: MenuPosition) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<nav class=\"menu menu-{}\">", position.as_str());
    html.push_str("<ul>\n");
    render_items(&mut html, nodes);
    html.push_str("</ul>\n</nav>\n");
    html
}

fn render_items(html: &mut String, nodes: &[MenuNode]) {
    for node in nodes {
        if node.has_children {
            html.push_str("<li class=\"menu-folder\">\n");
        } else {
            html.push_str("<li>\n");
        }

        if let Some(icon) = &node.icon {
            let _ = writeln!(
                html,
                "<img class=\"menu-icon\" src=\"{}\" alt=\"\">",
                escape_html(icon)
            );
        }

        match (&node.href, node.inactive) {
            (Some(href), false) => {
                let _ = writeln!(
                    html,
                    "<a href=\"{}\">{}</a>",
                    escape_html(href),
                    escape_html(&node.label)
                );
            }
            _ => {
                let _ = writeln!(
                    html,
                    "<span class=\"inactive\">{}</span>",
                    escape_html(&node.label)
                );
            }
        }

        if node.has_children {
            html.push_str("<ul>\n");
            render_items(html, &node.children);
            html.push_str("</ul>\n");
        }

        html.push_str("</li>\n");
    }
}

/// Escape text for use in HTML content and attribute values.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escape_special_characters() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a&b"), "a&amp;b");
        assert_eq!(escape_html("\"hi\""), "&quot;hi&quot;");
    }

    #[test]
    fn renders_nested_links() {
        let nodes = vec![
            MenuNode::link("Guide", "/guide", "/guide/index.html")
                .with_children(vec![MenuNode::link("Start", "/guide/start", "/guide/start.html")]),
        ];

        let html = render_menu_html(&nodes, MenuPosition::Side);

        assert_eq!(
            html,
            "<nav class=\"menu menu-side\">\n<ul>\n<li class=\"menu-folder\">\n\
             <a href=\"/guide/index.html\">Guide</a>\n<ul>\n<li>\n\
             <a href=\"/guide/start.html\">Start</a>\n</li>\n</ul>\n</li>\n</ul>\n</nav>\n"
        );
    }

    #[test]
    fn inactive_nodes_are_spans() {
        let nodes = vec![MenuNode::inactive("Drafts & <notes>", "/drafts")];

        let html = render_menu_html(&nodes, MenuPosition::Top);

        assert!(html.starts_with("<nav class=\"menu menu-top\">"));
        assert!(html.contains("<span class=\"inactive\">Drafts &amp; &lt;notes&gt;</span>"));
        assert!(!html.contains("<a "));
    }

    #[test]
    fn icons_rendered_before_label() {
        let nodes = vec![MenuNode::link("Api", "/api", "/api.html").with_icon(Some("/api/icon.svg".to_owned()))];

        let html = render_menu_html(&nodes, MenuPosition::Side);

        assert!(html.contains("<img class=\"menu-icon\" src=\"/api/icon.svg\" alt=\"\">\n<a href=\"/api.html\">Api</a>"));
    }
}
