//! XML sink — renders a tree of named nodes with attributes and text.
//!
//! Output shape matches the consumers of the xreflect schema: a single
//! declaration line followed by the unindented document and a trailing
//! newline. Childless, textless elements collapse to `<name/>`.

/// One element in the output tree.
#[derive(Debug, Default)]
pub struct XmlNode {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: &str) -> XmlNode {
        XmlNode {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_text(name: &str, text: &str) -> XmlNode {
        XmlNode {
            name: name.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attrs.push((name.to_string(), value.to_string()));
    }

    /// Append a child and return a handle to it for further assembly.
    pub fn push(&mut self, child: XmlNode) -> &mut XmlNode {
        self.children.push(child);
        self.children.last_mut().unwrap()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// First child with the given element name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Render a complete document from its root node.
pub fn render_document(root: &XmlNode) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    write_node(&mut out, root);
    out.push('\n');
    out
}

fn write_node(out: &mut String, node: &XmlNode) {
    out.push('<');
    out.push_str(&node.name);
    for (name, value) in &node.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&attr_escape(value));
        out.push('"');
    }

    if node.text.is_empty() && node.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    out.push_str(&text_escape(&node.text));
    for child in &node.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&node.name);
    out.push('>');
}

fn text_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn attr_escape(text: &str) -> String {
    text_escape(text).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_declaration_and_root() {
        let root = XmlNode::new("xreflect");
        assert_eq!(
            render_document(&root),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<xreflect/>\n"
        );
    }

    #[test]
    fn renders_attributes_and_nested_children() {
        let mut root = XmlNode::new("class");
        root.set_attr("id", "class.Foo");
        root.push(XmlNode::with_text("name", "Foo"));
        root.push(XmlNode::new("constants"));
        let out = render_document(&root);
        assert!(out.contains("<class id=\"class.Foo\"><name>Foo</name><constants/></class>"));
    }

    #[test]
    fn escapes_text_and_attributes() {
        let mut root = XmlNode::new("r");
        root.set_attr("a", "x \"y\" & <z>");
        root.push(XmlNode::with_text("t", "a < b && c > d"));
        let out = render_document(&root);
        assert!(out.contains("a=\"x &quot;y&quot; &amp; &lt;z&gt;\""));
        assert!(out.contains("<t>a &lt; b &amp;&amp; c &gt; d</t>"));
    }

    #[test]
    fn element_with_text_and_children_renders_both() {
        let mut root = XmlNode::with_text("link", "Project Page");
        root.set_attr("uri", "http://example.org");
        let out = render_document(&root);
        assert!(out.contains("<link uri=\"http://example.org\">Project Page</link>"));
    }
}
