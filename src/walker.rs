//! Structural walker — assembles the output tree from structural facts
//! and parsed doc comments.
//!
//! For every fact kind the child order and the known-tag list are fixed;
//! any tag outside the known list surfaces as a generic `unknownTag`
//! element. Boolean attributes are written as `1` when set and omitted
//! otherwise.

use crate::model::*;
use crate::parser::phpdoc::DocComment;
use crate::scanner::Registry;
use crate::xml::XmlNode;

const XMLNS: &str = "http://segfaultlabs.com/xphpdoc/";

const CLASS_KNOWN_TAGS: &[&str] = &[
    "category",
    "package",
    "subpackage",
    "version",
    "deprecated",
    "since",
    "author",
    "copyright",
    "license",
    "internal",
    "link",
];

// `link` is known for properties but has no rendering there; it is
// swallowed rather than surfaced as an unknown tag.
const PROPERTY_KNOWN_TAGS: &[&str] = &["deprecated", "internal", "link", "since", "var"];

const METHOD_KNOWN_TAGS: &[&str] =
    &["author", "deprecated", "internal", "link", "param", "since"];

/// Build the complete document tree for a scanned registry.
pub fn build_document(registry: &Registry, doc_root: &str) -> XmlNode {
    let mut root = XmlNode::new("xreflect");
    root.set_attr("xmlns", XMLNS);

    for class in registry.classes.values() {
        root.push(build_class(class, registry, doc_root));
    }

    root
}

fn build_class(facts: &ClassFacts, registry: &Registry, doc_root: &str) -> XmlNode {
    let doc = DocComment::parse(&facts.doc);

    let kind = if facts.is_interface { "interface" } else { "class" };
    let id = format!("{}.{}", kind, facts.name);

    let mut node = XmlNode::new(kind);
    node.set_attr("id", &id);
    node.push(XmlNode::with_text("name", &facts.name));

    if !facts.is_interface {
        if facts.is_abstract {
            node.set_attr("abstract", "1");
        }
        if facts.is_final {
            node.set_attr("final", "1");
        }

        let mut user_defined = false;
        if let Some(parent) = &facts.parent {
            node.push(XmlNode::with_text("extends", &parent.name));
            user_defined |= parent.user_defined;
        }
        for interface in &facts.interfaces {
            node.push(XmlNode::with_text("implements", &interface.name));
            user_defined |= interface.user_defined;
        }
        if user_defined {
            node.set_attr("userDefined", "1");
        }
    }

    build_constants(facts, registry, &mut node);
    build_properties(facts, &id, &mut node);
    build_methods(facts, &id, &mut node);

    push_nonempty(&mut node, "summary", doc.summary());
    push_nonempty(&mut node, "desc", doc.desc());

    let file = node.push(XmlNode::new("file"));
    file.push(XmlNode::with_text(
        "fileName",
        strip_doc_root(&facts.file, doc_root),
    ));
    file.push(XmlNode::with_text("startLine", &facts.start_line.to_string()));
    file.push(XmlNode::with_text("endLine", &facts.end_line.to_string()));

    push_last_tag(&mut node, &doc, "category");
    push_last_tag(&mut node, &doc, "package");
    push_last_tag(&mut node, &doc, "subpackage");
    push_last_tag(&mut node, &doc, "version");
    push_last_tag(&mut node, &doc, "deprecated");
    push_last_tag(&mut node, &doc, "since");
    push_authors(&mut node, &doc);
    push_last_tag(&mut node, &doc, "copyright");
    // license has no rendering; the tag stays known so it never leaks
    // into unknownTag either.
    push_internal(&mut node, &doc);
    push_links(&mut node, &doc);
    push_unknown_tags(&mut node, &doc, CLASS_KNOWN_TAGS);

    node
}

fn build_constants(facts: &ClassFacts, registry: &Registry, parent: &mut XmlNode) {
    let constants = parent.push(XmlNode::new("constants"));

    for constant in &facts.constants {
        let node = constants.push(XmlNode::new("constant"));
        node.push(XmlNode::with_text("name", &constant.name));
        node.push(XmlNode::with_text("value", &constant.value));

        let raw = registry.constant_doc(&facts.name, &constant.name);
        if !raw.is_empty() {
            let doc = DocComment::parse(raw);
            push_nonempty(node, "summary", doc.summary());
            push_nonempty(node, "desc", doc.desc());
        }
    }
}

fn build_properties(facts: &ClassFacts, class_id: &str, parent: &mut XmlNode) {
    let properties = parent.push(XmlNode::new("properties"));

    for property in &facts.properties {
        let doc = DocComment::parse(&property.doc);

        let node = properties.push(XmlNode::new("property"));
        node.set_attr("id", &format!("{}.property.{}", class_id, property.name));
        if property.is_static {
            node.set_attr("static", "1");
        }
        node.set_attr("access", property.access.as_str());
        node.push(XmlNode::with_text("name", &property.name));

        if let Some(type_name) = doc.type_name().filter(|t| !t.is_empty()) {
            node.push(XmlNode::with_text("type", type_name));
        }
        if let Some(default) = property.default.as_deref().filter(|v| default_is_set(v)) {
            node.push(XmlNode::with_text("value", default));
        }

        push_nonempty(node, "summary", doc.summary());
        push_nonempty(node, "desc", doc.desc());
        push_last_tag(node, &doc, "deprecated");
        push_last_tag(node, &doc, "since");
        push_internal(node, &doc);
        push_unknown_tags(node, &doc, PROPERTY_KNOWN_TAGS);
    }
}

fn build_methods(facts: &ClassFacts, class_id: &str, parent: &mut XmlNode) {
    let methods = parent.push(XmlNode::new("methods"));

    for method in &facts.methods {
        let doc = DocComment::parse(&method.doc);

        let node = methods.push(XmlNode::new("method"));
        node.set_attr("id", &format!("{}.method.{}", class_id, method.name));
        if method.is_abstract {
            node.set_attr("abstract", "1");
        }
        if method.is_final {
            node.set_attr("final", "1");
        }
        if method.is_static {
            node.set_attr("static", "1");
        }
        node.set_attr("access", method.access.as_str());
        node.push(XmlNode::with_text("name", &method.name));

        build_params(&method.params, node);

        push_nonempty(node, "summary", doc.summary());
        push_nonempty(node, "desc", doc.desc());

        // Method locations carry lines only; the file name lives on the
        // enclosing class.
        let file = node.push(XmlNode::new("file"));
        file.push(XmlNode::with_text("startLine", &method.start_line.to_string()));
        file.push(XmlNode::with_text("endLine", &method.end_line.to_string()));

        push_last_tag(node, &doc, "deprecated");
        push_last_tag(node, &doc, "since");
        push_authors(node, &doc);
        push_internal(node, &doc);
        push_links(node, &doc);
        push_unknown_tags(node, &doc, METHOD_KNOWN_TAGS);
    }
}

fn build_params(params: &[ParamFacts], parent: &mut XmlNode) {
    let params_el = parent.push(XmlNode::new("params"));

    for param in params {
        let node = params_el.push(XmlNode::new("param"));
        if param.by_reference {
            node.set_attr("passedByReference", "1");
        }
        node.push(XmlNode::with_text("name", &param.name));
        if let Some(hint) = &param.type_hint {
            node.push(XmlNode::with_text("type", hint));
        }
        if let Some(default) = &param.default {
            node.push(XmlNode::with_text("value", default));
        }
    }
}

// -- Shared assembly steps ----------------------------------------------------

fn push_nonempty(parent: &mut XmlNode, name: &str, text: &str) {
    if !text.is_empty() {
        parent.push(XmlNode::with_text(name, text));
    }
}

fn push_last_tag(parent: &mut XmlNode, doc: &DocComment, name: &str) {
    if let Some(value) = doc.last_tag(name) {
        push_nonempty(parent, name, value);
    }
}

fn push_authors(parent: &mut XmlNode, doc: &DocComment) {
    let authors = doc.authors();
    if authors.is_empty() {
        return;
    }

    let authors_el = parent.push(XmlNode::new("authors"));
    for author in authors {
        let node = authors_el.push(XmlNode::new("author"));
        if let Some(name) = &author.name {
            node.push(XmlNode::with_text("name", name));
        }
        if let Some(email) = &author.email {
            node.push(XmlNode::with_text("email", email));
        }
        if let Some(homepage) = &author.homepage {
            node.push(XmlNode::with_text("www", homepage));
        }
    }
}

fn push_internal(parent: &mut XmlNode, doc: &DocComment) {
    push_nonempty(parent, "internal", &doc.internal());
}

fn push_links(parent: &mut XmlNode, doc: &DocComment) {
    for link in doc.links() {
        let node = parent.push(XmlNode::with_text("link", link.text.as_deref().unwrap_or("")));
        node.set_attr("uri", &link.uri);
    }
}

fn push_unknown_tags(parent: &mut XmlNode, doc: &DocComment, known: &[&str]) {
    for (name, values) in doc.unknown_tags(known) {
        for value in values {
            let node = parent.push(XmlNode::with_text("unknownTag", value));
            node.set_attr("tag", name);
        }
    }
}

/// Properties only render a default when it carries a value; unset-like
/// defaults (empty, zero, null) are treated as absent.
fn default_is_set(value: &str) -> bool {
    !matches!(value, "" | "0" | "null" | "array()")
}

/// Cut the configured prefix length off the front of a file path.
fn strip_doc_root<'a>(file: &'a str, doc_root: &str) -> &'a str {
    file.get(doc_root.len()..).unwrap_or("")
}
