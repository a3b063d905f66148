//! PHP structural parser — line-by-line scan for class shape.
//!
//! Recovers declaration-level facts (classes, interfaces, constants,
//! properties, methods, parameters) plus the raw doc comment block
//! attached to each, without executing or fully parsing the code.
//! Brace depth distinguishes class bodies from method bodies; string
//! literals are skipped while counting so braces in defaults don't
//! derail the depth. Heredocs and braces in line comments are not
//! handled; declaration-level scanning doesn't need them.

use crate::model::*;
use crate::parser::FileFacts;
use regex::Regex;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_DOC_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*/\*\*").unwrap());

static RE_LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(//|#)").unwrap());

static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*((?:(?:abstract|final)\s+)*)(class|interface)\s+(\w+)",
        r"(?:\s+extends\s+([\w\\]+(?:\s*,\s*[\w\\]+)*))?",
        r"(?:\s+implements\s+([\w\\]+(?:\s*,\s*[\w\\]+)*))?",
    ))
    .unwrap()
});

static RE_CONST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*const\s+(\w+)\s*=\s*(.*?)\s*;").unwrap());

static RE_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*((?:(?:public|protected|private|static|var)\s+)+)\$(\w+)(?:\s*=\s*(.*?))?\s*;")
        .unwrap()
});

static RE_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*((?:(?:abstract|final|public|protected|private|static)\s+)*)function\s*(&)?\s*(\w+)\s*\(")
        .unwrap()
});

static RE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:([\w\\]+)\s+)?(&)?\s*\$(\w+)(?:\s*=\s*(.+))?\s*$").unwrap()
});

// -- Parser state -------------------------------------------------------------

/// A method whose extent is not yet known.
struct PendingMethod {
    facts: MethodFacts,
    stage: MethodStage,
}

enum MethodStage {
    /// Still inside the parameter list; holds the accumulated parameter
    /// text and the open-paren balance.
    Signature(String, usize),
    /// Signature complete, waiting for `{` (body) or `;` (no body).
    AwaitBody,
    /// Inside the body; holds the brace depth to return to.
    InBody(usize),
}

/// A class whose closing brace has not been seen yet.
struct PendingClass {
    facts: ClassFacts,
    entry_depth: usize,
    entered: bool,
}

#[derive(Default)]
struct Parser {
    facts: FileFacts,
    /// Doc block under accumulation (between `/**` and `*/`).
    doc_buf: Option<String>,
    /// Completed doc block waiting for the declaration it precedes.
    pending_doc: Option<String>,
    current: Option<PendingClass>,
    method: Option<PendingMethod>,
    depth: usize,
}

// -- Public API ---------------------------------------------------------------

/// Parse one PHP source file into structural facts plus the constant
/// doc side table.
pub fn parse(input: &str) -> FileFacts {
    let mut parser = Parser::default();
    let mut last_line = 0;

    for (idx, line) in input.split('\n').enumerate() {
        last_line = idx + 1;
        parser.process_line(last_line, line);
    }

    parser.finish(last_line)
}

// -- Line processing ----------------------------------------------------------

impl Parser {
    fn process_line(&mut self, lineno: usize, line: &str) {
        // Doc block accumulation; braces inside comments never count.
        if let Some(buf) = &mut self.doc_buf {
            buf.push('\n');
            buf.push_str(line);
            if line.contains("*/") {
                self.pending_doc = self.doc_buf.take();
            }
            return;
        }

        if RE_DOC_OPEN.is_match(line) {
            if line.contains("*/") {
                self.pending_doc = Some(line.to_string());
            } else {
                self.doc_buf = Some(line.to_string());
            }
            return;
        }

        // Blank lines keep a pending doc block alive; any other
        // intervening token drops it.
        if line.trim().is_empty() {
            return;
        }
        if RE_LINE_COMMENT.is_match(line) {
            self.pending_doc = None;
            return;
        }

        let depth_before = self.depth;

        if self.method.is_some() {
            // Signature and body lines are intervening code; a doc block
            // written there never documents a later member.
            self.pending_doc = None;
            self.continue_method(lineno, line);
        } else if self.current.is_none() {
            if let Some(caps) = RE_CLASS.captures(line) {
                self.start_class(lineno, &caps);
            } else {
                self.pending_doc = None;
            }
        } else if self.in_class_body(depth_before) {
            self.process_member(lineno, line);
        } else {
            self.pending_doc = None;
        }

        self.apply_braces(lineno, line);
    }

    fn in_class_body(&self, depth: usize) -> bool {
        match &self.current {
            Some(class) => class.entered && depth == class.entry_depth + 1,
            None => false,
        }
    }

    fn start_class(&mut self, lineno: usize, caps: &regex::Captures) {
        let modifiers = &caps[1];
        let is_interface = &caps[2] == "interface";
        let mut facts = ClassFacts {
            name: caps[3].to_string(),
            is_interface,
            is_abstract: modifiers.contains("abstract"),
            is_final: modifiers.contains("final"),
            start_line: lineno,
            doc: self.pending_doc.take().unwrap_or_default(),
            ..Default::default()
        };

        if let Some(extends) = caps.get(4) {
            let parents = split_name_list(extends.as_str());
            if is_interface {
                // Interface parents surface as implemented interfaces.
                facts.interfaces.extend(parents);
            } else {
                facts.parent = parents.into_iter().next();
            }
        }
        if let Some(implements) = caps.get(5) {
            facts.interfaces.extend(split_name_list(implements.as_str()));
        }

        self.current = Some(PendingClass {
            facts,
            entry_depth: self.depth,
            entered: false,
        });
    }

    fn process_member(&mut self, lineno: usize, line: &str) {
        if let Some(caps) = RE_CONST.captures(line) {
            let class = self.current.as_mut().unwrap();
            let name = caps[1].to_string();
            if let Some(doc) = self.pending_doc.take() {
                let key = format!("{}::{}", class.facts.name, name);
                self.facts.constant_docs.push((key, doc));
            }
            class.facts.constants.push(ConstantFacts {
                name,
                value: normalize_value(&caps[2]),
            });
            return;
        }

        if let Some(caps) = RE_PROPERTY.captures(line) {
            let modifiers = &caps[1];
            let class = self.current.as_mut().unwrap();
            class.facts.properties.push(PropertyFacts {
                name: caps[2].to_string(),
                is_static: modifiers.contains("static"),
                access: parse_access(modifiers),
                default: caps.get(3).map(|m| normalize_value(m.as_str())),
                doc: self.pending_doc.take().unwrap_or_default(),
            });
            return;
        }

        if let Some(caps) = RE_METHOD.captures(line) {
            let modifiers = caps[1].to_string();
            let facts = MethodFacts {
                name: caps[3].to_string(),
                is_abstract: modifiers.contains("abstract"),
                is_final: modifiers.contains("final"),
                is_static: modifiers.contains("static"),
                access: parse_access(&modifiers),
                returns_reference: caps.get(2).is_some(),
                start_line: lineno,
                doc: self.pending_doc.take().unwrap_or_default(),
                ..Default::default()
            };
            self.method = Some(PendingMethod {
                facts,
                stage: MethodStage::Signature(String::new(), 1),
            });
            let after_paren = &line[caps.get(0).unwrap().end()..];
            self.continue_signature(lineno, after_paren);
            return;
        }

        self.pending_doc = None;
    }

    /// Feed a line to the in-progress method, whatever its stage.
    fn continue_method(&mut self, lineno: usize, line: &str) {
        let in_signature = matches!(
            self.method.as_ref().map(|m| &m.stage),
            Some(MethodStage::Signature(..))
        );
        let awaiting = matches!(
            self.method.as_ref().map(|m| &m.stage),
            Some(MethodStage::AwaitBody)
        );
        if in_signature {
            self.continue_signature(lineno, line);
        } else if awaiting {
            self.await_body(lineno, line);
        }
        // InBody: apply_braces closes it.
    }

    /// Accumulate parameter-list text until the open paren balances,
    /// then decide between body and bodyless from the remainder.
    fn continue_signature(&mut self, lineno: usize, text: &str) {
        let method = match &mut self.method {
            Some(method) => method,
            None => return,
        };
        let stage = std::mem::replace(&mut method.stage, MethodStage::AwaitBody);
        let (mut params_buf, mut balance) = match stage {
            MethodStage::Signature(buf, balance) => (buf, balance),
            other => {
                method.stage = other;
                return;
            }
        };

        let mut rest = None;
        for (pos, ch) in text.char_indices() {
            match ch {
                '(' => balance += 1,
                ')' => {
                    balance -= 1;
                    if balance == 0 {
                        rest = Some(&text[pos + 1..]);
                        break;
                    }
                }
                _ => {}
            }
            params_buf.push(ch);
        }

        match rest {
            Some(rest) => {
                method.facts.params = parse_params(&params_buf);
                self.await_body(lineno, rest);
            }
            None => {
                params_buf.push('\n');
                method.stage = MethodStage::Signature(params_buf, balance);
            }
        }
    }

    fn await_body(&mut self, lineno: usize, text: &str) {
        let brace = text.find('{');
        let semi = text.find(';');
        let bodyless = match (brace, semi) {
            // Interface or abstract method: `;` before any `{`.
            (None, Some(_)) => true,
            (Some(b), Some(s)) => s < b,
            _ => false,
        };

        if bodyless {
            if let Some(mut method) = self.method.take() {
                method.facts.end_line = lineno;
                if let Some(class) = &mut self.current {
                    class.facts.methods.push(method.facts);
                }
            }
        } else if brace.is_some() {
            // Body opens here; apply_braces counts the brace itself.
            if let Some(method) = &mut self.method {
                method.stage = MethodStage::InBody(self.depth);
            }
        }
    }

    /// Update brace depth from this line and close any method or class
    /// whose body just ended.
    fn apply_braces(&mut self, lineno: usize, line: &str) {
        let (opens, closes) = count_braces(line);
        let reached = self.depth + opens;
        self.depth = reached.saturating_sub(closes);

        let method_done = matches!(
            self.method.as_ref().map(|m| &m.stage),
            Some(MethodStage::InBody(entry)) if reached > *entry && self.depth <= *entry
        );
        if method_done {
            let mut method = self.method.take().unwrap();
            method.facts.end_line = lineno;
            if let Some(class) = &mut self.current {
                class.facts.methods.push(method.facts);
            }
        }

        let class_done = match &mut self.current {
            Some(class) => {
                if reached > class.entry_depth {
                    class.entered = true;
                }
                class.entered && self.depth <= class.entry_depth
            }
            None => false,
        };
        if class_done {
            let mut class = self.current.take().unwrap();
            class.facts.end_line = lineno;
            self.facts.classes.push(class.facts);
        }
    }

    /// Close out anything still open at end of input.
    fn finish(mut self, last_line: usize) -> FileFacts {
        if let Some(mut method) = self.method.take() {
            method.facts.end_line = last_line;
            if let Some(class) = &mut self.current {
                class.facts.methods.push(method.facts);
            }
        }
        if let Some(mut class) = self.current.take() {
            class.facts.end_line = last_line;
            self.facts.classes.push(class.facts);
        }
        self.facts
    }
}

// -- Helper functions ---------------------------------------------------------

fn parse_access(modifiers: &str) -> Access {
    if modifiers.contains("private") {
        Access::Private
    } else if modifiers.contains("protected") {
        Access::Protected
    } else {
        Access::Public
    }
}

fn split_name_list(list: &str) -> Vec<TypeRef> {
    list.split(',')
        .map(|name| TypeRef {
            name: name.trim().trim_start_matches('\\').to_string(),
            user_defined: false,
        })
        .filter(|t| !t.name.is_empty())
        .collect()
}

/// Split and parse a parameter list. Commas inside nested parens or
/// brackets (array defaults) don't split.
fn parse_params(text: &str) -> Vec<ParamFacts> {
    let mut params = Vec::new();
    let mut piece = String::new();
    let mut nesting = 0usize;

    let mut pieces = Vec::new();
    for ch in text.chars() {
        match ch {
            '(' | '[' => nesting += 1,
            ')' | ']' => nesting = nesting.saturating_sub(1),
            ',' if nesting == 0 => {
                pieces.push(std::mem::take(&mut piece));
                continue;
            }
            _ => {}
        }
        piece.push(ch);
    }
    if !piece.trim().is_empty() {
        pieces.push(piece);
    }

    for piece in pieces {
        let piece = piece.replace('\n', " ");
        if let Some(caps) = RE_PARAM.captures(piece.trim()) {
            params.push(ParamFacts {
                name: caps[3].to_string(),
                by_reference: caps.get(2).is_some(),
                type_hint: caps
                    .get(1)
                    .map(|m| m.as_str().trim_start_matches('\\').to_string()),
                default: caps.get(4).map(|m| normalize_value(m.as_str())),
            });
        }
    }
    params
}

/// Render a source default/constant value the way the output expects:
/// quoted strings lose their quotes, keyword literals stringify like
/// the host language casts them, everything else stays as written.
fn normalize_value(raw: &str) -> String {
    let value = raw.trim();
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
            || (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
        {
            return value[1..value.len() - 1].to_string();
        }
    }
    match value.to_ascii_lowercase().as_str() {
        "null" => "null".to_string(),
        "true" => "1".to_string(),
        "false" => String::new(),
        _ => value.to_string(),
    }
}

/// Count braces outside string literals.
fn count_braces(line: &str) -> (usize, usize) {
    let mut opens = 0;
    let mut closes = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in line.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(q) => match ch {
                '\\' => escaped = true,
                c if c == q => quote = None,
                _ => {}
            },
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '{' => opens += 1,
                '}' => closes += 1,
                _ => {}
            },
        }
    }
    (opens, closes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_class_with_members() {
        let input = r#"<?php
/**
 * A counter.
 */
class Counter
{
    /**
     * Upper bound.
     */
    const MAX = 100;

    /**
     * @var int the current count
     */
    protected $count = 0;

    /**
     * Increment the counter.
     */
    public function increment($by = 1)
    {
        $this->count += $by;
    }
}
"#;
        let facts = parse(input);
        assert_eq!(facts.classes.len(), 1);
        let class = &facts.classes[0];
        assert_eq!(class.name, "Counter");
        assert!(!class.is_interface);
        assert!(class.doc.contains("A counter."));
        assert_eq!(class.start_line, 5);
        assert_eq!(class.end_line, 24);

        assert_eq!(class.constants.len(), 1);
        assert_eq!(class.constants[0].name, "MAX");
        assert_eq!(class.constants[0].value, "100");
        assert_eq!(facts.constant_docs.len(), 1);
        assert_eq!(facts.constant_docs[0].0, "Counter::MAX");
        assert!(facts.constant_docs[0].1.contains("Upper bound."));

        assert_eq!(class.properties.len(), 1);
        let prop = &class.properties[0];
        assert_eq!(prop.name, "count");
        assert_eq!(prop.access, Access::Protected);
        assert_eq!(prop.default.as_deref(), Some("0"));
        assert!(prop.doc.contains("@var int"));

        assert_eq!(class.methods.len(), 1);
        let method = &class.methods[0];
        assert_eq!(method.name, "increment");
        assert_eq!(method.access, Access::Public);
        assert_eq!(method.start_line, 20);
        assert_eq!(method.end_line, 23);
        assert_eq!(method.params.len(), 1);
        assert_eq!(method.params[0].name, "by");
        assert_eq!(method.params[0].default.as_deref(), Some("1"));
    }

    #[test]
    fn parse_modifiers_and_inheritance() {
        let input = "abstract class Base extends Core implements A, B {\n}\n";
        let facts = parse(input);
        let class = &facts.classes[0];
        assert!(class.is_abstract);
        assert_eq!(class.parent.as_ref().unwrap().name, "Core");
        let ifaces: Vec<&str> = class.interfaces.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(ifaces, ["A", "B"]);
    }

    #[test]
    fn parse_interface_with_bodyless_method() {
        let input = "interface Walker extends Visitor {\n    public function walk($path);\n}\n";
        let facts = parse(input);
        let class = &facts.classes[0];
        assert!(class.is_interface);
        assert_eq!(class.interfaces[0].name, "Visitor");
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].name, "walk");
        assert_eq!(class.methods[0].start_line, 2);
        assert_eq!(class.methods[0].end_line, 2);
    }

    #[test]
    fn parse_method_flags_and_params() {
        let input = r#"final class S {
    protected static function &find(array $items, Filter $f, &$out, $limit = 10)
    {
        return $items;
    }
}
"#;
        let facts = parse(input);
        let class = &facts.classes[0];
        assert!(class.is_final);
        let method = &class.methods[0];
        assert!(method.is_static);
        assert!(method.returns_reference);
        assert_eq!(method.access, Access::Protected);
        let params = &method.params;
        assert_eq!(params.len(), 4);
        assert_eq!(params[0].type_hint.as_deref(), Some("array"));
        assert_eq!(params[1].type_hint.as_deref(), Some("Filter"));
        assert!(params[2].by_reference);
        assert_eq!(params[2].name, "out");
        assert_eq!(params[3].default.as_deref(), Some("10"));
    }

    #[test]
    fn parse_multiline_parameter_list() {
        let input = "class M {\n    public function configure(\n        $name,\n        $value = 'x'\n    ) {\n        return $name;\n    }\n}\n";
        let facts = parse(input);
        let method = &facts.classes[0].methods[0];
        assert_eq!(method.params.len(), 2);
        assert_eq!(method.params[1].default.as_deref(), Some("x"));
    }

    #[test]
    fn parse_brace_on_next_line() {
        let input = "class N\n{\n    public function run()\n    {\n        return 1;\n    }\n}\n";
        let facts = parse(input);
        let class = &facts.classes[0];
        assert_eq!(class.start_line, 1);
        assert_eq!(class.end_line, 7);
        assert_eq!(class.methods[0].start_line, 3);
        assert_eq!(class.methods[0].end_line, 6);
    }

    #[test]
    fn intervening_code_drops_pending_doc() {
        let input = "/**\n * Not for the constant.\n */\n$x = 1;\nclass P {\n    const A = 1;\n}\n";
        let facts = parse(input);
        assert!(facts.constant_docs.is_empty());
        assert_eq!(facts.classes[0].doc, "");
    }

    #[test]
    fn doc_block_inside_method_body_does_not_leak() {
        // Inline annotations like `/** @var Foo $x */` inside a body
        // must not attach to the next declared member.
        let input = "class T {\n    public function f()\n    {\n        /** @var Foo $x */\n        $x = load();\n    }\n\n    public function g()\n    {\n        return 2;\n    }\n}\n";
        let facts = parse(input);
        let class = &facts.classes[0];
        assert_eq!(class.methods.len(), 2);
        assert_eq!(class.methods[1].name, "g");
        assert_eq!(class.methods[1].doc, "");
    }

    #[test]
    fn blank_lines_keep_pending_doc() {
        let input = "class Q {\n    /**\n     * Limit.\n     */\n\n    const LIMIT = 5;\n}\n";
        let facts = parse(input);
        assert_eq!(facts.constant_docs.len(), 1);
    }

    #[test]
    fn string_defaults_keep_braces_out_of_depth() {
        let input = "class R {\n    protected $tpl = '{placeholder}';\n    public function f() { return 1; }\n}\n";
        let facts = parse(input);
        let class = &facts.classes[0];
        assert_eq!(class.properties[0].default.as_deref(), Some("{placeholder}"));
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.end_line, 4);
    }

    #[test]
    fn value_normalization() {
        assert_eq!(normalize_value("'foo'"), "foo");
        assert_eq!(normalize_value("\"bar\""), "bar");
        assert_eq!(normalize_value("null"), "null");
        assert_eq!(normalize_value("true"), "1");
        assert_eq!(normalize_value("false"), "");
        assert_eq!(normalize_value("array('a', 'b')"), "array('a', 'b')");
    }

    #[test]
    fn two_classes_in_one_file() {
        let input = "class A {\n}\nclass B {\n}\n";
        let facts = parse(input);
        let names: Vec<&str> = facts.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }
}
