//! Data model for structural facts recovered from source — pure data.
//!
//! Everything here describes what a type *is* (members, modifiers,
//! locations); prose and tags live in the raw doc comment strings and
//! are recovered separately by the phpdoc parser.

/// A class or interface with its own (non-inherited) members.
#[derive(Debug, Default)]
pub struct ClassFacts {
    pub name: String,
    pub is_interface: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    /// Parent class (classes only; interface parents land in
    /// `interfaces`).
    pub parent: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub constants: Vec<ConstantFacts>,
    pub properties: Vec<PropertyFacts>,
    pub methods: Vec<MethodFacts>,
    /// Declaring file, as scanned.
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    /// Raw doc comment block, empty if none.
    pub doc: String,
}

/// Reference to another type, flagged when it was found in the scanned
/// sources rather than being external.
#[derive(Debug, Default)]
pub struct TypeRef {
    pub name: String,
    pub user_defined: bool,
}

/// An own class constant. Its doc comment travels in the scanner's
/// side table, keyed `Type::NAME`.
#[derive(Debug)]
pub struct ConstantFacts {
    pub name: String,
    pub value: String,
}

#[derive(Debug)]
pub struct PropertyFacts {
    pub name: String,
    pub is_static: bool,
    pub access: Access,
    pub default: Option<String>,
    pub doc: String,
}

#[derive(Debug, Default)]
pub struct MethodFacts {
    pub name: String,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_static: bool,
    pub access: Access,
    pub returns_reference: bool,
    pub params: Vec<ParamFacts>,
    pub start_line: usize,
    pub end_line: usize,
    pub doc: String,
}

#[derive(Debug)]
pub struct ParamFacts {
    pub name: String,
    pub by_reference: bool,
    /// Declared type hint, if any.
    pub type_hint: Option<String>,
    /// Default value; present exactly when the parameter is optional.
    pub default: Option<String>,
}

/// Member visibility. Undeclared visibility means public.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        }
    }
}
