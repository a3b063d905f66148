//! Source parsing: structural facts from PHP code, prose and tags from
//! phpdoc blocks.

pub mod php;
pub mod phpdoc;

use crate::model::ClassFacts;

/// Everything recovered from one source file: the classes it declares
/// and the doc blocks found directly above constants, keyed
/// `Type::NAME` (constant docs travel beside the structure because
/// they attach during the same scan).
#[derive(Debug, Default)]
pub struct FileFacts {
    pub classes: Vec<ClassFacts>,
    pub constant_docs: Vec<(String, String)>,
}
