use crate::layout::Phase;

/// State for each open document
#[derive(Debug, Clone)]
pub struct DocumentState {
    pub content: String,
    /// Phase forced by configuration or detected from the first record
    pub phase: Phase,
}
