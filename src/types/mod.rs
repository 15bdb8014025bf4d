mod document;

pub use document::{Document, DocumentPatch, EXCERPT_LENGTH, PLACEHOLDER_CONTENT, UNTITLED};
