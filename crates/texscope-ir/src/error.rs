//! Error types for the texscope IR.

/// Errors that can occur when constructing or inspecting IR.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    /// A handle index is out of bounds for its arena.
    #[error("handle index {index} out of bounds (arena size: {size})")]
    BadHandle { index: usize, size: usize },

    /// An expression expected to be a function is something else.
    #[error("expression %{0} is not a function")]
    NotAFunction(usize),

    /// A tuple projection was applied to a non-tuple value.
    #[error("expression %{0} is not tuple-typed")]
    NotATuple(usize),

    /// A tuple projection index is past the last field.
    #[error("tuple field {index} out of range ({len} fields)")]
    TupleIndex { index: u32, len: usize },
}
