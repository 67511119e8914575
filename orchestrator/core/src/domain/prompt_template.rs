// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Failures raised while filling a stored comparison template

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateFormatError {
    #[error("unknown placeholder '{0}'")]
    UnknownPlaceholder(String),

    #[error("positional placeholder '{{{0}}}' is not supported, use a named field")]
    PositionalPlaceholder(String),

    #[error("conversion or format spec in '{{{0}}}' is not supported")]
    UnsupportedFormatSpec(String),

    #[error("single '{{' at offset {0} has no closing brace")]
    UnclosedPlaceholder(usize),

    #[error("single '}}' at offset {0} has no opening brace")]
    UnmatchedClosingBrace(usize),

    #[error("unexpected '{{' inside placeholder starting at offset {0}")]
    NestedBrace(usize),
}
