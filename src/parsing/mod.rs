
//! Miscellaneous utilities for parsing expressions.

pub mod operator;
pub mod source;
pub mod tokenizer;
