//! Integration tests for the catalog graph

mod extensions_and_validation;
mod lazy_resolution;
mod persistence;
mod structural_edits;
mod support;
