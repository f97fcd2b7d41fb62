//! SQL templates: compilation, tokenizing and rendering, preview samples, typed binds.

pub mod params;
pub mod sample;
pub mod template;

pub use params::{bind_all, bind_typed, untyped_literal};
pub use sample::{sample, SampleKind};
pub use template::{compile, render, tokenize, RenderedQuery, Segment, Template};
