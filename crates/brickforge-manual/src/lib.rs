//! # BrickForge Manual
//!
//! Turns the step sequence of a model into a build manual. Each step is
//! rendered through the scene engine with the new parts highlighted, and the
//! renders are laid out as a cover page plus one page per step, written as
//! HTML and/or PDF.

pub mod builder;
pub mod capture;
pub mod document;
pub mod error;
pub mod html;
pub mod pdf;

pub use builder::{ManualBuilder, ManualFormat, ManualOptions, RENDER_DIR};
pub use capture::{render_file_name, render_steps};
pub use document::{title_for, ManualDocument, NumberedPage};
pub use error::{ManualError, ManualResult};
pub use html::{render_html, write_html};
pub use pdf::{build_pdf, write_pdf};
