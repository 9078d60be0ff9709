//! Image transform primitives.
//!
//! Each primitive is a pure operation over a [`Frame`] (decoded pixels plus
//! pending encode settings): the output of one step is the input of the
//! next. Encoding to bytes happens exactly once, after the last step.
//!
//! # Module Structure
//!
//! ```text
//! transform/
//! ├── frame       # working buffer: pixels + captured metadata + encode hints
//! ├── step        # declarative step enum (config unit) + dispatch
//! ├── geometry    # scale, crop, rotate, relative-resize
//! ├── encode      # output formats, interlace modes, final encoding
//! └── error       # TransformError taxonomy
//! ```

pub mod encode;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod step;

pub use encode::{InterlaceMode, OutputFormat};
pub use error::TransformError;
pub use frame::Frame;
pub use step::Step;
