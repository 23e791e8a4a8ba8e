#![forbid(unsafe_code)]
#![cfg_attr(docs_rs, feature(doc_cfg))]

//! A crate for making PNG files smaller without changing how they look.
//!
//! The pipeline is: parse the file, reduce how the pixels are stored (bit
//! depth, color type, palette), search row filters and compression settings
//! for the smallest image data, then write a new file with whichever
//! ancillary chunks the [`StripChunks`] policy keeps.
//!
//! * [`optimize_from_memory`] works on bytes.
//! * [`optimize`] also handles files, with in place writes and backups.
//! * [`RawImage`] encodes pixels that aren't a PNG yet.
//!
//! The library uses the [`log`] facade, and never installs a logger itself.

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod error;
pub use error::*;

pub mod ascii_array;
pub use ascii_array::*;

pub mod bit_depth_changes;
pub use bit_depth_changes::*;

mod parser_helpers;
pub(crate) use parser_helpers::*;

mod colors;
pub use colors::*;

mod options;
pub use options::*;

mod kwargs;
pub use kwargs::*;

mod deadline;
pub use deadline::*;

pub mod png;
pub use png::{Chunk, ChunkPosition, IhdrData, PngData, PngImage};

mod reduction;

mod deflate;
pub use deflate::Effort;

mod evaluate;

mod headers;

mod raw_image;
pub use raw_image::*;

mod driver;
pub use driver::{optimize, optimize_from_memory, InFile, OutFile};
