//! Waypoint Icon Library - Numbered icon symbols for GPX waypoints
//!
//! This library finds GPX files, parses them and gives every waypoint of a file a numbered
//! icon from an icon archive (the Locus Map `Locus Misc.zip` catalog by default) whenever at
//! least one waypoint of the file does not carry such an icon yet.
//!
//! # Architecture
//!
//! - **[`find_gpx_files`]**: Lazy discovery of `.gpx` files in a directory
//! - **[`GpxDocument`]**: Parsed GPX file, written back with only its waypoint symbols changed
//! - **[`IconCatalog`]**: The icon naming convention (marker and numbered references)
//! - **[`Relabeler`]**: The all-or-nothing renumbering rule, generic over [`WaypointSequence`]
//! - **[`BatchDriver`]**: Sequential parse → relabel → rewrite loop over one or more files
//!
//! # Usage Example
//!
//! ```rust
//! use waypoint_icon_lib::{GpxDocument, IconCatalog, Relabel, Relabeler};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut document = GpxDocument::parse(
//!     r#"<gpx version="1.1" creator="doc"><wpt lat="47.0" lon="8.0"/></gpx>"#,
//! )?;
//!
//! let relabeler = Relabeler::new(IconCatalog::default());
//! assert_eq!(relabeler.relabel(&mut document), Relabel::Relabeled { waypoints: 1 });
//! assert_eq!(relabeler.relabel(&mut document), Relabel::NoChange);
//! # Ok(())
//! # }
//! ```

mod catalog;
mod document;
mod driver;
mod locator;
mod relabel;

// Public API exports
pub use catalog::{IconCatalog, LOCUS_MISC_ARCHIVE};
pub use document::{GpxDocument, SymbolSlot, Waypoint, WaypointSequence};
pub use driver::{BatchDriver, Target};
pub use locator::{GpxFiles, find_gpx_files};
pub use relabel::{Relabel, Relabeler};

use std::path::PathBuf;

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Not a GPX document: {0}")]
    Format(String),

    #[error("Failed to serialize GPX: {0}")]
    Serialize(#[from] std::io::Error),

    #[error("Serialized GPX is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl IconError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IconError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IconError>;
