//! Icon catalog naming convention
//!
//! Locus Map resolves waypoint symbols of the form `file:<archive>:<icon>` to icons bundled
//! in the named archive. Symbols produced here always mention the archive, so the archive
//! name doubles as the marker telling our own symbols apart from foreign ones.

/// Archive holding the numbered icons shipped with Locus Map
pub const LOCUS_MISC_ARCHIVE: &str = "Locus Misc.zip";

/// Describes where numbered waypoint icons live
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IconCatalog {
    archive: String,
}

impl Default for IconCatalog {
    fn default() -> Self {
        Self::new(LOCUS_MISC_ARCHIVE)
    }
}

impl IconCatalog {
    /// Create a catalog for a custom icon archive name
    pub fn new(archive: impl Into<String>) -> Self {
        Self {
            archive: archive.into(),
        }
    }

    /// Name of the icon archive
    #[inline]
    pub fn archive(&self) -> &str {
        &self.archive
    }

    /// Substring every symbol generated by this catalog contains
    #[inline]
    pub fn marker(&self) -> &str {
        &self.archive
    }

    /// Whether a symbol was produced by this catalog's convention
    #[inline]
    pub fn recognizes(&self, symbol: &str) -> bool {
        symbol.contains(self.marker())
    }

    /// Symbol reference of the numbered icon for a 1-based position
    pub fn reference(&self, number: usize) -> String {
        format!("file:{}:number_{}.png", self.archive, number)
    }
}
