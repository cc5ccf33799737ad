use clap::Parser;
use std::path::PathBuf;
use waypoint_icon_lib::{IconCatalog, LOCUS_MISC_ARCHIVE, Target};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Waypoint Icon Tagger - assigns numbered Locus Map icons to the waypoints of GPX files
pub struct Settings {
    /// Directory to look for gpx files
    #[clap(long, value_name = "DIR")]
    pub working_directory: Option<PathBuf>,

    /// GPX file to update
    #[clap(long, value_name = "FILE")]
    pub gpx_file: Option<PathBuf>,

    /// Overwrite the waypoint symbols
    #[clap(long, default_value = "false")]
    pub overwrite_symbol: bool,

    /// More output (logging is always at debug level)
    #[clap(long, default_value = "false")]
    pub verbose: bool,

    /// Icon archive the numbered symbols point into
    #[clap(long, value_name = "NAME", default_value = LOCUS_MISC_ARCHIVE)]
    pub icon_archive: String,
}

impl Settings {
    /// Pick the mode; the working directory wins when both are given
    pub fn target(&self) -> Option<Target> {
        match (&self.working_directory, &self.gpx_file) {
            (Some(dir), gpx_file) => {
                if let Some(gpx_file) = gpx_file {
                    tracing::warn!(
                        "Ignoring --gpx-file {} in favor of --working-directory",
                        gpx_file.display()
                    );
                }
                Some(Target::Directory(dir.clone()))
            }
            (None, Some(gpx_file)) => Some(Target::File(gpx_file.clone())),
            (None, None) => None,
        }
    }

    pub fn catalog(&self) -> IconCatalog {
        IconCatalog::new(self.icon_archive.as_str())
    }
}
