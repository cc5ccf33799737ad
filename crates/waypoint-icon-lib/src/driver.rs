//! Sequential batch processing of GPX files
//!
//! Each file is read, parsed, relabeled and (only if something changed) written back to the
//! same path before the next one is looked at. The first error aborts the whole batch.
//!
//! The driver does not rely on a global logger: it is handed a [`Dispatch`] and runs every
//! batch under it.

use crate::{GpxDocument, IconError, Relabel, Relabeler, Result, find_gpx_files};
use std::path::{Path, PathBuf};
use tracing::Dispatch;

/// What a single run works on
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// Every `.gpx` file directly inside this directory
    Directory(PathBuf),
    /// This one file
    File(PathBuf),
}

/// Runs parse → relabel → rewrite over one or more files
#[derive(Clone, Debug)]
pub struct BatchDriver {
    relabeler: Relabeler,
    dispatch: Dispatch,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl BatchDriver {
    pub fn new(relabeler: Relabeler, dispatch: Dispatch) -> Self {
        Self {
            relabeler,
            dispatch,
        }
    }

    /// Process the target and return the files that were rewritten
    pub fn run(&self, target: &Target) -> Result<Vec<PathBuf>> {
        tracing::dispatcher::with_default(&self.dispatch, || match target {
            Target::Directory(dir) => self.update_directory(dir),
            Target::File(path) => Ok(self
                .update_file_inner(path)?
                .then(|| path.clone())
                .into_iter()
                .collect()),
        })
    }

    /// Process a single file, returning whether it was rewritten
    pub fn update_file(&self, path: &Path) -> Result<bool> {
        tracing::dispatcher::with_default(&self.dispatch, || self.update_file_inner(path))
    }

    fn update_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        tracing::debug!("Looking for GPX files in {}", dir.display());

        let mut updated = Vec::new();
        for path in find_gpx_files(dir)? {
            let path = path?;
            if self.update_file_inner(&path)? {
                updated.push(path);
            }
        }
        Ok(updated)
    }

    fn update_file_inner(&self, path: &Path) -> Result<bool> {
        #[cfg(feature = "profiling")]
        profiling::scope!("driver::update_file");

        let mut document = GpxDocument::from_path(path)?;

        match self.relabeler.relabel(&mut document) {
            Relabel::NoChange => {
                tracing::debug!("All waypoints of {} already have icons", path.display());
                Ok(false)
            }
            Relabel::Relabeled { waypoints } => {
                let xml = document.to_xml()?;
                std::fs::write(path, xml).map_err(|err| IconError::io(path, err))?;
                tracing::debug!("Numbered {waypoints} waypoints");
                tracing::info!("Updated {}", path.display());
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IconCatalog, SymbolSlot, WaypointSequence};
    use std::sync::{Arc, Mutex};

    const UNLABELED_THREE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="waypoint-icon-tests">
  <wpt lat="47.1" lon="8.1"><name>One</name></wpt>
  <wpt lat="47.2" lon="8.2"><name>Two</name></wpt>
  <wpt lat="47.3" lon="8.3"><name>Three</name></wpt>
</gpx>
"#;

    const LABELED_TWO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="waypoint-icon-tests">
  <wpt lat="46.1" lon="7.1"><name>Left</name><sym>file:Locus Misc.zip:number_1.png</sym></wpt>
  <wpt lat="46.2" lon="7.2"><name>Right</name><sym>file:Locus Misc.zip:number_2.png</sym></wpt>
</gpx>
"#;

    const SINGLE_UNLABELED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="waypoint-icon-tests">
  <wpt lat="45.0" lon="6.0"><name>Alone</name></wpt>
</gpx>
"#;

    /// Collects everything the fmt subscriber writes
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn create_test_driver() -> (BatchDriver, LogBuffer) {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        let driver = BatchDriver::new(Relabeler::default(), Dispatch::new(subscriber));
        (driver, logs)
    }

    fn symbols_in(path: &Path) -> Vec<Option<String>> {
        GpxDocument::from_path(path)
            .unwrap()
            .waypoints()
            .iter()
            .map(|waypoint| waypoint.symbol().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_directory_mode_rewrites_only_unlabeled_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.gpx");
        let b = dir.path().join("b.gpx");
        std::fs::write(&a, UNLABELED_THREE).unwrap();
        std::fs::write(&b, LABELED_TWO).unwrap();

        let (driver, logs) = create_test_driver();
        let updated = driver
            .run(&Target::Directory(dir.path().to_path_buf()))
            .unwrap();

        assert_eq!(updated, vec![a.clone()]);
        assert_eq!(
            symbols_in(&a),
            vec![
                Some("file:Locus Misc.zip:number_1.png".to_string()),
                Some("file:Locus Misc.zip:number_2.png".to_string()),
                Some("file:Locus Misc.zip:number_3.png".to_string()),
            ]
        );
        // Untouched file keeps its exact bytes
        assert_eq!(std::fs::read_to_string(&b).unwrap(), LABELED_TWO);

        let logs = logs.contents();
        assert!(logs.contains(&format!("Updated {}", a.display())));
        assert!(!logs.contains(&format!("Updated {}", b.display())));
    }

    #[test]
    fn test_directory_mode_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "not xml at all").unwrap();

        let (driver, _logs) = create_test_driver();
        let updated = driver
            .run(&Target::Directory(dir.path().to_path_buf()))
            .unwrap();

        assert!(updated.is_empty());
        assert_eq!(std::fs::read_to_string(&notes).unwrap(), "not xml at all");
    }

    #[test]
    fn test_single_file_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.gpx");
        std::fs::write(&path, SINGLE_UNLABELED).unwrap();

        let (driver, logs) = create_test_driver();
        let updated = driver.run(&Target::File(path.clone())).unwrap();

        assert_eq!(updated, vec![path.clone()]);
        assert_eq!(
            symbols_in(&path),
            vec![Some("file:Locus Misc.zip:number_1.png".to_string())]
        );
        assert!(logs.contents().contains("Updated"));
    }

    #[test]
    fn test_rewrite_keeps_extensions_and_tracks() {
        const LOCUS_EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="Locus Map" xmlns="http://www.topografix.com/GPX/1/1" xmlns:locus="https://www.locusmap.app">
  <metadata>
    <desc>Export</desc>
    <extensions><a>1</a></extensions>
  </metadata>
  <wpt lat="47.1" lon="8.1">
    <name>One</name>
    <extensions>
      <locus:icon>foo</locus:icon>
    </extensions>
  </wpt>
  <trk>
    <name>Loop</name>
    <trkseg><trkpt lat="47.1" lon="8.1"><ele>500</ele></trkpt></trkseg>
  </trk>
</gpx>
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locus.gpx");
        std::fs::write(&path, LOCUS_EXPORT).unwrap();

        let (driver, _logs) = create_test_driver();
        assert_eq!(driver.run(&Target::File(path.clone())).unwrap(), vec![path.clone()]);

        let written = std::fs::read_to_string(&path).unwrap();
        let expected = LOCUS_EXPORT.replace(
            "<name>One</name>\n    <extensions>",
            "<name>One</name>\n    <sym>file:Locus Misc.zip:number_1.png</sym><extensions>",
        );
        assert_eq!(written, expected);
        assert!(written.contains(r#"xmlns:locus="https://www.locusmap.app""#));
        assert!(written.contains("<extensions><a>1</a></extensions>"));
        assert!(written.contains("<locus:icon>foo</locus:icon>"));
        assert!(written.contains(r#"<trkpt lat="47.1" lon="8.1"><ele>500</ele></trkpt>"#));
    }

    #[test]
    fn test_file_without_version_is_relabeled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nover.gpx");
        std::fs::write(
            &path,
            r#"<gpx creator="x" xmlns="http://www.topografix.com/GPX/1/1"><wpt lat="1" lon="2"/></gpx>"#,
        )
        .unwrap();

        let (driver, _logs) = create_test_driver();
        assert!(driver.update_file(&path).unwrap());
        assert_eq!(
            symbols_in(&path),
            vec![Some("file:Locus Misc.zip:number_1.png".to_string())]
        );
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twice.gpx");
        std::fs::write(&path, UNLABELED_THREE).unwrap();

        let (driver, _logs) = create_test_driver();
        assert!(driver.update_file(&path).unwrap());
        let after_first = std::fs::read_to_string(&path).unwrap();

        assert!(!driver.update_file(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), after_first);
    }

    #[test]
    fn test_custom_catalog_relabels_default_symbols() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.gpx");
        std::fs::write(&path, LABELED_TWO).unwrap();

        let driver = BatchDriver::new(
            Relabeler::new(IconCatalog::new("Trail.zip")),
            Dispatch::none(),
        );
        assert!(driver.update_file(&path).unwrap());
        assert_eq!(
            symbols_in(&path),
            vec![
                Some("file:Trail.zip:number_1.png".to_string()),
                Some("file:Trail.zip:number_2.png".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_directory_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let (driver, _logs) = create_test_driver();

        let result = driver.run(&Target::Directory(dir.path().join("missing")));
        assert!(matches!(result, Err(IconError::Io { .. })));
    }

    #[test]
    fn test_missing_file_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let (driver, _logs) = create_test_driver();

        let result = driver.run(&Target::File(dir.path().join("missing.gpx")));
        assert!(matches!(result, Err(IconError::Io { .. })));
    }

    #[test]
    fn test_malformed_file_aborts_batch() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.gpx");
        std::fs::write(&broken, "<gpx version=\"1.1\"><wpt").unwrap();

        let (driver, logs) = create_test_driver();
        let result = driver.run(&Target::Directory(dir.path().to_path_buf()));

        assert!(matches!(
            result,
            Err(IconError::Xml(_) | IconError::Format(_))
        ));
        assert!(!logs.contents().contains("Updated"));
    }
}
