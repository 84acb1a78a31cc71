use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use zip::ZipArchive;

use crate::app::backend::ResourceClient;
use crate::app::message::VerifyReport;

/// Entry names listed in a zip archive's central directory.
pub(crate) fn zip_entry_names(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let archive = ZipArchive::new(file)
        .with_context(|| format!("{} is not a zip archive", path.display()))?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Layer names a zipped shapefile should publish: the stems of its `.shp`
/// members, ignoring macOS resource forks.
pub(crate) fn shapefile_layers(path: &Path) -> Result<Vec<String>> {
    let mut layers: Vec<String> = zip_entry_names(path)?
        .into_iter()
        .filter(|name| !name.starts_with("__MACOSX/"))
        .filter_map(|name| {
            let file = name.rsplit('/').next().unwrap_or(&name).to_string();
            let (stem, ext) = file.rsplit_once('.')?;
            ext.eq_ignore_ascii_case("shp").then(|| stem.to_string())
        })
        .collect();
    layers.sort();
    layers.dedup();
    Ok(layers)
}

pub(crate) fn compare_layers(expected: &[String], published: &[String]) -> Vec<String> {
    expected
        .iter()
        .filter(|layer| {
            !published
                .iter()
                .any(|name| name.eq_ignore_ascii_case(layer))
        })
        .cloned()
        .collect()
}

/// Checks every uploaded archive against the feature types of its store.
pub(crate) fn verify_stores(
    client: &dyn ResourceClient,
    workspace: &str,
    stores: &[(String, PathBuf)],
) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();
    for (store, path) in stores {
        let expected = shapefile_layers(path)?;
        if expected.is_empty() {
            anyhow::bail!("{} contains no .shp file", path.display());
        }
        let published = client
            .list_feature_types(workspace, store)
            .with_context(|| format!("list feature types of {workspace}:{store}"))?;
        let missing = compare_layers(&expected, &published);
        report
            .missing
            .extend(missing.into_iter().map(|layer| format!("{store}/{layer}")));
        report
            .checked
            .extend(expected.into_iter().map(|layer| format!("{store}/{layer}")));
    }
    Ok(report)
}

#[cfg(test)]
pub(crate) fn write_test_zip(path: &Path, names: &[&str]) {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for name in names {
        writer.start_file(*name, options).unwrap();
        writer.write_all(b"x").unwrap();
    }
    writer.finish().unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::backend::MockResourceClient;

    #[test]
    fn zip_entry_names_reads_central_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roads.zip");
        write_test_zip(&path, &["roads.shp", "roads.dbf", "nested/rivers.SHP"]);
        let mut names = zip_entry_names(&path).unwrap();
        names.sort();
        assert_eq!(names, vec!["nested/rivers.SHP", "roads.dbf", "roads.shp"]);
        assert_eq!(shapefile_layers(&path).unwrap(), vec!["rivers", "roads"]);
    }

    #[test]
    fn shapefile_layers_skips_resource_forks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.zip");
        write_test_zip(&path, &["__MACOSX/._roads.shp", "roads.shp"]);
        assert_eq!(shapefile_layers(&path).unwrap(), vec!["roads"]);
    }

    #[test]
    fn zip_entry_names_rejects_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.zip");
        std::fs::write(&path, b"definitely not an archive, just text").unwrap();
        assert!(zip_entry_names(&path).is_err());
    }

    #[test]
    fn verify_stores_reports_missing_feature_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roads.zip");
        write_test_zip(&path, &["roads.shp", "rivers.shp"]);
        let client = MockResourceClient::default();
        client.set_feature_types("demo", "roads", &["ROADS"]);

        let report = verify_stores(&client, "demo", &[("roads".to_string(), path)]).unwrap();
        assert!(!report.passed());
        assert_eq!(report.missing, vec!["roads/rivers"]);
        assert_eq!(report.checked.len(), 2);
    }
}
