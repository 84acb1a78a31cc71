use std::path::Path;

use anyhow::Result;

use crate::model::{ContactInfo, ResourceConfig, ResourceItem, ResourceRef, ServerInfo};

#[cfg(test)]
use std::collections::{HashMap, HashSet};
#[cfg(test)]
use std::sync::Mutex;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DownloadFormat {
    GeoJson,
    GeoTiff,
}

impl DownloadFormat {
    pub(crate) fn for_destination(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if ext == "tif" || ext == "tiff" {
            DownloadFormat::GeoTiff
        } else {
            DownloadFormat::GeoJson
        }
    }
}

/// Remote operations available for one configured server.
pub(crate) trait ResourceClient: Send + Sync {
    fn list_workspaces(&self) -> Result<Vec<ResourceItem>>;
    fn list_data_stores(&self, workspace: &str) -> Result<Vec<ResourceItem>>;
    fn list_coverage_stores(&self, workspace: &str) -> Result<Vec<ResourceItem>>;
    fn list_styles(&self, workspace: &str) -> Result<Vec<ResourceItem>>;
    fn list_layers(&self, workspace: &str) -> Result<Vec<ResourceItem>>;
    fn list_layer_groups(&self, workspace: &str) -> Result<Vec<ResourceItem>>;
    fn list_feature_types(&self, workspace: &str, store: &str) -> Result<Vec<String>>;

    fn get_resource(&self, target: &ResourceRef) -> Result<ResourceConfig>;
    fn create_resource(&self, workspace: &str, config: &ResourceConfig) -> Result<()>;
    fn update_resource(&self, target: &ResourceRef, config: &ResourceConfig) -> Result<()>;
    fn delete_resource(&self, target: &ResourceRef) -> Result<()>;

    fn upload_file(&self, workspace: &str, store: &str, path: &Path) -> Result<()>;
    fn download_layer(&self, workspace: &str, layer: &str, format: DownloadFormat)
    -> Result<Vec<u8>>;

    fn server_status(&self) -> Result<ServerInfo>;
    fn get_contact(&self) -> Result<ContactInfo>;
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct MockResourceClient {
    lists: Mutex<HashMap<String, Vec<ResourceItem>>>,
    list_errors: Mutex<HashMap<String, String>>,
    list_calls: AtomicUsize,
    feature_types: Mutex<HashMap<String, Vec<String>>>,
    resources: Mutex<HashMap<String, ResourceConfig>>,
    submit_error: Mutex<Option<String>>,
    submissions: Mutex<Vec<String>>,
    upload_failures: Mutex<HashSet<String>>,
    uploads: Mutex<Vec<String>>,
    status_error: Mutex<Option<String>>,
    status_calls: AtomicUsize,
    download: Mutex<Vec<u8>>,
}

#[cfg(test)]
impl MockResourceClient {
    fn list_key(scope: &str, workspace: &str) -> String {
        format!("{scope}|{workspace}")
    }

    fn resource_key(target: &ResourceRef) -> String {
        format!("{:?}|{}|{}", target.kind, target.workspace, target.name)
    }

    pub(crate) fn set_list(&self, scope: &str, workspace: &str, names: &[&str]) {
        self.lists.lock().unwrap().insert(
            Self::list_key(scope, workspace),
            names.iter().map(|name| ResourceItem::named(*name)).collect(),
        );
    }

    pub(crate) fn set_list_error(&self, scope: &str, workspace: &str, err: &str) {
        self.list_errors
            .lock()
            .unwrap()
            .insert(Self::list_key(scope, workspace), err.to_string());
    }

    pub(crate) fn clear_list_error(&self, scope: &str, workspace: &str) {
        self.list_errors
            .lock()
            .unwrap()
            .remove(&Self::list_key(scope, workspace));
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_feature_types(&self, workspace: &str, store: &str, names: &[&str]) {
        self.feature_types.lock().unwrap().insert(
            format!("{workspace}|{store}"),
            names.iter().map(|name| name.to_string()).collect(),
        );
    }

    pub(crate) fn set_resource(&self, target: &ResourceRef, config: ResourceConfig) {
        self.resources
            .lock()
            .unwrap()
            .insert(Self::resource_key(target), config);
    }

    pub(crate) fn set_submit_error(&self, err: Option<&str>) {
        *self.submit_error.lock().unwrap() = err.map(str::to_string);
    }

    pub(crate) fn submissions(&self) -> Vec<String> {
        self.submissions.lock().unwrap().clone()
    }

    pub(crate) fn fail_upload(&self, file_name: &str) {
        self.upload_failures
            .lock()
            .unwrap()
            .insert(file_name.to_string());
    }

    pub(crate) fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub(crate) fn set_status_error(&self, err: Option<&str>) {
        *self.status_error.lock().unwrap() = err.map(str::to_string);
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_download(&self, bytes: &[u8]) {
        *self.download.lock().unwrap() = bytes.to_vec();
    }

    fn listed(&self, scope: &str, workspace: &str) -> Result<Vec<ResourceItem>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let key = Self::list_key(scope, workspace);
        if let Some(err) = self.list_errors.lock().unwrap().get(&key) {
            return Err(anyhow::anyhow!(err.clone()));
        }
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }

    fn submitted(&self, label: String) -> Result<()> {
        if let Some(err) = self.submit_error.lock().unwrap().as_ref() {
            return Err(anyhow::anyhow!(err.clone()));
        }
        self.submissions.lock().unwrap().push(label);
        Ok(())
    }
}

#[cfg(test)]
impl ResourceClient for MockResourceClient {
    fn list_workspaces(&self) -> Result<Vec<ResourceItem>> {
        self.listed("workspaces", "")
    }

    fn list_data_stores(&self, workspace: &str) -> Result<Vec<ResourceItem>> {
        self.listed("datastores", workspace)
    }

    fn list_coverage_stores(&self, workspace: &str) -> Result<Vec<ResourceItem>> {
        self.listed("coveragestores", workspace)
    }

    fn list_styles(&self, workspace: &str) -> Result<Vec<ResourceItem>> {
        self.listed("styles", workspace)
    }

    fn list_layers(&self, workspace: &str) -> Result<Vec<ResourceItem>> {
        self.listed("layers", workspace)
    }

    fn list_layer_groups(&self, workspace: &str) -> Result<Vec<ResourceItem>> {
        self.listed("layergroups", workspace)
    }

    fn list_feature_types(&self, workspace: &str, store: &str) -> Result<Vec<String>> {
        Ok(self
            .feature_types
            .lock()
            .unwrap()
            .get(&format!("{workspace}|{store}"))
            .cloned()
            .unwrap_or_default())
    }

    fn get_resource(&self, target: &ResourceRef) -> Result<ResourceConfig> {
        self.resources
            .lock()
            .unwrap()
            .get(&Self::resource_key(target))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("{} not found", target.describe()))
    }

    fn create_resource(&self, workspace: &str, config: &ResourceConfig) -> Result<()> {
        self.submitted(format!("create {workspace}:{}", config.name()))
    }

    fn update_resource(&self, target: &ResourceRef, config: &ResourceConfig) -> Result<()> {
        self.submitted(format!("update {} -> {}", target.describe(), config.name()))
    }

    fn delete_resource(&self, target: &ResourceRef) -> Result<()> {
        self.submitted(format!("delete {}", target.describe()))
    }

    fn upload_file(&self, workspace: &str, store: &str, path: &Path) -> Result<()> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.upload_failures.lock().unwrap().contains(&file_name) {
            anyhow::bail!("upload of {file_name} rejected");
        }
        self.uploads
            .lock()
            .unwrap()
            .push(format!("{workspace}/{store}/{file_name}"));
        Ok(())
    }

    fn download_layer(
        &self,
        _workspace: &str,
        _layer: &str,
        _format: DownloadFormat,
    ) -> Result<Vec<u8>> {
        Ok(self.download.lock().unwrap().clone())
    }

    fn server_status(&self) -> Result<ServerInfo> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.status_error.lock().unwrap().as_ref() {
            return Err(anyhow::anyhow!(err.clone()));
        }
        Ok(ServerInfo {
            version: "2.25.0".to_string(),
        })
    }

    fn get_contact(&self) -> Result<ContactInfo> {
        Ok(ContactInfo {
            person: "Ops".to_string(),
            organization: "Example".to_string(),
            email: "ops@example.org".to_string(),
        })
    }
}
