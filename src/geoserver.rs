use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Method;
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Value, json};

use crate::app::backend::{DownloadFormat, ResourceClient};
use crate::model::{
    ConnectionConfig, ContactInfo, LayerConfig, LayerGroupConfig, ResourceConfig, ResourceItem,
    ResourceKind, ResourceRef, ServerInfo, StoreConfig, StyleConfig, UploadFormat,
    WorkspaceConfig,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(600);
const READ_ATTEMPTS: usize = 3;
const ERROR_BODY_MAX: usize = 200;
const SLD_CONTENT_TYPE: &str = "application/vnd.ogc.sld+xml";

fn with_retries<T>(label: &str, mut f: impl FnMut() -> Result<T>) -> Result<T> {
    let mut last: Option<anyhow::Error> = None;
    for i in 0..READ_ATTEMPTS {
        match f() {
            Ok(v) => return Ok(v),
            Err(err) => {
                last = Some(err);
                if i + 1 < READ_ATTEMPTS {
                    std::thread::sleep(Duration::from_millis(200 * (1 << i)));
                }
            }
        }
    }
    Err(last
        .unwrap_or_else(|| anyhow::anyhow!("unknown error"))
        .context(label.to_string()))
}

/// GeoServer REST client for one configured connection.
pub(crate) struct RestClient {
    base: Url,
    user: String,
    password: String,
    http: Client,
}

impl RestClient {
    pub(crate) fn new(config: &ConnectionConfig) -> Result<Self> {
        let base = Url::parse(config.url.trim())
            .with_context(|| format!("parse server url {}", config.url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("server url {} cannot be used as a base", config.url);
        }
        let http = Client::builder()
            .user_agent("geo-deck")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            base,
            user: config.user.clone(),
            password: config.password.clone(),
            http,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("server url cannot be used as a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn rest(&self, segments: &[&str]) -> Result<Url> {
        let mut all = Vec::with_capacity(segments.len() + 1);
        all.push("rest");
        all.extend_from_slice(segments);
        self.endpoint(&all)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.user, Some(&self.password))
    }

    fn ensure_ok(&self, resp: Response, label: &str) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            anyhow::bail!("{label}: unauthorized (check user and password)");
        }
        if status == reqwest::StatusCode::FORBIDDEN {
            anyhow::bail!("{label}: forbidden (insufficient permissions)");
        }
        let body = resp.text().unwrap_or_default();
        let body = body.trim();
        if body.is_empty() {
            anyhow::bail!("{label}: HTTP {status}");
        }
        anyhow::bail!("{label}: HTTP {status}: {}", first_line(body, ERROR_BODY_MAX))
    }

    fn get_json(&self, url: Url, label: &str) -> Result<Value> {
        with_retries(label, || {
            let resp = self
                .request(Method::GET, url.clone())
                .header(ACCEPT, "application/json")
                .send()
                .with_context(|| format!("{label} request"))?;
            self.ensure_ok(resp, label)?
                .json::<Value>()
                .with_context(|| format!("{label} decode"))
        })
    }

    fn send_json(&self, method: Method, url: Url, body: &Value, label: &str) -> Result<()> {
        let resp = self
            .request(method, url)
            .json(body)
            .send()
            .with_context(|| format!("{label} request"))?;
        self.ensure_ok(resp, label)?;
        Ok(())
    }

    fn send_sld(&self, method: Method, url: Url, sld_file: &str, label: &str) -> Result<()> {
        let body = fs::read(sld_file).with_context(|| format!("read SLD file {sld_file}"))?;
        let resp = self
            .request(method, url)
            .header(CONTENT_TYPE, SLD_CONTENT_TYPE)
            .body(body)
            .send()
            .with_context(|| format!("{label} request"))?;
        self.ensure_ok(resp, label)?;
        Ok(())
    }

    fn list(&self, segments: &[&str], outer: &str, inner: &str) -> Result<Vec<ResourceItem>> {
        let url = self.rest(segments)?;
        let label = format!("list {outer}");
        let value = self.get_json(url, &label)?;
        Ok(parse_named_list(&value, outer, inner))
    }

    fn item_url(&self, target: &ResourceRef) -> Result<Url> {
        let ws = target.workspace.as_str();
        let name = target.name.as_str();
        match target.kind {
            ResourceKind::Workspace => self.rest(&["workspaces", name]),
            ResourceKind::DataStore => self.rest(&["workspaces", ws, "datastores", name]),
            ResourceKind::CoverageStore => self.rest(&["workspaces", ws, "coveragestores", name]),
            ResourceKind::Style => self.rest(&["workspaces", ws, "styles", name]),
            ResourceKind::Layer => self.rest(&["workspaces", ws, "layers", name]),
            ResourceKind::LayerGroup => self.rest(&["workspaces", ws, "layergroups", name]),
        }
    }

    fn item_json_url(&self, target: &ResourceRef) -> Result<Url> {
        let file = format!("{}.json", target.name);
        let renamed = ResourceRef {
            kind: target.kind,
            workspace: target.workspace.clone(),
            name: file,
        };
        self.item_url(&renamed)
    }
}

impl ResourceClient for RestClient {
    fn list_workspaces(&self) -> Result<Vec<ResourceItem>> {
        self.list(&["workspaces.json"], "workspaces", "workspace")
    }

    fn list_data_stores(&self, workspace: &str) -> Result<Vec<ResourceItem>> {
        self.list(
            &["workspaces", workspace, "datastores.json"],
            "dataStores",
            "dataStore",
        )
    }

    fn list_coverage_stores(&self, workspace: &str) -> Result<Vec<ResourceItem>> {
        self.list(
            &["workspaces", workspace, "coveragestores.json"],
            "coverageStores",
            "coverageStore",
        )
    }

    fn list_styles(&self, workspace: &str) -> Result<Vec<ResourceItem>> {
        self.list(&["workspaces", workspace, "styles.json"], "styles", "style")
    }

    fn list_layers(&self, workspace: &str) -> Result<Vec<ResourceItem>> {
        let items = self.list(&["workspaces", workspace, "layers.json"], "layers", "layer")?;
        Ok(items
            .into_iter()
            .map(|item| ResourceItem {
                name: strip_workspace(&item.name, workspace).to_string(),
                enabled: item.enabled,
            })
            .collect())
    }

    fn list_layer_groups(&self, workspace: &str) -> Result<Vec<ResourceItem>> {
        self.list(
            &["workspaces", workspace, "layergroups.json"],
            "layerGroups",
            "layerGroup",
        )
    }

    fn list_feature_types(&self, workspace: &str, store: &str) -> Result<Vec<String>> {
        let items = self.list(
            &["workspaces", workspace, "datastores", store, "featuretypes.json"],
            "featureTypes",
            "featureType",
        )?;
        Ok(items.into_iter().map(|item| item.name).collect())
    }

    fn get_resource(&self, target: &ResourceRef) -> Result<ResourceConfig> {
        let url = self.item_json_url(target)?;
        let value = self.get_json(url, &format!("load {}", target.describe()))?;
        parse_resource(target, &value)
    }

    fn create_resource(&self, workspace: &str, config: &ResourceConfig) -> Result<()> {
        let label = format!("create {} {}", config.kind().label(), config.name());
        match config {
            ResourceConfig::Workspace(ws) => {
                let body = json!({ "workspace": { "name": ws.name, "isolated": ws.isolated } });
                self.send_json(Method::POST, self.rest(&["workspaces"])?, &body, &label)
            }
            ResourceConfig::DataStore(store) => {
                let body = data_store_body(store);
                let url = self.rest(&["workspaces", workspace, "datastores"])?;
                self.send_json(Method::POST, url, &body, &label)
            }
            ResourceConfig::CoverageStore(store) => {
                let body = coverage_store_body(workspace, store);
                let url = self.rest(&["workspaces", workspace, "coveragestores"])?;
                self.send_json(Method::POST, url, &body, &label)
            }
            ResourceConfig::Style(style) => {
                let mut url = self.rest(&["workspaces", workspace, "styles"])?;
                url.query_pairs_mut().append_pair("name", &style.name);
                self.send_sld(Method::POST, url, &style.sld_file, &label)
            }
            ResourceConfig::Layer(_) => {
                anyhow::bail!("layers are published through stores or uploads")
            }
            ResourceConfig::LayerGroup(group) => {
                let body = layer_group_body(workspace, group);
                let url = self.rest(&["workspaces", workspace, "layergroups"])?;
                self.send_json(Method::POST, url, &body, &label)
            }
        }
    }

    fn update_resource(&self, target: &ResourceRef, config: &ResourceConfig) -> Result<()> {
        let label = format!("update {}", target.describe());
        let url = self.item_url(target)?;
        match config {
            ResourceConfig::Workspace(ws) => {
                let body = json!({ "workspace": { "name": ws.name, "isolated": ws.isolated } });
                self.send_json(Method::PUT, url, &body, &label)
            }
            ResourceConfig::DataStore(store) => {
                self.send_json(Method::PUT, url, &data_store_body(store), &label)
            }
            ResourceConfig::CoverageStore(store) => {
                let body = coverage_store_body(&target.workspace, store);
                self.send_json(Method::PUT, url, &body, &label)
            }
            ResourceConfig::Style(style) => {
                if style.sld_file.trim().is_empty() {
                    anyhow::bail!("{label}: no SLD file given");
                }
                self.send_sld(Method::PUT, url, &style.sld_file, &label)
            }
            ResourceConfig::Layer(layer) => {
                let mut inner = json!({ "enabled": layer.enabled, "advertised": layer.advertised });
                if !layer.default_style.trim().is_empty() {
                    inner["defaultStyle"] = json!({ "name": layer.default_style });
                }
                self.send_json(Method::PUT, url, &json!({ "layer": inner }), &label)
            }
            ResourceConfig::LayerGroup(group) => {
                let body = layer_group_body(&target.workspace, group);
                self.send_json(Method::PUT, url, &body, &label)
            }
        }
    }

    fn delete_resource(&self, target: &ResourceRef) -> Result<()> {
        let label = format!("delete {}", target.describe());
        let mut url = self.item_url(target)?;
        if target.kind == ResourceKind::Style {
            url.query_pairs_mut().append_pair("purge", "true");
        } else {
            url.query_pairs_mut().append_pair("recurse", "true");
        }
        let resp = self
            .request(Method::DELETE, url)
            .send()
            .with_context(|| format!("{label} request"))?;
        self.ensure_ok(resp, &label)?;
        Ok(())
    }

    fn upload_file(&self, workspace: &str, store: &str, path: &Path) -> Result<()> {
        let Some(format) = UploadFormat::from_path(path) else {
            anyhow::bail!("unsupported upload format: {}", path.display());
        };
        let (url, content_type) = match format {
            UploadFormat::Shapefile => (
                self.rest(&["workspaces", workspace, "datastores", store, "file.shp"])?,
                "application/zip",
            ),
            UploadFormat::GeoPackage => (
                self.rest(&["workspaces", workspace, "datastores", store, "file.gpkg"])?,
                "application/x-sqlite3",
            ),
            UploadFormat::GeoTiff => (
                self.rest(&["workspaces", workspace, "coveragestores", store, "file.geotiff"])?,
                "image/tiff",
            ),
        };
        let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
        let label = format!("upload {}", path.display());
        let resp = self
            .request(Method::PUT, url)
            .timeout(TRANSFER_TIMEOUT)
            .header(CONTENT_TYPE, content_type)
            .body(file)
            .send()
            .with_context(|| format!("{label} request"))?;
        self.ensure_ok(resp, &label)?;
        Ok(())
    }

    fn download_layer(
        &self,
        workspace: &str,
        layer: &str,
        format: DownloadFormat,
    ) -> Result<Vec<u8>> {
        let mut url = self.endpoint(&[workspace, "ows"])?;
        let qualified = format!("{workspace}:{layer}");
        match format {
            DownloadFormat::GeoJson => {
                url.query_pairs_mut()
                    .append_pair("service", "WFS")
                    .append_pair("version", "2.0.0")
                    .append_pair("request", "GetFeature")
                    .append_pair("typeNames", &qualified)
                    .append_pair("outputFormat", "application/json");
            }
            DownloadFormat::GeoTiff => {
                url.query_pairs_mut()
                    .append_pair("service", "WCS")
                    .append_pair("version", "2.0.1")
                    .append_pair("request", "GetCoverage")
                    .append_pair("coverageId", &qualified.replace(':', "__"))
                    .append_pair("format", "image/geotiff");
            }
        }
        let label = format!("download {qualified}");
        let resp = self
            .request(Method::GET, url)
            .timeout(TRANSFER_TIMEOUT)
            .send()
            .with_context(|| format!("{label} request"))?;
        let bytes = self
            .ensure_ok(resp, &label)?
            .bytes()
            .with_context(|| format!("{label} body"))?;
        Ok(bytes.to_vec())
    }

    fn server_status(&self) -> Result<ServerInfo> {
        let url = self.rest(&["about", "version.json"])?;
        let resp = self
            .request(Method::GET, url)
            .header(ACCEPT, "application/json")
            .send()
            .context("server status request")?;
        let value = self
            .ensure_ok(resp, "server status")?
            .json::<Value>()
            .context("server status decode")?;
        Ok(ServerInfo {
            version: parse_version(&value).unwrap_or_else(|| "unknown".to_string()),
        })
    }

    fn get_contact(&self) -> Result<ContactInfo> {
        let url = self.rest(&["settings", "contact.json"])?;
        let value = self.get_json(url, "load contact")?;
        let contact = value.get("contact").unwrap_or(&Value::Null);
        Ok(ContactInfo {
            person: str_field(contact, "contactPerson"),
            organization: str_field(contact, "contactOrganization"),
            email: str_field(contact, "contactEmail"),
        })
    }
}

/// GeoServer lists come back as `{outer: {inner: [..]}}`, but an empty list is
/// serialized as `{outer: ""}` and a single entry as a bare object.
pub(crate) fn parse_named_list(value: &Value, outer: &str, inner: &str) -> Vec<ResourceItem> {
    one_or_many(value.get(outer).and_then(|v| v.get(inner)))
        .into_iter()
        .filter_map(|entry| {
            let name = entry.get("name").and_then(Value::as_str)?;
            Some(ResourceItem {
                name: name.to_string(),
                enabled: entry.get("enabled").and_then(bool_value),
            })
        })
        .collect()
}

fn one_or_many(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => vec![],
    }
}

fn bool_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

fn bool_field(value: &Value, key: &str, default: bool) -> bool {
    value.get(key).and_then(bool_value).unwrap_or(default)
}

fn str_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

fn strip_workspace<'a>(name: &'a str, workspace: &str) -> &'a str {
    name.strip_prefix(workspace)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(name)
}

fn first_line(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max {
        line.to_string()
    } else {
        let cut: String = line.chars().take(max).collect();
        format!("{cut}...")
    }
}

pub(crate) fn parse_version(value: &Value) -> Option<String> {
    one_or_many(value.get("about").and_then(|about| about.get("resource")))
        .into_iter()
        .find(|entry| entry.get("@name").and_then(Value::as_str) == Some("GeoServer"))
        .map(|entry| str_field(entry, "Version"))
        .filter(|version| !version.is_empty())
}

fn store_url(store: &Value) -> String {
    if let Some(url) = store.get("url").and_then(Value::as_str) {
        return url.to_string();
    }
    let entries = one_or_many(
        store
            .get("connectionParameters")
            .and_then(|params| params.get("entry")),
    );
    entries
        .into_iter()
        .find(|entry| entry.get("@key").and_then(Value::as_str) == Some("url"))
        .map(|entry| str_field(entry, "$"))
        .unwrap_or_default()
}

fn parse_store(value: &Value, key: &str) -> StoreConfig {
    let store = value.get(key).unwrap_or(&Value::Null);
    StoreConfig {
        name: str_field(store, "name"),
        description: str_field(store, "description"),
        enabled: bool_field(store, "enabled", true),
        url: store_url(store),
    }
}

pub(crate) fn parse_resource(target: &ResourceRef, value: &Value) -> Result<ResourceConfig> {
    let config = match target.kind {
        ResourceKind::Workspace => {
            let ws = value.get("workspace").unwrap_or(&Value::Null);
            ResourceConfig::Workspace(WorkspaceConfig {
                name: str_field(ws, "name"),
                isolated: bool_field(ws, "isolated", false),
            })
        }
        ResourceKind::DataStore => ResourceConfig::DataStore(parse_store(value, "dataStore")),
        ResourceKind::CoverageStore => {
            ResourceConfig::CoverageStore(parse_store(value, "coverageStore"))
        }
        ResourceKind::Style => {
            let style = value.get("style").unwrap_or(&Value::Null);
            ResourceConfig::Style(StyleConfig {
                name: str_field(style, "name"),
                filename: str_field(style, "filename"),
                sld_file: String::new(),
            })
        }
        ResourceKind::Layer => {
            let layer = value.get("layer").unwrap_or(&Value::Null);
            let default_style = layer
                .get("defaultStyle")
                .map(|style| str_field(style, "name"))
                .unwrap_or_default();
            ResourceConfig::Layer(LayerConfig {
                name: str_field(layer, "name"),
                enabled: bool_field(layer, "enabled", true),
                advertised: bool_field(layer, "advertised", true),
                default_style,
            })
        }
        ResourceKind::LayerGroup => {
            let group = value.get("layerGroup").unwrap_or(&Value::Null);
            let layers = one_or_many(
                group
                    .get("publishables")
                    .and_then(|publishables| publishables.get("published")),
            )
            .into_iter()
            .map(|entry| strip_workspace(&str_field(entry, "name"), &target.workspace).to_string())
            .filter(|name| !name.is_empty())
            .collect();
            ResourceConfig::LayerGroup(LayerGroupConfig {
                name: str_field(group, "name"),
                title: str_field(group, "title"),
                layers,
            })
        }
    };
    if config.name().is_empty() {
        anyhow::bail!("{} returned no name", target.describe());
    }
    Ok(config)
}

fn data_store_body(store: &StoreConfig) -> Value {
    let mut inner = json!({
        "name": store.name,
        "description": store.description,
        "enabled": store.enabled,
    });
    if !store.url.trim().is_empty() {
        inner["connectionParameters"] = json!({ "entry": [{ "@key": "url", "$": store.url }] });
    }
    json!({ "dataStore": inner })
}

fn coverage_store_body(workspace: &str, store: &StoreConfig) -> Value {
    let mut inner = json!({
        "name": store.name,
        "description": store.description,
        "enabled": store.enabled,
        "type": "GeoTIFF",
        "workspace": workspace,
    });
    if !store.url.trim().is_empty() {
        inner["url"] = json!(store.url);
    }
    json!({ "coverageStore": inner })
}

fn layer_group_body(workspace: &str, group: &LayerGroupConfig) -> Value {
    let published: Vec<Value> = group
        .layers
        .iter()
        .map(|layer| json!({ "@type": "layer", "name": format!("{workspace}:{layer}") }))
        .collect();
    json!({
        "layerGroup": {
            "name": group.name,
            "title": group.title,
            "mode": "SINGLE",
            "publishables": { "published": published },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> ConnectionConfig {
        ConnectionConfig {
            id: "conn-1".to_string(),
            name: "local".to_string(),
            url: url.to_string(),
            user: "admin".to_string(),
            password: "geoserver".to_string(),
        }
    }

    #[test]
    fn parse_named_list_accepts_geoserver_shapes() {
        let many = json!({ "workspaces": { "workspace": [{ "name": "a" }, { "name": "b" }] } });
        let names: Vec<_> = parse_named_list(&many, "workspaces", "workspace")
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        let single = json!({ "styles": { "style": { "name": "line" } } });
        assert_eq!(parse_named_list(&single, "styles", "style").len(), 1);

        let empty = json!({ "dataStores": "" });
        assert!(parse_named_list(&empty, "dataStores", "dataStore").is_empty());
    }

    #[test]
    fn parse_named_list_reads_enabled_flags() {
        let value = json!({
            "dataStores": { "dataStore": [
                { "name": "roads", "enabled": "false" },
                { "name": "rivers", "enabled": true },
                { "name": "parcels" }
            ] }
        });
        let flags: Vec<_> = parse_named_list(&value, "dataStores", "dataStore")
            .into_iter()
            .map(|item| item.enabled)
            .collect();
        assert_eq!(flags, vec![Some(false), Some(true), None]);
    }

    #[test]
    fn endpoint_keeps_base_path_and_encodes_segments() {
        let client = RestClient::new(&config("http://localhost:8080/geoserver/")).unwrap();
        let url = client
            .rest(&["workspaces", "my ws", "datastores.json"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/geoserver/rest/workspaces/my%20ws/datastores.json"
        );
    }

    #[test]
    fn new_rejects_invalid_url() {
        assert!(RestClient::new(&config("not a url")).is_err());
        assert!(RestClient::new(&config("mailto:ops@example.org")).is_err());
    }

    #[test]
    fn parse_version_finds_geoserver_entry() {
        let value = json!({ "about": { "resource": [
            { "@name": "GeoTools", "Version": "31.0" },
            { "@name": "GeoServer", "Version": "2.25.1" }
        ] } });
        assert_eq!(parse_version(&value).as_deref(), Some("2.25.1"));
        assert_eq!(parse_version(&json!({})), None);
    }

    #[test]
    fn parse_resource_reads_layer_group_members() {
        let target = ResourceRef {
            kind: ResourceKind::LayerGroup,
            workspace: "demo".to_string(),
            name: "base".to_string(),
        };
        let value = json!({ "layerGroup": {
            "name": "base",
            "title": "Base map",
            "publishables": { "published": { "@type": "layer", "name": "demo:roads" } }
        } });
        let parsed = parse_resource(&target, &value).unwrap();
        assert_eq!(
            parsed,
            ResourceConfig::LayerGroup(LayerGroupConfig {
                name: "base".to_string(),
                title: "Base map".to_string(),
                layers: vec!["roads".to_string()],
            })
        );
    }

    #[test]
    fn parse_resource_reads_store_connection_url() {
        let target = ResourceRef {
            kind: ResourceKind::DataStore,
            workspace: "demo".to_string(),
            name: "roads".to_string(),
        };
        let value = json!({ "dataStore": {
            "name": "roads",
            "enabled": true,
            "connectionParameters": { "entry": [
                { "@key": "charset", "$": "UTF-8" },
                { "@key": "url", "$": "file:data/roads.shp" }
            ] }
        } });
        let ResourceConfig::DataStore(store) = parse_resource(&target, &value).unwrap() else {
            panic!("expected data store");
        };
        assert_eq!(store.url, "file:data/roads.shp");
        assert!(store.enabled);
    }

    #[test]
    fn parse_resource_rejects_missing_name() {
        let target = ResourceRef {
            kind: ResourceKind::Workspace,
            workspace: String::new(),
            name: "demo".to_string(),
        };
        assert!(parse_resource(&target, &json!({})).is_err());
    }

    #[test]
    fn layer_group_body_qualifies_members() {
        let group = LayerGroupConfig {
            name: "base".to_string(),
            title: "Base".to_string(),
            layers: vec!["roads".to_string()],
        };
        let body = layer_group_body("demo", &group);
        assert_eq!(
            body["layerGroup"]["publishables"]["published"][0]["name"],
            json!("demo:roads")
        );
    }
}
