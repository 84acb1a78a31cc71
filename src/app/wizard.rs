use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::{
    ConnectionConfig, LayerConfig, LayerGroupConfig, ResourceConfig, ResourceKind, StoreConfig,
    StyleConfig, WorkspaceConfig,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FieldValue {
    Text(String),
    Toggle(bool),
}

#[derive(Debug, Clone)]
pub(crate) struct FormField {
    pub(crate) key: &'static str,
    pub(crate) label: &'static str,
    pub(crate) value: FieldValue,
    pub(crate) required: bool,
    pub(crate) secret: bool,
    pub(crate) editable: bool,
}

impl FormField {
    fn text(key: &'static str, label: &'static str, value: &str) -> Self {
        Self {
            key,
            label,
            value: FieldValue::Text(value.to_string()),
            required: false,
            secret: false,
            editable: true,
        }
    }

    fn toggle(key: &'static str, label: &'static str, value: bool) -> Self {
        Self {
            key,
            label,
            value: FieldValue::Toggle(value),
            required: false,
            secret: false,
            editable: true,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    fn locked(mut self, locked: bool) -> Self {
        self.editable = !locked;
        self
    }

    pub(crate) fn display_value(&self) -> String {
        match &self.value {
            FieldValue::Text(text) if self.secret => "*".repeat(text.chars().count()),
            FieldValue::Text(text) => text.clone(),
            FieldValue::Toggle(true) => "[x]".to_string(),
            FieldValue::Toggle(false) => "[ ]".to_string(),
        }
    }
}

/// Editable field list shared by every wizard.
#[derive(Debug, Clone)]
pub(crate) struct Form {
    pub(crate) fields: Vec<FormField>,
    pub(crate) focus: usize,
}

impl Form {
    fn new(fields: Vec<FormField>) -> Self {
        let focus = fields.iter().position(|field| field.editable).unwrap_or(0);
        Self { fields, focus }
    }

    pub(crate) fn text(&self, key: &str) -> &str {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .and_then(|field| match &field.value {
                FieldValue::Text(text) => Some(text.as_str()),
                FieldValue::Toggle(_) => None,
            })
            .unwrap_or_default()
    }

    pub(crate) fn toggle(&self, key: &str) -> bool {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .is_some_and(|field| field.value == FieldValue::Toggle(true))
    }

    #[cfg(test)]
    pub(crate) fn set_text(&mut self, key: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|field| field.key == key) {
            field.value = FieldValue::Text(value.to_string());
        }
    }

    fn advance(&mut self, forward: bool) {
        let len = self.fields.len();
        if len == 0 {
            return;
        }
        for _ in 0..len {
            self.focus = if forward {
                (self.focus + 1) % len
            } else {
                (self.focus + len - 1) % len
            };
            if self.fields[self.focus].editable {
                break;
            }
        }
    }

    /// Applies one key to the focused field. Returns false for keys the form
    /// does not use.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.advance(true),
            KeyCode::BackTab | KeyCode::Up => self.advance(false),
            _ => {
                let Some(field) = self.fields.get_mut(self.focus) else {
                    return false;
                };
                if !field.editable {
                    return false;
                }
                match (&mut field.value, key.code) {
                    (FieldValue::Toggle(flag), KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right) => {
                        *flag = !*flag;
                    }
                    (FieldValue::Text(text), KeyCode::Backspace) => {
                        text.pop();
                    }
                    (FieldValue::Text(text), KeyCode::Char(ch))
                        if !key.modifiers.contains(KeyModifiers::CONTROL) =>
                    {
                        text.push(ch);
                    }
                    _ => return false,
                }
            }
        }
        true
    }

    fn check_required(&self) -> Result<(), String> {
        for field in &self.fields {
            if field.required
                && matches!(&field.value, FieldValue::Text(text) if text.trim().is_empty())
            {
                return Err(format!("{} is required", field.label));
            }
        }
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn valid_name(name: &str) -> Result<(), String> {
    if name.chars().any(|ch| ch.is_whitespace() || ch == '/' || ch == ':') {
        return Err(format!("Name '{name}' must not contain spaces, '/' or ':'"));
    }
    Ok(())
}

/// Fields for creating (`existing == None`) or editing one resource.
pub(crate) fn resource_form(kind: ResourceKind, existing: Option<&ResourceConfig>) -> Form {
    let editing = existing.is_some();
    let fields = match (kind, existing) {
        (ResourceKind::Workspace, existing) => {
            let (name, isolated) = match existing {
                Some(ResourceConfig::Workspace(ws)) => (ws.name.as_str(), ws.isolated),
                _ => ("", false),
            };
            vec![
                FormField::text("name", "Name", name).required(),
                FormField::toggle("isolated", "Isolated", isolated),
            ]
        }
        (ResourceKind::DataStore | ResourceKind::CoverageStore, existing) => {
            let blank = StoreConfig {
                name: String::new(),
                description: String::new(),
                enabled: true,
                url: String::new(),
            };
            let store = match existing {
                Some(ResourceConfig::DataStore(store) | ResourceConfig::CoverageStore(store)) => {
                    store
                }
                _ => &blank,
            };
            let url = FormField::text("url", "Connection URL", &store.url);
            vec![
                FormField::text("name", "Name", &store.name)
                    .required()
                    .locked(editing),
                FormField::text("description", "Description", &store.description),
                FormField::toggle("enabled", "Enabled", store.enabled),
                if editing { url } else { url.required() },
            ]
        }
        (ResourceKind::Style, existing) => {
            let (name, filename) = match existing {
                Some(ResourceConfig::Style(style)) => (style.name.as_str(), style.filename.as_str()),
                _ => ("", ""),
            };
            vec![
                FormField::text("name", "Name", name)
                    .required()
                    .locked(editing),
                FormField::text("filename", "Server file", filename).locked(true),
                FormField::text("sld_file", "Local SLD file", "").required(),
            ]
        }
        (ResourceKind::Layer, existing) => {
            let layer = match existing {
                Some(ResourceConfig::Layer(layer)) => layer.clone(),
                _ => LayerConfig {
                    name: String::new(),
                    enabled: true,
                    advertised: true,
                    default_style: String::new(),
                },
            };
            vec![
                FormField::text("name", "Name", &layer.name)
                    .required()
                    .locked(editing),
                FormField::toggle("enabled", "Enabled", layer.enabled),
                FormField::toggle("advertised", "Advertised", layer.advertised),
                FormField::text("default_style", "Default style", &layer.default_style),
            ]
        }
        (ResourceKind::LayerGroup, existing) => {
            let (name, title, layers) = match existing {
                Some(ResourceConfig::LayerGroup(group)) => {
                    (group.name.as_str(), group.title.as_str(), group.layers.join(", "))
                }
                _ => ("", "", String::new()),
            };
            vec![
                FormField::text("name", "Name", name)
                    .required()
                    .locked(editing),
                FormField::text("title", "Title", title),
                FormField::text("layers", "Layers (comma separated)", &layers).required(),
            ]
        }
    };
    Form::new(fields)
}

/// Validates the form and builds the config to submit.
pub(crate) fn resource_config(kind: ResourceKind, form: &Form) -> Result<ResourceConfig, String> {
    form.check_required()?;
    let name = form.text("name").trim().to_string();
    valid_name(&name)?;
    let config = match kind {
        ResourceKind::Workspace => ResourceConfig::Workspace(WorkspaceConfig {
            name,
            isolated: form.toggle("isolated"),
        }),
        ResourceKind::DataStore | ResourceKind::CoverageStore => {
            let store = StoreConfig {
                name,
                description: form.text("description").trim().to_string(),
                enabled: form.toggle("enabled"),
                url: form.text("url").trim().to_string(),
            };
            if kind == ResourceKind::DataStore {
                ResourceConfig::DataStore(store)
            } else {
                ResourceConfig::CoverageStore(store)
            }
        }
        ResourceKind::Style => {
            let sld_file = form.text("sld_file").trim().to_string();
            if !sld_file.to_lowercase().ends_with(".sld") {
                return Err("Local SLD file must end with .sld".to_string());
            }
            ResourceConfig::Style(StyleConfig {
                name,
                filename: form.text("filename").to_string(),
                sld_file,
            })
        }
        ResourceKind::Layer => ResourceConfig::Layer(LayerConfig {
            name,
            enabled: form.toggle("enabled"),
            advertised: form.toggle("advertised"),
            default_style: form.text("default_style").trim().to_string(),
        }),
        ResourceKind::LayerGroup => {
            let layers = split_list(form.text("layers"));
            if layers.is_empty() {
                return Err("A layer group needs at least one layer".to_string());
            }
            ResourceConfig::LayerGroup(LayerGroupConfig {
                name,
                title: form.text("title").trim().to_string(),
                layers,
            })
        }
    };
    Ok(config)
}

pub(crate) fn connection_form(existing: Option<&ConnectionConfig>) -> Form {
    let (name, url, user, password) = existing
        .map(|conn| {
            (
                conn.name.as_str(),
                conn.url.as_str(),
                conn.user.as_str(),
                conn.password.as_str(),
            )
        })
        .unwrap_or(("", "http://localhost:8080/geoserver", "admin", ""));
    Form::new(vec![
        FormField::text("name", "Name", name),
        FormField::text("url", "URL", url).required(),
        FormField::text("user", "User", user).required(),
        FormField::text("password", "Password", password)
            .required()
            .secret(),
    ])
}

pub(crate) fn connection_config(form: &Form, id: String) -> Result<ConnectionConfig, String> {
    form.check_required()?;
    let url = form.text("url").trim().trim_end_matches('/').to_string();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err("URL must start with http:// or https://".to_string());
    }
    Ok(ConnectionConfig {
        id,
        name: form.text("name").trim().to_string(),
        url,
        user: form.text("user").trim().to_string(),
        password: form.text("password").to_string(),
    })
}
