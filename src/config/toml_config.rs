use crate::adapters::memory_view::{Element, MemoryView};
use crate::core::dependency::DependencyGraph;
use crate::core::template::extract_references;
use crate::domain::model::{is_calculated_name, SessionId, CALCULATED_PREFIX};
use crate::utils::error::{BinderError, Result};
use crate::utils::validation::{
    validate_flat_model, validate_property_name, validate_session_id, Validate,
};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinderConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default = "empty_model")]
    pub model: Value,
    #[serde(default)]
    pub calculated: IndexMap<String, String>,
    pub view: Option<ViewConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub elements: Vec<Element>,
}

fn empty_model() -> Value {
    Value::Object(serde_json::Map::new())
}

impl BinderConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BinderError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BinderError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Reads a JSON model file, replacing the `[model]` section.
    pub fn load_model_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let content = std::fs::read_to_string(&path)?;
        self.model = serde_json::from_str(&content).map_err(|e| BinderError::ConfigError {
            message: format!(
                "Model file '{}' is not valid JSON: {}",
                path.as_ref().display(),
                e
            ),
        })?;
        Ok(())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(id) = &self.session.id {
            validate_session_id(id).map_err(|e| BinderError::ConfigValidationError {
                field: "session.id".to_string(),
                message: e.to_string(),
            })?;
        }

        let model = validate_flat_model(&self.model).map_err(|e| {
            BinderError::ConfigValidationError {
                field: "model".to_string(),
                message: e.to_string(),
            }
        })?;

        let mut graph = DependencyGraph::new();
        for (name, template) in &self.calculated {
            let field = format!("calculated.{}", name);
            validate_property_name(name).map_err(|e| BinderError::ConfigValidationError {
                field: field.clone(),
                message: e.to_string(),
            })?;

            if !is_calculated_name(name) {
                return Err(BinderError::ConfigValidationError {
                    field,
                    message: format!(
                        "Calculated property names must start with '{}'",
                        CALCULATED_PREFIX
                    ),
                });
            }

            if model.contains_key(name) {
                return Err(BinderError::ConfigValidationError {
                    field,
                    message: "Name is already declared in [model]".to_string(),
                });
            }

            graph
                .declare(name, &extract_references(template))
                .map_err(|e| BinderError::ConfigValidationError {
                    field,
                    message: e.to_string(),
                })?;
        }

        if let Some(view) = &self.view {
            for (index, element) in view.elements.iter().enumerate() {
                if element.name.is_none() && element.id.is_none() {
                    return Err(BinderError::ConfigValidationError {
                        field: format!("view.elements[{}]", index),
                        message: "Element needs a name or an id".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn session_id(&self) -> Result<SessionId> {
        match &self.session.id {
            Some(id) => SessionId::new(id.as_str()),
            None => Ok(SessionId::generate()),
        }
    }

    /// `[model]` followed by the `[calculated]` templates, as one flat object
    /// ready to bind.
    pub fn initial_model(&self) -> Value {
        let mut entries = self.model.as_object().cloned().unwrap_or_default();
        for (name, template) in &self.calculated {
            entries.insert(name.clone(), Value::String(template.clone()));
        }
        Value::Object(entries)
    }

    pub fn has_view(&self) -> bool {
        self.view.is_some()
    }

    pub fn build_view(&self) -> MemoryView {
        MemoryView::new(
            self.view
                .as_ref()
                .map(|v| v.elements.clone())
                .unwrap_or_default(),
        )
    }
}

impl Validate for BinderConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
