//! Widget configuration
//!
//! ```toml
//! # short form
//! contextual_toolbar = ["bold", "italic"]
//!
//! # extended form
//! [contextual_toolbar]
//! items = ["bold", "italic", "underline"]
//! debounce_ms = 200
//! balloon_class_name = "ck-toolbar-container ck-editor-toolbar-container"
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

fn default_debounce_ms() -> u64 {
    200
}

fn default_balloon_class_name() -> String {
    "ck-toolbar-container ck-editor-toolbar-container".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawToolbarConfig {
    Items(Vec<String>),
    Extended {
        #[serde(default)]
        items: Vec<String>,
        #[serde(default = "default_debounce_ms")]
        debounce_ms: u64,
        #[serde(default = "default_balloon_class_name")]
        balloon_class_name: String,
    },
}

/// Contextual toolbar settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawToolbarConfig")]
pub struct ContextualToolbarConfig {
    /// Component names, in toolbar order
    pub items: Vec<String>,
    /// Quiet period after the last selection change before showing
    pub debounce_ms: u64,
    /// Class applied to the balloon while the toolbar is in it
    pub balloon_class_name: String,
}

impl ContextualToolbarConfig {
    pub fn with_items<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ContextualToolbarConfig {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            debounce_ms: default_debounce_ms(),
            balloon_class_name: default_balloon_class_name(),
        }
    }
}

impl From<RawToolbarConfig> for ContextualToolbarConfig {
    fn from(raw: RawToolbarConfig) -> Self {
        match raw {
            RawToolbarConfig::Items(items) => Self {
                items,
                ..Default::default()
            },
            RawToolbarConfig::Extended {
                items,
                debounce_ms,
                balloon_class_name,
            } => Self {
                items,
                debounce_ms,
                balloon_class_name,
            },
        }
    }
}

/// Top-level UI configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub contextual_toolbar: ContextualToolbarConfig,
}

impl UiConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}
