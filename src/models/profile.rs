//! Shell Profile Model
//!
//! A shell profile is a named launch configuration: which executable to
//! start, with which arguments and environment, and how the resulting
//! terminal should look. Built-in profiles are derived from detected
//! shells and cannot be edited or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::models::{ShellInfo, ShellKind};

/// Appearance overrides applied to sessions launched from a profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileAppearance {
    /// Color scheme name, when overriding the application default
    pub color_scheme: Option<String>,
    /// Font family override
    pub font_family: Option<String>,
    /// Font size override
    pub font_size: Option<f32>,
}

impl ProfileAppearance {
    /// True when no field overrides the application default
    pub fn is_empty(&self) -> bool {
        self.color_scheme.is_none() && self.font_family.is_none() && self.font_size.is_none()
    }
}

/// A named shell launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellProfile {
    /// Unique identifier
    pub id: String,

    /// Display name, unique across the store
    pub name: String,

    /// Path to the shell executable
    pub shell_path: PathBuf,

    /// Classified shell kind
    pub shell_kind: ShellKind,

    /// Arguments passed to the shell, as a single string
    #[serde(default)]
    pub arguments: String,

    /// Directory new sessions start in
    #[serde(default)]
    pub starting_directory: Option<PathBuf>,

    /// Command run once after the session starts
    #[serde(default)]
    pub startup_command: Option<String>,

    /// Environment variable overrides
    #[serde(default)]
    pub environment: HashMap<String, String>,

    /// Appearance overrides
    #[serde(default)]
    pub appearance: ProfileAppearance,

    /// Derived from a detected shell; not editable or deletable
    #[serde(default)]
    pub is_built_in: bool,

    /// Used when no explicit default selection exists
    #[serde(default)]
    pub is_default: bool,

    /// Position in ordered listings
    #[serde(default)]
    pub sort_order: i32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl ShellProfile {
    /// Create a new user-defined profile
    pub fn new(name: impl Into<String>, shell_path: PathBuf, shell_kind: ShellKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            shell_path,
            shell_kind,
            arguments: String::new(),
            starting_directory: None,
            startup_command: None,
            environment: HashMap::new(),
            appearance: ProfileAppearance::default(),
            is_built_in: false,
            is_default: false,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a built-in profile from a detected shell
    pub fn built_in(info: &ShellInfo, sort_order: i32) -> Self {
        let mut profile = Self::new(info.name.clone(), info.path.clone(), info.kind);
        profile.arguments = info.default_args.join(" ");
        profile.is_built_in = true;
        profile.is_default = info.is_system_default;
        profile.sort_order = sort_order;
        profile
    }

    /// Arguments split for process spawning
    pub fn argument_list(&self) -> Vec<String> {
        self.arguments
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Refresh the modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
