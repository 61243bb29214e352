//! Well-known names shared across the crate.

pub const APP_NAME: &str = "symconf";

/// Environment variable that overrides project root discovery.
pub const ROOT_ENV_VAR: &str = "SYMCONF_ROOT";

/// Per-directory link declaration file.
pub const DECLARATION_FILENAME: &str = "symlink-config.json";

/// Aggregated desired-state document, written at the project root.
pub const NEXT_FILENAME: &str = "next.symlink-config.json";

/// Observed-state document, written at the project root.
pub const CURRENT_FILENAME: &str = "current.symlink-config.json";

/// Project settings file.
pub const SETTINGS_FILENAME: &str = "symconf.settings.json";

pub const APPLY_SCRIPT_STEM: &str = "apply.symlink-config";
pub const CLEAN_SCRIPT_STEM: &str = "clean.symlink-config";
pub const ADMIN_SCRIPT_FILENAME: &str = "admin.symlink-config.bat";

pub const GITIGNORE_FILENAME: &str = ".gitignore";

/// Editor settings file holding the `files.exclude` map, relative to the root.
pub const EDITOR_SETTINGS_DIR: &str = ".vscode";
pub const EDITOR_SETTINGS_FILENAME: &str = "settings.json";

/// Prefix marking a root-relative virtual path.
pub const VIRTUAL_ROOT: char = '@';

/// Files the system generates at the project root.
pub const SERVICE_FILES: [&str; 7] = [
  NEXT_FILENAME,
  CURRENT_FILENAME,
  "apply.symlink-config.bat",
  "apply.symlink-config.sh",
  "clean.symlink-config.bat",
  "clean.symlink-config.sh",
  ADMIN_SCRIPT_FILENAME,
];
