//! Run configuration, merged from defaults, an optional JSON config file,
//! and command-line arguments. Scalar settings take the most specific
//! value; file and import-path lists accumulate across the layers.

use std::path::PathBuf;

use serde::Deserialize;

/// The settings a JSON config file may provide. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub files: Option<Vec<PathBuf>>,
    pub proto_paths: Option<Vec<PathBuf>>,
    pub out: Option<PathBuf>,
    pub templates: Option<Vec<String>>,
    pub keep_case: Option<bool>,
}

/// The fully merged configuration for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Proto entry files. Imports are followed from these.
    pub files: Vec<PathBuf>,
    /// Directories searched for imported files, in order.
    pub proto_paths: Vec<PathBuf>,
    /// Output directory for generated declarations.
    pub out: PathBuf,
    /// Names of the templates to run.
    pub templates: Vec<String>,
    /// Preserve original field-name casing.
    pub keep_case: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            files: vec![],
            proto_paths: vec![],
            out: PathBuf::from("src-gen"),
            templates: vec!["grpc-node".to_string(), "protobufjs6".to_string()],
            keep_case: false,
        }
    }
}

impl Config {
    /// Merges the three layers: command-line arguments beat the config
    /// file, which beats the defaults. `files` and `proto_paths` are
    /// concatenated (argument entries first) instead of replaced, so a
    /// `-I` root is probed before any config-file root.
    pub fn merge(
        file: FileConfig,
        arg_files: Vec<PathBuf>,
        arg_proto_paths: Vec<PathBuf>,
        arg_out: Option<PathBuf>,
        arg_templates: Vec<String>,
        arg_keep_case: bool,
    ) -> Self {
        let defaults = Config::default();

        let mut files = arg_files;
        files.extend(file.files.unwrap_or_default());

        let mut proto_paths = arg_proto_paths;
        proto_paths.extend(file.proto_paths.unwrap_or_default());
        if proto_paths.is_empty() {
            proto_paths.push(PathBuf::from("."));
        }

        let templates = if !arg_templates.is_empty() {
            arg_templates
        } else {
            file.templates.unwrap_or(defaults.templates)
        };

        Self {
            files,
            proto_paths,
            out: arg_out.or(file.out).unwrap_or(defaults.out),
            templates,
            keep_case: arg_keep_case || file.keep_case.unwrap_or(defaults.keep_case),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::merge(FileConfig::default(), vec![], vec![], None, vec![], false);
        assert!(config.files.is_empty());
        assert_eq!(config.proto_paths, vec![PathBuf::from(".")]);
        assert_eq!(config.out, PathBuf::from("src-gen"));
        assert_eq!(config.templates, vec!["grpc-node", "protobufjs6"]);
        assert!(!config.keep_case);
    }

    #[test]
    fn test_arguments_override_file_scalars() {
        let file: FileConfig =
            serde_json::from_str(r#"{"out": "from-file", "keep_case": true}"#).unwrap();
        let config = Config::merge(
            file,
            vec![],
            vec![],
            Some(PathBuf::from("from-args")),
            vec![],
            false,
        );
        assert_eq!(config.out, PathBuf::from("from-args"));
        // a file-level keep_case survives; the flag can only enable it
        assert!(config.keep_case);
    }

    #[test]
    fn test_lists_concatenate_argument_entries_first() {
        // root order is observable: the first matching root wins when an
        // import is probed, so -I roots must come before config-file roots
        let file: FileConfig = serde_json::from_str(
            r#"{"files": ["a.proto"], "proto_paths": ["protos"]}"#,
        )
        .unwrap();
        let config = Config::merge(
            file,
            vec![PathBuf::from("b.proto")],
            vec![PathBuf::from("more")],
            None,
            vec![],
            false,
        );
        assert_eq!(
            config.files,
            vec![PathBuf::from("b.proto"), PathBuf::from("a.proto")]
        );
        assert_eq!(
            config.proto_paths,
            vec![PathBuf::from("more"), PathBuf::from("protos")]
        );
    }

    #[test]
    fn test_argument_templates_replace_file_templates() {
        let file: FileConfig =
            serde_json::from_str(r#"{"templates": ["protobufjs6"]}"#).unwrap();
        let config = Config::merge(
            file,
            vec![],
            vec![],
            None,
            vec!["grpc-node".to_string()],
            false,
        );
        assert_eq!(config.templates, vec!["grpc-node"]);
    }

    #[test]
    fn test_unknown_config_keys_are_rejected() {
        let parsed: Result<FileConfig, _> = serde_json::from_str(r#"{"nope": 1}"#);
        assert!(parsed.is_err());
    }
}
