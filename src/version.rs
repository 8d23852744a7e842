// Version information for the Fabstir text detector

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-db-text-detection-2025-11-04";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Major version number
pub const VERSION_MAJOR: u32 = 0;

/// Minor version number
pub const VERSION_MINOR: u32 = 1;

/// Patch version number
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2025-11-04";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "db-postprocessing",
    "onnx-cpu-inference",
    "rotated-quads",
    "polygon-unclip",
    "max-side-len-scaling",
    "toml-config",
    "json-output",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Fabstir Text Detector {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for CLI output
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
