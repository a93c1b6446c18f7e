//! Manifest template rendering.
//!
//! Substitutes `${APP_NAME}` and `${IMAGE_NAME}` into a manifest template,
//! and only those two: any other `${...}` token passes through untouched so
//! templates remain compatible with downstream tooling.

use std::path::Path;

use shipwright_core::Result;

use crate::collaborators::ManifestVars;

/// Token replaced with the application name.
pub const APP_NAME_TOKEN: &str = "${APP_NAME}";

/// Token replaced with the full image reference.
pub const IMAGE_NAME_TOKEN: &str = "${IMAGE_NAME}";

/// Render a manifest template with the given variables.
pub fn render(template: &str, vars: &ManifestVars) -> String {
    template
        .replace(APP_NAME_TOKEN, &vars.app_name)
        .replace(IMAGE_NAME_TOKEN, &vars.image_name)
}

/// Read the template at `path` and render it.
pub async fn render_file(path: &Path, vars: &ManifestVars) -> Result<String> {
    let template = tokio::fs::read_to_string(path).await?;
    Ok(render(&template, vars))
}
