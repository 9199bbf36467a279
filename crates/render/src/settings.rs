use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use voxelspace_kernel::{DEFAULT_GRID_SIZE, FieldConfig};

use crate::camera::CameraConfig;
use crate::ray::TraceConfig;
use crate::shading::ShadingConfig;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported settings format: {0:?} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Every tunable of the renderer in one document. Missing keys take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Edge length of the stored grid for built-in scenes.
    pub grid_size: u32,
    pub field: FieldConfig,
    pub camera: CameraConfig,
    pub trace: TraceConfig,
    pub shading: ShadingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            field: FieldConfig::default(),
            camera: CameraConfig::default(),
            trace: TraceConfig::default(),
            shading: ShadingConfig::default(),
        }
    }
}

impl Settings {
    /// Load from a `.yaml`/`.yml` or `.json` file and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let settings: Self = match extension(path).as_deref() {
            Some("yaml" | "yml") => serde_yaml::from_str(&text)?,
            Some("json") => serde_json::from_str(&text)?,
            _ => return Err(SettingsError::UnsupportedFormat(path.to_path_buf())),
        };
        settings.validate()?;
        tracing::debug!(?path, "settings loaded");
        Ok(settings)
    }

    /// Write as YAML or JSON, chosen by extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let text = match extension(path).as_deref() {
            Some("yaml" | "yml") => serde_yaml::to_string(self)?,
            Some("json") => serde_json::to_string_pretty(self)?,
            _ => return Err(SettingsError::UnsupportedFormat(path.to_path_buf())),
        };
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_yaml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_yaml_string(&self) -> Result<String, SettingsError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let field = &self.field;
        let camera = &self.camera;
        check(self.grid_size > 0, "grid_size must be positive")?;
        check(
            field.clearance_radius >= 0.0 && field.clearance_radius.is_finite(),
            "field.clearance_radius must be a finite non-negative number",
        )?;
        check(
            field.cutoff_radius >= field.clearance_radius && field.cutoff_radius.is_finite(),
            "field.cutoff_radius must be finite and at least clearance_radius",
        )?;
        check(
            field.noise_scale > 0.0 && field.noise_scale.is_finite(),
            "field.noise_scale must be positive",
        )?;
        check(field.variant_count > 0, "field.variant_count must be positive")?;
        check(
            camera.focal_length > 0.0 && camera.focal_length.is_finite(),
            "camera.focal_length must be positive",
        )?;
        check(
            camera.move_speed >= 0.0 && camera.move_speed.is_finite(),
            "camera.move_speed must be non-negative",
        )?;
        check(
            (0.0..=1.0).contains(&camera.slow_factor),
            "camera.slow_factor must be within [0, 1]",
        )?;
        check(self.trace.max_steps > 0, "trace.max_steps must be positive")?;
        check(
            self.shading.light_direction.is_finite()
                && self.shading.light_direction.length_squared() > 0.0,
            "shading.light_direction must be a finite non-zero vector",
        )?;
        Ok(())
    }

    /// Log a warning when the step cap cannot cross the generated region
    /// around a stored grid of edge `grid_size`.
    pub fn warn_if_trace_short(&self, grid_size: u32) -> bool {
        let span = self.field.traversal_span(grid_size);
        let short = self.trace.max_steps < span;
        if short {
            tracing::warn!(
                max_steps = self.trace.max_steps,
                required = span,
                "trace step cap is below the traversal span; distant terrain will be clipped"
            );
        }
        short
    }
}

fn check(ok: bool, message: &str) -> Result<(), SettingsError> {
    if ok {
        Ok(())
    } else {
        Err(SettingsError::Invalid(message.to_string()))
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
