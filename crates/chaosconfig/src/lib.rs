use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Only preset schema understood by this build.
pub const CONFIG_VERSION: u32 = 1;

/// Upper bound on points per frame; keeps the vertex arena inside common GPU buffer limits.
pub const MAX_PARTICLES: usize = 4_194_304;

const BUILTIN_PRESETS: [(&str, &str); 2] = [
    ("dream", include_str!("../presets/dream.toml")),
    ("bubble", include_str!("../presets/bubble.toml")),
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse preset: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read preset at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid preset: {0}")]
    Invalid(String),
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

/// Recurrence family driving the trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecurrenceKind {
    /// Two-term sinusoidal map (`u = sin(y·b) + c·sin(x·b)`, ...).
    Sinusoidal,
    /// Index-parameterised Bubble Universe map.
    BubbleUniverse,
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrenceKind::Sinusoidal => f.write_str("sinusoidal"),
            RecurrenceKind::BubbleUniverse => f.write_str("bubble-universe"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct CoefficientSet {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

/// Map-space bounds and the target extent used to derive the screen transform.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ViewportConfig {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    #[serde(default = "default_extent_x")]
    pub extent_x: f64,
    #[serde(default = "default_extent_y")]
    pub extent_y: f64,
    /// Multiplies both y bounds before the scale is derived.
    #[serde(default = "default_aspect")]
    pub aspect: f64,
    #[serde(default = "default_y_offset")]
    pub y_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Magnitude of the `a` push per step window; zero disables drift.
    pub gain: f64,
    /// Initial drift direction; only the sign is used.
    pub direction: f64,
    /// Initial phase `t`.
    pub phase: f64,
    pub phase_step: f64,
    pub a_min: f64,
    pub a_max: f64,
    pub epsilon: f64,
    /// Samples per drift update; defaults to one update per frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_window: Option<usize>,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            gain: 0.125,
            direction: 1.0,
            phase: 3.0,
            phase_step: 1.0 / 600.0,
            a_min: -43.9,
            a_max: 5.1,
            epsilon: 0.01,
            step_window: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackpressureConfig {
    /// Emitted points tolerated before the surface is cleared.
    pub threshold: u64,
    /// Fraction of the threshold after which the drift push engages.
    pub overdraw_ratio: f64,
    pub multiplier: f64,
}

impl Default for BackpressureConfig {
    fn default() -> Self {
        Self {
            threshold: 10_000_000,
            overdraw_ratio: 0.005,
            multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Sprite edge length in physical pixels.
    pub point_size: f32,
    pub sensitivity: f32,
    /// Stream each sample's predecessor alongside it.
    pub trails: bool,
    /// Keep drawing on top of previous frames; false clears every frame.
    pub accumulate: bool,
    pub background: [f32; 4],
    pub vsync: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glow_texture: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            point_size: 13.0,
            sensitivity: 10.0 / 255.0,
            trails: true,
            accumulate: true,
            background: [0.0, 0.2, 0.2, 0.0],
            vsync: true,
            glow_texture: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "ChaosGame".to_string(),
            width: 900,
            height: 750,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Stop rendering after this much wall time.
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        serialize_with = "serialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub run_for: Option<Duration>,
}

/// A complete, validated description of one attractor animation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PresetConfig {
    pub version: u32,
    pub name: String,
    pub recurrence: RecurrenceKind,
    pub particle_count: usize,
    #[serde(default = "default_seed")]
    pub seed: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coefficients: Option<CoefficientSet>,
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub drift: DriftConfig,
    #[serde(default)]
    pub backpressure: BackpressureConfig,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

fn default_seed() -> [f64; 2] {
    [0.1, 0.1]
}

fn default_extent_x() -> f64 {
    0.7
}

fn default_extent_y() -> f64 {
    1.35
}

fn default_aspect() -> f64 {
    1.0
}

fn default_y_offset() -> f64 {
    0.5
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration_opt<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => {
            serializer.serialize_str(&humantime::format_duration(*duration).to_string())
        }
        None => serializer.serialize_none(),
    }
}

/// Parses a human-readable duration such as `10s` or `1m 30s`.
pub fn parse_duration(raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw.trim())
        .map_err(|err| ConfigError::Invalid(format!("invalid duration '{raw}': {err}")))
}

/// Names of the presets compiled into the binary.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_PRESETS.iter().map(|(name, _)| *name)
}

/// Raw TOML of a built-in preset.
pub fn builtin_source(name: &str) -> Option<&'static str> {
    BUILTIN_PRESETS
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, source)| *source)
}

pub fn builtin(name: &str) -> Result<PresetConfig, ConfigError> {
    let source =
        builtin_source(name).ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))?;
    PresetConfig::from_toml_str(source)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|value| value.is_finite())
}

impl PresetConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: PresetConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Samples between two drift updates.
    pub fn step_window(&self) -> usize {
        self.drift.step_window.unwrap_or(self.particle_count)
    }

    /// Emission count above which the drift push engages.
    pub fn drift_push_level(&self) -> u64 {
        let level = self.backpressure.threshold as f64
            * self.backpressure.overdraw_ratio
            * self.backpressure.multiplier;
        level.max(0.0) as u64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(invalid(format!(
                "unsupported preset version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        if self.name.trim().is_empty() {
            return Err(invalid("preset name must not be empty"));
        }

        if self.particle_count == 0 {
            return Err(invalid("particle_count must be greater than zero"));
        }
        if self.particle_count > MAX_PARTICLES {
            return Err(invalid(format!(
                "particle_count {} exceeds the supported maximum of {MAX_PARTICLES}",
                self.particle_count
            )));
        }

        if !all_finite(&self.seed) {
            return Err(invalid("seed must be finite"));
        }

        self.validate_coefficients()?;
        self.validate_viewport()?;
        self.validate_drift()?;
        self.validate_backpressure()?;
        self.validate_render()?;
        self.validate_screen_range()?;

        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid(format!(
                "window size {}x{} is zero-sized",
                self.window.width, self.window.height
            )));
        }

        if let Some(run_for) = self.session.run_for {
            if run_for.is_zero() {
                return Err(invalid("session.run_for must be greater than zero"));
            }
        }

        Ok(())
    }

    fn validate_coefficients(&self) -> Result<(), ConfigError> {
        match (self.recurrence, self.coefficients) {
            (RecurrenceKind::Sinusoidal, None) => Err(invalid(
                "sinusoidal recurrence requires a [coefficients] table",
            )),
            (_, Some(set)) if !all_finite(&[set.a, set.b, set.c, set.d]) => {
                Err(invalid("coefficients must be finite"))
            }
            (RecurrenceKind::Sinusoidal, Some(set)) => {
                if set.a == 0.0 {
                    return Err(invalid(
                        "coefficient a must be non-zero; the y update would collapse to zero",
                    ));
                }
                if set.b == 0.0 {
                    return Err(invalid(
                        "coefficient b must be non-zero; the x update would collapse to zero",
                    ));
                }
                Ok(())
            }
            (RecurrenceKind::BubbleUniverse, _) => Ok(()),
        }
    }

    fn validate_viewport(&self) -> Result<(), ConfigError> {
        let view = &self.viewport;
        if !all_finite(&[
            view.min_x,
            view.min_y,
            view.max_x,
            view.max_y,
            view.extent_x,
            view.extent_y,
            view.aspect,
            view.y_offset,
        ]) {
            return Err(invalid("viewport values must be finite"));
        }
        if view.max_x <= view.min_x || view.max_y <= view.min_y {
            return Err(invalid(format!(
                "viewport [{}, {}]x[{}, {}] is zero-sized",
                view.min_x, view.max_x, view.min_y, view.max_y
            )));
        }
        if view.extent_x <= 0.0 || view.extent_y <= 0.0 {
            return Err(invalid("viewport extents must be greater than zero"));
        }
        if view.aspect <= 0.0 {
            return Err(invalid("viewport aspect must be greater than zero"));
        }
        Ok(())
    }

    /// Rejects viewports that would map reachable attractor points outside `f32`.
    fn validate_screen_range(&self) -> Result<(), ConfigError> {
        let view = &self.viewport;
        let (reach_x, reach_y) = match (self.recurrence, self.coefficients) {
            (RecurrenceKind::Sinusoidal, Some(set)) => (1.0 + set.c.abs(), 1.0 + set.d.abs()),
            (RecurrenceKind::Sinusoidal, None) => (1.0, 1.0),
            (RecurrenceKind::BubbleUniverse, _) => (2.0, 2.0),
        };
        let reach_x = reach_x.max(self.seed[0].abs());
        let reach_y = reach_y.max(self.seed[1].abs());

        let min_y = view.min_y * view.aspect;
        let scale_x = 2.0 * view.extent_x / (view.max_x - view.min_x);
        let scale_y = view.extent_y / (view.max_y * view.aspect - min_y);
        let span_x = (reach_x + view.min_x.abs() + 0.5) * scale_x;
        let span_y = (reach_y + min_y.abs() + 0.5) * scale_y + view.y_offset.abs();

        let limit = f64::from(f32::MAX);
        if !span_x.is_finite() || !span_y.is_finite() || span_x > limit || span_y > limit {
            return Err(invalid(format!(
                "viewport maps attractor points to |x| <= {span_x:e}, |y| <= {span_y:e}, \
                 beyond the single-precision range"
            )));
        }
        Ok(())
    }

    fn validate_drift(&self) -> Result<(), ConfigError> {
        let drift = &self.drift;
        if !all_finite(&[
            drift.gain,
            drift.direction,
            drift.phase,
            drift.phase_step,
            drift.a_min,
            drift.a_max,
            drift.epsilon,
        ]) {
            return Err(invalid("drift values must be finite"));
        }
        if drift.direction == 0.0 {
            return Err(invalid("drift direction must be non-zero"));
        }
        if drift.epsilon < 0.0 {
            return Err(invalid("drift epsilon must be non-negative"));
        }
        if drift.step_window == Some(0) {
            return Err(invalid("drift step_window must be greater than zero"));
        }

        let drifting = drift.gain != 0.0 && self.recurrence == RecurrenceKind::Sinusoidal;
        if !drifting {
            return Ok(());
        }

        let low = drift.a_min + drift.epsilon;
        let high = drift.a_max - drift.epsilon;
        if high - low <= 2.0 * drift.gain.abs() {
            return Err(invalid(format!(
                "drift bounds [{}, {}] are too narrow for gain {}",
                drift.a_min, drift.a_max, drift.gain
            )));
        }
        if let Some(set) = self.coefficients {
            if set.a < low || set.a > high {
                return Err(invalid(format!(
                    "coefficient a = {} lies outside the drift bounds [{low}, {high}]",
                    set.a
                )));
            }
        }
        Ok(())
    }

    fn validate_backpressure(&self) -> Result<(), ConfigError> {
        let bp = &self.backpressure;
        if bp.threshold == 0 {
            return Err(invalid("backpressure threshold must be greater than zero"));
        }
        if !bp.overdraw_ratio.is_finite() || bp.overdraw_ratio <= 0.0 {
            return Err(invalid("backpressure overdraw_ratio must be positive"));
        }
        if !bp.multiplier.is_finite() || bp.multiplier <= 0.0 {
            return Err(invalid("backpressure multiplier must be positive"));
        }
        Ok(())
    }

    fn validate_render(&self) -> Result<(), ConfigError> {
        let render = &self.render;
        if !render.point_size.is_finite() || render.point_size <= 0.0 {
            return Err(invalid("render point_size must be positive"));
        }
        if !render.sensitivity.is_finite() || render.sensitivity < 0.0 {
            return Err(invalid("render sensitivity must be non-negative"));
        }
        if render.background.iter().any(|channel| !channel.is_finite()) {
            return Err(invalid("render background must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
version = 1
name = "minimal"
recurrence = "sinusoidal"
particle_count = 1000

[coefficients]
a = -0.976918
b = 2.870979
c = 0.718145
d = 0.642928

[viewport]
min_x = 0.5
min_y = 1.1
max_x = 3.0
max_y = 2.975
"#;

    #[test]
    fn parses_builtin_presets() {
        for name in builtin_names() {
            let preset = builtin(name).expect("builtin preset");
            assert_eq!(preset.name, name);
        }
        let dream = builtin("dream").unwrap();
        assert_eq!(dream.recurrence, RecurrenceKind::Sinusoidal);
        assert_eq!(dream.particle_count, 330_720);
        assert_eq!(dream.step_window(), 330_720);
        let bubble = builtin("Bubble").unwrap();
        assert_eq!(bubble.recurrence, RecurrenceKind::BubbleUniverse);
        assert!(!bubble.render.accumulate);
    }

    #[test]
    fn fills_defaults_for_minimal_preset() {
        let preset = PresetConfig::from_toml_str(MINIMAL).expect("parse preset");
        assert_eq!(preset.seed, [0.1, 0.1]);
        assert_eq!(preset.drift, DriftConfig::default());
        assert_eq!(preset.backpressure.threshold, 10_000_000);
        assert_eq!(preset.drift_push_level(), 150_000);
        assert_eq!(preset.window.width, 900);
        assert!(preset.session.run_for.is_none());
    }

    #[test]
    fn rejects_zero_frequency() {
        let source = MINIMAL.replace("a = -0.976918", "a = 0.0");
        let err = PresetConfig::from_toml_str(&source).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ref message) if message.contains("coefficient a")
        ));
    }

    #[test]
    fn rejects_missing_coefficients_for_sinusoidal() {
        let source = r#"
version = 1
name = "broken"
recurrence = "sinusoidal"
particle_count = 10

[viewport]
min_x = 0.0
min_y = 0.0
max_x = 1.0
max_y = 1.0
"#;
        let err = PresetConfig::from_toml_str(source).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_sized_viewport() {
        let source = MINIMAL.replace("max_x = 3.0", "max_x = 0.5");
        let err = PresetConfig::from_toml_str(&source).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref message) if message.contains("zero-sized")));
    }

    #[test]
    fn rejects_zero_particles() {
        let source = MINIMAL.replace("particle_count = 1000", "particle_count = 0");
        assert!(PresetConfig::from_toml_str(&source).is_err());
    }

    #[test]
    fn rejects_viewports_beyond_single_precision() {
        let huge_c = MINIMAL.replace("c = 0.718145", "c = 1e39");
        let err = PresetConfig::from_toml_str(&huge_c).unwrap_err();
        assert!(err.to_string().contains("single-precision"), "{err}");

        let sliver = MINIMAL.replace("max_x = 3.0", "max_x = 0.5000000000000001");
        assert!(PresetConfig::from_toml_str(&sliver).is_ok());

        let far_seed = MINIMAL.replace(
            "particle_count = 1000",
            "particle_count = 1000\nseed = [1e300, 0.1]",
        );
        assert!(PresetConfig::from_toml_str(&far_seed).is_err());
    }

    #[test]
    fn rejects_narrow_drift_bounds() {
        let source = format!("{MINIMAL}\n[drift]\ngain = 1.0\na_min = -1.5\na_max = 0.0\n");
        let err = PresetConfig::from_toml_str(&source).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref message) if message.contains("too narrow")));
    }

    #[test]
    fn rejects_initial_a_outside_bounds() {
        let source = format!("{MINIMAL}\n[drift]\na_min = 0.0\na_max = 10.0\n");
        assert!(PresetConfig::from_toml_str(&source).is_err());
    }

    #[test]
    fn parses_human_readable_run_limit() {
        let source = format!("{MINIMAL}\n[session]\nrun_for = \"1m 30s\"\n");
        let preset = PresetConfig::from_toml_str(&source).unwrap();
        assert_eq!(preset.session.run_for, Some(Duration::from_secs(90)));

        let numeric = format!("{MINIMAL}\n[session]\nrun_for = 10\n");
        let preset = PresetConfig::from_toml_str(&numeric).unwrap();
        assert_eq!(preset.session.run_for, Some(Duration::from_secs(10)));
    }

    #[test]
    fn reports_unknown_builtin() {
        let err = builtin("missing").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPreset(ref name) if name == "missing"));
    }

    #[test]
    fn loads_preset_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, MINIMAL).unwrap();
        let preset = PresetConfig::from_path(&path).unwrap();
        assert_eq!(preset.name, "minimal");

        let missing = dir.path().join("absent.toml");
        let err = PresetConfig::from_path(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert!(parse_duration("soon").is_err());
    }
}
