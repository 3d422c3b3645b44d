//! User settings, stored as `settings.toml` in the platform preference directory.
//!
//! Every field is optional in the file; anything missing takes the canvas default.

use telescope_core::{
    color::Color,
    config::{BrushConfig, CanvasConfig, FrameConfig, RenderTiers, TileConfig},
    units::Resolution,
};

const DOCUMENTATION: &str = r"# Telescope settings. You may edit this file, but be aware that formatting and comments will not
# be preserved. Missing values take their defaults.

";

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FrameSettings {
    pub drill_down_zoom: f64,
    pub pop_up_zoom: f64,
    pub reentry_radius: f64,
    pub max_magnification: f64,
    pub min_root_zoom: f64,
}
impl Default for FrameSettings {
    fn default() -> Self {
        let FrameConfig {
            drill_down_zoom,
            pop_up_zoom,
            reentry_radius,
            max_magnification,
            min_root_zoom,
        } = FrameConfig::default();
        Self {
            drill_down_zoom,
            pop_up_zoom,
            reentry_radius,
            max_magnification,
            min_root_zoom,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TileSettings {
    pub enabled: bool,
    pub tile_world_size: f64,
    pub texture_size: u32,
    pub zoom_band: [f64; 2],
    pub max_bakes_per_tick: usize,
}
impl Default for TileSettings {
    fn default() -> Self {
        let tiles = TileConfig::default();
        Self {
            enabled: tiles.enabled,
            tile_world_size: tiles.tile_world_size,
            texture_size: tiles.texture_size,
            zoom_band: [tiles.zoom_band.0, tiles.zoom_band.1],
            max_bakes_per_tick: tiles.max_bakes_per_tick,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BrushSettings {
    pub width_px: f32,
    /// sRGB, 0-255.
    pub color: [u8; 4],
    pub smoothing_subdivisions: usize,
    pub min_point_spacing_px: f64,
}
impl Default for BrushSettings {
    fn default() -> Self {
        let brush = BrushConfig::default();
        Self {
            width_px: brush.width_px,
            color: [0, 0, 0, 255],
            smoothing_subdivisions: brush.smoothing_subdivisions,
            min_point_spacing_px: brush.min_point_spacing_px,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputSettings {
    pub finger_draws: bool,
    /// Degrees two fingers must twist before rotation kicks in.
    pub rotation_slop_degrees: f32,
}
impl Default for InputSettings {
    fn default() -> Self {
        Self {
            finger_draws: CanvasConfig::default().finger_draws,
            rotation_slop_degrees: 10.0,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RenderSettings {
    pub max_chunk_vertices: u32,
    pub draw_parent: bool,
    pub draw_children: bool,
    pub draw_live: bool,
    pub dpi: f32,
}
impl Default for RenderSettings {
    fn default() -> Self {
        let config = CanvasConfig::default();
        Self {
            max_chunk_vertices: config.max_chunk_vertices,
            draw_parent: true,
            draw_children: true,
            draw_live: true,
            dpi: config.resolution.into_dpi(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub frames: FrameSettings,
    pub tiles: TileSettings,
    pub brush: BrushSettings,
    pub input: InputSettings,
    pub render: RenderSettings,
}
impl Settings {
    const FILENAME: &'static str = "settings.toml";
    /// Load from the preference dir, or defaults with a warning if that fails.
    #[must_use]
    pub fn load_or_default() -> Self {
        let Some(mut path) = preferences_dir() else {
            log::warn!("no preferences dir, using default settings");
            return Self::default();
        };
        path.push(Self::FILENAME);
        if !path.exists() {
            log::info!("no settings at {path:?}, using defaults");
            return Self::default();
        }
        match Self::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("failed to read settings {path:?}, using defaults: {e:#}");
                Self::default()
            }
        }
    }
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let settings: anyhow::Result<Self> = try_block::try_block! {
            let string = std::fs::read_to_string(path)?;
            let settings: Self = toml::from_str(&string)?;
            Ok(settings)
        };
        settings
    }
    pub fn save(&self) -> anyhow::Result<()> {
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        let string = DOCUMENTATION.to_owned() + &toml::ser::to_string_pretty(self)?;
        std::fs::write(preferences, string)?;
        Ok(())
    }
    #[must_use]
    pub fn rotation_slop(&self) -> f32 {
        self.input.rotation_slop_degrees.to_radians()
    }
}

impl From<&Settings> for CanvasConfig {
    fn from(settings: &Settings) -> Self {
        let FrameSettings {
            drill_down_zoom,
            pop_up_zoom,
            reentry_radius,
            max_magnification,
            min_root_zoom,
        } = settings.frames.clone();
        let mut tiers = RenderTiers::ACTIVE;
        tiers.set(RenderTiers::PARENT, settings.render.draw_parent);
        tiers.set(RenderTiers::CHILDREN, settings.render.draw_children);
        tiers.set(RenderTiers::LIVE, settings.render.draw_live);

        Self {
            frames: FrameConfig {
                drill_down_zoom,
                pop_up_zoom,
                reentry_radius,
                max_magnification,
                min_root_zoom,
            },
            tiles: TileConfig {
                enabled: settings.tiles.enabled,
                tile_world_size: settings.tiles.tile_world_size,
                texture_size: settings.tiles.texture_size,
                zoom_band: (settings.tiles.zoom_band[0], settings.tiles.zoom_band[1]),
                max_bakes_per_tick: settings.tiles.max_bakes_per_tick,
            },
            brush: BrushConfig {
                width_px: settings.brush.width_px,
                color: Color::from_srgba8(settings.brush.color),
                smoothing_subdivisions: settings.brush.smoothing_subdivisions,
                min_point_spacing_px: settings.brush.min_point_spacing_px,
            },
            max_chunk_vertices: settings.render.max_chunk_vertices,
            finger_draws: settings.input.finger_draws,
            tiers,
            resolution: Resolution::Dpi(settings.render.dpi),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let settings: Settings = toml::from_str(
            r"
            [frames]
            drill_down_zoom = 500.0

            [input]
            finger_draws = true
            ",
        )
        .unwrap();
        assert_eq!(settings.frames.drill_down_zoom, 500.0);
        assert_eq!(settings.frames.pop_up_zoom, FrameSettings::default().pop_up_zoom);
        assert!(settings.input.finger_draws);
        assert_eq!(settings.tiles, TileSettings::default());

        let config = CanvasConfig::from(&settings);
        assert_eq!(config.frames.drill_down_zoom, 500.0);
        assert!(config.finger_draws);
        assert_eq!(config.tiers, RenderTiers::all());
    }
    #[test]
    fn defaults_match_canvas() {
        let config = CanvasConfig::from(&Settings::default());
        let canvas = CanvasConfig::default();
        assert_eq!(config.frames.drill_down_zoom, canvas.frames.drill_down_zoom);
        assert_eq!(config.frames.reentry_radius, canvas.frames.reentry_radius);
        assert_eq!(config.tiles.zoom_band, canvas.tiles.zoom_band);
        assert_eq!(config.max_chunk_vertices, canvas.max_chunk_vertices);
        assert_eq!(config.brush.color, canvas.brush.color);
        assert_eq!(config.resolution, canvas.resolution);
    }
    #[test]
    fn disabled_tiers() {
        let mut settings = Settings::default();
        settings.render.draw_parent = false;
        settings.render.draw_live = false;
        let config = CanvasConfig::from(&settings);
        assert_eq!(config.tiers, RenderTiers::ACTIVE | RenderTiers::CHILDREN);
    }
    #[test]
    fn round_trips_through_toml() {
        let mut settings = Settings::default();
        settings.brush.width_px = 7.5;
        settings.tiles.zoom_band = [0.25, 4.0];
        let text = toml::ser::to_string_pretty(&settings).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }
    #[test]
    fn malformed_file_is_an_error() {
        assert!(toml::from_str::<Settings>("[frames]\ndrill_down_zoom = \"lots\"").is_err());
    }
}
