use skypaint_core::canvas::CanvasConfig;
use skypaint_core::store::ProjectionPlane;
use ultraviolet::Vec3;

const DOCUMENTATION: &str = r#"# Skypaint settings. You may edit this file, but be aware that formatting and comments will not
# be preserved. Missing keys take their default value.

# [canvas] tunes live capture and erasing. Distances are in meters.
# [store] says where drawings are saved, and how their thumbnails are made. Saved points are
# relative to `origin`, and thumbnails are `thumbnail_size * display_scale` pixels square.

"#;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Where saves go. Defaults to `StrokeCanvas` in the user's documents.
    pub root: Option<std::path::PathBuf>,
    pub origin: Vec3,
    pub thumbnail_size: u32,
    pub display_scale: f32,
    pub plane: ProjectionPlane,
}
impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            root: None,
            origin: Vec3::one(),
            thumbnail_size: 256,
            display_scale: 1.0,
            plane: ProjectionPlane::default(),
        }
    }
}
impl StoreSettings {
    const DEFAULT_DIR: &'static str = "StrokeCanvas";
    /// The configured root, else the default one. `None` if there's no documents dir.
    #[must_use]
    pub fn root(&self) -> Option<std::path::PathBuf> {
        self.root
            .clone()
            .or_else(|| Some(dirs::document_dir()?.join(Self::DEFAULT_DIR)))
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    pub canvas: CanvasConfig,
    pub store: StoreSettings,
}
impl Settings {
    const FILENAME: &'static str = "settings.toml";
    /// Where the user's settings live, if there is a preferences dir.
    #[must_use]
    pub fn path() -> Option<std::path::PathBuf> {
        let mut path = preferences_dir()?;
        path.push(Self::FILENAME);
        Some(path)
    }
    /// Load the user's settings, or defaults if unavailable for some reason.
    /// The flag is true if loading failed.
    #[must_use]
    pub fn load() -> (Self, bool) {
        match Self::path() {
            None => {
                log::warn!("No preferences dir, using default settings.");
                (Self::default(), true)
            }
            Some(path) => Self::load_or_default(&path),
        }
    }
    #[must_use]
    pub fn load_or_default(path: &std::path::Path) -> (Self, bool) {
        let settings: anyhow::Result<Self> = try_block::try_block! {
            let string = std::fs::read_to_string(path)?;
            let settings: Self = toml::from_str(&string)?;
            Ok(settings)
        };
        match settings {
            Ok(settings) => (settings, false),
            Err(e) => {
                log::warn!("Settings at {} weren't available, defaulting: {e:#}", path.display());
                (Self::default(), true)
            }
        }
    }
    pub fn save(&self) -> anyhow::Result<()> {
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        // Not recursive. If the parent is missing, the user probably has a good reason.
        let _ = std::fs::DirBuilder::new().create(&preferences);
        preferences.push(Self::FILENAME);
        self.save_to(&preferences)
    }
    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let string = DOCUMENTATION.to_owned() + &toml::ser::to_string_pretty(self)?;
        std::fs::write(path, string)?;
        Ok(())
    }
}
