//! Action catalog loaded from an INI file.
//!
//! The catalog names the actions the demo world spawns and carries the
//! settings of each one, plus a `[simulation]` section describing the run.
//!
//! # Configuration File Format
//!
//! ```ini
//! [simulation]
//! world = game
//! fps = 60
//! seconds = 10
//! time_scale = 1.0
//!
//! [action.dash]
//! allow_double_start = false
//! stop_when_active_started = true
//! can_tick = true
//! auto_enable_tick_while_active = true
//! allow_in_editor_preview = false
//! allow_in_level_editor = false
//! start_delay = 0.5
//! duration_override = 2.0
//! ```
//!
//! Missing keys keep their defaults. Invalid values are reported and ignored.

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};

use crate::components::actionsettings::ActionSettings;
use crate::resources::worldcontext::WorldKind;

/// Section name prefix of action entries.
pub const ACTION_SECTION_PREFIX: &str = "action.";
const SIMULATION_SECTION: &str = "simulation";

const DEFAULT_FPS: u32 = 60;
const DEFAULT_SECONDS: f32 = 10.0;
const DEFAULT_TIME_SCALE: f32 = 1.0;
const DEFAULT_CONFIG_PATH: &str = "./actions.ini";

/// How the demo world runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    pub world: WorldKind,
    /// Fixed frames per second of the headless loop.
    pub fps: u32,
    /// Simulated seconds before the loop stops.
    pub seconds: f32,
    pub time_scale: f32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            world: WorldKind::Game,
            fps: DEFAULT_FPS,
            seconds: DEFAULT_SECONDS,
            time_scale: DEFAULT_TIME_SCALE,
        }
    }
}

impl SimulationSettings {
    /// Frame delta in unscaled seconds.
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }
}

/// Named action settings, sorted by name.
#[derive(Resource, Debug, Clone)]
pub struct ActionCatalog {
    pub entries: Vec<(String, ActionSettings)>,
    pub simulation: SimulationSettings,
    pub config_path: PathBuf,
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionCatalog {
    /// Empty catalog reading from the default path.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            simulation: SimulationSettings::default(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// The catalog used when no configuration file is available.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert(
            "channel",
            ActionSettings::new()
                .with_tick(true, true)
                .with_duration_override(3.0),
        );
        catalog.insert(
            "dash",
            ActionSettings::new()
                .with_double_start(false)
                .with_tick(true, true)
                .with_start_delay(0.5)
                .with_duration_override(2.0),
        );
        catalog.insert(
            "inspect",
            ActionSettings::new()
                .with_level_editor(true)
                .with_editor_preview(true),
        );
        catalog.insert(
            "taunt",
            ActionSettings::new()
                .with_stop_when_active_started(false)
                .with_duration_override(1.0),
        );
        catalog
    }

    /// Insert or replace an entry, keeping names sorted.
    pub fn insert(&mut self, name: impl Into<String>, settings: ActionSettings) {
        let name = name.into();
        match self.entries.binary_search_by(|(n, _)| n.as_str().cmp(&name)) {
            Ok(index) => self.entries[index].1 = settings,
            Err(index) => self.entries.insert(index, (name, settings)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ActionSettings> {
        self.entries
            .binary_search_by(|(n, _)| n.as_str().cmp(name))
            .ok()
            .map(|index| &self.entries[index].1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load entries from the INI file at `config_path`.
    ///
    /// Sections already in the catalog are overwritten key by key.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load action config: {}", e))?;
        self.apply(&config);
        info!(
            "Loaded {} action(s) from {:?}",
            self.entries.len(),
            self.config_path
        );
        Ok(())
    }

    /// Load entries from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse action config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    /// Save the catalog to the INI file at `config_path`.
    pub fn save_to_file(&self) -> Result<(), String> {
        self.to_ini()
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save action config: {}", e))?;
        info!("Saved action config to {:?}", self.config_path);
        Ok(())
    }

    /// Render the catalog as INI text.
    pub fn to_ini_string(&self) -> String {
        self.to_ini().writes()
    }

    fn to_ini(&self) -> Ini {
        let mut config = Ini::new();
        let sim = &self.simulation;
        config.set(SIMULATION_SECTION, "world", Some(sim.world.to_string()));
        config.set(SIMULATION_SECTION, "fps", Some(sim.fps.to_string()));
        config.set(SIMULATION_SECTION, "seconds", Some(sim.seconds.to_string()));
        config.set(SIMULATION_SECTION, "time_scale", Some(sim.time_scale.to_string()));

        for (name, s) in &self.entries {
            let section = format!("{}{}", ACTION_SECTION_PREFIX, name);
            let values = [
                ("allow_double_start", s.allow_double_start.to_string()),
                ("stop_when_active_started", s.stop_when_active_started.to_string()),
                ("can_tick", s.can_tick.to_string()),
                (
                    "auto_enable_tick_while_active",
                    s.auto_enable_tick_while_active.to_string(),
                ),
                ("allow_in_editor_preview", s.allow_in_editor_preview.to_string()),
                ("allow_in_level_editor", s.allow_in_level_editor.to_string()),
                ("start_delay", s.start_delay.to_string()),
                ("duration_override", s.duration_override.to_string()),
            ];
            for (key, value) in values {
                config.set(&section, key, Some(value));
            }
        }
        config
    }

    fn apply(&mut self, config: &Ini) {
        self.apply_simulation(config);

        let mut sections = config.sections();
        sections.sort();
        for section in sections {
            let Some(name) = section.strip_prefix(ACTION_SECTION_PREFIX) else {
                continue;
            };
            if name.is_empty() {
                warn!("Ignoring action section without a name: [{}]", section);
                continue;
            }
            let mut settings = self.get(name).copied().unwrap_or_default();
            read_bool(config, &section, "allow_double_start", &mut settings.allow_double_start);
            read_bool(
                config,
                &section,
                "stop_when_active_started",
                &mut settings.stop_when_active_started,
            );
            read_bool(config, &section, "can_tick", &mut settings.can_tick);
            read_bool(
                config,
                &section,
                "auto_enable_tick_while_active",
                &mut settings.auto_enable_tick_while_active,
            );
            read_bool(
                config,
                &section,
                "allow_in_editor_preview",
                &mut settings.allow_in_editor_preview,
            );
            read_bool(
                config,
                &section,
                "allow_in_level_editor",
                &mut settings.allow_in_level_editor,
            );
            read_f32(config, &section, "start_delay", &mut settings.start_delay);
            read_f32(config, &section, "duration_override", &mut settings.duration_override);
            settings.sanitize();
            self.insert(name, settings);
        }
    }

    fn apply_simulation(&mut self, config: &Ini) {
        if let Some(world) = config.get(SIMULATION_SECTION, "world") {
            match world.parse::<WorldKind>() {
                Ok(kind) => self.simulation.world = kind,
                Err(e) => warn!("[{}] world: {}", SIMULATION_SECTION, e),
            }
        }
        match config.getuint(SIMULATION_SECTION, "fps") {
            Ok(Some(fps)) if fps > 0 => self.simulation.fps = fps as u32,
            Ok(Some(_)) => warn!("[{}] fps must be positive", SIMULATION_SECTION),
            Ok(None) => {}
            Err(e) => warn!("[{}] fps: {}", SIMULATION_SECTION, e),
        }
        read_f32(config, SIMULATION_SECTION, "seconds", &mut self.simulation.seconds);
        read_f32(config, SIMULATION_SECTION, "time_scale", &mut self.simulation.time_scale);
    }
}

fn read_bool(config: &Ini, section: &str, key: &str, target: &mut bool) {
    match config.getbool(section, key) {
        Ok(Some(value)) => *target = value,
        Ok(None) => {}
        Err(e) => warn!("[{}] {}: {}", section, key, e),
    }
}

fn read_f32(config: &Ini, section: &str, key: &str, target: &mut f32) {
    match config.getfloat(section, key) {
        Ok(Some(value)) => *target = value as f32,
        Ok(None) => {}
        Err(e) => warn!("[{}] {}: {}", section, key, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[simulation]
world = editor_preview
fps = 30
seconds = 4.5

[action.dash]
allow_double_start = false
can_tick = true
auto_enable_tick_while_active = true
start_delay = 0.5
duration_override = 2

[action.wave]
start_delay = -1

[unrelated]
foo = bar
"#;

    #[test]
    fn loads_actions_and_simulation() {
        let mut catalog = ActionCatalog::new();
        catalog.load_from_str(SAMPLE).unwrap();

        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["dash", "wave"]);
        let dash = catalog.get("dash").unwrap();
        assert!(!dash.allow_double_start);
        assert!(dash.stop_when_active_started);
        assert!(dash.can_tick);
        assert!(dash.auto_enable_tick_while_active);
        assert_eq!(dash.start_delay, 0.5);
        assert_eq!(dash.duration_override, 2.0);

        let wave = catalog.get("wave").unwrap();
        assert_eq!(wave.start_delay, 0.0);

        assert_eq!(catalog.simulation.world, WorldKind::EditorPreview);
        assert_eq!(catalog.simulation.fps, 30);
        assert_eq!(catalog.simulation.seconds, 4.5);
        assert_eq!(catalog.simulation.time_scale, 1.0);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let mut catalog = ActionCatalog::new();
        catalog
            .load_from_str("[action.odd]\ncan_tick = maybe\nduration_override = long\n")
            .unwrap();
        assert_eq!(catalog.get("odd"), Some(&ActionSettings::default()));
    }

    #[test]
    fn ini_text_round_trips_builtin_catalog() {
        let builtin = ActionCatalog::builtin();
        let mut reloaded = ActionCatalog::new();
        reloaded.load_from_str(&builtin.to_ini_string()).unwrap();
        assert_eq!(reloaded.entries, builtin.entries);
        assert_eq!(reloaded.simulation, builtin.simulation);
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut catalog = ActionCatalog::with_path("./does/not/exist.ini");
        assert!(catalog.load_from_file().is_err());
    }
}
