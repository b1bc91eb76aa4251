//! Mode catalog: the three interval kinds, their durations and themes.
//!
//! The catalog is persisted under the `modeSettings` key as a map from mode
//! id to definition. Loading validates the map against the fixed id set, so
//! every [`ModeId`] can be looked up without failing afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Default number of focus sessions between long breaks.
pub const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModeId {
    #[default]
    Pomodoro,
    ShortBreak,
    LongBreak,
}

impl ModeId {
    pub const ALL: [ModeId; 3] = [ModeId::Pomodoro, ModeId::ShortBreak, ModeId::LongBreak];

    pub fn as_str(self) -> &'static str {
        match self {
            ModeId::Pomodoro => "pomodoro",
            ModeId::ShortBreak => "shortBreak",
            ModeId::LongBreak => "longBreak",
        }
    }

    fn index(self) -> usize {
        match self {
            ModeId::Pomodoro => 0,
            ModeId::ShortBreak => 1,
            ModeId::LongBreak => 2,
        }
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        ModeId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| CoreError::UnknownMode(s.to_string()))
    }
}

/// Colors applied by the render sink while a mode is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub accent: String,
    pub accent_soft: String,
    #[serde(alias = "pageBackground")]
    pub background_color: String,
}

impl Theme {
    fn new(accent: &str, accent_soft: &str, background_color: &str) -> Self {
        Self {
            accent: accent.into(),
            accent_soft: accent_soft.into(),
            background_color: background_color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeDefinition {
    /// Overwritten from the map key on load.
    #[serde(default)]
    pub id: ModeId,
    pub label: String,
    #[serde(alias = "duration")]
    pub duration_seconds: u64,
    pub theme: Theme,
}

impl ModeDefinition {
    pub fn default_for(id: ModeId) -> Self {
        match id {
            ModeId::Pomodoro => Self {
                id,
                label: "Pomodoro".into(),
                duration_seconds: 25 * 60,
                theme: Theme::new("#E85D60", "#FFEBE9", "#DB2955"),
            },
            ModeId::ShortBreak => Self {
                id,
                label: "Short Break".into(),
                duration_seconds: 5 * 60,
                theme: Theme::new("#4ABDAC", "#DFF6F0", "#7FB285"),
            },
            ModeId::LongBreak => Self {
                id,
                label: "Long Break".into(),
                duration_seconds: 10 * 60,
                theme: Theme::new("#5995FF", "#DDE9FB", "#5BC0EB"),
            },
        }
    }
}

/// Persisted shape of the catalog.
pub type ModeSettings = BTreeMap<String, ModeDefinition>;

/// Validated set of exactly three mode definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeCatalog {
    modes: [ModeDefinition; 3],
    long_break_interval: u32,
}

impl Default for ModeCatalog {
    fn default() -> Self {
        Self {
            modes: ModeId::ALL.map(ModeDefinition::default_for),
            long_break_interval: DEFAULT_LONG_BREAK_INTERVAL,
        }
    }
}

impl ModeCatalog {
    /// Build a catalog from a persisted `modeSettings` map.
    ///
    /// # Errors
    /// `UnknownMode` for keys outside the fixed set, `InvalidMode` when a mode
    /// is missing or has a zero duration.
    pub fn from_settings(settings: ModeSettings) -> Result<Self> {
        let mut slots: [Option<ModeDefinition>; 3] = [None, None, None];
        for (key, mut def) in settings {
            let id: ModeId = key.parse()?;
            if def.duration_seconds == 0 {
                return Err(CoreError::InvalidMode(format!(
                    "duration of '{id}' must be greater than zero"
                )));
            }
            def.id = id;
            slots[id.index()] = Some(def);
        }

        let [pomodoro, short_break, long_break] = slots;
        let missing = |id: ModeId| CoreError::InvalidMode(format!("missing mode '{id}'"));
        Ok(Self {
            modes: [
                pomodoro.ok_or_else(|| missing(ModeId::Pomodoro))?,
                short_break.ok_or_else(|| missing(ModeId::ShortBreak))?,
                long_break.ok_or_else(|| missing(ModeId::LongBreak))?,
            ],
            long_break_interval: DEFAULT_LONG_BREAK_INTERVAL,
        })
    }

    pub fn settings(&self) -> ModeSettings {
        self.modes
            .iter()
            .map(|def| (def.id.as_str().to_string(), def.clone()))
            .collect()
    }

    /// Sets how many focus sessions separate long breaks. Zero is rejected.
    pub fn with_long_break_interval(mut self, interval: u32) -> Result<Self> {
        if interval == 0 {
            return Err(CoreError::InvalidMode(
                "long break interval must be greater than zero".into(),
            ));
        }
        self.long_break_interval = interval;
        Ok(self)
    }

    pub fn long_break_interval(&self) -> u32 {
        self.long_break_interval
    }

    /// Look up a mode by its textual id.
    pub fn get(&self, mode_id: &str) -> Result<&ModeDefinition> {
        let id: ModeId = mode_id.parse()?;
        Ok(self.mode(id))
    }

    pub fn mode(&self, id: ModeId) -> &ModeDefinition {
        &self.modes[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModeDefinition> {
        self.modes.iter()
    }

    pub fn set_duration(&mut self, id: ModeId, duration_seconds: u64) -> Result<()> {
        if duration_seconds == 0 {
            return Err(CoreError::InvalidMode(format!(
                "duration of '{id}' must be greater than zero"
            )));
        }
        self.modes[id.index()].duration_seconds = duration_seconds;
        Ok(())
    }

    pub fn set_label(&mut self, id: ModeId, label: impl Into<String>) {
        self.modes[id.index()].label = label.into();
    }

    /// Cycle policy. Returns the next mode and the updated cycle counter.
    ///
    /// Breaks always return to a pomodoro. A finished pomodoro bumps the
    /// counter and earns a long break on every `long_break_interval`th cycle.
    pub fn next(&self, current: ModeId, cycles_completed: u32) -> (ModeId, u32) {
        if current != ModeId::Pomodoro {
            return (ModeId::Pomodoro, cycles_completed);
        }
        let cycles = cycles_completed.saturating_add(1);
        if cycles % self.long_break_interval == 0 {
            (ModeId::LongBreak, cycles)
        } else {
            (ModeId::ShortBreak, cycles)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_matches_known_ids() {
        let catalog = ModeCatalog::default();
        assert_eq!(catalog.mode(ModeId::Pomodoro).duration_seconds, 1500);
        assert_eq!(catalog.mode(ModeId::ShortBreak).label, "Short Break");
        assert_eq!(catalog.mode(ModeId::LongBreak).duration_seconds, 600);
        for id in ModeId::ALL {
            assert_eq!(catalog.mode(id).id, id);
        }
    }

    #[test]
    fn get_rejects_unknown_mode() {
        let catalog = ModeCatalog::default();
        assert_eq!(catalog.get("longBreak").unwrap().label, "Long Break");
        let err = catalog.get("nap").unwrap_err();
        assert!(matches!(err, CoreError::UnknownMode(ref id) if id == "nap"));
    }

    #[test]
    fn next_after_break_is_pomodoro() {
        let catalog = ModeCatalog::default();
        assert_eq!(catalog.next(ModeId::ShortBreak, 2), (ModeId::Pomodoro, 2));
        assert_eq!(catalog.next(ModeId::LongBreak, 4), (ModeId::Pomodoro, 4));
    }

    #[test]
    fn next_after_pomodoro_picks_break_by_cycle() {
        let catalog = ModeCatalog::default();
        assert_eq!(catalog.next(ModeId::Pomodoro, 0), (ModeId::ShortBreak, 1));
        assert_eq!(catalog.next(ModeId::Pomodoro, 1), (ModeId::ShortBreak, 2));
        assert_eq!(catalog.next(ModeId::Pomodoro, 2), (ModeId::ShortBreak, 3));
        assert_eq!(catalog.next(ModeId::Pomodoro, 3), (ModeId::LongBreak, 4));
        assert_eq!(catalog.next(ModeId::Pomodoro, 7), (ModeId::LongBreak, 8));
    }

    #[test]
    fn custom_long_break_interval() {
        let catalog = ModeCatalog::default().with_long_break_interval(2).unwrap();
        assert_eq!(catalog.next(ModeId::Pomodoro, 1), (ModeId::LongBreak, 2));
        assert!(ModeCatalog::default().with_long_break_interval(0).is_err());
    }

    #[test]
    fn settings_roundtrip_through_json() {
        let catalog = ModeCatalog::default();
        let json = serde_json::to_string(&catalog.settings()).unwrap();
        let parsed: ModeSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(ModeCatalog::from_settings(parsed).unwrap(), catalog);
    }

    #[test]
    fn from_settings_accepts_legacy_field_names() {
        let json = r##"{
            "pomodoro": {"label": "Focus", "duration": 1200,
                "theme": {"accent": "#E85D60", "accentSoft": "#FFEBE9", "pageBackground": "#DB2955"}},
            "shortBreak": {"label": "Short Break", "duration": 300,
                "theme": {"accent": "#4ABDAC", "accentSoft": "#DFF6F0", "pageBackground": "#7FB285"}},
            "longBreak": {"label": "Long Break", "duration": 600,
                "theme": {"accent": "#5995FF", "accentSoft": "#DDE9FB", "pageBackground": "#5BC0EB"}}
        }"##;
        let settings: ModeSettings = serde_json::from_str(json).unwrap();
        let catalog = ModeCatalog::from_settings(settings).unwrap();
        let focus = catalog.mode(ModeId::Pomodoro);
        assert_eq!(focus.label, "Focus");
        assert_eq!(focus.duration_seconds, 1200);
        assert_eq!(focus.theme.background_color, "#DB2955");
    }

    #[test]
    fn from_settings_rejects_missing_unknown_and_zero() {
        let mut settings = ModeCatalog::default().settings();
        settings.remove("longBreak");
        assert!(matches!(
            ModeCatalog::from_settings(settings),
            Err(CoreError::InvalidMode(_))
        ));

        let mut settings = ModeCatalog::default().settings();
        settings.insert("nap".into(), ModeDefinition::default_for(ModeId::ShortBreak));
        assert!(matches!(
            ModeCatalog::from_settings(settings),
            Err(CoreError::UnknownMode(_))
        ));

        let mut settings = ModeCatalog::default().settings();
        if let Some(def) = settings.get_mut("pomodoro") {
            def.duration_seconds = 0;
        }
        assert!(ModeCatalog::from_settings(settings).is_err());
    }

    #[test]
    fn set_duration_rejects_zero() {
        let mut catalog = ModeCatalog::default();
        catalog.set_duration(ModeId::Pomodoro, 25).unwrap();
        assert_eq!(catalog.mode(ModeId::Pomodoro).duration_seconds, 25);
        assert!(catalog.set_duration(ModeId::Pomodoro, 0).is_err());
    }
}
