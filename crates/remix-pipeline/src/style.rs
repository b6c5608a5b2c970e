/// Preset remix styles and the user's style selection
use serde::{Deserialize, Serialize};

/// Fixed remix profile with an associated target BPM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StylePreset {
    House,
    Techno,
    Trance,
    DrumNBass,
}

impl StylePreset {
    /// All presets in display order.
    pub const ALL: [StylePreset; 4] = [
        StylePreset::House,
        StylePreset::Techno,
        StylePreset::Trance,
        StylePreset::DrumNBass,
    ];

    /// Stable wire/id string.
    pub fn id(&self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Techno => "techno",
            Self::Trance => "trance",
            Self::DrumNBass => "drum-n-bass",
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::House => "House Vibes",
            Self::Techno => "Techno Drive",
            Self::Trance => "Trance Journey",
            Self::DrumNBass => "Drum & Bass",
        }
    }

    /// Short description for pickers.
    pub fn description(&self) -> &'static str {
        match self {
            Self::House => "Classic house groove, four-on-the-floor, party energy",
            Self::Techno => "Hard techno drive, pounding kicks, underground club",
            Self::Trance => "Hypnotic trance atmosphere, layered melodic builds",
            Self::DrumNBass => "High-speed D&B, broken beats, bursts of energy",
        }
    }

    /// Default target BPM for this preset.
    pub fn bpm(&self) -> u32 {
        match self {
            Self::House => 124,
            Self::Techno => 138,
            Self::Trance => 140,
            Self::DrumNBass => 174,
        }
    }

    /// Parse from the stable id string.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "house" => Some(Self::House),
            "techno" => Some(Self::Techno),
            "trance" => Some(Self::Trance),
            "drum-n-bass" | "dnb" => Some(Self::DrumNBass),
            _ => None,
        }
    }
}

impl std::fmt::Display for StylePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Output container for the rendered remix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp3,
    Wav,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn ext(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Mp3
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.ext())
    }
}

/// The user's current style choice. Mutable until job submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleSelection {
    /// Chosen preset, if any.
    pub preset: Option<StylePreset>,

    /// Target BPM override; falls back to the preset default.
    pub target_bpm: Option<u32>,

    /// Free-text style description.
    pub style_text: String,
}

impl StyleSelection {
    /// Effective target BPM (override, then preset default).
    pub fn effective_bpm(&self) -> Option<u32> {
        self.target_bpm.or_else(|| self.preset.map(|p| p.bpm()))
    }

    /// At least one style signal (preset or non-empty text) is present.
    pub fn has_signal(&self) -> bool {
        self.preset.is_some() || !self.style_text.trim().is_empty()
    }
}
