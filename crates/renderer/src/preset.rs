use std::fmt;
use std::str::FromStr;

/// Named colour palette and motion constants for the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Deep blue base glowing into violet.
    #[default]
    Aurora,
    /// Dark red base glowing into orange.
    Ember,
    /// Near-black teal base glowing into aqua.
    Tide,
}

/// Values the preset contributes to the uniform block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub base_color: [f32; 3],
    pub glow_color: [f32; 3],
    /// Spatial frequency of the value noise.
    pub noise_scale: f32,
    /// Noise drift per second of elapsed time.
    pub drift_speed: f32,
    /// Angular speed of the energy wave.
    pub wave_speed: f32,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Aurora, Preset::Ember, Preset::Tide];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Aurora => "aurora",
            Preset::Ember => "ember",
            Preset::Tide => "tide",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Preset::Aurora => Palette {
                base_color: [0.05, 0.1, 0.2],
                glow_color: [0.6, 0.3, 0.8],
                noise_scale: 3.0,
                drift_speed: 0.05,
                wave_speed: 0.1,
            },
            Preset::Ember => Palette {
                base_color: [0.08, 0.02, 0.01],
                glow_color: [1.0, 0.55, 0.15],
                noise_scale: 4.0,
                drift_speed: 0.08,
                wave_speed: 0.15,
            },
            Preset::Tide => Palette {
                base_color: [0.01, 0.06, 0.09],
                glow_color: [0.2, 0.85, 0.75],
                noise_scale: 2.0,
                drift_speed: 0.03,
                wave_speed: 0.07,
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == normalized)
            .ok_or_else(|| {
                let known = Preset::ALL.map(Preset::name).join(", ");
                format!("unknown preset '{}'; expected one of {known}", value.trim())
            })
    }
}
