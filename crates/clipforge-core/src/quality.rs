//! Quality presets and their resolved x264 parameter bundles.
//!
//! The final encode stage targets perceptual quality with CRF; the
//! intermediate trim stage is re-encoded anyway, so it only needs fast,
//! size-bounded bitrate targeting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Encode-speed versus quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QualityPreset {
    Fast,
    #[default]
    Balanced,
    Maximum,
}

impl QualityPreset {
    /// Resolve a user-supplied preset name.
    ///
    /// Unknown names fall back to [`QualityPreset::Balanced`]; preset names
    /// come from user configuration and must never abort a batch.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "fast" => QualityPreset::Fast,
            "balanced" | "high" | "medium" => QualityPreset::Balanced,
            "maximum" | "max" | "ultra" => QualityPreset::Maximum,
            other => {
                tracing::warn!("Unknown quality preset '{other}', using balanced");
                QualityPreset::Balanced
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityPreset::Fast => "fast",
            QualityPreset::Balanced => "balanced",
            QualityPreset::Maximum => "maximum",
        }
    }

    /// Build the parameter bundle for this tier at `kbps`.
    pub fn bundle(self, kbps: u32, mode: RateMode) -> QualityParameterBundle {
        let tier = self.tier();
        let (rate_control, max_rate_kbps) = match mode {
            RateMode::Crf => (
                RateControl::Crf(tier.crf),
                scale_kbps(kbps, 3, 2),
            ),
            RateMode::Bitrate => (
                RateControl::Bitrate { kbps },
                scale_kbps(kbps, 6, 5),
            ),
        };

        QualityParameterBundle {
            preset: self,
            encoder_preset: tier.encoder_preset,
            motion_estimation: tier.motion_estimation,
            subpel_refinement: tier.subpel_refinement,
            trellis: tier.trellis,
            ref_frames: tier.ref_frames,
            b_frames: tier.b_frames,
            rate_control,
            max_rate_kbps,
            buffer_size_kbps: scale_kbps(kbps, 2, 1),
            gop_size: 250,
            keyint_min: 25,
            scene_cut_threshold: 40,
            psy_rd: tier.psy_rd,
        }
    }

    fn tier(self) -> Tier {
        match self {
            QualityPreset::Fast => Tier {
                encoder_preset: "fast",
                crf: 23,
                motion_estimation: "hex",
                subpel_refinement: 6,
                trellis: 1,
                ref_frames: 3,
                b_frames: 3,
                psy_rd: "1.0,0.0",
            },
            QualityPreset::Balanced => Tier {
                encoder_preset: "slow",
                crf: 20,
                motion_estimation: "umh",
                subpel_refinement: 8,
                trellis: 2,
                ref_frames: 5,
                b_frames: 8,
                psy_rd: "1.0,0.2",
            },
            QualityPreset::Maximum => Tier {
                encoder_preset: "veryslow",
                crf: 18,
                motion_estimation: "tesa",
                subpel_refinement: 10,
                trellis: 2,
                ref_frames: 8,
                b_frames: 16,
                psy_rd: "1.0,0.25",
            },
        }
    }
}

impl From<String> for QualityPreset {
    fn from(value: String) -> Self {
        QualityPreset::from_name(&value)
    }
}

impl From<&str> for QualityPreset {
    fn from(value: &str) -> Self {
        QualityPreset::from_name(value)
    }
}

impl From<QualityPreset> for String {
    fn from(value: QualityPreset) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Tier {
    encoder_preset: &'static str,
    crf: u8,
    motion_estimation: &'static str,
    subpel_refinement: u8,
    trellis: u8,
    ref_frames: u8,
    b_frames: u8,
    psy_rd: &'static str,
}

/// How the encoder's rate is targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateMode {
    Crf,
    Bitrate,
}

/// Resolved rate-control target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateControl {
    Crf(u8),
    Bitrate { kbps: u32 },
}

/// Concrete encoder tuning for one tier and bitrate target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityParameterBundle {
    pub preset: QualityPreset,
    /// x264 speed preset name.
    pub encoder_preset: &'static str,
    pub motion_estimation: &'static str,
    pub subpel_refinement: u8,
    pub trellis: u8,
    pub ref_frames: u8,
    pub b_frames: u8,
    pub rate_control: RateControl,
    pub max_rate_kbps: u32,
    pub buffer_size_kbps: u32,
    /// Maximum GOP length in frames.
    pub gop_size: u32,
    pub keyint_min: u32,
    pub scene_cut_threshold: u32,
    /// Psycho-visual rate-distortion strength and trellis, comma separated.
    pub psy_rd: &'static str,
}

impl QualityParameterBundle {
    /// Render the bundle as libx264 command-line arguments.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-preset".into(),
            self.encoder_preset.into(),
            "-profile:v".into(),
            "high".into(),
            "-level".into(),
            "4.1".into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
        ];

        match self.rate_control {
            RateControl::Crf(crf) => {
                args.extend(["-crf".into(), crf.to_string()]);
            }
            RateControl::Bitrate { kbps } => {
                args.extend(["-b:v".into(), format!("{kbps}k")]);
            }
        }

        args.extend([
            "-maxrate".into(),
            format!("{}k", self.max_rate_kbps),
            "-bufsize".into(),
            format!("{}k", self.buffer_size_kbps),
            "-g".into(),
            self.gop_size.to_string(),
            "-keyint_min".into(),
            self.keyint_min.to_string(),
            "-sc_threshold".into(),
            self.scene_cut_threshold.to_string(),
            "-bf".into(),
            self.b_frames.to_string(),
            "-refs".into(),
            self.ref_frames.to_string(),
            "-x264-params".into(),
            format!(
                "me={}:subme={}:trellis={}:psy-rd={}",
                self.motion_estimation, self.subpel_refinement, self.trellis, self.psy_rd
            ),
        ]);

        args
    }
}

/// Resolve the final-stage bundle for a preset and target bitrate.
///
/// Accepts either a parsed [`QualityPreset`] or a preset name; names go
/// through [`QualityPreset::from_name`] and so never fail.
pub fn resolve(preset: impl Into<QualityPreset>, kbps: u32) -> QualityParameterBundle {
    preset.into().bundle(kbps, RateMode::Crf)
}

/// Bundle used by the intermediate trim stage: fast tier, bitrate targeted,
/// short GOP so the second stage can seek cheaply.
pub fn resolve_intermediate(kbps: u32) -> QualityParameterBundle {
    QualityParameterBundle {
        gop_size: 50,
        ..QualityPreset::Fast.bundle(kbps, RateMode::Bitrate)
    }
}

fn scale_kbps(kbps: u32, num: u64, den: u64) -> u32 {
    u32::try_from(u64::from(kbps) * num / den).unwrap_or(u32::MAX)
}
