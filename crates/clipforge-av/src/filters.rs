//! ffmpeg filter expressions for framing and speed changes.

/// Lower bound of a single `atempo` instance.
const ATEMPO_MIN: f64 = 0.5;
/// Upper bound of a single `atempo` instance.
const ATEMPO_MAX: f64 = 2.0;

/// Scale the picture into a `width`x`height` frame.
///
/// Square targets are scaled up and cropped so the frame is filled without
/// letterboxing; other shapes are scaled down and padded so the full source
/// frame stays visible.
pub fn frame_filter(width: u32, height: u32) -> String {
    if width == height {
        format!(
            "scale={width}:{height}:force_original_aspect_ratio=increase,crop={width}:{height}"
        )
    } else {
        format!(
            "scale={width}:{height}:force_original_aspect_ratio=decrease,\
             pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:black"
        )
    }
}

/// Retime video frames for a playback `speed` multiplier.
pub fn video_speed_filter(speed: f64) -> String {
    format!("setpts={:.6}*PTS", 1.0 / speed)
}

/// Retime audio for a playback `speed` multiplier.
///
/// One `atempo` only accepts factors in `[0.5, 2.0]`, so larger or smaller
/// changes are split into a chain whose product equals `speed`.
pub fn audio_speed_filter(speed: f64) -> String {
    atempo_factors(speed)
        .iter()
        .map(|f| format!("atempo={f:.6}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn atempo_factors(speed: f64) -> Vec<f64> {
    let mut factors = Vec::new();
    let mut remaining = speed;

    while remaining > ATEMPO_MAX {
        factors.push(ATEMPO_MAX);
        remaining /= ATEMPO_MAX;
    }
    while remaining < ATEMPO_MIN {
        factors.push(ATEMPO_MIN);
        remaining /= ATEMPO_MIN;
    }
    factors.push(remaining);
    factors
}
