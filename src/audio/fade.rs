// ABOUTME: Edge-fade shaper for playback block boundaries
// ABOUTME: Linear ramps at block start and end remove segmentation clicks

/// Number of frames over which each block edge is faded.
pub const FADE_FRAMES: usize = 50;

/// Apply linear fade-in and fade-out ramps in place to one channel's samples.
///
/// Frame `i` is scaled by `i / 50` within the first `min(50, frames)` frames
/// and by `d / 50` within the last, where `d` is the distance from the final
/// frame (so the final frame is exactly 0). A frame falling inside both
/// windows on short blocks receives the smaller of the two factors once; it
/// is never faded twice in contradictory directions.
pub fn apply_edge_fade(samples: &mut [f32]) {
    let frames = samples.len();
    if frames == 0 {
        return;
    }
    let window = FADE_FRAMES.min(frames);
    let divisor = FADE_FRAMES as f32;

    for i in 0..window {
        let fade_in = i as f32 / divisor;
        let d = frames - 1 - i;
        let factor = if d < window {
            fade_in.min(d as f32 / divisor)
        } else {
            fade_in
        };
        samples[i] *= factor;
    }
    // Tail window, skipping frames already handled above on short blocks.
    let tail_start = frames.saturating_sub(window).max(window);
    for (d, sample) in samples[tail_start..].iter_mut().rev().enumerate() {
        *sample *= d as f32 / divisor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_block_fade_factors() {
        let mut samples = vec![1.0f32; 200];
        apply_edge_fade(&mut samples);

        // First 50 frames scale by i/50.
        for i in 0..50 {
            let expected = i as f32 / 50.0;
            assert!(
                (samples[i] - expected).abs() < 1e-6,
                "fade-in frame {i}: got {}, expected {expected}",
                samples[i]
            );
        }
        // Middle untouched.
        for (i, &s) in samples[50..150].iter().enumerate() {
            assert_eq!(s, 1.0, "middle frame {} was modified", i + 50);
        }
        // Last 50 frames scale by distance-from-end / 50, ending at 0.
        for d in 0..50 {
            let i = 199 - d;
            let expected = d as f32 / 50.0;
            assert!(
                (samples[i] - expected).abs() < 1e-6,
                "fade-out frame {i}: got {}, expected {expected}",
                samples[i]
            );
        }
        assert_eq!(samples[199], 0.0);
    }

    #[test]
    fn test_exactly_100_frames_has_no_flat_middle() {
        let mut samples = vec![1.0f32; 100];
        apply_edge_fade(&mut samples);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[99], 0.0);
        assert!((samples[49] - 49.0 / 50.0).abs() < 1e-6);
        assert!((samples[50] - 49.0 / 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_short_block_single_fade_per_frame() {
        // 60 frames: windows overlap by 40 frames. Every frame must get the
        // smaller factor applied exactly once.
        let mut samples = vec![1.0f32; 60];
        apply_edge_fade(&mut samples);
        for i in 0..60 {
            let fade_in = (i as f32 / 50.0).min(1.0);
            let fade_out = ((59 - i) as f32 / 50.0).min(1.0);
            let expected = fade_in.min(fade_out);
            assert!(
                (samples[i] - expected).abs() < 1e-6,
                "frame {i}: got {}, expected {expected}",
                samples[i]
            );
        }
    }

    #[test]
    fn test_tiny_block() {
        let mut samples = vec![1.0f32; 3];
        apply_edge_fade(&mut samples);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - 1.0 / 50.0).abs() < 1e-6);
        assert_eq!(samples[2], 0.0);
    }

    #[test]
    fn test_empty_is_noop() {
        let mut samples: Vec<f32> = Vec::new();
        apply_edge_fade(&mut samples);
    }
}
