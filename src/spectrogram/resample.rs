//! Linear resampling between index spaces of different widths.

/// Fills `target` with `source` stretched or squeezed to the target width.
///
/// Each target index `i` maps to `i * S / B` in the source. The two
/// bracketing samples are blended by the fractional part; once the lower
/// bracket reaches the last source sample, that sample is used as-is.
/// Whole-number positions return the source sample exactly. An empty
/// source yields zeros.
pub fn resample(source: &[f32], target: &mut [f32]) {
    if source.is_empty() {
        target.fill(0.0);
        return;
    }

    let last = source.len() - 1;
    let width = target.len();

    for (i, out) in target.iter_mut().enumerate() {
        // Kept in integers so exact positions never round below a sample
        let numerator = i * source.len();
        let index = numerator / width;
        let remainder = numerator % width;

        *out = if index >= last {
            source[last]
        } else if remainder == 0 {
            source[index]
        } else {
            let weight = remainder as f32 / width as f32;
            let left = source[index];
            let right = source[index + 1];
            (right - left) * weight + left
        };
    }
}

/// Allocating variant of [`resample`].
pub fn resample_to(source: &[f32], width: usize) -> Vec<f32> {
    let mut target = vec![0.0; width];
    resample(source, &mut target);
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_width_is_identity() {
        let source = [0.25, -1.0, 0.5, 3.0, 7.5];
        assert_eq!(resample_to(&source, source.len()), source.to_vec());
    }

    #[test]
    fn test_downsample_hits_exact_source_samples() {
        let source: Vec<f32> = (0..10).map(|i| i as f32 * 2.0).collect();
        let target = resample_to(&source, 5);
        assert_eq!(target[2], 8.0);
        assert_eq!(target, vec![0.0, 4.0, 8.0, 12.0, 16.0]);
    }

    #[test]
    fn test_upsample_interpolates_between_neighbours() {
        let target = resample_to(&[0.0, 1.0], 4);
        assert_eq!(target[0], 0.0);
        assert_eq!(target[1], 0.5);
    }

    #[test]
    fn test_tail_clamps_to_last_sample() {
        let source = [1.0, 2.0, 3.0];
        let target = resample_to(&source, 6);
        // findex 2.0 and 2.5 both sit at or past the last sample
        assert_eq!(target[4], 3.0);
        assert_eq!(target[5], 3.0);
    }

    #[test]
    fn test_half_way_on_two_samples_is_exact() {
        let target = resample_to(&[0.0, 1.0], 82);
        assert_eq!(target[41], 1.0);
        assert_eq!(target[81], 1.0);
    }

    #[test]
    fn test_whole_positions_return_source_samples_exactly() {
        for s in 1..64usize {
            // Irregular values so a blend can never land on the same number
            let source: Vec<f32> = (0..s)
                .map(|k| (k as f32 * 0.37).sin() + k as f32 * 0.1)
                .collect();
            for b in 1..64usize {
                let target = resample_to(&source, b);
                for (i, &value) in target.iter().enumerate() {
                    if (i * s) % b == 0 {
                        let k = (i * s / b).min(s - 1);
                        assert_eq!(value, source[k], "S={s} B={b} i={i}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_source_gives_zeros() {
        let mut target = [9.0; 3];
        resample(&[], &mut target);
        assert_eq!(target, [0.0; 3]);
    }
}
