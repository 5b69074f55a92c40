use crate::config::ReorderTuning;
use crate::models::Rect;

/// Pick the slot the decoy should move toward, or `None` to stay.
///
/// `rects` are the live slot rects in list order, decoy included. `top` and
/// `bottom` are the floating item's edges in the same coordinate space.
///
/// Siblings are scanned top to bottom. While the floating item's bottom edge is
/// past a sibling's enter line, that sibling is a target only if the floating
/// item's top edge is also above the sibling's leave line. The first sibling whose
/// enter line is not reached ends the scan: the decoy belongs just above it. If
/// every enter line is passed, the decoy belongs last.
pub(crate) fn hit_test(
    rects: &[Rect],
    decoy_index: usize,
    top: f64,
    bottom: f64,
    tuning: &ReorderTuning,
) -> Option<usize> {
    for (i, rect) in rects.iter().enumerate() {
        if bottom > rect.y_at(tuning.enter_threshold) {
            if top < rect.y_at(tuning.leave_threshold) && i != decoy_index {
                return Some(i);
            }
            continue;
        }

        if i == decoy_index || i == decoy_index + 1 {
            return None;
        }
        return Some(if i < decoy_index { i } else { i - 1 });
    }

    let last = rects.len().checked_sub(1)?;
    (decoy_index != last).then_some(last)
}

/// Limit a move to one slot per pass.
pub(crate) fn step_toward(decoy_index: usize, target: usize) -> usize {
    if target > decoy_index {
        decoy_index + 1
    } else if target < decoy_index {
        decoy_index - 1
    } else {
        decoy_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stacked(n: usize) -> Vec<Rect> {
        (0..n)
            .map(|i| Rect::new(0.0, i as f64 * 50.0, 300.0, 50.0))
            .collect()
    }

    #[test]
    fn test_resting_on_decoy_stays() {
        let t = ReorderTuning::default();
        assert_eq!(hit_test(&stacked(3), 0, 5.0, 55.0, &t), None);
        assert_eq!(hit_test(&stacked(3), 1, 50.0, 100.0, &t), None);
    }

    #[test]
    fn test_past_every_threshold_targets_last() {
        let t = ReorderTuning::default();
        assert_eq!(hit_test(&stacked(3), 0, 175.0, 225.0, &t), Some(2));
        assert_eq!(hit_test(&stacked(3), 2, 175.0, 225.0, &t), None);
    }

    #[test]
    fn test_overlapping_sibling_above_is_target() {
        let t = ReorderTuning::default();
        // Decoy at 2, floating item mostly over slot 1.
        assert_eq!(hit_test(&stacked(3), 2, 55.0, 105.0, &t), Some(1));
    }

    #[test]
    fn test_stops_above_first_unreached_sibling() {
        let t = ReorderTuning::default();
        // Decoy at 0; bottom edge passes slot 1's enter line (80) but not slot 2's
        // (130), top edge (75) is below slot 1's leave line (70).
        assert_eq!(hit_test(&stacked(4), 0, 75.0, 125.0, &t), Some(1));
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let strict = ReorderTuning {
            enter_threshold: 0.9,
            leave_threshold: 0.1,
        };
        // Would swap with the default 60% line (bottom 85 > 80) but not at 90%.
        assert_eq!(hit_test(&stacked(3), 0, 35.0, 85.0, &ReorderTuning::default()), Some(1));
        assert_eq!(hit_test(&stacked(3), 0, 35.0, 85.0, &strict), None);
    }

    #[test]
    fn test_empty_list_has_no_target() {
        assert_eq!(hit_test(&[], 0, 0.0, 10.0, &ReorderTuning::default()), None);
    }

    #[test]
    fn test_step_toward_moves_one_slot() {
        assert_eq!(step_toward(0, 3), 1);
        assert_eq!(step_toward(4, 0), 3);
        assert_eq!(step_toward(2, 2), 2);
    }
}
