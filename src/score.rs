//! Pure ranking math. Every function here is deterministic: equal inputs
//! give bit-identical outputs, so recomputed scores can be compared and
//! cached safely.
//!
//! Resources:
//!     https://github.com/reddit-archive/reddit/blob/master/r2/r2/lib/db/_sorts.pyx
//!     https://www.evanmiller.org/how-not-to-sort-by-average-rating.html
//!     https://redditblog.com/2009/10/15/reddits-new-comment-sorting-system

/// Ranking epoch, 2019-12-13T13:00:00Z. A post gains one decade-equivalent
/// of hotness every 45000 seconds past this instant.
const EPOCH: f64 = 1_576_242_000.0;

/// One-sided z-score at 80% confidence, norm.ppf(0.9).
const Z_SCORE_08: f64 = 1.2815515655446004;

fn sign(x: i64) -> i64 {
    i64::from(x > 0) - i64::from(x < 0)
}

pub fn hot(up: i64, down: i64, time: f64) -> f64 {
    let s = up - down;
    sign(s) as f64 * (s.abs().max(1) as f64).log10() + (time - EPOCH) / 45000.0
}

pub fn controversial(up: i64, down: i64) -> f64 {
    if up == 0 && down == 0 {
        0.0
    } else {
        ((up + down) as f64).powf(up.min(down) as f64 / up.max(down) as f64)
    }
}

/// Wilson score lower bound on the upvote fraction.
pub fn confidence(up: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    let phat = up as f64 / n;
    let z = Z_SCORE_08;
    (phat + z * z / (2.0 * n) - z * ((phat * (1.0 - phat) + z * z / (4.0 * n)) / n).sqrt()) / (1.0 + z * z / n)
}

pub fn best(up: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let s = up as f64 / total as f64;
    s - (s - 0.5) * 2.0_f64.powf(-(total as f64 + 1.0).log10())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hot_at_epoch() {
        assert_eq!(hot(1, 0, EPOCH), 0.0);
        assert_eq!(hot(0, 0, EPOCH), 0.0);
        assert_eq!(hot(2, 0, EPOCH), 2.0_f64.log10());
        assert_eq!(hot(0, 2, EPOCH), -(2.0_f64.log10()));
    }

    #[test]
    fn hot_advances_one_unit_per_45000_seconds() {
        assert_eq!(hot(1, 0, EPOCH + 45000.0), 1.0);
        assert_eq!(hot(10, 0, EPOCH + 45000.0), hot(1, 0, EPOCH + 90000.0));
    }

    #[test]
    fn controversial_known_values() {
        assert_eq!(controversial(0, 0), 0.0);
        assert_eq!(controversial(1, 0), 1.0);
        assert_eq!(controversial(0, 1), 1.0);
        assert_eq!(controversial(1, 1), 2.0);
        assert_eq!(controversial(2, 2), 4.0);
        assert!(controversial(50, 50) > controversial(50, 1));
    }

    #[test]
    fn confidence_is_a_lower_bound() {
        assert_eq!(confidence(0, 0), 0.0);
        let single = confidence(1, 1);
        assert!(single > 0.0 && single < 1.0);
        assert!((single - 1.0 / (1.0 + Z_SCORE_08 * Z_SCORE_08)).abs() < 1e-12);
        // More votes at the same ratio tightens the bound toward it
        assert!(confidence(100, 100) > confidence(10, 10));
        assert!(confidence(10, 10) > single);
        assert!(confidence(75, 100) < 0.75);
    }

    #[test]
    fn best_dampens_small_samples() {
        assert_eq!(best(0, 0), 0.0);
        assert_eq!(best(1, 2), 0.5);
        let one_vote = best(1, 1);
        assert!(one_vote > 0.5 && one_vote < 1.0);
        assert!(best(100, 100) > one_vote);
        // All-downvote posts sit below the midpoint
        assert!(best(0, 10) < 0.5);
    }

    #[test]
    fn scoring_is_pure() {
        let time = 1.7e9;
        assert_eq!(hot(3, 1, time).to_bits(), hot(3, 1, time).to_bits());
        assert_eq!(confidence(7, 13).to_bits(), confidence(7, 13).to_bits());
        assert_eq!(controversial(7, 13).to_bits(), controversial(7, 13).to_bits());
        assert_eq!(best(7, 13).to_bits(), best(7, 13).to_bits());
    }
}
