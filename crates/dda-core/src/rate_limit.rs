//! Free-worker rate-limit heuristic (spec §4.5.3).
//!
//! Each coordinator targets a fair share `W/C` of concurrently in-flight
//! partials; `free` is how much of that share is still unused. Recomputed
//! every PCA loop iteration from the tracker's current census plus the
//! coordinator's own `in_flight` count — never cached across iterations.

/// `free = (workers / coordinators) - in_flight`, using integer division,
/// or `0` when there are no known coordinators. A coordinator always
/// preregisters itself before running (see [`crate::tracker::Tracker`]'s
/// construction invariant), so `coordinators == 0` is not expected in
/// practice, but the heuristic degrades to "dispatch nothing" rather than
/// dividing by zero.
pub fn free_worker_estimate(coordinators: usize, workers: usize, in_flight: u64) -> i64 {
    if coordinators == 0 {
        return 0;
    }
    (workers / coordinators) as i64 - in_flight as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_coordinators_yields_zero_free_budget() {
        assert_eq!(free_worker_estimate(0, 10, 0), 0);
    }

    #[test]
    fn fewer_workers_than_coordinators_integer_divides_down_to_zero_share() {
        assert_eq!(free_worker_estimate(5, 2, 0), 0);
    }

    #[test]
    fn equal_workers_and_coordinators_yields_exactly_one_share() {
        assert_eq!(free_worker_estimate(3, 3, 0), 1);
    }

    #[test]
    fn more_workers_than_coordinators_divides_down_to_a_fair_share() {
        assert_eq!(free_worker_estimate(2, 7, 0), 3); // 7 / 2 = 3, remainder dropped
    }

    #[test]
    fn in_flight_at_the_fair_share_exhausts_the_budget() {
        assert_eq!(free_worker_estimate(2, 7, 3), 0);
    }

    #[test]
    fn in_flight_over_the_fair_share_goes_negative() {
        assert_eq!(free_worker_estimate(2, 7, 5), -2);
    }

    #[test]
    fn single_coordinator_claims_the_whole_pool() {
        assert_eq!(free_worker_estimate(1, 10, 4), 6);
    }

    /// Spec §8 property 3: `P <= max(1, W/C)` holds between loop
    /// iterations, i.e. the loop never dispatches past the point where
    /// `free_worker_estimate` would go to zero or below.
    #[test]
    fn bound_holds_for_a_table_of_fleet_states() {
        let cases = [
            (0usize, 0usize), // C, W
            (1, 0),
            (1, 1),
            (1, 5),
            (2, 1),
            (2, 5),
            (3, 10),
            (4, 4),
        ];
        for (coordinators, workers) in cases {
            let bound = if coordinators == 0 {
                0
            } else {
                std::cmp::max(1, workers / coordinators) as i64
            };
            let mut in_flight: u64 = 0;
            while free_worker_estimate(coordinators, workers, in_flight) > 0 && coordinators > 0 {
                in_flight += 1;
                assert!(
                    in_flight as i64 <= bound,
                    "C={coordinators} W={workers}: in_flight {in_flight} exceeded bound {bound}"
                );
            }
        }
    }
}
