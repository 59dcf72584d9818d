use super::{earth_mover_cost, psi, DriftState};

#[test]
fn test_psi_of_identical_distributions_is_zero() {
    let reference = vec![0.25, 0.25, 0.3, 0.2];
    assert_eq!(psi(&reference, &reference), 0.0);
}

#[test]
fn test_psi_increases_with_shift_magnitude() {
    let reference = vec![0.25; 4];

    let mut last = 0.0;
    for step in 1..=5 {
        // Shift mass uniformly toward bucket 0.
        let shift = step as f64 * 0.05;
        let prod = vec![
            0.25 + shift,
            0.25 - shift / 3.0,
            0.25 - shift / 3.0,
            0.25 - shift / 3.0,
        ];
        let value = psi(&prod, &reference);
        assert!(value > last, "PSI must grow: {} vs {}", value, last);
        last = value;
    }
}

#[test]
fn test_psi_finite_for_zero_reference_bucket() {
    // Appended categorical bucket: zero reference mass.
    let reference = vec![0.5, 0.5, 0.0];
    let prod = vec![0.4, 0.4, 0.2];
    assert!(psi(&prod, &reference).is_finite());
}

#[test]
fn test_emd_zero_when_occupancies_match() {
    let centroids = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 0.0]];
    let occupancy = vec![0.5, 0.3, 0.2];
    assert_eq!(earth_mover_cost(&occupancy, &occupancy, &centroids), 0.0);
}

#[test]
fn test_emd_permutation_invariant() {
    let centroids = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![3.0, 0.0]];
    let reference = vec![0.5, 0.3, 0.2];
    let prod = vec![0.2, 0.5, 0.3];
    let cost = earth_mover_cost(&prod, &reference, &centroids);

    // Relabel buckets as (2, 0, 1) consistently everywhere.
    let perm = [2usize, 0, 1];
    let centroids_p: Vec<Vec<f64>> = perm.iter().map(|&i| centroids[i].clone()).collect();
    let reference_p: Vec<f64> = perm.iter().map(|&i| reference[i]).collect();
    let prod_p: Vec<f64> = perm.iter().map(|&i| prod[i]).collect();
    let cost_p = earth_mover_cost(&prod_p, &reference_p, &centroids_p);

    assert!((cost - cost_p).abs() < 1e-12);
}

#[test]
fn test_emd_ships_to_nearest_deficit_first() {
    // Surplus at bucket 0; deficits at buckets 1 (near) and 2 (far).
    let centroids = vec![vec![0.0], vec![1.0], vec![10.0]];
    let reference = vec![0.2, 0.5, 0.3];
    let prod = vec![0.5, 0.3, 0.2];

    // Bucket 0 surplus 0.3 fills bucket 1's 0.2 deficit at cost 1, then
    // bucket 2's at cost 10; symmetric pass doubles the total.
    let cost = earth_mover_cost(&prod, &reference, &centroids);
    let shipped_once = 0.2 * 1.0 + 0.1 * 10.0;
    assert!((cost - 2.0 * shipped_once).abs() < 1e-9);
}

#[test]
fn test_alert_latch_fires_on_rising_edge_only() {
    let mut state = DriftState::new();

    assert!(!state.update(0.1, 0.3));
    assert!(!state.drifting);

    // First excursion alerts once.
    assert!(state.update(0.5, 0.3));
    assert!(state.drifting);
    assert!(!state.update(0.6, 0.3));
    assert!(state.drifting);

    // Falling under the threshold re-arms the latch.
    assert!(!state.update(0.2, 0.3));
    assert!(!state.drifting);
    assert!(state.update(0.4, 0.3));
}
