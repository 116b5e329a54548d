mod common;

use std::f64::consts::{FRAC_PI_2, PI};

use approx::{assert_abs_diff_eq, assert_relative_eq};
use common::{MU_SUN, propagate};
use porkchop_planner::impulsive::lambert::{
    self, LambertError, LambertOutcome, NonConvergence, SolverSettings, TransferDirection,
    TransferRequest, Z_SEARCH_CEILING,
};
use porkchop_planner::impulsive::{RootFindError, newton, stumpff};
use porkchop_planner::primitives::constants::AU_KM;
use porkchop_planner::primitives::vector::{self, Vector3};

const MU_SCENARIO: f64 = 1.327e11;
const R1_SCENARIO: Vector3 = [1.0e8, 0.0, 0.0];
const R2_SCENARIO: Vector3 = [0.0, 1.2e8, 0.0];
const DT_SCENARIO: f64 = 2.0e7;

fn solved(outcome: LambertOutcome) -> lambert::TransferSolution {
    match outcome {
        LambertOutcome::Solved(solution) => solution,
        LambertOutcome::NotConverged(reason) => panic!("expected a converged transfer: {reason}"),
    }
}

fn not_converged(outcome: LambertOutcome) -> NonConvergence {
    match outcome {
        LambertOutcome::NotConverged(reason) => reason,
        LambertOutcome::Solved(solution) => {
            panic!("expected non-convergence, got v1 = {:?}", solution.v1_km_s)
        }
    }
}

#[test]
fn quarter_orbit_on_circle_recovers_circular_velocity() {
    let tof = FRAC_PI_2 * (AU_KM.powi(3) / MU_SUN).sqrt();
    let settings = SolverSettings {
        tolerance: 1e-10,
        ..SolverSettings::default()
    };
    let solution = solved(
        lambert::solve(
            [AU_KM, 0.0, 0.0],
            [0.0, AU_KM, 0.0],
            tof,
            MU_SUN,
            TransferDirection::Prograde,
            &settings,
        )
        .expect("valid request"),
    );

    let v_circ = (MU_SUN / AU_KM).sqrt();
    assert_abs_diff_eq!(solution.v1_km_s[0], 0.0, epsilon = 1e-4);
    assert_abs_diff_eq!(solution.v1_km_s[1], v_circ, epsilon = 1e-4);
    assert_abs_diff_eq!(solution.v2_km_s[0], -v_circ, epsilon = 1e-4);
    assert_abs_diff_eq!(solution.v2_km_s[1], 0.0, epsilon = 1e-4);
    assert_abs_diff_eq!(solution.v1_km_s[2], 0.0, epsilon = 1e-12);
    // Circular orbit: z = (Δθ)² with Δθ = π/2.
    assert_abs_diff_eq!(solution.z, FRAC_PI_2 * FRAC_PI_2, epsilon = 1e-6);
}

#[test]
fn curtis_example_matches_textbook_velocities() {
    let solution = solved(
        lambert::solve(
            [5_000.0, 10_000.0, 2_100.0],
            [-14_600.0, 2_500.0, 7_000.0],
            3_600.0,
            398_600.0,
            TransferDirection::Prograde,
            &SolverSettings::default(),
        )
        .expect("valid request"),
    );

    let expected_v1 = [-5.9925, 1.9254, 3.2456];
    let expected_v2 = [-3.3125, -4.1966, -0.3853];
    for axis in 0..3 {
        assert_abs_diff_eq!(solution.v1_km_s[axis], expected_v1[axis], epsilon = 1e-3);
        assert_abs_diff_eq!(solution.v2_km_s[axis], expected_v2[axis], epsilon = 1e-3);
    }
}

#[test]
fn heliocentric_scenario_prograde_and_retrograde() {
    let settings = SolverSettings::default();
    let prograde = solved(
        lambert::solve(
            R1_SCENARIO,
            R2_SCENARIO,
            DT_SCENARIO,
            MU_SCENARIO,
            TransferDirection::Prograde,
            &settings,
        )
        .expect("valid request"),
    );
    assert_abs_diff_eq!(prograde.v1_km_s[0], 31.185, epsilon = 0.01);
    assert_abs_diff_eq!(prograde.v1_km_s[1], 25.363, epsilon = 0.01);
    assert_abs_diff_eq!(prograde.v2_km_s[0], -21.136, epsilon = 0.01);
    assert_abs_diff_eq!(prograde.v2_km_s[1], -26.958, epsilon = 0.01);
    assert!(
        prograde.iterations <= 10,
        "iterations = {}",
        prograde.iterations
    );

    let retrograde = solved(
        lambert::solve(
            R1_SCENARIO,
            R2_SCENARIO,
            DT_SCENARIO,
            MU_SCENARIO,
            TransferDirection::Retrograde,
            &settings,
        )
        .expect("valid request"),
    );
    let speed = vector::norm(&retrograde.v1_km_s);
    assert!((speed - 40.04).abs() < 0.05, "|v1| = {speed}");

    let h_pro = vector::cross(&R1_SCENARIO, &prograde.v1_km_s)[2];
    let h_retro = vector::cross(&R1_SCENARIO, &retrograde.v1_km_s)[2];
    assert!(h_pro > 0.0, "prograde angular momentum must point along +z");
    assert!(h_retro < 0.0, "retrograde angular momentum must point along -z");
}

#[test]
fn propagating_the_solution_returns_to_the_target() {
    let curtis_r1 = [5_000.0, 10_000.0, 2_100.0];
    let curtis_r2 = [-14_600.0, 2_500.0, 7_000.0];
    let cases: [(Vector3, Vector3, f64, f64, TransferDirection); 3] = [
        (
            R1_SCENARIO,
            R2_SCENARIO,
            DT_SCENARIO,
            MU_SCENARIO,
            TransferDirection::Prograde,
        ),
        (
            R1_SCENARIO,
            R2_SCENARIO,
            DT_SCENARIO,
            MU_SCENARIO,
            TransferDirection::Retrograde,
        ),
        (
            curtis_r1,
            curtis_r2,
            3_600.0,
            398_600.0,
            TransferDirection::Prograde,
        ),
    ];
    for (r1, r2, dt, mu, direction) in cases {
        let solution = solved(
            lambert::solve(r1, r2, dt, mu, direction, &SolverSettings::default())
                .expect("valid request"),
        );
        let (r_end, v_end) = propagate(r1, solution.v1_km_s, dt, mu);
        let miss = vector::norm(&vector::sub(&r_end, &r2));
        assert!(
            miss / vector::norm(&r2) < 1e-6,
            "{direction}: propagated miss {miss} km"
        );
        for axis in 0..3 {
            assert_relative_eq!(
                v_end[axis],
                solution.v2_km_s[axis],
                epsilon = 1e-6,
                max_relative = 1e-5
            );
        }
    }
}

#[test]
fn request_form_matches_positional_form() {
    let request = TransferRequest {
        r1_km: R1_SCENARIO,
        r2_km: R2_SCENARIO,
        time_of_flight_s: DT_SCENARIO,
        mu_km3_s2: MU_SCENARIO,
        direction: TransferDirection::Prograde,
    };
    let settings = SolverSettings::default();
    let from_request = lambert::solve_request(&request, &settings).expect("valid request");
    let positional = lambert::solve(
        R1_SCENARIO,
        R2_SCENARIO,
        DT_SCENARIO,
        MU_SCENARIO,
        TransferDirection::Prograde,
        &settings,
    )
    .expect("valid request");
    assert!(from_request.is_solved());
    assert_eq!(from_request, positional);
    assert_eq!(
        from_request.solution().map(|s| s.iterations),
        positional.solution().map(|s| s.iterations)
    );
}

#[test]
fn transfer_angle_follows_direction() {
    let x = [1.0, 0.0, 0.0];
    let y = [0.0, 1.0, 0.0];
    let neg_y = [0.0, -1.0, 0.0];
    let angle = |r2: &Vector3, direction| lambert::transfer_angle(&x, r2, 1.0, 1.0, direction);

    assert_abs_diff_eq!(angle(&y, TransferDirection::Prograde), FRAC_PI_2, epsilon = 1e-12);
    assert_abs_diff_eq!(
        angle(&y, TransferDirection::Retrograde),
        1.5 * PI,
        epsilon = 1e-12
    );
    assert_abs_diff_eq!(
        angle(&neg_y, TransferDirection::Prograde),
        1.5 * PI,
        epsilon = 1e-12
    );
    assert_abs_diff_eq!(
        angle(&neg_y, TransferDirection::Retrograde),
        FRAC_PI_2,
        epsilon = 1e-12
    );
}

#[test]
fn coincident_or_zero_positions_are_degenerate() {
    let settings = SolverSettings::default();
    for direction in TransferDirection::BOTH {
        let same = lambert::solve(
            R1_SCENARIO,
            R1_SCENARIO,
            DT_SCENARIO,
            MU_SCENARIO,
            direction,
            &settings,
        )
        .expect("well-formed request");
        assert_eq!(not_converged(same), NonConvergence::Degenerate);

        let origin = lambert::solve(
            [0.0; 3],
            R2_SCENARIO,
            DT_SCENARIO,
            MU_SCENARIO,
            direction,
            &settings,
        )
        .expect("well-formed request");
        assert_eq!(not_converged(origin), NonConvergence::Degenerate);
    }
}

#[test]
fn iteration_cap_reports_root_finder_failure() {
    let settings = SolverSettings {
        tolerance: 1e-8,
        max_iterations: 1,
    };
    let outcome = lambert::solve(
        R1_SCENARIO,
        R2_SCENARIO,
        DT_SCENARIO,
        MU_SCENARIO,
        TransferDirection::Prograde,
        &settings,
    )
    .expect("well-formed request");
    match not_converged(outcome) {
        NonConvergence::RootFinder(RootFindError::NotConverged { iterations, .. }) => {
            assert_eq!(iterations, 1)
        }
        other => panic!("unexpected reason: {other}"),
    }
}

#[test]
fn absurd_time_of_flight_exhausts_the_search() {
    let period = 2.0 * PI * (AU_KM.powi(3) / MU_SUN).sqrt();
    let outcome = lambert::solve(
        [AU_KM, 0.0, 0.0],
        [0.0, AU_KM, 0.0],
        1e9 * period,
        MU_SUN,
        TransferDirection::Prograde,
        &SolverSettings::default(),
    )
    .expect("well-formed request");
    assert_eq!(
        not_converged(outcome),
        NonConvergence::SearchExhausted {
            ceiling: Z_SEARCH_CEILING
        }
    );
}

#[test]
fn contract_violations_are_errors() {
    let ok = SolverSettings::default();
    let solve = |r1: Vector3, dt: f64, mu: f64, settings: &SolverSettings| {
        lambert::solve(
            r1,
            R2_SCENARIO,
            dt,
            mu,
            TransferDirection::Prograde,
            settings,
        )
    };

    let zero_tol = SolverSettings {
        tolerance: 0.0,
        ..ok
    };
    assert_eq!(
        solve(R1_SCENARIO, DT_SCENARIO, MU_SCENARIO, &zero_tol),
        Err(LambertError::InvalidTolerance(0.0))
    );
    let no_iterations = SolverSettings {
        max_iterations: 0,
        ..ok
    };
    assert_eq!(
        solve(R1_SCENARIO, DT_SCENARIO, MU_SCENARIO, &no_iterations),
        Err(LambertError::InvalidIterationCap)
    );
    assert_eq!(
        solve(R1_SCENARIO, DT_SCENARIO, -1.0, &ok),
        Err(LambertError::InvalidGravitationalParameter(-1.0))
    );
    assert_eq!(
        solve(R1_SCENARIO, 0.0, MU_SCENARIO, &ok),
        Err(LambertError::InvalidTimeOfFlight(0.0))
    );
    assert_eq!(
        solve([f64::NAN, 0.0, 0.0], DT_SCENARIO, MU_SCENARIO, &ok),
        Err(LambertError::NonFinitePosition)
    );
}

#[test]
fn direction_parses_from_labels() {
    assert_eq!(
        "short".parse::<TransferDirection>(),
        Ok(TransferDirection::Prograde)
    );
    assert_eq!(
        " LONG ".parse::<TransferDirection>(),
        Ok(TransferDirection::Retrograde)
    );
    assert_eq!(
        "prograde".parse::<TransferDirection>(),
        Ok(TransferDirection::Prograde)
    );
    assert_eq!(
        "sideways".parse::<TransferDirection>(),
        Err(LambertError::InvalidDirection("sideways".to_string()))
    );
    assert_eq!(TransferDirection::Retrograde.to_string(), "retrograde");
}

#[test]
fn stumpff_functions_are_continuous_at_zero() {
    assert_eq!(stumpff::c(0.0), 0.5);
    assert_eq!(stumpff::s(0.0), 1.0 / 6.0);
    for z in [1e-6, -1e-6] {
        assert_abs_diff_eq!(stumpff::c(z), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(stumpff::s(z), 1.0 / 6.0, epsilon = 1e-6);
    }
    // C vanishes at the single-revolution ceiling.
    assert_abs_diff_eq!(stumpff::c(Z_SEARCH_CEILING), 0.0, epsilon = 1e-12);
}

#[test]
fn stumpff_series_holds_precision_next_to_zero() {
    for z in [1e-12, -1e-12, 1e-17, -1e-17] {
        assert_relative_eq!(stumpff::c(z), 0.5 - z / 24.0, max_relative = 1e-15);
        assert_relative_eq!(stumpff::s(z), 1.0 / 6.0 - z / 120.0, max_relative = 1e-15);
    }
    // Closed forms and series agree across the band edge.
    let edge = stumpff::SERIES_BAND;
    for (inside, outside) in [(edge, edge * 1.0001), (-edge, -edge * 1.0001)] {
        assert_abs_diff_eq!(stumpff::c(inside), stumpff::c(outside), epsilon = 1e-8);
        assert_abs_diff_eq!(stumpff::s(inside), stumpff::s(outside), epsilon = 1e-8);
    }
}

/// Time of flight of the parabola through both radii (Euler's equation).
fn parabolic_time_of_flight(r1: &Vector3, r2: &Vector3, mu: f64) -> f64 {
    let chord = vector::norm(&vector::sub(r2, r1));
    let semi_perimeter = (vector::norm(r1) + vector::norm(r2) + chord) / 2.0;
    (2.0 / mu).sqrt() / 3.0 * (semi_perimeter.powf(1.5) - (semi_perimeter - chord).powf(1.5))
}

#[test]
fn near_parabolic_transfers_converge_on_the_correct_side() {
    let settings = SolverSettings {
        tolerance: 1e-13,
        ..SolverSettings::default()
    };
    let parabolic = parabolic_time_of_flight(&R1_SCENARIO, &R2_SCENARIO, MU_SCENARIO);
    let solve = |tof: f64| {
        solved(
            lambert::solve(
                R1_SCENARIO,
                R2_SCENARIO,
                tof,
                MU_SCENARIO,
                TransferDirection::Prograde,
                &settings,
            )
            .expect("valid request"),
        )
    };
    // Specific energy relative to the local circular potential.
    let energy = |solution: &lambert::TransferSolution| {
        let r1 = vector::norm(&R1_SCENARIO);
        let v1 = vector::norm(&solution.v1_km_s);
        (0.5 * v1 * v1 - MU_SCENARIO / r1) / (MU_SCENARIO / r1)
    };

    let exact = solve(parabolic);
    assert!(exact.z.abs() < 1e-12, "z = {}", exact.z);
    assert!(energy(&exact).abs() < 1e-10, "energy {}", energy(&exact));
    assert!(exact.iterations < 20);

    for shortening in [1e-6, 1e-9] {
        let faster = solve(parabolic * (1.0 - shortening));
        assert!(faster.z < 0.0, "z = {} should be hyperbolic", faster.z);
        assert!(energy(&faster) > 0.0);
    }
    let slower = solve(parabolic * (1.0 + 1e-6));
    assert!(slower.z > 0.0, "z = {} should be elliptic", slower.z);
    assert!(energy(&slower) < 0.0);
}

#[test]
fn newton_finds_square_root_and_reports_flat_slope() {
    let root = newton::solve(|x| x * x - 2.0, |x| 2.0 * x, 1.0, 1e-12, 50)
        .expect("newton should converge");
    assert_abs_diff_eq!(root.value, 2f64.sqrt(), epsilon = 1e-12);
    assert!(root.iterations < 10);

    let flat = newton::solve(|x| x * x - 2.0, |x| 2.0 * x, 0.0, 1e-12, 50);
    assert_eq!(flat, Err(RootFindError::ZeroDerivative { z: 0.0 }));

    let capped = newton::solve(|x| x * x - 2.0, |x| 2.0 * x, 1.0, 1e-12, 0);
    assert_eq!(capped, Err(RootFindError::InvalidIterationCap));
}
