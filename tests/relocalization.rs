//! Grid-line relocalization on the simulated rover

mod common;

use approx::assert_relative_eq;
use common::{heading_error, rig, sim_config};
use khoj_nav::LightLocalizer;
use khoj_nav::config::{CrossingRule, StartingCorner};

#[test]
fn test_relocalizes_to_intersection() {
    let rig = rig(sim_config(-5.0, -5.0, 0.0));
    let localizer = LightLocalizer::new(
        &rig.navigator,
        rig.reflectance.clone(),
        rig.config.localization.clone(),
    );

    let pose = localizer.localize().unwrap();

    // Estimate is re-seeded to the lower-left corner facing 90
    assert_relative_eq!(pose.x, 0.0);
    assert_relative_eq!(pose.y, 0.0);
    assert!(heading_error(pose.heading, 90.0) < 1.5, "heading {}", pose.heading);

    // and the robot really is there
    let truth = rig.world.true_pose();
    assert!(truth.x.abs() < 1.0, "true x {}", truth.x);
    assert!(truth.y.abs() < 1.0, "true y {}", truth.y);
    assert!(heading_error(truth.heading, 90.0) < 1.5, "true heading {}", truth.heading);
}

#[test]
fn test_differential_rule_relocalizes() {
    let mut config = sim_config(-4.0, -6.0, 20.0);
    config.localization.crossing_rule = CrossingRule::Differential;
    let rig = rig(config);
    let localizer = LightLocalizer::new(
        &rig.navigator,
        rig.reflectance.clone(),
        rig.config.localization.clone(),
    );

    localizer.localize().unwrap();

    let truth = rig.world.true_pose();
    assert!(truth.x.abs() < 1.0, "true x {}", truth.x);
    assert!(truth.y.abs() < 1.0, "true y {}", truth.y);
}

#[test]
fn test_reseeds_to_configured_corner() {
    let mut config = sim_config(-5.0, -5.0, 0.0);
    config.localization.starting_corner = StartingCorner::UpperRight;
    let rig = rig(config);
    let localizer = LightLocalizer::new(
        &rig.navigator,
        rig.reflectance.clone(),
        rig.config.localization.clone(),
    );

    let pose = localizer.localize().unwrap();
    assert_relative_eq!(pose.x, 13.0 * 30.48, epsilon = 1e-9);
    assert_relative_eq!(pose.y, 7.0 * 30.48, epsilon = 1e-9);
}

#[test]
fn test_sweep_without_lines_hits_sample_ceiling() {
    // Far from every line the sweep never sees a crossing
    let mut config = sim_config(15.24, 15.24, 0.0);
    config.localization.max_samples = 2_000;
    let rig = rig(config);
    let localizer = LightLocalizer::new(
        &rig.navigator,
        rig.reflectance.clone(),
        rig.config.localization.clone(),
    );

    let result = localizer.sweep();
    assert!(matches!(
        result,
        Err(khoj_nav::KhojError::Liveness {
            operation: "line sweep",
            ..
        })
    ));
}

fn noisy_localize(rule: CrossingRule, noise: f64, seed: u64) -> (khoj_nav::Pose, khoj_nav::Pose) {
    let mut config = sim_config(-5.0, -5.0, 0.0);
    config.localization.crossing_rule = rule;
    config.simulation.reflectance_noise_stddev = noise;
    config.simulation.random_seed = seed;
    let rig = rig(config);
    let localizer = LightLocalizer::new(
        &rig.navigator,
        rig.reflectance.clone(),
        rig.config.localization.clone(),
    );

    let pose = localizer
        .localize()
        .unwrap_or_else(|e| panic!("{:?} rule, seed {}: {}", rule, seed, e));
    (pose, rig.world.true_pose())
}

#[test]
fn test_noisy_sensor_relocalizes_with_either_rule() {
    for rule in [CrossingRule::Absolute, CrossingRule::Differential] {
        for noise in [0.01, 0.02] {
            for seed in 1..=5 {
                let (_, truth) = noisy_localize(rule, noise, seed);
                assert!(
                    truth.x.abs() < 1.0 && truth.y.abs() < 1.0,
                    "{:?} rule, noise {}, seed {}: ended at ({:.2}, {:.2})",
                    rule,
                    noise,
                    seed,
                    truth.x,
                    truth.y
                );
                assert!(heading_error(truth.heading, 90.0) < 1.5);
            }
        }
    }
}

#[test]
fn test_differential_approach_reaches_line_under_noise() {
    let mut config = sim_config(-5.0, -5.0, 0.0);
    config.localization.crossing_rule = CrossingRule::Differential;
    config.simulation.reflectance_noise_stddev = 0.02;
    config.simulation.random_seed = 3;
    let rig = rig(config);
    let localizer = LightLocalizer::new(
        &rig.navigator,
        rig.reflectance.clone(),
        rig.config.localization.clone(),
    );

    localizer.approach().unwrap();

    // Drove onto the lines near the intersection, then backed off 9 cm
    let truth = rig.world.true_pose();
    let from_intersection = truth.x.hypot(truth.y);
    assert!(
        from_intersection < rig.config.localization.sensor_offset,
        "approach stopped at ({:.2}, {:.2})",
        truth.x,
        truth.y
    );
}
