use crate::types::{ArmTriple, Landmark};

// =========================================================================
// Elbow Angle
// Counter-clockwise sweep from the upper arm (E->S) to the forearm (E->W),
// measured in image coordinates (y grows downward).
// =========================================================================

/// Angle at `elbow` between the rays towards `shoulder` and `wrist`, in [0, 360).
///
/// Coincident points are not rejected: `atan2(0, 0)` is 0, so a degenerate arm
/// collapses to whatever the other ray contributes.
pub fn elbow_angle(shoulder: Landmark, elbow: Landmark, wrist: Landmark) -> f64 {
    let v1 = (
        shoulder.x as f64 - elbow.x as f64,
        shoulder.y as f64 - elbow.y as f64,
    );
    let v2 = (wrist.x as f64 - elbow.x as f64, wrist.y as f64 - elbow.y as f64);

    let radians = v2.1.atan2(v2.0) - v1.1.atan2(v1.0);
    let mut degrees = radians.to_degrees();
    if degrees < 0.0 {
        degrees += 360.0;
    }
    // rounding can land exactly on 360
    if degrees >= 360.0 {
        degrees -= 360.0;
    }
    degrees
}

pub fn arm_angle(arm: &ArmTriple) -> f64 {
    elbow_angle(arm.shoulder, arm.elbow, arm.wrist)
}

/// Unsigned joint angle in [0, 180], regardless of sweep direction.
pub fn interior_angle(degrees: f64) -> f64 {
    if degrees > 180.0 {
        360.0 - degrees
    } else {
        degrees
    }
}
