// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use depth_mapping::constants::{SENTINEL_COLOR, app_info, camera, keys};
use depth_mapping::mapping::MappingMode;

#[test]
fn test_mode_keys_cover_all_modes() {
    // One key per mode, in mode order
    assert_eq!(keys::MODE_KEYS.len(), MappingMode::ALL.len());
    for (key, mode) in keys::MODE_KEYS.iter().zip(MappingMode::ALL) {
        assert_eq!(MappingMode::from_key(*key), Some(mode));
    }
}

#[test]
fn test_control_keys_do_not_select_modes() {
    for key in [keys::QUIT, keys::RESET_VIEW, keys::ZOOM_IN, keys::ZOOM_OUT] {
        assert!(
            MappingMode::from_key(key).is_none(),
            "Key {:?} collides with a mode key",
            key
        );
    }
}

#[test]
fn test_sentinel_color() {
    assert_eq!(SENTINEL_COLOR.0, [255, 0, 0, 255]);
}

#[test]
fn test_camera_limits() {
    // Pitch must stay short of straight up/down
    assert!(camera::PITCH_LIMIT < std::f32::consts::FRAC_PI_2);
    assert!(camera::ZOOM_STEP > 1.0);
}

#[test]
fn test_app_version() {
    assert!(!app_info::version().is_empty());
}
