//! Orientation of the sphere driven by directional input.

use glam::Mat4;

/// Degrees added or removed per input action.
pub const ROTATION_STEP: f32 = 1.0;

/// A discrete directional input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    Up,
    Down,
    Left,
    Right,
}

/// Two free rotation angles in degrees.
///
/// The angles are never wrapped or clamped. The model matrix is rebuilt from
/// them on every call rather than accumulated.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    /// Rotation around the X axis, changed by [`InputAction::Up`] / [`InputAction::Down`].
    pub angle_x: f32,
    /// Rotation around the Y axis, changed by [`InputAction::Left`] / [`InputAction::Right`].
    pub angle_y: f32,
}

impl Orientation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one input action.
    pub fn apply(&mut self, action: InputAction) {
        match action {
            InputAction::Right => self.angle_y += ROTATION_STEP,
            InputAction::Left => self.angle_y -= ROTATION_STEP,
            InputAction::Up => self.angle_x += ROTATION_STEP,
            InputAction::Down => self.angle_x -= ROTATION_STEP,
        }
        log::trace!("{:?} -> x={} y={}", action, self.angle_x, self.angle_y);
    }

    /// `RotateY(angle_y) · RotateX(angle_x)`.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.angle_y.to_radians())
            * Mat4::from_rotation_x(self.angle_x.to_radians())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use glam::Vec3;
    use rstest::rstest;

    use super::*;

    #[test]
    fn right_then_left_is_exact_identity() {
        let mut orientation = Orientation::new();
        orientation.apply(InputAction::Right);
        orientation.apply(InputAction::Left);

        assert_eq!(orientation.angle_y, 0.0);
        assert_eq!(orientation.angle_x, 0.0);
    }

    #[rstest]
    #[case(InputAction::Up, 1.0, 0.0)]
    #[case(InputAction::Down, -1.0, 0.0)]
    #[case(InputAction::Right, 0.0, 1.0)]
    #[case(InputAction::Left, 0.0, -1.0)]
    fn each_action_moves_one_axis(
        #[case] action: InputAction,
        #[case] expected_x: f32,
        #[case] expected_y: f32,
    ) {
        let mut orientation = Orientation::new();
        orientation.apply(action);

        assert_eq!(orientation.angle_x, expected_x);
        assert_eq!(orientation.angle_y, expected_y);
    }

    #[test]
    fn angles_are_not_wrapped() {
        let mut orientation = Orientation::new();
        for _ in 0..400 {
            orientation.apply(InputAction::Up);
        }
        assert_eq!(orientation.angle_x, 400.0);
    }

    #[test]
    fn identity_at_rest() {
        assert!(Orientation::new().model_matrix().abs_diff_eq(Mat4::IDENTITY, 0.0));
    }

    #[test]
    fn rotation_x_is_applied_before_rotation_y() {
        let orientation = Orientation {
            angle_x: 90.0,
            angle_y: 90.0,
        };
        // +Y is tipped onto +Z by the X rotation, then swung onto +X by the Y rotation.
        let rotated = orientation.model_matrix().transform_vector3(Vec3::Y);

        assert_abs_diff_eq!(rotated.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(rotated.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(rotated.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn model_matrix_is_derived_not_integrated() {
        let mut stepped = Orientation::new();
        for _ in 0..30 {
            stepped.apply(InputAction::Right);
        }
        let direct = Orientation {
            angle_x: 0.0,
            angle_y: 30.0,
        };

        assert!(stepped.model_matrix().abs_diff_eq(direct.model_matrix(), 1e-6));
    }
}
