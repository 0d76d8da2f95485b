//! Constant-velocity Kalman filter over box geometry, on fixed-size nalgebra matrices.
//!
//! State is `[cx, cy, s, r, vx, vy, vs]`: center, scale (area), aspect ratio and
//! the velocities of center and scale. The aspect ratio has no velocity term.
//! Measurements are `[cx, cy, s, r]`.

use nalgebra::{SMatrix, SVector};

pub const STATE_DIM: usize = 7;
pub const MEASUREMENT_DIM: usize = 4;

pub type StateMean = SVector<f64, STATE_DIM>;
pub type StateCovariance = SMatrix<f64, STATE_DIM, STATE_DIM>;
pub type Measurement = SVector<f64, MEASUREMENT_DIM>;

type MeasurementCovariance = SMatrix<f64, MEASUREMENT_DIM, MEASUREMENT_DIM>;
type UpdateMatrix = SMatrix<f64, MEASUREMENT_DIM, STATE_DIM>;

const DEFAULT_MEASUREMENT_VAR: [f64; MEASUREMENT_DIM] = [1.0, 1.0, 10.0, 10.0];
const DEFAULT_PROCESS_VAR: [f64; STATE_DIM] = [1.0, 1.0, 1.0, 1.0, 0.01, 0.01, 1e-4];
const INITIAL_POSITION_VAR: f64 = 10.0;
const INITIAL_VELOCITY_VAR: f64 = 1e4;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: StateCovariance,
    update_mat: UpdateMatrix,
    measurement_noise: MeasurementCovariance,
    process_noise: StateCovariance,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::with_noise(DEFAULT_MEASUREMENT_VAR, DEFAULT_PROCESS_VAR)
    }
}

impl KalmanFilter {
    /// Build a filter with the given diagonals of the measurement (R) and
    /// process (Q) noise covariances.
    pub fn with_noise(
        measurement_var: [f64; MEASUREMENT_DIM],
        process_var: [f64; STATE_DIM],
    ) -> Self {
        // Position and scale advance by their velocity, ratio is carried as-is.
        let mut motion_mat = StateCovariance::identity();
        for i in 0..3 {
            motion_mat[(i, MEASUREMENT_DIM + i)] = 1.0;
        }

        let mut update_mat = UpdateMatrix::zeros();
        for i in 0..MEASUREMENT_DIM {
            update_mat[(i, i)] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            measurement_noise: MeasurementCovariance::from_diagonal(&Measurement::from(
                measurement_var,
            )),
            process_noise: StateCovariance::from_diagonal(&StateMean::from(process_var)),
        }
    }

    /// Create the initial state from a first observation. Velocities start at zero
    /// with a large uncertainty.
    pub fn initiate(&self, measurement: [f64; MEASUREMENT_DIM]) -> (StateMean, StateCovariance) {
        let mut mean = StateMean::zeros();
        for i in 0..MEASUREMENT_DIM {
            mean[i] = measurement[i];
        }

        let mut var = [INITIAL_POSITION_VAR; STATE_DIM];
        for v in var.iter_mut().skip(MEASUREMENT_DIM) {
            *v = INITIAL_VELOCITY_VAR;
        }
        let covariance = StateCovariance::from_diagonal(&StateMean::from(var));

        (mean, covariance)
    }

    pub fn predict(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
    ) -> (StateMean, StateCovariance) {
        let mut mean = *mean;
        // Keep the predicted area from going negative.
        if mean[2] + mean[6] <= 0.0 {
            mean[6] = 0.0;
        }

        let new_mean = self.motion_mat * mean;
        let new_covariance =
            self.motion_mat * covariance * self.motion_mat.transpose() + self.process_noise;

        (new_mean, new_covariance)
    }

    /// Project the state distribution into measurement space.
    pub fn project(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
    ) -> (Measurement, MeasurementCovariance) {
        let mean_proj = self.update_mat * mean;
        let covariance_proj =
            self.update_mat * covariance * self.update_mat.transpose() + self.measurement_noise;

        (mean_proj, covariance_proj)
    }

    /// Correct the state with an observation.
    ///
    /// Returns `None` when the innovation covariance is singular.
    pub fn update(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
        measurement: [f64; MEASUREMENT_DIM],
    ) -> Option<(StateMean, StateCovariance)> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);
        let innovation = Measurement::from(measurement) - projected_mean;

        // K = P * H^T * S^-1
        let s_inv = projected_cov.try_inverse()?;
        let kalman_gain = covariance * self.update_mat.transpose() * s_inv;

        let new_mean = mean + kalman_gain * innovation;
        let new_covariance = covariance - kalman_gain * projected_cov * kalman_gain.transpose();

        Some((new_mean, new_covariance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_initiate() {
        let kf = KalmanFilter::default();
        let (mean, cov) = kf.initiate([100.0, 200.0, 400.0, 0.5]);
        assert_eq!(mean[0], 100.0);
        assert_eq!(mean[3], 0.5);
        assert_eq!(mean[4], 0.0);
        assert_eq!(mean[6], 0.0);
        assert_eq!(cov[(0, 0)], 10.0);
        assert_eq!(cov[(5, 5)], 1e4);
    }

    #[test]
    fn test_predict_constant_velocity() {
        let kf = KalmanFilter::default();
        let (mut mean, cov) = kf.initiate([10.0, 20.0, 100.0, 1.0]);
        mean[4] = 2.0;
        mean[5] = -1.0;
        mean[6] = 5.0;

        let (pred, pred_cov) = kf.predict(&mean, &cov);
        assert_eq!(pred[0], 12.0);
        assert_eq!(pred[1], 19.0);
        assert_eq!(pred[2], 105.0);
        assert_eq!(pred[3], 1.0);
        assert_eq!(pred[4], 2.0);
        assert!(pred_cov[(0, 0)] > cov[(0, 0)]);
    }

    #[test]
    fn test_predict_clamps_shrinking_scale() {
        let kf = KalmanFilter::default();
        let (mut mean, cov) = kf.initiate([10.0, 20.0, 4.0, 1.0]);
        mean[6] = -10.0;
        let (pred, _) = kf.predict(&mean, &cov);
        assert_eq!(pred[2], 4.0);
        assert_eq!(pred[6], 0.0);
    }

    #[test]
    fn test_update_moves_toward_measurement() {
        let kf = KalmanFilter::default();
        let (mean, cov) = kf.initiate([10.0, 10.0, 100.0, 1.0]);
        let (mean, cov) = kf.predict(&mean, &cov);
        let (updated, updated_cov) = kf.update(&mean, &cov, [20.0, 10.0, 100.0, 1.0]).unwrap();

        assert!(updated[0] > 10.0 && updated[0] < 20.0);
        assert!(updated[4] > 0.0);
        assert!(updated_cov[(0, 0)] < cov[(0, 0)]);
        assert_abs_diff_eq!(updated[1], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_velocity_inferred_from_repeated_motion() {
        let kf = KalmanFilter::default();
        let (mut mean, mut cov) = kf.initiate([0.0, 0.0, 100.0, 1.0]);
        for step in 1..=20 {
            let (m, c) = kf.predict(&mean, &cov);
            let (m, c) = kf.update(&m, &c, [step as f64 * 3.0, 0.0, 100.0, 1.0]).unwrap();
            mean = m;
            cov = c;
        }
        assert_abs_diff_eq!(mean[4], 3.0, epsilon = 0.25);
    }
}
