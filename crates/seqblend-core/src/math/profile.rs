//! Time-scaling profiles
//!
//! Scalar motion profiles used to time-parameterize a geometric path of known
//! length. A profile maps time to the distance travelled along the path.

use serde::{Deserialize, Serialize};

/// Trapezoidal velocity profile (rest to rest)
///
/// Accelerates with `max_acceleration` until `max_velocity` is reached, cruises,
/// then decelerates symmetrically. Short distances degrade to a triangular
/// profile that never reaches `max_velocity`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrapezoidalProfile {
    /// Path length covered by the profile
    pub distance: f64,
    /// Acceleration magnitude used in both ramps
    pub acceleration: f64,
    /// Highest velocity reached
    pub peak_velocity: f64,
    /// Duration of each ramp [s]
    pub ramp_time: f64,
    /// Duration of the constant-velocity phase [s]
    pub cruise_time: f64,
}

impl TrapezoidalProfile {
    /// Build a profile covering `distance`
    ///
    /// Returns None if either limit is not strictly positive or the distance
    /// is negative or not finite.
    pub fn new(distance: f64, max_velocity: f64, max_acceleration: f64) -> Option<Self> {
        if !(max_velocity > 0.0) || !(max_acceleration > 0.0) {
            return None;
        }
        if !distance.is_finite() || distance < 0.0 {
            return None;
        }

        let ramp_distance = max_velocity * max_velocity / max_acceleration;
        let (peak_velocity, ramp_time, cruise_time) = if distance <= ramp_distance {
            // Triangular: v_peak² / a = d
            let ramp_time = (distance / max_acceleration).sqrt();
            (max_acceleration * ramp_time, ramp_time, 0.0)
        } else {
            let ramp_time = max_velocity / max_acceleration;
            (max_velocity, ramp_time, (distance - ramp_distance) / max_velocity)
        };

        Some(Self {
            distance,
            acceleration: max_acceleration,
            peak_velocity,
            ramp_time,
            cruise_time,
        })
    }

    /// Total duration [s]
    pub fn duration(&self) -> f64 {
        2.0 * self.ramp_time + self.cruise_time
    }

    /// Distance travelled at time t (clamped to the profile's bounds)
    pub fn position(&self, t: f64) -> f64 {
        let total = self.duration();
        let t = t.clamp(0.0, total);

        if t < self.ramp_time {
            0.5 * self.acceleration * t * t
        } else if t < self.ramp_time + self.cruise_time {
            0.5 * self.acceleration * self.ramp_time * self.ramp_time
                + self.peak_velocity * (t - self.ramp_time)
        } else {
            let remaining = total - t;
            self.distance - 0.5 * self.acceleration * remaining * remaining
        }
    }

    /// Velocity at time t
    pub fn velocity(&self, t: f64) -> f64 {
        let total = self.duration();
        if t <= 0.0 || t >= total {
            return 0.0;
        }
        if t < self.ramp_time {
            self.acceleration * t
        } else if t < self.ramp_time + self.cruise_time {
            self.peak_velocity
        } else {
            self.acceleration * (total - t)
        }
    }

    /// Fraction of the distance covered at time t, in [0, 1]
    pub fn progress(&self, t: f64) -> f64 {
        if self.distance <= 0.0 {
            return 1.0;
        }
        (self.position(t) / self.distance).clamp(0.0, 1.0)
    }
}

/// Sample times covering `[0, duration]` with a step no larger than `step`
///
/// Both end points are included; a zero duration yields the single time 0.
pub fn sample_times(duration: f64, step: f64) -> Vec<f64> {
    if !(duration > 0.0) || !(step > 0.0) {
        return vec![0.0];
    }
    let intervals = (duration / step).ceil().max(1.0) as usize;
    (0..=intervals)
        .map(|k| duration * k as f64 / intervals as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_triangular_profile() {
        // v²/a = 0.5 > d, so v_max is never reached
        let profile = TrapezoidalProfile::new(0.25, 1.0, 2.0).unwrap();

        assert_relative_eq!(profile.cruise_time, 0.0);
        assert_relative_eq!(profile.duration(), 2.0 * (0.25_f64 / 2.0).sqrt(), epsilon = 1e-12);
        assert!(profile.peak_velocity < 1.0);
    }

    #[test]
    fn test_trapezoidal_profile() {
        let profile = TrapezoidalProfile::new(2.0, 1.0, 2.0).unwrap();

        // ramps: 0.5 s each covering 0.25 m, cruise 1.5 m at 1 m/s
        assert_relative_eq!(profile.ramp_time, 0.5, epsilon = 1e-12);
        assert_relative_eq!(profile.cruise_time, 1.5, epsilon = 1e-12);
        assert_relative_eq!(profile.duration(), 2.5, epsilon = 1e-12);
        assert_relative_eq!(profile.velocity(1.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_position_endpoints_and_symmetry() {
        let profile = TrapezoidalProfile::new(2.0, 1.0, 2.0).unwrap();
        let total = profile.duration();

        assert_relative_eq!(profile.position(0.0), 0.0);
        assert_relative_eq!(profile.position(total), 2.0, epsilon = 1e-12);
        assert_relative_eq!(profile.position(total / 2.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(profile.position(10.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_position_is_monotonic() {
        let profile = TrapezoidalProfile::new(0.7, 0.8, 1.5).unwrap();
        let times = sample_times(profile.duration(), 0.01);

        for pair in times.windows(2) {
            assert!(profile.position(pair[1]) >= profile.position(pair[0]));
        }
    }

    #[test]
    fn test_invalid_limits() {
        assert!(TrapezoidalProfile::new(1.0, 0.0, 1.0).is_none());
        assert!(TrapezoidalProfile::new(1.0, 1.0, -1.0).is_none());
        assert!(TrapezoidalProfile::new(-1.0, 1.0, 1.0).is_none());
    }

    #[test]
    fn test_zero_distance_progress() {
        let profile = TrapezoidalProfile::new(0.0, 1.0, 1.0).unwrap();
        assert_relative_eq!(profile.duration(), 0.0);
        assert_relative_eq!(profile.progress(0.0), 1.0);
    }

    #[test]
    fn test_sample_times() {
        let times = sample_times(1.0, 0.3);

        assert_eq!(times.len(), 5);
        assert_relative_eq!(times[0], 0.0);
        assert_relative_eq!(*times.last().unwrap(), 1.0);
        assert_eq!(sample_times(0.0, 0.1), vec![0.0]);
    }
}
