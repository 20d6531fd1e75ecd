//! Position and velocity evaluated from a DE record.
//!
//! Units depend on the producer: the raw record evaluation gives km and km/day,
//! [`StateVector::to_au`] converts both to AU and AU/day. Addition, subtraction and division by
//! a scalar act on both vectors, which is what the Earth/Moon recombination needs.
use std::ops::{Add, Div, Sub};

use nalgebra::Vector3;

use crate::constants::AU;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl StateVector {
    pub fn zeros() -> Self {
        StateVector {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
        }
    }

    /// km → AU and km/day → AU/day.
    #[must_use = "`.to_au()` returns a new StateVector"]
    pub fn to_au(&self) -> Self {
        *self / AU
    }
}

impl Add for StateVector {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        StateVector {
            position: self.position + other.position,
            velocity: self.velocity + other.velocity,
        }
    }
}

impl Sub for StateVector {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        StateVector {
            position: self.position - other.position,
            velocity: self.velocity - other.velocity,
        }
    }
}

impl Div<f64> for StateVector {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        StateVector {
            position: self.position / rhs,
            velocity: self.velocity / rhs,
        }
    }
}
