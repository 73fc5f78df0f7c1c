// src/temperature.rs
//
// Closed-form temperature scaling of material parameters.
//
//   m(T)  = 1 - (T/Tc)^beta                  (Bloch-law-like, beta = 3/2)
//   Ms(T) = Ms0 * m(T)
//   A(T)  = A0  * m(T)^p_A                    (empirical, p_A ≈ 1.745)
//   K(T)  = K0  * m(T)^p_K                    (Callen–Callen, p_K = 3 for uniaxial)
//
// Negative temperatures are clamped to 0 K; at or above Tc everything vanishes.

use serde::{Deserialize, Serialize};

pub const BLOCH_EXPONENT: f64 = 1.5;
pub const EXCHANGE_EXPONENT: f64 = 1.745;
pub const ANISOTROPY_EXPONENT: f64 = 3.0;

/// Reduced magnetisation m(T) = Ms(T)/Ms(0), in [0, 1].
pub fn reduced_magnetisation(t: f64, tc: f64, beta: f64) -> f64 {
    let t = t.max(0.0);
    if t >= tc {
        return 0.0;
    }
    if t == 0.0 {
        return 1.0;
    }
    (1.0 - (t / tc).powf(beta)).clamp(0.0, 1.0)
}

pub fn ms_at(ms0: f64, t: f64, tc: f64, beta: f64) -> f64 {
    ms0 * reduced_magnetisation(t, tc, beta)
}

pub fn exchange_at(a0: f64, t: f64, tc: f64, beta: f64, exponent: f64) -> f64 {
    a0 * reduced_magnetisation(t, tc, beta).powf(exponent)
}

pub fn anisotropy_at(k0: f64, t: f64, tc: f64, beta: f64, exponent: f64) -> f64 {
    k0 * reduced_magnetisation(t, tc, beta).powf(exponent)
}

/// Exponents shared by every region. Curie temperatures are per region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingLaw {
    pub beta: f64,
    pub exchange_exponent: f64,
    pub anisotropy_exponent: f64,
}

impl Default for ScalingLaw {
    fn default() -> Self {
        Self {
            beta: BLOCH_EXPONENT,
            exchange_exponent: EXCHANGE_EXPONENT,
            anisotropy_exponent: ANISOTROPY_EXPONENT,
        }
    }
}

impl ScalingLaw {
    pub fn reduced(&self, t: f64, tc: f64) -> f64 {
        reduced_magnetisation(t, tc, self.beta)
    }

    pub fn ms(&self, ms0: f64, t: f64, tc: f64) -> f64 {
        ms_at(ms0, t, tc, self.beta)
    }

    pub fn exchange(&self, a0: f64, t: f64, tc: f64) -> f64 {
        exchange_at(a0, t, tc, self.beta, self.exchange_exponent)
    }

    pub fn anisotropy(&self, k0: f64, t: f64, tc: f64) -> f64 {
        anisotropy_at(k0, t, tc, self.beta, self.anisotropy_exponent)
    }
}
