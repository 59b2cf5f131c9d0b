//! Line-impedance computation from conductor geometry.
//!
//! Implements the modified Carson equations at 60 Hz with an assumed earth
//! resistivity of 100 ohm-meter, following Kersting's formulation:
//!
//! - self impedance of conductor i (ohm/mile):
//!   `z_ii = (r_i + 0.0953) + j 0.12134 (ln(1/GMR_i) + 7.93402)`
//! - mutual impedance between conductors i and j at distance `D_ij` feet:
//!   `z_ij = 0.0953 + j 0.12134 (ln(1/D_ij) + 7.93402)`
//!
//! The primitive `n_cond x n_cond` matrix is partitioned into phase and
//! neutral blocks and the neutrals eliminated by Kron reduction:
//! `Z_abc = z_ij - z_in z_nn^-1 z_nj`.
//!
//! Internal computation uses ohm/mile and feet; inputs are set in those
//! units and the output is rescaled to the caller-requested unit.

use num_complex::Complex64;

use dnt_core::units::{LengthUnit, METERS_PER_MILE};
use dnt_core::{DntError, DntResult};

/// Carson resistance term, ohm/mile (earth-return correction at 60 Hz).
const CARSON_R: f64 = 0.0953;
/// Carson reactance coefficient, ohm/mile.
const CARSON_X: f64 = 0.12134;
/// Carson earth-return constant (ln of De over 1 ft at 100 ohm-m, 60 Hz).
const CARSON_K: f64 = 7.93402;

/// Pivot threshold below which the neutral block is treated as singular.
const SINGULAR_PIVOT: f64 = 1e-12;

/// Self impedance of a conductor, ohm/mile.
///
/// `resistance` in ohm/mile, `gmr` in feet.
pub fn self_impedance(resistance: f64, gmr: f64) -> Complex64 {
    Complex64::new(
        resistance + CARSON_R,
        CARSON_X * ((1.0 / gmr).ln() + CARSON_K),
    )
}

/// Mutual impedance between two conductors `distance` feet apart, ohm/mile.
pub fn mutual_impedance(distance: f64) -> Complex64 {
    Complex64::new(CARSON_R, CARSON_X * ((1.0 / distance).ln() + CARSON_K))
}

/// Convert a 3x3 set of sequence impedances (z0, z1) to the balanced phase
/// matrix: diagonal `(z0 + 2 z1) / 3`, off-diagonal `(z0 - z1) / 3`.
pub fn sequence_to_phase(z0: Complex64, z1: Complex64) -> Vec<Vec<Complex64>> {
    let diag = (z0 + z1 * 2.0) / 3.0;
    let off = (z0 - z1) / 3.0;
    (0..3)
        .map(|i| (0..3).map(|j| if i == j { diag } else { off }).collect())
        .collect()
}

#[derive(Debug, Clone, Default)]
struct Conductor {
    /// GMR in feet.
    gmr: Option<f64>,
    /// Resistance in ohm/mile.
    resistance: Option<f64>,
    /// Diameter in inches (carried for capacitance work; unused here).
    diameter: Option<f64>,
    /// Cross-section position in feet.
    x: f64,
    y: f64,
    /// Radius to a concentric neutral, feet. When two conductors share a
    /// position and one carries this radius, it stands in for the distance.
    radius_to_neutral: Option<f64>,
}

/// Impedance engine for one line construction.
///
/// Conductors `0..n_phase` are phase conductors; `n_phase..n_cond` are
/// neutrals. Set per-conductor properties, then call
/// [`LineParameters::compute_impedance_matrix`].
#[derive(Debug, Clone)]
pub struct LineParameters {
    n_phase: usize,
    n_cond: usize,
    conductors: Vec<Conductor>,
}

impl LineParameters {
    /// `n_phase` phase conductors out of `n_cond` total. More phases than
    /// conductors is a configuration error.
    pub fn new(n_phase: usize, n_cond: usize) -> DntResult<Self> {
        if n_phase > n_cond {
            return Err(DntError::Validation(format!(
                "n_phase ({n_phase}) exceeds n_cond ({n_cond})"
            )));
        }
        if n_phase == 0 {
            return Err(DntError::Validation("line has no phase conductors".into()));
        }
        Ok(Self {
            n_phase,
            n_cond,
            conductors: vec![Conductor::default(); n_cond],
        })
    }

    pub fn n_phase(&self) -> usize {
        self.n_phase
    }

    pub fn n_cond(&self) -> usize {
        self.n_cond
    }

    fn conductor_mut(&mut self, i: usize) -> DntResult<&mut Conductor> {
        let n = self.n_cond;
        self.conductors.get_mut(i).ok_or_else(|| {
            DntError::Validation(format!("conductor index {i} out of range (n_cond {n})"))
        })
    }

    /// Set conductor `i`: GMR in feet, resistance in ohm/mile, diameter in
    /// inches, position in feet.
    pub fn set_conductor(
        &mut self,
        i: usize,
        gmr: f64,
        resistance: f64,
        diameter: f64,
        x: f64,
        y: f64,
    ) -> DntResult<()> {
        let c = self.conductor_mut(i)?;
        c.gmr = Some(gmr);
        c.resistance = Some(resistance);
        c.diameter = Some(diameter);
        c.x = x;
        c.y = y;
        Ok(())
    }

    /// Describe neutral conductor `neutral` as the concentric neutral of
    /// phase conductor `phase`: `strands` strands of per-strand GMR
    /// (feet) and resistance (ohm/mile), at radius-to-neutral `radius`
    /// feet. The equivalent single neutral is
    /// `GMR_cn = (GMR_s k R^(k-1))^(1/k)`, `r_cn = r_s / k`, placed at the
    /// phase position with `R` standing in for the zero center distance.
    pub fn set_concentric_neutral(
        &mut self,
        neutral: usize,
        phase: usize,
        strands: usize,
        strand_gmr: f64,
        strand_resistance: f64,
        radius: f64,
    ) -> DntResult<()> {
        if phase >= self.n_phase {
            return Err(DntError::Validation(format!(
                "concentric neutral references conductor {phase}, not a phase conductor"
            )));
        }
        if neutral < self.n_phase || neutral >= self.n_cond {
            return Err(DntError::Validation(format!(
                "conductor {neutral} is not a neutral position"
            )));
        }
        if strands == 0 || strand_gmr <= 0.0 || radius <= 0.0 {
            return Err(DntError::Validation(
                "concentric neutral needs positive strand count, GMR, and radius".into(),
            ));
        }
        let k = strands as f64;
        let (px, py) = {
            let p = &self.conductors[phase];
            (p.x, p.y)
        };
        let c = self.conductor_mut(neutral)?;
        c.gmr = Some((strand_gmr * k * radius.powf(k - 1.0)).powf(1.0 / k));
        c.resistance = Some(strand_resistance / k);
        c.diameter = None;
        c.x = px;
        c.y = py;
        c.radius_to_neutral = Some(radius);
        Ok(())
    }

    fn distance(&self, i: usize, j: usize) -> DntResult<f64> {
        let a = &self.conductors[i];
        let b = &self.conductors[j];
        let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
        if d > 0.0 {
            return Ok(d);
        }
        // Coincident positions are only meaningful for a concentric
        // neutral over its own phase, where the radius is the distance.
        a.radius_to_neutral
            .or(b.radius_to_neutral)
            .ok_or_else(|| {
                DntError::Validation(format!(
                    "conductors {i} and {j} are coincident with no radius to neutral"
                ))
            })
    }

    fn primitive_matrix(&self) -> DntResult<Vec<Vec<Complex64>>> {
        let n = self.n_cond;
        let mut z = vec![vec![Complex64::new(0.0, 0.0); n]; n];
        for i in 0..n {
            let gmr = self.conductors[i].gmr.filter(|&g| g > 0.0).ok_or_else(|| {
                DntError::Validation(format!("conductor {i} has no positive GMR"))
            })?;
            let r = self.conductors[i].resistance.ok_or_else(|| {
                DntError::Validation(format!("conductor {i} has no resistance"))
            })?;
            z[i][i] = self_impedance(r, gmr);
            for j in 0..n {
                if i != j {
                    z[i][j] = mutual_impedance(self.distance(i, j)?);
                }
            }
        }
        Ok(z)
    }

    /// Compute the `n_phase x n_phase` phase impedance matrix in the
    /// requested unit. Accepts a length token (`"mi"`, `"km"`, ...) or the
    /// `"ohm/<len>"` form.
    pub fn compute_impedance_matrix(&self, unit: &str) -> DntResult<Vec<Vec<Complex64>>> {
        let token = unit
            .rsplit('/')
            .next()
            .unwrap_or(unit);
        let unit = LengthUnit::from_token(token)
            .ok_or_else(|| DntError::Validation(format!("unknown length unit '{token}'")))?;

        let z = self.primitive_matrix()?;
        let np = self.n_phase;
        let nn = self.n_cond - np;

        let reduced = if nn == 0 {
            z.iter().map(|row| row[..np].to_vec()).collect()
        } else {
            let zij: Vec<Vec<Complex64>> = z[..np].iter().map(|r| r[..np].to_vec()).collect();
            let zin: Vec<Vec<Complex64>> = z[..np].iter().map(|r| r[np..].to_vec()).collect();
            let znj: Vec<Vec<Complex64>> = z[np..].iter().map(|r| r[..np].to_vec()).collect();
            let znn: Vec<Vec<Complex64>> = z[np..].iter().map(|r| r[np..].to_vec()).collect();
            let znn_inv = invert(&znn)?;
            let correction = matmul(&matmul(&zin, &znn_inv), &znj);
            zij.iter()
                .zip(&correction)
                .map(|(a, b)| a.iter().zip(b).map(|(x, y)| x - y).collect())
                .collect::<Vec<Vec<Complex64>>>()
        };

        // Rescale ohm/mile to ohm per requested unit length.
        let scale = unit.meters_per_unit() / METERS_PER_MILE;
        Ok(reduced
            .into_iter()
            .map(|row| row.into_iter().map(|v| v * scale).collect())
            .collect())
    }
}

fn matmul(a: &[Vec<Complex64>], b: &[Vec<Complex64>]) -> Vec<Vec<Complex64>> {
    let rows = a.len();
    let inner = b.len();
    let cols = if inner > 0 { b[0].len() } else { 0 };
    let mut out = vec![vec![Complex64::new(0.0, 0.0); cols]; rows];
    for i in 0..rows {
        for k in 0..inner {
            let aik = a[i][k];
            for j in 0..cols {
                out[i][j] += aik * b[k][j];
            }
        }
    }
    out
}

/// Invert a small complex matrix by Gauss-Jordan elimination with partial
/// pivoting. Rejects near-singular input instead of returning garbage.
fn invert(m: &[Vec<Complex64>]) -> DntResult<Vec<Vec<Complex64>>> {
    let n = m.len();
    let mut aug: Vec<Vec<Complex64>> = m
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut r = row.clone();
            r.extend((0..n).map(|k| {
                if k == i {
                    Complex64::new(1.0, 0.0)
                } else {
                    Complex64::new(0.0, 0.0)
                }
            }));
            r
        })
        .collect();

    for col in 0..n {
        // Partial pivoting on magnitude
        let mut max_row = col;
        let mut max_val = aug[col][col].norm();
        for row in (col + 1)..n {
            if aug[row][col].norm() > max_val {
                max_val = aug[row][col].norm();
                max_row = row;
            }
        }
        if max_val < SINGULAR_PIVOT {
            return Err(DntError::Validation(
                "neutral block is singular or near-singular".into(),
            ));
        }
        aug.swap(col, max_row);

        let pivot = aug[col][col];
        for v in aug[col].iter_mut() {
            *v /= pivot;
        }
        for row in 0..n {
            if row != col {
                let factor = aug[row][col];
                if factor.norm() > 0.0 {
                    let pivot_row = aug[col].clone();
                    for (v, p) in aug[row].iter_mut().zip(&pivot_row) {
                        *v -= factor * p;
                    }
                }
            }
        }
    }

    Ok(aug.into_iter().map(|row| row[n..].to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Complex64, re: f64, im: f64) {
        assert!(
            (actual.re - re).abs() < 5e-5 && (actual.im - im).abs() < 5e-5,
            "expected {re}+{im}j, got {actual}"
        );
    }

    #[test]
    fn test_self_impedance_scalar() {
        // 336,400 26/7 ACSR: r = 0.306 ohm/mi, GMR = 0.0244 ft
        let z = self_impedance(0.306, 0.0244);
        assert_close(z, 0.4013, 1.4133);
    }

    #[test]
    fn test_mutual_impedance_scalar() {
        let z = mutual_impedance(2.5);
        assert_close(z, 0.0953, 0.8515);
    }

    #[test]
    fn test_more_phases_than_conductors_rejected() {
        assert!(LineParameters::new(4, 3).is_err());
        assert!(LineParameters::new(0, 1).is_err());
    }

    #[test]
    fn test_missing_gmr_rejected() {
        let mut lp = LineParameters::new(1, 1).unwrap();
        assert!(lp.compute_impedance_matrix("mi").is_err());
        lp.set_conductor(0, 0.0, 0.306, 0.721, 0.0, 29.0).unwrap();
        assert!(lp.compute_impedance_matrix("mi").is_err());
    }

    #[test]
    fn test_unknown_unit_rejected() {
        let mut lp = LineParameters::new(1, 1).unwrap();
        lp.set_conductor(0, 0.0244, 0.306, 0.721, 0.0, 29.0).unwrap();
        assert!(lp.compute_impedance_matrix("furlong").is_err());
        assert!(lp.compute_impedance_matrix("ohm/mi").is_ok());
    }

    /// Kersting Ch. 4 Example 4.1: 3-phase overhead line with one neutral.
    #[test]
    fn test_kersting_overhead_four_wire() {
        let mut lp = LineParameters::new(3, 4).unwrap();
        // Phases: 336,400 26/7 ACSR
        lp.set_conductor(0, 0.0244, 0.306, 0.721, 0.0, 29.0).unwrap();
        lp.set_conductor(1, 0.0244, 0.306, 0.721, 2.5, 29.0).unwrap();
        lp.set_conductor(2, 0.0244, 0.306, 0.721, 7.0, 29.0).unwrap();
        // Neutral: 4/0 6/1 ACSR
        lp.set_conductor(3, 0.00814, 0.592, 0.563, 4.0, 25.0).unwrap();

        let z = lp.compute_impedance_matrix("ohm/mi").unwrap();
        let expected = [
            [(0.4576, 1.0780), (0.1560, 0.5017), (0.1535, 0.3849)],
            [(0.1560, 0.5017), (0.4666, 1.0482), (0.1580, 0.4236)],
            [(0.1535, 0.3849), (0.1580, 0.4236), (0.4615, 1.0651)],
        ];
        for i in 0..3 {
            for j in 0..3 {
                assert_close(z[i][j], expected[i][j].0, expected[i][j].1);
            }
        }
    }

    /// Kersting Ch. 4: three 250 kcmil AA concentric-neutral cables with
    /// 13-strand #14 copper neutrals, 6-inch center spacing.
    #[test]
    fn test_kersting_underground_concentric_neutral() {
        let mut lp = LineParameters::new(3, 6).unwrap();
        // Phase conductors: GMR 0.0171 ft, r 0.41 ohm/mi, d 0.567 in
        lp.set_conductor(0, 0.0171, 0.41, 0.567, 0.0, 0.0).unwrap();
        lp.set_conductor(1, 0.0171, 0.41, 0.567, 0.5, 0.0).unwrap();
        lp.set_conductor(2, 0.0171, 0.41, 0.567, 1.0, 0.0).unwrap();
        // Concentric neutrals: 13 x #14 copper, strand GMR 0.00208 ft,
        // strand r 14.8722 ohm/mi, radius to neutral (1.29 - 0.0641)/24 ft
        let radius = (1.29 - 0.0641) / 24.0;
        lp.set_concentric_neutral(3, 0, 13, 0.00208, 14.8722, radius)
            .unwrap();
        lp.set_concentric_neutral(4, 1, 13, 0.00208, 14.8722, radius)
            .unwrap();
        lp.set_concentric_neutral(5, 2, 13, 0.00208, 14.8722, radius)
            .unwrap();

        let z = lp.compute_impedance_matrix("ohm/mi").unwrap();
        let expected = [
            [(0.7982, 0.4463), (0.3192, 0.0328), (0.2849, -0.0143)],
            [(0.3192, 0.0328), (0.7891, 0.4041), (0.3192, 0.0328)],
            [(0.2849, -0.0143), (0.3192, 0.0328), (0.7982, 0.4463)],
        ];
        for i in 0..3 {
            for j in 0..3 {
                assert_close(z[i][j], expected[i][j].0, expected[i][j].1);
            }
        }
    }

    #[test]
    fn test_unit_rescaling() {
        let mut lp = LineParameters::new(1, 1).unwrap();
        lp.set_conductor(0, 0.0244, 0.306, 0.721, 0.0, 29.0).unwrap();
        let per_mile = lp.compute_impedance_matrix("mi").unwrap()[0][0];
        let per_km = lp.compute_impedance_matrix("km").unwrap()[0][0];
        let ratio = per_mile.re / per_km.re;
        assert!((ratio - 1.609344).abs() < 1e-9);
    }

    #[test]
    fn test_sequence_to_phase() {
        let z0 = Complex64::new(0.3, 0.9);
        let z1 = Complex64::new(0.1, 0.3);
        let m = sequence_to_phase(z0, z1);
        // Diagonal: (z0 + 2 z1)/3
        assert_close(m[0][0], 0.5 / 3.0, 1.5 / 3.0);
        // Off-diagonal: (z0 - z1)/3
        assert_close(m[0][1], 0.2 / 3.0, 0.6 / 3.0);
        assert_eq!(m[1][2], m[0][1]);
    }

    #[test]
    fn test_coincident_conductors_rejected() {
        let mut lp = LineParameters::new(2, 2).unwrap();
        lp.set_conductor(0, 0.0244, 0.306, 0.721, 0.0, 29.0).unwrap();
        lp.set_conductor(1, 0.0244, 0.306, 0.721, 0.0, 29.0).unwrap();
        assert!(lp.compute_impedance_matrix("mi").is_err());
    }
}
