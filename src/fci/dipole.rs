use crate::fci::{contract_1e, CiSpace};
use fcidip_dynamics::defaults::NORM_FLOOR;
use fcidip_dynamics::PropagationError;
use ndarray::prelude::*;
use ndarray_linalg::Norm;

/// The ground state after the action of one Cartesian component of the dipole operator.
#[derive(Debug, Clone)]
pub struct DipoleSeed {
    pub axis: usize,
    /// mu|0>
    pub vector: Array1<f64>,
    pub norm: f64,
    /// <0|mu|0>
    pub permanent_dipole: f64,
}

impl DipoleSeed {
    pub fn new(
        axis: usize,
        dipole: ArrayView2<f64>,
        ground_state: ArrayView1<f64>,
        space: &CiSpace,
    ) -> Self {
        let vector: Array1<f64> = contract_1e(dipole, ground_state, space);
        let norm: f64 = vector.norm_l2();
        let permanent_dipole: f64 = ground_state.dot(&vector);
        Self {
            axis,
            vector,
            norm,
            permanent_dipole,
        }
    }

    /// The normalized seed state mu0 of the propagation.
    pub fn normalized(&self) -> Result<Array1<f64>, PropagationError> {
        if !(self.norm >= NORM_FLOOR) {
            return Err(PropagationError::VanishingNorm {
                time: 0.0,
                norm: self.norm,
            });
        }
        Ok(&self.vector / self.norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fci::{make_rdm1, FciSolverBuilder, HamiltonianOperator};
    use crate::utils::tests::{model_dipoles, model_integrals};
    use approx::assert_abs_diff_eq;

    #[test]
    fn seeds_are_normalized() {
        let integrals = model_integrals(4);
        let dipoles: Array3<f64> = model_dipoles(4);
        let operator = HamiltonianOperator::new(&integrals, (2, 2)).unwrap();
        let solution = FciSolverBuilder::default()
            .build()
            .unwrap()
            .solve(&integrals, &operator, None)
            .unwrap();
        let dm1: Array2<f64> = make_rdm1(solution.ground_state(), operator.space()).unwrap();
        for axis in 0..3 {
            let seed = DipoleSeed::new(
                axis,
                dipoles.index_axis(Axis(0), axis),
                solution.ground_state(),
                operator.space(),
            );
            let mu0: Array1<f64> = seed.normalized().unwrap();
            assert_abs_diff_eq!(mu0.norm_l2(), 1.0, epsilon = 1e-12);
            // <0|mu|0> = sum_pq mu[p,q] dm1[q,p]
            let from_density: f64 = (&dipoles.index_axis(Axis(0), axis) * &dm1.t()).sum();
            assert_abs_diff_eq!(seed.permanent_dipole, from_density, epsilon = 1e-12);
        }
    }

    #[test]
    fn vanishing_dipole_is_reported() {
        let space = CiSpace::new(3, (1, 1)).unwrap();
        let dipole: Array2<f64> = Array2::zeros((3, 3));
        let mut ground: Array1<f64> = Array1::zeros(space.dim());
        ground[0] = 1.0;
        let seed = DipoleSeed::new(0, dipole.view(), ground.view(), &space);
        assert!(matches!(
            seed.normalized(),
            Err(PropagationError::VanishingNorm { .. })
        ));
    }
}
