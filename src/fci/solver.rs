use crate::defaults::*;
use crate::fci::logging::{print_fci_energies, print_fci_init};
use crate::fci::solvers::{argsort, Davidson, DavidsonEngine};
use crate::fci::{make_hdiag, pspace, FciError, HamiltonianOperator, Integrals, Preconditioner};
use derive_builder::Builder;
use fcidip_dynamics::CiOperator;
use log::warn;
use ndarray::prelude::*;
use ndarray_linalg::{Eigh, UPLO};
use std::fmt;

/// Starting vectors of the iterative eigensolver.
pub enum InitialGuess {
    ExplicitVectors(Vec<Array1<f64>>),
    /// The vectors are only generated if the iterative solver is actually used.
    LazyGenerator(Box<dyn Fn() -> Vec<Array1<f64>> + Send + Sync>),
}

impl InitialGuess {
    pub fn vectors(&self) -> Vec<Array1<f64>> {
        match self {
            InitialGuess::ExplicitVectors(vectors) => vectors.clone(),
            InitialGuess::LazyGenerator(generator) => generator(),
        }
    }
}

impl fmt::Debug for InitialGuess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitialGuess::ExplicitVectors(vectors) => {
                write!(f, "ExplicitVectors({} vectors)", vectors.len())
            }
            InitialGuess::LazyGenerator(_) => write!(f, "LazyGenerator"),
        }
    }
}

/// How the eigenpairs of the CI Hamiltonian are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverPath {
    /// Diagonalization of the explicit Hamiltonian in the full space.
    Direct,
    /// Davidson iterations with the direct CI operator.
    Iterative,
}

impl SolverPath {
    /// The explicit matrix is only used if it covers the whole space, no guess was given and
    /// the lowest root is well separated (or several roots are requested anyway).
    pub fn select(
        pspace_size: usize,
        dim: usize,
        has_guess: bool,
        davidson_only: bool,
        pspace_eigenvalues: Option<ArrayView1<f64>>,
        nroots: usize,
    ) -> Self {
        if pspace_size < dim || has_guess || davidson_only {
            return SolverPath::Iterative;
        }
        match pspace_eigenvalues {
            Some(pw) if !pw.is_empty() => {
                if dim == 1
                    || nroots > 1
                    || (pw.len() > 1 && (pw[0] - pw[1]).abs() > DEGENERACY_THRESHOLD)
                {
                    SolverPath::Direct
                } else {
                    SolverPath::Iterative
                }
            }
            _ => SolverPath::Iterative,
        }
    }
}

/// Eigenpairs of the CI Hamiltonian.
#[derive(Debug, Clone)]
pub struct FciSolution {
    /// Total energies (electronic energy plus `ecore`).
    pub energies: Array1<f64>,
    /// Electronic energies.
    pub electronic_energies: Array1<f64>,
    /// CI vectors as columns, determinants in alpha major order.
    pub vectors: Array2<f64>,
    pub converged: Vec<bool>,
    pub path: SolverPath,
    pub iterations: usize,
}

impl FciSolution {
    pub fn ground_state(&self) -> ArrayView1<'_, f64> {
        self.vectors.column(0)
    }
}

struct FciEngine<'a> {
    operator: &'a HamiltonianOperator,
    preconditioner: &'a Preconditioner,
}

impl DavidsonEngine for FciEngine<'_> {
    fn compute_products(&mut self, x: ArrayView2<f64>) -> Array2<f64> {
        let mut products: Array2<f64> = Array2::zeros(x.raw_dim());
        for (column, mut product) in x.axis_iter(Axis(1)).zip(products.axis_iter_mut(Axis(1))) {
            product.assign(&self.operator.apply(column));
        }
        products
    }

    fn precondition(&self, r_k: ArrayView1<f64>, w_k: f64, x_k: ArrayView1<f64>) -> Array1<f64> {
        self.preconditioner.apply(r_k, w_k, x_k)
    }

    fn get_size(&self) -> usize {
        self.operator.dim()
    }
}

/// Ground and low lying states of the CI Hamiltonian.
#[derive(Builder, Clone, Debug)]
pub struct FciSolver {
    #[builder(default = "NROOTS")]
    nroots: usize,
    /// Convergence threshold of the energy change.
    #[builder(default = "CONV_TOL")]
    conv_tol: f64,
    /// Convergence threshold of the residual norm, `sqrt(conv_tol)` if not given.
    #[builder(default = "None")]
    conv_tol_residual: Option<f64>,
    #[builder(default = "LINDEP")]
    lindep: f64,
    #[builder(default = "MAX_CYCLE")]
    max_cycle: usize,
    #[builder(default = "MAX_SPACE")]
    max_space: usize,
    /// Number of determinants of the explicit Hamiltonian.
    #[builder(default = "PSPACE_SIZE")]
    pspace_size: usize,
    #[builder(default = "LEVEL_SHIFT")]
    level_shift: f64,
    #[builder(default = "DAVIDSON_ONLY")]
    davidson_only: bool,
}

impl FciSolver {
    pub fn nroots(&self) -> usize {
        self.nroots
    }

    pub fn tolerance_residual(&self) -> f64 {
        self.conv_tol_residual.unwrap_or_else(|| self.conv_tol.sqrt())
    }

    pub fn solve(
        &self,
        integrals: &Integrals,
        operator: &HamiltonianOperator,
        guess: Option<&InitialGuess>,
    ) -> Result<FciSolution, FciError> {
        let space = operator.space();
        let dim: usize = space.dim();
        if self.nroots == 0 {
            return Err(FciError::InvalidConfig(String::from(
                "at least one root has to be computed",
            )));
        }
        let nroots: usize = if self.nroots > dim {
            warn!(
                "{} roots requested but the CI space has only {} determinants",
                self.nroots, dim
            );
            dim
        } else {
            self.nroots
        };

        let hdiag: Array1<f64> = make_hdiag(integrals.h1e.view(), integrals.eri.view(), space);

        let pspace_basis: Option<(Vec<usize>, Array1<f64>, Array2<f64>)> = if self.pspace_size > 0
        {
            let np: usize = self.pspace_size.max(nroots);
            let (addr, h0) = pspace(
                integrals.h1e.view(),
                integrals.eri.view(),
                hdiag.view(),
                space,
                np,
            )?;
            let (pw, pv) = h0
                .eigh(UPLO::Lower)
                .map_err(|err| FciError::Linalg(err.to_string()))?;
            Some((addr, pw, pv))
        } else {
            None
        };

        let path: SolverPath = SolverPath::select(
            self.pspace_size,
            dim,
            guess.is_some(),
            self.davidson_only,
            pspace_basis.as_ref().map(|(_, pw, _)| pw.view()),
            nroots,
        );
        print_fci_init(space.norb, space.nelec, dim, path);

        let (electronic, vectors, converged, iterations) = match (path, pspace_basis) {
            (SolverPath::Direct, Some((addr, pw, pv))) => {
                let mut vectors: Array2<f64> = Array2::zeros((dim, nroots));
                for (p, k) in addr.iter().enumerate() {
                    for root in 0..nroots {
                        vectors[[*k, root]] = pv[[p, root]];
                    }
                }
                (
                    pw.slice(s![..nroots]).to_owned(),
                    vectors,
                    vec![true; nroots],
                    0,
                )
            }
            (_, pspace_basis) => {
                let preconditioner: Preconditioner = match pspace_basis {
                    Some((addr, pw, pv)) => Preconditioner::Pspace {
                        hdiag: hdiag.clone(),
                        addr,
                        eigenvalues: pw,
                        eigenvectors: pv,
                        level_shift: self.level_shift,
                    },
                    None => Preconditioner::Diagonal {
                        hdiag: hdiag.clone(),
                        level_shift: self.level_shift,
                    },
                };
                let guess: Array2<f64> = guess_vectors(guess, hdiag.view(), nroots)?;
                let mut engine = FciEngine {
                    operator,
                    preconditioner: &preconditioner,
                };
                let davidson: Davidson = Davidson::new(
                    &mut engine,
                    guess,
                    nroots,
                    self.conv_tol,
                    self.tolerance_residual(),
                    self.lindep,
                    self.max_cycle,
                    self.max_space,
                )?;
                for (root, flag) in davidson.converged.iter().enumerate() {
                    if !flag {
                        warn!("root {} is not converged", root);
                    }
                }
                (
                    davidson.eigenvalues,
                    davidson.eigenvectors,
                    davidson.converged,
                    davidson.iterations,
                )
            }
        };

        let energies: Array1<f64> = &electronic + integrals.ecore;
        print_fci_energies(energies.view(), &converged);
        Ok(FciSolution {
            energies,
            electronic_energies: electronic,
            vectors,
            converged,
            path,
            iterations,
        })
    }
}

/// Guess vectors as columns. Missing vectors are filled up with unit vectors on the
/// determinants with the lowest diagonal elements that are not yet dominant in a given vector.
fn guess_vectors(
    guess: Option<&InitialGuess>,
    hdiag: ArrayView1<f64>,
    nroots: usize,
) -> Result<Array2<f64>, FciError> {
    let dim: usize = hdiag.len();
    let mut vectors: Vec<Array1<f64>> = guess.map(|g| g.vectors()).unwrap_or_default();
    for vector in vectors.iter() {
        if vector.len() != dim {
            return Err(FciError::ShapeMismatch(format!(
                "guess vector of length {} for {} determinants",
                vector.len(),
                dim
            )));
        }
    }
    let missing: usize = nroots.saturating_sub(vectors.len());
    let padding: Vec<Array1<f64>> = argsort(hdiag)
        .into_iter()
        .filter(|k| {
            vectors.iter().all(|v| {
                let norm_sq: f64 = v.dot(v);
                norm_sq == 0.0 || v[*k] * v[*k] <= 0.5 * norm_sq
            })
        })
        .take(missing)
        .map(|k| {
            let mut unit: Array1<f64> = Array1::zeros(dim);
            unit[k] = 1.0;
            unit
        })
        .collect();
    vectors.extend(padding);
    Ok(Array2::from_shape_fn((dim, vectors.len()), |(i, j)| {
        vectors[j][i]
    }))
}
