use crate::fci::{FciError, Integrals};
use crate::io::settings::SystemConfig;
use anyhow::{bail, Context, Result};
use ndarray::prelude::*;
use ndarray_linalg::c64;
use ndarray_npy::read_npy;
use std::path::Path;

/// Read a real array of any dimension. Complex arrays are recognized and rejected, since the
/// eigensolver only handles real Hamiltonians.
fn read_real_array(path: &Path) -> Result<ArrayD<f64>> {
    match read_npy::<_, ArrayD<f64>>(path) {
        Ok(array) => Ok(array),
        Err(err) => {
            if read_npy::<_, ArrayD<c64>>(path).is_ok() {
                return Err(FciError::ComplexHamiltonian.into());
            }
            Err(err).with_context(|| format!("Unable to read {}", path.display()))
        }
    }
}

/// Read the one- and two-electron integrals and the dipole matrices from `directory`.
/// The two-electron integrals may be stored as `norb^4` tensor or as `norb^2 x norb^2` matrix.
pub fn read_integrals(directory: &Path, system: &SystemConfig) -> Result<(Integrals, Array3<f64>)> {
    let h1e_path = directory.join(&system.h1e_file);
    let h1e: Array2<f64> = read_real_array(&h1e_path)?
        .into_dimensionality::<Ix2>()
        .with_context(|| format!("{} is not a matrix", h1e_path.display()))?;

    let eri_path = directory.join(&system.eri_file);
    let eri: ArrayD<f64> = read_real_array(&eri_path)?;
    let integrals: Integrals = match eri.ndim() {
        4 => Integrals::new(h1e, eri.into_dimensionality::<Ix4>()?, system.ecore)?,
        2 => {
            let eri: Array2<f64> = eri.into_dimensionality::<Ix2>()?;
            Integrals::from_matrix(h1e, eri.view(), system.ecore)?
        }
        n => bail!(
            "{} has {} dimensions, expected 2 or 4",
            eri_path.display(),
            n
        ),
    };

    let dipole_path = directory.join(&system.dipole_file);
    let dipoles: Array3<f64> = read_real_array(&dipole_path)?
        .into_dimensionality::<Ix3>()
        .with_context(|| format!("{} is not a stack of matrices", dipole_path.display()))?;
    let norb: usize = integrals.norb();
    if dipoles.dim() != (3, norb, norb) {
        return Err(FciError::ShapeMismatch(format!(
            "dipole matrices of shape {:?} do not match {} orbitals",
            dipoles.shape(),
            norb
        ))
        .into());
    }
    Ok((integrals, dipoles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tests::{model_dipoles, model_integrals};
    use ndarray_npy::write_npy;
    use std::fs;

    fn scratch(name: &str) -> std::path::PathBuf {
        let directory =
            std::env::temp_dir().join(format!("fcidip_input_{}_{}", name, std::process::id()));
        fs::create_dir_all(&directory).unwrap();
        directory
    }

    #[test]
    fn integrals_are_read() {
        let directory = scratch("real");
        let integrals = model_integrals(3);
        let matrix: Array2<f64> = integrals.eri.clone().into_shape((9, 9)).unwrap();
        write_npy(directory.join("h1e.npy"), &integrals.h1e).unwrap();
        write_npy(directory.join("eri.npy"), &matrix).unwrap();
        write_npy(directory.join("dipole.npy"), &model_dipoles(3)).unwrap();
        let mut system = SystemConfig::default();
        system.ecore = 0.25;
        let (read, dipoles) = read_integrals(&directory, &system).unwrap();
        assert_eq!(read.eri, integrals.eri);
        assert_eq!(read.ecore, 0.25);
        assert_eq!(dipoles.dim(), (3, 3, 3));
        fs::remove_dir_all(&directory).unwrap();
    }

    #[test]
    fn complex_integrals_are_rejected() {
        let directory = scratch("complex");
        let integrals = model_integrals(2);
        let h1e: Array2<c64> = integrals.h1e.mapv(|x| c64::new(x, 0.1));
        write_npy(directory.join("h1e.npy"), &h1e).unwrap();
        write_npy(directory.join("eri.npy"), &integrals.eri).unwrap();
        write_npy(directory.join("dipole.npy"), &model_dipoles(2)).unwrap();
        let err = read_integrals(&directory, &SystemConfig::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FciError>(),
            Some(&FciError::ComplexHamiltonian)
        );
        fs::remove_dir_all(&directory).unwrap();
    }

    #[test]
    fn missing_files_are_reported() {
        let directory = scratch("missing");
        assert!(read_integrals(&directory, &SystemConfig::default()).is_err());
        fs::remove_dir_all(&directory).unwrap();
    }
}
