/*!

# Occupation strings

Determinants are products of an alpha and a beta occupation string. A string is stored as a bit
pattern in a `u64`, bit `p` is set if orbital `p` is occupied. All strings of a given number of
electrons are ordered by their integer value, which is the colexicographic order of the occupied
orbital sets. The address of a string is its position in that order:

addr = sum_k binomial(o_k, k + 1)

for the occupied orbitals o_0 < o_1 < ... of the string.

 */

use crate::fci::FciError;
use itertools::Itertools;

/// The highest bit is kept free, so 63 orbitals can be packed into a string.
pub const MAX_PACKED_ORBITALS: usize = 63;

/// Binomial coefficient n over k.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k: usize = k.min(n - k);
    let mut value: u128 = 1;
    for i in 0..k {
        value = value * (n - i) as u128 / (i + 1) as u128;
    }
    value as usize
}

/// Number of strings of `nelec` electrons in `norb` orbitals.
pub fn num_strings(norb: usize, nelec: usize) -> usize {
    binomial(norb, nelec)
}

/// All strings in address order.
pub fn gen_strings(norb: usize, nelec: usize) -> Result<Vec<u64>, FciError> {
    if norb > MAX_PACKED_ORBITALS {
        return Err(FciError::TooManyOrbitals(norb));
    }
    if nelec > norb {
        return Err(FciError::InvalidElectrons {
            norb,
            nelec: (nelec, 0),
        });
    }
    let mut strings: Vec<u64> = (0..norb)
        .combinations(nelec)
        .map(|occ| occ.iter().fold(0u64, |string, p| string | (1u64 << p)))
        .collect();
    strings.sort_unstable();
    Ok(strings)
}

/// Occupied orbitals of a string in ascending order.
pub fn occupied(string: u64) -> Vec<usize> {
    (0..64).filter(|p| string & (1u64 << p) != 0).collect()
}

/// Address of a string.
pub fn str_to_addr(string: u64) -> usize {
    occupied(string)
        .iter()
        .enumerate()
        .map(|(k, p)| binomial(*p, k + 1))
        .sum()
}

pub fn addrs_to_strings(
    norb: usize,
    nelec: usize,
    addrs: &[usize],
) -> Result<Vec<u64>, FciError> {
    let strings: Vec<u64> = gen_strings(norb, nelec)?;
    addrs
        .iter()
        .map(|addr| {
            strings.get(*addr).copied().ok_or_else(|| {
                FciError::ShapeMismatch(format!(
                    "address {} out of range for {} strings",
                    addr,
                    strings.len()
                ))
            })
        })
        .collect()
}

/// Sign of the excitation a^+_p a_q acting on `string`: the parity of the number of occupied
/// orbitals strictly between p and q.
pub fn cre_des_sign(p: usize, q: usize, string: u64) -> f64 {
    if p == q {
        return 1.0;
    }
    let (low, high): (usize, usize) = if p > q { (q, p) } else { (p, q) };
    // bits low+1 .. high-1
    let mask: u64 = ((1u64 << high) - 1) ^ ((1u64 << (low + 1)) - 1);
    if (string & mask).count_ones() % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// One entry of the link table: E_{cre,des} |I> = sign |addr>.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkEntry {
    pub cre: usize,
    pub des: usize,
    pub addr: usize,
    pub sign: f64,
}

/// For every string all single replacements E_ai (including the diagonal a == i).
pub fn gen_link_index(norb: usize, strings: &[u64]) -> Vec<Vec<LinkEntry>> {
    strings
        .iter()
        .enumerate()
        .map(|(addr, string)| {
            let occ: Vec<usize> = occupied(*string);
            let vir: Vec<usize> = (0..norb).filter(|p| string & (1u64 << p) == 0).collect();
            let mut links: Vec<LinkEntry> = occ
                .iter()
                .map(|i| LinkEntry {
                    cre: *i,
                    des: *i,
                    addr,
                    sign: 1.0,
                })
                .collect();
            for i in occ.iter() {
                for a in vir.iter() {
                    let target: u64 = (string ^ (1u64 << i)) | (1u64 << a);
                    links.push(LinkEntry {
                        cre: *a,
                        des: *i,
                        addr: str_to_addr(target),
                        sign: cre_des_sign(*a, *i, *string),
                    });
                }
            }
            links
        })
        .collect()
}

/// Strings and link tables of both spins.
#[derive(Debug, Clone)]
pub struct CiSpace {
    pub norb: usize,
    pub nelec: (usize, usize),
    pub strings_a: Vec<u64>,
    pub strings_b: Vec<u64>,
    pub link_a: Vec<Vec<LinkEntry>>,
    pub link_b: Vec<Vec<LinkEntry>>,
}

impl CiSpace {
    pub fn new(norb: usize, nelec: (usize, usize)) -> Result<Self, FciError> {
        if norb > MAX_PACKED_ORBITALS {
            return Err(FciError::TooManyOrbitals(norb));
        }
        if nelec.0 > norb || nelec.1 > norb {
            return Err(FciError::InvalidElectrons { norb, nelec });
        }
        let strings_a: Vec<u64> = gen_strings(norb, nelec.0)?;
        let strings_b: Vec<u64> = gen_strings(norb, nelec.1)?;
        let link_a = gen_link_index(norb, &strings_a);
        let link_b = gen_link_index(norb, &strings_b);
        Ok(Self {
            norb,
            nelec,
            strings_a,
            strings_b,
            link_a,
            link_b,
        })
    }

    pub fn na(&self) -> usize {
        self.strings_a.len()
    }

    pub fn nb(&self) -> usize {
        self.strings_b.len()
    }

    /// Number of determinants.
    pub fn dim(&self) -> usize {
        self.na() * self.nb()
    }

    pub fn n_electrons(&self) -> usize {
        self.nelec.0 + self.nelec.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_counts() {
        assert_eq!(num_strings(6, 3), 20);
        assert_eq!(num_strings(4, 0), 1);
        assert_eq!(num_strings(3, 4), 0);
        assert_eq!(gen_strings(6, 3).unwrap().len(), 20);
        assert_eq!(binomial(63, 31), 916312070471295267);
    }

    #[test]
    fn addresses_follow_string_order() {
        let strings = gen_strings(7, 3).unwrap();
        for (addr, string) in strings.iter().enumerate() {
            assert_eq!(str_to_addr(*string), addr);
            assert_eq!(string.count_ones(), 3);
        }
        assert_eq!(strings[0], 0b111);
        let picked = addrs_to_strings(7, 3, &[0, 1, 34]).unwrap();
        assert_eq!(picked, vec![0b111, 0b1011, 0b1110000]);
        assert!(addrs_to_strings(7, 3, &[35]).is_err());
    }

    #[test]
    fn excitation_signs() {
        // orbitals 0 and 2 occupied, E_30 passes orbital 2
        assert_eq!(cre_des_sign(3, 0, 0b0101), -1.0);
        // E_10 passes no orbital
        assert_eq!(cre_des_sign(1, 0, 0b0101), 1.0);
        // orbitals 2 and 3 occupied, E_03 passes orbital 2
        assert_eq!(cre_des_sign(0, 3, 0b1100), -1.0);
        assert_eq!(cre_des_sign(0, 3, 0b1000), 1.0);
        assert_eq!(cre_des_sign(2, 2, 0b0101), 1.0);
    }

    #[test]
    fn link_tables() {
        let norb: usize = 5;
        let nelec: usize = 2;
        let strings = gen_strings(norb, nelec).unwrap();
        let links = gen_link_index(norb, &strings);
        for (addr, table) in links.iter().enumerate() {
            assert_eq!(table.len(), nelec + nelec * (norb - nelec));
            for entry in table.iter() {
                let target = strings[entry.addr];
                if entry.cre == entry.des {
                    assert_eq!(entry.addr, addr);
                } else {
                    assert_eq!(
                        target,
                        (strings[addr] ^ (1u64 << entry.des)) | (1u64 << entry.cre)
                    );
                }
            }
        }
    }

    #[test]
    fn orbital_limit() {
        assert_eq!(gen_strings(64, 2), Err(FciError::TooManyOrbitals(64)));
        assert!(matches!(
            CiSpace::new(64, (1, 1)),
            Err(FciError::TooManyOrbitals(64))
        ));
        assert!(matches!(
            CiSpace::new(3, (4, 1)),
            Err(FciError::InvalidElectrons { .. })
        ));
        let space = CiSpace::new(4, (2, 1)).unwrap();
        assert_eq!(space.na(), 6);
        assert_eq!(space.nb(), 4);
        assert_eq!(space.dim(), 24);
    }
}
