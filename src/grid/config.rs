//! Grid configuration and the serializable grid descriptor.

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshLatticeError;
use crate::topology::{MultiIndex, RefinementPolicy};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct DomainRepr {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

/// Axis-aligned bounding box of the physical domain.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "DomainRepr", try_from = "DomainRepr")]
pub struct Domain<const D: usize> {
    pub lower: [f64; D],
    pub upper: [f64; D],
}

impl<const D: usize> Domain<D> {
    pub fn new(lower: [f64; D], upper: [f64; D]) -> Self {
        Self { lower, upper }
    }

    /// `[0, 1]^D`
    pub fn unit() -> Self {
        Self::new([0.0; D], [1.0; D])
    }

    pub fn extent(&self, i: usize) -> f64 {
        self.upper[i] - self.lower[i]
    }
}

impl<const D: usize> Default for Domain<D> {
    fn default() -> Self {
        Self::unit()
    }
}

impl<const D: usize> From<Domain<D>> for DomainRepr {
    fn from(d: Domain<D>) -> Self {
        Self {
            lower: d.lower.to_vec(),
            upper: d.upper.to_vec(),
        }
    }
}

impl<const D: usize> TryFrom<DomainRepr> for Domain<D> {
    type Error = MeshLatticeError;

    fn try_from(r: DomainRepr) -> Result<Self, Self::Error> {
        let corner = |v: Vec<f64>| -> Result<[f64; D], MeshLatticeError> {
            let n = v.len();
            v.try_into().map_err(|_| {
                MeshLatticeError::InvalidConfig(format!(
                    "domain corner has {n} components, expected {D}"
                ))
            })
        };
        Ok(Self {
            lower: corner(r.lower)?,
            upper: corner(r.upper)?,
        })
    }
}

/// Everything needed to build level 0 of a grid on one rank.
///
/// Missing fields deserialize to their [`Default`] values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig<const D: usize> {
    #[serde(default)]
    pub domain: Domain<D>,
    /// Global number of cells per axis.
    #[serde(default = "one_cell_per_axis")]
    pub cells: MultiIndex<D>,
    /// Halo width in cells per axis.
    #[serde(default)]
    pub overlap: MultiIndex<D>,
    /// Bit `i` set: axis `i` is periodic.
    #[serde(default)]
    pub periodic: u32,
}

fn one_cell_per_axis<const D: usize>() -> MultiIndex<D> {
    MultiIndex::splat(1)
}

impl<const D: usize> Default for GridConfig<D> {
    fn default() -> Self {
        Self {
            domain: Domain::unit(),
            cells: one_cell_per_axis(),
            overlap: MultiIndex::zero(),
            periodic: 0,
        }
    }
}

impl<const D: usize> GridConfig<D> {
    pub fn new(domain: Domain<D>, cells: MultiIndex<D>) -> Self {
        Self {
            domain,
            cells,
            ..Self::default()
        }
    }

    pub fn with_overlap(mut self, overlap: MultiIndex<D>) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_periodic(mut self, periodic: u32) -> Self {
        self.periodic = periodic;
        self
    }

    pub fn validate(&self) -> Result<(), MeshLatticeError> {
        if self.cells.iter().any(|c| c <= 0) {
            return Err(MeshLatticeError::InvalidConfig(format!(
                "cell counts must be positive, got {}",
                self.cells
            )));
        }
        if self.overlap.iter().any(|o| o < 0) {
            return Err(MeshLatticeError::InvalidConfig(format!(
                "negative overlap {}",
                self.overlap
            )));
        }
        if (0..D).any(|i| !(self.domain.extent(i) > 0.0)) {
            return Err(MeshLatticeError::InvalidConfig(format!(
                "empty or inverted domain {:?} .. {:?}",
                self.domain.lower, self.domain.upper
            )));
        }
        if (self.periodic as u64) >= (1u64 << D) {
            return Err(MeshLatticeError::InvalidPeriodicity {
                bits: self.periodic,
                dimension: D,
            });
        }
        Ok(())
    }

    /// Cell spacing of level 0.
    pub fn h(&self) -> [f64; D] {
        std::array::from_fn(|i| self.domain.extent(i) / self.cells[i] as f64)
    }
}

/// Serializable description of a whole grid hierarchy. Rebuilding from a
/// descriptor with the same rank count reproduces decomposition, pools and
/// linkage exactly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridDescriptor<const D: usize> {
    pub domain: Domain<D>,
    pub periodic: u32,
    pub cells: MultiIndex<D>,
    pub size: usize,
    pub overlap: MultiIndex<D>,
    pub max_level: usize,
    /// `refinements[l]` produced level `l + 1`.
    pub refinements: Vec<RefinementPolicy<D>>,
}

impl<const D: usize> GridDescriptor<D> {
    pub fn config(&self) -> GridConfig<D> {
        GridConfig {
            domain: self.domain,
            cells: self.cells,
            overlap: self.overlap,
            periodic: self.periodic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing() {
        let c = GridConfig::new(Domain::new([0.0, -1.0], [4.0, 2.0]), MultiIndex::new([2, 3]));
        assert_eq!(c.h(), [2.0, 1.0]);
        c.validate().unwrap();
    }

    #[test]
    fn validation_rejects_bad_input() {
        let ok = GridConfig::<2>::new(Domain::unit(), MultiIndex::new([4, 4]));
        assert!(ok.clone().with_periodic(4).validate().is_err());
        assert!(ok.clone().with_overlap(MultiIndex::new([0, -1])).validate().is_err());
        let mut flat = ok.clone();
        flat.cells = MultiIndex::new([4, 0]);
        assert!(flat.validate().is_err());
        let inverted = GridConfig::<2>::new(Domain::new([1.0, 0.0], [0.0, 1.0]), MultiIndex::splat(2));
        assert!(matches!(inverted.validate(), Err(MeshLatticeError::InvalidConfig(_))));
    }

    #[test]
    fn json_uses_plain_arrays() {
        let c = GridConfig::<2>::new(Domain::unit(), MultiIndex::new([3, 5])).with_periodic(1);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["cells"], serde_json::json!([3, 5]));
        assert_eq!(json["domain"]["upper"], serde_json::json!([1.0, 1.0]));
        let back: GridConfig<2> = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn empty_json_is_the_default_config() {
        let c: GridConfig<3> = serde_json::from_str("{}").unwrap();
        assert_eq!(c, GridConfig::default());
        assert_eq!(c.cells, MultiIndex::splat(1));
        let c: GridConfig<2> = serde_json::from_str(r#"{"periodic":2}"#).unwrap();
        assert_eq!(c.periodic, 2);
        assert_eq!(c.domain, Domain::unit());
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let json = r#"{"domain":{"lower":[0.0],"upper":[1.0]},"cells":[2,2],"overlap":[0,0],"periodic":0}"#;
        assert!(serde_json::from_str::<GridConfig<2>>(json).is_err());
    }
}
