use core::fmt;
use core::num::NonZeroU32;

use crate::error::{CoreError, CoreResult};

/// Compact, stable identifier into the arenas of a built rate graph.
///
/// Stored as `index + 1` so that `Option<Id>` costs nothing extra.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Id for a 0-based index, or `IndexOob` past the id space.
    pub fn try_from_index(index: usize) -> CoreResult<Self> {
        u32::try_from(index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(CoreError::IndexOob {
                what: "id",
                index,
                len: u32::MAX as usize,
            })
    }

    /// Id for an index into an arena whose size was checked with
    /// [`Id::try_from_index`] when the graph was built.
    ///
    /// # Panics
    /// If `index` does not fit the id space.
    pub fn from_index(index: usize) -> Self {
        match Self::try_from_index(index) {
            Ok(id) => id,
            Err(err) => panic!("{err}"),
        }
    }

    /// Recover the 0-based index.
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Position of a rate in the emission-ordered rate arena.
pub type RateId = Id;
/// Position of a nuclide in the sorted `unique_nuclei` list.
pub type NuclideId = Id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_usize, 1, 2, 42, 10_000] {
            let id = Id::from_index(i);
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn index_past_id_space_is_an_error() {
        assert!(Id::try_from_index(u32::MAX as usize - 1).is_ok());
        let err = Id::try_from_index(u32::MAX as usize).unwrap_err();
        assert!(matches!(err, CoreError::IndexOob { what: "id", .. }));
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<Id>(),
            core::mem::size_of::<Option<Id>>()
        );
    }
}
