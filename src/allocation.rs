//! Resource allocation rules.
//!
//! An [`Allocation`] describes how a task requests one resource per time
//! slot from an ordered list of candidates. The selection mode decides
//! the order in which candidates are tried.
//!
//! # Selection modes
//!
//! | Mode | Order |
//! |------|-------|
//! | `order` | as declared |
//! | `minallocated` | ascending resource criticalness |
//! | `minloaded` | ascending allocated effort |
//! | `maxloaded` | descending allocated effort |
//! | `random` | uniform shuffle from the injected RNG |
//!
//! Ranking is a pure function of the current scenario state; only
//! `random` consumes the RNG.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use crate::error::AllocationError;
use crate::models::Timestamp;
use crate::property::PropertySet;
use crate::scenario::{ResourceScenario, ShiftScenario};

/// Candidate ordering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Candidates in declaration order.
    Order,
    /// Least critical resource first.
    #[default]
    MinAllocated,
    /// Least loaded resource first.
    MinLoaded,
    /// Most loaded resource first.
    MaxLoaded,
    /// Random permutation.
    Random,
}

impl FromStr for SelectionMode {
    type Err = AllocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order" => Ok(SelectionMode::Order),
            "minallocated" => Ok(SelectionMode::MinAllocated),
            "minloaded" => Ok(SelectionMode::MinLoaded),
            "maxloaded" => Ok(SelectionMode::MaxLoaded),
            "random" => Ok(SelectionMode::Random),
            other => Err(AllocationError::UnknownSelectionMode(other.to_string())),
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectionMode::Order => "order",
            SelectionMode::MinAllocated => "minallocated",
            SelectionMode::MinLoaded => "minloaded",
            SelectionMode::MaxLoaded => "maxloaded",
            SelectionMode::Random => "random",
        };
        f.write_str(s)
    }
}

/// A task's request for resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    candidates: Vec<usize>,
    /// How candidates are ordered.
    pub selection_mode: SelectionMode,
    /// Reuse the first chosen resource for all later slots.
    pub persistent: bool,
    /// The task cannot progress in a slot unless this allocation is served.
    pub mandatory: bool,
    /// Shift limiting when the allocation may be served.
    pub shift: Option<usize>,
    #[serde(skip)]
    locked: Option<usize>,
}

impl Allocation {
    /// Creates an allocation over resource indices.
    ///
    /// # Errors
    /// [`AllocationError::EmptyCandidates`] if `candidates` is empty.
    pub fn new(candidates: Vec<usize>) -> Result<Self, AllocationError> {
        if candidates.is_empty() {
            return Err(AllocationError::EmptyCandidates);
        }
        Ok(Self {
            candidates,
            selection_mode: SelectionMode::default(),
            persistent: false,
            mandatory: false,
            shift: None,
            locked: None,
        })
    }

    /// Sets the selection mode.
    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    /// Marks the allocation persistent.
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Marks the allocation mandatory.
    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    /// Restricts the allocation to a shift.
    pub fn with_shift(mut self, shift: usize) -> Self {
        self.shift = Some(shift);
        self
    }

    /// Sets the selection mode by name.
    ///
    /// # Errors
    /// [`AllocationError::UnknownSelectionMode`] for unknown names.
    pub fn set_selection_mode(&mut self, name: &str) -> Result<(), AllocationError> {
        self.selection_mode = name.parse()?;
        Ok(())
    }

    /// Candidates as declared.
    pub fn declared_candidates(&self) -> &[usize] {
        &self.candidates
    }

    /// Candidates in the order they should be tried.
    ///
    /// Without a scenario, or in `order` mode, the declared order is
    /// returned. Sorting is stable, so ties keep their declared order.
    pub fn candidates<R: Rng + ?Sized>(
        &self,
        scenario: Option<usize>,
        resources: &PropertySet<ResourceScenario>,
        rng: &mut R,
    ) -> Vec<usize> {
        let mut list = self.candidates.clone();
        let Some(scenario) = scenario else {
            return list;
        };

        let scenario_of = |r: usize| resources.get(r).and_then(|n| n.scenarios().get(scenario));
        let criticalness = |r: usize| scenario_of(r).map_or(0.0, |s| s.criticalness());
        let load = |r: usize| scenario_of(r).map_or(0, |s| s.allocated_seconds());

        match self.selection_mode {
            SelectionMode::Order => {}
            SelectionMode::Random => list.shuffle(rng),
            SelectionMode::MinAllocated => {
                list.sort_by(|&a, &b| criticalness(a).total_cmp(&criticalness(b)))
            }
            SelectionMode::MinLoaded => list.sort_by_key(|&r| load(r)),
            SelectionMode::MaxLoaded => list.sort_by_key(|&r| Reverse(load(r))),
        }
        list
    }

    /// Whether the allocation may be served at `date`.
    ///
    /// Always true without a shift.
    pub fn on_shift(
        &self,
        date: Timestamp,
        shifts: &PropertySet<ShiftScenario>,
        scenario: usize,
    ) -> bool {
        match self.shift.and_then(|s| shifts.get(s)) {
            Some(shift) => shift
                .scenarios()
                .get(scenario)
                .is_some_and(|s| s.on_shift(date) && !s.on_vacation(date)),
            None => true,
        }
    }

    /// Resource locked in by a persistent allocation.
    pub fn locked(&self) -> Option<usize> {
        self.locked
    }

    /// Locks in a resource. Only persistent allocations lock.
    pub fn lock(&mut self, resource: usize) {
        if self.persistent && self.locked.is_none() {
            self.locked = Some(resource);
        }
    }

    /// Releases the locked resource.
    pub fn unlock(&mut self) {
        self.locked = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::AttributeValue;
    use crate::scenario::Scenario;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn resources(criticalness: &[f64], effort: &[i64]) -> PropertySet<ResourceScenario> {
        let mut set: PropertySet<ResourceScenario> = PropertySet::new(1);
        for (i, (&c, &e)) in criticalness.iter().zip(effort).enumerate() {
            let idx = set.add(format!("r{}", i + 1), format!("R{}", i + 1), None).unwrap();
            let s = set[idx].scenario_mut(0);
            s.data_mut().compute("criticalness", AttributeValue::Number(c));
            s.data_mut().compute("effort", AttributeValue::Duration(e));
        }
        set
    }

    #[test]
    fn test_minallocated_prefers_least_critical() {
        let res = resources(&[0.8, 0.2], &[0, 0]);
        let alloc = Allocation::new(vec![0, 1]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(alloc.candidates(Some(0), &res, &mut rng), vec![1, 0]);
        // Without a scenario the declared order is kept.
        assert_eq!(alloc.candidates(None, &res, &mut rng), vec![0, 1]);
    }

    #[test]
    fn test_loaded_modes() {
        let res = resources(&[0.0, 0.0, 0.0], &[7200, 3600, 10800]);
        let mut alloc = Allocation::new(vec![0, 1, 2]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        alloc.set_selection_mode("minloaded").unwrap();
        assert_eq!(alloc.candidates(Some(0), &res, &mut rng), vec![1, 0, 2]);

        alloc.set_selection_mode("maxloaded").unwrap();
        assert_eq!(alloc.candidates(Some(0), &res, &mut rng), vec![2, 0, 1]);

        alloc.set_selection_mode("order").unwrap();
        assert_eq!(alloc.candidates(Some(0), &res, &mut rng), vec![0, 1, 2]);
    }

    #[test]
    fn test_stable_ties() {
        let res = resources(&[0.5, 0.5, 0.1], &[0, 0, 0]);
        let alloc = Allocation::new(vec![0, 1, 2]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(alloc.candidates(Some(0), &res, &mut rng), vec![2, 0, 1]);
    }

    #[test]
    fn test_random_is_seeded_permutation() {
        let res = resources(&[0.0; 5], &[0; 5]);
        let alloc = Allocation::new(vec![0, 1, 2, 3, 4])
            .unwrap()
            .with_selection_mode(SelectionMode::Random);

        let a = alloc.candidates(Some(0), &res, &mut StdRng::seed_from_u64(42));
        let b = alloc.candidates(Some(0), &res, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_selection_mode_names() {
        let mut alloc = Allocation::new(vec![0]).unwrap();
        assert_eq!(
            alloc.set_selection_mode("cheapest"),
            Err(AllocationError::UnknownSelectionMode("cheapest".into()))
        );
        assert_eq!("maxloaded".parse::<SelectionMode>(), Ok(SelectionMode::MaxLoaded));
        assert_eq!(SelectionMode::MinLoaded.to_string(), "minloaded");
    }

    #[test]
    fn test_empty_candidates() {
        assert_eq!(Allocation::new(vec![]), Err(AllocationError::EmptyCandidates));
    }

    #[test]
    fn test_persistent_lock() {
        let mut alloc = Allocation::new(vec![0, 1]).unwrap();
        alloc.lock(1);
        assert_eq!(alloc.locked(), None);

        let mut alloc = alloc.with_persistent(true);
        alloc.lock(1);
        alloc.lock(0);
        assert_eq!(alloc.locked(), Some(1));
        alloc.unlock();
        assert_eq!(alloc.locked(), None);
    }

    #[test]
    fn test_on_shift_without_shift() {
        let shifts: PropertySet<ShiftScenario> = PropertySet::new(1);
        let alloc = Allocation::new(vec![0]).unwrap();
        assert!(alloc.on_shift(0, &shifts, 0));
    }
}
