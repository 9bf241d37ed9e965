use std::collections::BTreeSet;

use super::ControllerError;

/// Bounded set of breakpoint addresses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Breakpoints {
    addresses: BTreeSet<u8>,
    limit: usize,
}

impl Breakpoints {
    /// Empty set holding at most `limit` addresses.
    #[must_use]
    pub const fn with_limit(limit: usize) -> Self {
        Self {
            addresses: BTreeSet::new(),
            limit,
        }
    }

    /// Adds `address`. Re-adding an existing address is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::BreakpointLimit`] when the set is full.
    pub fn add(&mut self, address: u8) -> Result<(), ControllerError> {
        if self.addresses.contains(&address) {
            return Ok(());
        }
        if self.addresses.len() >= self.limit {
            return Err(ControllerError::BreakpointLimit { limit: self.limit });
        }
        self.addresses.insert(address);
        Ok(())
    }

    /// Removes `address`; returns whether it was present.
    pub fn remove(&mut self, address: u8) -> bool {
        self.addresses.remove(&address)
    }

    /// Removes every address.
    pub fn clear(&mut self) {
        self.addresses.clear();
    }

    /// True when `address` is a breakpoint.
    #[must_use]
    pub fn contains(&self, address: u8) -> bool {
        self.addresses.contains(&address)
    }

    /// Addresses in ascending order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.addresses.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Breakpoints;
    use crate::controller::ControllerError;

    #[test]
    fn addresses_are_listed_in_ascending_order() {
        let mut set = Breakpoints::with_limit(4);
        set.add(0x20).expect("room");
        set.add(0x05).expect("room");
        set.add(0x20).expect("duplicate is accepted");
        assert_eq!(set.to_vec(), vec![0x05, 0x20]);
    }

    #[test]
    fn limit_is_enforced_for_new_addresses_only() {
        let mut set = Breakpoints::with_limit(1);
        set.add(1).expect("room");
        assert_eq!(
            set.add(2),
            Err(ControllerError::BreakpointLimit { limit: 1 })
        );
        assert_eq!(set.add(1), Ok(()));
        assert!(set.remove(1));
        assert!(!set.remove(1));
        set.add(2).expect("room after removal");
        set.clear();
        assert!(!set.contains(2));
    }
}
