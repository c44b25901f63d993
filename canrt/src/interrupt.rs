//! Foreground critical section
//!
//! Interrupt handlers mutate the bus queues at any time. Foreground code that reads or
//! mutates them takes an [`InterruptMutex`] first: the returned [`InterruptGuard`] keeps
//! interrupt delivery disabled until it is dropped, whatever path leaves the scope.
//!
//! Dropping the owning guard calls [`InterruptControl::enable`]. What that does is up to the
//! control: [`CriticalSectionControl`] restores the interrupt state saved when the guard was
//! taken, so a foreground lock taken with interrupts already masked leaves them masked on
//! drop. Taking the mutex again while a guard is alive yields a non-owning guard, so only the
//! outermost guard touches the control.
//!
//! Interrupt handlers do not use the mutex. Handlers of the runtime triggers share one
//! priority level and never nest.

use core::cell::Cell;
use core::marker::PhantomData;

/// Global interrupt mask of the platform
pub trait InterruptControl {
    /// Stops interrupt delivery.
    fn disable(&self);

    /// Resumes interrupt delivery.
    fn enable(&self);
}

/// Interrupt mask backed by the `critical-section` implementation of the target
///
/// On Cortex-M this is `cpsid i` / `cpsie i` with the usual restore logic, on a host it is
/// the `std` implementation of the crate.
pub struct CriticalSectionControl {
    restore: Cell<Option<critical_section::RestoreState>>,
}

impl CriticalSectionControl {
    pub const fn new() -> Self {
        Self {
            restore: Cell::new(None),
        }
    }
}

impl Default for CriticalSectionControl {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptControl for CriticalSectionControl {
    fn disable(&self) {
        // Safety: released by `enable`, InterruptMutex never calls `disable` twice in a row
        let restore = unsafe { critical_section::acquire() };
        let prev = self.restore.replace(Some(restore));
        assert!(prev.is_none());
    }

    fn enable(&self) {
        if let Some(restore) = self.restore.take() {
            // Safety: the state comes from the matching acquire
            unsafe { critical_section::release(restore) };
        }
    }
}

/// Foreground access lock for state shared with interrupt handlers
///
/// The mutex is owned by the foreground loop. It is neither `Sync` nor usable from an
/// interrupt handler.
pub struct InterruptMutex<I: InterruptControl> {
    control: I,
    locked: Cell<bool>,
}

impl<I: InterruptControl> InterruptMutex<I> {
    pub const fn new(control: I) -> Self {
        Self {
            control,
            locked: Cell::new(false),
        }
    }

    /// Disables interrupts until the returned guard is dropped.
    ///
    /// If a guard is already alive, interrupts stay disabled and the new guard does not
    /// enable them on drop.
    pub fn lock(&self) -> InterruptGuard<'_> {
        let owner = !self.locked.get();
        if owner {
            self.control.disable();
            self.locked.set(true);
        }
        InterruptGuard {
            control: &self.control,
            locked: &self.locked,
            owner,
            _not_send: PhantomData,
        }
    }

    /// Runs the closure with interrupts disabled.
    pub fn with<R>(&self, f: impl FnOnce(&InterruptGuard<'_>) -> R) -> R {
        let guard = self.lock();
        f(&guard)
    }

    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }

    pub fn control(&self) -> &I {
        &self.control
    }
}

/// Proof that interrupt delivery is disabled
///
/// Bus operations that must not interleave with interrupt handlers take a reference to
/// a guard.
#[must_use = "interrupts are enabled again as soon as the guard is dropped"]
pub struct InterruptGuard<'a> {
    control: &'a dyn InterruptControl,
    locked: &'a Cell<bool>,
    owner: bool,
    // Interrupt state is per-core
    _not_send: PhantomData<*const ()>,
}

impl InterruptGuard<'_> {
    /// Whether dropping this guard enables interrupts
    pub fn is_owner(&self) -> bool {
        self.owner
    }
}

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        if self.owner {
            self.locked.set(false);
            self.control.enable();
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;

    #[derive(Default)]
    struct CountingControl {
        enabled: Cell<bool>,
        disable_count: Cell<u32>,
        enable_count: Cell<u32>,
    }

    impl CountingControl {
        fn new() -> Self {
            Self {
                enabled: Cell::new(true),
                ..Default::default()
            }
        }
    }

    impl InterruptControl for CountingControl {
        fn disable(&self) {
            self.enabled.set(false);
            self.disable_count.set(self.disable_count.get() + 1);
        }

        fn enable(&self) {
            self.enabled.set(true);
            self.enable_count.set(self.enable_count.get() + 1);
        }
    }

    #[test]
    fn test_lock_scope() {
        let mutex = InterruptMutex::new(CountingControl::new());
        {
            let guard = mutex.lock();
            assert!(guard.is_owner());
            assert!(mutex.is_locked());
            assert!(!mutex.control().enabled.get());
        }
        assert!(!mutex.is_locked());
        assert!(mutex.control().enabled.get());
        assert_eq!(mutex.control().disable_count.get(), 1);
        assert_eq!(mutex.control().enable_count.get(), 1);
    }

    #[test]
    fn test_nested_lock() {
        let mutex = InterruptMutex::new(CountingControl::new());
        let outer = mutex.lock();
        {
            let inner = mutex.lock();
            assert!(!inner.is_owner());
        }
        // Inner guard must not enable interrupts
        assert!(!mutex.control().enabled.get());
        assert_eq!(mutex.control().enable_count.get(), 0);

        drop(outer);
        assert!(mutex.control().enabled.get());
        assert_eq!(mutex.control().disable_count.get(), 1);
        assert_eq!(mutex.control().enable_count.get(), 1);
    }

    #[test]
    fn test_early_return() {
        fn first_even(mutex: &InterruptMutex<CountingControl>, values: &[u32]) -> Option<u32> {
            let _guard = mutex.lock();
            for &value in values {
                if value % 2 == 0 {
                    return Some(value);
                }
            }
            None
        }

        let mutex = InterruptMutex::new(CountingControl::new());
        assert_eq!(first_even(&mutex, &[1, 4, 5]), Some(4));
        assert!(mutex.control().enabled.get());
        assert_eq!(mutex.control().enable_count.get(), 1);

        assert_eq!(first_even(&mutex, &[1, 3]), None);
        assert_eq!(mutex.control().disable_count.get(), 2);
        assert_eq!(mutex.control().enable_count.get(), 2);
    }

    #[test]
    fn test_error_propagation() {
        fn checked(mutex: &InterruptMutex<CountingControl>, value: Option<u8>) -> Result<u8, ()> {
            mutex.with(|_guard| -> Result<u8, ()> {
                let value = value.ok_or(())?;
                Ok(value + 1)
            })
        }

        let mutex = InterruptMutex::new(CountingControl::new());
        assert_eq!(checked(&mutex, None), Err(()));
        assert_eq!(checked(&mutex, Some(1)), Ok(2));
        assert!(mutex.control().enabled.get());
        assert_eq!(mutex.control().enable_count.get(), 2);
    }

    #[test]
    fn test_unwind() {
        let mutex = InterruptMutex::new(CountingControl::new());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = mutex.lock();
            std::panic!("fault inside the critical section");
        }));
        assert!(result.is_err());
        assert!(!mutex.is_locked());
        assert!(mutex.control().enabled.get());
        assert_eq!(mutex.control().enable_count.get(), 1);
    }

    #[test]
    fn test_critical_section_control() {
        let mutex = InterruptMutex::new(CriticalSectionControl::new());
        mutex.with(|_| {
            // Nested sections of other users are fine
            critical_section::with(|_| {});
        });
        let _guard = mutex.lock();
    }
}
