//! Lock-free numeric cells shared between the control and audio threads.

use atomic_float::{AtomicF32, AtomicF64};
use std::sync::atomic::Ordering;

macro_rules! atomic_cell {
    ($(#[$meta:meta])* $name:ident, $atomic:ty, $value:ty) => {
        $(#[$meta])*
        #[derive(Debug)]
        #[repr(align(64))]
        pub struct $name {
            value: $atomic,
        }

        impl $name {
            pub fn new(value: $value) -> Self {
                Self {
                    value: <$atomic>::new(value),
                }
            }

            #[inline]
            pub fn get(&self) -> $value {
                self.value.load(Ordering::Acquire)
            }

            /// Relaxed load for per-sample reads where ordering is irrelevant.
            #[inline]
            pub fn get_relaxed(&self) -> $value {
                self.value.load(Ordering::Relaxed)
            }

            #[inline]
            pub fn set(&self, value: $value) {
                self.value.store(value, Ordering::Release);
            }

            #[inline]
            pub fn swap(&self, value: $value) -> $value {
                self.value.swap(value, Ordering::AcqRel)
            }
        }

        impl Clone for $name {
            fn clone(&self) -> Self {
                Self::new(self.get())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new(0.0)
            }
        }
    };
}

atomic_cell!(
    /// Cache-line aligned atomic f32, used for parameter cells.
    AtomicFloat,
    AtomicF32,
    f32
);

atomic_cell!(
    /// Cache-line aligned atomic f64, used for the transport sample rate.
    AtomicDouble,
    AtomicF64,
    f64
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_atomic_float() {
        let val = AtomicFloat::new(1.0);
        assert_eq!(val.get(), 1.0);
        val.set(2.5);
        assert_eq!(val.get(), 2.5);
        assert_eq!(val.swap(0.5), 2.5);
        assert_eq!(val.get_relaxed(), 0.5);
    }

    #[test]
    fn test_atomic_double_default() {
        let val = AtomicDouble::default();
        assert_eq!(val.get(), 0.0);
        val.set(48000.0);
        assert_eq!(val.clone().get(), 48000.0);
    }

    #[test]
    fn test_cross_thread_writes_visible() {
        let cell = Arc::new(AtomicFloat::new(0.0));
        let writer = {
            let cell = cell.clone();
            thread::spawn(move || cell.set(0.75))
        };
        writer.join().expect("writer panicked");
        assert_eq!(cell.get(), 0.75);
    }
}
