//! Provides macros for consistent reporting of errors in the compiler's rust code.
#![warn(clippy::dbg_macro)]

/// `internal_error!` should be used whenever a compiler invariant is broken.
/// It is a wrapper around panic that tells the user this is a compiler bug.
/// If the source program is at fault, return a problem from the stage instead.
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => ({
        eprintln!("An internal compiler expectation was broken.");
        eprintln!("This is definitely a compiler bug.");
        #[allow(clippy::panic)] {
            panic!($($arg)*);
        }
    })
}

#[cfg(test)]
mod test {
    #[test]
    #[should_panic(expected = "reserved spec 3 was never filled")]
    fn internal_error_panics_with_message() {
        internal_error!("reserved spec {} was never filled", 3);
    }
}
