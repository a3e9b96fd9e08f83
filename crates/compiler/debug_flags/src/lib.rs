//! Flags for debugging the compiler.
//!
//! Lists environment variable flags that can be enabled for verbose debugging features in debug
//! builds of the compiler. A flag is on when the variable is set to anything but `0`:
//!
//! ```bash
//! LNN_PRINT_UNIFICATIONS=1 LNN_PRINT_SPECS_AFTER_MONOMORPHIZATION=1 cargo test -p lnn_load
//! ```

#[macro_export]
macro_rules! dbg_set {
    ($flag:path) => {{
        #[cfg(not(debug_assertions))]
        {
            false
        }
        #[cfg(debug_assertions)]
        {
            let flag = std::env::var($flag);
            flag.is_ok() && flag.as_deref() != Ok("0")
        }
    }};
}

#[macro_export]
macro_rules! dbg_do {
    ($flag:path, $expr:expr) => {
        #[cfg(debug_assertions)]
        {
            if $crate::dbg_set!($flag) {
                $expr
            }
        }
    };
}

macro_rules! flags {
    ($($(#[doc = $doc:expr])+ $flag:ident)*) => {$(
        $(#[doc = $doc])+
        pub static $flag: &str = stringify!($flag);
    )*};
}

flags! {
    // ===Solve===

    /// Prints every equation, with the current substitution applied, right before it is unified.
    LNN_PRINT_UNIFICATIONS

    /// Prints the generalized type of every top-level definition once it is inferred.
    LNN_PRINT_INFERRED_TYPES

    // ===Mono===

    /// Prints every flat layout as it is computed.
    LNN_PRINT_LAYOUTS

    /// Writes every monomorphized instance to stderr once it has been lowered.
    LNN_PRINT_SPECS_AFTER_MONOMORPHIZATION

    /// Walks every monomorphized instance after loading and reports each inconsistency, such as a
    /// surviving type variable, as a load problem.
    LNN_CHECK_SPECS
}
