//! Invariant checking shared by meshes and local matrix builders.

use crate::mesh_error::MeshError;
use crate::verbose::VerboseObject;

/// Structures whose internal consistency can be validated on demand.
pub trait DebugInvariants {
    /// Panic on a violated invariant in debug builds (or with `check-invariants`).
    fn debug_assert_invariants(&self);

    /// Validate invariants and return the first violation.
    fn validate_invariants(&self) -> Result<(), MeshError>;

    /// Validate and report a violation through `vo` instead of returning it.
    fn invariants_hold(&self, vo: &VerboseObject) -> bool {
        match self.validate_invariants() {
            Ok(()) => true,
            Err(e) => {
                vo.warn(format_args!("invariant violated: {e}"));
                false
            }
        }
    }
}

/// Run a fallible check and panic on error when invariant checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
