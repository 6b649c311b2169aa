//! Reserved output keys a component may set, as a typed set of constants rather than
//! bare string literals scattered through scheduler code (§1.2, §4.6 "Reserved control keys").

/// Selects a single outgoing branch: only edges whose `source_handle` equals this
/// value's payload are followed.
pub const ACTIVE_HANDLE_KEY: &str = "_active_handle";

/// Aborts the rest of the current iteration without enqueuing successors. Meaningful
/// only to a surrounding loop component, which peeks at its children's outputs.
pub const CONTROL_SIGNAL_KEY: &str = "_control_signal";

/// Marks an output as requiring frontend interaction. The scheduler passes this
/// through unexamined for an external UI surface to notice.
pub const UI_TYPE_KEY: &str = "_ui_type";

pub const BREAK: &str = "BREAK";
pub const CONTINUE: &str = "CONTINUE";

/// Reserved node id meaning "persist and stop", distinct from any real node.
pub const SUSPEND_SENTINEL: &str = "__SUSPEND__";
