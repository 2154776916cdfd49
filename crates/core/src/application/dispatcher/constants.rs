// Dispatcher constants (no magic values)
use std::time::Duration;

/// Sleep when nothing can be dispatched (empty queue or every pending agent saturated)
pub const IDLE_SLEEP_DURATION: Duration = Duration::from_millis(250);

/// Sleep after a ledger or load-source error before trying again
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Upper bound on items moved per dispatch round
pub const MAX_DISPATCH_BATCH: usize = 32;
