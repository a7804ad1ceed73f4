use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal places used for stored and reported money amounts
pub const CURRENCY_PRECISION: u32 = 2;

/// Decimal places kept for budget percentages
pub const PERCENTAGE_PRECISION: u32 = 2;

/// Largest absolute money amount accepted on any input
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Upper bound for the sum of active budget category percentages
pub const MAX_TOTAL_PERCENTAGE: Decimal = dec!(100);

/// Currency assigned to new families when none is given
pub const DEFAULT_CURRENCY: &str = "USD";

/// Timezone assigned to new families when none is given
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Upper bound for a single recurring generation request
pub const MAX_RECURRING_OCCURRENCES: u32 = 52;

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Largest page size a caller may request
pub const MAX_PAGE_SIZE: i64 = 500;

/// Look-ahead window used by the dashboard for upcoming items
pub const DASHBOARD_UPCOMING_DAYS: u32 = 14;
